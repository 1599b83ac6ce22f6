//! Popup view model and its plain-text rendering.

pub mod view;

pub use view::{Payload, PopupView, Tone};
