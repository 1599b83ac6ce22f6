//! Controller layer: UI events, error classification, and the presenter that
//! turns events into relay actions.

pub mod events;
pub mod presenter;
