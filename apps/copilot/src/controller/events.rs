//! UI events and error modeling for the popup controller.

use relay::START_SERVER_HINT;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    ListGraphs,
    RefreshGraphs,
    ShowGraph,
    Search,
    Query,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Search,
    Query,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Char(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub meta: bool,
    pub ctrl: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        meta: false,
        ctrl: false,
    };

    /// The platform's submit chord modifier: Cmd on macOS, Ctrl elsewhere.
    pub fn submit() -> Self {
        if cfg!(target_os = "macos") {
            Modifiers {
                meta: true,
                ..Self::NONE
            }
        } else {
            Modifiers {
                ctrl: true,
                ..Self::NONE
            }
        }
    }

    pub fn is_submit_chord(self) -> bool {
        if cfg!(target_os = "macos") {
            self.meta
        } else {
            self.ctrl
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    Clicked(Button),
    KeyPressed {
        field: Field,
        key: Key,
        modifiers: Modifiers,
    },
    InputChanged {
        field: Field,
        text: String,
    },
    /// Selection control changed; an empty value picks the placeholder.
    GraphSelected(String),
    CheckHealth,
    HideResults,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorKind {
    /// Rejected before any network call.
    Validation,
    /// Server answered with a non-2xx status.
    Http,
    /// Nothing listening at the relay's base URL.
    Unreachable,
    /// Server answered but reported `success: false`.
    Server,
    /// The relay itself failed to deliver the request.
    Transport,
}

/// Classifies a relay failure message that came back inside a response.
pub fn classify_failure(message: &str) -> UiErrorKind {
    if message == START_SERVER_HINT || message.starts_with("Cannot connect") {
        UiErrorKind::Unreachable
    } else if is_http_status_message(message) {
        UiErrorKind::Http
    } else {
        UiErrorKind::Server
    }
}

fn is_http_status_message(message: &str) -> bool {
    message
        .strip_prefix("HTTP ")
        .and_then(|rest| rest.split(':').next())
        .is_some_and(|code| code.len() == 3 && code.bytes().all(|b| b.is_ascii_digit()))
}

#[cfg(test)]
#[path = "tests/events_tests.rs"]
mod tests;
