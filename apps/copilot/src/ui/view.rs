use std::fmt::{self, Write as _};

use serde_json::Value;
use shared::domain::GraphName;

use crate::controller::events::UiErrorKind;

pub const PLACEHOLDER_LABEL: &str = "-- Select a graph --";

pub const HELP_PANEL: &str = "\
The Logseq server is not reachable.
Start it with: logseq-server
(it listens on http://localhost:8080 by default)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Unknown,
    Connected,
    Disconnected,
}

impl ConnectionStatus {
    pub fn label(self) -> &'static str {
        match self {
            ConnectionStatus::Unknown => "Unknown",
            ConnectionStatus::Connected => "Connected",
            ConnectionStatus::Disconnected => "Disconnected",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Text(String),
    Json(Value),
}

impl Payload {
    /// Strings render verbatim; any other JSON value is pretty-printed.
    pub fn render(&self) -> String {
        match self {
            Payload::Text(text) | Payload::Json(Value::String(text)) => text.clone(),
            Payload::Json(value) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
        }
    }
}

impl From<&str> for Payload {
    fn from(value: &str) -> Self {
        Payload::Text(value.to_string())
    }
}

impl From<String> for Payload {
    fn from(value: String) -> Self {
        Payload::Text(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tone {
    #[default]
    Success,
    Error(UiErrorKind),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultArea {
    pub visible: bool,
    pub tone: Tone,
    pub text: String,
}

impl ResultArea {
    pub fn is_error(&self) -> bool {
        matches!(self.tone, Tone::Error(_))
    }
}

/// Selection control: a placeholder followed by the listed graph names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphSelect {
    options: Vec<GraphName>,
    selected: Option<usize>,
}

impl GraphSelect {
    /// Replaces the options; the selection falls back to the placeholder.
    pub fn populate(&mut self, names: Vec<GraphName>) {
        self.options = names;
        self.selected = None;
    }

    pub fn options(&self) -> &[GraphName] {
        &self.options
    }

    /// Picks the option with this value. The empty value picks the
    /// placeholder; values that are not listed leave the selection unchanged.
    pub fn choose(&mut self, value: &str) -> bool {
        if value.is_empty() {
            self.selected = None;
            return true;
        }
        match self.options.iter().position(|name| name.as_str() == value) {
            Some(index) => {
                self.selected = Some(index);
                true
            }
            None => false,
        }
    }

    pub fn selected(&self) -> Option<&GraphName> {
        self.selected.and_then(|index| self.options.get(index))
    }
}

#[derive(Debug, Clone, Default)]
pub struct PopupView {
    pub status: ConnectionStatus,
    pub help_visible: bool,
    pub results: ResultArea,
    pub graph_select: GraphSelect,
    pub search_input: String,
    pub query_input: String,
}

impl PopupView {
    pub fn set_connected(&mut self, connected: bool) {
        if connected {
            self.status = ConnectionStatus::Connected;
            self.help_visible = false;
        } else {
            self.status = ConnectionStatus::Disconnected;
            self.help_visible = true;
        }
    }

    pub fn display(&mut self, payload: impl Into<Payload>, tone: Tone) {
        self.results = ResultArea {
            visible: true,
            tone,
            text: payload.into().render(),
        };
    }

    pub fn display_error(&mut self, kind: UiErrorKind, message: impl Into<String>) {
        self.display(Payload::Text(message.into()), Tone::Error(kind));
    }

    pub fn hide_results(&mut self) {
        self.results.visible = false;
    }
}

impl fmt::Display for PopupView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Logseq Copilot [{}]", self.status.label())?;

        let selected = self
            .graph_select
            .selected()
            .map(GraphName::as_str)
            .unwrap_or(PLACEHOLDER_LABEL);
        writeln!(
            f,
            "Graph: {selected} ({} available)",
            self.graph_select.options().len()
        )?;

        if self.help_visible {
            for line in HELP_PANEL.lines() {
                writeln!(f, "  ! {line}")?;
            }
        }

        if self.results.visible {
            let mut header = String::from("-- ");
            match self.results.tone {
                Tone::Success => header.push_str("result"),
                Tone::Error(kind) => {
                    let _ = write!(header, "error ({})", error_label(kind));
                }
            }
            header.push_str(" --");
            writeln!(f, "{header}")?;
            writeln!(f, "{}", self.results.text)?;
        }
        Ok(())
    }
}

fn error_label(kind: UiErrorKind) -> &'static str {
    match kind {
        UiErrorKind::Validation => "input",
        UiErrorKind::Http => "http",
        UiErrorKind::Unreachable => "unreachable",
        UiErrorKind::Server => "server",
        UiErrorKind::Transport => "transport",
    }
}

#[cfg(test)]
#[path = "tests/view_tests.rs"]
mod tests;
