use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Message returned for action names the relay does not know.
pub const UNKNOWN_ACTION: &str = "Unknown action";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    Health,
    ListGraphs,
    ShowGraph,
    Search,
    Query,
}

impl Action {
    pub const ALL: [Action; 5] = [
        Action::Health,
        Action::ListGraphs,
        Action::ShowGraph,
        Action::Search,
        Action::Query,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Action::Health => "health",
            Action::ListGraphs => "listGraphs",
            Action::ShowGraph => "showGraph",
            Action::Search => "search",
            Action::Query => "query",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown action: {0}")]
pub struct UnknownAction(pub String);

impl FromStr for Action {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| UnknownAction(s.to_string()))
    }
}

/// A named action sent from the presenter to the relay.
///
/// The action travels as a plain string so that names outside [`Action`]
/// survive decoding and can be answered with [`UNKNOWN_ACTION`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

impl ActionRequest {
    fn new(action: Action) -> Self {
        Self {
            action: action.as_str().to_string(),
            graph: None,
            query: None,
        }
    }

    pub fn health() -> Self {
        Self::new(Action::Health)
    }

    pub fn list_graphs() -> Self {
        Self::new(Action::ListGraphs)
    }

    pub fn show_graph(graph: impl Into<String>) -> Self {
        Self {
            graph: Some(graph.into()),
            ..Self::new(Action::ShowGraph)
        }
    }

    pub fn search(query: impl Into<String>, graph: Option<String>) -> Self {
        Self {
            graph,
            query: Some(query.into()),
            ..Self::new(Action::Search)
        }
    }

    pub fn query(graph: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            graph: Some(graph.into()),
            query: Some(query.into()),
            ..Self::new(Action::Query)
        }
    }

    pub fn named(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            graph: None,
            query: None,
        }
    }

    pub fn kind(&self) -> Result<Action, UnknownAction> {
        self.action.parse()
    }
}

/// Loosely shaped JSON answer to an [`ActionRequest`].
///
/// Every field is optional; readers pick whichever of `data`, `stdout`,
/// `error` or `stderr` is present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub returncode: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl ActionResponse {
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }

    pub fn unknown_action() -> Self {
        Self::failure(UNKNOWN_ACTION)
    }

    pub fn is_healthy(&self) -> bool {
        self.success || self.status.as_deref() == Some(HEALTHY_STATUS)
    }

    /// The failure text shown to users: `error`, falling back to `stderr`.
    pub fn failure_message(&self) -> &str {
        non_empty(self.error.as_deref())
            .or_else(|| non_empty(self.stderr.as_deref()))
            .unwrap_or("unknown error")
    }

    /// Structured payload, ignoring `null` and empty strings.
    pub fn present_data(&self) -> Option<&Value> {
        match self.data.as_ref()? {
            Value::Null => None,
            Value::String(s) if s.is_empty() => None,
            Value::Bool(false) => None,
            Value::Number(n) if n.as_f64() == Some(0.0) => None,
            value => Some(value),
        }
    }

    pub fn present_stdout(&self) -> Option<&str> {
        non_empty(self.stdout.as_deref())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

pub const HEALTHY_STATUS: &str = "healthy";

/// JSON body of `POST /query`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryBody {
    pub graph: String,
    pub query: String,
}

/// Query string of `GET /search`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub graph: Option<String>,
}

/// Query string of `GET /show`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowParams {
    #[serde(default)]
    pub graph: Option<String>,
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
