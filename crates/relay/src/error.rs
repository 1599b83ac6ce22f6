use thiserror::Error;

/// Hint shown when nothing answers at the configured base URL.
pub const START_SERVER_HINT: &str =
    "Cannot connect to Logseq server. Is it running? Start it with: logseq-server";

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("HTTP {status}: {reason}")]
    Status { status: u16, reason: String },
    #[error("{}", START_SERVER_HINT)]
    Unreachable {
        #[source]
        source: reqwest::Error,
    },
    #[error("{0}")]
    Transport(#[source] reqwest::Error),
    #[error("invalid relay url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl RelayError {
    pub fn status(&self) -> Option<u16> {
        match self {
            RelayError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for RelayError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_connect() {
            RelayError::Unreachable { source: error }
        } else if let Some(status) = error.status() {
            RelayError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            }
        } else {
            RelayError::Transport(error)
        }
    }
}
