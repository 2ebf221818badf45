use reqwest::StatusCode;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}
impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.to_string().as_str())
    }
}
pub type AppResult<T> = Result<T, AppError>;

/// Failure of a single relay attempt. Upstream answers are never retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RelayError {
    /// Upstream answered with a non-2xx status; body is kept verbatim.
    #[error("upstream returned {status}: {body}")]
    UpstreamStatus { status: StatusCode, body: String },

    /// Connect failure, timeout, unreadable body or malformed JSON.
    #[error("{0}")]
    Transport(String),
}

impl RelayError {
    pub fn upstream_status(&self) -> Option<StatusCode> {
        match self {
            RelayError::UpstreamStatus { status, .. } => Some(*status),
            RelayError::Transport(_) => None,
        }
    }
}

pub type ChatResult = Result<String, RelayError>;
