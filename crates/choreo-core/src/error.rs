//! Error types for the Choreo session engine.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Network error calling {endpoint}: {message}")]
    Network { endpoint: String, message: String },

    #[error("Backend returned HTTP {status} for {endpoint}")]
    HttpStatus { endpoint: String, status: u16 },

    #[error("Data format error: {0}")]
    DataFormat(String),

    #[error("Invalid video id '{0}'")]
    InvalidVideoId(String),

    #[error("Media playback error: {0}")]
    MediaPlayback(String),

    #[error("Cannot {action} while {state}")]
    InvalidTransition { state: String, action: &'static str },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Timeout after {duration_ms}ms")]
    Timeout { duration_ms: u64 },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Transport failures and non-success statuses are both treated as a
    /// network failure by callers that only degrade the UI.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            Error::Network { .. } | Error::HttpStatus { .. } | Error::Timeout { .. }
        )
    }

    pub fn network(endpoint: impl Into<String>, message: impl ToString) -> Self {
        Error::Network {
            endpoint: endpoint.into(),
            message: message.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
