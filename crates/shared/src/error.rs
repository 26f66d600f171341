use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Category of a failed submit attempt as seen by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    ClientValidation,
    ServerValidation,
    Transport,
}

/// The submit call itself failed; no application-level answer was received.
///
/// The `Display` text is what the form surfaces as its summary error message.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "type", content = "detail", rename_all = "snake_case")]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("server responded with status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("malformed server response: {0}")]
    Decode(String),
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
