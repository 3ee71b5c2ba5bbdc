use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    /// A generation call was made before a session key was set.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Failures talking to the upstream endpoints. Never retried.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("request timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("upstream returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("{message}")]
    Network {
        message: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{message}")]
    Decode {
        message: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl TransportError {
    pub(crate) fn from_reqwest(error: reqwest::Error, timeout: Duration, context: &str) -> Self {
        if error.is_timeout() {
            TransportError::Timeout { timeout }
        } else {
            TransportError::Network {
                message: format!("{context}: {error}"),
                source: error,
            }
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout { .. })
    }

    /// HTTP status of a rejected request, if the server answered at all.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// A streaming line that could not be turned into a fragment.
///
/// Logged and discarded by [`FragmentStream`](crate::core::sse::FragmentStream);
/// it never reaches the caller of `stream_generate`.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("malformed stream event ({reason}): {line}")]
pub struct MalformedStreamEvent {
    pub line: String,
    pub reason: String,
}
