use reqwest::{Method, StatusCode};
use thiserror::Error;

/// Convenient result alias returning [`ClientError`] failures.
pub type ClientResult<T> = Result<T, ClientError>;

/// Failures surfaced to the pages by the [`Backend`](super::Backend) facade.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Building the HTTP client failed.
    #[error("failed to build HTTP client")]
    Setup {
        /// Underlying error.
        #[source]
        source: reqwest::Error,
    },
    /// The request could not be sent or its body could not be read.
    #[error("{method} {path} failed")]
    Transport {
        /// HTTP method of the request.
        method: Method,
        /// Request path.
        path: String,
        /// Underlying error.
        #[source]
        source: reqwest::Error,
    },
    /// The server answered with a non-2xx status.
    #[error("{message} ({status})")]
    Status {
        /// Status code returned.
        status: StatusCode,
        /// Server `message`, or the raw body when there was none.
        message: String,
    },
    /// A JSON body did not have the expected shape.
    #[error("unexpected JSON for `{path}`")]
    Json {
        /// Request path.
        path: String,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },
    /// Input rejected before any request was issued.
    #[error("{0}")]
    Validation(String),
}

impl ClientError {
    /// HTTP status of a [`ClientError::Status`] failure.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
