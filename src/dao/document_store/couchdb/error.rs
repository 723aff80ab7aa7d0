//! Error types shared by the CouchDB storage implementation.

use reqwest::StatusCode;
use thiserror::Error;

/// Convenient result alias returning [`CouchDaoError`] failures.
pub type CouchResult<T> = Result<T, CouchDaoError>;

/// Failures that can occur while interacting with CouchDB.
#[derive(Debug, Error)]
pub enum CouchDaoError {
    /// Building the HTTP client failed (invalid TLS setup, etc).
    #[error("failed to build CouchDB client")]
    ClientBuilder {
        /// Underlying error.
        #[source]
        source: reqwest::Error,
    },
    /// CouchDB rejected a GET against the target database.
    #[error("failed to query CouchDB database `{database}`")]
    DatabaseQuery {
        /// Target database.
        database: String,
        /// Underlying error.
        #[source]
        source: reqwest::Error,
    },
    /// CouchDB rejected a database creation request.
    #[error("failed to create CouchDB database `{database}`")]
    DatabaseCreate {
        /// Target database.
        database: String,
        /// Underlying error.
        #[source]
        source: reqwest::Error,
    },
    /// CouchDB returned an unexpected status code for a database operation.
    #[error("unexpected CouchDB database response status {status} for `{database}`")]
    DatabaseStatus {
        /// Target database.
        database: String,
        /// Status code returned.
        status: StatusCode,
    },
    /// A request to a document endpoint could not be sent.
    #[error("failed to send CouchDB request to `{path}`")]
    RequestSend {
        /// Request path.
        path: String,
        /// Underlying error.
        #[source]
        source: reqwest::Error,
    },
    /// CouchDB returned an unexpected status code for a document endpoint.
    #[error("unexpected CouchDB response status {status} for `{path}`")]
    RequestStatus {
        /// Request path.
        path: String,
        /// Status code returned.
        status: StatusCode,
    },
    /// Response payload could not be parsed into JSON.
    #[error("failed to decode CouchDB response for `{path}`")]
    DecodeResponse {
        /// Request path.
        path: String,
        /// Underlying error.
        #[source]
        source: reqwest::Error,
    },
    /// Decoding a JSON value into the expected model failed.
    #[error("failed to deserialize CouchDB value for `{path}`")]
    DeserializeValue {
        /// Request path.
        path: String,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },
}
