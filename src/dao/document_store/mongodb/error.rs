//! Error types raised by the MongoDB storage implementation.

use mongodb::error::Error as MongoError;
use thiserror::Error;

use crate::dao::models::RecordId;

/// Result alias returning [`MongoDaoError`] failures.
pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

/// Failures that can occur while interacting with MongoDB.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    /// The connection string could not be parsed.
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        /// Rejected connection string.
        uri: String,
        /// Underlying error.
        #[source]
        source: MongoError,
    },
    /// The driver rejected the client options.
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        /// Underlying error.
        #[source]
        source: MongoError,
    },
    /// The server never answered a ping while connecting.
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        /// Pings tried.
        attempts: u32,
        /// Underlying error.
        #[source]
        source: MongoError,
    },
    /// A periodic health ping failed.
    #[error("MongoDB ping health check failed")]
    HealthPing {
        /// Underlying error.
        #[source]
        source: MongoError,
    },
    /// Index creation failed at connect time.
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        /// Target collection.
        collection: &'static str,
        /// Index name.
        index: String,
        /// Underlying error.
        #[source]
        source: MongoError,
    },
    /// A search could not be run.
    #[error("failed to query collection `{collection}`")]
    Find {
        /// Target collection.
        collection: &'static str,
        /// Underlying error.
        #[source]
        source: MongoError,
    },
    /// An insert was rejected.
    #[error("failed to insert into collection `{collection}`")]
    Insert {
        /// Target collection.
        collection: &'static str,
        /// Underlying error.
        #[source]
        source: MongoError,
    },
    /// The insert result carried no ObjectId.
    #[error("MongoDB did not report an ObjectId for the document inserted into `{collection}`")]
    MissingInsertedId {
        /// Target collection.
        collection: &'static str,
    },
    /// A single-document lookup failed.
    #[error("failed to load `{id}` from collection `{collection}`")]
    Load {
        /// Target collection.
        collection: &'static str,
        /// Target record.
        id: RecordId,
        /// Underlying error.
        #[source]
        source: MongoError,
    },
    /// An update was rejected.
    #[error("failed to update `{id}` in collection `{collection}`")]
    Update {
        /// Target collection.
        collection: &'static str,
        /// Target record.
        id: RecordId,
        /// Underlying error.
        #[source]
        source: MongoError,
    },
    /// A delete was rejected.
    #[error("failed to delete `{id}` from collection `{collection}`")]
    Delete {
        /// Target collection.
        collection: &'static str,
        /// Target record.
        id: RecordId,
        /// Underlying error.
        #[source]
        source: MongoError,
    },
}
