#[cfg(feature = "couch-store")]
/// CouchDB backend.
pub mod couchdb;
/// In-process backend.
pub mod memory;
#[cfg(feature = "mongo-store")]
/// MongoDB backend.
pub mod mongodb;

use futures::future::BoxFuture;

use crate::dao::{
    models::{Document, Fields, Filter, RecordId},
    storage::StorageResult,
};

/// Abstraction over the persistence layer holding the flat record collections.
///
/// Every collection maps a generated [`RecordId`] to a set of string fields.
/// No referential integrity is enforced at this level.
pub trait DocumentStore: Send + Sync {
    /// Return the documents matching `filter`, sorted ascending by `sort`.
    fn find(
        &self,
        collection: &'static str,
        filter: Filter,
        sort: &'static [&'static str],
    ) -> BoxFuture<'static, StorageResult<Vec<Document>>>;
    /// Load a single document.
    fn find_one(
        &self,
        collection: &'static str,
        id: RecordId,
    ) -> BoxFuture<'static, StorageResult<Option<Document>>>;
    /// Insert a new document and return it with its generated identifier.
    fn insert(
        &self,
        collection: &'static str,
        fields: Fields,
    ) -> BoxFuture<'static, StorageResult<Document>>;
    /// Overwrite the given fields of an existing document.
    ///
    /// Returns the full updated document, or `None` when `id` is unknown.
    fn update(
        &self,
        collection: &'static str,
        id: RecordId,
        set: Fields,
    ) -> BoxFuture<'static, StorageResult<Option<Document>>>;
    /// Remove a document, returning how many were deleted (0 or 1).
    fn delete(&self, collection: &'static str, id: RecordId)
    -> BoxFuture<'static, StorageResult<u64>>;
    /// Probe the backend.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Re-establish the backend connection after a failed health check.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
