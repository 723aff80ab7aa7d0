/// Document storage backends and the trait they implement.
pub mod document_store;
/// Record identifiers, stored documents and the per-entity shape descriptors.
pub mod models;
/// Storage abstraction layer for database operations.
pub mod storage;
