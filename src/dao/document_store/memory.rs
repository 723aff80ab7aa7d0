//! Process-local document store used for tests and database-less runs.

use std::sync::Arc;

use dashmap::DashMap;
use futures::future::{BoxFuture, ready};
use indexmap::IndexMap;

use crate::dao::{
    document_store::DocumentStore,
    models::{Document, Fields, Filter, RecordId, compare_by_keys},
    storage::StorageResult,
};

type Collection = IndexMap<RecordId, Fields>;

/// In-memory [`DocumentStore`] backed by one map per collection.
#[derive(Clone, Default)]
pub struct MemoryDocumentStore {
    collections: Arc<DashMap<&'static str, Collection>>,
}

impl MemoryDocumentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn find_sync(
        &self,
        collection: &'static str,
        filter: &Filter,
        sort: &[&str],
    ) -> Vec<Document> {
        let Some(entries) = self.collections.get(collection) else {
            return Vec::new();
        };

        let mut documents = entries
            .iter()
            .filter(|(_, fields)| filter.matches(fields))
            .map(|(id, fields)| Document {
                id: id.clone(),
                fields: fields.clone(),
            })
            .collect::<Vec<_>>();
        drop(entries);

        documents.sort_by(|a, b| compare_by_keys(&a.fields, &b.fields, sort));
        documents
    }

    fn find_one_sync(&self, collection: &'static str, id: &RecordId) -> Option<Document> {
        self.collections
            .get(collection)?
            .get(id)
            .map(|fields| Document {
                id: id.clone(),
                fields: fields.clone(),
            })
    }

    fn insert_sync(&self, collection: &'static str, fields: Fields) -> Document {
        let id = RecordId::generate();
        self.collections
            .entry(collection)
            .or_default()
            .insert(id.clone(), fields.clone());
        Document { id, fields }
    }

    fn update_sync(&self, collection: &'static str, id: &RecordId, set: Fields) -> Option<Document> {
        let mut entries = self.collections.get_mut(collection)?;
        let fields = entries.get_mut(id)?;
        fields.extend(set);
        Some(Document {
            id: id.clone(),
            fields: fields.clone(),
        })
    }

    fn delete_sync(&self, collection: &'static str, id: &RecordId) -> u64 {
        self.collections
            .get_mut(collection)
            .and_then(|mut entries| entries.shift_remove(id))
            .map_or(0, |_| 1)
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn find(
        &self,
        collection: &'static str,
        filter: Filter,
        sort: &'static [&'static str],
    ) -> BoxFuture<'static, StorageResult<Vec<Document>>> {
        Box::pin(ready(Ok(self.find_sync(collection, &filter, sort))))
    }

    fn find_one(
        &self,
        collection: &'static str,
        id: RecordId,
    ) -> BoxFuture<'static, StorageResult<Option<Document>>> {
        Box::pin(ready(Ok(self.find_one_sync(collection, &id))))
    }

    fn insert(
        &self,
        collection: &'static str,
        fields: Fields,
    ) -> BoxFuture<'static, StorageResult<Document>> {
        Box::pin(ready(Ok(self.insert_sync(collection, fields))))
    }

    fn update(
        &self,
        collection: &'static str,
        id: RecordId,
        set: Fields,
    ) -> BoxFuture<'static, StorageResult<Option<Document>>> {
        Box::pin(ready(Ok(self.update_sync(collection, &id, set))))
    }

    fn delete(
        &self,
        collection: &'static str,
        id: RecordId,
    ) -> BoxFuture<'static, StorageResult<u64>> {
        Box::pin(ready(Ok(self.delete_sync(collection, &id))))
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(ready(Ok(())))
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(ready(Ok(())))
    }
}
