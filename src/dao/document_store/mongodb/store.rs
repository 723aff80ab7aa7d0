use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Collection, Database, IndexModel,
    bson::{Document as BsonDocument, doc},
    options::{IndexOptions, ReturnDocument},
};
use tokio::sync::RwLock;
use tracing::debug;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{fields_document, filter_document, id_filter, into_document, sort_document},
};
use crate::dao::{
    document_store::DocumentStore,
    models::{Document, Fields, Filter, RecordId, SORTED_COLLECTIONS},
    storage::StorageResult,
};

/// MongoDB-backed [`DocumentStore`], one collection per entity kind.
#[derive(Clone)]
pub struct MongoDocumentStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    database: RwLock<Database>,
    config: MongoConfig,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = self.database.read().await.clone();

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (_client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        *self.database.write().await = database;
        Ok(())
    }
}

impl MongoDocumentStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (_client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            database: RwLock::new(database),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    /// Index every collection on its sort tuple so listings stay cheap.
    async fn ensure_indexes(&self) -> MongoResult<()> {
        for (collection, keys) in SORTED_COLLECTIONS {
            let index_name = format!("{collection}_sort_idx");
            let index = IndexModel::builder()
                .keys(sort_document(keys))
                .options(
                    IndexOptions::builder()
                        .name(Some(index_name.clone()))
                        .build(),
                )
                .build();

            self.collection(collection)
                .await
                .create_index(index)
                .await
                .map_err(|source| MongoDaoError::EnsureIndex {
                    collection,
                    index: index_name,
                    source,
                })?;
        }

        Ok(())
    }

    async fn collection(&self, name: &str) -> Collection<BsonDocument> {
        let guard = self.inner.database.read().await;
        guard.collection::<BsonDocument>(name)
    }

    async fn find(
        &self,
        collection: &'static str,
        filter: Filter,
        sort: &[&str],
    ) -> MongoResult<Vec<Document>> {
        let documents: Vec<BsonDocument> = self
            .collection(collection)
            .await
            .find(filter_document(&filter))
            .sort(sort_document(sort))
            .await
            .map_err(|source| MongoDaoError::Find { collection, source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::Find { collection, source })?;

        Ok(documents.into_iter().filter_map(into_document).collect())
    }

    async fn find_one(
        &self,
        collection: &'static str,
        id: RecordId,
    ) -> MongoResult<Option<Document>> {
        let document = self
            .collection(collection)
            .await
            .find_one(id_filter(&id))
            .await
            .map_err(|source| MongoDaoError::Load {
                collection,
                id: id.clone(),
                source,
            })?;

        Ok(document.and_then(into_document))
    }

    async fn insert(&self, collection: &'static str, fields: Fields) -> MongoResult<Document> {
        let result = self
            .collection(collection)
            .await
            .insert_one(fields_document(&fields))
            .await
            .map_err(|source| MongoDaoError::Insert { collection, source })?;

        let id = result
            .inserted_id
            .as_object_id()
            .and_then(|oid| RecordId::parse(&oid.to_hex()).ok())
            .ok_or(MongoDaoError::MissingInsertedId { collection })?;
        debug!(collection, %id, "inserted document");

        Ok(Document { id, fields })
    }

    async fn update(
        &self,
        collection: &'static str,
        id: RecordId,
        set: Fields,
    ) -> MongoResult<Option<Document>> {
        // An empty `$set` is rejected by the server, so a no-op patch is a plain read.
        if set.is_empty() {
            return self.find_one(collection, id).await;
        }

        let updated = self
            .collection(collection)
            .await
            .find_one_and_update(id_filter(&id), doc! { "$set": fields_document(&set) })
            .return_document(ReturnDocument::After)
            .await
            .map_err(|source| MongoDaoError::Update {
                collection,
                id: id.clone(),
                source,
            })?;

        Ok(updated.and_then(into_document))
    }

    async fn delete(&self, collection: &'static str, id: RecordId) -> MongoResult<u64> {
        let result = self
            .collection(collection)
            .await
            .delete_one(id_filter(&id))
            .await
            .map_err(|source| MongoDaoError::Delete {
                collection,
                id: id.clone(),
                source,
            })?;

        Ok(result.deleted_count)
    }
}

impl DocumentStore for MongoDocumentStore {
    fn find(
        &self,
        collection: &'static str,
        filter: Filter,
        sort: &'static [&'static str],
    ) -> BoxFuture<'static, StorageResult<Vec<Document>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find(collection, filter, sort)
                .await
                .map_err(Into::into)
        })
    }

    fn find_one(
        &self,
        collection: &'static str,
        id: RecordId,
    ) -> BoxFuture<'static, StorageResult<Option<Document>>> {
        let store = self.clone();
        Box::pin(async move { store.find_one(collection, id).await.map_err(Into::into) })
    }

    fn insert(
        &self,
        collection: &'static str,
        fields: Fields,
    ) -> BoxFuture<'static, StorageResult<Document>> {
        let store = self.clone();
        Box::pin(async move { store.insert(collection, fields).await.map_err(Into::into) })
    }

    fn update(
        &self,
        collection: &'static str,
        id: RecordId,
        set: Fields,
    ) -> BoxFuture<'static, StorageResult<Option<Document>>> {
        let store = self.clone();
        Box::pin(async move { store.update(collection, id, set).await.map_err(Into::into) })
    }

    fn delete(
        &self,
        collection: &'static str,
        id: RecordId,
    ) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move { store.delete(collection, id).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
