use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::from_value;
use tracing::debug;

use crate::dao::{
    document_store::DocumentStore,
    models::{Document, Fields, Filter, RecordId, compare_by_keys},
    storage::StorageResult,
};

use super::{
    config::CouchConfig,
    error::{CouchDaoError, CouchResult},
    models::{AllDocsResponse, CouchRecordDocument, END_SUFFIX, collection_prefix, record_doc_id},
};

/// CouchDB-backed [`DocumentStore`] keeping every collection in one database.
///
/// Documents are keyed `"{collection}::{id}"`; listings use an `_all_docs` key
/// range and are filtered and sorted in process.
#[derive(Clone)]
pub struct CouchDocumentStore {
    client: Client,
    base_url: Arc<str>,
    database: Arc<str>,
    auth: Option<(Arc<str>, Arc<str>)>,
}

impl CouchDocumentStore {
    /// Establish a connection to CouchDB and ensure the database exists.
    pub async fn connect(config: CouchConfig) -> CouchResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| CouchDaoError::ClientBuilder { source })?;

        let base_url = Arc::<str>::from(config.base_url.trim_end_matches('/'));
        let database = Arc::<str>::from(config.database);
        let auth = config
            .username
            .zip(config.password)
            .map(|(u, p)| (Arc::<str>::from(u), Arc::<str>::from(p)));

        let store = Self {
            client,
            base_url,
            database,
            auth,
        };

        store.ensure_database().await?;
        Ok(store)
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some((ref user, ref pass)) = self.auth {
            builder.basic_auth(user.as_ref(), Some(pass.as_ref()))
        } else {
            builder
        }
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}/{}", self.base_url, self.database, path);
        self.authorize(self.client.request(method, url))
    }

    fn database_url(&self) -> String {
        format!("{}/{}", self.base_url, self.database)
    }

    async fn ensure_database(&self) -> CouchResult<()> {
        let database = self.database.to_string();
        let url = self.database_url();

        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(|source| CouchDaoError::DatabaseQuery {
                database: database.clone(),
                source,
            })?;

        match response.status() {
            StatusCode::OK => Ok(()),
            StatusCode::NOT_FOUND => {
                let create = self
                    .authorize(self.client.put(&url))
                    .send()
                    .await
                    .map_err(|source| CouchDaoError::DatabaseCreate {
                        database: database.clone(),
                        source,
                    })?;
                if create.status().is_success() {
                    debug!(%database, "created CouchDB database");
                    Ok(())
                } else {
                    Err(CouchDaoError::DatabaseStatus {
                        database,
                        status: create.status(),
                    })
                }
            }
            other => Err(CouchDaoError::DatabaseStatus {
                database,
                status: other,
            }),
        }
    }

    async fn ping(&self) -> CouchResult<()> {
        let url = self.database_url();
        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: url.clone(),
                source,
            })?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(CouchDaoError::RequestStatus {
                path: url,
                status: response.status(),
            })
        }
    }

    async fn get_document<T>(&self, doc_id: &str) -> CouchResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let response = self
            .request(Method::GET, doc_id)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                response.json::<T>().await.map(Some).map_err(|source| {
                    CouchDaoError::DecodeResponse {
                        path: doc_id.to_string(),
                        source,
                    }
                })
            }
            other => Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status: other,
            }),
        }
    }

    async fn put_document<T>(&self, doc_id: &str, document: &T) -> CouchResult<()>
    where
        T: ?Sized + Serialize,
    {
        let response = self
            .request(Method::PUT, doc_id)
            .json(document)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_string(),
                source,
            })?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status: response.status(),
            })
        }
    }

    async fn delete_document(&self, doc_id: &str, rev: &str) -> CouchResult<()> {
        let response = self
            .request(Method::DELETE, doc_id)
            .query(&[("rev", rev)])
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_string(),
                source,
            })?;

        match response.status() {
            // Someone else removed it first.
            StatusCode::NOT_FOUND => Ok(()),
            status if status.is_success() => Ok(()),
            other => Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status: other,
            }),
        }
    }

    async fn list_documents<T>(&self, prefix: &str) -> CouchResult<Vec<T>>
    where
        T: DeserializeOwned,
    {
        const ALL_DOCS: &str = "_all_docs";
        let query = [
            ("include_docs", "true".to_string()),
            ("startkey", format!("\"{}\"", prefix)),
            ("endkey", format!("\"{}{}\"", prefix, END_SUFFIX)),
        ];

        let response = self
            .request(Method::GET, ALL_DOCS)
            .query(&query)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: ALL_DOCS.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(CouchDaoError::RequestStatus {
                path: ALL_DOCS.to_string(),
                status: response.status(),
            });
        }

        let payload = response.json::<AllDocsResponse>().await.map_err(|source| {
            CouchDaoError::DecodeResponse {
                path: ALL_DOCS.to_string(),
                source,
            }
        })?;

        let mut documents = Vec::new();
        for row in payload.rows {
            if let Some(doc) = row.doc {
                let parsed = from_value(doc).map_err(|source| CouchDaoError::DeserializeValue {
                    path: row.id,
                    source,
                })?;
                documents.push(parsed);
            }
        }

        Ok(documents)
    }

    async fn find(
        &self,
        collection: &'static str,
        filter: Filter,
        sort: &[&str],
    ) -> CouchResult<Vec<Document>> {
        let mut documents = self
            .list_documents::<CouchRecordDocument>(&collection_prefix(collection))
            .await?
            .into_iter()
            .filter_map(|doc| doc.into_document(collection))
            .filter(|doc| filter.matches(&doc.fields))
            .collect::<Vec<_>>();

        documents.sort_by(|a, b| compare_by_keys(&a.fields, &b.fields, sort));
        Ok(documents)
    }

    async fn find_one(
        &self,
        collection: &'static str,
        id: &RecordId,
    ) -> CouchResult<Option<CouchRecordDocument>> {
        self.get_document::<CouchRecordDocument>(&record_doc_id(collection, id))
            .await
    }

    async fn insert(&self, collection: &'static str, fields: Fields) -> CouchResult<Document> {
        let id = RecordId::generate();
        let document = CouchRecordDocument::new(collection, &id, fields);
        self.put_document(&document.id, &document).await?;
        debug!(collection, %id, "inserted document");

        Ok(Document {
            id,
            fields: document.fields,
        })
    }

    async fn update(
        &self,
        collection: &'static str,
        id: RecordId,
        set: Fields,
    ) -> CouchResult<Option<Document>> {
        let Some(mut existing) = self.find_one(collection, &id).await? else {
            return Ok(None);
        };

        if !set.is_empty() {
            existing.fields.extend(set);
            self.put_document(&existing.id, &existing).await?;
        }

        Ok(Some(Document {
            id,
            fields: existing.fields,
        }))
    }

    async fn delete(&self, collection: &'static str, id: RecordId) -> CouchResult<u64> {
        let Some(existing) = self.find_one(collection, &id).await? else {
            return Ok(0);
        };
        let Some(rev) = existing.rev else {
            return Ok(0);
        };

        self.delete_document(&existing.id, &rev).await?;
        Ok(1)
    }
}

impl DocumentStore for CouchDocumentStore {
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
        Box::pin(async move {
            let maybe_doc = store.find_one(collection, &id).await?;
            Ok(maybe_doc.and_then(|doc| doc.into_document(collection)))
        })
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
        Box::pin(async move { store.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ensure_database().await.map_err(Into::into) })
    }
}
