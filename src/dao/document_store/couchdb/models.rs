//! Wire shapes of CouchDB documents and `_all_docs` listings.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dao::models::{Document, Fields, RecordId};

/// Separates the collection name from the record id in document keys.
pub const KEY_SEPARATOR: &str = "::";
/// Upper bound appended to a key prefix for `_all_docs` ranges.
pub const END_SUFFIX: &str = "\u{ffff}";

/// Body of an `_all_docs?include_docs=true` answer.
#[derive(Debug, Deserialize)]
pub struct AllDocsResponse {
    /// One row per key in range.
    pub rows: Vec<AllDocsRow>,
}

/// Row of an `_all_docs` answer.
#[derive(Debug, Deserialize)]
pub struct AllDocsRow {
    /// Document key.
    pub id: String,
    /// Document body; absent for deleted rows.
    #[serde(default)]
    pub doc: Option<Value>,
}

/// Stored record: CouchDB metadata plus the flat string fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchRecordDocument {
    /// `{collection}::{id}` key.
    #[serde(rename = "_id")]
    pub id: String,
    /// Revision, required for updates and deletes.
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    /// Record fields.
    #[serde(flatten)]
    pub fields: Fields,
}

impl CouchRecordDocument {
    /// New document for `id` in `collection`, without a revision.
    pub fn new(collection: &str, id: &RecordId, fields: Fields) -> Self {
        Self {
            id: record_doc_id(collection, id),
            rev: None,
            fields,
        }
    }

    /// Strip the collection prefix, returning `None` for foreign documents.
    pub fn into_document(self, collection: &str) -> Option<Document> {
        let raw_id = self.id.strip_prefix(&collection_prefix(collection))?;
        let id = RecordId::parse(raw_id).ok()?;
        Some(Document {
            id,
            fields: self.fields,
        })
    }
}

/// Key prefix shared by every document of a collection.
pub fn collection_prefix(collection: &str) -> String {
    format!("{collection}{KEY_SEPARATOR}")
}

/// Document key of record `id` in `collection`.
pub fn record_doc_id(collection: &str, id: &RecordId) -> String {
    format!("{}{id}", collection_prefix(collection))
}
