//! Navigation metadata attached to every record the API returns.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::dao::models::{RecordId, Stored};

/// A single hypermedia link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Link {
    /// Absolute path of the target resource.
    #[schema(example = "/player/65a1f0c2e4b0a1b2c3d4e5f6")]
    pub url: String,
    /// HTTP method to use against `url`.
    #[schema(example = "GET")]
    pub method: String,
}

impl Link {
    fn new(url: &str, method: &str) -> Self {
        Self {
            url: url.to_owned(),
            method: method.to_owned(),
        }
    }
}

/// The four operations available on an entity endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Links {
    /// `GET` the record.
    pub read: Link,
    /// `PUT` over the record.
    pub update: Link,
    /// `PATCH` the record.
    pub patch: Link,
    /// `DELETE` the record.
    pub delete: Link,
}

impl Links {
    /// Links for the record `id` living under the collection path `collection_url`.
    pub fn for_record(collection_url: &str, id: &RecordId) -> Self {
        let url = format!("{collection_url}/{id}");
        Self {
            read: Link::new(&url, "GET"),
            update: Link::new(&url, "PUT"),
            patch: Link::new(&url, "PATCH"),
            delete: Link::new(&url, "DELETE"),
        }
    }
}

/// Stored record decorated with its [`Links`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Decorated<R> {
    /// Id and fields, flattened into the JSON object.
    #[serde(flatten)]
    pub stored: Stored<R>,
    /// Operations on the record.
    pub links: Links,
}

impl<R> Decorated<R> {
    /// Attach the links of `stored` under `collection_url`.
    pub fn new(stored: Stored<R>, collection_url: &str) -> Self {
        let links = Links::for_record(collection_url, &stored.id);
        Self { stored, links }
    }
}
