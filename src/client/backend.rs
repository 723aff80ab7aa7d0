use std::sync::Arc;

use reqwest::{Client, Method, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::debug;

use crate::{
    dao::models::{Record, Stored},
    error::ErrorBody,
};

use super::error::{ClientError, ClientResult};

/// Thin facade over the REST API.
///
/// No retries, caching or request deduplication: each call maps to exactly
/// one HTTP request.
#[derive(Debug, Clone)]
pub struct Backend {
    client: Client,
    base_url: Arc<str>,
}

impl Backend {
    /// Talk to the API rooted at `base_url` (scheme, host and API prefix).
    pub fn new(base_url: impl AsRef<str>) -> ClientResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| ClientError::Setup { source })?;
        Ok(Self::with_client(client, base_url))
    }

    /// Reuse an existing [`Client`].
    pub fn with_client(client: Client, base_url: impl AsRef<str>) -> Self {
        Self {
            client,
            base_url: Arc::from(base_url.as_ref().trim_end_matches('/')),
        }
    }

    /// API root every path is appended to, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue one request and decode the JSON answer.
    ///
    /// An empty success body (e.g. `204 No Content`) decodes to [`Value::Null`].
    /// Non-2xx answers become [`ClientError::Status`] carrying the server's
    /// `message` when it sent one.
    pub async fn fetch(&self, method: Method, path: &str, body: Option<&Value>) -> ClientResult<Value> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.request(method.clone(), url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let transport = |source| ClientError::Transport {
            method: method.clone(),
            path: path.to_owned(),
            source,
        };
        let response = request.send().await.map_err(transport)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(transport)?;
        debug!(%method, path, %status, "backend call finished");

        if !status.is_success() {
            return Err(ClientError::Status {
                status,
                message: error_message(status, &bytes),
            });
        }
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes).map_err(|source| ClientError::Json {
            path: path.to_owned(),
            source,
        })
    }

    /// All records of `R`.
    pub async fn list<R: Record>(&self) -> ClientResult<Vec<Stored<R>>> {
        let path = collection_path::<R>();
        let value = self.fetch(Method::GET, &path, None).await?;
        decode(&path, value)
    }

    /// One record of `R`.
    pub async fn get<R: Record>(&self, id: &str) -> ClientResult<Stored<R>> {
        let path = entity_path::<R>(id);
        let value = self.fetch(Method::GET, &path, None).await?;
        decode(&path, value)
    }

    /// POST a new record.
    pub async fn create<R: Record>(&self, record: &R) -> ClientResult<Stored<R>> {
        let path = collection_path::<R>();
        let body = encode(&path, record)?;
        let value = self.fetch(Method::POST, &path, Some(&body)).await?;
        decode(&path, value)
    }

    /// PUT the fields of `record` onto the record `id`.
    pub async fn replace<R: Record>(&self, id: &str, record: &R) -> ClientResult<Stored<R>> {
        let path = entity_path::<R>(id);
        let body = encode(&path, record)?;
        let value = self.fetch(Method::PUT, &path, Some(&body)).await?;
        decode(&path, value)
    }

    /// DELETE the record `id`.
    pub async fn remove<R: Record>(&self, id: &str) -> ClientResult<()> {
        self.fetch(Method::DELETE, &entity_path::<R>(id), None)
            .await
            .map(drop)
    }
}

fn collection_path<R: Record>() -> String {
    format!("/{}", R::RESOURCE)
}

fn entity_path<R: Record>(id: &str) -> String {
    format!("/{}/{}", R::RESOURCE, id)
}

fn encode<T: Serialize>(path: &str, value: &T) -> ClientResult<Value> {
    serde_json::to_value(value).map_err(|source| ClientError::Json {
        path: path.to_owned(),
        source,
    })
}

fn decode<T: DeserializeOwned>(path: &str, value: Value) -> ClientResult<T> {
    serde_json::from_value(value).map_err(|source| ClientError::Json {
        path: path.to_owned(),
        source,
    })
}

fn error_message(status: StatusCode, body: &[u8]) -> String {
    if let Ok(ErrorBody { message }) = serde_json::from_slice(body) {
        return message;
    }
    let text = String::from_utf8_lossy(body).trim().to_owned();
    if text.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_owned()
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::models::{Highscore, Track};

    #[test]
    fn paths_use_the_resource_segment() {
        assert_eq!(collection_path::<Track>(), "/track");
        assert_eq!(entity_path::<Highscore>("abc"), "/highscore/abc");
    }

    #[test]
    fn error_messages_prefer_the_json_body() {
        assert_eq!(
            error_message(StatusCode::NOT_FOUND, br#"{"message": "player not found"}"#),
            "player not found"
        );
        assert_eq!(error_message(StatusCode::BAD_GATEWAY, b"upstream down"), "upstream down");
        assert_eq!(error_message(StatusCode::NOT_FOUND, b""), "Not Found");
    }

    #[test]
    fn base_url_drops_trailing_slashes() {
        let backend = Backend::with_client(Client::new(), "http://localhost:8080/api/");
        assert_eq!(backend.base_url(), "http://localhost:8080/api");
    }
}
