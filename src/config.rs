//! Application-level configuration loading: JSON file first, environment overrides second.

use std::{env, fs, io::ErrorKind, path::PathBuf, str::FromStr};

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "KART_HIGHSCORES_CONFIG_PATH";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_MONGO_URI: &str = "mongodb://localhost:27017";
const DEFAULT_DATABASE: &str = "app_database";
const DEFAULT_COUCH_URL: &str = "http://localhost:5984";

/// Which [`DocumentStore`](crate::dao::document_store::DocumentStore) backs the collections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// Process-local maps, lost on restart.
    Memory,
    /// MongoDB, one collection per entity.
    #[default]
    Mongo,
    /// CouchDB, one database for every entity.
    Couch,
}

/// How highscore references to players and tracks are checked server-side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferencePolicy {
    /// Accept any value; only the client checks references.
    #[default]
    Soft,
    /// Reject highscores naming an unknown player or track.
    Enforced,
}

/// Error returned when an enum-valued setting has an unknown spelling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown setting value `{0}`")]
pub struct UnknownSetting(pub String);

impl FromStr for StorageBackend {
    type Err = UnknownSetting;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "mongo" | "mongodb" => Ok(Self::Mongo),
            "couch" | "couchdb" => Ok(Self::Couch),
            other => Err(UnknownSetting(other.to_owned())),
        }
    }
}

impl FromStr for ReferencePolicy {
    type Err = UnknownSetting;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "soft" => Ok(Self::Soft),
            "enforced" => Ok(Self::Enforced),
            other => Err(UnknownSetting(other.to_owned())),
        }
    }
}

/// MongoDB connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MongoSettings {
    /// Connection string, e.g. `mongodb://localhost:27017`.
    pub uri: String,
    /// Database holding the entity collections.
    pub database: String,
}

/// CouchDB connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CouchSettings {
    /// Server URL, e.g. `http://localhost:5984`.
    pub base_url: String,
    /// Database holding every entity document.
    pub database: String,
    /// Basic auth user; credentials are only sent when both parts are set.
    pub username: Option<String>,
    /// Basic auth password.
    pub password: Option<String>,
}

/// Immutable runtime configuration shared across the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// TCP port the HTTP server listens on.
    pub port: u16,
    /// Path prefix of the resource routes, either empty or `/segment[/...]`.
    pub api_prefix: String,
    /// Selected storage backend.
    pub storage: StorageBackend,
    /// Server-side reference checking of highscores.
    pub reference_policy: ReferencePolicy,
    /// Used when `storage` is [`StorageBackend::Mongo`].
    pub mongo: MongoSettings,
    /// Used when `storage` is [`StorageBackend::Couch`].
    pub couch: CouchSettings,
}

impl AppConfig {
    /// Load the configuration file (or defaults) and apply environment overrides.
    pub fn load() -> Self {
        let mut config = Self::from_file();
        config.apply_overrides(|key| env::var(key).ok());
        config
    }

    fn from_file() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    info!(path = %path.display(), "loaded configuration file");
                    raw.into()
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Override settings from `lookup` (the process environment in production).
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT").or_else(|| lookup("SERVER_PORT")) {
            match port.parse::<u16>() {
                Ok(port) => self.port = port,
                Err(err) => warn!(%port, error = %err, "ignoring invalid port override"),
            }
        }
        if let Some(prefix) = lookup("API_PREFIX") {
            self.api_prefix = normalize_prefix(&prefix);
        }
        if let Some(backend) = lookup("STORAGE_BACKEND") {
            match backend.parse() {
                Ok(backend) => self.storage = backend,
                Err(err) => warn!(error = %err, "ignoring STORAGE_BACKEND override"),
            }
        }
        if let Some(policy) = lookup("REFERENCE_POLICY") {
            match policy.parse() {
                Ok(policy) => self.reference_policy = policy,
                Err(err) => warn!(error = %err, "ignoring REFERENCE_POLICY override"),
            }
        }
        if let Some(uri) = lookup("MONGO_URI") {
            self.mongo.uri = uri;
        }
        if let Some(database) = lookup("MONGO_DB") {
            self.mongo.database = database;
        }
        if let Some(base_url) = lookup("COUCH_BASE_URL") {
            self.couch.base_url = base_url;
        }
        if let Some(database) = lookup("COUCH_DB") {
            self.couch.database = database;
        }
        if let Some(username) = lookup("COUCH_USERNAME") {
            self.couch.username = Some(username);
        }
        if let Some(password) = lookup("COUCH_PASSWORD") {
            self.couch.password = Some(password);
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        RawConfig::default().into()
    }
}

/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawConfig {
    port: Option<u16>,
    api_prefix: Option<String>,
    storage: Option<StorageBackend>,
    reference_policy: Option<ReferencePolicy>,
    mongo: RawMongo,
    couch: RawCouch,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawMongo {
    uri: Option<String>,
    database: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawCouch {
    base_url: Option<String>,
    database: Option<String>,
    username: Option<String>,
    password: Option<String>,
}

impl From<RawConfig> for AppConfig {
    fn from(raw: RawConfig) -> Self {
        Self {
            port: raw.port.unwrap_or(DEFAULT_PORT),
            api_prefix: raw
                .api_prefix
                .as_deref()
                .map(normalize_prefix)
                .unwrap_or_default(),
            storage: raw.storage.unwrap_or_default(),
            reference_policy: raw.reference_policy.unwrap_or_default(),
            mongo: MongoSettings {
                uri: raw.mongo.uri.unwrap_or_else(|| DEFAULT_MONGO_URI.into()),
                database: raw.mongo.database.unwrap_or_else(|| DEFAULT_DATABASE.into()),
            },
            couch: CouchSettings {
                base_url: raw.couch.base_url.unwrap_or_else(|| DEFAULT_COUCH_URL.into()),
                database: raw.couch.database.unwrap_or_else(|| DEFAULT_DATABASE.into()),
                username: raw.couch.username,
                password: raw.couch.password,
            },
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Normalise a route prefix to either `""` or `/a/b` (leading slash, no trailing slash).
pub fn normalize_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}
