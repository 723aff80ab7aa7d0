//! Library crate for kart-highscores, exposing modules for binaries and integration tests.

/// HTTP client facade and page logic of the front-end.
pub mod client;
/// Configuration loading.
pub mod config;
/// Data access: records, storage errors and document stores.
pub mod dao;
/// Request and response bodies.
pub mod dto;
/// Service and HTTP error types.
pub mod error;
/// HTTP routes.
pub mod routes;
/// Business logic behind the routes.
pub mod services;
/// Shared application state.
pub mod state;
