use axum::Router;

use crate::state::SharedState;

/// Swagger UI and OpenAPI JSON.
pub mod docs;
/// Health check endpoint.
pub mod health;
/// Record collection endpoints.
pub mod resource;

/// Compose all route trees, wiring in shared state and documentation routes.
///
/// Record collections live under the state's resource prefix; health and
/// documentation routes always sit at the root.
pub fn router(state: SharedState) -> Router<()> {
    let resources = match state.resource_prefix() {
        "" => resource::router(),
        prefix => Router::new().nest(prefix, resource::router()),
    };

    health::router()
        .merge(resources)
        .merge(docs::router())
        .with_state(state)
}
