use axum::{Json, Router, extract::State, routing::get};

use crate::{dto::health::HealthResponse, services::health_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/healthcheck",
    tag = "health",
    responses((status = 200, description = "Storage status (\"ok\" or \"degraded\")", body = HealthResponse))
)]
/// Report whether the storage backend is reachable.
pub async fn healthcheck(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(health_service::health_status(&state).await)
}

/// Configure the health routes subtree.
pub fn router() -> Router<SharedState> {
    Router::new().route("/healthcheck", get(healthcheck))
}
