use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Probe the installed store and report whether the API can serve requests.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.require_document_store().await {
        Ok(store) => match store.health_check().await {
            Ok(()) => HealthResponse::ok(),
            Err(err) => {
                warn!(error = %err, "storage health check failed");
                HealthResponse::degraded()
            }
        },
        Err(_) => {
            warn!("storage unavailable (degraded mode)");
            HealthResponse::degraded()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::ReferencePolicy, dao::document_store::memory::MemoryDocumentStore,
        dto::health::HealthStatus, state::AppState,
    };

    #[tokio::test]
    async fn reports_degraded_without_storage() {
        let state = AppState::new(ReferencePolicy::Enforced, "");
        assert_eq!(health_status(&state).await.status, HealthStatus::Degraded);

        state
            .install_document_store(Arc::new(MemoryDocumentStore::new()))
            .await;
        assert_eq!(health_status(&state).await.status, HealthStatus::Ok);
    }
}
