use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Whether the storage backend is currently usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Storage answers.
    Ok,
    /// No usable storage; resource routes answer 503.
    Degraded,
}

/// Simple health response returned by the `/healthcheck` route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: HealthStatus,
}

impl HealthResponse {
    /// Create a health response indicating the system is operational.
    pub fn ok() -> Self {
        Self {
            status: HealthStatus::Ok,
        }
    }

    /// Create a health response indicating the system is in degraded mode.
    pub fn degraded() -> Self {
        Self {
            status: HealthStatus::Degraded,
        }
    }
}
