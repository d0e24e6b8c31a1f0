//! Health check and metrics handlers
//!
//! Mounted outside the gated `/api` tree so probes never need credentials:
//! - `/health` answers without touching any dependency (liveness)
//! - `/ready` probes the patient store (readiness)
//! - `/metrics` returns the in-process metrics snapshot

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use crate::api::{ApiError, ErrorCode};
use crate::domain::PatientId;
use crate::server::AppState;

/// Response for the basic health check endpoint
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub timestamp: String,
}

/// Basic health check endpoint.
///
/// Returns a static healthy response without performing deep checks.
/// Use this for liveness probes.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "clinic-records",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// Readiness check endpoint.
///
/// Probes the patient store with a cheap primary-key lookup. Use this for
/// readiness probes.
pub async fn readiness_check(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let start = std::time::Instant::now();
    match state
        .store
        .find_by_id(&PatientId::from_uuid(Uuid::nil()))
        .await
    {
        Ok(_) => Ok(Json(serde_json::json!({
            "status": "ready",
            "database": {
                "connected": true,
                "response_time_ms": start.elapsed().as_millis() as u64,
            },
        }))),
        Err(e) => {
            tracing::error!(error = %e, "readiness probe failed");
            Err(ApiError::new(
                ErrorCode::ServiceUnavailable,
                "database unavailable",
            ))
        }
    }
}

/// Metrics snapshot endpoint.
pub async fn metrics_snapshot(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(state.metrics.to_json().await)
}
