//! REST API endpoints for the clinic records service.

use axum::routing::{get, patch, post};
use axum::Router;

use crate::api::handlers;
use crate::server::AppState;

/// Build the `/api` router.
///
/// The whole subtree is wrapped by the request gate in `server::build_router`.
/// The auth routes stay reachable without a token because they sit on the
/// public route prefix list the gate consults.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/auth/register", post(handlers::register))
        .route("/v1/auth/authenticate", post(handlers::authenticate))
        .route("/v1/patient", get(handlers::list_patients))
        .route("/v1/patient/:id", get(handlers::get_patient))
        .route("/v1/patient/:id", patch(handlers::update_patient))
}

/// Build the root-level operational router.
///
/// Mounted outside the gate: probes and metrics scrapers carry no tokens.
pub fn ops_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_snapshot))
}
