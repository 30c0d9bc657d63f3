//! Liveness and readiness probes for the load balancer.

use axum::{extract::State, http::StatusCode};

use crate::state::AppState;

/// The process is up. Touches nothing else.
pub async fn health() -> &'static str {
    "ok"
}

/// The database answers; 503 otherwise.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").execute(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
