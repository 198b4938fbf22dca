use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde_json::json;

use crate::state::AppState;

/// GET /health — independent liveness probes for both upstream services.
/// Never fails; an unreachable dependency reports as `false`.
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let services = state.orchestrator.health_check().await;
    let status = if services.healthy() {
        "healthy"
    } else {
        "unhealthy"
    };

    Json(json!({
        "status": status,
        "services": services,
        "timestamp": Utc::now().to_rfc3339(),
    }))
}
