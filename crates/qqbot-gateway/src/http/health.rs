use std::sync::Arc;

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::app::AppState;

/// GET /health — liveness probe. No multi-provider registry to report on
/// here, just enough to confirm the process is up and which bot identity
/// it's currently observing.
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "self_id": state.self_id(),
    }))
}
