use axum::Json;
use issue_tracker_core::timestamps::now_iso;
use serde_json::{json, Value};

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": now_iso(),
    }))
}
