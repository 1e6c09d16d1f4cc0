use axum::Json;
use pipegen_core::types::{choice_sets, ChoiceSets};

/// GET /api/health
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// GET /api/options: every selectable CI tool, language, build tool and
/// deployment target as `{id, label}` pairs.
pub async fn options() -> Json<ChoiceSets> {
    Json(choice_sets())
}
