use axum::{response::IntoResponse, Json};

pub async fn root() -> impl IntoResponse {
    Json(serde_json::json!({ "message": "taxtally api" }))
}
