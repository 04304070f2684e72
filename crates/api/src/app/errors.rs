use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use taxtally_infra::StoreError;

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::DuplicateEmail => json_error(
            StatusCode::BAD_REQUEST,
            "conflict",
            "email already registered",
        ),
        StoreError::Backend(detail) => {
            // The detail goes to the log, not the client.
            tracing::error!(%detail, "storage backend failure");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "store_error",
                "storage backend error",
            )
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
