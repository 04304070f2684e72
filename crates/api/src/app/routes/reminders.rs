use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{post, put},
    Json, Router,
};
use chrono::Utc;

use taxtally_core::ReminderId;
use taxtally_infra::ReminderRecord;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::CurrentUser;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create).get(list))
        .route("/:id", put(update).delete(remove))
}

pub async fn create(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<dto::CreateReminderRequest>,
) -> axum::response::Response {
    let reminder = ReminderRecord {
        id: ReminderId::new(),
        owner_id: current.id(),
        title: body.title,
        description: body.description,
        due_date: body.due_date,
        category: body.category,
        completed: false,
        created_at: Utc::now(),
    };

    if let Err(e) = services.store().insert_reminder(reminder.clone()).await {
        return errors::store_error_to_response(e);
    }

    (StatusCode::OK, Json(dto::reminder_to_json(&reminder))).into_response()
}

pub async fn list(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
) -> axum::response::Response {
    let reminders = match services
        .store()
        .list_reminders(current.id(), super::LIST_LIMIT)
        .await
    {
        Ok(reminders) => reminders,
        Err(e) => return errors::store_error_to_response(e),
    };

    let items: Vec<_> = reminders.iter().map(dto::reminder_to_json).collect();
    (StatusCode::OK, Json(items)).into_response()
}

pub async fn update(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateReminderRequest>,
) -> axum::response::Response {
    // An all-absent body is rejected before the id is even looked at.
    let patch = body.into_patch();
    if patch.is_empty() {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "no fields to update",
        );
    }

    let id: ReminderId = match id.parse() {
        Ok(id) => id,
        Err(_) => return not_found(),
    };

    match services
        .store()
        .update_reminder(current.id(), id, patch)
        .await
    {
        Ok(Some(reminder)) => {
            (StatusCode::OK, Json(dto::reminder_to_json(&reminder))).into_response()
        }
        Ok(None) => not_found(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn remove(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ReminderId = match id.parse() {
        Ok(id) => id,
        Err(_) => return not_found(),
    };

    match services.store().delete_reminder(current.id(), id).await {
        Ok(true) => (
            StatusCode::OK,
            Json(serde_json::json!({ "message": "deleted" })),
        )
            .into_response(),
        Ok(false) => not_found(),
        Err(e) => errors::store_error_to_response(e),
    }
}

fn not_found() -> axum::response::Response {
    errors::json_error(StatusCode::NOT_FOUND, "not_found", "reminder not found")
}
