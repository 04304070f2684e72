use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, post},
    Json, Router,
};
use chrono::Utc;

use taxtally_core::CalculationId;
use taxtally_infra::CalculationRecord;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::CurrentUser;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create).get(list))
        .route("/:id", delete(remove))
}

pub async fn create(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<dto::CreateCalculationRequest>,
) -> axum::response::Response {
    let calculation = CalculationRecord {
        id: CalculationId::new(),
        owner_id: current.id(),
        calc_type: body.calc_type,
        inputs: body.inputs,
        results: body.results,
        created_at: Utc::now(),
    };

    if let Err(e) = services
        .store()
        .insert_calculation(calculation.clone())
        .await
    {
        return errors::store_error_to_response(e);
    }

    (
        StatusCode::OK,
        Json(dto::calculation_to_json(&calculation)),
    )
        .into_response()
}

pub async fn list(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
) -> axum::response::Response {
    let calculations = match services
        .store()
        .list_calculations(current.id(), super::LIST_LIMIT)
        .await
    {
        Ok(calculations) => calculations,
        Err(e) => return errors::store_error_to_response(e),
    };

    let items: Vec<_> = calculations.iter().map(dto::calculation_to_json).collect();
    (StatusCode::OK, Json(items)).into_response()
}

pub async fn remove(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> axum::response::Response {
    // An unparseable id cannot name a record, so it reads as a miss.
    let id: CalculationId = match id.parse() {
        Ok(id) => id,
        Err(_) => return not_found(),
    };

    match services.store().delete_calculation(current.id(), id).await {
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
    errors::json_error(StatusCode::NOT_FOUND, "not_found", "calculation not found")
}
