use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;

use taxtally_core::UserId;
use taxtally_infra::UserRecord;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::CurrentUser;

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::RegisterRequest>,
) -> axum::response::Response {
    let password_hash = match taxtally_auth::hash_password(&body.password) {
        Ok(hash) => hash,
        Err(e) => {
            tracing::error!(error = %e, "password hashing failed");
            return internal_error();
        }
    };

    let user = UserRecord {
        id: UserId::new(),
        name: body.name,
        email: body.email,
        password_hash,
        created_at: Utc::now(),
    };

    if let Err(e) = services.store().insert_user(user.clone()).await {
        return errors::store_error_to_response(e);
    }

    issue_session(&services, &user)
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::LoginRequest>,
) -> axum::response::Response {
    let user = match services.store().find_user_by_email(&body.email).await {
        Ok(Some(user)) => user,
        Ok(None) => return invalid_credentials(),
        Err(e) => return errors::store_error_to_response(e),
    };

    if !taxtally_auth::verify_password(&body.password, &user.password_hash) {
        return invalid_credentials();
    }

    issue_session(&services, &user)
}

pub async fn me(Extension(current): Extension<CurrentUser>) -> impl IntoResponse {
    Json(dto::user_to_json(current.user()))
}

/// Mint a token for `user` and return the `{token, user}` envelope shared by
/// register and login.
fn issue_session(services: &AppServices, user: &UserRecord) -> axum::response::Response {
    let token = match services.tokens().issue(user.id) {
        Ok(token) => token,
        Err(e) => {
            tracing::error!(error = %e, "token signing failed");
            return internal_error();
        }
    };

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "token": token,
            "user": dto::user_to_json(user),
        })),
    )
        .into_response()
}

fn invalid_credentials() -> axum::response::Response {
    errors::json_error(
        StatusCode::UNAUTHORIZED,
        "unauthenticated",
        "invalid email or password",
    )
}

fn internal_error() -> axum::response::Response {
    errors::json_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal_error",
        "internal server error",
    )
}
