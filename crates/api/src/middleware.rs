use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use taxtally_auth::{TokenError, TokenService};
use taxtally_infra::TaxStore;

use crate::app::errors::{json_error, store_error_to_response};
use crate::context::CurrentUser;

#[derive(Clone)]
pub struct AuthState {
    pub tokens: TokenService,
    pub store: Arc<dyn TaxStore>,
}

/// Gate in front of every protected route: resolves the bearer token to a
/// live user and stashes it as a request extension.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let token = match extract_bearer(req.headers()) {
        Ok(token) => token,
        Err(response) => return response,
    };

    let user_id = match state.tokens.verify(token, Utc::now()) {
        Ok(user_id) => user_id,
        Err(e) => {
            tracing::debug!(error = %e, "rejected bearer token");
            return token_error_response(&e);
        }
    };

    let user = match state.store.find_user_by_id(user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            // The signature checks out but the subject no longer resolves.
            return json_error(StatusCode::UNAUTHORIZED, "unauthenticated", "user not found");
        }
        Err(e) => return store_error_to_response(e),
    };

    req.extensions_mut().insert(CurrentUser::new(user));

    next.run(req).await
}

fn token_error_response(err: &TokenError) -> Response {
    let message = match err {
        TokenError::Expired => "token expired",
        _ => "invalid token",
    };
    json_error(StatusCode::UNAUTHORIZED, "unauthenticated", message)
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, Response> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(not_authenticated)?;

    let header = header.to_str().map_err(|_| not_authenticated())?;

    let header = header
        .strip_prefix("Bearer ")
        .ok_or_else(not_authenticated)?;

    let token = header.trim();
    if token.is_empty() {
        return Err(not_authenticated());
    }

    Ok(token)
}

fn not_authenticated() -> Response {
    json_error(
        StatusCode::UNAUTHORIZED,
        "unauthenticated",
        "not authenticated",
    )
}
