use axum::{
    routing::{get, post},
    Router,
};

pub mod auth;
pub mod calculations;
pub mod reminders;
pub mod system;

/// List endpoints return at most this many records.
pub(crate) const LIST_LIMIT: usize = 100;

/// Routes reachable without a token: the health check plus register/login.
pub fn public_router() -> Router {
    Router::new()
        .route("/", get(system::root))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
}

/// Router for all authenticated (owner-scoped) endpoints.
pub fn protected_router() -> Router {
    Router::new()
        .route("/auth/me", get(auth::me))
        .nest("/calculations", calculations::router())
        .nest("/reminders", reminders::router())
}
