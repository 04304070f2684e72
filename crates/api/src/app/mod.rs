//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: storage backend + token service wiring
//! - `routes/`: HTTP routes + handlers (one file per domain area)
//! - `dto.rs`: request DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use anyhow::Context;
use axum::http::{header, HeaderValue, Method};
use axum::{routing::get, Extension, Router};
use tower_http::cors::{Any, CorsLayer};

use crate::config::AppConfig;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs` and the
/// black-box tests).
pub async fn build_app(config: &AppConfig) -> anyhow::Result<Router> {
    let services = Arc::new(services::AppServices::from_config(config).await?);

    let auth_state = middleware::AuthState {
        tokens: services.tokens().clone(),
        store: services.store().clone(),
    };

    // Protected routes: require a bearer token resolving to a live user.
    let protected = routes::protected_router()
        .layer(Extension(services.clone()))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware,
        ));

    let public = routes::public_router().layer(Extension(services));

    // Nesting maps the public router's "/" onto the bare "/api" only; the
    // trailing-slash form needs its own route.
    Ok(Router::new()
        .nest("/api", public.merge(protected))
        .route("/api/", get(routes::system::root))
        .layer(cors_layer(&config.cors_origins)?))
}

fn cors_layer(origins: &[String]) -> anyhow::Result<CorsLayer> {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if origins.iter().any(|origin| origin == "*") {
        return Ok(layer.allow_origin(Any));
    }

    let origins = origins
        .iter()
        .map(|origin| origin.parse::<HeaderValue>())
        .collect::<Result<Vec<_>, _>>()
        .context("invalid CORS origin")?;
    Ok(layer.allow_origin(origins))
}
