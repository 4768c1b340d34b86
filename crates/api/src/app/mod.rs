//! HTTP API application wiring (Axum router + store wiring).
//!
//! This folder is structured like:
//! - `services.rs`: store construction from the shared pool
//! - `routes/`: HTTP routes + handlers (one file per domain area)
//! - `dto.rs`: request/query DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use sqlx::PgPool;
use tower::ServiceBuilder;

use tallerhub_auth::JwtKeys;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(pool: PgPool, jwt_secret: String) -> Router {
    let keys = Arc::new(JwtKeys::new(jwt_secret.as_bytes()));
    let auth_state = middleware::AuthState { keys };

    let stores = Arc::new(services::Stores::new(pool));

    // Protected routes: everything under /api requires a bearer token.
    let protected = routes::router()
        .layer(Extension(stores))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware,
        ));

    Router::new()
        .route("/health", get(routes::system::health))
        .nest("/api", protected)
        .layer(ServiceBuilder::new())
}
