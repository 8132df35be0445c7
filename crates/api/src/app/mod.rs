//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store wiring and the operations handlers call
//! - `routes/`: HTTP routes + handlers (one file per resource)
//! - `dto.rs`: request DTOs, query parsing, JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower_http::cors::CorsLayer;

use crate::config::ApiConfig;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub async fn build_app(config: &ApiConfig) -> anyhow::Result<Router> {
    let services = services::build_services(&config.store).await?;
    Ok(router(Arc::new(services), config.cors_permissive))
}

/// Router over already-wired services.
pub fn router(services: Arc<services::AppServices>, cors_permissive: bool) -> Router {
    let app = Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router())
        .layer(Extension(services))
        .layer(axum::middleware::from_fn(middleware::request_tracing));

    if cors_permissive {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}
