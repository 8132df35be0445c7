//! Dashboard balance endpoints.

use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

/// Merged at the root so that both `/dashboard` and `/dashboard/` resolve.
pub fn router() -> Router {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/dashboard/", get(dashboard))
        .route("/dashboard/movements", get(movements))
}

/// `{opening_balance, closing_balance, net_movement, assigned, expended}` for the filters.
pub async fn dashboard(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::DashboardQuery>,
) -> axum::response::Response {
    let filter = match query.to_filter() {
        Ok(f) => f,
        Err(e) => return errors::domain_error_to_response(e),
    };
    match services.balance_report(&filter).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn movements(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::DashboardQuery>,
) -> axum::response::Response {
    let filter = match query.to_filter() {
        Ok(f) => f,
        Err(e) => return errors::domain_error_to_response(e),
    };
    match services.movement_totals(&filter).await {
        Ok(totals) => (StatusCode::OK, Json(dto::movements_to_json(totals))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
