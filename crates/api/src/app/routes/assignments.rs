use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path, Query},
    routing::get,
    Json, Router,
};

use armory_ledger::EntryKind;

use crate::app::dto;
use crate::app::routes::common;
use crate::app::services::AppServices;

/// Collection routes, with and without the trailing slash.
pub fn router() -> Router {
    Router::new()
        .route("/assignments", get(list_assignments).post(create_assignment))
        .route("/assignments/", get(list_assignments).post(create_assignment))
        .route("/assignments/:id", get(get_assignment))
}

pub async fn create_assignment(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::CreateAssignmentRequest>, JsonRejection>,
) -> axum::response::Response {
    let body = match common::json_body(body) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    common::create_entry(&services, body.into_entry()).await
}

pub async fn list_assignments(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::EntryListQuery>,
) -> axum::response::Response {
    common::list_entries(services, EntryKind::Assignment, query).await
}

pub async fn get_assignment(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    common::get_entry(services, EntryKind::Assignment, id).await
}
