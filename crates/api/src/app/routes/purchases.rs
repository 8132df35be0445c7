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
        .route("/purchases", get(list_purchases).post(create_purchase))
        .route("/purchases/", get(list_purchases).post(create_purchase))
        .route("/purchases/:id", get(get_purchase))
}

pub async fn create_purchase(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::CreatePurchaseRequest>, JsonRejection>,
) -> axum::response::Response {
    let body = match common::json_body(body) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    common::create_entry(&services, body.into_entry()).await
}

pub async fn list_purchases(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::EntryListQuery>,
) -> axum::response::Response {
    common::list_entries(services, EntryKind::Purchase, query).await
}

pub async fn get_purchase(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    common::get_entry(services, EntryKind::Purchase, id).await
}
