use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use armory_core::BaseId;

use crate::app::routes::common;
use crate::app::services::AppServices;
use crate::app::{dto, errors};

/// Collection routes, with and without the trailing slash.
pub fn router() -> Router {
    Router::new()
        .route("/bases", get(list_bases).post(create_base))
        .route("/bases/", get(list_bases).post(create_base))
        .route("/bases/:id", get(get_base))
}

pub async fn create_base(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::CreateNamedRequest>, JsonRejection>,
) -> axum::response::Response {
    let body = match common::json_body(body) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    match services.create_base(&body.name).await {
        Ok(base) => (StatusCode::CREATED, Json(dto::base_to_json(base))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_bases(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.list_bases().await {
        Ok(bases) => {
            let items = bases.into_iter().map(dto::base_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_base(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: BaseId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid base id"),
    };
    match services.get_base(id).await {
        Ok(Some(base)) => (StatusCode::OK, Json(dto::base_to_json(base))).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "base not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}
