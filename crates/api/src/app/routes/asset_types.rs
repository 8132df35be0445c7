use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use armory_core::AssetTypeId;

use crate::app::routes::common;
use crate::app::services::AppServices;
use crate::app::{dto, errors};

/// Collection routes, with and without the trailing slash.
pub fn router() -> Router {
    Router::new()
        .route("/asset-types", get(list_asset_types).post(create_asset_type))
        .route("/asset-types/", get(list_asset_types).post(create_asset_type))
        .route("/asset-types/:id", get(get_asset_type))
}

pub async fn create_asset_type(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::CreateNamedRequest>, JsonRejection>,
) -> axum::response::Response {
    let body = match common::json_body(body) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    match services.create_asset_type(&body.name).await {
        Ok(asset_type) => (StatusCode::CREATED, Json(dto::asset_type_to_json(asset_type))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_asset_types(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.list_asset_types().await {
        Ok(asset_types) => {
            let items = asset_types.into_iter().map(dto::asset_type_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_asset_type(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: AssetTypeId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid asset type id"),
    };
    match services.get_asset_type(id).await {
        Ok(Some(asset_type)) => (StatusCode::OK, Json(dto::asset_type_to_json(asset_type))).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "asset type not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}
