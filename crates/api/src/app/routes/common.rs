//! Handler bodies shared by the four ledger entry collections.

use std::sync::Arc;

use axum::{extract::rejection::JsonRejection, http::StatusCode, response::IntoResponse, Json};

use armory_core::{DomainResult, EntryId};
use armory_ledger::{EntryKind, LedgerEntry};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

/// Unwrap a JSON body, turning extractor rejections into `400` responses.
pub fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, axum::response::Response> {
    match body {
        Ok(Json(v)) => Ok(v),
        Err(rejection) => Err(errors::json_error(
            StatusCode::BAD_REQUEST,
            "invalid_body",
            rejection.body_text(),
        )),
    }
}

pub async fn create_entry(
    services: &AppServices,
    entry: DomainResult<LedgerEntry>,
) -> axum::response::Response {
    let entry = match entry {
        Ok(e) => e,
        Err(e) => return errors::domain_error_to_response(e),
    };
    match services.record(entry).await {
        Ok(resolved) => (StatusCode::CREATED, Json(dto::entry_to_json(resolved))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn list_entries(
    services: Arc<AppServices>,
    kind: EntryKind,
    query: dto::EntryListQuery,
) -> axum::response::Response {
    let query = match query.to_query() {
        Ok(q) => q,
        Err(e) => return errors::domain_error_to_response(e),
    };
    match services.list_entries(kind, &query).await {
        Ok(entries) => {
            let items = entries.into_iter().map(dto::entry_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_entry(services: Arc<AppServices>, kind: EntryKind, id: String) -> axum::response::Response {
    let id: EntryId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", format!("invalid {kind} id"));
        }
    };
    match services.get_entry(kind, id).await {
        Ok(Some(resolved)) => (StatusCode::OK, Json(dto::entry_to_json(resolved))).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", format!("{kind} not found")),
        Err(e) => errors::store_error_to_response(e),
    }
}
