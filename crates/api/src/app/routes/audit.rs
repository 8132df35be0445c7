use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::app::{dto, errors};
use crate::app::services::AppServices;

/// Newest-first audit records, `?limit=&offset=`.
pub async fn audit_log(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::AuditLogQuery>,
) -> axum::response::Response {
    let pagination = match query.to_pagination() {
        Ok(p) => p,
        Err(e) => return errors::domain_error_to_response(e),
    };
    match services.audit_trail(pagination).await {
        Ok(records) => {
            let items = records.into_iter().map(dto::audit_record_to_json).collect::<Vec<_>>();
            (
                StatusCode::OK,
                Json(serde_json::json!({
                    "items": items,
                    "limit": pagination.limit,
                    "offset": pagination.offset,
                })),
            )
                .into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}
