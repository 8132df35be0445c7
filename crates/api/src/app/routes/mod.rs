use axum::{routing::get, Router};

pub mod asset_types;
pub mod assignments;
pub mod audit;
pub mod bases;
pub mod common;
pub mod dashboard;
pub mod expenditures;
pub mod purchases;
pub mod system;
pub mod transfers;

/// Router for every ledger endpoint.
pub fn router() -> Router {
    Router::new()
        .merge(dashboard::router())
        .merge(bases::router())
        .merge(asset_types::router())
        .merge(purchases::router())
        .merge(transfers::router())
        .merge(assignments::router())
        .merge(expenditures::router())
        .route("/audit-log", get(audit::audit_log))
}
