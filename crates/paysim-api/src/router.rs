//! Axum router wiring.

use axum::{routing::get, Router};

use crate::{api, app_state::AppState, ops};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(ops::index))
        .route("/health", get(ops::health))
        .route("/metrics", get(ops::metrics))
        .route(
            "/api/payments",
            get(api::payments::list_payments).post(api::payments::create_payment),
        )
        .route("/api/transactions", get(api::transactions::list_transactions))
        .with_state(state)
}
