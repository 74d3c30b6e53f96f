//! Operational HTTP endpoints.
//!
//! - `/`        : service index
//! - `/health`  : liveness
//! - `/metrics` : Prometheus text format

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use paysim_core::metrics::exposition;

use crate::app_state::AppState;
use crate::obs::metrics::{
    ACTIVE_TRANSACTIONS, ACTIVE_TRANSACTIONS_HELP, PROCESSING_DURATION, PROCESSING_DURATION_HELP,
    REQUESTS_TOTAL, REQUESTS_TOTAL_HELP,
};
use crate::sim::unix_now;

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "timestamp": unix_now(),
            "service": state.cfg().server.service_name,
        })),
    )
}

/// Render failures answer 500 with a fixed body, never a partial scrape.
pub async fn metrics(State(state): State<AppState>) -> Response {
    match state.metrics().render() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, exposition::CONTENT_TYPE)],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "metrics render failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics unavailable").into_response()
        }
    }
}

pub async fn index(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "service": state.cfg().server.display_name,
        "version": state.cfg().server.api_version,
        "endpoints": {
            "health": "/health",
            "payments": "/api/payments",
            "transactions": "/api/transactions",
            "metrics": "/metrics",
        },
        "metrics": {
            REQUESTS_TOTAL: format!("Counter - {REQUESTS_TOTAL_HELP}"),
            PROCESSING_DURATION: format!("Histogram - {PROCESSING_DURATION_HELP}"),
            ACTIVE_TRANSACTIONS: format!("Gauge - {ACTIVE_TRANSACTIONS_HELP}"),
        },
    }))
}
