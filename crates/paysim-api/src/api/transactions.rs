use axum::{extract::State, Json};
use serde_json::{json, Value};

use paysim_core::error::PaysimError;

use crate::api::ApiError;
use crate::app_state::AppState;
use crate::obs::OperationKind;

/// `GET /api/transactions`. Generates a fresh batch per call; nothing is stored.
pub async fn list_transactions(State(app): State<AppState>) -> Result<Json<Value>, ApiError> {
    let sim = app.simulator();
    let transactions = app
        .instrumentation()
        .track("GET", OperationKind::Query, async {
            sim.process().await;
            if sim.should_fail() {
                return Err(PaysimError::UpstreamFailure("Database connection failed".into()));
            }
            Ok(app.ledger().sample_transactions())
        })
        .await?;

    Ok(Json(json!({ "count": transactions.len(), "transactions": transactions })))
}
