use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use paysim_core::error::PaysimError;

use crate::api::ApiError;
use crate::app_state::AppState;
use crate::obs::OperationKind;
use crate::sim::{NewPayment, Payment};

/// `GET /api/payments`
pub async fn list_payments(State(app): State<AppState>) -> Result<Json<Value>, ApiError> {
    let sim = app.simulator();
    let payments = app
        .instrumentation()
        .track("GET", OperationKind::Query, async {
            sim.process().await;
            if sim.should_fail() {
                return Err(PaysimError::UpstreamFailure("Internal server error".into()));
            }
            Ok(app.ledger().list())
        })
        .await?;

    Ok(Json(json!({ "count": payments.len(), "payments": payments })))
}

/// `POST /api/payments`. Held in the active transaction gauge while it runs.
pub async fn create_payment(
    State(app): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<Payment>), ApiError> {
    let sim = app.simulator();
    let payment = app
        .instrumentation()
        .track("POST", OperationKind::Transaction, async {
            sim.process().await;
            if sim.should_fail() {
                return Err(PaysimError::UpstreamFailure("Payment processing failed".into()));
            }
            let req = parse_new_payment(&body)?;
            Ok(app.ledger().create(req))
        })
        .await?;

    tracing::info!(id = payment.id, amount = payment.amount, currency = %payment.currency, "payment created");
    Ok((StatusCode::CREATED, Json(payment)))
}

/// Empty body or JSON `null` means all defaults.
fn parse_new_payment(body: &[u8]) -> Result<NewPayment, PaysimError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(NewPayment::default());
    }
    let req: Option<NewPayment> = serde_json::from_slice(body)
        .map_err(|e| PaysimError::BadRequest(format!("invalid payment body: {e}")))?;
    Ok(req.unwrap_or_default())
}
