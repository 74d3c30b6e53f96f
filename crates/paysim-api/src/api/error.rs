use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use paysim_core::error::{ClientCode, PaysimError};

/// HTTP face of `PaysimError`: status by client code, JSON `{"error": ...}` body.
#[derive(Debug)]
pub struct ApiError(pub PaysimError);

impl From<PaysimError> for ApiError {
    fn from(e: PaysimError) -> Self {
        Self(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0.client_code() {
            ClientCode::BadRequest | ClientCode::InvalidArgument => StatusCode::BAD_REQUEST,
            ClientCode::NotFound => StatusCode::NOT_FOUND,
            ClientCode::DuplicateName | ClientCode::UpstreamFailure | ClientCode::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn message(&self) -> String {
        match &self.0 {
            // upstream messages are client-facing; panic text is replaced in `track`
            PaysimError::UpstreamFailure(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(code = self.0.client_code().as_str(), error = %self.0, "request failed");
        }
        (status, Json(json!({ "error": self.message() }))).into_response()
    }
}
