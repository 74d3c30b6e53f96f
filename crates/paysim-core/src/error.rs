//! Shared error type across paysim crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Malformed metric input (negative duration, zero delta, bad label arity).
    InvalidArgument,
    /// A metric with the same name is already registered.
    DuplicateName,
    /// No metric registered under the requested name.
    NotFound,
    /// The wrapped business operation failed.
    UpstreamFailure,
    /// Invalid config or request payload.
    BadRequest,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::InvalidArgument => "INVALID_ARGUMENT",
            ClientCode::DuplicateName => "DUPLICATE_NAME",
            ClientCode::NotFound => "NOT_FOUND",
            ClientCode::UpstreamFailure => "UPSTREAM_FAILURE",
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, PaysimError>;

/// Unified error type used by core and api.
#[derive(Debug, Error)]
pub enum PaysimError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("duplicate metric name: {0}")]
    DuplicateName(String),
    #[error("metric not found: {0}")]
    NotFound(String),
    #[error("upstream failure: {0}")]
    UpstreamFailure(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl PaysimError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            PaysimError::InvalidArgument(_) => ClientCode::InvalidArgument,
            PaysimError::DuplicateName(_) => ClientCode::DuplicateName,
            PaysimError::NotFound(_) => ClientCode::NotFound,
            PaysimError::UpstreamFailure(_) => ClientCode::UpstreamFailure,
            PaysimError::BadRequest(_) => ClientCode::BadRequest,
            PaysimError::Internal(_) => ClientCode::Internal,
        }
    }
}

impl From<std::fmt::Error> for PaysimError {
    fn from(e: std::fmt::Error) -> Self {
        PaysimError::Internal(format!("exposition write failed: {e}"))
    }
}
