//! Simulated payment endpoints. Every handler runs its work through the
//! request instrumentation.

pub mod error;
pub mod payments;
pub mod transactions;

pub use error::ApiError;
