//! paysim core: metric primitives, exposition codec and the shared error type.
//!
//! This crate defines the telemetry contract of the payment simulator:
//! counters, histograms and gauges partitioned by label values, a registry
//! that owns them, and the Prometheus text format they are scraped in. It
//! intentionally carries no transport or runtime dependencies.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Bad metric input surfaces as `PaysimError::InvalidArgument` so a request
//! can never be taken down by its own instrumentation.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod metrics;

/// Shared result type.
pub use error::{PaysimError, Result};
