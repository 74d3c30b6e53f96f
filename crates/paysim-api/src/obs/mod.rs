//! Payment telemetry: the registered instruments and the per-request
//! instrumentation that feeds them. Rendered by the `/metrics` handler.

pub mod instrument;
pub mod metrics;

pub use instrument::{OperationKind, RequestInstrumentation, RequestOutcome};
pub use metrics::PaymentMetrics;
