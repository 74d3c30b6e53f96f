//! The three payment metrics. Names, labels and buckets are part of the
//! scrape contract and must not change.

use std::sync::Arc;

use paysim_core::error::Result;
use paysim_core::metrics::MetricRegistry;

use super::instrument::RequestInstrumentation;

pub const REQUESTS_TOTAL: &str = "payment_requests_total";
pub const REQUESTS_TOTAL_HELP: &str = "Total number of payment requests processed";
pub const REQUESTS_TOTAL_LABELS: [&str; 2] = ["method", "status"];

pub const PROCESSING_DURATION: &str = "payment_processing_duration_seconds";
pub const PROCESSING_DURATION_HELP: &str = "Time spent processing payment requests";
pub const PROCESSING_DURATION_BUCKETS: [f64; 6] = [0.1, 0.5, 1.0, 2.0, 5.0, 10.0];

pub const ACTIVE_TRANSACTIONS: &str = "active_transactions_gauge";
pub const ACTIVE_TRANSACTIONS_HELP: &str = "Number of currently active transactions";

/// Registry plus the instrumentation handle bound to it.
pub struct PaymentMetrics {
    registry: Arc<MetricRegistry>,
    instrumentation: RequestInstrumentation,
}

impl PaymentMetrics {
    /// Register the payment metrics into a fresh registry.
    /// Any failure here is a startup error.
    pub fn new() -> Result<Self> {
        let registry = Arc::new(MetricRegistry::new());
        registry.register_counter(REQUESTS_TOTAL, REQUESTS_TOTAL_HELP, &REQUESTS_TOTAL_LABELS)?;
        registry.register_histogram(
            PROCESSING_DURATION,
            PROCESSING_DURATION_HELP,
            &[],
            &PROCESSING_DURATION_BUCKETS,
        )?;
        registry.register_gauge(ACTIVE_TRANSACTIONS, ACTIVE_TRANSACTIONS_HELP)?;

        let instrumentation = RequestInstrumentation::from_registry(&registry)?;
        Ok(Self {
            registry,
            instrumentation,
        })
    }

    pub fn registry(&self) -> &Arc<MetricRegistry> {
        &self.registry
    }

    pub fn instrumentation(&self) -> &RequestInstrumentation {
        &self.instrumentation
    }

    /// Render the full scrape body.
    pub fn render(&self) -> Result<String> {
        self.registry.render()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_contract_metrics() {
        let m = PaymentMetrics::new().unwrap();
        assert_eq!(
            m.registry().names(),
            vec![REQUESTS_TOTAL, PROCESSING_DURATION, ACTIVE_TRANSACTIONS]
        );
        let h = m.registry().histogram(PROCESSING_DURATION).unwrap();
        assert_eq!(h.bounds(), &PROCESSING_DURATION_BUCKETS[..]);
        let c = m.registry().counter(REQUESTS_TOTAL).unwrap();
        assert_eq!(c.label_keys().as_slice(), &["method", "status"]);
    }
}
