//! Shared application state for the payment API.
//!
//! Built once at startup and cloned into every handler. Startup errors
//! (metric registration) are returned, not panicked, so `main` can log and
//! exit.

use std::sync::Arc;

use paysim_core::error::Result;

use crate::config::AppConfig;
use crate::obs::{PaymentMetrics, RequestInstrumentation};
use crate::sim::{PaymentLedger, Simulator};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: AppConfig,
    metrics: PaymentMetrics,
    simulator: Simulator,
    ledger: PaymentLedger,
}

impl AppState {
    pub fn new(cfg: AppConfig) -> Result<Self> {
        let metrics = PaymentMetrics::new()?;
        let simulator = Simulator::new(cfg.simulation.clone());
        tracing::debug!(metrics = ?metrics.registry().names(), "metrics registered");

        Ok(Self {
            inner: Arc::new(AppStateInner {
                cfg,
                metrics,
                simulator,
                ledger: PaymentLedger::new(),
            }),
        })
    }

    pub fn cfg(&self) -> &AppConfig {
        &self.inner.cfg
    }

    pub fn metrics(&self) -> &PaymentMetrics {
        &self.inner.metrics
    }

    pub fn instrumentation(&self) -> &RequestInstrumentation {
        self.inner.metrics.instrumentation()
    }

    pub fn simulator(&self) -> &Simulator {
        &self.inner.simulator
    }

    pub fn ledger(&self) -> &PaymentLedger {
        &self.inner.ledger
    }
}
