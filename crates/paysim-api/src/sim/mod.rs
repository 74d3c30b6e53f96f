//! Synthetic business layer: random processing delay, random failures and
//! an in-memory payment ledger. Nothing here is persisted.

pub mod ledger;

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rand::Rng;

use crate::config::SimulationSection;

pub use ledger::{NewPayment, Payment, PaymentLedger, Transaction};

/// Unix time in fractional seconds.
pub fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// Draws processing delays and failures from the configured distribution.
#[derive(Debug, Clone)]
pub struct Simulator {
    cfg: SimulationSection,
}

impl Simulator {
    pub fn new(cfg: SimulationSection) -> Self {
        Self { cfg }
    }

    /// Uniform delay in `[min_delay_ms, max_delay_ms]`.
    pub fn processing_delay(&self) -> Duration {
        let ms = if self.cfg.min_delay_ms >= self.cfg.max_delay_ms {
            self.cfg.min_delay_ms
        } else {
            rand::thread_rng().gen_range(self.cfg.min_delay_ms..=self.cfg.max_delay_ms)
        };
        Duration::from_millis(ms)
    }

    /// True with probability `error_rate`.
    pub fn should_fail(&self) -> bool {
        rand::thread_rng().gen_bool(self.cfg.error_rate)
    }

    /// Sleep for one simulated processing delay.
    pub async fn process(&self) {
        let delay = self.processing_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}
