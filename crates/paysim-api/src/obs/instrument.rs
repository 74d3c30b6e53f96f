//! Request-lifecycle instrumentation.
//!
//! Every business handler runs its work through [`RequestInstrumentation::track`].
//! A [`RequestGuard`] is taken before the work starts; its `Drop` records the
//! outcome counter, lowers the in-flight gauge and observes the elapsed time,
//! so those three happen exactly once on every exit path: normal return,
//! error, panic inside the work, or the request future being dropped.
//!
//! Recording failures are logged and swallowed. Telemetry must never fail a
//! request.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use tokio::time::Instant;

use paysim_core::error::{PaysimError, Result};
use paysim_core::metrics::{Counter, Gauge, Histogram, MetricRegistry};

use super::metrics::{ACTIVE_TRANSACTIONS, PROCESSING_DURATION, REQUESTS_TOTAL};

/// Client-facing message for a caught panic. The panic text itself only goes
/// to the log.
pub const PANIC_MESSAGE: &str = "Internal server error";

/// Value of the `status` label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    Success,
    Error,
}

impl RequestOutcome {
    pub fn as_label(self) -> &'static str {
        match self {
            RequestOutcome::Success => "success",
            RequestOutcome::Error => "error",
        }
    }
}

/// Whether an operation counts as an active transaction while it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    /// Read-only request; only counted and timed.
    Query,
    /// In-flight unit of work; also held in `active_transactions_gauge`.
    Transaction,
}

/// Handles to the payment instruments, resolved once from the registry.
#[derive(Debug, Clone)]
pub struct RequestInstrumentation {
    requests: Arc<Counter>,
    duration: Arc<Histogram>,
    active: Arc<Gauge>,
}

impl RequestInstrumentation {
    pub fn from_registry(registry: &MetricRegistry) -> Result<Self> {
        Ok(Self {
            requests: registry.counter(REQUESTS_TOTAL)?,
            duration: registry.histogram(PROCESSING_DURATION)?,
            active: registry.gauge(ACTIVE_TRANSACTIONS)?,
        })
    }

    /// Start tracking one request. The returned guard records on drop;
    /// call [`RequestGuard::finish`] to record a success.
    pub fn begin<'a>(&'a self, method: &'a str, kind: OperationKind) -> RequestGuard<'a> {
        let started = Instant::now();
        let in_flight = match kind {
            OperationKind::Query => false,
            OperationKind::Transaction => match self.active.inc() {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(error = %e, "active transaction gauge not raised");
                    false
                }
            },
        };
        RequestGuard {
            inst: self,
            method,
            started,
            in_flight,
            outcome: None,
        }
    }

    /// Run `op` inside a guard. `Ok` counts as success, `Err` as error.
    /// A panic in `op` is caught, logged, counted as error and returned as
    /// `UpstreamFailure(PANIC_MESSAGE)`.
    pub async fn track<F, T>(&self, method: &str, kind: OperationKind, op: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let guard = self.begin(method, kind);
        let result = match AssertUnwindSafe(op).catch_unwind().await {
            Ok(r) => r,
            Err(panic) => {
                let msg = panic_message(panic.as_ref());
                tracing::error!(method, panic = %msg, "operation panicked");
                Err(PaysimError::UpstreamFailure(PANIC_MESSAGE.to_string()))
            }
        };
        guard.finish(if result.is_ok() {
            RequestOutcome::Success
        } else {
            RequestOutcome::Error
        });
        result
    }
}

fn panic_message(p: &(dyn Any + Send)) -> String {
    if let Some(s) = p.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = p.downcast_ref::<String>() {
        s.clone()
    } else {
        "operation panicked".to_string()
    }
}

/// Scoped record of one request. Dropping it without `finish` counts the
/// request as an error.
pub struct RequestGuard<'a> {
    inst: &'a RequestInstrumentation,
    method: &'a str,
    started: Instant,
    in_flight: bool,
    outcome: Option<RequestOutcome>,
}

impl RequestGuard<'_> {
    pub fn finish(mut self, outcome: RequestOutcome) {
        self.outcome = Some(outcome);
    }
}

impl Drop for RequestGuard<'_> {
    fn drop(&mut self) {
        let outcome = self.outcome.unwrap_or(RequestOutcome::Error);
        if let Err(e) = self.inst.requests.inc(&[self.method, outcome.as_label()]) {
            tracing::warn!(error = %e, method = self.method, "request counter not recorded");
        }

        if self.in_flight {
            self.inst.active.update(|v| (v - 1.0).max(0.0));
        }

        let elapsed = self.started.elapsed();
        if let Err(e) = self.inst.duration.observe_duration(elapsed, &[]) {
            tracing::warn!(error = %e, "processing duration not recorded");
        }
        tracing::debug!(
            method = self.method,
            status = outcome.as_label(),
            elapsed_ms = elapsed.as_millis() as u64,
            "request recorded"
        );
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use paysim_core::metrics::LabelSet;

    use super::*;
    use crate::obs::PaymentMetrics;

    fn requests(m: &PaymentMetrics, method: &str, status: &str) -> Option<u64> {
        m.registry().counter(REQUESTS_TOTAL).unwrap().get(&[method, status])
    }

    fn active(m: &PaymentMetrics) -> f64 {
        m.registry().gauge(ACTIVE_TRANSACTIONS).unwrap().snapshot()
    }

    fn bucket(m: &PaymentMetrics, le: f64) -> u64 {
        let snap = m.registry().histogram(PROCESSING_DURATION).unwrap().snapshot();
        snap.get(&LabelSet::default()).unwrap().bucket(le).unwrap()
    }

    fn observations(m: &PaymentMetrics) -> u64 {
        let snap = m.registry().histogram(PROCESSING_DURATION).unwrap().snapshot();
        snap.get(&LabelSet::default()).unwrap().count
    }

    #[tokio::test(start_paused = true)]
    async fn success_is_counted_and_timed() {
        let m = PaymentMetrics::new().unwrap();
        let v = m
            .instrumentation()
            .track("GET", OperationKind::Query, async {
                tokio::time::sleep(Duration::from_millis(600)).await;
                Ok(7)
            })
            .await
            .unwrap();
        assert_eq!(v, 7);
        assert_eq!(requests(&m, "GET", "success"), Some(1));
        assert_eq!(requests(&m, "GET", "error"), None);
        assert_eq!(bucket(&m, 0.5), 0);
        assert_eq!(bucket(&m, 1.0), 1);
        assert_eq!(active(&m), 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_transaction_restores_gauge() {
        let m = PaymentMetrics::new().unwrap();
        let before = active(&m);
        let registry = Arc::clone(m.registry());

        let res: Result<()> = m
            .instrumentation()
            .track("POST", OperationKind::Transaction, async {
                assert_eq!(registry.gauge(ACTIVE_TRANSACTIONS).unwrap().snapshot(), 1.0);
                tokio::time::sleep(Duration::from_millis(1500)).await;
                Err(PaysimError::UpstreamFailure("Payment processing failed".into()))
            })
            .await;

        assert_eq!(res.unwrap_err().client_code().as_str(), "UPSTREAM_FAILURE");
        assert_eq!(active(&m), before);
        assert_eq!(requests(&m, "POST", "error"), Some(1));
        assert_eq!(requests(&m, "POST", "success"), None);
        assert_eq!(bucket(&m, 1.0), 0);
        assert_eq!(bucket(&m, 2.0), 1);
    }

    fn explode() -> Result<()> {
        panic!("ledger exploded")
    }

    #[tokio::test]
    async fn panic_is_counted_as_error() {
        let m = PaymentMetrics::new().unwrap();
        let res: Result<()> = m
            .instrumentation()
            .track("POST", OperationKind::Transaction, async {
                explode()?;
                Ok(())
            })
            .await;

        match res {
            Err(PaysimError::UpstreamFailure(msg)) => {
                assert_eq!(msg, PANIC_MESSAGE);
                assert!(!msg.contains("ledger exploded"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(requests(&m, "POST", "error"), Some(1));
        assert_eq!(observations(&m), 1);
        assert_eq!(active(&m), 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_request_still_recorded() {
        let m = PaymentMetrics::new().unwrap();
        let fut = m.instrumentation().track("POST", OperationKind::Transaction, async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(())
        });
        assert!(tokio::time::timeout(Duration::from_secs(1), fut).await.is_err());

        assert_eq!(requests(&m, "POST", "error"), Some(1));
        assert_eq!(requests(&m, "POST", "success"), None);
        assert_eq!(observations(&m), 1);
        assert_eq!(active(&m), 0.0);
    }

    #[tokio::test]
    async fn gauge_decrement_floors_at_zero() {
        let m = PaymentMetrics::new().unwrap();
        let registry = Arc::clone(m.registry());
        m.instrumentation()
            .track("POST", OperationKind::Transaction, async {
                registry.gauge(ACTIVE_TRANSACTIONS).unwrap().set(0.0).unwrap();
                Ok(())
            })
            .await
            .unwrap();
        assert_eq!(active(&m), 0.0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_transactions_never_go_negative() {
        let m = Arc::new(PaymentMetrics::new().unwrap());
        let mut tasks = Vec::new();
        for i in 0..200u32 {
            let m = Arc::clone(&m);
            tasks.push(tokio::spawn(async move {
                let registry = Arc::clone(m.registry());
                let _ = m
                    .instrumentation()
                    .track("POST", OperationKind::Transaction, async move {
                        // a failed assertion here turns into an extra error below
                        let seen = registry.gauge(ACTIVE_TRANSACTIONS).unwrap().snapshot();
                        assert!(seen >= 1.0);
                        tokio::task::yield_now().await;
                        if i % 3 == 0 {
                            Err(PaysimError::UpstreamFailure("simulated".into()))
                        } else {
                            Ok(())
                        }
                    })
                    .await;
                assert!(active(&m) >= 0.0);
            }));
        }
        for t in tasks {
            t.await.unwrap();
        }

        assert_eq!(active(&m), 0.0);
        let ok = requests(&m, "POST", "success").unwrap_or(0);
        let err = requests(&m, "POST", "error").unwrap_or(0);
        assert_eq!(err, 67);
        assert_eq!(ok + err, 200);
        assert_eq!(observations(&m), 200);
    }
}
