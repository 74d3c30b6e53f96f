use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;

use super::counter::Counter;
use super::gauge::Gauge;
use super::histogram::{validate_bounds, Histogram, DEFAULT_BUCKETS};
use super::labels::LabelKeys;
use super::{Desc, MetricKind};
use crate::error::{PaysimError, Result};

/// Typed handle to a registered instrument.
#[derive(Debug, Clone)]
pub enum Metric {
    Counter(Arc<Counter>),
    Histogram(Arc<Histogram>),
    Gauge(Arc<Gauge>),
}

impl Metric {
    pub fn kind(&self) -> MetricKind {
        match self {
            Metric::Counter(_) => MetricKind::Counter,
            Metric::Histogram(_) => MetricKind::Histogram,
            Metric::Gauge(_) => MetricKind::Gauge,
        }
    }

    pub fn desc(&self) -> &Desc {
        match self {
            Metric::Counter(c) => c.desc(),
            Metric::Histogram(h) => h.desc(),
            Metric::Gauge(g) => g.desc(),
        }
    }

    fn render(&self, out: &mut String) -> std::fmt::Result {
        match self {
            Metric::Counter(c) => c.render(out),
            Metric::Histogram(h) => h.render(out),
            Metric::Gauge(g) => g.render(out),
        }
    }
}

/// Owns every instrument of the process.
///
/// Built once at startup and shared by reference; instruments are never
/// removed. Lookups go through the `DashMap`, scrapes walk `order` so output
/// follows registration order.
#[derive(Debug, Default)]
pub struct MetricRegistry {
    metrics: DashMap<String, Metric>,
    order: RwLock<Vec<Metric>>,
}

impl MetricRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an instrument. Names are unique; `buckets` only applies to
    /// histograms (default bounds when `None`); gauges take no labels.
    pub fn register(
        &self,
        name: &str,
        kind: MetricKind,
        help: &str,
        label_keys: &[&str],
        buckets: Option<&[f64]>,
    ) -> Result<Metric> {
        let desc = Desc::new(name, help)?;
        if buckets.is_some() && kind != MetricKind::Histogram {
            return Err(PaysimError::InvalidArgument(format!(
                "{name}: buckets only apply to histograms"
            )));
        }

        let metric = match kind {
            MetricKind::Counter => {
                Metric::Counter(Arc::new(Counter::new(desc, LabelKeys::new(label_keys, &[])?)))
            }
            MetricKind::Histogram => {
                let keys = LabelKeys::new(label_keys, &["le"])?;
                let bounds = validate_bounds(buckets.unwrap_or(&DEFAULT_BUCKETS))?;
                Metric::Histogram(Arc::new(Histogram::new(desc, keys, bounds)))
            }
            MetricKind::Gauge => {
                if !label_keys.is_empty() {
                    return Err(PaysimError::InvalidArgument(format!(
                        "{name}: gauges are unlabeled"
                    )));
                }
                Metric::Gauge(Arc::new(Gauge::new(desc)))
            }
        };

        match self.metrics.entry(name.to_string()) {
            Entry::Occupied(_) => Err(PaysimError::DuplicateName(name.to_string())),
            Entry::Vacant(slot) => {
                self.order.write().push(metric.clone());
                slot.insert(metric.clone());
                tracing::debug!(metric = %name, kind = kind.as_str(), "metric registered");
                Ok(metric)
            }
        }
    }

    pub fn register_counter(&self, name: &str, help: &str, label_keys: &[&str]) -> Result<Arc<Counter>> {
        match self.register(name, MetricKind::Counter, help, label_keys, None)? {
            Metric::Counter(c) => Ok(c),
            other => Err(kind_mismatch(name, MetricKind::Counter, other.kind())),
        }
    }

    pub fn register_histogram(
        &self,
        name: &str,
        help: &str,
        label_keys: &[&str],
        buckets: &[f64],
    ) -> Result<Arc<Histogram>> {
        match self.register(name, MetricKind::Histogram, help, label_keys, Some(buckets))? {
            Metric::Histogram(h) => Ok(h),
            other => Err(kind_mismatch(name, MetricKind::Histogram, other.kind())),
        }
    }

    pub fn register_gauge(&self, name: &str, help: &str) -> Result<Arc<Gauge>> {
        match self.register(name, MetricKind::Gauge, help, &[], None)? {
            Metric::Gauge(g) => Ok(g),
            other => Err(kind_mismatch(name, MetricKind::Gauge, other.kind())),
        }
    }

    pub fn get(&self, name: &str) -> Result<Metric> {
        self.metrics
            .get(name)
            .map(|m| m.value().clone())
            .ok_or_else(|| PaysimError::NotFound(name.to_string()))
    }

    pub fn counter(&self, name: &str) -> Result<Arc<Counter>> {
        match self.get(name)? {
            Metric::Counter(c) => Ok(c),
            other => Err(kind_mismatch(name, MetricKind::Counter, other.kind())),
        }
    }

    pub fn histogram(&self, name: &str) -> Result<Arc<Histogram>> {
        match self.get(name)? {
            Metric::Histogram(h) => Ok(h),
            other => Err(kind_mismatch(name, MetricKind::Histogram, other.kind())),
        }
    }

    pub fn gauge(&self, name: &str) -> Result<Arc<Gauge>> {
        match self.get(name)? {
            Metric::Gauge(g) => Ok(g),
            other => Err(kind_mismatch(name, MetricKind::Gauge, other.kind())),
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.order.read().iter().map(|m| m.desc().name.clone()).collect()
    }

    /// Render every instrument in the text exposition format.
    ///
    /// Each series is read atomically; different series may reflect slightly
    /// different instants.
    pub fn render(&self) -> Result<String> {
        let metrics: Vec<Metric> = self.order.read().clone();
        let mut out = String::new();
        for m in &metrics {
            m.render(&mut out)?;
        }
        Ok(out)
    }
}

fn kind_mismatch(name: &str, want: MetricKind, got: MetricKind) -> PaysimError {
    PaysimError::InvalidArgument(format!(
        "{name} is a {}, not a {}",
        got.as_str(),
        want.as_str()
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_names_rejected() {
        let reg = MetricRegistry::new();
        reg.register_counter("payment_requests_total", "Total", &["method", "status"])
            .unwrap();
        let err = reg.register_gauge("payment_requests_total", "Other").unwrap_err();
        assert_eq!(err.client_code().as_str(), "DUPLICATE_NAME");
        assert_eq!(reg.names(), vec!["payment_requests_total"]);
    }

    #[test]
    fn lookup_by_name_and_kind() {
        let reg = MetricRegistry::new();
        reg.register_gauge("active_transactions_gauge", "Active").unwrap();
        assert!(reg.gauge("active_transactions_gauge").is_ok());
        assert_eq!(
            reg.counter("active_transactions_gauge").unwrap_err().client_code().as_str(),
            "INVALID_ARGUMENT"
        );
        assert_eq!(reg.get("nope").err().unwrap().client_code().as_str(), "NOT_FOUND");
    }

    #[test]
    fn registration_argument_checks() {
        let reg = MetricRegistry::new();
        assert!(reg.register("bad-name", MetricKind::Counter, "x", &[], None).is_err());
        assert!(reg.register("c_total", MetricKind::Counter, "x", &[], Some(&[1.0])).is_err());
        assert!(reg.register("g", MetricKind::Gauge, "x", &["a"], None).is_err());
        assert!(reg.register("h", MetricKind::Histogram, "x", &["le"], None).is_err());
        assert!(reg.register_histogram("h2", "x", &[], &[2.0, 1.0]).is_err());
        assert!(reg.names().is_empty());
    }

    #[test]
    fn histogram_defaults_buckets() {
        let reg = MetricRegistry::new();
        reg.register("lat_seconds", MetricKind::Histogram, "x", &[], None).unwrap();
        assert_eq!(reg.histogram("lat_seconds").unwrap().bounds(), &DEFAULT_BUCKETS[..]);
    }

    #[test]
    fn render_follows_registration_order() {
        let reg = MetricRegistry::new();
        reg.register_gauge("zeta", "Z").unwrap();
        reg.register_counter("alpha_total", "A", &[]).unwrap();
        let text = reg.render().unwrap();
        let zeta = text.find("# HELP zeta").unwrap();
        let alpha = text.find("# HELP alpha_total").unwrap();
        assert!(zeta < alpha);
        assert!(text.contains("zeta 0.0\n"));
        assert!(text.contains("alpha_total 0\n"));
    }
}
