//! In-process metric primitives rendered in the Prometheus text format.
//!
//! Counters and gauges are plain atomics; histogram series sit behind a
//! per-series mutex so a scrape never observes a half-applied observation.
//! Series are keyed by the ordered tuple of label values and stored in a
//! `DashMap` per instrument, so unrelated metrics never share a lock.

pub mod counter;
pub mod exposition;
pub mod gauge;
pub mod histogram;
pub mod labels;
pub mod registry;

pub use counter::{Counter, CounterSnapshot};
pub use gauge::Gauge;
pub use histogram::{Histogram, HistogramSeries, HistogramSnapshot, DEFAULT_BUCKETS};
pub use labels::{LabelKeys, LabelSet};
pub use registry::{Metric, MetricRegistry};

/// Kind of instrument, as written on the `# TYPE` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Histogram,
    Gauge,
}

impl MetricKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Histogram => "histogram",
            MetricKind::Gauge => "gauge",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "counter" => Some(MetricKind::Counter),
            "histogram" => Some(MetricKind::Histogram),
            "gauge" => Some(MetricKind::Gauge),
            _ => None,
        }
    }
}

/// Name and help text shared by every instrument.
#[derive(Debug, Clone)]
pub struct Desc {
    pub name: String,
    pub help: String,
}

impl Desc {
    pub fn new(name: &str, help: &str) -> crate::Result<Self> {
        labels::validate_metric_name(name)?;
        Ok(Self {
            name: name.to_string(),
            help: help.to_string(),
        })
    }
}
