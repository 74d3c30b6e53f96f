use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::Mutex;

use super::exposition;
use super::labels::{LabelKeys, LabelSet};
use super::Desc;
use crate::error::{PaysimError, Result};

/// Bucket bounds used when a histogram is registered without explicit ones.
pub const DEFAULT_BUCKETS: [f64; 11] = [0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

/// Bounds must be finite, strictly ascending and non-empty. `+Inf` is implicit.
pub(crate) fn validate_bounds(bounds: &[f64]) -> Result<Arc<[f64]>> {
    if bounds.is_empty() {
        return Err(PaysimError::InvalidArgument("histogram needs at least one bucket".into()));
    }
    if let Some(b) = bounds.iter().find(|b| !b.is_finite()) {
        return Err(PaysimError::InvalidArgument(format!("bucket bound must be finite, got {b}")));
    }
    if bounds.windows(2).any(|w| w[0] >= w[1]) {
        return Err(PaysimError::InvalidArgument(format!(
            "bucket bounds must be strictly ascending: {bounds:?}"
        )));
    }
    Ok(Arc::from(bounds))
}

#[derive(Debug, Clone)]
struct SeriesState {
    // cumulative: buckets[i] counts observations <= bounds[i]
    buckets: Vec<u64>,
    sum: f64,
    count: u64,
}

impl SeriesState {
    fn new(n: usize) -> Self {
        Self {
            buckets: vec![0; n],
            sum: 0.0,
            count: 0,
        }
    }
}

/// Histogram over fixed bucket bounds, partitioned by label values.
#[derive(Debug)]
pub struct Histogram {
    desc: Desc,
    keys: LabelKeys,
    bounds: Arc<[f64]>,
    series: DashMap<Vec<String>, Mutex<SeriesState>>,
}

/// One series as seen by a scrape.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramSeries {
    /// `(upper bound, cumulative count)` in ascending bound order.
    pub buckets: Vec<(f64, u64)>,
    pub sum: f64,
    pub count: u64,
}

impl HistogramSeries {
    /// Cumulative count of the bucket with exactly this bound.
    pub fn bucket(&self, le: f64) -> Option<u64> {
        self.buckets.iter().find(|(b, _)| *b == le).map(|(_, c)| *c)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistogramSnapshot {
    pub bounds: Vec<f64>,
    pub series: BTreeMap<LabelSet, HistogramSeries>,
}

impl HistogramSnapshot {
    pub fn get(&self, labels: &LabelSet) -> Option<&HistogramSeries> {
        self.series.get(labels)
    }
}

impl Histogram {
    pub(crate) fn new(desc: Desc, keys: LabelKeys, bounds: Arc<[f64]>) -> Self {
        let series = DashMap::new();
        if keys.is_empty() {
            series.insert(Vec::new(), Mutex::new(SeriesState::new(bounds.len())));
        }
        Self {
            desc,
            keys,
            bounds,
            series,
        }
    }

    pub fn desc(&self) -> &Desc {
        &self.desc
    }

    pub fn label_keys(&self) -> &LabelKeys {
        &self.keys
    }

    pub fn bounds(&self) -> &[f64] {
        &self.bounds
    }

    /// Record one value (seconds). Negative or non-finite values are rejected.
    pub fn observe(&self, value: f64, values: &[&str]) -> Result<()> {
        if !value.is_finite() || value < 0.0 {
            return Err(PaysimError::InvalidArgument(format!(
                "{}: observation must be finite and non-negative, got {value}",
                self.desc.name
            )));
        }
        let key = self.keys.series_key(values)?;
        let first = self.bounds.partition_point(|b| *b < value);

        let apply = |s: &Mutex<SeriesState>| {
            let mut s = s.lock();
            for b in &mut s.buckets[first..] {
                *b += 1;
            }
            s.sum += value;
            s.count += 1;
        };

        if let Some(s) = self.series.get(&key) {
            apply(s.value());
            return Ok(());
        }
        let s = self
            .series
            .entry(key)
            .or_insert_with(|| Mutex::new(SeriesState::new(self.bounds.len())));
        apply(s.value());
        Ok(())
    }

    pub fn observe_duration(&self, d: Duration, values: &[&str]) -> Result<()> {
        self.observe(d.as_secs_f64(), values)
    }

    pub fn snapshot(&self) -> HistogramSnapshot {
        let series = self
            .series
            .iter()
            .map(|r| {
                let s = r.value().lock().clone();
                let buckets = self.bounds.iter().copied().zip(s.buckets).collect();
                (
                    self.keys.label_set(r.key()),
                    HistogramSeries {
                        buckets,
                        sum: s.sum,
                        count: s.count,
                    },
                )
            })
            .collect();
        HistogramSnapshot {
            bounds: self.bounds.to_vec(),
            series,
        }
    }

    pub(crate) fn render(&self, out: &mut impl fmt::Write) -> fmt::Result {
        exposition::write_histogram(out, &self.desc, &self.snapshot())
    }
}
