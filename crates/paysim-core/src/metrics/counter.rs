use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

use super::exposition;
use super::labels::{LabelKeys, LabelSet};
use super::Desc;
use crate::error::{PaysimError, Result};

/// Monotonic counter partitioned by label values.
#[derive(Debug)]
pub struct Counter {
    desc: Desc,
    keys: LabelKeys,
    series: DashMap<Vec<String>, AtomicU64>,
}

/// Point-in-time totals per series.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub series: BTreeMap<LabelSet, u64>,
}

impl CounterSnapshot {
    pub fn get(&self, labels: &LabelSet) -> Option<u64> {
        self.series.get(labels).copied()
    }
}

impl Counter {
    pub(crate) fn new(desc: Desc, keys: LabelKeys) -> Self {
        let series = DashMap::new();
        if keys.is_empty() {
            series.insert(Vec::new(), AtomicU64::new(0));
        }
        Self { desc, keys, series }
    }

    pub fn desc(&self) -> &Desc {
        &self.desc
    }

    pub fn label_keys(&self) -> &LabelKeys {
        &self.keys
    }

    /// Increment by 1.
    pub fn inc(&self, values: &[&str]) -> Result<()> {
        self.add(values, 1)
    }

    /// Increment by a positive delta.
    pub fn add(&self, values: &[&str], delta: u64) -> Result<()> {
        if delta == 0 {
            return Err(PaysimError::InvalidArgument(format!(
                "{}: counter delta must be positive",
                self.desc.name
            )));
        }
        let key = self.keys.series_key(values)?;
        if let Some(c) = self.series.get(&key) {
            return self.add_to_total(&c, delta);
        }
        let c = self.series.entry(key).or_insert_with(|| AtomicU64::new(0));
        self.add_to_total(&c, delta)
    }

    // Totals never wrap: an add that would overflow is rejected and leaves
    // the series untouched.
    fn add_to_total(&self, total: &AtomicU64, delta: u64) -> Result<()> {
        total
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| v.checked_add(delta))
            .map(|_| ())
            .map_err(|cur| {
                PaysimError::InvalidArgument(format!(
                    "{}: adding {delta} to {cur} overflows the counter",
                    self.desc.name
                ))
            })
    }

    /// Current total of one series, `None` if it was never touched.
    pub fn get(&self, values: &[&str]) -> Option<u64> {
        let key = self.keys.series_key(values).ok()?;
        self.series.get(&key).map(|c| c.load(Ordering::Relaxed))
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        let series = self
            .series
            .iter()
            .map(|r| (self.keys.label_set(r.key()), r.value().load(Ordering::Relaxed)))
            .collect();
        CounterSnapshot { series }
    }

    pub(crate) fn render(&self, out: &mut impl fmt::Write) -> fmt::Result {
        exposition::write_counter(out, &self.desc, &self.snapshot())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    fn requests() -> Counter {
        Counter::new(
            Desc::new("payment_requests_total", "Total").unwrap(),
            LabelKeys::new(&["method", "status"], &[]).unwrap(),
        )
    }

    #[test]
    fn identical_labels_accumulate() {
        let c = requests();
        c.inc(&["GET", "success"]).unwrap();
        c.inc(&["GET", "success"]).unwrap();
        c.add(&["GET", "success"], 5).unwrap();
        c.inc(&["POST", "error"]).unwrap();
        assert_eq!(c.get(&["GET", "success"]), Some(7));
        assert_eq!(c.get(&["POST", "error"]), Some(1));
        assert_eq!(c.get(&["POST", "success"]), None);
    }

    #[test]
    fn zero_delta_rejected() {
        let c = requests();
        let err = c.add(&["GET", "success"], 0).unwrap_err();
        assert_eq!(err.client_code().as_str(), "INVALID_ARGUMENT");
        assert_eq!(c.get(&["GET", "success"]), None);
    }

    #[test]
    fn overflow_rejected_without_wrapping() {
        let c = requests();
        c.add(&["GET", "success"], u64::MAX).unwrap();
        let err = c.inc(&["GET", "success"]).unwrap_err();
        assert_eq!(err.client_code().as_str(), "INVALID_ARGUMENT");
        assert_eq!(c.get(&["GET", "success"]), Some(u64::MAX));

        c.add(&["POST", "success"], u64::MAX - 1).unwrap();
        assert!(c.add(&["POST", "success"], 2).is_err());
        c.inc(&["POST", "success"]).unwrap();
        assert_eq!(c.get(&["POST", "success"]), Some(u64::MAX));
    }

    #[test]
    fn wrong_arity_rejected() {
        let c = requests();
        assert!(c.inc(&["GET"]).is_err());
        assert!(c.inc(&["GET", "success", "extra"]).is_err());
        assert!(c.snapshot().series.is_empty());
    }

    #[test]
    fn snapshot_keys_are_label_sets() {
        let c = requests();
        c.inc(&["GET", "error"]).unwrap();
        let snap = c.snapshot();
        let key = LabelSet::from_pairs(&[("method", "GET"), ("status", "error")]);
        assert_eq!(snap.get(&key), Some(1));
    }

    #[test]
    fn unlabeled_counter_starts_at_zero() {
        let c = Counter::new(Desc::new("jobs_total", "Jobs").unwrap(), LabelKeys::empty());
        assert_eq!(c.get(&[]), Some(0));
        c.inc(&[]).unwrap();
        assert_eq!(c.get(&[]), Some(1));
    }
}
