use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use super::exposition;
use super::Desc;
use crate::error::{PaysimError, Result};

/// Unlabeled gauge holding an `f64` as raw bits.
///
/// No floor or ceiling is enforced here; callers that need one (the
/// in-flight transaction count never drops below zero) go through
/// [`Gauge::update`].
#[derive(Debug)]
pub struct Gauge {
    desc: Desc,
    bits: AtomicU64,
}

fn check_finite(name: &str, v: f64) -> Result<()> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(PaysimError::InvalidArgument(format!("{name}: gauge value must be finite, got {v}")))
    }
}

impl Gauge {
    pub(crate) fn new(desc: Desc) -> Self {
        Self {
            desc,
            bits: AtomicU64::new(0f64.to_bits()),
        }
    }

    pub fn desc(&self) -> &Desc {
        &self.desc
    }

    pub fn set(&self, v: f64) -> Result<()> {
        check_finite(&self.desc.name, v)?;
        self.bits.store(v.to_bits(), Ordering::Relaxed);
        Ok(())
    }

    pub fn add(&self, delta: f64) -> Result<()> {
        check_finite(&self.desc.name, delta)?;
        self.try_update(|v| v + delta)
    }

    pub fn subtract(&self, delta: f64) -> Result<()> {
        check_finite(&self.desc.name, delta)?;
        self.try_update(|v| v - delta)
    }

    pub fn inc(&self) -> Result<()> {
        self.add(1.0)
    }

    pub fn dec(&self) -> Result<()> {
        self.subtract(1.0)
    }

    /// Atomically replace the value with `f(current)`; returns the new value.
    pub fn update(&self, f: impl Fn(f64) -> f64) -> f64 {
        let mut cur = self.bits.load(Ordering::Relaxed);
        loop {
            let next = f(f64::from_bits(cur));
            match self
                .bits
                .compare_exchange_weak(cur, next.to_bits(), Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return next,
                Err(actual) => cur = actual,
            }
        }
    }

    /// Like [`Gauge::update`], but leaves the value untouched and fails when
    /// the result would not be finite.
    fn try_update(&self, f: impl Fn(f64) -> f64) -> Result<()> {
        self.bits
            .fetch_update(Ordering::AcqRel, Ordering::Relaxed, |cur| {
                let next = f(f64::from_bits(cur));
                next.is_finite().then(|| next.to_bits())
            })
            .map(|_| ())
            .map_err(|cur| {
                PaysimError::InvalidArgument(format!(
                    "{}: adjusting {} would leave the gauge non-finite",
                    self.desc.name,
                    f64::from_bits(cur)
                ))
            })
    }

    pub fn snapshot(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }

    pub(crate) fn render(&self, out: &mut impl fmt::Write) -> fmt::Result {
        exposition::write_gauge(out, &self.desc, self.snapshot())
    }
}
