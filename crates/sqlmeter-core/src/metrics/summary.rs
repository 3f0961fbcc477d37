//! Summary series for latency distributions.
//!
//! A summary keeps running totals (count and sum) over every observation and
//! a bounded window of the most recent samples from which quantiles are
//! estimated.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::Error;

/// Quantiles reported when none are configured.
pub const DEFAULT_QUANTILES: [f64; 4] = [0.1, 0.5, 0.9, 0.99];

/// Number of samples retained for quantile estimation by default.
pub const DEFAULT_SUMMARY_WINDOW: usize = 1024;

/// Options shared by every series of a summary family.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryOpts {
    /// Quantiles to report, each within `0.0..=1.0`.
    pub quantiles: Vec<f64>,
    /// Maximum number of recent samples kept per series.
    pub window: usize,
}

impl SummaryOpts {
    /// Set the reported quantiles.
    pub fn with_quantiles(mut self, quantiles: impl Into<Vec<f64>>) -> Self {
        self.quantiles = quantiles.into();
        self
    }

    /// Set the sample window size.
    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window.max(1);
        self
    }

    pub(crate) fn validate(&self) -> Result<(), Error> {
        match self
            .quantiles
            .iter()
            .find(|q| !(0.0..=1.0).contains(*q))
        {
            Some(&q) => Err(Error::InvalidQuantile(q)),
            None => Ok(()),
        }
    }
}

impl Default for SummaryOpts {
    fn default() -> Self {
        Self {
            quantiles: DEFAULT_QUANTILES.to_vec(),
            window: DEFAULT_SUMMARY_WINDOW,
        }
    }
}

/// Distribution of observed values.
#[derive(Debug)]
pub struct Summary {
    quantiles: Arc<[f64]>,
    capacity: usize,
    /// Most recent samples, oldest first.
    window: Mutex<VecDeque<f64>>,
    count: AtomicU64,
    /// `f64` bits of the running sum.
    sum: AtomicU64,
}

impl Summary {
    /// Create an empty summary.
    pub fn new(opts: &SummaryOpts) -> Self {
        Self {
            quantiles: opts.quantiles.clone().into(),
            capacity: opts.window.max(1),
            window: Mutex::new(VecDeque::with_capacity(opts.window.clamp(1, 64))),
            count: AtomicU64::new(0),
            sum: AtomicU64::new(0f64.to_bits()),
        }
    }

    /// Record an observation.
    pub fn observe(&self, value: f64) {
        self.count.fetch_add(1, Ordering::Relaxed);

        let mut current = self.sum.load(Ordering::Relaxed);
        loop {
            let next = (f64::from_bits(current) + value).to_bits();
            match self.sum.compare_exchange_weak(
                current,
                next,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }

        let mut window = self.window.lock();
        if window.len() == self.capacity {
            window.pop_front();
        }
        window.push_back(value);
    }

    /// Total number of observations.
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// Sum of all observations.
    pub fn sum(&self) -> f64 {
        f64::from_bits(self.sum.load(Ordering::Relaxed))
    }

    /// Configured quantiles.
    pub fn quantiles(&self) -> &[f64] {
        &self.quantiles
    }

    /// Estimate quantile `q` over the retained window.
    ///
    /// Uses linear interpolation between closest ranks. Returns `None` when
    /// nothing has been observed.
    pub fn quantile(&self, q: f64) -> Option<f64> {
        let sorted = self.sorted_window();
        interpolate(&sorted, q)
    }

    /// All configured quantiles, computed over one snapshot of the window.
    pub fn quantile_values(&self) -> Vec<(f64, Option<f64>)> {
        let sorted = self.sorted_window();
        self.quantiles
            .iter()
            .map(|&q| (q, interpolate(&sorted, q)))
            .collect()
    }

    fn sorted_window(&self) -> Vec<f64> {
        let mut samples: Vec<f64> = self.window.lock().iter().copied().collect();
        samples.sort_by(f64::total_cmp);
        samples
    }
}

fn interpolate(sorted: &[f64], q: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let rank = q.clamp(0.0, 1.0) * last as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}
