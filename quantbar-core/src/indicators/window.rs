//! Bounded rolling window with running sums.
//!
//! Holds the last `capacity` samples in a queue and keeps the sum, plus the
//! sum and sum of squares of deviations from a fixed shift (the first finite
//! sample seen). Shifting keeps `E[x^2] - E[x]^2` from cancelling
//! catastrophically when values are large relative to their spread.
//!
//! Running sums drift once samples start leaving the window, so the length of
//! the trailing run of identical samples is tracked too. A window covered by
//! one run reports its value as the mean and a variance of exactly zero.
//!
//! NaN samples are counted rather than summed, so a NaN taints only the
//! windows that contain it.

use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct RollingWindow {
    capacity: usize,
    samples: VecDeque<f64>,
    nan_count: usize,
    shift: Option<f64>,
    sum: f64,
    shifted_sum: f64,
    shifted_sum_sq: f64,
    last: f64,
    run: usize,
}

impl RollingWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity + 1),
            nan_count: 0,
            shift: None,
            sum: 0.0,
            shifted_sum: 0.0,
            shifted_sum_sq: 0.0,
            last: f64::NAN,
            run: 0,
        }
    }

    /// Add a sample, evicting the oldest once the window is over capacity.
    pub fn push(&mut self, value: f64) {
        self.samples.push_back(value);
        self.run = if value == self.last { self.run + 1 } else { 1 };
        self.last = value;
        if value.is_nan() {
            self.nan_count += 1;
        } else {
            let shift = *self.shift.get_or_insert(value);
            let d = value - shift;
            self.sum += value;
            self.shifted_sum += d;
            self.shifted_sum_sq += d * d;
        }

        if self.samples.len() > self.capacity {
            if let Some(old) = self.samples.pop_front() {
                self.evict(old);
            }
        }
    }

    fn evict(&mut self, old: f64) {
        if old.is_nan() {
            self.nan_count -= 1;
        } else if let Some(shift) = self.shift {
            let d = old - shift;
            self.sum -= old;
            self.shifted_sum -= d;
            self.shifted_sum_sq -= d * d;
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// True once `capacity` samples are held.
    pub fn is_full(&self) -> bool {
        self.capacity > 0 && self.samples.len() == self.capacity
    }

    fn ready(&self) -> bool {
        self.is_full() && self.nan_count == 0
    }

    fn is_constant(&self) -> bool {
        self.run >= self.capacity
    }

    /// Sum of the window; NaN until full or while a NaN is held.
    pub fn sum(&self) -> f64 {
        if self.ready() {
            self.sum
        } else {
            f64::NAN
        }
    }

    /// Mean of the window; NaN until full or while a NaN is held.
    pub fn mean(&self) -> f64 {
        if !self.ready() {
            return f64::NAN;
        }
        if self.is_constant() {
            return self.last;
        }
        let n = self.capacity as f64;
        self.shift.unwrap_or(0.0) + self.shifted_sum / n
    }

    /// Population variance, clamped at zero; NaN until full or while a NaN is held.
    pub fn variance(&self) -> f64 {
        if !self.ready() {
            return f64::NAN;
        }
        if self.is_constant() {
            return 0.0;
        }
        let n = self.capacity as f64;
        let mean_d = self.shifted_sum / n;
        let variance = self.shifted_sum_sq / n - mean_d * mean_d;
        if variance > 0.0 {
            variance
        } else {
            0.0
        }
    }

    /// Population standard deviation; never negative.
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }
}
