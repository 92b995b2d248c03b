//! Rolling z-score: (value - rolling mean) / rolling std.
//!
//! Depends on the rolling mean/std for the same window and source column,
//! which are resolved (and computed if needed) before the pass. Windows with
//! a deviation at or below [`MIN_STD`] yield NaN rather than a blow-up.

use super::{is_degenerate, resolve, Indicator, RollingStats};
use crate::domain::{Column, FieldKey, Series};

/// Smallest standard deviation a z-score will divide by.
pub const MIN_STD: f64 = 1e-10;

#[derive(Debug, Clone)]
pub struct ZScore {
    window: usize,
    column: Column,
}

impl ZScore {
    pub fn new(window: usize, column: Column) -> Self {
        Self { window, column }
    }

    pub fn key(&self) -> FieldKey {
        FieldKey::zscore(self.window)
    }
}

impl Indicator for ZScore {
    fn outputs(&self) -> Vec<FieldKey> {
        vec![self.key()]
    }

    fn source(&self) -> Column {
        self.column
    }

    fn window(&self) -> usize {
        self.window
    }

    fn apply(&self, series: &mut Series) {
        if is_degenerate(series, self.window, "zscore") {
            return;
        }
        let stats = RollingStats::new(self.window, self.column);
        if resolve(series, &stats, &stats.mean_key()).is_none() {
            return;
        }
        let values = series.column(self.column);
        let z = match (series.field(&stats.mean_key()), series.field(&stats.std_key())) {
            (Some(mean), Some(std)) => zscore_of_series(&values, mean, std),
            _ => vec![f64::NAN; values.len()],
        };
        series.attach(self.key(), Some(self.column), z);
    }
}

/// Element-wise z-score given aligned mean and std slices.
pub fn zscore_of_series(values: &[f64], mean: &[f64], std: &[f64]) -> Vec<f64> {
    values
        .iter()
        .zip(mean)
        .zip(std)
        .map(|((&v, &m), &sd)| {
            if m.is_finite() && sd.is_finite() && sd > MIN_STD {
                (v - m) / sd
            } else {
                f64::NAN
            }
        })
        .collect()
}
