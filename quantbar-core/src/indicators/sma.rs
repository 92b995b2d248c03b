//! Simple Moving Average (SMA).
//!
//! Running sum over a bounded queue of the last `window` values.
//! First valid value at index window-1; NaN before that.

use super::{is_degenerate, Indicator, RollingWindow};
use crate::domain::{Column, FieldKey, Series};

#[derive(Debug, Clone)]
pub struct Sma {
    window: usize,
    column: Column,
}

impl Sma {
    pub fn new(window: usize, column: Column) -> Self {
        Self { window, column }
    }

    pub fn key(&self) -> FieldKey {
        FieldKey::sma(self.window)
    }
}

impl Indicator for Sma {
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
        if is_degenerate(series, self.window, "sma") {
            return;
        }
        let values = sma_of_series(&series.column(self.column), self.window);
        series.attach(self.key(), Some(self.column), values);
    }
}

/// Compute raw SMA values from a pre-extracted f64 slice.
pub fn sma_of_series(values: &[f64], window: usize) -> Vec<f64> {
    if window == 0 {
        return vec![f64::NAN; values.len()];
    }
    let divisor = window as f64;
    let mut rolling = RollingWindow::new(window);
    values
        .iter()
        .map(|&v| {
            rolling.push(v);
            rolling.sum() / divisor
        })
        .collect()
}
