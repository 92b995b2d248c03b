//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[t] = alpha * value[t] + (1 - alpha) * EMA[t-1], alpha = 2 / (window + 1).
//! Seed: EMA[0] = value[0], so there is no NaN warm-up.
//! A NaN input propagates to every later value.

use super::{is_degenerate, Indicator};
use crate::domain::{Column, FieldKey, Series};

#[derive(Debug, Clone)]
pub struct Ema {
    window: usize,
    column: Column,
}

impl Ema {
    pub fn new(window: usize, column: Column) -> Self {
        Self { window, column }
    }

    pub fn key(&self) -> FieldKey {
        FieldKey::ema(self.window)
    }
}

impl Indicator for Ema {
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
        if is_degenerate(series, self.window, "ema") {
            return;
        }
        let values = ema_of_series(&series.column(self.column), self.window);
        series.attach(self.key(), Some(self.column), values);
    }
}

/// Compute raw EMA values from a pre-extracted f64 slice.
pub fn ema_of_series(values: &[f64], window: usize) -> Vec<f64> {
    if window == 0 {
        return vec![f64::NAN; values.len()];
    }
    let alpha = 2.0 / (window as f64 + 1.0);
    let mut prev: Option<f64> = None;
    values
        .iter()
        .map(|&v| {
            let ema = match prev {
                None => v,
                Some(p) => alpha * v + (1.0 - alpha) * p,
            };
            prev = Some(ema);
            ema
        })
        .collect()
}
