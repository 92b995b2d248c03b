//! Rolling sum over the last `window` values.

use super::{is_degenerate, Indicator, RollingWindow};
use crate::domain::{Column, FieldKey, Series};

#[derive(Debug, Clone)]
pub struct RollingSum {
    window: usize,
    column: Column,
}

impl RollingSum {
    pub fn new(window: usize, column: Column) -> Self {
        Self { window, column }
    }

    pub fn key(&self) -> FieldKey {
        FieldKey::roll_sum(self.window)
    }
}

impl Indicator for RollingSum {
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
        if is_degenerate(series, self.window, "roll_sum") {
            return;
        }
        let values = rolling_sum_of_series(&series.column(self.column), self.window);
        series.attach(self.key(), Some(self.column), values);
    }
}

pub fn rolling_sum_of_series(values: &[f64], window: usize) -> Vec<f64> {
    if window == 0 {
        return vec![f64::NAN; values.len()];
    }
    let mut rolling = RollingWindow::new(window);
    values
        .iter()
        .map(|&v| {
            rolling.push(v);
            rolling.sum()
        })
        .collect()
}
