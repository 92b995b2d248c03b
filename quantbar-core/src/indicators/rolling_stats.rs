//! Rolling mean and population standard deviation.
//!
//! One pass writes both fields. Variance comes from running sums of the
//! window (see [`RollingWindow`]) and is clamped at zero, so floating-point
//! cancellation can never yield a negative variance or a NaN deviation.

use super::{is_degenerate, Indicator, RollingWindow};
use crate::domain::{Column, FieldKey, Series};

#[derive(Debug, Clone)]
pub struct RollingStats {
    window: usize,
    column: Column,
}

impl RollingStats {
    pub fn new(window: usize, column: Column) -> Self {
        Self { window, column }
    }

    pub fn mean_key(&self) -> FieldKey {
        FieldKey::roll_mean(self.window)
    }

    pub fn std_key(&self) -> FieldKey {
        FieldKey::roll_std(self.window)
    }
}

impl Indicator for RollingStats {
    fn outputs(&self) -> Vec<FieldKey> {
        vec![self.mean_key(), self.std_key()]
    }

    fn source(&self) -> Column {
        self.column
    }

    fn window(&self) -> usize {
        self.window
    }

    fn apply(&self, series: &mut Series) {
        if is_degenerate(series, self.window, "roll_mean_std") {
            return;
        }
        let (mean, std) = rolling_mean_std(&series.column(self.column), self.window);
        series.attach(self.mean_key(), Some(self.column), mean);
        series.attach(self.std_key(), Some(self.column), std);
    }
}

/// Rolling (mean, std) of a slice. Both NaN until `window` samples are seen.
pub fn rolling_mean_std(values: &[f64], window: usize) -> (Vec<f64>, Vec<f64>) {
    let n = values.len();
    if window == 0 {
        return (vec![f64::NAN; n], vec![f64::NAN; n]);
    }
    let mut rolling = RollingWindow::new(window);
    let mut means = Vec::with_capacity(n);
    let mut stds = Vec::with_capacity(n);
    for &v in values {
        rolling.push(v);
        means.push(rolling.mean());
        stds.push(rolling.std_dev());
    }
    (means, stds)
}
