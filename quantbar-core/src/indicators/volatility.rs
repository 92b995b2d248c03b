//! Annualized volatility: rolling std scaled by sqrt(periods per year).

use super::{is_degenerate, resolve, Indicator, RollingStats};
use crate::domain::{Column, FieldKey, Series};

/// Periods per year for daily bars.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone)]
pub struct Volatility {
    window: usize,
    column: Column,
    periods_per_year: f64,
}

impl Volatility {
    pub fn new(window: usize, column: Column, periods_per_year: f64) -> Self {
        Self {
            window,
            column,
            periods_per_year,
        }
    }

    pub fn key(&self) -> FieldKey {
        FieldKey::volatility(self.window)
    }
}

impl Indicator for Volatility {
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
        if is_degenerate(series, self.window, "volatility") {
            return;
        }
        let stats = RollingStats::new(self.window, self.column);
        let factor = self.periods_per_year.sqrt();
        let Some(std) = resolve(series, &stats, &stats.std_key()) else {
            return;
        };
        let vol: Vec<f64> = std.iter().map(|&sd| sd * factor).collect();
        series.attach(self.key(), Some(self.column), vol);
    }
}
