//! Rate-of-change momentum.
//!
//! `roc = (price[t] - price[t - window]) / price[t - window]`, long above
//! `upper`, short below `lower`. Stateless: each bar is classified on its own.

use tracing::debug;

use super::{SignalFamily, SignalRule};
use crate::domain::{Column, FieldKey, Position, Series};

/// Past prices at or below this are treated as unusable.
const MIN_PAST_PRICE: f64 = 1e-10;

/// Classify one rate of change against the thresholds.
pub fn classify(roc: f64, upper: f64, lower: f64) -> Position {
    if roc > upper {
        Position::Long
    } else if roc < lower {
        Position::Short
    } else {
        Position::Flat
    }
}

/// Momentum rule over any source column.
///
/// Writes nothing when the series is not longer than `window`.
#[derive(Debug, Clone)]
pub struct RocMomentum {
    pub window: usize,
    pub upper: f64,
    pub lower: f64,
    pub column: Column,
    output: FieldKey,
}

impl RocMomentum {
    pub fn new(window: usize, upper: f64, lower: f64, column: Column, output: &str) -> Self {
        Self {
            window,
            upper,
            lower,
            column,
            output: FieldKey::signal(output),
        }
    }

    fn positions(&self, prices: &[f64]) -> Vec<Position> {
        (0..prices.len())
            .map(|i| {
                if i < self.window {
                    return Position::Flat;
                }
                let past = prices[i - self.window];
                if past.is_nan() || past <= MIN_PAST_PRICE {
                    return Position::Flat;
                }
                let roc = (prices[i] - past) / past;
                classify(roc, self.upper, self.lower)
            })
            .collect()
    }
}

impl SignalRule for RocMomentum {
    fn name(&self) -> &str {
        "roc_momentum"
    }

    fn family(&self) -> SignalFamily {
        SignalFamily::Trend
    }

    fn output(&self) -> &FieldKey {
        &self.output
    }

    fn apply(&self, series: &mut Series) {
        if self.window == 0 || series.len() <= self.window {
            debug!(window = self.window, len = series.len(), "skipping momentum");
            return;
        }
        let positions = self.positions(&series.column(self.column));
        series.record_positions(self.output.clone(), &positions);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_series;
    use crate::signals::signal_values;

    #[test]
    fn classify_dead_zone() {
        assert_eq!(classify(0.06, 0.05, -0.05), Position::Long);
        assert_eq!(classify(-0.06, 0.05, -0.05), Position::Short);
        assert_eq!(classify(0.05, 0.05, -0.05), Position::Flat);
        assert_eq!(classify(-0.05, 0.05, -0.05), Position::Flat);
        assert_eq!(classify(0.0, 0.05, -0.05), Position::Flat);
    }

    #[test]
    fn rally_goes_long_after_warmup() {
        let mut series = make_series(&[100.0, 100.0, 100.0, 110.0, 121.0, 133.0]);
        RocMomentum::new(2, 0.05, -0.05, Column::Close, "signal_momentum").apply(&mut series);
        assert_eq!(signal_values(&series, "signal_momentum"), [0, 0, 0, 1, 1, 1]);
    }

    #[test]
    fn selloff_goes_short() {
        let mut series = make_series(&[100.0, 90.0, 80.0, 70.0]);
        RocMomentum::new(1, 0.05, -0.05, Column::Close, "signal_momentum").apply(&mut series);
        assert_eq!(signal_values(&series, "signal_momentum"), [0, -1, -1, -1]);
        assert_eq!(series[3].position, Position::Short);
    }

    #[test]
    fn zero_past_price_is_flat() {
        let rule = RocMomentum::new(1, 0.05, -0.05, Column::Close, "m");
        assert_eq!(
            rule.positions(&[0.0, 5.0, f64::NAN, 10.0]),
            [Position::Flat, Position::Flat, Position::Flat, Position::Flat]
        );
    }

    #[test]
    fn reads_requested_column() {
        // Low is close - 1, so 1 -> 2 is +100% on close but from 0 on low.
        let mut series = make_series(&[1.0, 2.0]);
        RocMomentum::new(1, 0.5, -0.5, Column::Low, "m").apply(&mut series);
        assert_eq!(signal_values(&series, "m"), [0, 0]);
        RocMomentum::new(1, 0.5, -0.5, Column::Close, "m").apply(&mut series);
        assert_eq!(signal_values(&series, "m"), [0, 1]);
    }

    #[test]
    fn short_series_is_noop() {
        let mut series = make_series(&[1.0, 2.0, 3.0]);
        RocMomentum::new(3, 0.05, -0.05, Column::Close, "m").apply(&mut series);
        RocMomentum::new(0, 0.05, -0.05, Column::Close, "m").apply(&mut series);
        assert!(!series.contains(&FieldKey::signal("m")));
    }
}
