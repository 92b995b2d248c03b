//! Moving average crossover with hysteresis.
//!
//! A golden cross (fast rises above slow) goes long, a death cross (fast
//! falls below slow) goes short, and between crosses the last stance is held.
//!
//! When the previous bar has no usable pair (first bar, warm-up, or a NaN
//! gap) the held stance resets to flat and the previous pair counts as a tie.
//! A trend already in place when both averages first exist therefore
//! registers as a cross on the first comparable bar, rather than emitting
//! flat there (see open question decision 2 in DESIGN.md).

use tracing::debug;

use super::{SignalFamily, SignalRule};
use crate::domain::{Column, FieldKey, Position, Series};
use crate::indicators::{resolve, Sma};

/// Direction of a crossing between two consecutive bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossEvent {
    Golden,
    Death,
}

/// Fast/slow pair on one bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AveragePair {
    pub fast: f64,
    pub slow: f64,
}

impl AveragePair {
    /// A pair is usable when neither average is NaN.
    pub fn usable(fast: f64, slow: f64) -> Option<Self> {
        (!fast.is_nan() && !slow.is_nan()).then_some(Self { fast, slow })
    }
}

/// Classify the move from `prev` to `cur`; a missing `prev` counts as a tie.
pub fn classify(prev: Option<AveragePair>, cur: AveragePair) -> Option<CrossEvent> {
    let (prev_at_or_below, prev_at_or_above) = match prev {
        Some(p) => (p.fast <= p.slow, p.fast >= p.slow),
        None => (true, true),
    };
    if prev_at_or_below && cur.fast > cur.slow {
        Some(CrossEvent::Golden)
    } else if prev_at_or_above && cur.fast < cur.slow {
        Some(CrossEvent::Death)
    } else {
        None
    }
}

/// Held stance after an optional cross.
pub fn transition(held: Position, event: Option<CrossEvent>) -> Position {
    match event {
        Some(CrossEvent::Golden) => Position::Long,
        Some(CrossEvent::Death) => Position::Short,
        None => held,
    }
}

/// SMA crossover rule, over close prices unless told otherwise.
///
/// # Indicator dependencies
/// `SMA_<fast>` and `SMA_<slow>` on the rule's column, computed if missing.
#[derive(Debug, Clone)]
pub struct MaCrossover {
    pub fast: usize,
    pub slow: usize,
    pub column: Column,
    output: FieldKey,
}

impl MaCrossover {
    pub fn new(fast: usize, slow: usize, output: &str) -> Self {
        Self {
            fast,
            slow,
            column: Column::Close,
            output: FieldKey::signal(output),
        }
    }

    /// Compare averages of `column` instead of close.
    pub fn with_column(mut self, column: Column) -> Self {
        self.column = column;
        self
    }

    fn positions(fast: &[f64], slow: &[f64]) -> Vec<Position> {
        let mut held = Position::Flat;
        let mut prev: Option<AveragePair> = None;
        let mut out = Vec::with_capacity(fast.len());

        for (&f, &s) in fast.iter().zip(slow) {
            let Some(cur) = AveragePair::usable(f, s) else {
                // Masked bar; the next usable bar starts from flat.
                out.push(Position::Flat);
                prev = None;
                continue;
            };
            if prev.is_none() {
                held = Position::Flat;
            }
            held = transition(held, classify(prev, cur));
            out.push(held);
            prev = Some(cur);
        }
        out
    }
}

impl SignalRule for MaCrossover {
    fn name(&self) -> &str {
        "ma_crossover"
    }

    fn family(&self) -> SignalFamily {
        SignalFamily::Trend
    }

    fn output(&self) -> &FieldKey {
        &self.output
    }

    fn apply(&self, series: &mut Series) {
        if series.is_empty() || self.fast >= self.slow {
            debug!(fast = self.fast, slow = self.slow, len = series.len(), "skipping crossover");
            return;
        }
        let fast_sma = Sma::new(self.fast, self.column);
        let slow_sma = Sma::new(self.slow, self.column);
        resolve(series, &fast_sma, &fast_sma.key());
        resolve(series, &slow_sma, &slow_sma.key());

        let positions = match (series.field(&fast_sma.key()), series.field(&slow_sma.key())) {
            (Some(fast), Some(slow)) => Self::positions(fast, slow),
            _ => vec![Position::Flat; series.len()],
        };
        series.record_positions(self.output.clone(), &positions);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{add_sma, make_series};
    use crate::signals::signal_values;

    const NAN: f64 = f64::NAN;

    fn pair(fast: f64, slow: f64) -> AveragePair {
        AveragePair { fast, slow }
    }

    #[test]
    fn classify_table() {
        let cases = [
            (Some(pair(1.0, 2.0)), pair(3.0, 2.0), Some(CrossEvent::Golden)),
            (Some(pair(2.0, 2.0)), pair(3.0, 2.0), Some(CrossEvent::Golden)),
            (Some(pair(3.0, 2.0)), pair(1.0, 2.0), Some(CrossEvent::Death)),
            (Some(pair(2.0, 2.0)), pair(1.0, 2.0), Some(CrossEvent::Death)),
            (Some(pair(3.0, 2.0)), pair(4.0, 2.0), None),
            (Some(pair(1.0, 2.0)), pair(0.5, 2.0), None),
            (Some(pair(1.0, 2.0)), pair(2.0, 2.0), None),
            (None, pair(3.0, 2.0), Some(CrossEvent::Golden)),
            (None, pair(1.0, 2.0), Some(CrossEvent::Death)),
            (None, pair(2.0, 2.0), None),
        ];
        for (prev, cur, expected) in cases {
            assert_eq!(classify(prev, cur), expected, "prev={prev:?} cur={cur:?}");
        }
    }

    #[test]
    fn transition_table() {
        for held in [Position::Short, Position::Flat, Position::Long] {
            assert_eq!(transition(held, Some(CrossEvent::Golden)), Position::Long);
            assert_eq!(transition(held, Some(CrossEvent::Death)), Position::Short);
            assert_eq!(transition(held, None), held);
        }
    }

    #[test]
    fn holds_until_opposite_cross() {
        let fast = [NAN, 1.0, 3.0, 4.0, 5.0, 1.0, 0.5];
        let slow = [NAN, 2.0, 2.0, 2.0, 2.0, 2.0, 2.0];
        let positions = MaCrossover::positions(&fast, &slow);
        assert_eq!(
            positions,
            [
                Position::Flat,
                Position::Short, // first comparable bar already below
                Position::Long,
                Position::Long,
                Position::Long,
                Position::Short,
                Position::Short,
            ]
        );
    }

    #[test]
    fn nan_gap_masks_and_resets() {
        let fast = [3.0, 4.0, NAN, 4.0, 4.5];
        let slow = [2.0, 2.0, 2.0, 2.0, 2.0];
        let positions = MaCrossover::positions(&fast, &slow);
        assert_eq!(
            positions,
            [
                Position::Long,
                Position::Long,
                Position::Flat,
                Position::Long,
                Position::Long,
            ]
        );
    }

    #[test]
    fn uptrend_fires_golden_cross() {
        let mut series =
            make_series(&[10.0, 11.0, 12.0, 13.0, 14.0, 20.0, 25.0, 30.0, 35.0, 40.0]);
        add_sma(&mut series, 2, Column::Close);
        add_sma(&mut series, 5, Column::Close);
        MaCrossover::new(2, 5, "signal_sma").apply(&mut series);

        let signal = signal_values(&series, "signal_sma");
        assert!(signal[..4].iter().all(|&s| s == 0));
        assert!(signal[4..].contains(&1));
        assert!(signal[4..].iter().all(|&s| s == 1));
    }

    #[test]
    fn downtrend_fires_death_cross() {
        let mut series = make_series(&[40.0, 35.0, 30.0, 25.0, 20.0, 15.0, 10.0, 8.0, 6.0, 5.0]);
        MaCrossover::new(2, 5, "signal_sma").apply(&mut series);
        assert!(signal_values(&series, "signal_sma")[4..].contains(&-1));
        assert_eq!(series[9].position, Position::Short);
    }

    #[test]
    fn flat_prices_stay_flat() {
        let mut series = make_series(&[10.0; 6]);
        MaCrossover::new(2, 3, "signal_sma").apply(&mut series);
        assert!(signal_values(&series, "signal_sma").iter().all(|&s| s == 0));
    }

    #[test]
    fn computes_missing_averages() {
        let mut series = make_series(&[1.0, 2.0, 3.0]);
        MaCrossover::new(1, 2, "x").apply(&mut series);
        assert!(series.contains(&FieldKey::sma(1)));
        assert!(series.contains(&FieldKey::sma(2)));
    }

    #[test]
    fn averages_on_other_column_are_kept() {
        let mut series = make_series(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        add_sma(&mut series, 3, Column::High);
        let before = series.field(&FieldKey::sma(3)).unwrap().to_vec();

        MaCrossover::new(2, 3, "signal_sma")
            .with_column(Column::High)
            .apply(&mut series);

        assert_eq!(series.field_source(&FieldKey::sma(3)), Some(Column::High));
        let after = series.field(&FieldKey::sma(3)).unwrap();
        assert_eq!(before.len(), after.len());
        for (a, b) in before.iter().zip(after) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
        assert_eq!(series.field_source(&FieldKey::sma(2)), Some(Column::High));
    }

    #[test]
    fn fast_not_below_slow_is_noop() {
        let mut series = make_series(&[1.0, 2.0, 3.0]);
        MaCrossover::new(5, 5, "signal_sma").apply(&mut series);
        MaCrossover::new(6, 5, "signal_sma").apply(&mut series);
        assert_eq!(series.field_keys().count(), 0);
    }
}
