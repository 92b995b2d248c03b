//! quantbar core: bar series, rolling indicators and signal state machines.
//!
//! This crate contains the computational heart of quantbar:
//! - Domain types (bars, source columns, field keys, positions, the series container)
//! - Indicator engine: single-pass windowed statistics attached to a series
//! - Signal engine: crossover, mean-reversion, momentum and band-breakout rules
//!
//! Everything here is synchronous and allocation-light. Callers own a
//! [`Series`](domain::Series) and pass it by `&mut` through successive
//! indicator and signal calls.

pub mod domain;
pub mod error;
pub mod indicators;
pub mod signals;

pub use domain::{Bar, Column, FieldKey, IndicatorKind, Position, Series};
pub use error::CoreError;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: core types can be moved across threads by callers
    /// that hold one series per worker.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::Bar>();
        require_sync::<domain::Bar>();
        require_send::<domain::Series>();
        require_sync::<domain::Series>();
        require_send::<domain::FieldKey>();
        require_sync::<domain::FieldKey>();
        require_send::<error::CoreError>();
        require_sync::<error::CoreError>();
    }

    #[test]
    fn boxed_rules_write_their_outputs() {
        let mut series = indicators::make_series(&[10.0, 11.0, 12.0, 13.0, 14.0, 20.0, 25.0]);
        let rules: Vec<Box<dyn signals::SignalRule>> = vec![
            Box::new(signals::MaCrossover::new(2, 4, "trend")),
            Box::new(signals::ZScoreReversion::new(3, 2.0, 0.5, "revert")),
        ];
        for rule in &rules {
            rule.apply(&mut series);
            let values = series.field(rule.output()).unwrap();
            assert_eq!(values.len(), series.len());
            assert!(values.iter().all(|v| [-1.0, 0.0, 1.0].contains(v)));
        }
        assert_eq!(series.field(&FieldKey::signal("trend")).unwrap()[6], 1.0);
    }
}
