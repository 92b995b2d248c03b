//! Property tests for the runner's input surfaces.
//!
//! Uses proptest to verify:
//! 1. Config: any valid run config survives TOML serialization unchanged
//! 2. CSV ingestion: arbitrary row text never panics and the row counts add up
//! 3. Binary export: prices and positions read back bit for bit

use proptest::prelude::*;
use quantbar_core::{Bar, Column, Position, Series};
use quantbar_runner::{
    read_binary, read_series, write_binary, IndicatorConfig, LoadOptions, RunConfig, SignalConfig,
};

// ── Strategies ───────────────────────────────────────────────────────

fn arb_column() -> impl Strategy<Value = Column> {
    prop::sample::select(Column::ALL.to_vec())
}

fn arb_threshold() -> impl Strategy<Value = f64> {
    (1i32..500).prop_map(|n| f64::from(n) / 100.0)
}

fn arb_indicator() -> impl Strategy<Value = IndicatorConfig> {
    (0usize..6, 1usize..60, arb_column()).prop_map(|(kind, window, column)| match kind {
        0 => IndicatorConfig::Sma { window, column },
        1 => IndicatorConfig::RollMeanStd { window, column },
        2 => IndicatorConfig::ZScore { window, column },
        3 => IndicatorConfig::Ema { window, column },
        4 => IndicatorConfig::RollSum { window, column },
        _ => IndicatorConfig::Volatility {
            window,
            column,
            periods_per_year: 252.0,
        },
    })
}

fn arb_trend() -> impl Strategy<Value = SignalConfig> {
    (0usize..3, 1usize..30, arb_threshold(), arb_column()).prop_map(
        |(kind, window, threshold, column)| match kind {
            0 => SignalConfig::MaCrossover {
                fast: window,
                slow: window * 2,
                column,
                output: "signal_sma".into(),
            },
            1 => SignalConfig::Momentum {
                window,
                upper: threshold,
                lower: -threshold,
                column,
                output: "signal_momentum".into(),
            },
            _ => SignalConfig::BandBreakout {
                window,
                num_std: threshold,
                column,
                output: "signal_bb".into(),
            },
        },
    )
}

fn arb_config() -> impl Strategy<Value = RunConfig> {
    (
        prop::collection::vec(arb_indicator(), 0..6),
        prop::option::of(arb_trend()),
        prop::option::of((1usize..40, arb_threshold(), arb_column())),
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(|(indicators, trend, reversion, keep_na, binary)| RunConfig {
            keep_na,
            binary,
            indicators,
            trend,
            mean_reversion: reversion.map(|(window, exit, column)| SignalConfig::ZscoreReversion {
                window,
                entry: exit + 1.0,
                exit,
                column,
                output: "signal_z".into(),
            }),
            ..RunConfig::new("data/in.csv", "out/signals.csv")
        })
}

fn arb_cell() -> impl Strategy<Value = String> {
    prop_oneof![
        (-1_000.0..1_000.0_f64).prop_map(|v| v.to_string()),
        Just(String::new()),
        Just("NaN".to_string()),
        "[a-z ]{0,6}",
    ]
}

fn arb_row() -> impl Strategy<Value = String> {
    prop::collection::vec(arb_cell(), 0..10).prop_map(|cells| cells.join(","))
}

// ── 1. Config round trip ─────────────────────────────────────────────

proptest! {
    #[test]
    fn config_survives_toml(config in arb_config()) {
        prop_assert!(config.validate().is_ok());
        let text = toml::to_string(&config).unwrap();
        let parsed = RunConfig::from_toml(&text).unwrap();
        prop_assert_eq!(parsed.run_id(), config.run_id());
        prop_assert_eq!(parsed, config);
    }
}

// ── 2. CSV ingestion ─────────────────────────────────────────────────

proptest! {
    #[test]
    fn arbitrary_rows_never_panic(rows in prop::collection::vec(arb_row(), 0..30)) {
        let text = format!("Date,Open,High,Low,Close,Adj Close,Volume\n{}\n", rows.join("\n"));

        let strict = LoadOptions::default();
        if let Ok((series, report)) = read_series(text.as_bytes(), &strict) {
            prop_assert_eq!(report.rows_kept(), series.len());
            prop_assert!(series.bars().iter().all(|bar| !bar.is_void()));
        }

        let keep = LoadOptions { keep_na: true, ..LoadOptions::default() };
        if let Ok((series, report)) = read_series(text.as_bytes(), &keep) {
            prop_assert_eq!(report.rows_dropped, 0);
            prop_assert_eq!(series.len(), report.rows_read);
        }
    }
}

// ── 3. Binary export ─────────────────────────────────────────────────

proptest! {
    #[test]
    fn binary_round_trip_preserves_bars(
        rows in prop::collection::vec((any::<f64>(), -1i8..=1), 0..50),
    ) {
        let series: Series = rows
            .iter()
            .map(|&(price, signal)| {
                let mut bar = Bar::new("", price, price, price, price, price, price.abs());
                bar.position = Position::try_from(signal).unwrap();
                bar
            })
            .collect();

        let mut buf = Vec::new();
        write_binary(&mut buf, &series).unwrap();
        let back = read_binary(buf.as_slice()).unwrap();

        prop_assert_eq!(back.len(), series.len());
        for (a, b) in series.bars().iter().zip(back.bars()) {
            prop_assert_eq!(a.close.to_bits(), b.close.to_bits());
            prop_assert_eq!(a.volume.to_bits(), b.volume.to_bits());
            prop_assert_eq!(a.position, b.position);
        }
    }
}
