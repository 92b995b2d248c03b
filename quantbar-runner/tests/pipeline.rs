//! End-to-end pipeline tests: CSV file in, CSV file out.

use std::fs;
use std::path::Path;

use quantbar_runner::{
    load_csv, run_file, IndicatorConfig, LoadOptions, PipelineError, RunConfig, SignalConfig,
};
use quantbar_core::Column;

// ── Helpers ──────────────────────────────────────────────────────────

const HEADER: &str = "Date,Open,High,Low,Close,Adj Close,Volume";

fn write_prices(path: &Path, closes: &[f64]) {
    let mut text = String::from(HEADER);
    text.push('\n');
    for (i, c) in closes.iter().enumerate() {
        text.push_str(&format!(
            "2024-01-{:02},{c},{},{},{c},{c},{}\n",
            i + 1,
            c + 1.0,
            c - 1.0,
            1000 + i
        ));
    }
    fs::write(path, text).unwrap();
}

fn read_rows(path: &Path) -> Vec<Vec<String>> {
    let mut reader = csv::Reader::from_path(path).unwrap();
    let header = reader.headers().unwrap().iter().map(String::from).collect();
    let mut rows = vec![header];
    for record in reader.records() {
        rows.push(record.unwrap().iter().map(String::from).collect());
    }
    rows
}

fn column<'a>(rows: &'a [Vec<String>], name: &str) -> Vec<&'a str> {
    let idx = rows[0].iter().position(|h| h == name).expect("column present");
    rows[1..].iter().map(|r| r[idx].as_str()).collect()
}

// ── Tests ────────────────────────────────────────────────────────────

#[test]
fn crossover_run_writes_expected_csv() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.csv");
    let output = dir.path().join("out.csv");
    write_prices(&input, &[10.0, 11.0, 12.0, 13.0, 14.0, 20.0, 25.0, 30.0, 35.0, 40.0]);

    let config = RunConfig {
        indicators: vec![IndicatorConfig::Sma {
            window: 3,
            column: Column::Close,
        }],
        trend: Some(SignalConfig::MaCrossover {
            fast: 2,
            slow: 5,
            column: Column::Close,
            output: "signal_sma".into(),
        }),
        ..RunConfig::new(&input, &output)
    };
    let (report, summary) = run_file(&config).unwrap();
    assert_eq!(report.rows_read, 10);
    assert_eq!(summary.bars, 10);

    let rows = read_rows(&output);
    assert_eq!(
        rows[0],
        [
            "Date", "Open", "High", "Low", "Close", "Adj Close", "Volume", "Signal", "SMA_2",
            "SMA_3", "SMA_5", "signal_sma"
        ]
    );
    assert_eq!(rows.len(), 11);
    assert_eq!(column(&rows, "SMA_3")[..3], ["NaN", "NaN", "11"]);
    assert_eq!(column(&rows, "Signal")[4..], ["1"; 6]);
    assert_eq!(column(&rows, "signal_sma")[..4], ["0"; 4]);
}

#[test]
fn config_file_drives_run() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("prices.csv");
    let output = dir.path().join("signals.csv");
    let config_path = dir.path().join("run.toml");
    let mut closes = vec![100.0, 100.5, 99.5, 100.0, 100.5, 99.5, 100.0, 100.5, 99.5, 100.0];
    closes.push(90.0);
    write_prices(&input, &closes);

    fs::write(
        &config_path,
        format!(
            r#"
input = {input:?}
output = {output:?}

[[indicators]]
type = "ZSCORE"
window = 10

[mean_reversion]
type = "ZSCORE_REVERSION"
window = 10
"#,
            input = input.display().to_string(),
            output = output.display().to_string(),
        ),
    )
    .unwrap();

    let config = RunConfig::load(&config_path).unwrap();
    let (_, summary) = run_file(&config).unwrap();
    assert_eq!(summary.rules[0].counts.long, 1);

    let rows = read_rows(&output);
    assert_eq!(column(&rows, "signal_z")[10], "1");
    assert!(rows[0].iter().any(|h| h == "ROLL_STD_10"));
}

#[test]
fn keep_na_controls_incomplete_rows() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("gaps.csv");
    fs::write(
        &input,
        format!("{HEADER}\n2024-01-02,1,2,0,1,1,10\n2024-01-03,,2,0,1,1,10\n2024-01-04,1,2,0,1,1,10\n"),
    )
    .unwrap();

    let (dropped, report) = load_csv(&input, &LoadOptions::default()).unwrap();
    assert_eq!(dropped.len(), 2);
    assert_eq!(report.rows_dropped, 1);

    let opts = LoadOptions {
        keep_na: true,
        ..LoadOptions::default()
    };
    let (kept, _) = load_csv(&input, &opts).unwrap();
    assert_eq!(kept.len(), 3);
    assert!(kept[1].open.is_nan());

    let output = dir.path().join("out.csv");
    let config = RunConfig {
        keep_na: true,
        ..RunConfig::new(&input, &output)
    };
    run_file(&config).unwrap();
    assert_eq!(column(&read_rows(&output), "Open"), ["1", "NaN", "1"]);
}

#[test]
fn empty_input_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("empty.csv");
    fs::write(&input, format!("{HEADER}\n")).unwrap();
    let output = dir.path().join("out.csv");

    let err = run_file(&RunConfig::new(&input, &output)).unwrap_err();
    assert!(matches!(err, PipelineError::NoData(_)));
    assert!(err.to_string().contains("no data loaded"));
    assert!(!output.exists());
}

#[test]
fn missing_input_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = run_file(&RunConfig::new(
        dir.path().join("missing.csv"),
        dir.path().join("out.csv"),
    ))
    .unwrap_err();
    assert!(matches!(err, PipelineError::Data(_)));
}
