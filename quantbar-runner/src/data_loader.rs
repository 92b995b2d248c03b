//! CSV ingestion.
//!
//! Rows are positional: Date, Open, High, Low, Close, Adj Close, Volume.
//! The first line is a header and is skipped, blank lines are skipped, and
//! columns past the seventh are ignored. A numeric field that is empty or
//! does not parse becomes NaN.
//!
//! A row is incomplete when it has fewer than seven columns or any NaN field.
//! Incomplete rows are dropped unless [`LoadOptions::keep_na`] is set, in
//! which case they are kept with NaN in place of the missing values.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use quantbar_core::{Bar, Series};

/// Number of positional columns a complete row carries.
const COLUMNS: usize = 7;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// Options controlling how rows are read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    /// Field separator.
    pub delimiter: u8,
    /// Keep incomplete rows instead of dropping them.
    pub keep_na: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            keep_na: false,
        }
    }
}

/// Row counts from one load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Non-blank data rows seen (header excluded).
    pub rows_read: usize,
    /// Incomplete rows that were discarded.
    pub rows_dropped: usize,
}

impl LoadReport {
    pub fn rows_kept(&self) -> usize {
        self.rows_read - self.rows_dropped
    }
}

/// Load a series from a CSV file.
pub fn load_csv(path: &Path, opts: &LoadOptions) -> Result<(Series, LoadReport), LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let (series, report) = read_series(file, opts)?;
    info!(
        path = %path.display(),
        rows_read = report.rows_read,
        rows_dropped = report.rows_dropped,
        bars = series.len(),
        "loaded series"
    );
    Ok((series, report))
}

/// Read a series from any CSV source.
pub fn read_series<R: Read>(reader: R, opts: &LoadOptions) -> Result<(Series, LoadReport), LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(opts.delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut series = Series::new();
    let mut report = LoadReport::default();

    for record in reader.records() {
        let record = record?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        report.rows_read += 1;

        let bar = parse_row(&record);
        if bar.is_void() && !opts.keep_na {
            report.rows_dropped += 1;
            debug!(
                line = record.position().map(|p| p.line()),
                "dropping incomplete row"
            );
            continue;
        }
        series.push(bar);
    }

    Ok((series, report))
}

fn parse_row(record: &csv::StringRecord) -> Bar {
    let date = record.get(0).unwrap_or_default();
    if record.len() < COLUMNS {
        return Bar::void(date);
    }
    let number = |i: usize| record.get(i).map_or(f64::NAN, parse_number);
    Bar::new(date, number(1), number(2), number(3), number(4), number(5), number(6))
}

fn parse_number(field: &str) -> f64 {
    field.parse().unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Date,Open,High,Low,Close,Adj Close,Volume\n";

    fn read(body: &str, keep_na: bool) -> (Series, LoadReport) {
        let text = format!("{HEADER}{body}");
        let opts = LoadOptions {
            keep_na,
            ..LoadOptions::default()
        };
        read_series(text.as_bytes(), &opts).unwrap()
    }

    #[test]
    fn reads_positional_columns() {
        let (series, report) = read("2024-01-02,1,2,0.5,1.5,1.4,1000\n", false);
        assert_eq!(report, LoadReport { rows_read: 1, rows_dropped: 0 });
        let bar = &series[0];
        assert_eq!(bar.date, "2024-01-02");
        assert_eq!(
            (bar.open, bar.high, bar.low, bar.close, bar.adj_close, bar.volume),
            (1.0, 2.0, 0.5, 1.5, 1.4, 1000.0)
        );
    }

    #[test]
    fn trims_fields_and_ignores_extra_columns() {
        let (series, _) = read(" 2024-01-02 , 1 ,2,0.5, 1.5 ,1.4,1000,extra,more\n", false);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].date, "2024-01-02");
        assert_eq!(series[0].close, 1.5);
    }

    #[test]
    fn skips_blank_lines() {
        let (series, report) = read("\n2024-01-02,1,1,1,1,1,1\n\n   \n2024-01-03,2,2,2,2,2,2\n", false);
        assert_eq!(series.len(), 2);
        assert_eq!(report.rows_read, 2);
    }

    #[test]
    fn drops_incomplete_rows_by_default() {
        let body = "2024-01-02,1,1,1,1,1,1\n\
                    2024-01-03,1,1,,1,1,1\n\
                    2024-01-04,1,1,1\n\
                    2024-01-05,1,1,1,abc,1,1\n\
                    2024-01-08,2,2,2,2,2,2\n";
        let (series, report) = read(body, false);
        assert_eq!(series.len(), 2);
        assert_eq!(report, LoadReport { rows_read: 5, rows_dropped: 3 });
        assert_eq!(report.rows_kept(), 2);
        assert_eq!(series[1].date, "2024-01-08");
    }

    #[test]
    fn keep_na_retains_rows_with_nan() {
        let body = "2024-01-02,1,1,1,1,1,1\n\
                    2024-01-03,1,2,,4,5,6\n\
                    2024-01-04,1,1,1\n";
        let (series, report) = read(body, true);
        assert_eq!(report.rows_dropped, 0);
        assert_eq!(series.len(), 3);

        // Wide enough: parsed fields survive.
        assert_eq!(series[1].high, 2.0);
        assert!(series[1].low.is_nan());
        // Too short: every field is NaN, date kept.
        assert_eq!(series[2].date, "2024-01-04");
        assert!(series[2].open.is_nan());
        assert!(series[2].volume.is_nan());
    }

    #[test]
    fn custom_delimiter() {
        let text = "Date;Open;High;Low;Close;Adj Close;Volume\n2024-01-02;1;2;3;4;5;6\n";
        let opts = LoadOptions {
            delimiter: b';',
            keep_na: false,
        };
        let (series, _) = read_series(text.as_bytes(), &opts).unwrap();
        assert_eq!(series[0].volume, 6.0);
    }

    #[test]
    fn header_only_is_empty() {
        let (series, report) = read("", false);
        assert!(series.is_empty());
        assert_eq!(report, LoadReport::default());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_csv(Path::new("/nonexistent/quantbar/input.csv"), &LoadOptions::default())
            .unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}
