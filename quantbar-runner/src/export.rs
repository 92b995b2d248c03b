//! CSV export of a processed series.
//!
//! The full export writes the seven source columns, the position tag as
//! `Signal`, then every derived field sorted by name. NaN is written as
//! `NaN` so a blank cell never stands in for a missing value.
//!
//! The binary export is a compact companion to the CSV: a little-endian
//! `u64` row count and `u64` column count, then per bar the six numeric
//! source columns and the position tag as `f64`. Dates and derived fields
//! are not carried.

use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::info;

use quantbar_core::{Bar, FieldKey, Position, Series};

/// Values stored per bar in the binary export.
pub const BINARY_COLUMNS: u64 = 7;

/// Leading columns of every full export.
pub const BASE_HEADER: [&str; 8] = [
    "Date", "Open", "High", "Low", "Close", "Adj Close", "Volume", "Signal",
];

fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else {
        value.to_string()
    }
}

/// Derived fields in header order.
fn sorted_fields(series: &Series) -> Vec<(String, &FieldKey)> {
    let mut fields: Vec<(String, &FieldKey)> =
        series.field_keys().map(|k| (k.to_string(), k)).collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));
    fields
}

/// Render one base column for a bar; `None` for names that are not base columns.
fn base_value(bar: &Bar, name: &str) -> Option<String> {
    let value = match name {
        "Date" => return Some(bar.date.clone()),
        "Signal" => return Some(bar.position.as_i8().to_string()),
        "Open" => bar.open,
        "High" => bar.high,
        "Low" => bar.low,
        "Close" => bar.close,
        "Adj Close" => bar.adj_close,
        "Volume" => bar.volume,
        _ => return None,
    };
    Some(format_value(value))
}

/// Write the full export to any writer.
pub fn write_csv<W: Write>(writer: W, series: &Series) -> Result<()> {
    let fields = sorted_fields(series);
    let mut wtr = csv::Writer::from_writer(writer);

    let header = BASE_HEADER
        .iter()
        .copied()
        .chain(fields.iter().map(|(name, _)| name.as_str()));
    wtr.write_record(header)?;

    let mut row: Vec<String> = Vec::with_capacity(BASE_HEADER.len() + fields.len());
    for view in series.iter() {
        row.clear();
        row.extend(BASE_HEADER.iter().filter_map(|name| base_value(view.bar(), name)));
        row.extend(
            fields
                .iter()
                .map(|(_, key)| format_value(view.indicator(key).unwrap_or(f64::NAN))),
        );
        wtr.write_record(&row)?;
    }

    wtr.flush().context("failed to flush CSV writer")?;
    Ok(())
}

/// Write the full export to a file.
pub fn export_csv(path: &Path, series: &Series) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create output file: {}", path.display()))?;
    write_csv(file, series).with_context(|| format!("failed to write {}", path.display()))?;
    info!(
        path = %path.display(),
        bars = series.len(),
        fields = series.field_keys().count(),
        "exported series"
    );
    Ok(())
}

/// Write only the named columns, in the given order.
///
/// Accepts the base header names and any rendered field name. Names that
/// match nothing are written as NaN on every row.
pub fn export_columns<W: Write>(writer: W, series: &Series, columns: &[&str]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(columns)?;

    let keys: Vec<FieldKey> = columns.iter().map(|&name| FieldKey::from(name)).collect();
    let mut row: Vec<String> = Vec::with_capacity(columns.len());
    for view in series.iter() {
        row.clear();
        for (name, key) in columns.iter().zip(&keys) {
            let cell = base_value(view.bar(), name)
                .unwrap_or_else(|| format_value(view.indicator(key).unwrap_or(f64::NAN)));
            row.push(cell);
        }
        wtr.write_record(&row)?;
    }

    wtr.flush().context("failed to flush CSV writer")?;
    Ok(())
}

/// Write the binary export to any writer.
pub fn write_binary<W: Write>(writer: W, series: &Series) -> Result<()> {
    let mut out = BufWriter::new(writer);
    out.write_all(&(series.len() as u64).to_le_bytes())?;
    out.write_all(&BINARY_COLUMNS.to_le_bytes())?;
    for bar in series.bars() {
        for value in [
            bar.open,
            bar.high,
            bar.low,
            bar.close,
            bar.adj_close,
            bar.volume,
            bar.position.as_f64(),
        ] {
            out.write_all(&value.to_le_bytes())?;
        }
    }
    out.flush().context("failed to flush binary writer")?;
    Ok(())
}

/// Write the binary export to a file.
pub fn export_binary(path: &Path, series: &Series) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create binary output file: {}", path.display()))?;
    write_binary(file, series).with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), bars = series.len(), "exported binary series");
    Ok(())
}

fn read_u64<R: Read>(reader: &mut R) -> Result<u64> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

fn read_f64<R: Read>(reader: &mut R) -> Result<f64> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    Ok(f64::from_le_bytes(buf))
}

/// Read a binary export back into a series. Bars come back with empty dates.
pub fn read_binary<R: Read>(reader: R) -> Result<Series> {
    let mut input = BufReader::new(reader);
    let rows = read_u64(&mut input).context("missing row count")?;
    let cols = read_u64(&mut input).context("missing column count")?;
    if cols != BINARY_COLUMNS {
        bail!("expected {BINARY_COLUMNS} columns per bar, found {cols}");
    }

    // The header is untrusted; cap the up-front allocation.
    let mut series = Series::with_capacity(rows.min(1 << 20) as usize);
    for row in 0..rows {
        let mut values = [0.0; BINARY_COLUMNS as usize];
        for value in &mut values {
            *value = read_f64(&mut input).with_context(|| format!("truncated at bar {row}"))?;
        }
        let [open, high, low, close, adj_close, volume, signal] = values;
        let Ok(position) = Position::try_from(signal as i8) else {
            bail!("bar {row} has invalid position {signal}");
        };
        let mut bar = Bar::new(String::new(), open, high, low, close, adj_close, volume);
        bar.position = position;
        series.push(bar);
    }
    Ok(series)
}
