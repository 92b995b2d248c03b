//! quantbar CLI: compute indicators and signals over an OHLCV CSV file.
//!
//! Either point `--config` at a TOML run file, or describe the run with
//! flags. Flags given alongside `--config` override or extend the file.
//!
//! ```text
//! quantbar --input data.csv --output out.csv --sma 20 --sma 50
//! quantbar --input data.csv --output out.csv --zwindow 20 --signal-z
//! quantbar --input data.csv --output out.csv --fast-sma 10 --slow-sma 50 --signal-sma
//! ```

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use quantbar_core::indicators::TRADING_DAYS_PER_YEAR;
use quantbar_core::signals::{
    DEFAULT_BREAKOUT_OUTPUT, DEFAULT_CROSSOVER_OUTPUT, DEFAULT_MOMENTUM_OUTPUT,
    DEFAULT_REVERSION_OUTPUT,
};
use quantbar_core::Column;
use quantbar_runner::{run_file, IndicatorConfig, RunConfig, SignalConfig};

#[derive(Parser, Debug)]
#[command(
    name = "quantbar",
    version,
    about = "quantbar: rolling indicators and trading signals over OHLCV bars"
)]
struct Cli {
    /// Input CSV file.
    #[arg(long)]
    input: Option<PathBuf>,

    /// Output CSV file.
    #[arg(long)]
    output: Option<PathBuf>,

    /// TOML run configuration.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Keep incomplete rows as NaN bars (default: drop them).
    #[arg(long, default_value_t = false)]
    keep_na: bool,

    /// Also write a binary export to `<output>.bin`.
    #[arg(long, default_value_t = false)]
    binary: bool,

    /// Input field separator.
    #[arg(long)]
    delimiter: Option<char>,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(long, short, default_value_t = false)]
    verbose: bool,

    /// Source column for indicators and every signal rule.
    #[arg(long, default_value = "close")]
    column: Column,

    /// Add an SMA with window N (repeatable).
    #[arg(long = "sma", value_name = "N")]
    sma: Vec<usize>,

    /// Add an EMA with window N (repeatable).
    #[arg(long = "ema", value_name = "N")]
    ema: Vec<usize>,

    /// Compute rolling mean/std and z-score with window N.
    #[arg(long, value_name = "N")]
    zwindow: Option<usize>,

    /// Z-score entry threshold.
    #[arg(long, default_value_t = 2.0)]
    zentry: f64,

    /// Z-score exit threshold.
    #[arg(long, default_value_t = 0.5)]
    zexit: f64,

    /// Generate the z-score mean reversion signal (needs --zwindow).
    #[arg(long, default_value_t = false)]
    signal_z: bool,

    /// Fast SMA window for the crossover.
    #[arg(long, value_name = "N")]
    fast_sma: Option<usize>,

    /// Slow SMA window for the crossover.
    #[arg(long, value_name = "N")]
    slow_sma: Option<usize>,

    /// Generate the SMA crossover signal (needs --fast-sma and --slow-sma).
    #[arg(long, default_value_t = false)]
    signal_sma: bool,

    /// Add annualized volatility with window N.
    #[arg(long, value_name = "N")]
    vol_window: Option<usize>,

    /// Periods per year used to annualize volatility.
    #[arg(long, default_value_t = TRADING_DAYS_PER_YEAR)]
    periods_per_year: f64,

    /// Generate the band breakout signal with window N.
    #[arg(long, value_name = "N")]
    band_window: Option<usize>,

    /// Band width in standard deviations.
    #[arg(long, default_value_t = 2.0)]
    band_std: f64,

    /// Generate the momentum signal with lookback N.
    #[arg(long, value_name = "N")]
    momentum_window: Option<usize>,

    /// Rate of change above which momentum goes long.
    #[arg(long, default_value_t = 0.05, allow_negative_numbers = true)]
    momentum_upper: f64,

    /// Rate of change below which momentum goes short.
    #[arg(long, default_value_t = -0.05, allow_negative_numbers = true)]
    momentum_lower: f64,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = build_config(&cli)?;
    info!(
        run_id = %config.run_id(),
        input = %config.input.display(),
        output = %config.output.display(),
        "starting run"
    );

    let (report, summary) = run_file(&config)?;

    println!(
        "Loaded {} records ({} dropped)",
        report.rows_kept(),
        report.rows_dropped
    );
    for rule in &summary.rules {
        println!(
            "{:<16} long={:<6} short={:<6} flat={}",
            rule.output, rule.counts.long, rule.counts.short, rule.counts.flat
        );
    }
    println!("Wrote {} bars to {}", summary.bars, config.output.display());
    if config.binary {
        println!("Wrote binary output to {}", config.binary_path().display());
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Merge the config file (if any) with the flags.
fn build_config(cli: &Cli) -> Result<RunConfig> {
    let mut config = match &cli.config {
        Some(path) => RunConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => {
            let (Some(input), Some(output)) = (&cli.input, &cli.output) else {
                bail!("--input and --output are required without --config");
            };
            RunConfig::new(input, output)
        }
    };

    if let Some(input) = &cli.input {
        config.input = input.clone();
    }
    if let Some(output) = &cli.output {
        config.output = output.clone();
    }
    if let Some(delimiter) = cli.delimiter {
        config.delimiter = delimiter;
    }
    config.keep_na |= cli.keep_na;
    config.binary |= cli.binary;

    let column = cli.column;
    config
        .indicators
        .extend(cli.sma.iter().map(|&window| IndicatorConfig::Sma { window, column }));
    config
        .indicators
        .extend(cli.ema.iter().map(|&window| IndicatorConfig::Ema { window, column }));
    if let Some(window) = cli.zwindow.filter(|&w| w > 0) {
        config.indicators.push(IndicatorConfig::RollMeanStd { window, column });
        config.indicators.push(IndicatorConfig::ZScore { window, column });
    }
    if let Some(window) = cli.vol_window {
        config.indicators.push(IndicatorConfig::Volatility {
            window,
            column,
            periods_per_year: cli.periods_per_year,
        });
    }

    let mut trend = Vec::new();
    if cli.signal_sma {
        match (cli.fast_sma, cli.slow_sma) {
            (Some(fast), Some(slow)) if fast > 0 && slow > 0 => {
                trend.push(SignalConfig::MaCrossover {
                    fast,
                    slow,
                    column,
                    output: DEFAULT_CROSSOVER_OUTPUT.to_string(),
                });
            }
            _ => bail!("--signal-sma needs positive --fast-sma and --slow-sma"),
        }
    }
    if let Some(window) = cli.momentum_window {
        trend.push(SignalConfig::Momentum {
            window,
            upper: cli.momentum_upper,
            lower: cli.momentum_lower,
            column,
            output: DEFAULT_MOMENTUM_OUTPUT.to_string(),
        });
    }
    if let Some(window) = cli.band_window {
        trend.push(SignalConfig::BandBreakout {
            window,
            num_std: cli.band_std,
            column,
            output: DEFAULT_BREAKOUT_OUTPUT.to_string(),
        });
    }
    match trend.len() {
        0 => {}
        1 => config.trend = trend.pop(),
        _ => bail!("only one trend rule per run: pick one of --signal-sma, --momentum-window, --band-window"),
    }

    if cli.signal_z {
        let Some(window) = cli.zwindow.filter(|&w| w > 0) else {
            bail!("--signal-z needs a positive --zwindow");
        };
        config.mean_reversion = Some(SignalConfig::ZscoreReversion {
            window,
            entry: cli.zentry,
            exit: cli.zexit,
            column,
            output: DEFAULT_REVERSION_OUTPUT.to_string(),
        });
    }

    config.validate()?;
    Ok(config)
}
