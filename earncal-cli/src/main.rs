//! earncal CLI: resolve the next earnings date for every ticker in a CSV.
//!
//! Reads `--in` (a CSV with a `ticker` column), queries Yahoo Finance (or a
//! directory of saved responses with `--replay-dir`) one ticker at a time,
//! and writes the sorted report to `--out`.
//!
//! Exit codes: 0 on success, 2 when the input has no `ticker` column,
//! 1 on any other fatal error.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use earncal_core::data::UnavailableProvider;
use earncal_core::{
    load_tickers, resolve_all, write_report, EarningsProvider, LoadError, ProviderConfig,
    ProviderError, ReplayProvider, TracingProgress, YahooProvider,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "earncal",
    about = "Resolve next earnings dates for a list of tickers"
)]
struct Cli {
    /// Input CSV with a column named 'ticker'.
    #[arg(long = "in", default_value = "tickers.csv")]
    input: PathBuf,

    /// Output CSV path (overwritten).
    #[arg(long = "out", default_value = "earnings_dates.csv")]
    output: PathBuf,

    /// TOML file with provider settings.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Resolve from saved responses (<TICKER>.json) instead of the network.
    #[arg(long)]
    replay_dir: Option<PathBuf>,

    /// Number of earnings entries requested per ticker.
    #[arg(long)]
    limit: Option<usize>,

    /// Log progress to stderr (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // A second initialisation (e.g. from tests) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if let Some(LoadError::MissingColumn) = err.downcast_ref::<LoadError>() {
                eprintln!("{}", LoadError::MissingColumn);
                return ExitCode::from(2);
            }
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    // The input is checked first: a missing ticker column exits 2 whatever
    // else is wrong, and a bad input never produces output.
    let tickers = load_tickers(&cli.input)?;
    tracing::info!(count = tickers.len(), input = %cli.input.display(), "loaded tickers");

    let mut config = match &cli.config {
        Some(path) => ProviderConfig::from_file(path)?,
        None => ProviderConfig::default(),
    };
    if let Some(limit) = cli.limit {
        config.limit = limit;
    }
    config.validate()?;

    let provider: Box<dyn EarningsProvider> = match &cli.replay_dir {
        Some(dir) => Box::new(ReplayProvider::new(dir)),
        None => match YahooProvider::new(config.clone()) {
            Ok(yahoo) => Box::new(yahoo),
            Err(err) => {
                // Every ticker gets a failure record instead of aborting the run.
                tracing::warn!(error = %err, "Yahoo provider unavailable");
                let reason = match err {
                    ProviderError::Unavailable(reason) => reason,
                    other => other.to_string(),
                };
                Box::new(UnavailableProvider::new(reason))
            }
        },
    };

    let report = resolve_all(
        provider.as_ref(),
        &tickers,
        config.limit,
        Utc::now,
        &TracingProgress,
    );

    let rows = write_report(&cli.output, report.records)
        .with_context(|| format!("failed to write report to {}", cli.output.display()))?;
    println!("Wrote {rows} rows to {}", cli.output.display());
    Ok(())
}
