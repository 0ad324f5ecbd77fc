//! earncal core: resolves the next earnings date for a list of tickers.
//!
//! Pipeline: load tickers from CSV, ask an `EarningsProvider` for each
//! symbol's recent and upcoming earnings events, pick one date per ticker,
//! and write a sorted CSV report.
//!
//! - `data`: provider trait, Yahoo Finance provider, offline replay provider
//! - `tickers`: input CSV loading
//! - `resolver`: per-ticker selection of the upcoming or most recent date
//! - `batch`: sequential driver with progress hooks
//! - `report`: ordering and CSV output
//! - `config`: TOML provider settings

pub mod batch;
pub mod config;
pub mod data;
pub mod report;
pub mod resolver;
pub mod tickers;

pub use batch::{resolve_all, BatchReport, NoProgress, ResolveProgress, TracingProgress};
pub use config::{ConfigError, ProviderConfig};
pub use data::{EarningsProvider, EarningsTable, ProviderError, ReplayProvider, YahooProvider};
pub use report::{export_csv, sort_records, write_report, ReportError};
pub use resolver::{resolve_ticker_at, EarningsRecord, Outcome};
pub use tickers::{load_tickers, read_tickers, LoadError};
