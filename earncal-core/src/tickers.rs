//! Ticker list loading from CSV.

use std::io::Read;
use std::path::Path;

use thiserror::Error;

/// Header the input CSV must carry.
pub const TICKER_COLUMN: &str = "ticker";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Input CSV must contain a 'ticker' column.")]
    MissingColumn,

    #[error("read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Load tickers from a CSV file with a `ticker` column.
pub fn load_tickers(path: &Path) -> Result<Vec<String>, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    read_tickers(file)
}

/// Read tickers from any CSV source.
///
/// Values are trimmed and blank entries dropped; order and duplicates are
/// preserved. Every other column is ignored.
pub fn read_tickers<R: Read>(reader: R) -> Result<Vec<String>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);

    let col = rdr
        .headers()?
        .iter()
        .position(|h| h == TICKER_COLUMN)
        .ok_or(LoadError::MissingColumn)?;

    let mut tickers = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let ticker = record.get(col).unwrap_or("").trim();
        if !ticker.is_empty() {
            tickers.push(ticker.to_string());
        }
    }
    Ok(tickers)
}
