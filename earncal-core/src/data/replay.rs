//! Offline provider that replays saved Yahoo responses from a directory.
//!
//! Each symbol is read from `<dir>/<SYMBOL>.json`, a raw visualization API
//! body, and goes through the same parser as a live response.

use std::path::PathBuf;

use tracing::debug;

use super::provider::{EarningsProvider, EarningsTable, ProviderError};
use super::yahoo;

pub struct ReplayProvider {
    dir: PathBuf,
}

impl ReplayProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn symbol_path(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{symbol}.json"))
    }
}

impl EarningsProvider for ReplayProvider {
    fn name(&self) -> &str {
        "replay"
    }

    fn earnings_dates(&self, symbol: &str, limit: usize) -> Result<EarningsTable, ProviderError> {
        if !self.dir.is_dir() {
            return Err(ProviderError::Unavailable(format!(
                "replay directory does not exist: {}",
                self.dir.display()
            )));
        }

        let path = self.symbol_path(symbol);
        if !path.is_file() {
            return Err(ProviderError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }

        debug!(symbol, path = %path.display(), "replaying saved response");
        let body = std::fs::read_to_string(&path)?;
        let mut table = yahoo::parse_body(symbol, &body)?;

        // Saved bodies may hold a wider window than the live request would return.
        table.rows.truncate(limit);
        table.index.truncate(limit);
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_directory_is_unavailable() {
        let provider = ReplayProvider::new("/nonexistent/earncal/replay");
        let err = provider.earnings_dates("AAPL", 16).unwrap_err();
        assert_eq!(err.kind(), "Unavailable");
    }

    #[test]
    fn missing_symbol_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let provider = ReplayProvider::new(dir.path());
        let err = provider.earnings_dates("AAPL", 16).unwrap_err();
        assert!(matches!(err, ProviderError::SymbolNotFound { .. }));
    }

    #[test]
    fn saved_body_is_truncated_to_limit() {
        let dir = tempfile::tempdir().unwrap();
        let body = r#"{"finance":{"result":[{"documents":[{
            "columns":[{"label":"Symbol","id":"ticker"},{"label":"Event Start Date","id":"startdatetime"}],
            "rows":[["MSFT","2025-10-29T20:00:00Z"],["MSFT","2025-07-30T20:00:00Z"],["MSFT","2025-04-30T20:00:00Z"]]
        }]}],"error":null}}"#;
        std::fs::write(dir.path().join("MSFT.json"), body).unwrap();

        let provider = ReplayProvider::new(dir.path());
        let table = provider.earnings_dates("MSFT", 2).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.index.len(), 2);
    }
}
