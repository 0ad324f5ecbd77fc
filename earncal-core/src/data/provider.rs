//! Earnings provider trait, response table, and structured error types.
//!
//! The EarningsProvider trait abstracts over data sources (Yahoo Finance,
//! saved responses on disk) so the resolver can be driven by a mock in tests.

use serde_json::Value;
use thiserror::Error;

/// Number of earnings-date entries requested per ticker.
pub const DEFAULT_LIMIT: usize = 16;

/// Structured error types for provider operations.
///
/// `kind()` is the short tag embedded in failure records, `Display` the message.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("network unreachable: {0}")]
    Network(String),

    #[error("HTTP {status} for {symbol}")]
    HttpStatus { status: u16, symbol: String },

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("provider unavailable: {0}")]
    Unavailable(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProviderError {
    /// Short, stable name of the error variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Network(_) => "Network",
            Self::HttpStatus { .. } => "HttpStatus",
            Self::AuthenticationRequired(_) => "AuthenticationRequired",
            Self::ResponseFormatChanged(_) => "ResponseFormatChanged",
            Self::SymbolNotFound { .. } => "SymbolNotFound",
            Self::Unavailable(_) => "Unavailable",
            Self::Io(_) => "Io",
        }
    }
}

/// Tabular earnings-date response.
///
/// Cells are kept as raw JSON values. Depending on the provider the event
/// date lives either in a named column or in `index` (the row key).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EarningsTable {
    pub columns: Vec<String>,
    pub index: Vec<Value>,
    pub rows: Vec<Vec<Value>>,
}

impl EarningsTable {
    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of the column named `name`, if present.
    pub fn column_position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell at `row`, `col`; `None` for ragged rows.
    pub fn cell(&self, row: usize, col: usize) -> Option<&Value> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Row key at `row`.
    pub fn index_value(&self, row: usize) -> Option<&Value> {
        self.index.get(row)
    }
}

/// Trait for earnings-date providers.
///
/// Implementations fetch at most `limit` entries for one symbol and report
/// every failure as a `ProviderError`; they never panic on bad data.
pub trait EarningsProvider {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch up to `limit` earnings-date entries for `symbol`.
    fn earnings_dates(&self, symbol: &str, limit: usize) -> Result<EarningsTable, ProviderError>;
}

/// Stand-in for a provider that could not be constructed.
///
/// Fails every call with `ProviderError::Unavailable` so each ticker still
/// gets its own failure record.
pub struct UnavailableProvider {
    reason: String,
}

impl UnavailableProvider {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl EarningsProvider for UnavailableProvider {
    fn name(&self) -> &str {
        "unavailable"
    }

    fn earnings_dates(&self, _symbol: &str, _limit: usize) -> Result<EarningsTable, ProviderError> {
        Err(ProviderError::Unavailable(self.reason.clone()))
    }
}
