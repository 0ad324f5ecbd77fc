//! Yahoo Finance earnings-calendar provider.
//!
//! Queries the v1 visualization API (entity `earnings`) for the most recent
//! and upcoming earnings events of a symbol. The API wants a session cookie
//! plus a crumb; both are obtained once per provider.
//!
//! Yahoo Finance has no official API and is subject to unannounced format
//! changes, so parsing is tolerant: unknown columns are passed through and a
//! missing date column leaves the table as-is for the resolver to judge.

use std::cell::RefCell;
use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::provider::{EarningsProvider, EarningsTable, ProviderError};
use crate::config::ProviderConfig;

/// Column id Yahoo uses for the event timestamp.
const START_DATETIME_ID: &str = "startdatetime";

const INCLUDE_FIELDS: [&str; 7] = [
    "ticker",
    "companyshortname",
    "startdatetime",
    "timeZoneShortName",
    "epsestimate",
    "epsactual",
    "epssurprisepct",
];

/// Yahoo Finance visualization API response.
#[derive(Debug, Deserialize)]
pub(crate) struct VizResponse {
    finance: VizFinance,
}

#[derive(Debug, Deserialize)]
struct VizFinance {
    result: Option<Vec<VizResult>>,
    error: Option<VizError>,
}

#[derive(Debug, Deserialize)]
struct VizError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct VizResult {
    #[serde(default)]
    documents: Vec<VizDocument>,
}

#[derive(Debug, Deserialize)]
struct VizDocument {
    #[serde(default)]
    columns: Vec<VizColumn>,
    #[serde(default)]
    rows: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct VizColumn {
    id: String,
    label: Option<String>,
}

/// Parse a raw visualization response body into an `EarningsTable`.
pub fn parse_body(symbol: &str, body: &str) -> Result<EarningsTable, ProviderError> {
    let resp: VizResponse = serde_json::from_str(body).map_err(|e| {
        ProviderError::ResponseFormatChanged(format!("failed to parse response for {symbol}: {e}"))
    })?;
    parse_response(symbol, resp)
}

/// Convert the visualization response into an `EarningsTable`.
///
/// The `startdatetime` column becomes the row index; all other columns are
/// kept under their display label.
pub(crate) fn parse_response(symbol: &str, resp: VizResponse) -> Result<EarningsTable, ProviderError> {
    let results = match (resp.finance.result, resp.finance.error) {
        (_, Some(err)) if err.code == "Not Found" => {
            return Err(ProviderError::SymbolNotFound {
                symbol: symbol.to_string(),
            })
        }
        (_, Some(err)) => {
            return Err(ProviderError::ResponseFormatChanged(format!(
                "{}: {}",
                err.code, err.description
            )))
        }
        (Some(results), None) => results,
        (None, None) => {
            return Err(ProviderError::ResponseFormatChanged(
                "empty result with no error".into(),
            ))
        }
    };

    let Some(document) = results.into_iter().flat_map(|r| r.documents).next() else {
        return Ok(EarningsTable::default());
    };

    let date_pos = document
        .columns
        .iter()
        .position(|c| c.id == START_DATETIME_ID);

    let columns = document
        .columns
        .iter()
        .enumerate()
        .filter(|(i, _)| Some(*i) != date_pos)
        .map(|(_, c)| c.label.clone().unwrap_or_else(|| c.id.clone()))
        .collect();

    let mut index = Vec::with_capacity(document.rows.len());
    let mut rows = Vec::with_capacity(document.rows.len());
    for mut row in document.rows {
        match date_pos {
            Some(pos) if pos < row.len() => index.push(row.remove(pos)),
            _ => index.push(Value::Null),
        }
        rows.push(row);
    }

    Ok(EarningsTable {
        columns,
        index,
        rows,
    })
}

/// Yahoo Finance earnings provider.
pub struct YahooProvider {
    client: reqwest::blocking::Client,
    config: ProviderConfig,
    crumb: RefCell<Option<String>>,
}

impl YahooProvider {
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .cookie_store(true)
            .build()
            .map_err(|e| ProviderError::Unavailable(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            config,
            crumb: RefCell::new(None),
        })
    }

    fn visualization_url(&self) -> String {
        format!(
            "{}/v1/finance/visualization",
            self.config.base_url.trim_end_matches('/')
        )
    }

    fn crumb_url(&self) -> String {
        format!(
            "{}/v1/test/getcrumb",
            self.config.base_url.trim_end_matches('/')
        )
    }

    /// Request body for the earnings query, newest events first.
    fn query_body(symbol: &str, limit: usize) -> Value {
        json!({
            "offset": 0,
            "size": limit,
            "sortField": START_DATETIME_ID,
            "sortType": "DESC",
            "entityIdType": "earnings",
            "includeFields": INCLUDE_FIELDS,
            "query": {
                "operator": "and",
                "operands": [
                    { "operator": "eq", "operands": ["ticker", symbol] }
                ]
            }
        })
    }

    /// Return the session crumb, fetching cookie and crumb on first use.
    fn crumb(&self) -> Result<String, ProviderError> {
        if let Some(crumb) = self.crumb.borrow().as_ref() {
            return Ok(crumb.clone());
        }

        debug!(url = %self.config.cookie_url, "fetching session cookie");
        // The cookie endpoint answers with an error status but still sets the cookie.
        self.client
            .get(&self.config.cookie_url)
            .send()
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let resp = self
            .client
            .get(self.crumb_url())
            .send()
            .map_err(|e| ProviderError::Network(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ProviderError::AuthenticationRequired(format!(
                "crumb request returned HTTP {status}"
            )));
        }
        let crumb = resp
            .text()
            .map_err(|e| ProviderError::Network(e.to_string()))?
            .trim()
            .to_string();
        if crumb.is_empty() || crumb.contains('<') {
            return Err(ProviderError::AuthenticationRequired(
                "crumb response was not a token".into(),
            ));
        }

        debug!("obtained crumb");
        *self.crumb.borrow_mut() = Some(crumb.clone());
        Ok(crumb)
    }
}

impl EarningsProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn earnings_dates(&self, symbol: &str, limit: usize) -> Result<EarningsTable, ProviderError> {
        let crumb = self.crumb()?;

        debug!(symbol, limit, "requesting earnings dates");
        let resp = self
            .client
            .post(self.visualization_url())
            .query(&[("lang", "en-US"), ("region", "US"), ("crumb", crumb.as_str())])
            .json(&Self::query_body(symbol, limit))
            .send()
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            // Force a fresh cookie and crumb for the next symbol.
            self.crumb.borrow_mut().take();
            return Err(ProviderError::AuthenticationRequired(format!(
                "HTTP {status} for {symbol}"
            )));
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ProviderError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }
        if !status.is_success() {
            return Err(ProviderError::HttpStatus {
                status: status.as_u16(),
                symbol: symbol.to_string(),
            });
        }

        let viz: VizResponse = resp.json().map_err(|e| {
            ProviderError::ResponseFormatChanged(format!(
                "failed to parse response for {symbol}: {e}"
            ))
        })?;
        parse_response(symbol, viz)
    }
}
