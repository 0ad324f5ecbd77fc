//! Per-ticker earnings-date resolution.
//!
//! Turns one provider response into exactly one `EarningsRecord`:
//! - the earliest entry at or after `now` when one exists (`got_upcoming`)
//! - otherwise the most recent entry before `now`
//! - otherwise an empty record tagged with the reason
//!
//! Provider failures never escape: they are folded into a record whose
//! `source` reads `error:<kind>:<message>`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::Value;
use tracing::debug;

use crate::data::provider::{EarningsProvider, EarningsTable, ProviderError};

/// Provenance tag for records built from a provider response.
pub const SOURCE_TAG: &str = "yahoo:earnings_dates";

/// Column that carries the event date in older response layouts.
pub const DATE_COLUMN: &str = "Earnings Date";

/// Time-of-day column names, checked in order; first present wins.
pub const WHEN_COLUMNS: [&str; 4] = ["Time", "TimeOfDay", "When", "Time (ET)"];

const EMPTY_SUFFIX: &str = ":empty";
const NO_DATES_SUFFIX: &str = ":no_dates";
const ERROR_PREFIX: &str = "error:";

/// One output row of the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EarningsRecord {
    pub ticker: String,
    pub next_earnings_date: Option<DateTime<Utc>>,
    pub when: Option<String>,
    pub source: String,
    pub got_upcoming: bool,
}

/// How a record was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Upcoming,
    PastFallback,
    Empty,
    NoUsableDates,
    Failed,
}

impl EarningsRecord {
    fn without_date(ticker: &str, source: String) -> Self {
        Self {
            ticker: ticker.to_string(),
            next_earnings_date: None,
            when: None,
            source,
            got_upcoming: false,
        }
    }

    /// Record for a provider that returned no rows.
    pub fn empty(ticker: &str) -> Self {
        Self::without_date(ticker, format!("{SOURCE_TAG}{EMPTY_SUFFIX}"))
    }

    /// Record for rows that carried no parsable date.
    pub fn no_usable_dates(ticker: &str) -> Self {
        Self::without_date(ticker, format!("{SOURCE_TAG}{NO_DATES_SUFFIX}"))
    }

    /// Record for a failed provider call.
    pub fn failure(ticker: &str, err: &ProviderError) -> Self {
        Self::without_date(ticker, format!("{ERROR_PREFIX}{}:{err}", err.kind()))
    }

    /// `next_earnings_date` as ISO-8601 with an explicit `+00:00` offset.
    pub fn next_earnings_date_iso(&self) -> Option<String> {
        self.next_earnings_date
            .map(|dt| dt.to_rfc3339_opts(SecondsFormat::AutoSi, false))
    }

    pub fn outcome(&self) -> Outcome {
        if self.source.starts_with(ERROR_PREFIX) {
            Outcome::Failed
        } else if self.got_upcoming {
            Outcome::Upcoming
        } else if self.next_earnings_date.is_some() {
            Outcome::PastFallback
        } else if self.source.ends_with(EMPTY_SUFFIX) {
            Outcome::Empty
        } else {
            Outcome::NoUsableDates
        }
    }
}

/// Resolve `ticker` with an explicit decision boundary.
pub fn resolve_ticker_at(
    provider: &dyn EarningsProvider,
    ticker: &str,
    limit: usize,
    now: DateTime<Utc>,
) -> EarningsRecord {
    match try_resolve(provider, ticker, limit, now) {
        Ok(record) => record,
        Err(err) => {
            debug!(ticker, provider = provider.name(), error = %err, "provider call failed");
            EarningsRecord::failure(ticker, &err)
        }
    }
}

fn try_resolve(
    provider: &dyn EarningsProvider,
    ticker: &str,
    limit: usize,
    now: DateTime<Utc>,
) -> Result<EarningsRecord, ProviderError> {
    let table = provider.earnings_dates(ticker, limit)?;
    debug!(ticker, rows = table.len(), "received earnings table");
    Ok(select_from_table(ticker, &table, now))
}

/// Pick the record for `ticker` out of a provider table.
pub fn select_from_table(ticker: &str, table: &EarningsTable, now: DateTime<Utc>) -> EarningsRecord {
    if table.is_empty() {
        return EarningsRecord::empty(ticker);
    }

    let entries = parsed_dates(table);
    let when_col = when_column(table);

    let upcoming = entries
        .iter()
        .filter(|(dt, _)| *dt >= now)
        .min_by_key(|(dt, _)| *dt);
    if let Some(&(dt, row)) = upcoming {
        return dated_record(ticker, table, dt, row, when_col, true);
    }

    // Fallback: most recent past entry. Ties keep the later provider row.
    let past = entries
        .iter()
        .filter(|(dt, _)| *dt < now)
        .max_by_key(|(dt, _)| *dt);
    if let Some(&(dt, row)) = past {
        return dated_record(ticker, table, dt, row, when_col, false);
    }

    EarningsRecord::no_usable_dates(ticker)
}

fn dated_record(
    ticker: &str,
    table: &EarningsTable,
    dt: DateTime<Utc>,
    row: usize,
    when_col: Option<usize>,
    got_upcoming: bool,
) -> EarningsRecord {
    EarningsRecord {
        ticker: ticker.to_string(),
        next_earnings_date: Some(dt),
        when: when_col
            .and_then(|col| table.cell(row, col))
            .and_then(label),
        source: SOURCE_TAG.to_string(),
        got_upcoming,
    }
}

/// Parsed `(timestamp, row)` pairs in provider order; unparsable rows dropped.
///
/// The date comes from the `Earnings Date` column when present, else from
/// the row index.
pub fn parsed_dates(table: &EarningsTable) -> Vec<(DateTime<Utc>, usize)> {
    let date_col = table.column_position(DATE_COLUMN);
    (0..table.len())
        .filter_map(|row| {
            let cell = match date_col {
                Some(col) => table.cell(row, col),
                None => table.index_value(row),
            };
            cell.and_then(parse_timestamp).map(|dt| (dt, row))
        })
        .collect()
}

/// First time-of-day column present in the table.
pub fn when_column(table: &EarningsTable) -> Option<usize> {
    WHEN_COLUMNS
        .iter()
        .find_map(|name| table.column_position(name))
}

/// Coerce a cell into a UTC timestamp.
///
/// Strings may be RFC 3339, `YYYY-MM-DD[ T]HH:MM:SS[.f][±HH:MM]` or a bare
/// date; naive values are taken as UTC. Integers are epoch seconds.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_timestamp_str(s),
        Value::Number(n) => {
            if let Some(secs) = n.as_i64() {
                DateTime::from_timestamp(secs, 0)
            } else {
                let secs = n.as_f64()?;
                if !secs.is_finite() {
                    return None;
                }
                let whole = secs.floor();
                let nanos = ((secs - whole) * 1e9).round() as u32;
                DateTime::from_timestamp(whole as i64, nanos.min(999_999_999))
            }
        }
        _ => None,
    }
}

fn parse_timestamp_str(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M:%S%.f%:z"] {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Raw time-of-day label; JSON null means absent.
fn label(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(true) => Some("True".into()),
        Value::Bool(false) => Some("False".into()),
        other => Some(other.to_string()),
    }
}
