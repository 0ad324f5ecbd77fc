//! CSV report of resolved earnings dates.
//!
//! Columns: ticker, next_earnings_date, when, source, got_upcoming.
//! Rows are ordered by date ascending with undated rows last, then by ticker.

use std::cmp::Ordering;
use std::path::Path;

use thiserror::Error;

use crate::resolver::EarningsRecord;

pub const HEADER: [&str; 5] = [
    "ticker",
    "next_earnings_date",
    "when",
    "source",
    "got_upcoming",
];

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to flush CSV writer: {0}")]
    Flush(String),

    #[error("write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Report ordering: dated rows first by date, then ticker (byte order).
pub fn compare_records(a: &EarningsRecord, b: &EarningsRecord) -> Ordering {
    let by_date = match (a.next_earnings_date, b.next_earnings_date) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_date.then_with(|| a.ticker.cmp(&b.ticker))
}

/// Sort records into report order. Stable.
pub fn sort_records(records: &mut [EarningsRecord]) {
    records.sort_by(compare_records);
}

fn bool_literal(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

/// Render records as CSV, in the order given.
pub fn export_csv(records: &[EarningsRecord]) -> Result<String, ReportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(HEADER)?;

    for r in records {
        let date = r.next_earnings_date_iso().unwrap_or_default();
        wtr.write_record([
            r.ticker.as_str(),
            date.as_str(),
            r.when.as_deref().unwrap_or(""),
            r.source.as_str(),
            bool_literal(r.got_upcoming),
        ])?;
    }

    let data = wtr
        .into_inner()
        .map_err(|e| ReportError::Flush(e.to_string()))?;
    String::from_utf8(data).map_err(|e| ReportError::Flush(e.to_string()))
}

/// Sort `records` and write them to `path`, replacing any existing file.
///
/// Returns the number of rows written.
pub fn write_report(path: &Path, mut records: Vec<EarningsRecord>) -> Result<usize, ReportError> {
    sort_records(&mut records);
    let csv = export_csv(&records)?;
    std::fs::write(path, csv).map_err(|source| ReportError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn rec(ticker: &str, day: Option<u32>) -> EarningsRecord {
        EarningsRecord {
            ticker: ticker.into(),
            next_earnings_date: day.map(|d| Utc.with_ymd_and_hms(2025, 3, d, 0, 0, 0).unwrap()),
            when: None,
            source: "yahoo:earnings_dates".into(),
            got_upcoming: day.is_some(),
        }
    }

    #[test]
    fn sorts_by_date_then_ticker_with_undated_last() {
        let mut records = vec![
            rec("ZZZ", None),
            rec("MSFT", Some(5)),
            rec("AAA", None),
            rec("AAPL", Some(5)),
            rec("NVDA", Some(1)),
        ];
        sort_records(&mut records);
        let order: Vec<&str> = records.iter().map(|r| r.ticker.as_str()).collect();
        assert_eq!(order, vec!["NVDA", "AAPL", "MSFT", "AAA", "ZZZ"]);
    }

    #[test]
    fn ticker_tiebreak_is_case_sensitive() {
        let mut records = vec![rec("abc", Some(2)), rec("ABD", Some(2))];
        sort_records(&mut records);
        assert_eq!(records[0].ticker, "ABD");
    }

    #[test]
    fn csv_layout() {
        let mut upcoming = rec("AAPL", Some(1));
        upcoming.when = Some("AMC".into());
        let failed = EarningsRecord {
            ticker: "BADSYM".into(),
            next_earnings_date: None,
            when: None,
            source: "error:Network:network unreachable: a, b".into(),
            got_upcoming: false,
        };

        let csv = export_csv(&[upcoming, failed]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "ticker,next_earnings_date,when,source,got_upcoming");
        assert_eq!(
            lines[1],
            "AAPL,2025-03-01T00:00:00+00:00,AMC,yahoo:earnings_dates,True"
        );
        assert_eq!(
            lines[2],
            "BADSYM,,,\"error:Network:network unreachable: a, b\",False"
        );
    }

    #[test]
    fn write_report_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        std::fs::write(&path, "stale contents that are longer than the report\n".repeat(50)).unwrap();

        let n = write_report(&path, vec![rec("B", None), rec("A", Some(3))]).unwrap();
        assert_eq!(n, 2);

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(!written.contains("stale"));
        let rows: Vec<&str> = written.lines().skip(1).collect();
        assert!(rows[0].starts_with("A,"));
        assert!(rows[1].starts_with("B,,"));
    }
}
