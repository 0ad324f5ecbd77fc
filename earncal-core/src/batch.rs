//! Batch driver: resolves a ticker list one symbol at a time.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::data::provider::EarningsProvider;
use crate::resolver::{resolve_ticker_at, EarningsRecord, Outcome};

/// Progress callbacks for a batch run.
pub trait ResolveProgress {
    /// Called before a ticker is sent to the provider.
    fn on_start(&self, ticker: &str, index: usize, total: usize);

    /// Called with the record produced for a ticker.
    fn on_complete(&self, record: &EarningsRecord, index: usize, total: usize);

    /// Called once every ticker has a record.
    fn on_batch_complete(&self, report: &BatchReport);
}

/// Progress reporter that emits `tracing` events.
pub struct TracingProgress;

impl ResolveProgress for TracingProgress {
    fn on_start(&self, ticker: &str, index: usize, total: usize) {
        info!("[{}/{}] Resolving {ticker}...", index + 1, total);
    }

    fn on_complete(&self, record: &EarningsRecord, _index: usize, _total: usize) {
        match record.outcome() {
            Outcome::Failed => warn!(ticker = %record.ticker, source = %record.source, "lookup failed"),
            Outcome::Empty | Outcome::NoUsableDates => {
                warn!(ticker = %record.ticker, source = %record.source, "no earnings date")
            }
            Outcome::Upcoming | Outcome::PastFallback => {
                let date = record.next_earnings_date_iso().unwrap_or_default();
                info!(
                    ticker = %record.ticker,
                    date = %date,
                    upcoming = record.got_upcoming,
                    "resolved"
                )
            }
        }
    }

    fn on_batch_complete(&self, report: &BatchReport) {
        info!(
            total = report.total(),
            upcoming = report.upcoming,
            past = report.past,
            empty = report.empty,
            failed = report.failed,
            "batch complete"
        );
    }
}

/// Progress reporter that does nothing.
pub struct NoProgress;

impl ResolveProgress for NoProgress {
    fn on_start(&self, _ticker: &str, _index: usize, _total: usize) {}
    fn on_complete(&self, _record: &EarningsRecord, _index: usize, _total: usize) {}
    fn on_batch_complete(&self, _report: &BatchReport) {}
}

/// Records of a batch run, in input order, with outcome counts.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub records: Vec<EarningsRecord>,
    pub upcoming: usize,
    pub past: usize,
    /// Empty responses and responses without a usable date.
    pub empty: usize,
    pub failed: usize,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.records.len()
    }

    fn push(&mut self, record: EarningsRecord) {
        match record.outcome() {
            Outcome::Upcoming => self.upcoming += 1,
            Outcome::PastFallback => self.past += 1,
            Outcome::Empty | Outcome::NoUsableDates => self.empty += 1,
            Outcome::Failed => self.failed += 1,
        }
        self.records.push(record);
    }
}

/// Resolve every ticker sequentially.
///
/// `clock` is read once per ticker, just before its provider call, so each
/// ticker is judged against the time it was resolved. Produces exactly one
/// record per input ticker; a failing ticker never stops the batch.
pub fn resolve_all(
    provider: &dyn EarningsProvider,
    tickers: &[String],
    limit: usize,
    clock: impl Fn() -> DateTime<Utc>,
    progress: &dyn ResolveProgress,
) -> BatchReport {
    let total = tickers.len();
    let mut report = BatchReport {
        records: Vec::with_capacity(total),
        ..BatchReport::default()
    };

    for (i, ticker) in tickers.iter().enumerate() {
        progress.on_start(ticker, i, total);
        let record = resolve_ticker_at(provider, ticker, limit, clock());
        progress.on_complete(&record, i, total);
        report.push(record);
    }

    progress.on_batch_complete(&report);
    report
}
