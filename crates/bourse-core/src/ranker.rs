//! Market-capitalization variation ranking.
//!
//! For every ticker the ranker compares the current price against the first
//! daily close of the period window and scales the difference by the shares
//! outstanding. Tickers that cannot be evaluated are skipped with a reason;
//! one bad ticker never aborts the scan.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use time::Date;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::data_source::{HistoryRequest, MarketDataSource, SourceError};
use crate::metrics::Trend;
use crate::range::{ResolvedRange, VariationPeriod};
use crate::{Symbol, ValidationError};

/// Market-cap move of one ticker over the period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariationRecord {
    pub symbol: Symbol,
    pub former_price: f64,
    pub current_price: f64,
    pub shares_outstanding: f64,
    /// Signed change in market capitalization, in the quote currency.
    pub variation: f64,
    /// Signed fractional price change, `0.05` for +5%.
    pub percentage: f64,
    pub abs_variation: f64,
    pub trend: Trend,
}

impl VariationRecord {
    pub fn new(symbol: Symbol, former_price: f64, current_price: f64, shares_outstanding: f64) -> Self {
        let variation = (current_price - former_price) * shares_outstanding;
        Self {
            symbol,
            former_price,
            current_price,
            shares_outstanding,
            variation,
            percentage: (current_price - former_price) / former_price,
            abs_variation: variation.abs(),
            trend: Trend::of_sign(variation),
        }
    }
}

/// Why a ticker produced no record.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SkipReason {
    #[error("shares outstanding not reported")]
    MissingSharesOutstanding,
    #[error("current price not reported")]
    MissingPrice,
    #[error("no daily close in the period window")]
    NoHistory,
    #[error("former close is zero")]
    ZeroFormerPrice,
    #[error(transparent)]
    Source(#[from] SourceError),
}

impl SkipReason {
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MissingSharesOutstanding => "rank.missing_shares",
            Self::MissingPrice => "rank.missing_price",
            Self::NoHistory => "rank.no_history",
            Self::ZeroFormerPrice => "rank.zero_former_price",
            Self::Source(error) => error.code(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedTicker {
    pub symbol: Symbol,
    pub reason: SkipReason,
}

/// Completion counter handed to the progress callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankProgress {
    pub completed: usize,
    pub total: usize,
}

impl RankProgress {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

/// Outcome of a ranking scan.
#[derive(Debug, Clone, PartialEq)]
pub struct RankingReport {
    pub period: VariationPeriod,
    pub window: ResolvedRange,
    /// Sorted by absolute variation, largest first.
    pub records: Vec<VariationRecord>,
    /// Skipped tickers in input order.
    pub skipped: Vec<SkippedTicker>,
    /// Distinct tickers scanned.
    pub total: usize,
}

impl RankingReport {
    /// True when no ticker could be ranked.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn top(&self, limit: usize) -> &[VariationRecord] {
        &self.records[..limit.min(self.records.len())]
    }
}

/// Ranks tickers by market-cap variation using a bounded worker pool.
#[derive(Clone)]
pub struct VariationRanker {
    source: Arc<dyn MarketDataSource>,
    concurrency: usize,
}

impl VariationRanker {
    /// `concurrency` is clamped to at least 1, which evaluates sequentially.
    pub fn new(source: Arc<dyn MarketDataSource>, concurrency: usize) -> Self {
        Self {
            source,
            concurrency: concurrency.max(1),
        }
    }

    pub async fn rank<F>(
        &self,
        tickers: &[Symbol],
        period: VariationPeriod,
        today: Date,
        mut on_progress: F,
    ) -> Result<RankingReport, ValidationError>
    where
        F: FnMut(RankProgress),
    {
        let window = period.history_window(today)?;
        let tickers = dedup(tickers);
        let total = tickers.len();

        tracing::info!(
            total,
            period = %period,
            start = %window.start,
            concurrency = self.concurrency,
            "ranking market-cap variation"
        );

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();
        for (index, symbol) in tickers.iter().cloned().enumerate() {
            let source = Arc::clone(&self.source);
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let outcome = match semaphore.acquire_owned().await {
                    Ok(_permit) => evaluate(source.as_ref(), &symbol, window).await,
                    Err(_) => Err(SkipReason::Source(SourceError::internal(
                        "ranker worker pool closed",
                    ))),
                };
                (index, outcome)
            });
        }

        let mut outcomes: Vec<Option<Result<VariationRecord, SkipReason>>> = vec![None; total];
        let mut completed = 0;
        while let Some(joined) = tasks.join_next().await {
            completed += 1;
            on_progress(RankProgress { completed, total });
            match joined {
                Ok((index, outcome)) => outcomes[index] = Some(outcome),
                Err(error) => tracing::warn!(%error, "ranker task failed"),
            }
        }

        let mut records = Vec::new();
        let mut skipped = Vec::new();
        for (symbol, outcome) in tickers.into_iter().zip(outcomes) {
            let outcome = outcome.unwrap_or_else(|| {
                Err(SkipReason::Source(SourceError::internal("ranker task aborted")))
            });
            match outcome {
                Ok(record) => records.push(record),
                Err(reason) => {
                    tracing::warn!(%symbol, %reason, "skipping ticker");
                    skipped.push(SkippedTicker { symbol, reason });
                }
            }
        }

        sort_by_abs_variation(&mut records);

        tracing::info!(
            ranked = records.len(),
            skipped = skipped.len(),
            "ranking complete"
        );

        Ok(RankingReport {
            period,
            window,
            records,
            skipped,
            total,
        })
    }
}

/// Stable descending sort on `|variation|`; ties keep their input order.
pub fn sort_by_abs_variation(records: &mut [VariationRecord]) {
    records.sort_by(|a, b| b.abs_variation.total_cmp(&a.abs_variation));
}

async fn evaluate(
    source: &dyn MarketDataSource,
    symbol: &Symbol,
    window: ResolvedRange,
) -> Result<VariationRecord, SkipReason> {
    let snapshot = source.snapshot(symbol.clone()).await?;
    let shares = snapshot
        .shares_outstanding
        .ok_or(SkipReason::MissingSharesOutstanding)?;
    let current = snapshot
        .regular_market_price
        .ok_or(SkipReason::MissingPrice)?;

    let request = HistoryRequest::for_range(symbol.clone(), window)?;
    tracing::debug!(%symbol, start = %window.start, end = %window.end, "fetching former close");
    let series = source.history(request).await?;
    let former = series.first_close().ok_or(SkipReason::NoHistory)?;
    if former == 0.0 {
        return Err(SkipReason::ZeroFormerPrice);
    }

    Ok(VariationRecord::new(symbol.clone(), former, current, shares))
}

fn dedup(tickers: &[Symbol]) -> Vec<Symbol> {
    let mut seen = HashSet::with_capacity(tickers.len());
    tickers
        .iter()
        .filter(|symbol| seen.insert(symbol.as_str()))
        .cloned()
        .collect()
}
