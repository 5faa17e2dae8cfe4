//! Behavior tests for the market-cap variation ranker.

mod support;

use std::sync::Arc;

use bourse_core::{
    MarketDataSource, RankProgress, SkipReason, SourceError, SourceErrorKind, SyntheticSource,
    Trend, Universe, VariationPeriod, VariationRanker, Market,
};
use support::{snapshot, sym, ScriptedSource};
use time::macros::date;

const TODAY: time::Date = date!(2024 - 06 - 11);

fn ranker(source: &Arc<ScriptedSource>, concurrency: usize) -> VariationRanker {
    VariationRanker::new(Arc::clone(source) as Arc<dyn MarketDataSource>, concurrency)
}

// =============================================================================
// Per-ticker isolation
// =============================================================================

#[tokio::test]
async fn when_one_ticker_lacks_shares_and_another_errors_only_the_good_one_is_ranked() {
    // Given: A is complete, B has no shares outstanding, C fails upstream
    let source = Arc::new(
        ScriptedSource::new()
            .with_snapshot(snapshot("A", Some(110.0), Some(1_000.0)))
            .with_history("A", &[100.0, 105.0])
            .with_snapshot(snapshot("B", Some(50.0), None))
            .with_history("B", &[40.0])
            .with_snapshot_error("C", SourceError::unavailable("connection reset")),
    );

    // When: the three tickers are ranked
    let report = ranker(&source, 4)
        .rank(&[sym("A"), sym("B"), sym("C")], VariationPeriod::OneWeek, TODAY, |_| {})
        .await
        .expect("rank runs");

    // Then: only A survives, and the skips carry their reasons
    assert_eq!(report.total, 3);
    assert_eq!(report.records.len(), 1);
    let record = &report.records[0];
    assert_eq!(record.symbol, sym("A"));
    assert_eq!(record.former_price, 100.0);
    assert_eq!(record.variation, 10_000.0);
    assert!((record.percentage - 0.10).abs() < 1e-12);

    assert_eq!(report.skipped.len(), 2);
    assert_eq!(report.skipped[0].symbol, sym("B"));
    assert_eq!(report.skipped[0].reason, SkipReason::MissingSharesOutstanding);
    assert_eq!(report.skipped[1].symbol, sym("C"));
    assert!(matches!(
        &report.skipped[1].reason,
        SkipReason::Source(error) if error.kind() == SourceErrorKind::Unavailable
    ));
}

#[tokio::test]
async fn when_the_history_fetch_fails_after_a_good_snapshot_the_ticker_is_skipped() {
    // Given: both tickers have a snapshot, but LATE's history request fails
    let source = Arc::new(
        ScriptedSource::new()
            .with_snapshot(snapshot("OK", Some(20.0), Some(100.0)))
            .with_history("OK", &[10.0])
            .with_snapshot(snapshot("LATE", Some(30.0), Some(100.0)))
            .with_history_error("LATE", SourceError::rate_limited("too many requests")),
    );

    // When: both are ranked
    let report = ranker(&source, 2)
        .rank(&[sym("OK"), sym("LATE")], VariationPeriod::OneMonth, TODAY, |_| {})
        .await
        .expect("rank runs");

    // Then: LATE is skipped with the upstream error and OK is still ranked
    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].symbol, sym("OK"));
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].symbol, sym("LATE"));
    assert!(matches!(
        &report.skipped[0].reason,
        SkipReason::Source(error) if error.kind() == SourceErrorKind::RateLimited
    ));
    assert_eq!(source.history_calls().len(), 2);
}

#[tokio::test]
async fn when_history_is_empty_or_starts_at_zero_the_ticker_is_skipped() {
    let source = Arc::new(
        ScriptedSource::new()
            .with_snapshot(snapshot("EMPTY", Some(10.0), Some(5.0)))
            .with_snapshot(snapshot("ZERO", Some(10.0), Some(5.0)))
            .with_history("ZERO", &[0.0, 3.0])
            .with_snapshot(snapshot("NOPRICE", None, Some(5.0))),
    );

    let report = ranker(&source, 1)
        .rank(
            &[sym("EMPTY"), sym("ZERO"), sym("NOPRICE")],
            VariationPeriod::OneMonth,
            TODAY,
            |_| {},
        )
        .await
        .expect("rank runs");

    assert!(report.is_empty());
    let reasons = report
        .skipped
        .iter()
        .map(|skipped| skipped.reason.clone())
        .collect::<Vec<_>>();
    assert_eq!(
        reasons,
        vec![
            SkipReason::NoHistory,
            SkipReason::ZeroFormerPrice,
            SkipReason::MissingPrice
        ]
    );
}

// =============================================================================
// Ordering
// =============================================================================

#[tokio::test]
async fn when_variations_are_mixed_sign_they_sort_by_magnitude_with_signs_kept() {
    // Given: variations of +100, -500 and +50 (one share each)
    let source = Arc::new(
        ScriptedSource::new()
            .with_snapshot(snapshot("UP", Some(1_100.0), Some(1.0)))
            .with_history("UP", &[1_000.0])
            .with_snapshot(snapshot("DOWN", Some(500.0), Some(1.0)))
            .with_history("DOWN", &[1_000.0])
            .with_snapshot(snapshot("SMALL", Some(1_050.0), Some(1.0)))
            .with_history("SMALL", &[1_000.0]),
    );

    let report = ranker(&source, 3)
        .rank(
            &[sym("UP"), sym("DOWN"), sym("SMALL")],
            VariationPeriod::OneDay,
            TODAY,
            |_| {},
        )
        .await
        .expect("rank runs");

    let ranked = report
        .records
        .iter()
        .map(|record| (record.symbol.to_string(), record.variation, record.trend))
        .collect::<Vec<_>>();
    assert_eq!(
        ranked,
        vec![
            (String::from("DOWN"), -500.0, Trend::Negative),
            (String::from("UP"), 100.0, Trend::Positive),
            (String::from("SMALL"), 50.0, Trend::Positive),
        ]
    );
    assert_eq!(report.top(1)[0].symbol, sym("DOWN"));
    assert_eq!(report.top(10).len(), 3);
}

#[tokio::test]
async fn when_workers_finish_out_of_order_ties_still_follow_input_order() {
    let tickers = ["T1", "T2", "T3", "T4", "T5", "T6"];
    let source = tickers.iter().fold(ScriptedSource::new(), |source, ticker| {
        source
            .with_snapshot(snapshot(ticker, Some(12.0), Some(10.0)))
            .with_history(ticker, &[10.0, 11.0])
    });
    let source = Arc::new(source);
    let symbols = tickers.iter().map(|ticker| sym(ticker)).collect::<Vec<_>>();

    let report = ranker(&source, 3)
        .rank(&symbols, VariationPeriod::SixMonths, TODAY, |_| {})
        .await
        .expect("rank runs");

    let order = report
        .records
        .iter()
        .map(|record| record.symbol.to_string())
        .collect::<Vec<_>>();
    assert_eq!(order, tickers);
}

#[tokio::test]
async fn when_a_ticker_is_listed_twice_it_is_ranked_once() {
    let source = Arc::new(
        ScriptedSource::new()
            .with_snapshot(snapshot("MC.PA", Some(700.0), Some(10.0)))
            .with_history("MC.PA", &[690.0]),
    );

    let report = ranker(&source, 2)
        .rank(&[sym("MC.PA"), sym("mc.pa")], VariationPeriod::OneWeek, TODAY, |_| {})
        .await
        .expect("rank runs");

    assert_eq!(report.total, 1);
    assert_eq!(report.records.len(), 1);
    assert_eq!(source.snapshot_calls().len(), 1);
}

// =============================================================================
// Query window and progress
// =============================================================================

#[tokio::test]
async fn when_ranking_over_one_day_the_former_close_comes_from_yesterday() {
    let source = Arc::new(
        ScriptedSource::new()
            .with_snapshot(snapshot("AAPL", Some(200.0), Some(1.0)))
            .with_history("AAPL", &[190.0]),
    );

    ranker(&source, 1)
        .rank(&[sym("AAPL")], VariationPeriod::OneDay, TODAY, |_| {})
        .await
        .expect("rank runs");

    let calls = source.history_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].start, date!(2024 - 06 - 10));
    assert_eq!(calls[0].end, TODAY);
}

#[tokio::test]
async fn when_tickers_complete_progress_is_reported_once_each_up_to_the_total() {
    let source = Arc::new(
        ScriptedSource::new()
            .with_snapshot(snapshot("A", Some(2.0), Some(1.0)))
            .with_history("A", &[1.0])
            .with_snapshot_error("B", SourceError::not_found("delisted")),
    );
    let mut seen = Vec::new();

    ranker(&source, 2)
        .rank(
            &[sym("A"), sym("B"), sym("C")],
            VariationPeriod::OneWeek,
            TODAY,
            |progress| seen.push(progress),
        )
        .await
        .expect("rank runs");

    assert_eq!(
        seen,
        vec![
            RankProgress { completed: 1, total: 3 },
            RankProgress { completed: 2, total: 3 },
            RankProgress { completed: 3, total: 3 },
        ]
    );
    assert_eq!(seen.last().map(RankProgress::fraction), Some(1.0));
}

#[tokio::test]
async fn when_nothing_can_be_ranked_the_report_is_empty_not_an_error() {
    let source = Arc::new(ScriptedSource::new());

    let report = ranker(&source, 8)
        .rank(&[sym("GHOST")], VariationPeriod::OneYear, TODAY, |_| {})
        .await
        .expect("empty ranking is not an error");

    assert!(report.is_empty());
    assert_eq!(report.skipped.len(), 1);
}

// =============================================================================
// Synthetic source end to end
// =============================================================================

#[tokio::test]
async fn when_the_cac40_is_ranked_offline_every_ticker_gets_a_record() {
    let universe = Universe::for_market(Market::Cac40).expect("static list");
    let ranker = VariationRanker::new(Arc::new(SyntheticSource::new(TODAY)), 8);

    let report = ranker
        .rank(universe.symbols(), VariationPeriod::OneMonth, TODAY, |_| {})
        .await
        .expect("rank runs");

    assert_eq!(report.total, 40);
    assert_eq!(report.records.len(), 40);
    assert!(report
        .records
        .windows(2)
        .all(|pair| pair[0].abs_variation >= pair[1].abs_variation));
}
