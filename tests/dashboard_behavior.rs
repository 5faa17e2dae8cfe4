//! Behavior tests for the single-ticker dashboard flow.

mod support;

use std::sync::Arc;
use std::time::Duration;

use bourse_core::{
    AxisScale, CachedSource, ChartError, ChartOutcome, Dashboard, HistoryRequest, Interval,
    MarketDataSource, MarketSnapshot, MetricError, SessionState, SourceError, SyntheticSource,
    TimeRange, Trend, UtcDateTime, ValidationError,
};
use support::{snapshot, sym, ScriptedSource};
use time::macros::date;

fn dashboard(source: &Arc<ScriptedSource>) -> Dashboard {
    Dashboard::new(Arc::clone(source) as Arc<dyn MarketDataSource>)
}

// =============================================================================
// One-day retry policy
// =============================================================================

#[tokio::test]
async fn when_one_day_is_empty_twice_system_fetches_exactly_twice_and_reports_no_data() {
    // Given: a source with no bars at all for the ticker
    let source = Arc::new(ScriptedSource::new());
    let today = date!(2024 - 06 - 08);

    // When: the one-day chart is requested
    let result = dashboard(&source)
        .load_chart(&sym("MC.PA"), TimeRange::OneDay, today, &SessionState::default())
        .await;

    // Then: one retry with the start moved back a day, then "no data"
    assert!(matches!(result, Err(ChartError::NoData { .. })));
    let calls = source.history_calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].start, today);
    assert_eq!(calls[1].start, date!(2024 - 06 - 07));
    assert_eq!(calls[0].end, calls[1].end);
    assert_eq!(calls[1].interval, Interval::OneMinute);
}

#[tokio::test]
async fn when_one_day_retry_finds_bars_system_draws_the_widened_chart() {
    let source = Arc::new(
        ScriptedSource::new()
            .with_history("AIR.PA", &[])
            .with_history("AIR.PA", &[150.0, 151.5, 153.0]),
    );

    let view = dashboard(&source)
        .load_chart(
            &sym("AIR.PA"),
            TimeRange::OneDay,
            date!(2024 - 06 - 10),
            &SessionState::default(),
        )
        .await
        .expect("retry succeeds");

    assert!(view.widened);
    assert_eq!(view.range.start, date!(2024 - 06 - 09));
    assert_eq!(view.closes, vec![150.0, 151.5, 153.0]);
    assert_eq!(source.history_calls().len(), 2);
}

#[tokio::test]
async fn when_a_longer_range_is_empty_system_does_not_retry() {
    let source = Arc::new(ScriptedSource::new());

    for range in [TimeRange::OneWeek, TimeRange::OneMonth, TimeRange::OneYear] {
        let result = dashboard(&source)
            .load_chart(&sym("AAPL"), range, date!(2024 - 06 - 10), &SessionState::default())
            .await;
        assert!(matches!(result, Err(ChartError::NoData { .. })), "{range}");
    }

    assert_eq!(source.history_calls().len(), 3);
}

// =============================================================================
// Error classification
// =============================================================================

#[tokio::test]
async fn when_custom_range_is_reversed_system_rejects_it_before_fetching() {
    let source = Arc::new(ScriptedSource::new().with_history("AAPL", &[1.0, 2.0]));
    let reversed = TimeRange::Custom {
        start: date!(2024 - 05 - 01),
        end: date!(2024 - 04 - 01),
    };

    let result = dashboard(&source)
        .load_chart(&sym("AAPL"), reversed, date!(2024 - 06 - 10), &SessionState::default())
        .await;

    let err = result.expect_err("reversed range must fail");
    assert_eq!(err.code(), "chart.invalid_range");
    assert!(source.history_calls().is_empty());
}

#[tokio::test]
async fn when_the_dashboard_gets_a_reversed_range_neither_history_nor_snapshot_is_fetched() {
    // Given: a source that would answer both requests
    let source = Arc::new(
        ScriptedSource::new()
            .with_history("AAPL", &[1.0, 2.0])
            .with_snapshot(snapshot("AAPL", Some(2.0), Some(10.0))),
    );
    let reversed = TimeRange::Custom {
        start: date!(2024 - 05 - 01),
        end: date!(2024 - 04 - 01),
    };

    // When: the whole dashboard is loaded
    let result = dashboard(&source)
        .load(sym("AAPL"), reversed, date!(2024 - 06 - 10), &SessionState::default())
        .await;

    // Then: the range is rejected and the source is never called
    let err = result.expect_err("reversed range must fail");
    assert!(matches!(err, ValidationError::ReversedDateRange { .. }));
    assert!(source.history_calls().is_empty());
    assert!(source.snapshot_calls().is_empty());
}

#[tokio::test]
async fn when_transport_fails_system_reports_a_source_error_not_missing_data() {
    let source = Arc::new(
        ScriptedSource::new().with_history_error("AAPL", SourceError::unavailable("timeout")),
    );

    let err = dashboard(&source)
        .load_chart(&sym("AAPL"), TimeRange::OneDay, date!(2024 - 06 - 10), &SessionState::default())
        .await
        .expect_err("must fail");

    assert_eq!(err.code(), "chart.source");
    assert!(err.retryable());
    assert_eq!(source.history_calls().len(), 1, "errors are not retried as empty data");
}

#[tokio::test]
async fn when_only_one_bar_is_returned_the_chart_renders_without_a_price_change() {
    let source = Arc::new(ScriptedSource::new().with_history("AAPL", &[100.0]));

    let view = dashboard(&source)
        .load_chart(&sym("AAPL"), TimeRange::OneMonth, date!(2024 - 06 - 10), &SessionState::default())
        .await
        .expect("a single bar is still drawn");

    assert_eq!(view.closes, vec![100.0]);
    assert_eq!(view.moving_average, vec![None]);
    assert_eq!(view.change, None);
    assert_eq!(view.trend, None);
    assert_eq!(
        view.change_error,
        Some(MetricError::InsufficientData { points: 1 })
    );
}

// =============================================================================
// Chart payload
// =============================================================================

#[tokio::test]
async fn when_the_chart_is_built_series_are_aligned_and_ma50_starts_at_bar_fifty() {
    let closes = (1..=60).map(f64::from).collect::<Vec<_>>();
    let source = Arc::new(ScriptedSource::new().with_history("MC.PA", &closes));
    let mut session = SessionState::default();
    session.toggle_log_scale();

    let view = dashboard(&source)
        .load_chart(&sym("MC.PA"), TimeRange::SixMonths, date!(2024 - 06 - 10), &session)
        .await
        .expect("chart builds");

    assert_eq!(view.timestamps.len(), 60);
    assert_eq!(view.moving_average.len(), 60);
    assert!(view.moving_average[..49].iter().all(Option::is_none));
    assert_eq!(view.moving_average[49], Some(25.5));
    assert_eq!(view.moving_average[59], Some(35.5));
    assert_eq!(view.trend, Some(Trend::Positive));
    assert_eq!(view.change.map(|change| change.ratio), Some(59.0));
    assert_eq!(view.axis, AxisScale::Log);
    assert!(!view.widened);
}

#[tokio::test]
async fn when_prices_fall_twenty_percent_the_trend_is_negative() {
    let source = Arc::new(ScriptedSource::new().with_history("AAPL", &[100.0, 90.0, 80.0]));

    let view = dashboard(&source)
        .load_chart(&sym("AAPL"), TimeRange::OneMonth, date!(2024 - 06 - 10), &SessionState::default())
        .await
        .expect("chart builds");

    let change = view.change.expect("two closes or more");
    assert!((change.ratio + 0.20).abs() < 1e-12);
    assert_eq!(view.trend, Some(Trend::Negative));
    assert_eq!(view.axis, AxisScale::Linear);
}

// =============================================================================
// Fundamentals panel
// =============================================================================

#[tokio::test]
async fn when_the_chart_is_unavailable_the_fundamentals_panel_is_still_shown() {
    let snapshot = MarketSnapshot::new(sym("MC.PA"), UtcDateTime::now())
        .with_market_cap(Some(400.0))
        .and_then(|s| s.with_trailing_pe(Some(21.0)))
        .and_then(|s| s.with_total_revenue(Some(100.0)))
        .expect("valid snapshot");
    let source = Arc::new(ScriptedSource::new().with_snapshot(snapshot));

    let view = dashboard(&source)
        .load(sym("MC.PA"), TimeRange::OneWeek, date!(2024 - 06 - 10), &SessionState::default())
        .await
        .expect("preset range resolves");

    assert!(matches!(view.chart, ChartOutcome::Unavailable(ChartError::NoData { .. })));
    assert!(view.fundamentals.is_available());
    assert_eq!(view.fundamentals.fundamentals.market_cap_to_revenue, Some(4.0));
    assert_eq!(view.fundamentals.fundamentals.trailing_pe, Some(21.0));
}

#[tokio::test]
async fn when_the_snapshot_fails_every_fundamental_is_absent_but_the_chart_renders() {
    let source = Arc::new(
        ScriptedSource::new()
            .with_history("AAPL", &[10.0, 11.0])
            .with_snapshot_error("AAPL", SourceError::rate_limited("slow down")),
    );

    let view = dashboard(&source)
        .load(sym("AAPL"), TimeRange::OneMonth, date!(2024 - 06 - 10), &SessionState::default())
        .await
        .expect("preset range resolves");

    assert!(view.chart.view().is_some());
    assert!(!view.fundamentals.is_available());
    let panel = &view.fundamentals.fundamentals;
    assert_eq!(panel.market_cap, None);
    assert_eq!(panel.trailing_pe, None);
    assert_eq!(panel.total_revenue, None);
    assert_eq!(panel.market_cap_to_revenue, None);
}

#[tokio::test]
async fn when_revenue_is_zero_the_multiple_is_absent() {
    let snapshot = MarketSnapshot::new(sym("AAPL"), UtcDateTime::now())
        .with_market_cap(Some(1_000.0))
        .and_then(|s| s.with_total_revenue(Some(0.0)))
        .expect("valid snapshot");
    let source = Arc::new(ScriptedSource::new().with_snapshot(snapshot));

    let panel = dashboard(&source).load_fundamentals(&sym("AAPL")).await;

    assert!(panel.is_available());
    assert_eq!(panel.fundamentals.market_cap, Some(1_000.0));
    assert_eq!(panel.fundamentals.market_cap_to_revenue, None);
}

// =============================================================================
// Session cache
// =============================================================================

#[tokio::test]
async fn when_the_same_history_is_requested_twice_the_cache_serves_the_second() {
    let inner = Arc::new(ScriptedSource::new().with_history("AAPL", &[1.0, 2.0, 3.0]));
    let cached = CachedSource::new(
        Arc::clone(&inner) as Arc<dyn MarketDataSource>,
        Duration::from_secs(60),
    );
    let request = HistoryRequest::new(
        sym("AAPL"),
        date!(2024 - 01 - 01),
        date!(2024 - 02 - 01),
        Interval::OneDay,
    )
    .expect("valid request");

    let first = cached.history(request.clone()).await.expect("fetch");
    let second = cached.history(request.clone()).await.expect("cached");
    assert_eq!(first, second);
    assert_eq!(inner.history_calls().len(), 1);

    let other_interval = HistoryRequest {
        interval: Interval::ThirtyMinutes,
        ..request
    };
    cached.history(other_interval).await.expect("fetch");
    assert_eq!(inner.history_calls().len(), 2);

    let stats = cached.stats();
    assert_eq!((stats.hits, stats.misses), (1, 2));
}

#[tokio::test]
async fn when_a_fetch_fails_the_cache_does_not_remember_it() {
    let inner = Arc::new(
        ScriptedSource::new()
            .with_history_error("AAPL", SourceError::unavailable("down"))
            .with_history("AAPL", &[5.0, 6.0]),
    );
    let cached = CachedSource::new(
        Arc::clone(&inner) as Arc<dyn MarketDataSource>,
        Duration::from_secs(60),
    );
    let request = HistoryRequest::new(
        sym("AAPL"),
        date!(2024 - 01 - 01),
        date!(2024 - 02 - 01),
        Interval::OneDay,
    )
    .expect("valid request");

    assert!(cached.history(request.clone()).await.is_err());
    let series = cached.history(request).await.expect("second attempt fetches again");
    assert_eq!(series.closes(), vec![5.0, 6.0]);
    assert_eq!(inner.history_calls().len(), 2);
}

// =============================================================================
// Synthetic source end to end
// =============================================================================

#[tokio::test]
async fn when_the_synthetic_source_has_no_weekend_session_one_day_falls_back_a_day() {
    let source = Arc::new(SyntheticSource::new(date!(2024 - 06 - 09)));
    let dashboard = Dashboard::new(source);

    // Saturday is empty, the widened window reaches Friday's session.
    let saturday = dashboard
        .load_chart(&sym("MC.PA"), TimeRange::OneDay, date!(2024 - 06 - 08), &SessionState::default())
        .await
        .expect("friday session is found");
    assert!(saturday.widened);
    assert_eq!(saturday.len(), 390);

    // Sunday widens onto Saturday and stays empty.
    let sunday = dashboard
        .load_chart(&sym("MC.PA"), TimeRange::OneDay, date!(2024 - 06 - 09), &SessionState::default())
        .await;
    assert!(matches!(sunday, Err(ChartError::NoData { .. })));
}
