//! Primary-ticker flow: chart payload plus fundamentals panel.
//!
//! The chart and the fundamentals are fetched independently. A chart that
//! cannot be built never hides the panel, and a panel whose snapshot failed
//! still renders with every field absent. A malformed range is rejected
//! before either fetch starts.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::Date;

use crate::data_source::{HistoryRequest, MarketDataSource, SourceError};
use crate::metrics::{self, MetricError, PriceChange, Trend, MA_WINDOW};
use crate::range::{ResolvedRange, TimeRange};
use crate::{FundamentalsSnapshot, PriceSeries, Symbol, UtcDateTime, ValidationError};

/// Y-axis scale of the price chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisScale {
    #[default]
    Linear,
    Log,
}

/// Per-session presentation state, passed explicitly into chart building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionState {
    pub log_scale: bool,
}

impl SessionState {
    pub fn toggle_log_scale(&mut self) {
        self.log_scale = !self.log_scale;
    }

    pub const fn axis_scale(&self) -> AxisScale {
        if self.log_scale {
            AxisScale::Log
        } else {
            AxisScale::Linear
        }
    }
}

/// Display-ready chart payload. The three sequences are index-aligned.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartView {
    pub symbol: Symbol,
    pub range_tag: &'static str,
    pub range: ResolvedRange,
    pub timestamps: Vec<UtcDateTime>,
    pub closes: Vec<f64>,
    pub moving_average: Vec<Option<f64>>,
    /// `None` when the series has a single bar or starts at zero.
    pub change: Option<PriceChange>,
    pub trend: Option<Trend>,
    #[serde(skip)]
    pub change_error: Option<MetricError>,
    pub axis: AxisScale,
    /// Set when the one-day window came back empty and was widened.
    pub widened: bool,
}

impl ChartView {
    fn build(
        series: &PriceSeries,
        range_tag: &'static str,
        range: ResolvedRange,
        session: &SessionState,
        widened: bool,
    ) -> Self {
        let closes = series.closes();
        let (change, change_error) = match metrics::change_between_closes(&closes) {
            Ok(change) => (Some(change), None),
            Err(error) => (None, Some(error)),
        };
        Self {
            symbol: series.symbol.clone(),
            range_tag,
            range,
            timestamps: series.timestamps(),
            moving_average: series.moving_average(MA_WINDOW),
            closes,
            trend: change.map(|change| change.trend),
            change,
            change_error,
            axis: session.axis_scale(),
            widened,
        }
    }

    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }
}

/// Why no chart could be drawn.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ChartError {
    #[error("invalid range: {0}")]
    InvalidRange(#[from] ValidationError),
    #[error("no data for {symbol} over the selected range")]
    NoData { symbol: Symbol },
    #[error("data source failed: {0}")]
    Source(#[from] SourceError),
}

impl ChartError {
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidRange(_) => "chart.invalid_range",
            Self::NoData { .. } => "chart.no_data",
            Self::Source(_) => "chart.source",
        }
    }

    pub fn retryable(&self) -> bool {
        match self {
            Self::Source(error) => error.retryable(),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChartOutcome {
    Ready(ChartView),
    Unavailable(ChartError),
}

impl ChartOutcome {
    pub fn view(&self) -> Option<&ChartView> {
        match self {
            Self::Ready(view) => Some(view),
            Self::Unavailable(_) => None,
        }
    }

    pub fn error(&self) -> Option<&ChartError> {
        match self {
            Self::Ready(_) => None,
            Self::Unavailable(error) => Some(error),
        }
    }
}

impl From<Result<ChartView, ChartError>> for ChartOutcome {
    fn from(result: Result<ChartView, ChartError>) -> Self {
        match result {
            Ok(view) => Self::Ready(view),
            Err(error) => Self::Unavailable(error),
        }
    }
}

/// Fundamentals shown next to the chart.
#[derive(Debug, Clone, PartialEq)]
pub struct FundamentalsPanel {
    pub fundamentals: FundamentalsSnapshot,
    /// Snapshot failure that left every field absent.
    pub error: Option<SourceError>,
}

impl FundamentalsPanel {
    pub fn is_available(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub symbol: Symbol,
    pub chart: ChartOutcome,
    pub fundamentals: FundamentalsPanel,
}

/// Builds dashboard views against one data source.
#[derive(Clone)]
pub struct Dashboard {
    source: Arc<dyn MarketDataSource>,
}

impl Dashboard {
    pub fn new(source: Arc<dyn MarketDataSource>) -> Self {
        Self { source }
    }

    /// Loads the chart and the fundamentals panel concurrently.
    ///
    /// The range is resolved first; a malformed one fails here and neither
    /// the history nor the snapshot is requested.
    pub async fn load(
        &self,
        symbol: Symbol,
        range: TimeRange,
        today: Date,
        session: &SessionState,
    ) -> Result<DashboardView, ValidationError> {
        let resolved = range.resolve(today)?;
        let (chart, fundamentals) = tokio::join!(
            self.chart_for(&symbol, range, resolved, session),
            self.load_fundamentals(&symbol)
        );

        Ok(DashboardView {
            symbol,
            chart: chart.into(),
            fundamentals,
        })
    }

    /// Resolves `range`, fetches the bars and builds the chart payload.
    ///
    /// A reversed custom range fails before the source is called. An empty
    /// one-day window is retried exactly once with the start moved a day
    /// earlier.
    pub async fn load_chart(
        &self,
        symbol: &Symbol,
        range: TimeRange,
        today: Date,
        session: &SessionState,
    ) -> Result<ChartView, ChartError> {
        let resolved = range.resolve(today)?;
        self.chart_for(symbol, range, resolved, session).await
    }

    async fn chart_for(
        &self,
        symbol: &Symbol,
        range: TimeRange,
        resolved: ResolvedRange,
        session: &SessionState,
    ) -> Result<ChartView, ChartError> {
        let series = self.fetch(symbol, resolved).await?;

        if !series.is_empty() {
            return Ok(ChartView::build(&series, range.tag(), resolved, session, false));
        }
        if !range.retries_when_empty() {
            return Err(ChartError::NoData {
                symbol: symbol.clone(),
            });
        }

        let widened = resolved.extend_back(1)?;
        tracing::warn!(
            %symbol,
            start = %widened.start,
            "one-day window empty, retrying from the previous day"
        );
        let series = self.fetch(symbol, widened).await?;
        if series.is_empty() {
            return Err(ChartError::NoData {
                symbol: symbol.clone(),
            });
        }
        Ok(ChartView::build(&series, range.tag(), widened, session, true))
    }

    /// Fetches the snapshot; a failure yields a panel with every field absent.
    pub async fn load_fundamentals(&self, symbol: &Symbol) -> FundamentalsPanel {
        match self.source.snapshot(symbol.clone()).await {
            Ok(snapshot) => FundamentalsPanel {
                fundamentals: FundamentalsSnapshot::from(&snapshot),
                error: None,
            },
            Err(error) => {
                tracing::warn!(%symbol, %error, "fundamentals unavailable");
                FundamentalsPanel {
                    fundamentals: FundamentalsSnapshot::unavailable(symbol.clone()),
                    error: Some(error),
                }
            }
        }
    }

    async fn fetch(
        &self,
        symbol: &Symbol,
        range: ResolvedRange,
    ) -> Result<PriceSeries, ChartError> {
        let request = HistoryRequest::for_range(symbol.clone(), range)?;
        tracing::debug!(
            %symbol,
            start = %range.start,
            end = %range.end,
            interval = %range.interval,
            "fetching chart history"
        );
        Ok(self.source.history(request).await?)
    }
}
