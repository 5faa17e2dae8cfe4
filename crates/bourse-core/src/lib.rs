//! # Bourse Core
//!
//! Market-data plumbing behind the `bourse` stock dashboard.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`range`] | Symbolic time ranges resolved into `(start, end, interval)` |
//! | [`metrics`] | Price change, trend, moving average, revenue multiple |
//! | [`dashboard`] | Chart payload and fundamentals panel for one ticker |
//! | [`ranker`] | Market-cap variation ranking over a universe |
//! | [`universe`] | CAC40 and S&P constituent lists |
//! | [`data_source`] | Data source trait and request types |
//! | [`adapters`] | Yahoo Finance and synthetic sources |
//! | [`cache`] | Session cache decorator |
//! | [`config`] | Environment settings |
//! | [`envelope`] | Response envelope with metadata |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use bourse_core::{Dashboard, SessionState, SyntheticSource, Symbol, TimeRange};
//!
//! let today = bourse_core::domain::calendar::today_utc();
//! let dashboard = Dashboard::new(Arc::new(SyntheticSource::new(today)));
//! let view = dashboard
//!     .load(Symbol::parse("MC.PA")?, TimeRange::SixMonths, today, &SessionState::default())
//!     .await?;
//! ```

pub mod adapters;
pub mod cache;
pub mod config;
pub mod dashboard;
pub mod data_source;
pub mod domain;
pub mod envelope;
pub mod error;
pub mod http_client;
pub mod metrics;
pub mod range;
pub mod ranker;
pub mod source;
pub mod universe;

pub use adapters::{SyntheticSource, YahooAdapter};
pub use cache::{CacheStats, CacheStore, CachedSource};
pub use config::Settings;
pub use dashboard::{
    AxisScale, ChartError, ChartOutcome, ChartView, Dashboard, DashboardView, FundamentalsPanel,
    SessionState,
};
pub use data_source::{HistoryRequest, MarketDataSource, SourceError, SourceErrorKind, SourceFuture};
pub use domain::{Bar, FundamentalsSnapshot, Interval, MarketSnapshot, PriceSeries, Symbol, UtcDateTime};
pub use envelope::{Envelope, EnvelopeError, EnvelopeMeta};
pub use error::{CoreError, ValidationError};
pub use http_client::{HttpAuth, HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient};
pub use metrics::{MetricError, PriceChange, Trend};
pub use range::{ResolvedRange, TimeRange, VariationPeriod};
pub use ranker::{RankProgress, RankingReport, SkipReason, SkippedTicker, VariationRanker, VariationRecord};
pub use source::ProviderId;
pub use universe::{Market, Universe};
