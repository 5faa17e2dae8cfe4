//! # Domain Models
//!
//! Canonical domain types for bourse market data.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Symbol`] | Validated ticker |
//! | [`Interval`] | Sampling interval (1m, 30m, 1d) |
//! | [`UtcDateTime`] | UTC timestamp |
//! | [`Bar`] | OHLCV bar with timestamp |
//! | [`PriceSeries`] | Ordered bars for a ticker over a resolved range |
//! | [`MarketSnapshot`] | Point-in-time attributes reported by a source |
//! | [`FundamentalsSnapshot`] | Fundamentals panel with derived revenue multiple |
//!
//! All types validate their invariants at construction time and serialize
//! with serde for the CLI envelopes.

pub mod calendar;
mod interval;
mod models;
mod symbol;
mod timestamp;

pub use interval::Interval;
pub use models::{Bar, FundamentalsSnapshot, MarketSnapshot, PriceSeries};
pub use symbol::Symbol;
pub use timestamp::UtcDateTime;
