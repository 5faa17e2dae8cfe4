//! Market data source adapters.
//!
//! | Adapter | Provider | Notes |
//! |---------|----------|-------|
//! | [`YahooAdapter`] | Yahoo Finance | chart v8 for history, quoteSummary v10 for snapshots |
//! | [`SyntheticSource`] | offline | deterministic prices for demos and tests |

mod synthetic;
mod yahoo;

pub use synthetic::SyntheticSource;
pub use yahoo::{YahooAdapter, YahooSession};
