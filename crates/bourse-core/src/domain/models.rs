use serde::{Deserialize, Serialize};
use time::Date;

use crate::domain::calendar::iso_date;
use crate::metrics;
use crate::{Interval, Symbol, UtcDateTime, ValidationError};

/// OHLCV bar record for a given interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub ts: UtcDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: Option<u64>,
}

impl Bar {
    pub fn new(
        ts: UtcDateTime,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: Option<u64>,
    ) -> Result<Self, ValidationError> {
        validate_non_negative("open", open)?;
        validate_non_negative("high", high)?;
        validate_non_negative("low", low)?;
        validate_non_negative("close", close)?;

        if high < low {
            return Err(ValidationError::InvalidBarRange);
        }

        if open < low || open > high || close < low || close > high {
            return Err(ValidationError::InvalidBarBounds);
        }

        Ok(Self {
            ts,
            open,
            high,
            low,
            close,
            volume,
        })
    }
}

/// Historical bars for one ticker over one resolved date range.
///
/// Bars are kept in ascending timestamp order regardless of the order the
/// source delivered them in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub symbol: Symbol,
    pub interval: Interval,
    #[serde(with = "iso_date")]
    pub start: Date,
    #[serde(with = "iso_date")]
    pub end: Date,
    pub bars: Vec<Bar>,
}

impl PriceSeries {
    pub fn new(symbol: Symbol, interval: Interval, start: Date, end: Date, mut bars: Vec<Bar>) -> Self {
        bars.sort_by_key(|bar| bar.ts);
        Self {
            symbol,
            interval,
            start,
            end,
            bars,
        }
    }

    pub fn empty(symbol: Symbol, interval: Interval, start: Date, end: Date) -> Self {
        Self::new(symbol, interval, start, end, Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|bar| bar.close).collect()
    }

    pub fn timestamps(&self) -> Vec<UtcDateTime> {
        self.bars.iter().map(|bar| bar.ts).collect()
    }

    pub fn first_close(&self) -> Option<f64> {
        self.bars.first().map(|bar| bar.close)
    }

    pub fn last_close(&self) -> Option<f64> {
        self.bars.last().map(|bar| bar.close)
    }

    /// Trailing simple moving average of the close, aligned with `bars`.
    pub fn moving_average(&self, window: usize) -> Vec<Option<f64>> {
        metrics::moving_average(&self.closes(), window)
    }
}

/// Raw point-in-time attributes reported by a data source for one ticker.
///
/// Every field is optional: sources routinely omit some of them, and callers
/// decide per field what a gap means.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub symbol: Symbol,
    pub as_of: UtcDateTime,
    pub market_cap: Option<f64>,
    pub trailing_pe: Option<f64>,
    pub total_revenue: Option<f64>,
    pub shares_outstanding: Option<f64>,
    pub regular_market_price: Option<f64>,
    pub currency: Option<String>,
}

impl MarketSnapshot {
    pub fn new(symbol: Symbol, as_of: UtcDateTime) -> Self {
        Self {
            symbol,
            as_of,
            market_cap: None,
            trailing_pe: None,
            total_revenue: None,
            shares_outstanding: None,
            regular_market_price: None,
            currency: None,
        }
    }

    pub fn with_market_cap(mut self, value: Option<f64>) -> Result<Self, ValidationError> {
        validate_optional_non_negative("market_cap", value)?;
        self.market_cap = value;
        Ok(self)
    }

    pub fn with_trailing_pe(mut self, value: Option<f64>) -> Result<Self, ValidationError> {
        validate_optional_finite("trailing_pe", value)?;
        self.trailing_pe = value;
        Ok(self)
    }

    pub fn with_total_revenue(mut self, value: Option<f64>) -> Result<Self, ValidationError> {
        validate_optional_finite("total_revenue", value)?;
        self.total_revenue = value;
        Ok(self)
    }

    pub fn with_shares_outstanding(mut self, value: Option<f64>) -> Result<Self, ValidationError> {
        validate_optional_non_negative("shares_outstanding", value)?;
        self.shares_outstanding = value;
        Ok(self)
    }

    pub fn with_regular_market_price(
        mut self,
        value: Option<f64>,
    ) -> Result<Self, ValidationError> {
        validate_optional_non_negative("regular_market_price", value)?;
        self.regular_market_price = value;
        Ok(self)
    }

    pub fn with_currency(mut self, value: Option<String>) -> Self {
        self.currency = value.map(|currency| currency.trim().to_ascii_uppercase());
        self
    }
}

/// Fundamentals shown next to the chart, with the derived revenue multiple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundamentalsSnapshot {
    pub symbol: Symbol,
    pub market_cap: Option<f64>,
    pub trailing_pe: Option<f64>,
    pub total_revenue: Option<f64>,
    pub market_cap_to_revenue: Option<f64>,
}

impl FundamentalsSnapshot {
    pub fn new(
        symbol: Symbol,
        market_cap: Option<f64>,
        trailing_pe: Option<f64>,
        total_revenue: Option<f64>,
    ) -> Self {
        Self {
            symbol,
            market_cap,
            trailing_pe,
            total_revenue,
            market_cap_to_revenue: metrics::market_cap_to_revenue(market_cap, total_revenue),
        }
    }

    /// Panel with every field absent, rendered as placeholders.
    pub fn unavailable(symbol: Symbol) -> Self {
        Self::new(symbol, None, None, None)
    }
}

impl From<&MarketSnapshot> for FundamentalsSnapshot {
    fn from(snapshot: &MarketSnapshot) -> Self {
        Self::new(
            snapshot.symbol.clone(),
            snapshot.market_cap,
            snapshot.trailing_pe,
            snapshot.total_revenue,
        )
    }
}

fn validate_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    if value < 0.0 {
        return Err(ValidationError::NegativeValue { field });
    }
    Ok(())
}

fn validate_optional_non_negative(
    field: &'static str,
    value: Option<f64>,
) -> Result<(), ValidationError> {
    if let Some(value) = value {
        validate_non_negative(field, value)?;
    }
    Ok(())
}

fn validate_optional_finite(
    field: &'static str,
    value: Option<f64>,
) -> Result<(), ValidationError> {
    if let Some(value) = value {
        if !value.is_finite() {
            return Err(ValidationError::NonFiniteValue { field });
        }
    }
    Ok(())
}
