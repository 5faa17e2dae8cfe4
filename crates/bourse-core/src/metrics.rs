//! Arithmetic on price series and fundamentals.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::PriceSeries;

/// Window of the moving-average overlay drawn on the chart.
pub const MA_WINDOW: usize = 50;

/// Why a derived metric is undefined for the given input.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MetricError {
    #[error("price change needs at least 2 points, got {points}")]
    InsufficientData { points: usize },
    #[error("price change is undefined when the first close is zero")]
    ZeroBaseline,
}

/// Direction of a move, used only to tag presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Positive,
    Negative,
}

impl Trend {
    /// Flat moves count as positive.
    pub fn classify(first: f64, last: f64) -> Self {
        if last >= first {
            Self::Positive
        } else {
            Self::Negative
        }
    }

    pub fn of_sign(value: f64) -> Self {
        Self::classify(0.0, value)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
        }
    }

    pub const fn marker(self) -> char {
        match self {
            Self::Positive => '+',
            Self::Negative => '-',
        }
    }
}

impl Display for Trend {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relative move between the first and last close of a series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceChange {
    pub first_close: f64,
    pub last_close: f64,
    /// Fractional change, `-0.2` for a 20% drop.
    pub ratio: f64,
    pub trend: Trend,
}

/// `(last - first) / first` over the series closes.
pub fn price_change(series: &PriceSeries) -> Result<PriceChange, MetricError> {
    change_between_closes(&series.closes())
}

pub fn change_between_closes(closes: &[f64]) -> Result<PriceChange, MetricError> {
    let (first_close, last_close) = match closes {
        [first, .., last] => (*first, *last),
        _ => {
            return Err(MetricError::InsufficientData {
                points: closes.len(),
            })
        }
    };

    if first_close == 0.0 {
        return Err(MetricError::ZeroBaseline);
    }

    Ok(PriceChange {
        first_close,
        last_close,
        ratio: (last_close - first_close) / first_close,
        trend: Trend::classify(first_close, last_close),
    })
}

/// Market cap divided by revenue, absent unless both exist and revenue is non-zero.
pub fn market_cap_to_revenue(market_cap: Option<f64>, revenue: Option<f64>) -> Option<f64> {
    match (market_cap, revenue) {
        (Some(cap), Some(revenue)) if revenue != 0.0 => Some(cap / revenue),
        _ => None,
    }
}

/// Trailing simple moving average aligned with `values`.
///
/// Entry `i` averages `values[i + 1 - window..=i]` and is `None` until a full
/// window is available.
pub fn moving_average(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }

    let mut output = Vec::with_capacity(values.len());
    let mut sum = 0.0;
    for (index, value) in values.iter().enumerate() {
        sum += value;
        if index >= window {
            sum -= values[index - window];
        }
        if index + 1 >= window {
            output.push(Some(sum / window as f64));
        } else {
            output.push(None);
        }
    }
    output
}
