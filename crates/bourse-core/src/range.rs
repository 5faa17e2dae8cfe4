//! Time-range resolution.
//!
//! Maps a symbolic range picked by the user, plus "today", into the concrete
//! `(start, end, interval)` triple sent to the data source.
//!
//! | Tag | start | end | interval |
//! |-----|-------|-----|----------|
//! | `1d` | today | today + 1 | 1m |
//! | `1w` | today − 7 | today + 1 | 30m |
//! | `1m` | today − 30 | today + 1 | 1d |
//! | `6m` | today − 182 | today + 1 | 1d |
//! | `1y` | today − 365 | today + 1 | 1d |
//! | `5y` | today − 1825 | today + 1 | 1d |
//! | `25y` | today − 9125 | today + 1 | 1d |
//! | `custom` | start | end | 1d |

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::Date;

use crate::domain::calendar::{format_date, iso_date, shift_days};
use crate::{Interval, ValidationError};

/// Default look-back of a custom range when the user has not picked dates yet.
pub const DEFAULT_CUSTOM_LOOKBACK_DAYS: i64 = 365;

/// Symbolic chart range selected by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeRange {
    OneDay,
    OneWeek,
    OneMonth,
    SixMonths,
    OneYear,
    FiveYears,
    TwentyFiveYears,
    Custom { start: Date, end: Date },
}

/// Concrete query parameters derived from a [`TimeRange`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolvedRange {
    #[serde(with = "iso_date")]
    pub start: Date,
    #[serde(with = "iso_date")]
    pub end: Date,
    pub interval: Interval,
}

impl ResolvedRange {
    /// Same window with the start moved `days` earlier.
    pub fn extend_back(self, days: i64) -> Result<Self, ValidationError> {
        Ok(Self {
            start: shift_days(self.start, -days)?,
            ..self
        })
    }
}

impl TimeRange {
    pub const PRESETS: [Self; 7] = [
        Self::OneDay,
        Self::OneWeek,
        Self::OneMonth,
        Self::SixMonths,
        Self::OneYear,
        Self::FiveYears,
        Self::TwentyFiveYears,
    ];

    /// Custom range, rejected when `end` precedes `start`.
    pub fn custom(start: Date, end: Date) -> Result<Self, ValidationError> {
        if end < start {
            return Err(ValidationError::ReversedDateRange {
                start: format_date(start),
                end: format_date(end),
            });
        }
        Ok(Self::Custom { start, end })
    }

    /// Custom range covering the last year up to `today`.
    pub fn default_custom(today: Date) -> Result<Self, ValidationError> {
        Self::custom(shift_days(today, -DEFAULT_CUSTOM_LOOKBACK_DAYS)?, today)
    }

    pub const fn tag(self) -> &'static str {
        match self {
            Self::OneDay => "1d",
            Self::OneWeek => "1w",
            Self::OneMonth => "1m",
            Self::SixMonths => "6m",
            Self::OneYear => "1y",
            Self::FiveYears => "5y",
            Self::TwentyFiveYears => "25y",
            Self::Custom { .. } => "custom",
        }
    }

    /// Days between the range start and today, for preset ranges.
    pub const fn lookback_days(self) -> Option<i64> {
        match self {
            Self::OneDay => Some(0),
            Self::OneWeek => Some(7),
            Self::OneMonth => Some(30),
            Self::SixMonths => Some(182),
            Self::OneYear => Some(365),
            Self::FiveYears => Some(5 * 365),
            Self::TwentyFiveYears => Some(25 * 365),
            Self::Custom { .. } => None,
        }
    }

    pub const fn interval(self) -> Interval {
        match self {
            Self::OneDay => Interval::OneMinute,
            Self::OneWeek => Interval::ThirtyMinutes,
            _ => Interval::OneDay,
        }
    }

    /// Only the one-day range retries once with an earlier start when empty.
    pub const fn retries_when_empty(self) -> bool {
        matches!(self, Self::OneDay)
    }

    pub fn resolve(self, today: Date) -> Result<ResolvedRange, ValidationError> {
        let interval = self.interval();
        match self {
            Self::Custom { start, end } => {
                if end < start {
                    return Err(ValidationError::ReversedDateRange {
                        start: format_date(start),
                        end: format_date(end),
                    });
                }
                Ok(ResolvedRange {
                    start,
                    end,
                    interval,
                })
            }
            preset => {
                let lookback = preset.lookback_days().unwrap_or_default();
                Ok(ResolvedRange {
                    start: shift_days(today, -lookback)?,
                    end: shift_days(today, 1)?,
                    interval,
                })
            }
        }
    }
}

impl Display for TimeRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Custom { start, end } => {
                write!(f, "custom:{}..{}", format_date(*start), format_date(*end))
            }
            other => f.write_str(other.tag()),
        }
    }
}

impl FromStr for TimeRange {
    type Err = ValidationError;

    /// Parses a preset tag. `custom` needs explicit dates and goes through
    /// [`TimeRange::custom`] instead.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "1d" | "1j" => Ok(Self::OneDay),
            "1w" | "1s" => Ok(Self::OneWeek),
            "1m" => Ok(Self::OneMonth),
            "6m" => Ok(Self::SixMonths),
            "1y" => Ok(Self::OneYear),
            "5y" => Ok(Self::FiveYears),
            "25y" => Ok(Self::TwentyFiveYears),
            "custom" => Err(ValidationError::IncompleteCustomRange),
            other => Err(ValidationError::InvalidTimeRange {
                value: other.to_owned(),
            }),
        }
    }
}

/// Window over which the ranker measures market-cap variation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VariationPeriod {
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "1w")]
    OneWeek,
    #[serde(rename = "1m")]
    OneMonth,
    #[serde(rename = "6m")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
}

impl VariationPeriod {
    pub const fn as_str(self) -> &'static str {
        self.time_range().tag()
    }

    pub const fn time_range(self) -> TimeRange {
        match self {
            Self::OneDay => TimeRange::OneDay,
            Self::OneWeek => TimeRange::OneWeek,
            Self::OneMonth => TimeRange::OneMonth,
            Self::SixMonths => TimeRange::SixMonths,
            Self::OneYear => TimeRange::OneYear,
        }
    }

    /// Date of the former close the variation is measured against.
    ///
    /// Shares the chart lookbacks, except that one day looks back to the
    /// previous session instead of today.
    pub fn start_date(self, today: Date) -> Result<Date, ValidationError> {
        let lookback = match self {
            Self::OneDay => 1,
            other => other.time_range().lookback_days().unwrap_or(1),
        };
        shift_days(today, -lookback)
    }

    /// Daily window `[start, today)` queried for the former close.
    pub fn history_window(self, today: Date) -> Result<ResolvedRange, ValidationError> {
        Ok(ResolvedRange {
            start: self.start_date(today)?,
            end: today,
            interval: Interval::OneDay,
        })
    }
}

impl Display for VariationPeriod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VariationPeriod {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match TimeRange::from_str(value) {
            Ok(TimeRange::OneDay) => Ok(Self::OneDay),
            Ok(TimeRange::OneWeek) => Ok(Self::OneWeek),
            Ok(TimeRange::OneMonth) => Ok(Self::OneMonth),
            Ok(TimeRange::SixMonths) => Ok(Self::SixMonths),
            Ok(TimeRange::OneYear) => Ok(Self::OneYear),
            _ => Err(ValidationError::InvalidVariationPeriod {
                value: value.trim().to_owned(),
            }),
        }
    }
}
