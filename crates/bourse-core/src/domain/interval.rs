use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::Duration;

use crate::ValidationError;

/// Sampling interval requested from the data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    #[serde(rename = "1m")]
    OneMinute,
    #[serde(rename = "30m")]
    ThirtyMinutes,
    #[serde(rename = "1d")]
    OneDay,
}

impl Interval {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OneMinute => "1m",
            Self::ThirtyMinutes => "30m",
            Self::OneDay => "1d",
        }
    }

    pub fn duration(self) -> Duration {
        match self {
            Self::OneMinute => Duration::minutes(1),
            Self::ThirtyMinutes => Duration::minutes(30),
            Self::OneDay => Duration::days(1),
        }
    }
}

impl Display for Interval {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "1m" => Ok(Self::OneMinute),
            "30m" => Ok(Self::ThirtyMinutes),
            "1d" => Ok(Self::OneDay),
            other => Err(ValidationError::InvalidInterval {
                value: other.to_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_interval() {
        let interval = Interval::from_str("30m").expect("must parse");
        assert_eq!(interval, Interval::ThirtyMinutes);
    }

    #[test]
    fn rejects_unsupported_interval() {
        let err = Interval::from_str("1h").expect_err("must fail");
        assert!(matches!(err, ValidationError::InvalidInterval { .. }));
    }
}
