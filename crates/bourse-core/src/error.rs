use thiserror::Error;

/// Validation and contract errors exposed by `bourse-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("symbol must start with an ASCII letter: '{ch}'")]
    SymbolInvalidStart { ch: char },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },

    #[error("invalid interval '{value}', expected one of 1m, 30m, 1d")]
    InvalidInterval { value: String },
    #[error("invalid time range '{value}', expected one of 1d, 1w, 1m, 6m, 1y, 5y, 25y, custom")]
    InvalidTimeRange { value: String },
    #[error("invalid variation period '{value}', expected one of 1d, 1w, 1m, 6m, 1y")]
    InvalidVariationPeriod { value: String },
    #[error("invalid market '{value}', expected one of cac40, sp500")]
    InvalidMarket { value: String },
    #[error("invalid source '{value}', expected one of yahoo, synthetic")]
    InvalidSource { value: String },

    #[error("date must be formatted as YYYY-MM-DD: '{value}'")]
    InvalidDate { value: String },
    #[error("custom range end {end} is before start {start}")]
    ReversedDateRange { start: String, end: String },
    #[error("custom range requires both a start and an end date")]
    IncompleteCustomRange,
    #[error("date arithmetic overflowed the supported calendar")]
    DateOutOfRange,

    #[error("timestamp must be RFC3339 UTC (suffix Z): '{value}'")]
    TimestampNotUtc { value: String },

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("field '{field}' must be non-negative")]
    NegativeValue { field: &'static str },

    #[error("bar high must be >= low")]
    InvalidBarRange,
    #[error("bar open/close must be within high/low range")]
    InvalidBarBounds,

    #[error("request_id must be at least 8 characters")]
    InvalidRequestId,
    #[error("trace_id must be 32 hex characters")]
    InvalidTraceId,
    #[error("schema_version must match vMAJOR.MINOR.PATCH: '{value}'")]
    InvalidSchemaVersion { value: String },
    #[error("source_chain must contain at least one source")]
    EmptySourceChain,

    #[error("error code cannot be empty")]
    EmptyErrorCode,
    #[error("error message cannot be empty")]
    EmptyErrorMessage,
}

/// Top-level error type for core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to read universe file: {0}")]
    Io(#[from] std::io::Error),
}
