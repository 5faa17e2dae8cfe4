//! Machine-readable response envelope shared by every CLI command.

use serde::{Deserialize, Serialize};

use crate::dashboard::ChartError;
use crate::data_source::SourceError;
use crate::{ProviderId, UtcDateTime, ValidationError};

pub const SCHEMA_VERSION: &str = "v1.0.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub meta: EnvelopeMeta,
    pub data: T,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<EnvelopeError>,
}

impl<T> Envelope<T> {
    pub fn new(meta: EnvelopeMeta, data: T) -> Self {
        Self {
            meta,
            data,
            errors: Vec::new(),
        }
    }

    pub fn push_error(&mut self, error: EnvelopeError) -> Result<(), ValidationError> {
        error.validate()?;
        self.errors.push(error);
        Ok(())
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.meta.warnings.is_empty()
    }
}

/// Metadata attached to every envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeMeta {
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    pub schema_version: String,
    pub command: String,
    pub generated_at: UtcDateTime,
    pub source_chain: Vec<ProviderId>,
    pub latency_ms: u64,
    pub cache_hit: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl EnvelopeMeta {
    pub fn new(
        request_id: impl Into<String>,
        command: impl Into<String>,
        source_chain: Vec<ProviderId>,
    ) -> Result<Self, ValidationError> {
        let meta = Self {
            request_id: request_id.into(),
            trace_id: None,
            schema_version: String::from(SCHEMA_VERSION),
            command: command.into(),
            generated_at: UtcDateTime::now(),
            source_chain,
            latency_ms: 0,
            cache_hit: false,
            warnings: Vec::new(),
        };
        meta.validate()?;
        Ok(meta)
    }

    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Result<Self, ValidationError> {
        let trace_id = trace_id.into();
        if !is_valid_trace_id(&trace_id) {
            return Err(ValidationError::InvalidTraceId);
        }
        self.trace_id = Some(trace_id);
        Ok(self)
    }

    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    pub fn with_cache_hit(mut self, cache_hit: bool) -> Self {
        self.cache_hit = cache_hit;
        self
    }

    pub fn push_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.request_id.trim().len() < 8 {
            return Err(ValidationError::InvalidRequestId);
        }
        if self
            .trace_id
            .as_deref()
            .is_some_and(|trace_id| !is_valid_trace_id(trace_id))
        {
            return Err(ValidationError::InvalidTraceId);
        }
        if !is_valid_schema_version(&self.schema_version) {
            return Err(ValidationError::InvalidSchemaVersion {
                value: self.schema_version.clone(),
            });
        }
        if self.source_chain.is_empty() {
            return Err(ValidationError::EmptySourceChain);
        }
        Ok(())
    }
}

/// Structured error attached to a partial or failed response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retryable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
}

impl EnvelopeError {
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let error = Self {
            code: code.into(),
            message: message.into(),
            retryable: None,
            symbol: None,
        };
        error.validate()?;
        Ok(error)
    }

    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = Some(retryable);
        self
    }

    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.code.trim().is_empty() {
            return Err(ValidationError::EmptyErrorCode);
        }
        if self.message.trim().is_empty() {
            return Err(ValidationError::EmptyErrorMessage);
        }
        Ok(())
    }
}

impl From<&ChartError> for EnvelopeError {
    fn from(error: &ChartError) -> Self {
        Self {
            code: error.code().to_owned(),
            message: error.to_string(),
            retryable: Some(error.retryable()),
            symbol: None,
        }
    }
}

impl From<&SourceError> for EnvelopeError {
    fn from(error: &SourceError) -> Self {
        Self {
            code: error.code().to_owned(),
            message: error.message().to_owned(),
            retryable: Some(error.retryable()),
            symbol: None,
        }
    }
}

fn is_valid_schema_version(value: &str) -> bool {
    value
        .strip_prefix('v')
        .map(|version| version.split('.').collect::<Vec<_>>())
        .is_some_and(|parts| {
            parts.len() == 3
                && parts
                    .iter()
                    .all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()))
        })
}

fn is_valid_trace_id(value: &str) -> bool {
    value.len() == 32
        && value.bytes().all(|b| b.is_ascii_hexdigit())
        && value.bytes().any(|b| b != b'0')
}
