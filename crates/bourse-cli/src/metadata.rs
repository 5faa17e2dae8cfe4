use std::fmt::{Display, Formatter};

use bourse_core::{EnvelopeMeta, ProviderId, ValidationError};
use uuid::Uuid;

/// Request identifier (UUID v4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// 16-byte hex trace identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TraceId(String);

impl TraceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Per-invocation metadata collected while a command runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub request_id: RequestId,
    pub trace_id: TraceId,
    pub command: &'static str,
    pub source_chain: Vec<ProviderId>,
    pub latency_ms: u64,
    pub cache_hit: bool,
    pub warnings: Vec<String>,
}

impl Metadata {
    pub fn new(
        command: &'static str,
        source_chain: Vec<ProviderId>,
        latency_ms: u64,
        cache_hit: bool,
    ) -> Self {
        Self {
            request_id: RequestId::new_v4(),
            trace_id: TraceId::new(),
            command,
            source_chain,
            latency_ms,
            cache_hit,
            warnings: Vec::new(),
        }
    }

    pub fn push_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    pub fn into_envelope_meta(self) -> Result<EnvelopeMeta, ValidationError> {
        let mut meta = EnvelopeMeta::new(self.request_id.to_string(), self.command, self.source_chain)?
            .with_trace_id(self.trace_id.as_str())?
            .with_latency_ms(self.latency_ms)
            .with_cache_hit(self.cache_hit);

        for warning in self.warnings {
            meta.push_warning(warning);
        }
        Ok(meta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_id_is_uuid_v4() {
        assert_eq!(RequestId::new_v4().0.get_version_num(), 4);
    }

    #[test]
    fn builds_valid_envelope_meta() {
        let mut metadata = Metadata::new("rank", vec![ProviderId::Synthetic], 42, true);
        metadata.push_warning("nothing to show");

        let meta = metadata.into_envelope_meta().expect("meta is valid");
        assert_eq!(meta.command, "rank");
        assert_eq!(meta.latency_ms, 42);
        assert!(meta.cache_hit);
        assert_eq!(meta.trace_id.as_deref().map(str::len), Some(32));
        assert_eq!(meta.warnings, vec![String::from("nothing to show")]);
    }

    #[test]
    fn empty_source_chain_is_rejected() {
        let err = Metadata::new("dashboard", Vec::new(), 0, false)
            .into_envelope_meta()
            .expect_err("must fail");
        assert!(matches!(err, ValidationError::EmptySourceChain));
    }
}
