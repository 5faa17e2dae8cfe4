mod dashboard;
mod fundamentals;
mod range;
mod rank;
mod universe;

use std::sync::Arc;
use std::time::Instant;

use bourse_core::domain::calendar::{parse_date, today_utc};
use bourse_core::{
    CachedSource, Envelope, EnvelopeError, Market, MarketDataSource, ProviderId,
    ReqwestHttpClient, Settings, SyntheticSource, TimeRange, Universe, ValidationError,
    YahooAdapter,
};
use serde_json::Value;
use time::Date;

use crate::cli::{Cli, Command, MarketArg};
use crate::error::CliError;
use crate::metadata::Metadata;

pub struct CommandResult {
    pub data: Value,
    pub warnings: Vec<String>,
    pub errors: Vec<EnvelopeError>,
}

impl CommandResult {
    pub fn ok(data: Value) -> Self {
        Self {
            data,
            warnings: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    pub fn with_errors(mut self, errors: Vec<EnvelopeError>) -> Self {
        self.errors.extend(errors);
        self
    }
}

/// Resources shared by every command of one invocation.
pub struct Context {
    pub settings: Settings,
    pub today: Date,
    pub provider: ProviderId,
    pub source: Arc<CachedSource>,
}

impl Context {
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let mut settings = Settings::from_env();
        if let Some(concurrency) = cli.concurrency {
            settings.max_concurrency = concurrency.max(1);
        }
        if let Some(ttl) = cli.cache_ttl_secs {
            settings.cache_ttl_secs = ttl;
        }
        if let Some(timeout_ms) = cli.timeout_ms {
            settings.http_timeout_ms = timeout_ms.max(1);
        }

        let today = match &cli.today {
            Some(raw) => parse_date(raw)?,
            None => today_utc(),
        };

        let inner: Arc<dyn MarketDataSource> = if cli.mock {
            Arc::new(SyntheticSource::new(today))
        } else {
            let http_client = ReqwestHttpClient::from_settings(&settings)?;
            Arc::new(YahooAdapter::new(Arc::new(http_client), &settings))
        };
        let provider = inner.id();
        let source = Arc::new(CachedSource::new(inner, settings.cache_ttl()));

        tracing::debug!(
            provider = %provider,
            today = %today,
            concurrency = settings.max_concurrency,
            cache_ttl_secs = settings.cache_ttl_secs,
            "context ready"
        );

        Ok(Self {
            settings,
            today,
            provider,
            source,
        })
    }

    pub fn source(&self) -> Arc<dyn MarketDataSource> {
        Arc::clone(&self.source) as Arc<dyn MarketDataSource>
    }
}

pub async fn run(cli: &Cli) -> Result<Envelope<Value>, CliError> {
    let started = Instant::now();
    let context = Context::from_cli(cli)?;

    let CommandResult {
        data,
        warnings,
        errors,
    } = match &cli.command {
        Command::Dashboard(args) => dashboard::run(args, &context).await?,
        Command::Fundamentals(args) => fundamentals::run(args, &context).await?,
        Command::Rank(args) => rank::run(args, &context).await?,
        Command::Universe(args) => universe::run(args)?,
        Command::Range(args) => range::run(args, &context)?,
    };

    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    let cache_hit = context.source.stats().hits > 0;
    let mut metadata = Metadata::new(
        cli.command.name(),
        vec![context.provider],
        latency_ms,
        cache_hit,
    );
    for warning in warnings {
        metadata.push_warning(warning);
    }

    let mut envelope = Envelope::new(metadata.into_envelope_meta()?, data);
    for error in errors {
        envelope.push_error(error)?;
    }
    Ok(envelope)
}

/// Builds a range from a tag and optional dates.
///
/// Dates imply a custom range. `custom` without dates falls back to the last
/// year; a single date is rejected.
pub fn parse_time_range(
    tag: &str,
    start: Option<&str>,
    end: Option<&str>,
    today: Date,
) -> Result<TimeRange, ValidationError> {
    let is_custom = tag.trim().eq_ignore_ascii_case("custom");
    match (start, end) {
        (None, None) if is_custom => TimeRange::default_custom(today),
        (None, None) => tag.parse(),
        (Some(start), Some(end)) => TimeRange::custom(parse_date(start)?, parse_date(end)?),
        _ => Err(ValidationError::IncompleteCustomRange),
    }
}

pub fn universe_for(market: MarketArg) -> Result<Universe, ValidationError> {
    match market {
        MarketArg::Cac40 => Universe::for_market(Market::Cac40),
        MarketArg::Sp500 => Universe::for_market(Market::Sp500),
        MarketArg::All => Universe::combined(),
    }
}
