//! Runtime settings read from the environment.
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `BOURSE_MAX_CONCURRENCY` | 8 | Tickers fetched in parallel by the ranker |
//! | `BOURSE_CACHE_TTL_SECS` | 300 | Session cache lifetime, 0 disables it |
//! | `BOURSE_HTTP_TIMEOUT_MS` | 10000 | Per-request HTTP timeout |
//! | `BOURSE_USER_AGENT` | `bourse/<version>` | User agent sent upstream |
//! | `YAHOO_COOKIE` | unset | Pre-authenticated Yahoo cookie, skips the crumb dance |

use std::env;
use std::time::Duration;

pub const DEFAULT_MAX_CONCURRENCY: usize = 8;
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;
pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub max_concurrency: usize,
    pub cache_ttl_secs: u64,
    pub http_timeout_ms: u64,
    pub user_agent: String,
    pub yahoo_cookie: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            http_timeout_ms: DEFAULT_HTTP_TIMEOUT_MS,
            user_agent: default_user_agent(),
            yahoo_cookie: None,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds settings from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        Self {
            max_concurrency: read("BOURSE_MAX_CONCURRENCY")
                .and_then(|value| value.parse::<usize>().ok())
                .filter(|value| *value > 0)
                .unwrap_or(defaults.max_concurrency),
            cache_ttl_secs: read("BOURSE_CACHE_TTL_SECS")
                .and_then(|value| value.parse().ok())
                .unwrap_or(defaults.cache_ttl_secs),
            http_timeout_ms: read("BOURSE_HTTP_TIMEOUT_MS")
                .and_then(|value| value.parse::<u64>().ok())
                .filter(|value| *value > 0)
                .unwrap_or(defaults.http_timeout_ms),
            user_agent: read("BOURSE_USER_AGENT").unwrap_or(defaults.user_agent),
            yahoo_cookie: read("YAHOO_COOKIE"),
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

fn default_user_agent() -> String {
    format!("bourse/{}", env!("CARGO_PKG_VERSION"))
}
