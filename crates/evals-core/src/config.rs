//! Harness-wide settings.
//!
//! Values are assembled by the CLI from flags and environment variables;
//! the library only sees the resolved [`HarnessConfig`].

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::rate_limiter::{ProviderBudget, RateLimitConfig};

/// Default number of isolated workers.
pub const DEFAULT_MAX_WORKERS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Upper bound on tasks executing at once across all providers.
    pub max_workers: usize,
    pub rate_limits: RateLimitConfig,
    /// Directory that evaluation paths are resolved against.
    pub evals_root: PathBuf,
    /// Capture prompt/response/grader traces for every task.
    pub debug: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            max_workers: DEFAULT_MAX_WORKERS,
            rate_limits: RateLimitConfig::default(),
            evals_root: PathBuf::from("."),
            debug: false,
        }
    }
}

impl HarnessConfig {
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    pub fn with_rate_limits(mut self, rate_limits: RateLimitConfig) -> Self {
        self.rate_limits = rate_limits;
        self
    }

    pub fn with_evals_root(mut self, evals_root: impl Into<PathBuf>) -> Self {
        self.evals_root = evals_root.into();
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

/// Parse a `provider=N` override, e.g. `anthropic=1`.
pub fn parse_provider_limit(raw: &str) -> Result<(String, usize), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected provider=N, got {raw:?}"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing provider name in {raw:?}"));
    }
    let limit = value
        .trim()
        .parse::<usize>()
        .map_err(|e| format!("invalid limit in {raw:?}: {e}"))?;
    Ok((name.to_string(), limit))
}

/// Build a [`RateLimitConfig`] from a default budget and `provider=N`
/// concurrency overrides. Overrides inherit the default interval.
pub fn rate_limits_from(
    default_concurrency: usize,
    min_interval_ms: u64,
    overrides: &[(String, usize)],
) -> RateLimitConfig {
    let default_budget = ProviderBudget {
        max_concurrent: default_concurrency,
        min_interval_ms,
    };
    overrides.iter().fold(
        RateLimitConfig {
            default_budget,
            ..RateLimitConfig::default()
        },
        |config, (provider, limit)| {
            config.with_override(
                provider,
                ProviderBudget {
                    max_concurrent: *limit,
                    min_interval_ms,
                },
            )
        },
    )
}
