//! Session and retry configuration
//!
//! Values are fixed for the lifetime of a session. They come from the
//! caller (builder methods) or from the environment:
//!
//! | variable                    | meaning                              | default |
//! |-----------------------------|--------------------------------------|---------|
//! | `GDOC_RETRY_DELAY_SECS`     | initial backoff delay, seconds       | 2       |
//! | `GDOC_MAX_RETRIES`          | attempts per remote call             | 5       |
//! | `GDOC_RETRY_TRANSIENT_ONLY` | `true` to skip retrying permanent errors | false |
//! | `GDOC_PARAGRAPH_PAUSE_SECS` | pause between paragraph batches      | delay   |

use crate::error::{ConfigError, RemoteError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Factor applied to the backoff delay after every failed attempt
pub const BACKOFF_MULTIPLIER: u32 = 2;

/// Which remote errors the backoff executor retries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryClassification {
    /// Every remote error is treated as transient
    #[default]
    All,
    /// Only rate limits, outages and transport failures are retried
    TransientOnly,
}

impl RetryClassification {
    /// Check whether an error may be retried under this classification
    #[inline]
    #[must_use]
    pub fn should_retry(self, error: &RemoteError) -> bool {
        match self {
            Self::All => true,
            Self::TransientOnly => error.is_transient(),
        }
    }
}

/// Retry policy applied uniformly to every remote call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Wait before the second attempt
    #[serde(with = "secs")]
    pub initial_delay: Duration,
    /// Attempts per call, including the first
    pub max_retries: u32,
    /// Upper bound (exclusive) of the uniform jitter added to each wait
    #[serde(with = "secs")]
    pub max_jitter: Duration,
    /// Which errors are retried
    pub classification: RetryClassification,
}

impl RetryPolicy {
    /// Create default policy
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With initial delay
    #[inline]
    #[must_use]
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// With max retries
    #[inline]
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// With jitter bound
    #[inline]
    #[must_use]
    pub fn with_max_jitter(mut self, max_jitter: Duration) -> Self {
        self.max_jitter = max_jitter;
        self
    }

    /// With error classification
    #[inline]
    #[must_use]
    pub fn with_classification(mut self, classification: RetryClassification) -> Self {
        self.classification = classification;
        self
    }

    /// Effective attempt budget (a zero budget still makes one attempt)
    #[inline]
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.max(1)
    }

    /// Deterministic part of the wait after failed attempt `k` (0-based)
    #[must_use]
    pub fn base_delay(&self, k: u32) -> Duration {
        BACKOFF_MULTIPLIER
            .checked_pow(k)
            .and_then(|factor| self.initial_delay.checked_mul(factor))
            .unwrap_or(Duration::MAX)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(2),
            max_retries: 5,
            max_jitter: Duration::from_secs(1),
            classification: RetryClassification::All,
        }
    }
}

/// Configuration fixed for one document session
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Retry policy for every remote call
    pub retry: RetryPolicy,
    /// Pause between paragraph batches; falls back to the retry delay
    #[serde(with = "opt_secs", skip_serializing_if = "Option::is_none")]
    pub paragraph_pause: Option<Duration>,
}

impl SessionConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With retry policy
    #[inline]
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// With paragraph pause
    #[inline]
    #[must_use]
    pub fn with_paragraph_pause(mut self, pause: Duration) -> Self {
        self.paragraph_pause = Some(pause);
        self
    }

    /// Effective pause between paragraph batches
    #[inline]
    #[must_use]
    pub fn paragraph_pause(&self) -> Duration {
        self.paragraph_pause.unwrap_or(self.retry.initial_delay)
    }

    /// Load configuration from the process environment
    ///
    /// # Errors
    /// - `ConfigError::InvalidValue` if a variable is set but unparseable
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    ///
    /// # Errors
    /// - `ConfigError::InvalidValue` if a value is set but unparseable
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup("GDOC_RETRY_DELAY_SECS") {
            config.retry.initial_delay = parse_secs("GDOC_RETRY_DELAY_SECS", &raw)?;
        }
        if let Some(raw) = lookup("GDOC_MAX_RETRIES") {
            config.retry.max_retries = raw
                .trim()
                .parse()
                .map_err(|e: std::num::ParseIntError| {
                    ConfigError::invalid("GDOC_MAX_RETRIES", raw.clone(), e.to_string())
                })?;
        }
        if let Some(raw) = lookup("GDOC_RETRY_TRANSIENT_ONLY") {
            let transient_only = match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" | "" => false,
                _ => {
                    return Err(ConfigError::invalid(
                        "GDOC_RETRY_TRANSIENT_ONLY",
                        raw,
                        "expected true or false",
                    ))
                }
            };
            if transient_only {
                config.retry.classification = RetryClassification::TransientOnly;
            }
        }
        if let Some(raw) = lookup("GDOC_PARAGRAPH_PAUSE_SECS") {
            config.paragraph_pause = Some(parse_secs("GDOC_PARAGRAPH_PAUSE_SECS", &raw)?);
        }

        Ok(config)
    }
}

fn parse_secs(var: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    let secs: f64 = raw
        .trim()
        .parse()
        .map_err(|e: std::num::ParseFloatError| ConfigError::invalid(var, raw, e.to_string()))?;
    Duration::try_from_secs_f64(secs).map_err(|e| ConfigError::invalid(var, raw, e.to_string()))
}

/// Durations as fractional seconds
mod secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub(super) fn serialize<S: Serializer>(value: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(value.as_secs_f64())
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

mod opt_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub(super) fn serialize<S: Serializer>(
        value: &Option<Duration>,
        s: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_some(&d.as_secs_f64()),
            None => s.serialize_none(),
        }
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<Duration>, D::Error> {
        Option::<f64>::deserialize(d)?
            .map(|secs| Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom))
            .transpose()
    }
}
