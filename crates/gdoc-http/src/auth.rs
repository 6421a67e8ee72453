//! Bearer credentials

use gdoc_core::ConfigError;
use std::fmt;

/// Environment variable holding the OAuth access token
pub const ACCESS_TOKEN_VAR: &str = "GDOC_ACCESS_TOKEN";

/// Opaque OAuth bearer token
///
/// Obtaining and refreshing it is the caller's concern. `Debug` never
/// prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wrap a token
    #[inline]
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Read the token from [`ACCESS_TOKEN_VAR`]
    ///
    /// # Errors
    /// `ConfigError::Missing` if the variable is unset or blank
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the token through `lookup`
    ///
    /// # Errors
    /// `ConfigError::Missing` if the variable is unset or blank
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        lookup(ACCESS_TOKEN_VAR)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(Self)
            .ok_or(ConfigError::Missing(ACCESS_TOKEN_VAR))
    }

    /// The raw token
    #[inline]
    #[must_use]
    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}
