//! Client Configuration Settings
//!
//! Credentials and stream tuning, loaded from the environment or built in
//! code. Credential validation happens once, synchronously, before any
//! network activity.

use std::time::Duration;

use crate::infrastructure::firehose::reconnect::ReconnectConfig;

// =============================================================================
// Credentials
// =============================================================================

/// Credential validation error.
///
/// The only fatal, synchronous error in the crate: a client cannot be
/// constructed without a complete credential set.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CredentialError {
    /// A required credential field was not provided.
    #[error("missing required credential: {0}")]
    Missing(&'static str),
    /// A required credential field was provided but empty.
    #[error("credential {0} cannot be empty")]
    Empty(&'static str),
}

/// OAuth credential set for the streaming feed.
///
/// All four fields are required. The `Debug` implementation redacts every
/// field for safe logging; the raw values are only handed to the transport
/// that signs the outbound request.
#[derive(Clone)]
pub struct Credentials {
    consumer_key: String,
    consumer_secret: String,
    access_token: String,
    access_token_secret: String,
}

impl Credentials {
    /// Create a new credential set, validating that no field is empty.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::Empty`] naming the first empty field.
    pub fn new(
        consumer_key: impl Into<String>,
        consumer_secret: impl Into<String>,
        access_token: impl Into<String>,
        access_token_secret: impl Into<String>,
    ) -> Result<Self, CredentialError> {
        let creds = Self {
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
            access_token: access_token.into(),
            access_token_secret: access_token_secret.into(),
        };
        creds.validate()?;
        Ok(creds)
    }

    /// Load credentials from `FIREHOSE_CONSUMER_KEY`,
    /// `FIREHOSE_CONSUMER_SECRET`, `FIREHOSE_ACCESS_TOKEN` and
    /// `FIREHOSE_ACCESS_TOKEN_SECRET`.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError`] if any variable is missing or empty.
    pub fn from_env() -> Result<Self, CredentialError> {
        Self::new(
            require_env("FIREHOSE_CONSUMER_KEY", "consumer_key")?,
            require_env("FIREHOSE_CONSUMER_SECRET", "consumer_secret")?,
            require_env("FIREHOSE_ACCESS_TOKEN", "access_token")?,
            require_env("FIREHOSE_ACCESS_TOKEN_SECRET", "access_token_secret")?,
        )
    }

    /// Check that every field is non-empty.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::Empty`] naming the first empty field.
    pub fn validate(&self) -> Result<(), CredentialError> {
        for (name, value) in [
            ("consumer_key", &self.consumer_key),
            ("consumer_secret", &self.consumer_secret),
            ("access_token", &self.access_token),
            ("access_token_secret", &self.access_token_secret),
        ] {
            if value.is_empty() {
                return Err(CredentialError::Empty(name));
            }
        }
        Ok(())
    }

    /// Get the consumer key.
    #[must_use]
    pub fn consumer_key(&self) -> &str {
        &self.consumer_key
    }

    /// Get the consumer secret.
    #[must_use]
    pub fn consumer_secret(&self) -> &str {
        &self.consumer_secret
    }

    /// Get the access token.
    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Get the access token secret.
    #[must_use]
    pub fn access_token_secret(&self) -> &str {
        &self.access_token_secret
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("consumer_key", &"[REDACTED]")
            .field("consumer_secret", &"[REDACTED]")
            .field("access_token", &"[REDACTED]")
            .field("access_token_secret", &"[REDACTED]")
            .finish()
    }
}

fn require_env(var: &'static str, field: &'static str) -> Result<String, CredentialError> {
    std::env::var(var).map_err(|_| CredentialError::Missing(field))
}

// =============================================================================
// Stream Settings
// =============================================================================

/// Connection and delivery tuning.
#[derive(Debug, Clone)]
pub struct StreamSettings {
    /// Debounce window: mutations within this window after the first are
    /// coalesced into a single reconnect.
    pub debounce_window: Duration,
    /// Quiet period after which an open stream is considered dead. The
    /// feed sends blank keep-alive lines well inside this window.
    pub stall_timeout: Duration,
    /// Backoff configuration for failure retries.
    pub reconnect: ReconnectConfig,
    /// Capacity of the consumer event channel.
    pub event_capacity: usize,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            debounce_window: Duration::from_millis(250),
            stall_timeout: Duration::from_secs(90),
            reconnect: ReconnectConfig::default(),
            event_capacity: 1_024,
        }
    }
}

impl StreamSettings {
    /// Build settings from environment variables, falling back to defaults
    /// for anything unset.
    ///
    /// Recognized variables: `FIREHOSE_DEBOUNCE_MS`,
    /// `FIREHOSE_STALL_TIMEOUT_SECS`, `FIREHOSE_RECONNECT_DELAY_INITIAL_MS`,
    /// `FIREHOSE_RECONNECT_DELAY_MAX_SECS`, `FIREHOSE_RECONNECT_MULTIPLIER`,
    /// `FIREHOSE_MAX_RECONNECT_ATTEMPTS`, `FIREHOSE_EVENT_CAPACITY`.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let reconnect_defaults = ReconnectConfig::default();

        Self {
            debounce_window: parse_env_duration_millis(
                "FIREHOSE_DEBOUNCE_MS",
                defaults.debounce_window,
            ),
            stall_timeout: parse_env_duration_secs(
                "FIREHOSE_STALL_TIMEOUT_SECS",
                defaults.stall_timeout,
            ),
            reconnect: ReconnectConfig {
                initial_delay: parse_env_duration_millis(
                    "FIREHOSE_RECONNECT_DELAY_INITIAL_MS",
                    reconnect_defaults.initial_delay,
                ),
                max_delay: parse_env_duration_secs(
                    "FIREHOSE_RECONNECT_DELAY_MAX_SECS",
                    reconnect_defaults.max_delay,
                ),
                multiplier: parse_env_f64(
                    "FIREHOSE_RECONNECT_MULTIPLIER",
                    reconnect_defaults.multiplier,
                ),
                jitter_factor: reconnect_defaults.jitter_factor,
                max_attempts: parse_env_u32(
                    "FIREHOSE_MAX_RECONNECT_ATTEMPTS",
                    reconnect_defaults.max_attempts,
                ),
            },
            event_capacity: parse_env_usize("FIREHOSE_EVENT_CAPACITY", defaults.event_capacity),
        }
    }
}

// =============================================================================
// Client Configuration
// =============================================================================

/// Complete client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// OAuth credentials for the outbound request.
    pub credentials: Credentials,
    /// Connection and delivery tuning.
    pub stream: StreamSettings,
}

impl ClientConfig {
    /// Build a configuration with default stream settings.
    #[must_use]
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            stream: StreamSettings::default(),
        }
    }

    /// Load the full configuration from environment variables, reading a
    /// `.env` file first if one is present.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError`] if any credential variable is missing
    /// or empty.
    pub fn from_env() -> Result<Self, CredentialError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            credentials: Credentials::from_env()?,
            stream: StreamSettings::from_env(),
        })
    }
}

fn parse_env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_env_duration_secs(key: &str, default: Duration) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map_or(default, Duration::from_secs)
}

fn parse_env_duration_millis(key: &str, default: Duration) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map_or(default, Duration::from_millis)
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test]
    fn credentials_validate_complete_set() {
        let creds = Credentials::new("key", "secret", "token", "tokenSecret");
        assert!(creds.is_ok());
    }

    #[test_case("", "secret", "token", "tokenSecret", "consumer_key")]
    #[test_case("key", "", "token", "tokenSecret", "consumer_secret")]
    #[test_case("key", "secret", "", "tokenSecret", "access_token")]
    #[test_case("key", "secret", "token", "", "access_token_secret")]
    fn credentials_reject_empty_field(ck: &str, cs: &str, at: &str, ats: &str, field: &str) {
        match Credentials::new(ck, cs, at, ats) {
            Err(CredentialError::Empty(name)) => assert_eq!(name, field),
            other => panic!("expected Empty({field}), got {other:?}"),
        }
    }

    #[test]
    fn credentials_redacted_debug() {
        let creds = Credentials::new("key123", "secret456", "token789", "ts000").unwrap();
        let debug = format!("{creds:?}");
        assert!(!debug.contains("key123"));
        assert!(!debug.contains("secret456"));
        assert!(!debug.contains("token789"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn stream_settings_defaults() {
        let settings = StreamSettings::default();
        assert_eq!(settings.debounce_window, Duration::from_millis(250));
        assert_eq!(settings.stall_timeout, Duration::from_secs(90));
        assert_eq!(settings.event_capacity, 1_024);
        assert_eq!(settings.reconnect.max_attempts, 0);
    }

    #[test]
    fn client_config_defaults() {
        let creds = Credentials::new("k", "s", "t", "ts").unwrap();
        let config = ClientConfig::new(creds);
        assert_eq!(config.stream.debounce_window, Duration::from_millis(250));
    }
}
