//! Reconnection Policy
//!
//! Exponential backoff with jitter for re-opening the streaming
//! connection after a transport failure. The source feed tolerates
//! immediate retries, but unbounded hot retry loops amplify outages, so
//! retries back off up to a cap and can be limited to a fixed number of
//! attempts.

use std::time::Duration;

use rand::Rng;

/// Configuration for reconnection behavior.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Ceiling for the backoff delay.
    pub max_delay: Duration,
    /// Multiplier applied to the delay after each attempt.
    pub multiplier: f64,
    /// Jitter as a fraction of the delay (0.1 = ±10%).
    pub jitter_factor: f64,
    /// Maximum retry attempts before giving up (0 = unlimited).
    pub max_attempts: u32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(64),
            multiplier: 2.0,
            jitter_factor: 0.1,
            max_attempts: 0, // Unlimited
        }
    }
}

/// Retry state implementing exponential backoff with jitter.
///
/// # Example
///
/// ```rust
/// use firehose_client::infrastructure::firehose::reconnect::{ReconnectConfig, ReconnectPolicy};
///
/// let mut policy = ReconnectPolicy::new(ReconnectConfig::default());
///
/// // First failure: get a delay before retrying
/// assert!(policy.next_delay().is_some());
///
/// // Successful connection: start over
/// policy.reset();
/// assert_eq!(policy.attempt_count(), 0);
/// ```
#[derive(Debug)]
pub struct ReconnectPolicy {
    config: ReconnectConfig,
    attempt: u32,
}

impl ReconnectPolicy {
    /// Create a new policy from a configuration.
    #[must_use]
    pub const fn new(config: ReconnectConfig) -> Self {
        Self { config, attempt: 0 }
    }

    /// Get the delay before the next retry, or `None` if the attempt cap
    /// is exhausted.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.config.max_attempts > 0 && self.attempt >= self.config.max_attempts {
            return None;
        }

        let exponent = i32::try_from(self.attempt).unwrap_or(i32::MAX);
        self.attempt += 1;

        // powi saturates to infinity for large exponents; min() brings the
        // result back to the configured cap before building a Duration.
        let scale = self.config.multiplier.max(1.0).powi(exponent);
        let secs = (self.config.initial_delay.as_secs_f64() * scale)
            .min(self.config.max_delay.as_secs_f64());
        let base = Duration::from_secs_f64(secs);

        Some(self.with_jitter(base))
    }

    /// Reset the policy after a successful connection.
    pub const fn reset(&mut self) {
        self.attempt = 0;
    }

    /// Number of retries handed out since the last reset.
    #[must_use]
    pub const fn attempt_count(&self) -> u32 {
        self.attempt
    }

    /// Check if another retry is allowed.
    #[must_use]
    pub const fn should_retry(&self) -> bool {
        self.config.max_attempts == 0 || self.attempt < self.config.max_attempts
    }

    /// Randomize a delay within the configured jitter band.
    fn with_jitter(&self, base: Duration) -> Duration {
        if self.config.jitter_factor <= 0.0 {
            return base;
        }

        let jitter = rand::rng()
            .random_range(-self.config.jitter_factor..=self.config.jitter_factor);
        base.mul_f64((1.0 + jitter).max(0.001))
    }
}
