use crate::{env_optional, env_or_default, env_parse, ConfigError, FromEnv};
use std::time::Duration;

/// Configuration for user event notifications.
///
/// Notifications are disabled when `EVENTS_BROKER_URL` is unset or blank.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NotifierConfig {
    pub broker_url: Option<String>,
    pub stream: String,
    pub stream_max_length: u64,
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub backoff_multiplier: u32,
    /// Upper bound for a single publish attempt
    pub attempt_timeout: Duration,
}

impl NotifierConfig {
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn with_broker_url(mut self, url: impl Into<String>) -> Self {
        self.broker_url = Some(url.into());
        self
    }

    pub fn with_stream(mut self, stream: impl Into<String>) -> Self {
        self.stream = stream.into();
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.broker_url.is_some()
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                key: "EVENTS_MAX_ATTEMPTS".to_string(),
                details: "at least one delivery attempt is required".to_string(),
            });
        }
        if self.backoff_multiplier == 0 {
            return Err(ConfigError::Invalid {
                key: "EVENTS_BACKOFF_MULTIPLIER".to_string(),
                details: "must be 1 or greater".to_string(),
            });
        }
        if self.attempt_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                key: "EVENTS_ATTEMPT_TIMEOUT_MS".to_string(),
                details: "must be greater than zero".to_string(),
            });
        }
        if self.stream.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "EVENTS_STREAM".to_string(),
                details: "stream name cannot be empty".to_string(),
            });
        }
        Ok(self)
    }
}

impl FromEnv for NotifierConfig {
    /// Reads:
    /// - EVENTS_BROKER_URL: optional, e.g. `redis://localhost:6379`
    /// - EVENTS_STREAM: defaults to `user-events`
    /// - EVENTS_STREAM_MAX_LENGTH: defaults to 100000
    /// - EVENTS_MAX_ATTEMPTS: defaults to 3
    /// - EVENTS_INITIAL_DELAY_MS: defaults to 1000
    /// - EVENTS_BACKOFF_MULTIPLIER: defaults to 2
    /// - EVENTS_ATTEMPT_TIMEOUT_MS: defaults to 2000
    fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            broker_url: env_optional("EVENTS_BROKER_URL"),
            stream: env_or_default("EVENTS_STREAM", "user-events"),
            stream_max_length: env_parse("EVENTS_STREAM_MAX_LENGTH", 100_000)?,
            max_attempts: env_parse("EVENTS_MAX_ATTEMPTS", 3)?,
            initial_delay: Duration::from_millis(env_parse("EVENTS_INITIAL_DELAY_MS", 1000)?),
            backoff_multiplier: env_parse("EVENTS_BACKOFF_MULTIPLIER", 2)?,
            attempt_timeout: Duration::from_millis(env_parse("EVENTS_ATTEMPT_TIMEOUT_MS", 2000)?),
        };

        config.validate()
    }
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            broker_url: None,
            stream: "user-events".to_string(),
            stream_max_length: 100_000,
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            backoff_multiplier: 2,
            attempt_timeout: Duration::from_secs(2),
        }
    }
}
