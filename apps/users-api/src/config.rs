use core_config::database::DatabaseConfig;
use core_config::notifier::NotifierConfig;
use core_config::server::ServerConfig;
use core_config::{AppInfo, Environment, FromEnv, app_info};
use domain_notifications::DeliveryPolicy;
use std::time::Duration;

/// Headroom between the notify deadline and the request timeout
const NOTIFY_DEADLINE_MARGIN: Duration = Duration::from_secs(1);

/// Application configuration, composed from the shared config components
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub notifier: NotifierConfig,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let server = ServerConfig::from_env()?; // HOST=0.0.0.0, PORT=8080 by default
        let database = DatabaseConfig::from_env()?; // DATABASE_URL is required
        let notifier = NotifierConfig::from_env()?; // disabled without EVENTS_BROKER_URL

        let config = Self {
            app: app_info!(),
            environment,
            server,
            database,
            notifier,
        };
        if config.notifier.is_enabled() {
            DeliveryPolicy::try_from(&config.notifier)?
                .ensure_fits_within(config.notify_deadline())?;
        }
        Ok(config)
    }

    /// How long a mutation waits on event delivery before dead-lettering it.
    ///
    /// Kept below the request timeout so the response is never a 408.
    pub fn notify_deadline(&self) -> Duration {
        self.server
            .request_timeout
            .saturating_sub(NOTIFY_DEADLINE_MARGIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        temp_env::with_vars(
            [
                ("DATABASE_URL", Some("postgres://localhost/users")),
                ("EVENTS_BROKER_URL", None),
                ("EVENTS_MAX_ATTEMPTS", None),
                ("EVENTS_INITIAL_DELAY_MS", None),
                ("EVENTS_BACKOFF_MULTIPLIER", None),
                ("EVENTS_ATTEMPT_TIMEOUT_MS", None),
                ("REQUEST_TIMEOUT_SECS", None),
                ("PORT", None),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.app.name, "users_api");
                assert_eq!(config.server.port, 8080);
                assert!(!config.notifier.is_enabled());
                assert_eq!(config.notifier.max_attempts, 3);
                assert_eq!(config.notifier.initial_delay, Duration::from_secs(1));
                assert_eq!(config.notifier.backoff_multiplier, 2);
                assert_eq!(config.notify_deadline(), Duration::from_secs(9));
            },
        );
    }

    #[test]
    fn test_config_requires_database_url() {
        temp_env::with_var_unset("DATABASE_URL", || {
            let err = Config::from_env().unwrap_err();
            assert!(err.to_string().contains("DATABASE_URL"));
        });
    }

    #[test]
    fn test_config_rejects_bad_port() {
        temp_env::with_vars(
            [
                ("DATABASE_URL", Some("postgres://localhost/users")),
                ("PORT", Some("not-a-port")),
            ],
            || {
                assert!(Config::from_env().is_err());
            },
        );
    }

    #[test]
    fn test_config_accepts_default_policy_with_broker() {
        temp_env::with_vars(
            [
                ("DATABASE_URL", Some("postgres://localhost/users")),
                ("EVENTS_BROKER_URL", Some("redis://localhost:6379")),
                ("EVENTS_MAX_ATTEMPTS", None),
                ("EVENTS_INITIAL_DELAY_MS", None),
                ("EVENTS_BACKOFF_MULTIPLIER", None),
                ("EVENTS_ATTEMPT_TIMEOUT_MS", None),
                ("REQUEST_TIMEOUT_SECS", None),
            ],
            || {
                // 3 x 2s attempts + 3s backoff fits the 9s deadline
                let config = Config::from_env().unwrap();
                assert!(config.notifier.is_enabled());
            },
        );
    }

    #[test]
    fn test_config_rejects_delivery_longer_than_request_timeout() {
        temp_env::with_vars(
            [
                ("DATABASE_URL", Some("postgres://localhost/users")),
                ("EVENTS_BROKER_URL", Some("redis://localhost:6379")),
                ("EVENTS_MAX_ATTEMPTS", None),
                ("EVENTS_INITIAL_DELAY_MS", None),
                ("EVENTS_BACKOFF_MULTIPLIER", None),
                ("EVENTS_ATTEMPT_TIMEOUT_MS", None),
                ("REQUEST_TIMEOUT_SECS", Some("2")),
            ],
            || {
                let err = Config::from_env().unwrap_err();
                assert!(err.to_string().contains("available per request"));
            },
        );
    }

    #[test]
    fn test_disabled_notifier_skips_delivery_budget_check() {
        temp_env::with_vars(
            [
                ("DATABASE_URL", Some("postgres://localhost/users")),
                ("EVENTS_BROKER_URL", None),
                ("REQUEST_TIMEOUT_SECS", Some("2")),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.notify_deadline(), Duration::from_secs(1));
            },
        );
    }
}
