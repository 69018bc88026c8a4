use crate::Environment;
use tracing::{debug, info};
use tracing_subscriber::{prelude::*, EnvFilter};

/// Install the color-eyre panic and report hooks.
///
/// Call first thing in `main`. Reports show the error location but no
/// environment section. Repeated calls are ignored.
pub fn install_color_eyre() {
    let _ = color_eyre::config::HookBuilder::default()
        .display_location_section(true)
        .display_env_section(false)
        .install();
}

/// Install the global tracing subscriber.
///
/// Production writes flattened JSON lines without targets; development writes
/// pretty multi-line output with targets. Both carry a `tracing-error`
/// `ErrorLayer` so eyre reports include span traces. `RUST_LOG` overrides
/// [`Environment::default_log_filter`].
///
/// Only the first call installs a subscriber.
pub fn init_tracing(environment: &Environment) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(environment.default_log_filter()));

    let installed = match environment {
        Environment::Production => tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(false)
                    .flatten_event(true),
            )
            .with(tracing_error::ErrorLayer::default())
            .with(filter)
            .try_init(),
        Environment::Development => tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_target(true).pretty())
            .with(tracing_error::ErrorLayer::default())
            .with(filter)
            .try_init(),
    };

    if installed.is_ok() {
        info!(environment = ?environment, "Tracing initialized");
    } else {
        debug!("Tracing subscriber already installed");
    }
}
