//! Tracing subscriber setup shared by the CLI and the HTTP server.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the global subscriber. `RUST_LOG` wins over `log_level` when set.
/// Output goes to stderr so that command output on stdout stays parseable.
///
/// Returns false if a subscriber was already installed.
pub fn init_logging(log_level: &str, json_format: bool) -> bool {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    let subscriber = tracing_subscriber::registry().with(env_filter);

    let result = if json_format {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };

    if result.is_err() {
        return false;
    }
    tracing::debug!(
        level = log_level,
        format = if json_format { "json" } else { "text" },
        "logging initialized"
    );
    true
}
