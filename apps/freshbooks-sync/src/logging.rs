use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::LoggingConfig;

/// Filter directive for the `-v` count, if any.
fn verbosity_level(verbose: u8) -> Option<&'static str> {
    match verbose {
        0 => None,
        1 => Some("info"),
        2 => Some("debug"),
        _ => Some("trace"),
    }
}

/// Effective default directive: `-v` flags beat the configured level.
pub fn directive(config: &LoggingConfig, verbose: u8) -> String {
    verbosity_level(verbose).map_or_else(|| config.level.clone(), str::to_owned)
}

/// Install the global subscriber. Logs go to stderr so stdout stays free
/// for sync output. `RUST_LOG` overrides the directive.
///
/// # Errors
/// Returns an error if the directive is invalid or a subscriber is
/// already installed.
pub fn init(config: &LoggingConfig, verbose: u8) -> anyhow::Result<()> {
    let directive = directive(config, verbose);
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&directive)?,
    };

    let registry = tracing_subscriber::registry().with(filter);
    if config.json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .flatten_event(true),
            )
            .try_init()?;
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .try_init()?;
    }

    tracing::debug!(filter = %directive, "logging initialized");
    Ok(())
}
