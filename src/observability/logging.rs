//! Structured logging.
//!
//! `RUST_LOG` takes precedence over the configured level. Output is JSON in
//! production and human-readable elsewhere unless the config pins a format.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Environment, LogFormat, ObservabilityConfig};

/// Resolve `Auto` against the runtime environment.
pub fn effective_format(format: LogFormat, environment: Environment) -> LogFormat {
    match format {
        LogFormat::Auto if environment.is_production() => LogFormat::Json,
        LogFormat::Auto => LogFormat::Pretty,
        pinned => pinned,
    }
}

fn default_directives(level: &str) -> String {
    format!("view_counter={level},tower_http={level}")
}

/// Install the global subscriber. Safe to call more than once; later calls are ignored.
pub fn init_logging(config: &ObservabilityConfig, environment: Environment) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_directives(&config.log_level).into());

    let registry = tracing_subscriber::registry().with(filter);
    let result = match effective_format(config.log_format, environment) {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(false))
            .try_init(),
        _ => registry.with(tracing_subscriber::fmt::layer()).try_init(),
    };

    if result.is_err() {
        tracing::debug!("Global subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_format_follows_environment() {
        assert_eq!(effective_format(LogFormat::Auto, Environment::Production), LogFormat::Json);
        assert_eq!(effective_format(LogFormat::Auto, Environment::Development), LogFormat::Pretty);
        assert_eq!(effective_format(LogFormat::Pretty, Environment::Production), LogFormat::Pretty);
    }

    #[test]
    fn test_default_directives() {
        assert_eq!(default_directives("warn"), "view_counter=warn,tower_http=warn");
    }
}
