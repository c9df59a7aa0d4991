//! # Structured Logging Module
//!
//! Environment-aware structured logging for tracing identifier operations
//! across the asynchronous registration path.

use std::sync::OnceLock;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging with environment-specific configuration.
///
/// Safe to call more than once; if a global subscriber is already installed
/// (for instance by the embedding application) the existing one is kept.
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let log_level = get_log_level(&environment);
        let json_output = environment == "production";

        let filter = EnvFilter::try_from_env("REGISTRAR_LOG")
            .unwrap_or_else(|_| EnvFilter::new(log_level));

        let subscriber = tracing_subscriber::registry().with(if json_output {
            fmt::layer()
                .with_target(true)
                .with_ansi(false)
                .json()
                .boxed()
        } else {
            fmt::layer().with_target(true).boxed()
        });

        if subscriber.with(filter).try_init().is_err() {
            tracing::debug!("global tracing subscriber already initialized");
        }
    });
}

/// Current environment from environment variables.
fn get_environment() -> String {
    std::env::var("REGISTRAR_ENV")
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}

/// Default log level for an environment.
fn get_log_level(environment: &str) -> String {
    match environment {
        "production" => "info".to_string(),
        _ => "debug".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_mapping() {
        assert_eq!(get_log_level("production"), "info");
        assert_eq!(get_log_level("development"), "debug");
        assert_eq!(get_log_level("test"), "debug");
    }
}
