use tokio::sync::Semaphore;

use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every setting has a default, so an empty environment yields a usable config.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let env = parse_environment(&or_default("SENTISCOPE_ENV", "development"));

    let bind_addr = or_default("SENTISCOPE_BIND_ADDR", "0.0.0.0:5000")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("SENTISCOPE_BIND_ADDR", e.to_string()))?;
    let log_level = or_default("SENTISCOPE_LOG_LEVEL", "info");

    let analyzer_program = or_default("SENTISCOPE_ANALYZER_PROGRAM", "python3");
    if analyzer_program.trim().is_empty() {
        return Err(invalid(
            "SENTISCOPE_ANALYZER_PROGRAM",
            "must not be empty".to_string(),
        ));
    }
    let analyzer_args = or_default(
        "SENTISCOPE_ANALYZER_ARGS",
        "analyzer/reddit_sentiment_analysis.py",
    )
    .split_whitespace()
    .map(ToOwned::to_owned)
    .collect();

    let analysis_timeout_secs = parse_u64("SENTISCOPE_ANALYSIS_TIMEOUT_SECS", "300")?;
    let max_concurrent_analyses = or_default("SENTISCOPE_MAX_CONCURRENT_ANALYSES", "4")
        .parse::<usize>()
        .map_err(|e| invalid("SENTISCOPE_MAX_CONCURRENT_ANALYSES", e.to_string()))?;
    if max_concurrent_analyses == 0 {
        return Err(invalid(
            "SENTISCOPE_MAX_CONCURRENT_ANALYSES",
            "must be at least 1".to_string(),
        ));
    }
    if max_concurrent_analyses > Semaphore::MAX_PERMITS {
        return Err(invalid(
            "SENTISCOPE_MAX_CONCURRENT_ANALYSES",
            format!("must be at most {}", Semaphore::MAX_PERMITS),
        ));
    }
    let queue_wait_secs = parse_u64("SENTISCOPE_QUEUE_WAIT_SECS", "30")?;

    let result_marker = lookup("SENTISCOPE_RESULT_MARKER")
        .ok()
        .filter(|m| !m.trim().is_empty());

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        analyzer_program,
        analyzer_args,
        analysis_timeout_secs,
        max_concurrent_analyses,
        queue_wait_secs,
        result_marker,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}
