use crate::app_config::{
    EngineConfig, DEFAULT_NARRATIVE_TOP_N, DEFAULT_ROLLING_CAP_SIZE, DEFAULT_TRENDING_TOP_N,
};
use crate::ConfigError;

/// Load engine configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value cannot be parsed or is out of range.
pub fn load_engine_config() -> Result<EngineConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_engine_config_from_env()
}

/// Load engine configuration from environment variables already in the process.
///
/// Unlike [`load_engine_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value cannot be parsed or is out of range.
pub fn load_engine_config_from_env() -> Result<EngineConfig, ConfigError> {
    build_engine_config(|key| std::env::var(key))
}

/// Build engine configuration using the provided env-var lookup function.
///
/// Every knob is optional; absent vars fall back to [`EngineConfig::default`].
fn build_engine_config<F>(lookup: F) -> Result<EngineConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let defaults = EngineConfig::default();

    let or_default = |var: &str, default: String| -> String { lookup(var).unwrap_or(default) };

    let parse_u64 = |var: &str, default: u64| -> Result<u64, ConfigError> {
        let raw = or_default(var, default.to_string());
        raw.trim()
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_usize = |var: &str, default: usize| -> Result<usize, ConfigError> {
        let raw = or_default(var, default.to_string());
        raw.trim()
            .parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let config = EngineConfig {
        fast_poll_interval_ms: parse_u64(
            "MINDSHARE_FAST_POLL_INTERVAL_MS",
            defaults.fast_poll_interval_ms,
        )?,
        slow_poll_interval_ms: parse_u64(
            "MINDSHARE_SLOW_POLL_INTERVAL_MS",
            defaults.slow_poll_interval_ms,
        )?,
        rolling_cap_size: parse_usize("MINDSHARE_ROLLING_CAP_SIZE", DEFAULT_ROLLING_CAP_SIZE)?,
        narrative_top_n: parse_usize("MINDSHARE_NARRATIVE_TOP_N", DEFAULT_NARRATIVE_TOP_N)?,
        trending_top_n: parse_usize("MINDSHARE_TRENDING_TOP_N", DEFAULT_TRENDING_TOP_N)?,
        request_timeout_ms: parse_u64("MINDSHARE_REQUEST_TIMEOUT_MS", defaults.request_timeout_ms)?,
        fetch_limit: parse_usize("MINDSHARE_FETCH_LIMIT", defaults.fetch_limit)?,
        push_reconnect_delay_ms: parse_u64(
            "MINDSHARE_PUSH_RECONNECT_DELAY_MS",
            defaults.push_reconnect_delay_ms,
        )?,
        log_level: or_default("MINDSHARE_LOG_LEVEL", defaults.log_level.clone()),
    };

    config.validate()?;
    Ok(config)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
