use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

pub const DEFAULT_TOURAPI_BASE_URL: &str = "https://apis.data.go.kr/B551011/KorService2";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
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
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let tourapi_service_key = require("TOURAPI_SERVICE_KEY")?;

    let env = parse_environment(&or_default("TOURMAP_ENV", "development"))?;
    let log_level = or_default("TOURMAP_LOG_LEVEL", "info");

    let tourapi_base_url = or_default("TOURAPI_BASE_URL", DEFAULT_TOURAPI_BASE_URL);
    let tourapi_mobile_app = or_default("TOURAPI_MOBILE_APP", "tourmap");
    let tourapi_request_timeout_secs = parse_u64("TOURAPI_REQUEST_TIMEOUT_SECS", "10")?;
    let tourapi_max_retries = parse_u32("TOURAPI_MAX_RETRIES", "2")?;
    let tourapi_retry_backoff_base_ms = parse_u64("TOURAPI_RETRY_BACKOFF_BASE_MS", "500")?;

    let page_size = parse_u32("TOURMAP_PAGE_SIZE", "20")?;
    if page_size == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "TOURMAP_PAGE_SIZE".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    let enrichment_cache_capacity = parse_usize("TOURMAP_ENRICHMENT_CACHE_CAPACITY", "2000")?;
    if enrichment_cache_capacity == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "TOURMAP_ENRICHMENT_CACHE_CAPACITY".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    Ok(AppConfig {
        env,
        log_level,
        tourapi_service_key,
        tourapi_base_url,
        tourapi_mobile_app,
        tourapi_request_timeout_secs,
        tourapi_max_retries,
        tourapi_retry_backoff_base_ms,
        page_size,
        enrichment_cache_capacity,
    })
}

fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "TOURMAP_ENV".to_string(),
            reason: format!("expected development, test, or production; got '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
