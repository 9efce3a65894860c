use crate::app_config::{AppConfig, Environment, StorefrontConfig};
use crate::ConfigError;

/// Secret used to sign session tokens when none is configured in development.
const DEV_JWT_SECRET: &str = "pyp-development-secret";

pub const DEFAULT_ADMIN_EMAIL: &str = "admin@pickyourpickle.in";

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

/// Load the storefront client configuration from the environment.
///
/// # Errors
///
/// Returns `ConfigError` if a numeric setting cannot be parsed.
pub fn load_storefront_config() -> Result<StorefrontConfig, ConfigError> {
    dotenvy::dotenv().ok();
    build_storefront_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can drive it from a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
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

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("PYP_ENV", "development"))?;

    let jwt_secret = match optional("JWT_SECRET") {
        Some(secret) => secret,
        None if env == Environment::Development => DEV_JWT_SECRET.to_string(),
        None => return Err(ConfigError::MissingEnvVar("JWT_SECRET".to_string())),
    };

    let bind_addr = parse_addr("PYP_BIND_ADDR", "0.0.0.0:5000")?;
    let log_level = or_default("PYP_LOG_LEVEL", "info");
    let catalog_path = PathBuf::from(or_default("PYP_CATALOG_PATH", "./config/catalog.yaml"));
    let jwt_ttl_hours = parse_u64("PYP_JWT_TTL_HOURS", "168")?;
    let admin_email = or_default("PYP_ADMIN_EMAIL", DEFAULT_ADMIN_EMAIL)
        .trim()
        .to_lowercase();

    let email_user = optional("EMAIL_USER");
    let email_pass = optional("EMAIL_PASS");
    let email_api_url = optional("PYP_EMAIL_API_URL");
    let gemini_api_key = optional("GEMINI_API_KEY");
    let gemini_model = or_default("PYP_GEMINI_MODEL", "gemini-2.5-flash");
    let http_timeout_secs = parse_u64("PYP_HTTP_TIMEOUT_SECS", "30")?;

    let db_max_connections = parse_u32("PYP_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("PYP_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("PYP_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        catalog_path,
        jwt_secret,
        jwt_ttl_hours,
        admin_email,
        email_user,
        email_pass,
        email_api_url,
        gemini_api_key,
        gemini_model,
        http_timeout_secs,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
    })
}

fn build_storefront_config<F>(lookup: F) -> Result<StorefrontConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let api_base_url = lookup("PYP_API_BASE_URL")
        .unwrap_or_else(|_| "http://localhost:5000".to_string())
        .trim_end_matches('/')
        .to_string();
    let state_dir = std::path::PathBuf::from(
        lookup("PYP_STATE_DIR").unwrap_or_else(|_| "./.pyp".to_string()),
    );
    let raw_timeout = lookup("PYP_HTTP_TIMEOUT_SECS").unwrap_or_else(|_| "30".to_string());
    let http_timeout_secs = raw_timeout
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: "PYP_HTTP_TIMEOUT_SECS".to_string(),
            reason: e.to_string(),
        })?;

    Ok(StorefrontConfig {
        api_base_url,
        state_dir,
        http_timeout_secs,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "PYP_ENV".to_string(),
            reason: format!("expected development, test, or production; got '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
