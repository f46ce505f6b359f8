use crate::app_config::{AppConfig, Environment, SheetsConfig, SheetsCredentials};
use crate::ConfigError;

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
/// Decoupled from the real environment so tests can pass a `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    // Blank values count as unset; `.env` templates often ship `KEY=`.
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
    let env = parse_environment(&or_default("STOREFRONT_ENV", "development"));

    let bind_addr = parse_addr("STOREFRONT_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("STOREFRONT_LOG_LEVEL", "info");

    let db_max_connections = parse_u32("STOREFRONT_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("STOREFRONT_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("STOREFRONT_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let request_timeout_secs = parse_u64("STOREFRONT_SHEETS_TIMEOUT_SECS", "30")?;
    let credentials = match (
        optional("GOOGLE_CLIENT_EMAIL"),
        optional("GOOGLE_PRIVATE_KEY"),
        optional("GOOGLE_ACCESS_TOKEN"),
    ) {
        (Some(client_email), Some(private_key), _) => Some(SheetsCredentials::ServiceAccount {
            client_email,
            private_key: unfold_newlines(&private_key),
        }),
        (_, _, Some(token)) => Some(SheetsCredentials::AccessToken(token)),
        _ => None,
    };
    let sheets = match (optional("GOOGLE_SHEET_ID"), credentials) {
        (Some(spreadsheet_id), Some(credentials)) => Some(SheetsConfig {
            spreadsheet_id,
            credentials,
            request_timeout_secs,
        }),
        _ => None,
    };

    let sheet_webhook_secret = optional("GOOGLE_SHEET_SECRET");
    let token_cleanup_cron = or_default("STOREFRONT_TOKEN_CLEANUP_CRON", "0 0 * * * *");
    let sheets_sync_cron = optional("STOREFRONT_SHEETS_SYNC_CRON");

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        sheets,
        sheet_webhook_secret,
        token_cleanup_cron,
        sheets_sync_cron,
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

/// PEM keys pasted into a single-line env var carry literal `\n` sequences.
fn unfold_newlines(raw: &str) -> String {
    raw.replace("\\n", "\n")
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
