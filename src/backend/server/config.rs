/**
 * Server Configuration
 *
 * This module loads the server configuration from environment variables,
 * with an optional TOML file for deployments that prefer one.
 *
 * # Configuration Sources
 *
 * 1. Environment variables (a `.env` file is loaded by the binary)
 * 2. The TOML file named by `TOWNSQUARE_CONFIG`, using the same keys in
 *    lowercase (`jwt_secret`, `link_reputation_api_key`, ...)
 *
 * Environment variables win over the file.
 *
 * # Optional Services
 *
 * The database, the link reputation service and the content safety service
 * are all optional. When one is missing the server still starts: the
 * in-memory store is used instead of PostgreSQL, and the moderation tiers
 * that need the missing service fail open.
 */

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use sqlx::PgPool;

use crate::backend::moderation::fallback::FallbackPolicy;
use crate::backend::moderation::links::LinkCheckSettings;
use crate::shared::config::{ConfigError, ServiceConfig};

/// Environment variable naming the optional TOML config file
pub const CONFIG_FILE_VAR: &str = "TOWNSQUARE_CONFIG";

/// Default VirusTotal API host
pub const DEFAULT_LINK_REPUTATION_URL: &str = "https://www.virustotal.com";

pub const DEFAULT_PORT: u16 = 3000;

/// Resolved server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// PostgreSQL connection string; `None` runs on the in-memory store
    pub database_url: Option<String>,
    /// HS256 secret shared with the identity provider
    pub jwt_secret: String,
    pub link_reputation: Option<ServiceConfig>,
    pub content_safety: Option<ServiceConfig>,
    pub fallback: FallbackPolicy,
    pub link_check: LinkCheckSettings,
}

impl ServerConfig {
    /// Load configuration from the process environment and the optional file
    pub fn from_env() -> Result<Self, ConfigError> {
        let file_values = match std::env::var(CONFIG_FILE_VAR) {
            Ok(path) if !path.trim().is_empty() => load_file(path.trim())?,
            _ => HashMap::new(),
        };

        Self::from_lookup(|key| {
            std::env::var(key)
                .ok()
                .or_else(|| file_values.get(&key.to_ascii_lowercase()).cloned())
        })
    }

    /// Build the configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let port = parse(&get, "SERVER_PORT")?.unwrap_or(DEFAULT_PORT);
        let jwt_secret = get("JWT_SECRET").ok_or(ConfigError::MissingValue("JWT_SECRET"))?;

        let mut fallback = FallbackPolicy::default();
        if let Some(ms) = parse::<u64, _>(&get, "MODERATION_TIMEOUT_MS")? {
            if ms == 0 {
                return Err(ConfigError::InvalidTimeout);
            }
            fallback.timeout = Duration::from_millis(ms);
        }
        if let Some(retries) = parse(&get, "MODERATION_RETRIES")? {
            fallback.retries = retries;
        }

        let mut link_check = LinkCheckSettings::default();
        if let Some(secs) = parse::<u64, _>(&get, "LINK_CACHE_TTL_SECS")? {
            link_check.cache_ttl = Duration::from_secs(secs);
        }
        if let Some(capacity) = parse(&get, "LINK_CACHE_CAPACITY")? {
            link_check.cache_capacity = capacity;
        }
        if let Some(max_urls) = parse(&get, "MAX_URLS_PER_MESSAGE")? {
            link_check.max_urls = max_urls;
        }

        let link_reputation = match get("LINK_REPUTATION_API_KEY") {
            Some(api_key) => Some(
                ServiceConfig::builder()
                    .base_url(
                        get("LINK_REPUTATION_URL")
                            .unwrap_or_else(|| DEFAULT_LINK_REPUTATION_URL.to_string()),
                    )
                    .api_key(api_key)
                    .timeout(fallback.timeout)
                    .build()?,
            ),
            None => None,
        };

        let content_safety = match get("CONTENT_SAFETY_API_KEY") {
            Some(api_key) => {
                let mut builder = ServiceConfig::builder()
                    .api_key(api_key)
                    .timeout(fallback.timeout);
                if let Some(endpoint) = get("CONTENT_SAFETY_ENDPOINT") {
                    builder = builder.base_url(endpoint);
                }
                Some(builder.build()?)
            }
            None => None,
        };

        Ok(Self {
            port,
            database_url: get("DATABASE_URL"),
            jwt_secret,
            link_reputation,
            content_safety,
            fallback,
            link_check,
        })
    }
}

fn parse<T, G>(get: &G, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    get(key)
        .map(|value| {
            value
                .parse::<T>()
                .map_err(|_| ConfigError::InvalidValue { key, value })
        })
        .transpose()
}

/// Read a flat TOML table into lowercase key/value strings
fn load_file(path: &str) -> Result<HashMap<String, String>, ConfigError> {
    let file_error = |message: String| ConfigError::File {
        path: path.to_string(),
        message,
    };

    let contents = std::fs::read_to_string(path).map_err(|e| file_error(e.to_string()))?;
    let table: toml::Table = toml::from_str(&contents).map_err(|e| file_error(e.to_string()))?;

    Ok(table
        .into_iter()
        .filter_map(|(key, value)| {
            let value = match value {
                toml::Value::String(s) => s,
                toml::Value::Integer(i) => i.to_string(),
                toml::Value::Float(f) => f.to_string(),
                toml::Value::Boolean(b) => b.to_string(),
                other => {
                    tracing::warn!(key = %key, "Ignoring non-scalar config value: {}", other);
                    return None;
                }
            };
            Some((key.to_ascii_lowercase(), value))
        })
        .collect())
}

/// Connect to PostgreSQL
///
/// # Returns
///
/// - `Some(PgPool)` if the connection succeeds
/// - `None` if no URL is configured or the connection fails
///
/// Errors are logged but do not prevent server startup; the caller falls back
/// to the in-memory store.
pub async fn load_database(database_url: Option<&str>) -> Option<PgPool> {
    let database_url = match database_url {
        Some(url) => url,
        None => {
            tracing::warn!("DATABASE_URL not set. Using the in-memory document store.");
            return None;
        }
    };

    tracing::info!("Connecting to database...");

    match PgPool::connect(database_url).await {
        Ok(pool) => {
            tracing::info!("Database connection pool created successfully");
            Some(pool)
        }
        Err(e) => {
            tracing::error!("Failed to create database connection pool: {:?}", e);
            tracing::warn!("Using the in-memory document store.");
            None
        }
    }
}
