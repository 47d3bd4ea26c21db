//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Which document store backs the product repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    MongoDb,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mongodb" | "mongo" => Ok(StoreBackend::MongoDb),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!("unknown store backend '{}'", other)),
        }
    }
}

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Deployment environment name (`development`, `production`, ...)
    pub environment: String,
    /// Repository backend
    pub store_backend: StoreBackend,
    /// MongoDB connection string
    pub mongo_url: String,
    /// MongoDB database name
    pub mongo_database: String,
    /// MongoDB collection holding products
    pub mongo_collection: String,
    /// CORS origins, `*` meaning any
    pub allowed_origins: Vec<String>,
    /// Rate limiting window
    pub rate_limit_window_secs: u64,
    /// Requests allowed per client per window
    pub rate_limit_max: u32,
    /// Response cache TTL in seconds
    pub cache_ttl: u64,
    /// Maximum number of cached responses
    pub cache_max_entries: usize,
    /// Background cleanup task interval in seconds
    pub cleanup_interval: u64,
    pub pagination: PaginationConfig,
}

/// Page size defaults and bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationConfig {
    pub default_page: u64,
    pub default_limit: u64,
    pub max_limit: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page: 1,
            default_limit: 10,
            max_limit: 100,
        }
    }
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `PORT` - HTTP server port (default: 3000)
    /// - `APP_ENV` - Environment name (default: development)
    /// - `STORE_BACKEND` - `mongodb` or `memory` (default: mongodb)
    /// - `MONGO_URL` - Connection string (default: mongodb://localhost:27017)
    /// - `MONGO_DATABASE` - Database name (default: catalog)
    /// - `MONGO_COLLECTION` - Collection name (default: products)
    /// - `ALLOWED_ORIGINS` - Comma separated CORS origins (default: *)
    /// - `RATE_LIMIT_WINDOW_SECS` - Rate limit window (default: 900)
    /// - `RATE_LIMIT_MAX` - Requests per window (default: 100 in production, 1000 otherwise)
    /// - `CACHE_TTL_SECS` - Response cache TTL (default: 300)
    /// - `CACHE_MAX_ENTRIES` - Response cache capacity (default: 100)
    /// - `CLEANUP_INTERVAL_SECS` - Cleanup frequency (default: 60)
    /// - `DEFAULT_PAGE_LIMIT` - Page size when none is given (default: 10)
    /// - `MAX_PAGE_LIMIT` - Upper bound on page size (default: 100)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let environment = env::var("APP_ENV").unwrap_or(defaults.environment);
        let default_rate_max = if environment == "production" { 100 } else { 1000 };

        Self {
            server_port: parse_var("PORT", defaults.server_port),
            store_backend: parse_var("STORE_BACKEND", defaults.store_backend),
            mongo_url: env::var("MONGO_URL").unwrap_or(defaults.mongo_url),
            mongo_database: env::var("MONGO_DATABASE").unwrap_or(defaults.mongo_database),
            mongo_collection: env::var("MONGO_COLLECTION").unwrap_or(defaults.mongo_collection),
            allowed_origins: env::var("ALLOWED_ORIGINS")
                .ok()
                .map(|v| split_origins(&v))
                .filter(|origins| !origins.is_empty())
                .unwrap_or(defaults.allowed_origins),
            rate_limit_window_secs: parse_var(
                "RATE_LIMIT_WINDOW_SECS",
                defaults.rate_limit_window_secs,
            ),
            rate_limit_max: parse_var("RATE_LIMIT_MAX", default_rate_max),
            cache_ttl: parse_var("CACHE_TTL_SECS", defaults.cache_ttl),
            cache_max_entries: parse_var("CACHE_MAX_ENTRIES", defaults.cache_max_entries),
            cleanup_interval: parse_var("CLEANUP_INTERVAL_SECS", defaults.cleanup_interval),
            pagination: PaginationConfig {
                default_page: 1,
                default_limit: parse_var("DEFAULT_PAGE_LIMIT", defaults.pagination.default_limit),
                max_limit: parse_var("MAX_PAGE_LIMIT", defaults.pagination.max_limit),
            },
            environment,
        }
    }

    /// True when internal error detail may be returned to clients.
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl)
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            environment: "development".to_string(),
            store_backend: StoreBackend::MongoDb,
            mongo_url: "mongodb://localhost:27017".to_string(),
            mongo_database: "catalog".to_string(),
            mongo_collection: "products".to_string(),
            allowed_origins: vec!["*".to_string()],
            rate_limit_window_secs: 15 * 60,
            rate_limit_max: 1000,
            cache_ttl: 300,
            cache_max_entries: 100,
            cleanup_interval: 60,
            pagination: PaginationConfig::default(),
        }
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.cache_ttl, 300);
        assert_eq!(config.cache_max_entries, 100);
        assert_eq!(config.rate_limit_window_secs, 900);
        assert_eq!(config.pagination.default_limit, 10);
        assert_eq!(config.pagination.max_limit, 100);
        assert!(config.is_development());
    }

    #[test]
    fn test_store_backend_parse() {
        assert_eq!("mongodb".parse::<StoreBackend>(), Ok(StoreBackend::MongoDb));
        assert_eq!("Memory".parse::<StoreBackend>(), Ok(StoreBackend::Memory));
        assert!("postgres".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn test_split_origins() {
        assert_eq!(
            split_origins("https://a.example, https://b.example,,"),
            vec!["https://a.example", "https://b.example"]
        );
    }

    #[test]
    fn test_production_is_not_development() {
        let config = Config {
            environment: "production".to_string(),
            ..Config::default()
        };
        assert!(!config.is_development());
    }
}
