//! Application configuration loaded from environment variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use domain::CampCatalog;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read catalog {path}: {source}")]
    CatalogRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid catalog {path}: {source}")]
    CatalogParse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default `"0.0.0.0"`)
/// - `PORT`: listen port (default `3000`)
/// - `RUST_LOG`: tracing filter directive (default `"info"`)
/// - `DATABASE_URL`: Postgres event store; in-memory when unset
/// - `CATALOG_PATH`: JSON session catalog; empty catalog when unset
/// - `NOTIFY_TIMEOUT_MS`: billing notification timeout (default `2000`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub catalog_path: Option<PathBuf>,
    pub notify_timeout: Duration,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: std::env::var("RUST_LOG").unwrap_or(defaults.log_level),
            database_url: non_empty_var("DATABASE_URL"),
            catalog_path: non_empty_var("CATALOG_PATH").map(PathBuf::from),
            notify_timeout: std::env::var("NOTIFY_TIMEOUT_MS")
                .ok()
                .and_then(|ms| ms.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.notify_timeout),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Loads the session catalog, or an empty one when no path is configured.
    pub fn load_catalog(&self) -> Result<CampCatalog, ConfigError> {
        match &self.catalog_path {
            Some(path) => read_catalog(path),
            None => {
                tracing::warn!("CATALOG_PATH not set, starting with an empty session catalog");
                Ok(CampCatalog::new())
            }
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            database_url: None,
            catalog_path: None,
            notify_timeout: escalation::DEFAULT_NOTIFY_TIMEOUT,
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn read_catalog(path: &Path) -> Result<CampCatalog, ConfigError> {
    let json = std::fs::read_to_string(path).map_err(|source| ConfigError::CatalogRead {
        path: path.to_path_buf(),
        source,
    })?;
    CampCatalog::from_json(&json).map_err(|source| ConfigError::CatalogParse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.notify_timeout, Duration::from_millis(2000));
        assert!(config.database_url.is_none());
    }

    #[test]
    fn test_addr_formatting() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ..Config::default()
        };
        assert_eq!(config.addr(), "127.0.0.1:8080");
    }

    #[test]
    fn missing_catalog_path_gives_empty_catalog() {
        let catalog = Config::default().load_catalog().unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn unreadable_catalog_is_an_error() {
        let config = Config {
            catalog_path: Some(PathBuf::from("/nonexistent/catalog.json")),
            ..Config::default()
        };
        assert!(matches!(
            config.load_catalog(),
            Err(ConfigError::CatalogRead { .. })
        ));
    }
}
