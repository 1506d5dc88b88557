#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Application configuration.
//!
//! Settings are read from an optional TOML file (path in
//! `SOLAR_MAP_CONFIG`, default `solar_map.toml`) and then overridden by
//! individual environment variables. A missing file means defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use solar_map_analytics_models::AnalysisConfig;
use solar_map_features::{DataSource, FetchPolicy, SourceInput};
use thiserror::Error;

/// Environment variable naming the config file.
pub const CONFIG_PATH_VAR: &str = "SOLAR_MAP_CONFIG";

/// Config file used when [`CONFIG_PATH_VAR`] is unset.
pub const DEFAULT_CONFIG_PATH: &str = "solar_map.toml";

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid TOML for [`AppConfig`].
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// An environment override has an unparseable value.
    #[error("Invalid value for {key}: {value}")]
    Invalid {
        /// Environment variable name.
        key: String,
        /// The rejected value.
        value: String,
    },
}

/// Where the customer dataset comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Primary source: a file path, URL or inline JSON.
    pub source: String,
    /// Sources tried in order when the primary fails or is empty.
    pub fallbacks: Vec<String>,
    /// Per-request timeout for remote sources, in seconds.
    pub timeout_secs: u64,
    /// Retries after the first attempt for remote sources.
    pub max_retries: u32,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            source: "data/geojson.geojson".to_string(),
            fallbacks: vec!["data/geojson.json".to_string()],
            timeout_secs: 30,
            max_retries: 2,
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub bind_addr: String,
    /// Listen port.
    pub port: u16,
    /// Directory served under `/data`.
    pub data_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_string(),
            port: 8080,
            data_dir: PathBuf::from("data"),
        }
    }
}

/// Editorial store settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorialConfig {
    /// `SQLite` database file.
    pub db_path: PathBuf,
}

impl Default for EditorialConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("data/editorial.db"),
        }
    }
}

/// Admin gate settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Hex SHA-256 of the admin password. Login is disabled when unset.
    pub password_hash: Option<String>,
    /// Session lifetime in hours.
    pub session_hours: u32,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            password_hash: None,
            session_hours: 8,
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Dataset location and fetch policy.
    pub data: DataConfig,
    /// Analysis parameters.
    pub analysis: AnalysisConfig,
    /// HTTP server.
    pub server: ServerConfig,
    /// Editorial store.
    pub editorial: EditorialConfig,
    /// Admin gate.
    pub admin: AdminConfig,
}

fn parse_var<T: std::str::FromStr>(key: &str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid {
            key: key.to_string(),
            value,
        })
}

impl AppConfig {
    /// Parses a TOML document. Absent sections and keys keep defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Toml`] if the document is invalid.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads a TOML file, returning defaults if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file exists but cannot be read or
    /// parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.is_file() {
            log::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        log::info!("Loading config from {}", path.display());
        Self::from_toml_str(&std::fs::read_to_string(path)?)
    }

    /// Loads the config file named by the environment and applies
    /// environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file or an override is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_VAR)
            .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut config = Self::from_file(Path::new(&path))?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Applies overrides from `lookup`, which maps variable names to
    /// values. Blank values are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a numeric override does not
    /// parse.
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("GEOJSON_SOURCE") {
            self.data.source = v;
        }
        if let Some(v) = get("GEOJSON_FALLBACKS") {
            self.data.fallbacks = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToString::to_string)
                .collect();
        }
        if let Some(v) = get("FETCH_TIMEOUT_SECS") {
            self.data.timeout_secs = parse_var("FETCH_TIMEOUT_SECS", v)?;
        }
        if let Some(v) = get("FETCH_MAX_RETRIES") {
            self.data.max_retries = parse_var("FETCH_MAX_RETRIES", v)?;
        }
        if let Some(v) = get("KMEANS_K") {
            self.analysis.k = parse_var("KMEANS_K", v)?;
        }
        if let Some(v) = get("ANALYSIS_SEED") {
            self.analysis.seed = Some(parse_var("ANALYSIS_SEED", v)?);
        }
        if let Some(v) = get("BIND_ADDR") {
            self.server.bind_addr = v;
        }
        if let Some(v) = get("PORT") {
            self.server.port = parse_var("PORT", v)?;
        }
        if let Some(v) = get("DATA_DIR") {
            self.server.data_dir = PathBuf::from(v);
        }
        if let Some(v) = get("EDITORIAL_DB_PATH") {
            self.editorial.db_path = PathBuf::from(v);
        }
        if let Some(v) = get("ADMIN_PASSWORD_HASH") {
            self.admin.password_hash = Some(v.trim().to_lowercase());
        }
        if let Some(v) = get("ADMIN_SESSION_HOURS") {
            self.admin.session_hours = parse_var("ADMIN_SESSION_HOURS", v)?;
        }

        Ok(())
    }

    /// Fetch policy for remote sources.
    #[must_use]
    pub fn fetch_policy(&self) -> FetchPolicy {
        FetchPolicy {
            timeout: Duration::from_secs(self.data.timeout_secs),
            max_retries: self.data.max_retries,
            ..FetchPolicy::default()
        }
    }

    /// The configured primary source followed by its fallbacks.
    #[must_use]
    pub fn data_source(&self) -> DataSource {
        self.data_source_from(&self.data.source)
    }

    /// `primary` followed by the configured fallbacks.
    #[must_use]
    pub fn data_source_from(&self, primary: &str) -> DataSource {
        self.data
            .fallbacks
            .iter()
            .filter(|f| f.as_str() != primary)
            .fold(
                DataSource::new(SourceInput::detect(primary)),
                |source, fallback| source.with_fallback(SourceInput::detect(fallback)),
            )
            .with_policy(self.fetch_policy())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = AppConfig::default();
        assert_eq!(config.analysis.k, 4);
        assert_eq!(config.admin.session_hours, 8);
        assert!(config.admin.password_hash.is_none());
        assert_eq!(config.data_source().strategies().len(), 2);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [data]
            source = "https://example.com/pr.geojson"

            [analysis]
            k = 6
            seed = 42

            [server]
            port = 9000
            "#,
        )
        .unwrap();
        assert_eq!(config.data.source, "https://example.com/pr.geojson");
        assert_eq!(config.data.fallbacks, ["data/geojson.json"]);
        assert_eq!(config.analysis.k, 6);
        assert_eq!(config.analysis.seed, Some(42));
        assert!((config.analysis.monthly_growth_rate - 0.05).abs() < f64::EPSILON);
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.bind_addr, "127.0.0.1");
    }

    #[test]
    fn invalid_toml_is_an_error() {
        assert!(matches!(
            AppConfig::from_toml_str("[server]\nport = \"eighty\""),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn missing_file_gives_defaults() {
        let config = AppConfig::from_file(Path::new("/definitely/not/here.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn env_overrides_file() {
        let mut config = AppConfig::default();
        config
            .apply_env(env(&[
                ("GEOJSON_FALLBACKS", "a.json, ,b.json"),
                ("KMEANS_K", "3"),
                ("ANALYSIS_SEED", "7"),
                ("PORT", "3000"),
                ("ADMIN_PASSWORD_HASH", "ABCDEF"),
                ("BIND_ADDR", "   "),
            ]))
            .unwrap();
        assert_eq!(config.data.fallbacks, ["a.json", "b.json"]);
        assert_eq!(config.analysis.k, 3);
        assert_eq!(config.analysis.seed, Some(7));
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.admin.password_hash.as_deref(), Some("abcdef"));
        assert_eq!(config.server.bind_addr, "127.0.0.1");
    }

    #[test]
    fn bad_number_is_rejected() {
        let mut config = AppConfig::default();
        let err = config.apply_env(env(&[("PORT", "http")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref key, .. } if key == "PORT"));
    }

    #[test]
    fn data_source_skips_duplicate_fallback() {
        let mut config = AppConfig::default();
        config.data.fallbacks = vec!["data/geojson.geojson".to_string(), "x.json".to_string()];
        let source = config.data_source();
        assert_eq!(source.strategies().len(), 2);
        assert_eq!(source.policy().timeout, Duration::from_secs(30));
    }
}
