//! # Router Configuration
//!
//! [`RouterConfig`] is loaded from a TOML or YAML file (chosen by extension)
//! and then overridden by environment variables.
//!
//! ## Environment Variables
//!
//! | Variable | Field | Default |
//! |---|---|---|
//! | `JAXR_MAX_LOCATOR_DEPTH` | `max_locator_depth` | `64` |
//! | `JAXR_LOCATOR_CACHE` | `locator_cache` | `true` |
//! | `JAXR_OPTIONS_DESCRIPTION` | `options_description` | `true` |
//! | `JAXR_ASYNC_TIMEOUT_MS` | `async_timeout_ms` | `30000` (`0` disables) |
//! | `JAXR_DEFAULT_MAPPER_PRIORITY` | `default_mapper_priority` | `5000` |
//! | `JAXR_RELOAD_DEBOUNCE_MS` | `reload_debounce_ms` | `200` |
//! | `JAXR_LOG_LEVEL` | `log.level` | `info` |
//! | `JAXR_LOG_FORMAT` | `log.format` | `json` |
//!
//! ## Example
//!
//! ```toml
//! max_locator_depth = 16
//! async_timeout_ms = 5000
//!
//! [log]
//! level = "debug"
//! format = "pretty"
//!
//! [properties]
//! "app.name" = "pets"
//! ```

use crate::exception::USER_PRIORITY;
use crate::logging::{LogConfig, LogFormat};
use crate::router::DEFAULT_MAX_LOCATOR_DEPTH;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid TOML config {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid YAML config {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("unsupported config extension for {path} (expected .toml, .yaml or .yml)")]
    UnsupportedFormat { path: PathBuf },
    #[error("invalid value `{value}` for {variable}")]
    InvalidEnv { variable: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSection {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Json,
        }
    }
}

impl LogSection {
    /// Logging configuration with the environment's filter extras.
    #[must_use]
    pub fn to_log_config(&self) -> LogConfig {
        LogConfig {
            log_level: self.level.clone(),
            format: self.format,
            ..LogConfig::from_env()
        }
    }
}

/// Router properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Cap on locator invocations per request; exceeding it is a 500.
    pub max_locator_depth: usize,
    /// Cache compiled nodes of classes returned by locators.
    pub locator_cache: bool,
    /// Answer wildcard OPTIONS requests with a JSON resource description.
    pub options_description: bool,
    /// How long a suspended response may stay pending; 0 waits forever.
    pub async_timeout_ms: u64,
    pub default_mapper_priority: u32,
    pub reload_debounce_ms: u64,
    pub properties: BTreeMap<String, String>,
    pub log: LogSection,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            max_locator_depth: DEFAULT_MAX_LOCATOR_DEPTH,
            locator_cache: true,
            options_description: true,
            async_timeout_ms: 30_000,
            default_mapper_priority: USER_PRIORITY,
            reload_debounce_ms: 200,
            properties: BTreeMap::new(),
            log: LogSection::default(),
        }
    }
}

fn env_parse<T: std::str::FromStr>(variable: &str) -> Result<Option<T>, ConfigError> {
    match env::var(variable) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv {
                variable: variable.to_string(),
                value,
            }),
        Err(_) => Ok(None),
    }
}

impl RouterConfig {
    /// Parse a config file, TOML or YAML by extension.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] for unreadable files, parse failures or unknown extensions.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => toml::from_str(&text).map_err(|source| ConfigError::Toml {
                path: path.to_path_buf(),
                source,
            }),
            Some("yaml" | "yml") => serde_yaml::from_str(&text).map_err(|source| ConfigError::Yaml {
                path: path.to_path_buf(),
                source,
            }),
            _ => Err(ConfigError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }

    /// Apply `JAXR_*` overrides.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidEnv`] when a variable does not parse.
    pub fn apply_env(mut self) -> Result<Self, ConfigError> {
        if let Some(v) = env_parse("JAXR_MAX_LOCATOR_DEPTH")? {
            self.max_locator_depth = v;
        }
        if let Some(v) = env_parse("JAXR_LOCATOR_CACHE")? {
            self.locator_cache = v;
        }
        if let Some(v) = env_parse("JAXR_OPTIONS_DESCRIPTION")? {
            self.options_description = v;
        }
        if let Some(v) = env_parse("JAXR_ASYNC_TIMEOUT_MS")? {
            self.async_timeout_ms = v;
        }
        if let Some(v) = env_parse("JAXR_DEFAULT_MAPPER_PRIORITY")? {
            self.default_mapper_priority = v;
        }
        if let Some(v) = env_parse("JAXR_RELOAD_DEBOUNCE_MS")? {
            self.reload_debounce_ms = v;
        }
        if let Ok(level) = env::var("JAXR_LOG_LEVEL") {
            self.log.level = level;
        }
        if let Ok(format) = env::var("JAXR_LOG_FORMAT") {
            self.log.format = LogFormat::parse(&format);
        }
        Ok(self)
    }

    /// Defaults, then the optional file, then the environment.
    ///
    /// # Errors
    ///
    /// See [`from_file`](Self::from_file) and [`apply_env`](Self::apply_env).
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let base = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        base.apply_env()
    }

    #[must_use]
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(suffix)
            .tempfile()
            .expect("temp file");
        file.write_all(contents.as_bytes()).expect("write");
        file
    }

    #[test]
    fn test_defaults() {
        let config = RouterConfig::default();
        assert_eq!(config.max_locator_depth, 64);
        assert!(config.locator_cache);
        assert!(config.options_description);
        assert_eq!(config.async_timeout_ms, 30_000);
        assert_eq!(config.default_mapper_priority, 5000);
    }

    #[test]
    fn test_from_toml() {
        let file = write_temp(
            ".toml",
            "max_locator_depth = 8\nlocator_cache = false\n[log]\nlevel = \"debug\"\nformat = \"pretty\"\n[properties]\n\"app.name\" = \"pets\"\n",
        );
        let config = RouterConfig::from_file(file.path()).expect("config");
        assert_eq!(config.max_locator_depth, 8);
        assert!(!config.locator_cache);
        assert_eq!(config.async_timeout_ms, 30_000);
        assert_eq!(config.log.format, LogFormat::Pretty);
        assert_eq!(config.property("app.name"), Some("pets"));
    }

    #[test]
    fn test_from_yaml() {
        let file = write_temp(".yaml", "async_timeout_ms: 0\noptions_description: false\n");
        let config = RouterConfig::from_file(file.path()).expect("config");
        assert_eq!(config.async_timeout_ms, 0);
        assert!(!config.options_description);
        assert_eq!(config.max_locator_depth, 64);
    }

    #[test]
    fn test_unknown_extension() {
        let file = write_temp(".ini", "x=1");
        assert!(matches!(
            RouterConfig::from_file(file.path()),
            Err(ConfigError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn test_invalid_toml_reports_path() {
        let file = write_temp(".toml", "max_locator_depth = \"deep\"");
        let err = RouterConfig::from_file(file.path()).expect_err("must fail");
        assert!(err.to_string().contains("invalid TOML config"));
    }
}
