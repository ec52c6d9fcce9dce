//! YAML configuration with environment overrides.

use std::path::{Path, PathBuf};
use std::time::Duration;

use persistence::default_sqlite_url;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_CONFIG_PATH: &str = "fleetcast.yaml";
/// Alternative config path when `--config` is not given.
pub const CONFIG_ENV: &str = "FLEETCAST_CONFIG";
/// Bearer token for the settings endpoints; wins over the file.
pub const TOKEN_ENV: &str = "FLEETCAST_API_TOKEN";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FleetConfig {
    pub database_url: String,
    /// Remote settings service; the local store is used when unset.
    pub settings_base_url: Option<String>,
    pub auth_token: Option<String>,
    pub request_timeout_secs: u64,
    pub log_level: String,
    /// Attribution written to parameter history.
    pub updated_by: String,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            database_url: default_sqlite_url().to_string(),
            settings_base_url: None,
            auth_token: None,
            request_timeout_secs: 10,
            log_level: "info".to_string(),
            updated_by: "system".to_string(),
        }
    }
}

impl FleetConfig {
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read `path`; a missing file means all defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(text) => {
                debug!(path = %path.display(), "loaded config file");
                Self::from_yaml(&text)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Resolve the path (`explicit`, then `FLEETCAST_CONFIG`, then the
    /// default), load it and apply the token override from the environment.
    pub fn load_from_env(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
        Ok(Self::load(&path)?.with_token(std::env::var(TOKEN_ENV).ok()))
    }

    /// Replace the auth token when `token` is set and non-empty.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            self.auth_token = Some(token);
        }
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database_url.trim().is_empty() {
            return Err(ConfigError::Invalid("database_url is empty".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid("request_timeout_secs must be positive".into()));
        }
        if let Some(url) = &self.settings_base_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::Invalid(format!(
                    "settings_base_url must be http(s): {url}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_is_default() {
        assert_eq!(FleetConfig::from_yaml("").unwrap(), FleetConfig::default());
        assert_eq!(FleetConfig::from_yaml("  \n").unwrap(), FleetConfig::default());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let cfg = FleetConfig::from_yaml(
            "settings_base_url: https://fleet.example.com\nupdated_by: ops\n",
        )
        .unwrap();
        assert_eq!(cfg.settings_base_url.as_deref(), Some("https://fleet.example.com"));
        assert_eq!(cfg.updated_by, "ops");
        assert_eq!(cfg.request_timeout_secs, 10);
        assert_eq!(cfg.database_url, default_sqlite_url());
    }

    #[test]
    fn malformed_file_is_an_error() {
        assert!(matches!(
            FleetConfig::from_yaml("request_timeout_secs: [1"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            FleetConfig::from_yaml("unknown_key: 1"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            FleetConfig::from_yaml("request_timeout_secs: 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            FleetConfig::from_yaml("settings_base_url: ftp://x"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn missing_file_is_default() {
        let path = std::env::temp_dir().join("fleetcast-does-not-exist.yaml");
        assert_eq!(FleetConfig::load(&path).unwrap(), FleetConfig::default());
    }

    #[test]
    fn token_override() {
        let cfg = FleetConfig::from_yaml("auth_token: from-file").unwrap();
        assert_eq!(
            cfg.clone().with_token(Some("from-env".into())).auth_token.as_deref(),
            Some("from-env")
        );
        assert_eq!(
            cfg.clone().with_token(Some(String::new())).auth_token.as_deref(),
            Some("from-file")
        );
        assert_eq!(cfg.with_token(None).auth_token.as_deref(), Some("from-file"));
    }
}
