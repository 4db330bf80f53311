//! Application Configuration
//!
//! TOML file with every field defaulted, overridable by `ADOTEME_*`
//! environment variables.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use rolling_logger::{LoggerConfig, DEFAULT_KEEP, DEFAULT_MAX_BYTES};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::{Persist, RefreshPolicy};

/// Prefix of environment overrides
pub const ENV_PREFIX: &str = "ADOTEME_";

/// Name used for the log file
pub const APP_NAME: &str = "adoteme";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid setting: {0}")]
    Invalid(String),
}

/// Where the catalog lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Bundled sample pets in memory
    #[default]
    Seed,
    /// Firestore documents and Firebase Storage blobs
    Firebase,
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "seed" => Ok(Backend::Seed),
            "firebase" => Ok(Backend::Firebase),
            other => Err(format!("unknown backend: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FirebaseConfig {
    pub project_id: Option<String>,
    pub api_key: Option<String>,
    pub storage_bucket: Option<String>,
    /// Signed-in user's token, sent as a bearer credential
    pub id_token: Option<String>,
    pub database: String,
}

impl Default for FirebaseConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            api_key: None,
            storage_bucket: None,
            id_token: None,
            database: "(default)".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Write favorite toggles to the store instead of keeping them per session
    pub persist_favorites: bool,
    pub refresh_policy: RefreshPolicy,
    /// Artificial delay of the seed backend
    pub simulated_latency_ms: u64,
}

impl CatalogConfig {
    pub fn persist(&self) -> Persist {
        if self.persist_favorites {
            Persist::Remote
        } else {
            Persist::LocalOnly
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub dir: Option<PathBuf>,
    pub max_bytes: u64,
    pub keep: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: None,
            max_bytes: DEFAULT_MAX_BYTES,
            keep: DEFAULT_KEEP,
        }
    }
}

impl LogConfig {
    pub fn to_logger_config(&self) -> LoggerConfig {
        LoggerConfig {
            app_name: APP_NAME.to_string(),
            level: self.level.clone(),
            dir: self.dir.clone(),
            max_bytes: self.max_bytes,
            keep: self.keep,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub backend: Backend,
    pub firebase: FirebaseConfig,
    pub catalog: CatalogConfig,
    pub log: LogConfig,
}

fn parse<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::Invalid(format!("{}{}={}", ENV_PREFIX, key, value)))
}

fn non_empty(value: String) -> Option<String> {
    Some(value).filter(|v| !v.is_empty())
}

impl AppConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Read a config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Read a config file (if given), apply the process environment and validate
    pub fn load_with_env(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_env(std::env::vars())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `ADOTEME_*` overrides; other variables are ignored
    pub fn apply_env<I>(&mut self, vars: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (name, value) in vars {
            let Some(key) = name.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            match key {
                "BACKEND" => self.backend = parse(key, &value)?,
                "FIREBASE_PROJECT_ID" => self.firebase.project_id = non_empty(value),
                "FIREBASE_API_KEY" => self.firebase.api_key = non_empty(value),
                "FIREBASE_STORAGE_BUCKET" => self.firebase.storage_bucket = non_empty(value),
                "FIREBASE_ID_TOKEN" => self.firebase.id_token = non_empty(value),
                "FIREBASE_DATABASE" => self.firebase.database = value,
                "PERSIST_FAVORITES" => self.catalog.persist_favorites = parse(key, &value)?,
                "REFRESH_POLICY" => self.catalog.refresh_policy = parse(key, &value)?,
                "SIMULATED_LATENCY_MS" => self.catalog.simulated_latency_ms = parse(key, &value)?,
                "LOG_LEVEL" => self.log.level = value,
                "LOG_DIR" => self.log.dir = non_empty(value).map(PathBuf::from),
                _ => log::warn!("ignoring unknown setting {}", name),
            }
        }
        Ok(())
    }

    /// Check settings the chosen backend needs
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend == Backend::Firebase {
            if self.firebase.project_id.is_none() {
                return Err(ConfigError::Invalid("firebase.project_id is required".to_string()));
            }
            if self.firebase.storage_bucket.is_none() {
                return Err(ConfigError::Invalid("firebase.storage_bucket is required".to_string()));
            }
        }
        if self.firebase.database.is_empty() {
            return Err(ConfigError::Invalid("firebase.database must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.backend, Backend::Seed);
        assert_eq!(config.catalog.refresh_policy, RefreshPolicy::CompletionOrder);
        assert_eq!(config.catalog.persist(), Persist::LocalOnly);
        assert_eq!(config.firebase.database, "(default)");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_file() {
        let config = AppConfig::from_toml_str(
            r#"
            backend = "firebase"

            [firebase]
            project_id = "adoteme-demo"
            api_key = "key"
            storage_bucket = "adoteme-demo.appspot.com"

            [catalog]
            persist_favorites = true
            refresh_policy = "latest-issued"

            [log]
            level = "adoteme=debug"
            keep = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.backend, Backend::Firebase);
        assert_eq!(config.firebase.project_id.as_deref(), Some("adoteme-demo"));
        assert_eq!(config.catalog.persist(), Persist::Remote);
        assert_eq!(config.catalog.refresh_policy, RefreshPolicy::LatestIssued);
        assert_eq!(config.log.keep, 5);
        assert_eq!(config.log.max_bytes, DEFAULT_MAX_BYTES);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_backend_is_parse_error() {
        assert!(matches!(
            AppConfig::from_toml_str(r#"backend = "sqlite""#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::default();
        config
            .apply_env(vars(&[
                ("ADOTEME_BACKEND", "firebase"),
                ("ADOTEME_FIREBASE_PROJECT_ID", "p"),
                ("ADOTEME_FIREBASE_STORAGE_BUCKET", "b"),
                ("ADOTEME_REFRESH_POLICY", "latest-issued"),
                ("ADOTEME_SIMULATED_LATENCY_MS", "800"),
                ("ADOTEME_LOG_DIR", ""),
                ("HOME", "/root"),
            ]))
            .unwrap();

        assert_eq!(config.backend, Backend::Firebase);
        assert_eq!(config.firebase.project_id.as_deref(), Some("p"));
        assert_eq!(config.catalog.refresh_policy, RefreshPolicy::LatestIssued);
        assert_eq!(config.catalog.simulated_latency_ms, 800);
        assert_eq!(config.log.dir, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bad_env_value() {
        let mut config = AppConfig::default();
        let err = config
            .apply_env(vars(&[("ADOTEME_PERSIST_FAVORITES", "sometimes")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("PERSIST_FAVORITES")));
    }

    #[test]
    fn test_firebase_requires_project() {
        let config = AppConfig {
            backend: Backend::Firebase,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("adoteme.toml");
        std::fs::write(&path, "[catalog]\nsimulated_latency_ms = 800\n").unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.catalog.simulated_latency_ms, 800);

        let missing = AppConfig::load(&dir.path().join("missing.toml"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_logger_config() {
        let logger = LogConfig::default().to_logger_config();
        assert_eq!(logger.app_name, APP_NAME);
        assert_eq!(logger.level, "info");
        assert_eq!(logger.keep, DEFAULT_KEEP);
    }
}
