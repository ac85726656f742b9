use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::history::RedoPolicy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for {name}: {value:?}")]
    InvalidEnv { name: &'static str, value: String },
}

/// Server settings. Every field has a default so a config file only needs
/// the keys it changes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub static_dir: PathBuf,
    pub max_upload_bytes: usize,
    /// When off, mock processors answer immediately.
    pub simulate_delays: bool,
    pub redo_policy: RedoPolicy,
    /// Seconds a browser session may sit idle before it is dropped.
    pub session_ttl_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            host: "127.0.0.1".to_string(),
            port: 5000,
            static_dir: PathBuf::from("static"),
            max_upload_bytes: 10 * 1024 * 1024,
            simulate_delays: true,
            redo_policy: RedoPolicy::Recorded,
            session_ttl_secs: 60 * 60,
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(input: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(input).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Defaults, overlaid with `path` when one is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(AppConfig::default());
        };

        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text, path)
    }

    /// Apply `HOST`, `PORT` and `CA_STATIC_DIR` through `lookup`, which is
    /// normally `std::env::var`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("HOST").filter(|h| !h.is_empty()) {
            self.host = host;
        }
        if let Some(port) = lookup("PORT").filter(|p| !p.is_empty()) {
            self.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidEnv { name: "PORT", value: port })?;
        }
        if let Some(dir) = lookup("CA_STATIC_DIR").filter(|d| !d.is_empty()) {
            self.static_dir = PathBuf::from(dir);
        }
        Ok(())
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn defaults_match_the_backend() {
        let config = AppConfig::default();
        assert_eq!(config.address(), "127.0.0.1:5000");
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(config.redo_policy, RedoPolicy::Recorded);
        assert!(config.simulate_delays);
        assert_eq!(config.session_ttl_secs, 3600);
    }

    #[test]
    fn file_overrides_only_named_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port = 8080\nredo_policy = \"staged_value\"\nsession_ttl_secs = 600").unwrap();

        let config = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.redo_policy, RedoPolicy::StagedValue);
        assert_eq!(config.session_ttl_secs, 600);
        assert_eq!(config.host, "127.0.0.1");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = AppConfig::from_toml_str("prot = 1", Path::new("ca.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppConfig::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn environment_overrides() {
        let env: HashMap<&str, &str> = [("HOST", "0.0.0.0"), ("PORT", "9000"), ("CA_STATIC_DIR", "dist")]
            .into_iter()
            .collect();
        let mut config = AppConfig::default();
        config
            .apply_env(|name| env.get(name).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.address(), "0.0.0.0:9000");
        assert_eq!(config.static_dir, PathBuf::from("dist"));

        let err = config
            .apply_env(|name| (name == "PORT").then(|| "http".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { name: "PORT", .. }));
    }
}
