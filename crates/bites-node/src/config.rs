//! Node configuration
//!
//! Values come from three layers, later ones winning: built-in defaults,
//! an optional TOML file, and command line flags.

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Console log output style
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable, for development
    #[default]
    Pretty,
    /// One JSON object per line, for log aggregation
    Json,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Configuration shared by every run mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// HTTP listen address of the gateway
    pub listen: SocketAddr,
    /// redb database file of the storage service
    pub db_path: PathBuf,
    /// NATS server used by the split run modes
    pub nats_url: String,
    /// Deadline for a single gateway query
    pub request_timeout_secs: u64,
    /// Default tracing filter; `RUST_LOG` takes precedence
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([0, 0, 0, 0], 8080)),
            db_path: PathBuf::from("/tmp/bites/bites.redb"),
            nats_url: "nats://localhost:4222".into(),
            request_timeout_secs: 10,
            log_level: "info".into(),
            log_format: LogFormat::Pretty,
        }
    }
}

/// Flag values that replace file values when present
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub listen: Option<SocketAddr>,
    pub db_path: Option<PathBuf>,
    pub nats_url: Option<String>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

impl NodeConfig {
    /// Load from a TOML file, or fall back to defaults when no file is given
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_toml(&contents).map_err(|source| ConfigError::Parse {
                    path: path.to_path_buf(),
                    source,
                })
            }
            None => Ok(Self::default()),
        }
    }

    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    pub fn apply(mut self, overrides: Overrides) -> Self {
        if let Some(listen) = overrides.listen {
            self.listen = listen;
        }
        if let Some(db_path) = overrides.db_path {
            self.db_path = db_path;
        }
        if let Some(nats_url) = overrides.nats_url {
            self.nats_url = nats_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.log_level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.log_format = log_format;
        }
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = NodeConfig::default();
        assert_eq!(config.listen.port(), 8080);
        assert_eq!(config.db_path, PathBuf::from("/tmp/bites/bites.redb"));
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = NodeConfig::from_toml(
            r#"
            listen = "127.0.0.1:9000"
            log_format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(config.listen, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.nats_url, "nats://localhost:4222");
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_unknown_format_is_rejected() {
        assert!(NodeConfig::from_toml(r#"log_format = "xml""#).is_err());
        assert!(NodeConfig::from_toml(r#"request_timeout_secs = "soon""#).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "db_path = \"/var/lib/bites/items.redb\"").unwrap();
        writeln!(file, "request_timeout_secs = 3").unwrap();

        let config = NodeConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.db_path, PathBuf::from("/var/lib/bites/items.redb"));
        assert_eq!(config.request_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn test_load_missing_file() {
        let err = NodeConfig::load(Some(Path::new("/nonexistent/bites.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert_eq!(NodeConfig::load(None).unwrap(), NodeConfig::default());
    }

    #[test]
    fn test_overrides_win() {
        let config = NodeConfig::default().apply(Overrides {
            nats_url: Some("nats://bus:4222".into()),
            log_level: Some("debug".into()),
            ..Default::default()
        });
        assert_eq!(config.nats_url, "nats://bus:4222");
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.listen.port(), 8080);
    }
}
