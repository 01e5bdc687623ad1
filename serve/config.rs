use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_MODEL_PATH: &str = "model.toml";
pub const DEFAULT_BIND: &str = "127.0.0.1:5000";
pub const DEFAULT_TITLE: &str = "Student GPA Predictor";

/// Resolved settings for the web server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Artifact path, relative to the process working directory unless absolute.
    pub model_path: PathBuf,
    pub bind: SocketAddr,
    /// Heading and page title shown on every view.
    pub title: String,
}

/// On-disk form of `ServerConfig`. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfigFile {
    pub model_path: Option<PathBuf>,
    pub bind: Option<SocketAddr>,
    pub title: Option<String>,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse TOML config file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            bind: SocketAddr::from(([127, 0, 0, 1], 5000)),
            title: DEFAULT_TITLE.to_string(),
        }
    }
}

impl ServerConfigFile {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }
}

impl ServerConfig {
    /// Layers the config file (if any) over the defaults, then the explicit
    /// command-line values over that.
    pub fn resolve(
        file: Option<ServerConfigFile>,
        model_path: Option<PathBuf>,
        bind: Option<SocketAddr>,
    ) -> Self {
        let file = file.unwrap_or_default();
        let defaults = Self::default();
        Self {
            model_path: model_path
                .or(file.model_path)
                .unwrap_or(defaults.model_path),
            bind: bind.or(file.bind).unwrap_or(defaults.bind),
            title: file.title.unwrap_or(defaults.title),
        }
    }
}
