/// Configuration for botd-logs
///
/// Priority (later wins): built-in defaults, TOML file, environment
/// variables. Command-line flags are applied on top by the binary.

use crate::core::DEFAULT_POST_MARKER;
use crate::error::{BotdError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Directory the web server writes both logs into
const DEFAULT_LOG_DIR: &str = "/var/www/html/BotD";

/// Points at an explicit config file
pub const CONFIG_FILE_ENV: &str = "BOTD_CONFIG";

pub const ACCESS_LOG_ENV: &str = "BOTD_ACCESS_LOG";
pub const BOT_DETECTIONS_ENV: &str = "BOTD_BOT_DETECTIONS";
pub const COMBINED_LOG_ENV: &str = "BOTD_COMBINED_LOG";
pub const POST_MARKER_ENV: &str = "BOTD_POST_MARKER";

/// The three files one alignment run touches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogPaths {
    pub access_log_path: PathBuf,
    pub bot_detections_path: PathBuf,
    pub combined_log_path: PathBuf,
}

impl Default for LogPaths {
    fn default() -> Self {
        let dir = Path::new(DEFAULT_LOG_DIR);
        Self {
            access_log_path: dir.join("access_log.csv"),
            bot_detections_path: dir.join("bot_detections.csv"),
            combined_log_path: dir.join("combined_log.csv"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Substring of the access-log request field that marks a telemetry POST
    pub post_marker: String,
    pub paths: LogPaths,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            post_marker: DEFAULT_POST_MARKER.to_string(),
            paths: LogPaths::default(),
        }
    }
}

impl Config {
    /// Load configuration from file (if any) and the environment
    ///
    /// A file named by `BOTD_CONFIG` must exist. The fallback
    /// `~/.botd/config.toml` is optional.
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var(CONFIG_FILE_ENV) {
            Ok(explicit) => {
                info!("Loading configuration from: {}", explicit);
                Self::from_file(&explicit)?
            }
            Err(_) => match Self::default_path() {
                Some(path) if path.exists() => {
                    info!("Loading configuration from: {}", path.display());
                    Self::from_file(&path)?
                }
                _ => {
                    debug!("No config file found, using defaults");
                    Self::default()
                }
            },
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// `~/.botd/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".botd").join("config.toml"))
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| BotdError::file(path, e))?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Override values from environment-style lookups
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(ACCESS_LOG_ENV) {
            self.paths.access_log_path = PathBuf::from(path);
        }
        if let Some(path) = lookup(BOT_DETECTIONS_ENV) {
            self.paths.bot_detections_path = PathBuf::from(path);
        }
        if let Some(path) = lookup(COMBINED_LOG_ENV) {
            self.paths.combined_log_path = PathBuf::from(path);
        }
        if let Some(marker) = lookup(POST_MARKER_ENV) {
            self.post_marker = marker;
        }
    }

    fn validate(&self) -> Result<()> {
        if self.post_marker.is_empty() {
            return Err(BotdError::Config("post_marker must not be empty".to_string()));
        }
        Ok(())
    }
}
