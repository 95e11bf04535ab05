//! Configuration loading
//!
//! Config file resolution follows a fixed priority order:
//! 1. Command-line argument (highest priority)
//! 2. `SURVEY_CONFIG` environment variable
//! 3. Platform config directory (`<config_dir>/music-survey/config.toml`)
//! 4. Compiled defaults (fallback)
//!
//! A missing config file is not an error: the service logs a warning and starts
//! with defaults. A config file that exists but does not parse is an error.
//! After the file is read, `SURVEY_BIND` and `SURVEY_DATABASE` override the
//! corresponding fields.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::{Error, Result};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "SURVEY_CONFIG";
/// Environment variable overriding the listen address
pub const BIND_ENV_VAR: &str = "SURVEY_BIND";
/// Environment variable overriding the database path
pub const DATABASE_ENV_VAR: &str = "SURVEY_DATABASE";

const APP_DIR: &str = "music-survey";

/// Service configuration, as read from `config.toml`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SurveyConfig {
    /// Address the HTTP service listens on
    pub bind_address: String,
    /// SQLite file receiving submitted surveys
    pub database_path: PathBuf,
    /// Optional TOML playlist catalog
    pub catalog_path: Option<PathBuf>,
    /// Default tracing filter when `RUST_LOG` is unset
    pub log_level: String,
    /// Mark session cookies `Secure` (requires HTTPS)
    pub secure_cookies: bool,
}

impl Default for SurveyConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:5780".to_string(),
            database_path: default_data_dir().join("survey.db"),
            catalog_path: None,
            log_level: "info".to_string(),
            secure_cookies: false,
        }
    }
}

impl SurveyConfig {
    /// Parse config TOML text; missing fields take their defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: SurveyConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.bind_address.trim().is_empty() {
            return Err(Error::Config("bind_address must not be empty".to_string()));
        }
        if self.database_path.as_os_str().is_empty() {
            return Err(Error::Config("database_path must not be empty".to_string()));
        }
        Ok(())
    }

    /// Apply `SURVEY_BIND` / `SURVEY_DATABASE` overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(bind) = std::env::var(BIND_ENV_VAR) {
            if !bind.trim().is_empty() {
                self.bind_address = bind;
            }
        }
        if let Ok(db) = std::env::var(DATABASE_ENV_VAR) {
            if !db.trim().is_empty() {
                self.database_path = PathBuf::from(db);
            }
        }
    }
}

/// Locate the config file following the priority order
///
/// Returns `None` when no candidate exists.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Platform config directory
    dirs::config_dir()
        .map(|d| d.join(APP_DIR).join("config.toml"))
        .filter(|p| p.exists())
}

/// Load configuration, degrading to defaults when no file is found
pub fn load_config(cli_arg: Option<&Path>) -> Result<SurveyConfig> {
    let mut config = match resolve_config_path(cli_arg) {
        Some(path) => match std::fs::read_to_string(&path) {
            Ok(content) => {
                info!("Loading configuration from {}", path.display());
                SurveyConfig::from_toml(&content)?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Config file {} not found, using defaults", path.display());
                SurveyConfig::default()
            }
            Err(e) => return Err(e.into()),
        },
        None => {
            warn!("No config file found, using defaults");
            SurveyConfig::default()
        }
    };
    config.apply_env_overrides();
    Ok(config)
}

/// OS-dependent default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("./survey_data"))
}
