//! core::config
//!
//! Configuration schema and loading.
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Config file
//! 3. CLI flags (not handled here)
//!
//! # Config Locations
//!
//! Searched in order:
//! 1. An explicit path (the `--config` flag)
//! 2. `$CASEVIEW_CONFIG` if set
//! 3. `$XDG_CONFIG_HOME/caseview/config.toml`
//! 4. `~/.caseview/config.toml`
//!
//! # Example
//!
//! ```no_run
//! use caseview::core::config::Config;
//!
//! let config = Config::load(None).unwrap();
//! println!("Case store: {}", config.base_url());
//! println!("Poll every {:?}", config.poll_interval());
//! ```

pub mod schema;

pub use schema::{FileConfig, SchemaConfig, TypeConfig};

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::core::schema::TypeSchema;

/// Default case store base URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

/// Default polling interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Default traversal depth limit for the diagram compiler.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Default limit on a single case store request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("home directory not found")]
    NoHomeDir,
}

/// Loaded configuration with defaults applied through accessors.
#[derive(Debug, Clone)]
pub struct Config {
    /// Raw file contents
    pub file: FileConfig,
    /// Schema validated at load time
    schema: TypeSchema,
    /// Path the config was loaded from (if any)
    path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            file: FileConfig::default(),
            schema: TypeSchema::assurance(),
            path: None,
        }
    }
}

impl Config {
    /// Load configuration from an explicit path or the default locations.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be parsed or fails
    /// validation. A missing file is not an error (defaults are used), except
    /// when `explicit` names a file that does not exist.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }

        match Self::find_config_file() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load and validate a specific config file.
    ///
    /// # Errors
    ///
    /// Returns `ReadError`, `ParseError` or `InvalidValue`.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let file: FileConfig = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        Self::from_file(file, Some(path.to_path_buf()))
    }

    /// Validate parsed file contents.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if validation fails.
    pub fn from_file(file: FileConfig, path: Option<PathBuf>) -> Result<Self, ConfigError> {
        file.validate()?;
        let schema = match &file.schema {
            Some(schema) => schema.to_schema()?,
            None => TypeSchema::assurance(),
        };
        Ok(Self { file, schema, path })
    }

    fn find_config_file() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("CASEVIEW_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("caseview/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        let path = dirs::home_dir()?.join(".caseview/config.toml");
        path.exists().then_some(path)
    }

    /// Directory holding caseview's own files (`~/.caseview`).
    pub fn data_dir() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".caseview"))
    }

    // =========================================================================
    // Accessor methods with defaults
    // =========================================================================

    /// Case store base URL, without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.file
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
    }

    /// Polling interval. Defaults to 5 seconds.
    pub fn poll_interval(&self) -> Duration {
        self.file
            .poll_interval_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_POLL_INTERVAL)
    }

    /// Per-request timeout for the case store. Defaults to 10 seconds.
    pub fn request_timeout(&self) -> Duration {
        self.file
            .request_timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT)
    }

    /// Compiler depth limit. Defaults to 64.
    pub fn max_depth(&self) -> usize {
        self.file.max_depth.unwrap_or(DEFAULT_MAX_DEPTH)
    }

    /// Session file path, defaulting to `~/.caseview/sessions.toml`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NoHomeDir` if no path is configured and the home
    /// directory cannot be determined.
    pub fn session_file(&self) -> Result<PathBuf, ConfigError> {
        match &self.file.session_file {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::data_dir()?.join("sessions.toml")),
        }
    }

    /// The validated type schema.
    pub fn schema(&self) -> &TypeSchema {
        &self.schema
    }

    /// Path the config was loaded from.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}
