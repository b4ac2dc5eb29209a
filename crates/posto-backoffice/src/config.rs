//! # Back Office Configuration
//!
//! Loaded once at startup and read-only afterwards.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     POSTO_DB_PATH=/var/lib/posto/posto.db                              │
//! │     POSTO_STATION_NAME="Posto Central"                                 │
//! │     POSTO_PERIOD_EXPENSE=1500.00                                       │
//! │     POSTO_SUPPLIER_ID=<uuid>                                           │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ./posto.toml (or the path given on the command line)               │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     platform data dir for the database, no expense, no supplier        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # posto.toml
//! station_name = "Posto Central"
//! db_path = "./data/posto.db"
//! period_expense = "1500.00"
//! supplier_id = "550e8400-e29b-41d4-a716-446655440000"
//! ```

use directories::ProjectDirs;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "posto.toml";

/// Database file name inside the platform data directory.
pub const DB_FILE_NAME: &str = "posto.db";

// =============================================================================
// Errors
// =============================================================================

/// Failures while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Could not determine app data directory")]
    NoDataDir,

    #[error("Failed to create data directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// =============================================================================
// Config
// =============================================================================

/// Back-office configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackOfficeConfig {
    /// Station name shown on reports.
    pub station_name: String,

    /// Explicit database path. `None` means the platform data directory.
    pub db_path: Option<PathBuf>,

    /// Period expense pre-filled into the period view.
    pub period_expense: Option<Decimal>,

    /// Supplier pre-selected for the save batch.
    pub supplier_id: Option<String>,
}

impl Default for BackOfficeConfig {
    fn default() -> Self {
        BackOfficeConfig {
            station_name: "Posto".to_string(),
            db_path: None,
            period_expense: None,
            supplier_id: None,
        }
    }
}

impl BackOfficeConfig {
    /// Loads the config file (if present) and applies environment overrides.
    ///
    /// With `path = None` the file is looked up as `./posto.toml`; a
    /// missing default file is not an error, a missing explicit file is.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default = Path::new(CONFIG_FILE_NAME);
                if default.exists() {
                    Self::from_file(default)?
                } else {
                    debug!("No {} found, using defaults", CONFIG_FILE_NAME);
                    Self::default()
                }
            }
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parses a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::from_toml(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        info!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    /// Parses TOML text.
    pub fn from_toml(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// Applies `POSTO_*` overrides from a variable lookup.
    ///
    /// ## Environment Variables
    /// - `POSTO_DB_PATH`: database file path
    /// - `POSTO_STATION_NAME`: station name
    /// - `POSTO_PERIOD_EXPENSE`: period expense (e.g., "1500.00")
    /// - `POSTO_SUPPLIER_ID`: pre-selected supplier
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("POSTO_DB_PATH") {
            self.db_path = Some(PathBuf::from(path));
        }

        if let Some(name) = lookup("POSTO_STATION_NAME") {
            self.station_name = name;
        }

        if let Some(raw) = lookup("POSTO_PERIOD_EXPENSE") {
            match Decimal::from_str(raw.trim()) {
                Ok(amount) => self.period_expense = Some(amount),
                Err(e) => warn!(value = %raw, error = %e, "Ignoring POSTO_PERIOD_EXPENSE"),
            }
        }

        if let Some(id) = lookup("POSTO_SUPPLIER_ID") {
            let id = id.trim();
            self.supplier_id = (!id.is_empty()).then(|| id.to_string());
        }
    }

    /// Resolves the database file path.
    ///
    /// ## Platform-Specific Paths
    /// - **macOS**: `~/Library/Application Support/br.posto.backoffice/posto.db`
    /// - **Windows**: `%APPDATA%\posto\backoffice\posto.db`
    /// - **Linux**: `~/.local/share/backoffice/posto.db`
    pub fn database_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.db_path {
            return Ok(path.clone());
        }

        let proj_dirs =
            ProjectDirs::from("br", "posto", "backoffice").ok_or(ConfigError::NoDataDir)?;
        let data_dir = proj_dirs.data_dir();

        std::fs::create_dir_all(data_dir).map_err(|source| ConfigError::CreateDir {
            path: data_dir.to_path_buf(),
            source,
        })?;

        Ok(data_dir.join(DB_FILE_NAME))
    }
}
