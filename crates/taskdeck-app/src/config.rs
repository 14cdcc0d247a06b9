//! Host configuration loaded from `.taskdeck/config.toml`.
//!
//! The repository itself always takes its store (or database path)
//! explicitly; this module is for hosts that want to resolve that path
//! from a per-directory config file instead of hard-coding it.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

const CONFIG_DIR: &str = ".taskdeck";
const CONFIG_FILE: &str = "config.toml";
const DEFAULT_DB_FILE: &str = "taskdeck.db";

/// Top-level configuration block.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    database: DatabaseConfig,
}

/// Database settings.
#[derive(Debug, Clone, Deserialize, Default)]
struct DatabaseConfig {
    /// Database file path. Relative paths resolve against the base
    /// directory the config was loaded from.
    #[serde(default)]
    path: Option<PathBuf>,
}

impl AppConfig {
    /// Load configuration from `<base_dir>/.taskdeck/config.toml`,
    /// falling back to defaults when the file does not exist.
    ///
    /// # Errors
    /// Returns an error when the file exists but cannot be read or parsed.
    pub fn load(base_dir: impl AsRef<Path>) -> Result<Self> {
        let config_path = base_dir.as_ref().join(CONFIG_DIR).join(CONFIG_FILE);
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&config_path)
            .with_context(|| format!("failed to read {}", config_path.display()))?;
        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("failed to parse {}", config_path.display()))?;
        Ok(config)
    }

    /// Resolve the database file path against `base_dir`.
    #[must_use]
    pub fn database_path(&self, base_dir: impl AsRef<Path>) -> PathBuf {
        let base = base_dir.as_ref();
        self.database.path.as_ref().map_or_else(
            || base.join(CONFIG_DIR).join(DEFAULT_DB_FILE),
            |path| {
                if path.is_absolute() {
                    path.clone()
                } else {
                    base.join(path)
                }
            },
        )
    }
}
