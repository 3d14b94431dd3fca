use crate::error::{Result, RotaError};
use crate::paths;
use crate::store::ConcurrencyMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

impl ConfigWarning {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: WarnLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: WarnLevel::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// StoreConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Database file; relative paths are resolved against the project root.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
    #[serde(default)]
    pub concurrency: ConcurrencyMode,
}

fn default_store_path() -> PathBuf {
    PathBuf::from(paths::DEFAULT_DB_FILE)
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            concurrency: ConcurrencyMode::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    /// Owner used when the CLI is not given `--owner`.
    #[serde(default = "default_owner")]
    pub owner: String,
    #[serde(default)]
    pub store: StoreConfig,
}

fn default_version() -> u32 {
    1
}

fn default_owner() -> String {
    "default".to_string()
}

impl Config {
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            version: 1,
            owner: owner.into(),
            store: StoreConfig::default(),
        }
    }

    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Err(RotaError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    pub fn db_path(&self, root: &Path) -> PathBuf {
        paths::resolve_under(root, &self.store.path)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if paths::validate_id(&self.owner).is_err() {
            warnings.push(ConfigWarning::error(format!(
                "owner '{}' is not a valid id (lowercase alphanumeric with hyphens)",
                self.owner
            )));
        }

        if self.store.path.as_os_str().is_empty() {
            warnings.push(ConfigWarning::error("store.path is empty"));
        }

        if self.version != 1 {
            warnings.push(ConfigWarning::warning(format!(
                "unknown config version {}; expected 1",
                self.version
            )));
        }

        warnings
    }
}
