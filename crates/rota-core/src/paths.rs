use crate::error::{Result, RotaError};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const ROTA_DIR: &str = ".rota";
pub const CONFIG_FILE: &str = ".rota/config.yaml";
pub const DEFAULT_DB_FILE: &str = ".rota/rota.db";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn rota_dir(root: &Path) -> PathBuf {
    root.join(ROTA_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

/// Resolve a store path from config: relative paths hang off `root`.
pub fn resolve_under(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

// ---------------------------------------------------------------------------
// Id validation
// ---------------------------------------------------------------------------

static ID_RE: OnceLock<Regex> = OnceLock::new();

fn id_re() -> &'static Regex {
    ID_RE.get_or_init(|| {
        Regex::new(r"^[a-z0-9][a-z0-9\-]*[a-z0-9]$|^[a-z0-9]$").expect("id regex is valid")
    })
}

/// Owner and cohort ids are slugs. They never contain `/`, which the redb
/// store relies on for its `owner/key` prefix scans.
pub fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() || id.len() > 64 || !id_re().is_match(id) {
        return Err(RotaError::InvalidId(id.to_string()));
    }
    Ok(())
}
