// Vigil Engine — per-user filesystem locations.

use std::path::PathBuf;

use crate::atoms::constants::VAULT_DIR_NAME;

/// Engine data directory: ~/.vigil (created by the store on first open).
pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".vigil")
}

/// Engine database location.
pub fn engine_db_path() -> PathBuf {
    data_dir().join("vigil.db")
}

/// Quarantine vault: a hidden directory directly under the user's home.
pub fn vault_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(VAULT_DIR_NAME)
}

/// Scan roots when the config does not name any: the user's home.
pub fn default_scan_roots() -> Vec<PathBuf> {
    vec![dirs::home_dir().unwrap_or_else(|| PathBuf::from("/"))]
}
