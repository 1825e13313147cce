// Vigil Engine — Quarantine Vault
// A hidden per-user directory that is the sole destination for files judged
// sensitive. Created on first use; moves never overwrite an existing entry.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use log::info;

use crate::atoms::error::{EngineError, EngineResult};

pub struct Vault {
    dir: PathBuf,
}

impl Vault {
    /// Vault at the default hidden location under the user's home.
    pub fn open_default() -> EngineResult<Self> {
        Self::open(crate::engine::paths::vault_dir())
    }

    /// Create (if needed) and open a vault rooted at `dir`.
    pub fn open(dir: PathBuf) -> EngineResult<Self> {
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
            #[cfg(windows)]
            {
                // The dot-prefix hides the directory everywhere else; Windows
                // needs the attribute set explicitly.
                let _ = std::process::Command::new("attrib")
                    .arg("+h")
                    .arg(&dir)
                    .status();
            }
            info!("[vault] Created quarantine vault at {:?}", dir);
        }
        Ok(Vault { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Whether a path already lives inside the vault.
    pub fn contains(&self, path: &Path) -> bool {
        path.starts_with(&self.dir)
    }

    /// Move a file into the vault. An existing entry with the same name is
    /// never overwritten — the incoming file gets a UTC timestamp prefix.
    pub fn quarantine(&self, path: &Path) -> EngineResult<PathBuf> {
        let name = path.file_name().ok_or_else(|| {
            EngineError::validation(format!("not a file path: {}", path.display()))
        })?;

        let mut dest = self.dir.join(name);
        if dest.exists() {
            let stamped = format!(
                "{}_{}",
                Utc::now().format("%Y%m%d%H%M%S"),
                name.to_string_lossy()
            );
            dest = self.dir.join(stamped);
        }

        move_file(path, &dest)?;
        info!("[vault] Quarantined {:?} -> {:?}", path, dest);
        Ok(dest)
    }
}

/// Rename when possible; fall back to copy+remove across filesystems.
fn move_file(from: &Path, to: &Path) -> EngineResult<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(_) => {
            fs::copy(from, to)?;
            fs::remove_file(from)?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn open_creates_the_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("vault");
        assert!(!dir.exists());
        let vault = Vault::open(dir.clone()).unwrap();
        assert!(dir.is_dir());
        assert_eq!(vault.dir(), dir.as_path());
    }

    #[test]
    fn quarantine_moves_the_file() {
        let tmp = tempfile::tempdir().unwrap();
        let vault = Vault::open(tmp.path().join("vault")).unwrap();

        let source = tmp.path().join("secret.txt");
        fs::write(&source, "api key inside").unwrap();

        let dest = vault.quarantine(&source).unwrap();
        assert!(!source.exists());
        assert_eq!(fs::read_to_string(dest).unwrap(), "api key inside");
    }

    #[test]
    fn collision_gets_a_timestamp_prefix() {
        let tmp = tempfile::tempdir().unwrap();
        let vault = Vault::open(tmp.path().join("vault")).unwrap();

        let first = tmp.path().join("notes.txt");
        fs::write(&first, "one").unwrap();
        let first_dest = vault.quarantine(&first).unwrap();

        let second = tmp.path().join("notes.txt");
        fs::write(&second, "two").unwrap();
        let second_dest = vault.quarantine(&second).unwrap();

        assert_ne!(first_dest, second_dest);
        assert_eq!(fs::read_to_string(&first_dest).unwrap(), "one");
        assert_eq!(fs::read_to_string(&second_dest).unwrap(), "two");
        assert!(second_dest
            .file_name()
            .unwrap()
            .to_string_lossy()
            .ends_with("_notes.txt"));
    }

    #[test]
    fn contains_detects_vault_members() {
        let tmp = tempfile::tempdir().unwrap();
        let vault = Vault::open(tmp.path().join("vault")).unwrap();
        assert!(vault.contains(&vault.dir().join("x.txt")));
        assert!(!vault.contains(tmp.path()));
    }
}
