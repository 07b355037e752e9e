//! Support directory layout
//!
//! ```text
//! <root>/
//!   configs/
//!     profile.toml
//! ```

use crate::{ParleyError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};

/// Environment variable overriding the support directory
pub const HOME_ENV: &str = "PARLEY_HOME";

const CONFIGS_DIR: &str = "configs";
const PROFILE_FILE: &str = "profile.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportDirs {
    root: PathBuf,
}

impl SupportDirs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Pick the support directory: explicit override, then `$PARLEY_HOME`,
    /// then the platform config directory
    pub fn resolve(override_dir: Option<PathBuf>) -> Result<Self> {
        if let Some(dir) = override_dir {
            return Ok(Self::new(dir));
        }
        if let Some(dir) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
            return Ok(Self::new(dir));
        }
        dirs::config_dir()
            .map(|dir| Self::new(dir.join("parley")))
            .ok_or_else(|| ParleyError::Io("Unable to determine config directory".to_string()))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn configs(&self) -> PathBuf {
        self.root.join(CONFIGS_DIR)
    }

    pub fn profile_path(&self) -> PathBuf {
        self.configs().join(PROFILE_FILE)
    }

    fn legacy_profile_path(&self) -> PathBuf {
        self.root.join(PROFILE_FILE)
    }

    /// Create the directories and move a legacy profile into `configs/`
    pub fn ensure(&self) -> Result<()> {
        for dir in [self.root.clone(), self.configs()] {
            fs::create_dir_all(&dir).map_err(|e| {
                error!("Could not create directory '{}': {}", dir.display(), e);
                ParleyError::Io(format!("Cannot create {}: {}", dir.display(), e))
            })?;
            if !is_writable(&dir) {
                warn!(
                    "Directory '{}' is not writable, things will not work correctly",
                    dir.display()
                );
            }
        }
        self.migrate_legacy_profile()
    }

    fn migrate_legacy_profile(&self) -> Result<()> {
        let old = self.legacy_profile_path();
        if !old.exists() {
            return Ok(());
        }
        let new = self.profile_path();
        if new.exists() {
            warn!("Deprecated profile file found: '{}'. Please remove it.", old.display());
            return Ok(());
        }
        warn!(
            "Deprecated profile file found: '{}'. Moving it to '{}'",
            old.display(),
            new.display()
        );
        fs::rename(&old, &new).map_err(|e| {
            error!(
                "Unable to move profile, please move it manually: {} -> {}",
                old.display(),
                new.display()
            );
            ParleyError::Io(format!("Cannot move {}: {}", old.display(), e))
        })
    }
}

/// Whether the current user can create files in `dir`
///
/// Permission bits say nothing about ownership, so this creates and removes
/// a scratch file instead.
fn is_writable(dir: &Path) -> bool {
    let probe = dir.join(format!(".parley-write-check-{}", std::process::id()));
    match fs::OpenOptions::new().write(true).create_new(true).open(&probe) {
        Ok(file) => {
            drop(file);
            if let Err(e) = fs::remove_file(&probe) {
                debug!("Cannot remove '{}': {}", probe.display(), e);
            }
            true
        }
        Err(e) => {
            debug!("Cannot write to '{}': {}", dir.display(), e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let dirs = SupportDirs::new("/tmp/parley-home");
        assert_eq!(dirs.profile_path(), PathBuf::from("/tmp/parley-home/configs/profile.toml"));
        assert_eq!(
            SupportDirs::resolve(Some(PathBuf::from("/x"))).unwrap().root(),
            Path::new("/x")
        );
    }

    #[test]
    fn test_ensure_creates_configs() {
        let tmp = tempfile::tempdir().unwrap();
        let dirs = SupportDirs::new(tmp.path().join("home"));
        dirs.ensure().unwrap();
        assert!(dirs.configs().is_dir());
        // Idempotent
        dirs.ensure().unwrap();
    }

    #[test]
    fn test_legacy_profile_is_moved() {
        let tmp = tempfile::tempdir().unwrap();
        let dirs = SupportDirs::new(tmp.path());
        fs::write(tmp.path().join("profile.toml"), "keyword = \"JARVIS\"\n").unwrap();

        dirs.ensure().unwrap();
        assert!(!tmp.path().join("profile.toml").exists());
        assert_eq!(
            fs::read_to_string(dirs.profile_path()).unwrap(),
            "keyword = \"JARVIS\"\n"
        );
    }

    #[test]
    fn test_legacy_profile_kept_when_new_exists() {
        let tmp = tempfile::tempdir().unwrap();
        let dirs = SupportDirs::new(tmp.path());
        fs::create_dir_all(dirs.configs()).unwrap();
        fs::write(dirs.profile_path(), "keyword = \"NAOMI\"\n").unwrap();
        fs::write(tmp.path().join("profile.toml"), "keyword = \"OLD\"\n").unwrap();

        dirs.ensure().unwrap();
        assert!(tmp.path().join("profile.toml").exists());
        assert!(fs::read_to_string(dirs.profile_path()).unwrap().contains("NAOMI"));
    }

    #[test]
    fn test_writable_check_leaves_no_trace() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(is_writable(tmp.path()));
        assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 0);
        assert!(!is_writable(&tmp.path().join("missing")));
    }

    #[cfg(unix)]
    #[test]
    fn test_read_only_directory_is_not_writable() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().unwrap();
        let locked = tmp.path().join("locked");
        fs::create_dir(&locked).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o555)).unwrap();

        // Root ignores the mode bits, so compare against a real write attempt
        let can_write = fs::write(locked.join("attempt"), b"x").is_ok();
        let _ = fs::remove_file(locked.join("attempt"));
        assert_eq!(is_writable(&locked), can_write);

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
    }
}
