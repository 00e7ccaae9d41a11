//! Locked, atomic write-back of configuration files.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tempfile::NamedTempFile;

use crate::error::PatchError;

/// Exclusive advisory lock on `<file>.lock`, released on drop
pub(super) struct EditLock {
    file: File,
    path: PathBuf,
}

impl EditLock {
    /// Block until the sidecar lock for `target` is held.
    ///
    /// The lock file is never unlinked: removing a still-locked file would let a
    /// second process lock a fresh inode at the same path.
    pub(super) fn acquire(target: &Path) -> Result<Self, PatchError> {
        let path = lock_path(target);
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)?;
        file.lock_exclusive()?;
        log::debug!("[Patcher] [LOCK] Acquired {}", path.display());
        Ok(EditLock { file, path })
    }
}

impl Drop for EditLock {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            log::warn!("[Patcher] [LOCK] Failed to release {}: {}", self.path.display(), e);
        } else {
            log::debug!("[Patcher] [LOCK] Released {}", self.path.display());
        }
    }
}

fn lock_path(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".lock");
    target.with_file_name(name)
}

/// Replace `target` with `content` so readers see either the old or the new file.
///
/// The temporary file lives next to `target` so the final rename stays on one
/// filesystem. If anything fails before the rename, the temporary is removed and
/// `target` is untouched.
pub(super) fn write_atomic(target: &Path, content: &str) -> Result<(), PatchError> {
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.as_file().sync_all()?;

    let permissions = fs::metadata(target)?.permissions();
    fs::set_permissions(tmp.path(), permissions)?;

    tmp.persist(target)
        .map_err(|e| PatchError::Persist(format!("{}: {}", target.display(), e.error)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_path_is_sidecar() {
        assert_eq!(
            lock_path(Path::new("/usr/src/linux/.config")),
            PathBuf::from("/usr/src/linux/.config.lock")
        );
    }

    #[test]
    fn test_write_atomic_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("config");
        fs::write(&target, "A=\"1\"\n").unwrap();

        write_atomic(&target, "A=\"2\"\n").unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "A=\"2\"\n");
        let leftovers: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[test]
    fn test_write_atomic_missing_target_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("absent");

        assert!(write_atomic(&target, "A=1\n").is_err());
        assert!(!target.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_lock_released_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("config");
        fs::write(&target, "").unwrap();

        {
            let _lock = EditLock::acquire(&target).unwrap();
            let probe = File::open(lock_path(&target)).unwrap();
            assert!(probe.try_lock_exclusive().is_err());
        }

        let probe = File::open(lock_path(&target)).unwrap();
        assert!(probe.try_lock_exclusive().is_ok());
    }
}
