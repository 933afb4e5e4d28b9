//! Scoped backup for in-place file rewrites.
//!
//! `BackupGuard::create` copies the target to a sibling `<name>.bak.<secs>`
//! file before any write. `commit` removes the backup once the rewrite is
//! verified. Dropping an uncommitted guard restores the original bytes and
//! leaves the backup file on disk for manual recovery.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

pub struct BackupGuard {
    target: PathBuf,
    backup: PathBuf,
    committed: bool,
}

fn fresh_backup_path(target: &Path, secs: u64) -> PathBuf {
    let base = format!("{}.bak.{}", target.to_string_lossy(), secs);
    let mut candidate = PathBuf::from(&base);
    let mut n = 1u32;
    while candidate.exists() {
        candidate = PathBuf::from(format!("{}.{}", base, n));
        n += 1;
    }
    candidate
}

impl BackupGuard {
    /// Copy `target` aside and arm the guard.
    pub fn create(target: &Path) -> io::Result<BackupGuard> {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let backup = fresh_backup_path(target, secs);
        fs::copy(target, &backup)?;
        Ok(BackupGuard {
            target: target.to_path_buf(),
            backup,
            committed: false,
        })
    }

    pub fn backup_path(&self) -> &Path {
        &self.backup
    }

    /// Accept the rewrite: delete the backup and disarm the guard.
    pub fn commit(mut self) -> io::Result<()> {
        self.committed = true;
        fs::remove_file(&self.backup)
    }
}

impl Drop for BackupGuard {
    fn drop(&mut self) {
        if !self.committed {
            // Restore the original bytes; the backup file stays on disk.
            let _ = fs::copy(&self.backup, &self.target);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_commit_removes_backup_and_keeps_target() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("page.html");
        fs::write(&target, "original").unwrap();

        let guard = BackupGuard::create(&target).unwrap();
        let backup = guard.backup_path().to_path_buf();
        assert!(backup.exists());

        fs::write(&target, "rewritten").unwrap();
        guard.commit().unwrap();

        assert!(!backup.exists());
        assert_eq!(fs::read_to_string(&target).unwrap(), "rewritten");
    }

    #[test]
    fn test_drop_without_commit_restores_bytes_and_keeps_backup() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("page.html");
        fs::write(&target, "original bytes").unwrap();

        let backup;
        {
            let guard = BackupGuard::create(&target).unwrap();
            backup = guard.backup_path().to_path_buf();
            fs::write(&target, "corrupted").unwrap();
        }
        assert_eq!(fs::read_to_string(&target).unwrap(), "original bytes");
        assert!(backup.exists());
        assert_eq!(fs::read_to_string(&backup).unwrap(), "original bytes");
    }

    #[test]
    fn test_backup_name_collision_gets_suffix() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("a.css");
        fs::write(&target, "x").unwrap();
        let taken = PathBuf::from(format!("{}.bak.42", target.to_string_lossy()));
        fs::write(&taken, "old backup").unwrap();

        let fresh = fresh_backup_path(&target, 42);
        assert_eq!(
            fresh.to_string_lossy(),
            format!("{}.bak.42.1", target.to_string_lossy())
        );
    }
}
