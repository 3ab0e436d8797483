//! # Pipeline Locking
//!
//! Keeps two scheduled runs from overlapping. Without it both could decide
//! a new generation is needed and publish two differently timestamped
//! filters.
//!
//! Uses `fs2` for cross-platform advisory file locking.

use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::debug;

use crate::error::LockError;
use crate::ports::outbound::{GenerationLock, LockGuard};

/// Lock file name
pub const LOCK_FILE: &str = "mlbf.lock";

/// Exclusive advisory lock on `{lock_dir}/mlbf.lock`.
#[derive(Clone, Debug)]
pub struct FileGenerationLock {
    path: PathBuf,
}

impl FileGenerationLock {
    pub fn new<P: AsRef<Path>>(lock_dir: P) -> Self {
        Self {
            path: lock_dir.as_ref().join(LOCK_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read PID from an existing lock file (for error messages)
    fn read_existing_pid(path: &Path) -> Option<u32> {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|s| s.trim().parse().ok())
    }
}

/// Open lock file; dropping it releases the lock
struct HeldLock {
    file: File,
    path: PathBuf,
}

impl Drop for HeldLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
        debug!("[mlbf] Released pipeline lock {}", self.path.display());
    }
}

impl GenerationLock for FileGenerationLock {
    fn try_acquire(&self) -> Result<LockGuard, LockError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| LockError::CreateFailed {
                path: self.path.clone(),
                source,
            })?;
        }

        // Do not truncate before holding the lock; the holder's PID must
        // stay readable for the error message.
        let mut file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&self.path)
            .map_err(|source| LockError::CreateFailed {
                path: self.path.clone(),
                source,
            })?;

        if file.try_lock_exclusive().is_err() {
            return Err(LockError::AlreadyLocked {
                pid: Self::read_existing_pid(&self.path),
                path: self.path.clone(),
            });
        }

        let pid = std::process::id();
        file.set_len(0).map_err(LockError::WriteFailed)?;
        file.seek(SeekFrom::Start(0)).map_err(LockError::WriteFailed)?;
        writeln!(file, "{}", pid).map_err(LockError::WriteFailed)?;
        file.sync_all().map_err(LockError::WriteFailed)?;

        debug!(pid, "[mlbf] Acquired pipeline lock {}", self.path.display());
        Ok(LockGuard::new(HeldLock {
            file,
            path: self.path.clone(),
        }))
    }
}

/// Lock for callers that already guarantee a single run.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopGenerationLock;

impl GenerationLock for NoopGenerationLock {
    fn try_acquire(&self) -> Result<LockGuard, LockError> {
        Ok(LockGuard::unlocked())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_writes_pid() {
        let dir = tempfile::tempdir().unwrap();
        let lock = FileGenerationLock::new(dir.path());

        let _guard = lock.try_acquire().expect("Should acquire lock");

        let content = std::fs::read_to_string(lock.path()).unwrap();
        assert_eq!(content.trim().parse::<u32>().unwrap(), std::process::id());
    }

    #[test]
    fn test_double_lock_fails() {
        let dir = tempfile::tempdir().unwrap();
        let lock = FileGenerationLock::new(dir.path());

        let _guard = lock.try_acquire().expect("First lock should succeed");
        let result = FileGenerationLock::new(dir.path()).try_acquire();

        match result {
            Err(LockError::AlreadyLocked { pid, .. }) => {
                assert_eq!(pid, Some(std::process::id()));
            }
            other => panic!("expected AlreadyLocked, got {:?}", other),
        }
    }

    #[test]
    fn test_lock_released_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let lock = FileGenerationLock::new(dir.path());

        {
            let _guard = lock.try_acquire().expect("Should acquire");
        }

        assert!(lock.try_acquire().is_ok());
    }

    #[test]
    fn test_creates_missing_lock_dir() {
        let dir = tempfile::tempdir().unwrap();
        let lock = FileGenerationLock::new(dir.path().join("nested").join("locks"));
        assert!(lock.try_acquire().is_ok());
    }

    #[test]
    fn test_noop_lock_never_blocks() {
        let lock = NoopGenerationLock;
        let _a = lock.try_acquire().unwrap();
        let _b = lock.try_acquire().unwrap();
    }
}
