use std::fmt;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::{debug, error, info};

/// Errors raised while taking or giving back the single-instance lock
#[derive(Debug)]
pub enum InstanceError {
    /// Another process holds the lock on the sentinel file
    AlreadyRunning(PathBuf),

    /// The sentinel file could not be opened, locked or unlocked
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for InstanceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstanceError::AlreadyRunning(_) => {
                write!(f, "Another instance is running in the same directory")
            }
            InstanceError::Io { path, source } => {
                write!(f, "Lock file error on {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for InstanceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InstanceError::Io { source, .. } => Some(source),
            InstanceError::AlreadyRunning(_) => None,
        }
    }
}

/// Holds an exclusive advisory lock on the sentinel file for the lifetime
/// of a session.
///
/// The lock is given back either by [`InstanceGuard::release`] or, on any
/// other exit path (early return, error propagation, panic unwind), when
/// the guard is dropped. If the process dies the OS drops the lock with
/// the file descriptor.
#[derive(Debug)]
pub struct InstanceGuard {
    file: File,
    path: PathBuf,
    released: bool,
}

impl InstanceGuard {
    /// Try once, without blocking, to lock `path` exclusively.
    ///
    /// The sentinel file is created if missing and is never written to.
    pub fn acquire(path: impl AsRef<Path>) -> Result<Self, InstanceError> {
        let path = path.as_ref().to_path_buf();
        let io_error = |source| InstanceError::Io {
            path: path.clone(),
            source,
        };

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(io_error)?;

        if let Err(e) = FileExt::try_lock_exclusive(&file) {
            if is_contended(&e) {
                info!("Lock {} is held by another instance", path.display());
                return Err(InstanceError::AlreadyRunning(path.clone()));
            }
            return Err(io_error(e));
        }

        debug!("Acquired instance lock {}", path.display());
        Ok(Self {
            file,
            path,
            released: false,
        })
    }

    /// Give the lock back. Consumes the guard so it cannot happen twice.
    pub fn release(mut self) -> Result<(), InstanceError> {
        self.released = true;
        FileExt::unlock(&self.file).map_err(|source| InstanceError::Io {
            path: self.path.clone(),
            source,
        })?;
        debug!("Released instance lock {}", self.path.display());
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InstanceGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        match FileExt::unlock(&self.file) {
            Ok(()) => debug!("Released instance lock {} on drop", self.path.display()),
            Err(e) => error!("Failed to release instance lock {}: {}", self.path.display(), e),
        }
    }
}

fn is_contended(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::WouldBlock
        || e.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn second_acquire_fails_while_first_is_held() {
        let temp_dir = TempDir::new().unwrap();
        let lock_path = temp_dir.path().join(".lock");

        let first = InstanceGuard::acquire(&lock_path).unwrap();
        let second = InstanceGuard::acquire(&lock_path);

        assert!(matches!(second, Err(InstanceError::AlreadyRunning(ref p)) if p == &lock_path));

        first.release().unwrap();
        let third = InstanceGuard::acquire(&lock_path).unwrap();
        assert_eq!(third.path(), lock_path.as_path());
    }

    #[test]
    fn dropping_the_guard_releases_the_lock() {
        let temp_dir = TempDir::new().unwrap();
        let lock_path = temp_dir.path().join(".lock");

        {
            let _guard = InstanceGuard::acquire(&lock_path).unwrap();
            assert!(InstanceGuard::acquire(&lock_path).is_err());
        }

        assert!(InstanceGuard::acquire(&lock_path).is_ok());
    }

    #[test]
    fn sentinel_file_stays_empty() {
        let temp_dir = TempDir::new().unwrap();
        let lock_path = temp_dir.path().join(".lock");

        let guard = InstanceGuard::acquire(&lock_path).unwrap();

        assert_eq!(std::fs::metadata(&lock_path).unwrap().len(), 0);
        guard.release().unwrap();
    }

    #[test]
    fn unopenable_sentinel_is_an_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let lock_path = temp_dir.path().join("missing_dir").join(".lock");

        let err = InstanceGuard::acquire(&lock_path).unwrap_err();

        assert!(matches!(err, InstanceError::Io { .. }));
    }
}
