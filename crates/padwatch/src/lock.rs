//! Single-instance guard for commands that mutate debounce state.
//!
//! An advisory exclusive lock on `<state_dir>/cycle.lock`. The OS drops
//! the lock when the process exits, so a crashed run never wedges the
//! next one.

use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use fd_lock::{RwLock, RwLockWriteGuard};

use crate::error::CliError;

pub const LOCK_FILE: &str = "cycle.lock";

pub struct CycleLock {
    file: RwLock<File>,
    path: PathBuf,
}

impl CycleLock {
    /// Open (creating if needed) the lock file in `state_dir`.
    pub fn open(state_dir: &Path) -> Result<Self, CliError> {
        std::fs::create_dir_all(state_dir)?;
        let path = state_dir.join(LOCK_FILE);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)?;
        Ok(Self {
            file: RwLock::new(file),
            path,
        })
    }

    /// Take the exclusive lock without blocking.
    ///
    /// Contention maps to [`CliError::Locked`]; any other failure is an
    /// I/O error on the lock file.
    pub fn try_acquire(&mut self) -> Result<RwLockWriteGuard<'_, File>, CliError> {
        let path = &self.path;
        self.file.try_write().map_err(|e| lock_error(e, path))
    }
}

fn lock_error(err: std::io::Error, path: &Path) -> CliError {
    // 33 is ERROR_LOCK_VIOLATION.
    let contended =
        err.kind() == ErrorKind::WouldBlock || (cfg!(windows) && err.raw_os_error() == Some(33));
    if contended {
        CliError::Locked {
            path: path.to_owned(),
        }
    } else {
        CliError::Io(err)
    }
}
