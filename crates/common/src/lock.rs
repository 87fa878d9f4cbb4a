// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 FRP Manager Contributors

// FRP Manager - Advisory File Locks
// Serializes read-modify-write of shared files across CLI invocations

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::{debug, warn};

use crate::error::Result;

/// Exclusive lock held for as long as the guard lives
#[derive(Debug)]
pub struct LockGuard {
    file: File,
    path: PathBuf,
}

impl LockGuard {
    /// Block until the exclusive lock on `path` is acquired
    ///
    /// The lock file is created if needed and left in place afterwards;
    /// only the OS-level lock is released on drop.
    pub fn acquire(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)?;
        file.lock_exclusive()?;

        debug!("Acquired lock {}", path.display());
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        match FileExt::unlock(&self.file) {
            Ok(()) => debug!("Released lock {}", self.path.display()),
            Err(e) => warn!("Failed to release lock {}: {}", self.path.display(), e),
        }
    }
}
