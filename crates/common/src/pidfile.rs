// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 FRP Manager Contributors

// FRP Manager - Process Record Files
// proc.pid marks an instance as started; proc.json adds the fingerprint

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;
use crate::lock::LockGuard;

pub const PID_FILE_NAME: &str = "proc.pid";
pub const RECORD_FILE_NAME: &str = "proc.json";
pub const LOCK_FILE_NAME: &str = "proc.lock";

/// Runtime state of one started instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessRecord {
    /// OS process identifier
    pub pid: u32,
    /// Process start time reported by the OS, used to detect pid reuse
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<u64>,
    /// When the supervisor spawned the process
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spawned_at: Option<DateTime<Utc>>,
    /// Rendered configuration the process was launched with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_path: Option<PathBuf>,
    /// Append-only output log
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_path: Option<PathBuf>,
}

impl ProcessRecord {
    /// Record known only by its pid (no proc.json next to proc.pid)
    pub fn pid_only(pid: u32) -> Self {
        Self {
            pid,
            start_time: None,
            spawned_at: None,
            config_path: None,
            log_path: None,
        }
    }
}

/// Record files of one instance inside its `run/<kind>/<name>/` directory
#[derive(Debug, Clone)]
pub struct PidFile {
    dir: PathBuf,
}

impl PidFile {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn pid_path(&self) -> PathBuf {
        self.dir.join(PID_FILE_NAME)
    }

    pub fn record_path(&self) -> PathBuf {
        self.dir.join(RECORD_FILE_NAME)
    }

    pub fn exists(&self) -> bool {
        self.pid_path().exists()
    }

    /// Take the per-instance lock guarding read-modify-write of the record
    pub fn lock(&self) -> Result<LockGuard> {
        LockGuard::acquire(&self.dir.join(LOCK_FILE_NAME))
    }

    /// Read the record
    ///
    /// Returns `None` when proc.pid is missing or does not hold a pid.
    /// A missing, corrupt or mismatching proc.json degrades to a pid-only record.
    pub fn read(&self) -> Result<Option<ProcessRecord>> {
        let pid_path = self.pid_path();
        let pid_str = match fs::read_to_string(&pid_path) {
            Ok(s) => s,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let Ok(pid) = pid_str.trim().parse::<u32>() else {
            warn!("Ignoring unparsable PID file {}", pid_path.display());
            return Ok(None);
        };

        Ok(Some(self.read_details(pid).unwrap_or_else(|| ProcessRecord::pid_only(pid))))
    }

    fn read_details(&self, pid: u32) -> Option<ProcessRecord> {
        let record_path = self.record_path();
        let contents = fs::read_to_string(&record_path).ok()?;

        match serde_json::from_str::<ProcessRecord>(&contents) {
            Ok(record) if record.pid == pid => Some(record),
            Ok(record) => {
                warn!(
                    "{} describes pid {} but PID file holds {}, ignoring it",
                    record_path.display(),
                    record.pid,
                    pid
                );
                None
            }
            Err(e) => {
                warn!("Failed to parse {}: {}", record_path.display(), e);
                None
            }
        }
    }

    /// Persist the record (proc.json first, proc.pid last)
    pub fn write(&self, record: &ProcessRecord) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.record_path(), serde_json::to_string_pretty(record)?)?;
        fs::write(self.pid_path(), record.pid.to_string())?;

        debug!("Wrote PID file {} ({})", self.pid_path().display(), record.pid);
        Ok(())
    }

    /// Remove both record files; missing files are fine
    pub fn remove(&self) -> Result<()> {
        for path in [self.pid_path(), self.record_path()] {
            remove_if_exists(&path)?;
        }
        debug!("Removed process record in {}", self.dir.display());
        Ok(())
    }
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
