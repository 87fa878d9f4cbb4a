// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 FRP Manager Contributors

// FRP Manager - Process Supervisor
// Starts, stops and reports frpc/frps instances, one per (kind, name)

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::validate_name;
use crate::error::{Error, Result};
use crate::layout::Layout;
use crate::pidfile::{PidFile, ProcessRecord};
use crate::process;
use crate::profile_manager::ProfileStore;
use crate::render;
use crate::settings::BinaryPaths;
use crate::types::{Kind, ProcessStatus};

/// Tunables of the supervisor
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SupervisorOptions {
    /// Wait after spawning before checking for an immediate exit
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    /// Grace period between SIGTERM and SIGKILL on stop
    #[serde(default = "default_stop_timeout_ms")]
    pub stop_timeout_ms: u64,
    /// Argument placed before the rendered config path (empty for none)
    #[serde(default = "default_config_flag")]
    pub config_flag: String,
}

fn default_settle_delay_ms() -> u64 {
    500
}

fn default_stop_timeout_ms() -> u64 {
    3000
}

fn default_config_flag() -> String {
    "-c".to_string()
}

impl Default for SupervisorOptions {
    fn default() -> Self {
        Self {
            settle_delay_ms: default_settle_delay_ms(),
            stop_timeout_ms: default_stop_timeout_ms(),
            config_flag: default_config_flag(),
        }
    }
}

impl SupervisorOptions {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }
}

/// Owns the mapping from `(kind, name)` to at most one running process
///
/// All state lives on disk, so separate CLI invocations share it.
#[derive(Debug, Clone)]
pub struct Supervisor {
    layout: Layout,
    store: ProfileStore,
    options: SupervisorOptions,
}

impl Supervisor {
    pub fn new(layout: Layout, options: SupervisorOptions) -> Self {
        Self {
            store: ProfileStore::new(layout.clone()),
            layout,
            options,
        }
    }

    pub fn store(&self) -> &ProfileStore {
        &self.store
    }

    fn pid_file(&self, kind: Kind, name: &str) -> PidFile {
        PidFile::new(self.layout.run_dir(kind, name))
    }

    /// Configured binary for `kind`, which must exist on disk
    fn resolve_binary(&self, kind: Kind) -> Result<PathBuf> {
        let settings = BinaryPaths::load(&self.layout)?;
        let binary = settings.get(kind).ok_or_else(|| Error::BinaryNotConfigured {
            kind,
            reason: "no path set".to_string(),
        })?;

        if !binary.exists() {
            return Err(Error::BinaryNotConfigured {
                kind,
                reason: format!("{} does not exist", binary.display()),
            });
        }

        debug!("Using {} binary {}", kind, binary.display());
        Ok(binary.to_path_buf())
    }

    /// Render the profile, launch its binary and record the process
    ///
    /// # Returns
    /// The process identifier of the launched instance
    pub fn start(&self, kind: Kind, name: &str) -> Result<u32> {
        validate_name(name)?;
        let binary = self.resolve_binary(kind)?;
        // Snapshot taken now; later edits apply on the next start
        let profile = self.store.load_profile(kind, name)?;

        let pid_file = self.pid_file(kind, name);
        let _lock = pid_file.lock()?;

        if let Some(existing) = pid_file.read()? {
            if process::is_alive(existing.pid, existing.start_time) {
                return Err(Error::AlreadyRunning {
                    kind,
                    name: name.to_string(),
                    pid: existing.pid,
                });
            }
            warn!(
                "Replacing stale record for {} '{}' (pid {} not running)",
                kind, name, existing.pid
            );
        }

        let config_path = render::write_rendered(&self.layout, &profile)?;
        let log_path = self.layout.log_path(kind, name);

        let spawn_failed = |reason: String| Error::SpawnFailed {
            kind,
            name: name.to_string(),
            reason,
        };

        let log = open_log(&log_path).map_err(|e| {
            spawn_failed(format!("cannot open log {}: {}", log_path.display(), e))
        })?;
        let log_for_stderr = log.try_clone().map_err(|e| {
            spawn_failed(format!("cannot open log {}: {}", log_path.display(), e))
        })?;

        let mut command = Command::new(&binary);
        if !self.options.config_flag.is_empty() {
            command.arg(&self.options.config_flag);
        }
        command
            .arg(&config_path)
            .stdin(Stdio::null())
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(log_for_stderr));

        // Keep terminal signals aimed at the CLI away from the tunnel
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        let mut child = command
            .spawn()
            .map_err(|e| spawn_failed(format!("failed to launch {}: {}", binary.display(), e)))?;
        let pid = child.id();

        let record = ProcessRecord {
            pid,
            start_time: process::start_time(pid),
            spawned_at: Some(Utc::now()),
            config_path: Some(config_path),
            log_path: Some(log_path.clone()),
        };
        if let Err(e) = pid_file.write(&record) {
            warn!("Failed to record pid {}, terminating it", pid);
            process::terminate(pid, record.start_time, self.options.stop_timeout());
            let _ = pid_file.remove();
            return Err(e);
        }

        info!("Started {} '{}' with pid {}", kind, name, pid);

        thread::sleep(self.options.settle_delay());
        match child.try_wait() {
            Ok(Some(exit)) => {
                pid_file.remove()?;
                Err(spawn_failed(format!(
                    "process exited immediately ({}), see {}",
                    exit,
                    log_path.display()
                )))
            }
            Ok(None) => Ok(pid),
            Err(e) => {
                warn!("Could not poll pid {} after start: {}", pid, e);
                Ok(pid)
            }
        }
    }

    /// Terminate the recorded process (if any) and remove its record
    ///
    /// Stopping an instance that is not running is not an error.
    ///
    /// # Returns
    /// The pid that was signalled, or `None` if nothing was running
    pub fn stop(&self, kind: Kind, name: &str) -> Result<Option<u32>> {
        validate_name(name)?;
        let pid_file = self.pid_file(kind, name);

        if !pid_file.exists() {
            debug!("No process record for {} '{}', nothing to stop", kind, name);
            return Ok(None);
        }

        let _lock = pid_file.lock()?;

        let stopped = match pid_file.read()? {
            Some(record) if process::is_alive(record.pid, record.start_time) => {
                info!("Stopping {} '{}' (pid {})", kind, name, record.pid);
                process::terminate(record.pid, record.start_time, self.options.stop_timeout());
                Some(record.pid)
            }
            Some(record) => {
                info!(
                    "{} '{}' (pid {}) is not running, clearing stale record",
                    kind, name, record.pid
                );
                None
            }
            None => {
                warn!("Removing unreadable process record for {} '{}'", kind, name);
                None
            }
        };

        pid_file.remove()?;
        Ok(stopped)
    }

    /// Report whether the recorded process is alive
    ///
    /// Read-only: a stale record is reported as stopped but left in place.
    pub fn status(&self, kind: Kind, name: &str) -> Result<ProcessStatus> {
        Ok(match self.record(kind, name)? {
            Some(record) if process::is_alive(record.pid, record.start_time) => {
                ProcessStatus::Running { pid: record.pid }
            }
            Some(record) => {
                debug!("Record for {} '{}' points at dead pid {}", kind, name, record.pid);
                ProcessStatus::Stopped
            }
            None => ProcessStatus::Stopped,
        })
    }

    /// Persisted process record of an instance, if any
    pub fn record(&self, kind: Kind, name: &str) -> Result<Option<ProcessRecord>> {
        validate_name(name)?;
        self.pid_file(kind, name).read()
    }
}

fn open_log(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}
