// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 FRP Manager Contributors

// FRP Manager - Platform Process Helpers
// Liveness checks and termination for supervised tunnel processes

use std::thread;
use std::time::{Duration, Instant};

use sysinfo::{Pid, ProcessRefreshKind, ProcessStatus, ProcessesToUpdate, System};
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Start time (seconds since the epoch) of a live process
///
/// Zombies count as gone: they have exited and only wait to be reaped.
pub fn start_time(pid: u32) -> Option<u64> {
    let mut system = System::new();
    let sys_pid = Pid::from_u32(pid);
    system.refresh_processes_specifics(
        ProcessesToUpdate::Some(&[sys_pid]),
        true,
        ProcessRefreshKind::new(),
    );

    system
        .process(sys_pid)
        .filter(|p| p.status() != ProcessStatus::Zombie)
        .map(|p| p.start_time())
}

/// Check whether `pid` is alive and, when a fingerprint was recorded,
/// still the same process that was spawned
///
/// Without a fingerprint a reused pid is indistinguishable from the
/// original process.
pub fn is_alive(pid: u32, fingerprint: Option<u64>) -> bool {
    match (start_time(pid), fingerprint) {
        (None, _) => false,
        (Some(_), None) => true,
        (Some(actual), Some(expected)) => {
            if actual != expected {
                debug!(
                    "Process {} started at {} but record expects {}, pid was reused",
                    pid, actual, expected
                );
            }
            actual == expected
        }
    }
}

/// Terminate a process and its process group, politely first and
/// forcefully after `timeout`
///
/// Supervised processes lead their own group (pgid == pid), so wrapper
/// scripts take their children down with them. Liveness is polled on the
/// leader. Best effort: failures are logged, never returned.
#[cfg(unix)]
pub fn terminate(pid: u32, fingerprint: Option<u64>, timeout: Duration) {
    debug!("Sending SIGTERM to process group {}", pid);
    if !send_signal(pid, libc::SIGTERM) {
        return;
    }

    let deadline = Instant::now() + timeout;
    loop {
        reap(pid);
        if !is_alive(pid, fingerprint) {
            debug!("Process {} terminated gracefully", pid);
            break;
        }
        if Instant::now() >= deadline {
            warn!("Process {} still running after {:?}, sending SIGKILL", pid, timeout);
            break;
        }
        thread::sleep(POLL_INTERVAL);
    }

    // Leftover group members ignored SIGTERM or the leader did not exit
    if group_exists(pid) && send_signal(pid, libc::SIGKILL) {
        thread::sleep(POLL_INTERVAL);
        reap(pid);
    }
}

/// Signal the process group led by `pid`, or `pid` alone if it leads none
#[cfg(unix)]
fn send_signal(pid: u32, signal: libc::c_int) -> bool {
    // kill(-1) would reach every process we may signal
    let raw_pid = match libc::pid_t::try_from(pid) {
        Ok(raw) if raw > 1 => raw,
        _ => {
            warn!("Refusing to signal process id {}", pid);
            return false;
        }
    };

    for target in [-raw_pid, raw_pid] {
        // SAFETY: kill(2) has no memory-safety preconditions
        if unsafe { libc::kill(target, signal) } == 0 {
            return true;
        }

        let err = std::io::Error::last_os_error();
        if err.raw_os_error() != Some(libc::ESRCH) {
            warn!("Failed to signal process {}: {}", target, err);
            return false;
        }
    }

    debug!("Process {} already gone", pid);
    false
}

#[cfg(unix)]
fn group_exists(pgid: u32) -> bool {
    match libc::pid_t::try_from(pgid) {
        // SAFETY: signal 0 only checks for existence
        Ok(raw) if raw > 1 => unsafe { libc::kill(-raw, 0) == 0 },
        _ => false,
    }
}

/// Collect the exit status if `pid` is our own child; a no-op otherwise
#[cfg(unix)]
fn reap(pid: u32) {
    if let Ok(raw_pid) = libc::pid_t::try_from(pid) {
        // SAFETY: a null status pointer is allowed by waitpid(2)
        unsafe {
            libc::waitpid(raw_pid, std::ptr::null_mut(), libc::WNOHANG);
        }
    }
}

#[cfg(windows)]
pub fn terminate(pid: u32, fingerprint: Option<u64>, timeout: Duration) {
    use std::process::Command;

    debug!("Terminating process {} with taskkill", pid);
    match Command::new("taskkill")
        .args(["/PID", &pid.to_string(), "/T", "/F"])
        .output()
    {
        Ok(output) if output.status.success() => {}
        Ok(output) => warn!(
            "taskkill failed for {}: {}",
            pid,
            String::from_utf8_lossy(&output.stderr).trim()
        ),
        Err(e) => warn!("Failed to run taskkill for {}: {}", pid, e),
    }

    let deadline = Instant::now() + timeout;
    while is_alive(pid, fingerprint) && Instant::now() < deadline {
        thread::sleep(POLL_INTERVAL);
    }
}

#[cfg(not(any(unix, windows)))]
pub fn terminate(pid: u32, _fingerprint: Option<u64>, _timeout: Duration) {
    warn!("Process termination not implemented for this platform (pid {})", pid);
}
