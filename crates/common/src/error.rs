// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 FRP Manager Contributors

// Error types for FRP Manager

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::types::Kind;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Malformed profile document: {0}")]
    MalformedInput(String),

    #[error("Profile not found: kind={kind} name={name}")]
    ProfileNotFound { kind: Kind, name: String },

    #[error("Path not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Invalid profile name: {0:?}")]
    InvalidName(String),

    #[error("Binary not configured for kind={kind}: {reason}")]
    BinaryNotConfigured { kind: Kind, reason: String },

    #[error("Failed to start kind={kind} name={name}: {reason}")]
    SpawnFailed {
        kind: Kind,
        name: String,
        reason: String,
    },

    #[error("Already running: kind={kind} name={name} (pid {pid})")]
    AlreadyRunning { kind: Kind, name: String, pid: u32 },

    #[error("IO error on {}: {source}", path.display())]
    IoAt {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Process exit code the CLI reports for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::MalformedInput(_) | Error::InvalidName(_) => 2,
            Error::ProfileNotFound { .. } | Error::NotFound(_) => 3,
            Error::BinaryNotConfigured { .. } => 4,
            Error::SpawnFailed { .. } => 5,
            Error::AlreadyRunning { .. } => 6,
            Error::IoAt { .. } | Error::Io(_) | Error::Serialization(_) => 7,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Attach the path an IO operation was working on
pub(crate) trait IoContext<T> {
    fn at_path(self, path: &Path) -> Result<T>;
}

impl<T> IoContext<T> for std::io::Result<T> {
    fn at_path(self, path: &Path) -> Result<T> {
        self.map_err(|source| Error::IoAt {
            path: path.to_path_buf(),
            source,
        })
    }
}
