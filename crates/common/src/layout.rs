// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 FRP Manager Contributors

// FRP Manager - Directory Layout
// Every persisted path lives under one explicit base directory

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;
use crate::types::Kind;

/// Name of the base directory created in the working directory by default
pub const DEFAULT_BASE_DIR_NAME: &str = ".frp-manager";

/// Paths of the persisted tree rooted at a base directory
///
/// ```text
/// settings.json
/// configs/<kind>/<name>.json
/// run/<kind>/<name>/{frpc.ini|frps.ini, proc.pid, proc.json, proc.lock}
/// logs/<kind>/<name>.log
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    base: PathBuf,
}

impl Layout {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Create the per-kind directory skeleton (idempotent)
    pub fn ensure(&self) -> Result<()> {
        for kind in Kind::ALL {
            for dir in [self.profiles_dir(kind), self.kind_run_dir(kind), self.logs_dir(kind)] {
                fs::create_dir_all(&dir)?;
            }
        }
        debug!("Base directory ready at {}", self.base.display());
        Ok(())
    }

    pub fn settings_path(&self) -> PathBuf {
        self.base.join("settings.json")
    }

    pub fn settings_lock_path(&self) -> PathBuf {
        self.base.join("settings.lock")
    }

    pub fn profiles_dir(&self, kind: Kind) -> PathBuf {
        self.base.join("configs").join(kind.as_str())
    }

    pub fn profile_path(&self, kind: Kind, name: &str) -> PathBuf {
        self.profiles_dir(kind).join(format!("{}.json", name))
    }

    fn kind_run_dir(&self, kind: Kind) -> PathBuf {
        self.base.join("run").join(kind.as_str())
    }

    /// Directory holding the rendered config and process record of one instance
    pub fn run_dir(&self, kind: Kind, name: &str) -> PathBuf {
        self.kind_run_dir(kind).join(name)
    }

    pub fn rendered_config_path(&self, kind: Kind, name: &str) -> PathBuf {
        self.run_dir(kind, name).join(rendered_file_name(kind))
    }

    pub fn logs_dir(&self, kind: Kind) -> PathBuf {
        self.base.join("logs").join(kind.as_str())
    }

    pub fn log_path(&self, kind: Kind, name: &str) -> PathBuf {
        self.logs_dir(kind).join(format!("{}.log", name))
    }
}

/// File name the rendered configuration is written to
pub fn rendered_file_name(kind: Kind) -> &'static str {
    match kind {
        Kind::Client => "frpc.ini",
        Kind::Server => "frps.ini",
    }
}
