// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 FRP Manager Contributors

// FRP Manager - Binary Path Settings
// Persists one optional binary path per kind in settings.json

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{IoContext, Result};
use crate::layout::Layout;
use crate::lock::LockGuard;
use crate::types::Kind;

/// Contents of `settings.json`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BinaryPaths {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_binary: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_binary: Option<PathBuf>,
    /// Keys written by other tools are kept on update
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl BinaryPaths {
    pub fn get(&self, kind: Kind) -> Option<&Path> {
        match kind {
            Kind::Client => self.client_binary.as_deref(),
            Kind::Server => self.server_binary.as_deref(),
        }
    }

    pub fn set(&mut self, kind: Kind, path: PathBuf) {
        match kind {
            Kind::Client => self.client_binary = Some(path),
            Kind::Server => self.server_binary = Some(path),
        }
    }

    /// Load settings, treating a missing file as "nothing configured"
    pub fn load(layout: &Layout) -> Result<Self> {
        let path = layout.settings_path();
        if !path.exists() {
            debug!("No settings file at {}", path.display());
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path).at_path(&path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    fn save(&self, layout: &Layout) -> Result<()> {
        let path = layout.settings_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).at_path(parent)?;
        }
        fs::write(&path, serde_json::to_string_pretty(self)?).at_path(&path)?;
        Ok(())
    }
}

/// Merge the given binary paths into the stored settings
///
/// Kinds passed as `None` keep their previous value. The path is not checked
/// for existence here; `start` does that.
pub fn configure_binaries(
    layout: &Layout,
    client: Option<PathBuf>,
    server: Option<PathBuf>,
) -> Result<BinaryPaths> {
    let _lock = LockGuard::acquire(&layout.settings_lock_path())?;

    let mut settings = BinaryPaths::load(layout)?;
    for (kind, path) in [(Kind::Client, client), (Kind::Server, server)] {
        if let Some(path) = path {
            info!("Setting {} binary to {}", kind, path.display());
            settings.set(kind, path);
        }
    }
    settings.save(layout)?;

    Ok(settings)
}

/// Update the binary path of a single kind
pub fn set_binary_path(layout: &Layout, kind: Kind, path: PathBuf) -> Result<()> {
    let (client, server) = match kind {
        Kind::Client => (Some(path), None),
        Kind::Server => (None, Some(path)),
    };
    configure_binaries(layout, client, server)?;
    Ok(())
}

/// Configured binary path for `kind`, if any
pub fn get_binary_path(layout: &Layout, kind: Kind) -> Result<Option<PathBuf>> {
    Ok(BinaryPaths::load(layout)?.get(kind).map(Path::to_path_buf))
}
