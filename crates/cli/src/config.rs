// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 FRP Manager Contributors

// FRP Manager - CLI Config Module
// Optional manager.toml in the base directory tunes the supervisor

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use frp_manager_common::SupervisorOptions;

pub const CONFIG_FILE_NAME: &str = "manager.toml";

/// CLI configuration (wrapper around SupervisorOptions with file I/O)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CliConfig {
    #[serde(flatten)]
    pub supervisor: SupervisorOptions,
}

impl CliConfig {
    /// Load CLI configuration from the base directory
    pub fn load(base_dir: &Path) -> Result<Self> {
        let config_path = Self::config_path(base_dir);

        if !config_path.exists() {
            // Return default config if file doesn't exist
            debug!("No {} found, using defaults", config_path.display());
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;

        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        Ok(config)
    }

    /// Get the path to the CLI configuration file
    pub fn config_path(base_dir: &Path) -> PathBuf {
        base_dir.join(CONFIG_FILE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = CliConfig::default();
        assert_eq!(config.supervisor.settle_delay_ms, 500);
        assert_eq!(config.supervisor.config_flag, "-c");
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = CliConfig::load(temp_dir.path()).unwrap();
        assert_eq!(config.supervisor, SupervisorOptions::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            CliConfig::config_path(temp_dir.path()),
            "stop_timeout_ms = 10000\n",
        )
        .unwrap();

        let config = CliConfig::load(temp_dir.path()).unwrap();
        assert_eq!(config.supervisor.stop_timeout_ms, 10000);
        assert_eq!(config.supervisor.settle_delay_ms, 500);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(CliConfig::config_path(temp_dir.path()), "settle_delay_ms = \"soon\"").unwrap();

        let err = CliConfig::load(temp_dir.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));
    }
}
