// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 FRP Manager Contributors

// Common types for FRP Manager

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Role of a profile and of the binary that runs it
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    /// Tunnel client (frpc)
    Client,
    /// Tunnel server (frps)
    Server,
}

impl Kind {
    pub const ALL: [Kind; 2] = [Kind::Client, Kind::Server];

    /// Lowercase name, also used as a directory name
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Client => "client",
            Kind::Server => "server",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Kind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "client" => Ok(Kind::Client),
            "server" => Ok(Kind::Server),
            other => Err(format!("unknown kind '{}' (expected client or server)", other)),
        }
    }
}

/// A single configuration value
///
/// Numbers keep their JSON representation so `8080` renders as `8080`
/// and `1.5` as `1.5`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Number(serde_json::Number),
    String(String),
}

impl Scalar {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Number(n) => write!(f, "{}", n),
            Scalar::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::String(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::String(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Number(value.into())
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

/// Observed state of a supervised instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStatus {
    /// Record present and its process is alive
    Running { pid: u32 },
    /// No record, unreadable record, or dead process
    Stopped,
}

impl fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessStatus::Running { .. } => f.write_str("running"),
            ProcessStatus::Stopped => f.write_str("stopped"),
        }
    }
}
