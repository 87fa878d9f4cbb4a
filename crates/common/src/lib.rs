// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 FRP Manager Contributors

// FRP Manager - Common Library
// Profile storage, INI rendering and process supervision for frpc/frps

pub mod config;
pub mod error;
pub mod layout;
pub mod lock;
pub mod pidfile;
pub mod process;
pub mod profile_manager;
pub mod render;
pub mod settings;
pub mod supervisor;
pub mod types;

pub use config::{validate_name, Profile, ProfileDocument, Section};
pub use error::{Error, Result};
pub use layout::{rendered_file_name, Layout, DEFAULT_BASE_DIR_NAME};
pub use pidfile::ProcessRecord;
pub use profile_manager::ProfileStore;
pub use render::{render, write_rendered};
pub use settings::{configure_binaries, get_binary_path, set_binary_path, BinaryPaths};
pub use supervisor::{Supervisor, SupervisorOptions};
pub use types::{Kind, ProcessStatus, Scalar};
