// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 FRP Manager Contributors

// FRP Manager - Profile Manager Module
// Durable storage of named client/server profiles

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::{validate_name, Profile, ProfileDocument};
use crate::error::{Error, IoContext, Result};
use crate::layout::Layout;
use crate::types::Kind;

/// Profile storage rooted at `configs/` of a base directory
#[derive(Debug, Clone)]
pub struct ProfileStore {
    layout: Layout,
}

impl ProfileStore {
    pub fn new(layout: Layout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Parse `raw_json` and store it under `(kind, name)`
    ///
    /// An existing profile with the same key is replaced, never merged.
    ///
    /// # Returns
    /// The path where the profile was saved
    pub fn save_profile(&self, kind: Kind, name: &str, raw_json: &str) -> Result<PathBuf> {
        validate_name(name)?;
        let document = ProfileDocument::parse(raw_json)?;

        let profile_dir = self.layout.profiles_dir(kind);
        fs::create_dir_all(&profile_dir).at_path(&profile_dir)?;

        let profile_path = self.layout.profile_path(kind, name);
        if profile_path.exists() {
            debug!("Overwriting {} profile '{}'", kind, name);
        }
        fs::write(&profile_path, document.to_json_pretty()?).at_path(&profile_path)?;

        debug!("Saved {} profile '{}' to {}", kind, name, profile_path.display());
        Ok(profile_path)
    }

    /// Read a profile document from `file` and store it under `(kind, name)`
    pub fn save_profile_from_file(&self, kind: Kind, name: &str, file: &Path) -> Result<PathBuf> {
        let raw = fs::read_to_string(file).map_err(|e| match e.kind() {
            ErrorKind::NotFound => Error::NotFound(file.to_path_buf()),
            _ => Error::IoAt {
                path: file.to_path_buf(),
                source: e,
            },
        })?;
        self.save_profile(kind, name, &raw)
    }

    /// Load a single profile
    pub fn load_profile(&self, kind: Kind, name: &str) -> Result<Profile> {
        validate_name(name)?;
        let profile_path = self.layout.profile_path(kind, name);

        let contents = fs::read_to_string(&profile_path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => Error::ProfileNotFound {
                kind,
                name: name.to_string(),
            },
            _ => Error::IoAt {
                path: profile_path.clone(),
                source: e,
            },
        })?;

        let document = ProfileDocument::parse(&contents).map_err(|e| {
            Error::MalformedInput(format!("{}: {}", profile_path.display(), e))
        })?;

        Ok(Profile::new(kind, name, document))
    }

    /// Names of all stored profiles of `kind`, sorted
    pub fn list_profiles(&self, kind: Kind) -> Result<Vec<String>> {
        let profile_dir = self.layout.profiles_dir(kind);

        if !profile_dir.exists() {
            debug!("Profiles directory does not exist: {}", profile_dir.display());
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(&profile_dir).at_path(&profile_dir)? {
            let path = entry.at_path(&profile_dir)?.path();

            // Skip non-JSON files
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }

            match path.file_stem().and_then(|s| s.to_str()) {
                Some(stem) => names.push(stem.to_string()),
                None => warn!("Skipping profile with non UTF-8 name: {}", path.display()),
            }
        }

        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const CLIENT_DOC: &str = r#"{
        "common": {"server_addr": "1.2.3.4", "server_port": 7000},
        "proxies": [{"name": "ssh", "type": "tcp", "local_port": 22}]
    }"#;

    fn create_test_store() -> (TempDir, ProfileStore) {
        let temp_dir = TempDir::new().unwrap();
        let store = ProfileStore::new(Layout::new(temp_dir.path()));
        (temp_dir, store)
    }

    #[test]
    fn test_save_and_load_profile() {
        let (_temp_dir, store) = create_test_store();

        let path = store.save_profile(Kind::Client, "office", CLIENT_DOC).unwrap();
        assert_eq!(path, store.layout().profile_path(Kind::Client, "office"));

        let profile = store.load_profile(Kind::Client, "office").unwrap();
        assert_eq!(profile.kind, Kind::Client);
        assert_eq!(profile.name, "office");
        assert_eq!(profile.document, ProfileDocument::parse(CLIENT_DOC).unwrap());
    }

    #[test]
    fn test_save_overwrites_without_merging() {
        let (_temp_dir, store) = create_test_store();

        store.save_profile(Kind::Client, "office", CLIENT_DOC).unwrap();
        store
            .save_profile(Kind::Client, "office", r#"{"common": {"token": "s3cret"}}"#)
            .unwrap();

        let document = store.load_profile(Kind::Client, "office").unwrap().document;
        let common = document.common.unwrap();
        assert_eq!(common.iter().count(), 1);
        assert_eq!(common.get("token").and_then(|v| v.as_str()), Some("s3cret"));
        assert!(document.proxies.is_none());
    }

    #[test]
    fn test_malformed_input_is_not_stored() {
        let (_temp_dir, store) = create_test_store();

        let result = store.save_profile(Kind::Server, "edge", "{ nope");
        assert!(matches!(result, Err(Error::MalformedInput(_))));
        assert!(!store.layout().profile_path(Kind::Server, "edge").exists());
    }

    #[test]
    fn test_load_missing_profile() {
        let (_temp_dir, store) = create_test_store();

        match store.load_profile(Kind::Server, "ghost") {
            Err(Error::ProfileNotFound { kind, name }) => {
                assert_eq!(kind, Kind::Server);
                assert_eq!(name, "ghost");
            }
            other => panic!("expected ProfileNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_kinds_are_separate_namespaces() {
        let (_temp_dir, store) = create_test_store();

        store.save_profile(Kind::Client, "shared", CLIENT_DOC).unwrap();
        assert!(store.load_profile(Kind::Server, "shared").is_err());
    }

    #[test]
    fn test_list_profiles() {
        let (_temp_dir, store) = create_test_store();

        assert!(store.list_profiles(Kind::Client).unwrap().is_empty());

        for name in ["office", "home", "zeta", "alpha"] {
            store.save_profile(Kind::Client, name, CLIENT_DOC).unwrap();
        }
        store.save_profile(Kind::Server, "edge", "{}").unwrap();
        fs::write(store.layout().profiles_dir(Kind::Client).join("notes.txt"), "x").unwrap();

        assert_eq!(
            store.list_profiles(Kind::Client).unwrap(),
            vec!["alpha", "home", "office", "zeta"]
        );
        assert_eq!(store.list_profiles(Kind::Server).unwrap(), vec!["edge"]);
    }

    #[test]
    fn test_save_from_missing_file() {
        let (temp_dir, store) = create_test_store();
        let missing = temp_dir.path().join("missing.json");

        let result = store.save_profile_from_file(Kind::Client, "office", &missing);
        assert!(matches!(result, Err(Error::NotFound(p)) if p == missing));
    }

    #[test]
    fn test_write_failure_names_path() {
        let (_temp_dir, store) = create_test_store();
        let profile_dir = store.layout().profiles_dir(Kind::Client);
        fs::create_dir_all(profile_dir.parent().unwrap()).unwrap();
        fs::write(&profile_dir, "not a directory").unwrap();

        let err = store.save_profile(Kind::Client, "office", CLIENT_DOC).unwrap_err();
        assert!(matches!(&err, Error::IoAt { path, .. } if *path == profile_dir), "{err:?}");
        assert!(err.to_string().contains(&profile_dir.display().to_string()));
    }

    #[test]
    fn test_rejects_path_like_names() {
        let (_temp_dir, store) = create_test_store();

        let result = store.save_profile(Kind::Client, "../escape", "{}");
        assert!(matches!(result, Err(Error::InvalidName(_))));
    }
}
