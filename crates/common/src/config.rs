// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 FRP Manager Contributors

// Configuration structures for FRP Manager profiles

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};
use crate::types::{Kind, Scalar};

/// Key inside a proxy entry that names its rendered section
pub const PROXY_NAME_KEY: &str = "name";

/// Insertion-ordered mapping of keys to scalar values
///
/// Rendering walks entries in the order they were inserted (or read from
/// the stored document). Inserting an existing key replaces its value
/// without moving it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Section {
    entries: Vec<(String, Scalar)>,
}

impl Section {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Scalar>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Scalar> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Scalar)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<Scalar>> FromIterator<(K, V)> for Section {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut section = Section::new();
        for (k, v) in iter {
            section.insert(k, v);
        }
        section
    }
}

impl Serialize for Section {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Section {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct SectionVisitor;

        impl<'de> Visitor<'de> for SectionVisitor {
            type Value = Section;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object of string, number or boolean values")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut access: A,
            ) -> std::result::Result<Section, A::Error> {
                let mut section = Section::new();
                while let Some((key, value)) = access.next_entry::<String, Scalar>()? {
                    section.insert(key, value);
                }
                Ok(section)
            }
        }

        deserializer.deserialize_map(SectionVisitor)
    }
}

/// Structured profile document as stored under `configs/<kind>/<name>.json`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileDocument {
    /// Global settings, rendered as the `[common]` section
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub common: Option<Section>,
    /// Named proxy entries (client profiles only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxies: Option<Vec<Section>>,
    /// Any other top-level keys, kept as-is
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ProfileDocument {
    /// Parse a raw JSON document
    pub fn parse(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| Error::MalformedInput(e.to_string()))
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// A named, typed configuration unit
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub kind: Kind,
    pub name: String,
    pub document: ProfileDocument,
}

impl Profile {
    pub fn new(kind: Kind, name: impl Into<String>, document: ProfileDocument) -> Self {
        Self {
            kind,
            name: name.into(),
            document,
        }
    }
}

/// Check that a profile name can be used as a single path segment
pub fn validate_name(name: &str) -> Result<()> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if bad {
        return Err(Error::InvalidName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_preserves_insertion_order() {
        let doc = ProfileDocument::parse(r#"{"common": {"z": 1, "a": 2, "m": 3}}"#).unwrap();
        let keys: Vec<&str> = doc.common.as_ref().unwrap().iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_section_insert_replaces_in_place() {
        let mut section: Section = [("a", 1i64), ("b", 2)].into_iter().collect();
        section.insert("a", 9i64);
        let entries: Vec<String> = section.iter().map(|(k, v)| format!("{k}={v}")).collect();
        assert_eq!(entries, vec!["a=9", "b=2"]);
    }

    #[test]
    fn test_parse_rejects_malformed_documents() {
        let cases = [
            "not json",
            "[1, 2]",
            r#"{"common": "x"}"#,
            r#"{"common": {"a": null}}"#,
            r#"{"common": {"a": [1]}}"#,
            r#"{"proxies": [1]}"#,
            r#"{"proxies": {"name": "p1"}}"#,
        ];
        for raw in cases {
            match ProfileDocument::parse(raw) {
                Err(Error::MalformedInput(_)) => {}
                other => panic!("expected MalformedInput for {raw}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_unknown_keys_survive_round_trip() {
        let raw = r#"{"common": {"server_port": 7000}, "comment": "edge", "tags": ["a"]}"#;
        let doc = ProfileDocument::parse(raw).unwrap();
        let reparsed = ProfileDocument::parse(&doc.to_json_pretty().unwrap()).unwrap();
        assert_eq!(doc, reparsed);

        let original: serde_json::Value = serde_json::from_str(raw).unwrap();
        let stored: serde_json::Value = serde_json::from_str(&doc.to_json_pretty().unwrap()).unwrap();
        assert_eq!(original, stored);
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("office").is_ok());
        assert!(validate_name("web-01.prod").is_ok());
        for bad in ["", ".", "..", "a/b", "a\\b"] {
            assert!(matches!(validate_name(bad), Err(Error::InvalidName(_))), "{bad}");
        }
    }
}
