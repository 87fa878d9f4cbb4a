// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 FRP Manager Contributors

// FRP Manager - INI Renderer
// Turns a stored profile into the flat file the frpc/frps binaries read

use std::fs;
use std::path::PathBuf;

use tracing::debug;

use crate::config::{Profile, Section, PROXY_NAME_KEY};
use crate::error::Result;
use crate::layout::Layout;
use crate::types::Kind;

/// Render a profile as `[section]` / `key = value` text
///
/// Every line, including the blank line closing each section, ends with a
/// newline. Proxy entries without a string `name` are skipped, and server
/// profiles never emit proxy sections.
pub fn render(profile: &Profile) -> String {
    let mut out = String::new();

    if let Some(common) = profile.document.common.as_ref().filter(|c| !c.is_empty()) {
        push_section(&mut out, "common", common, None);
    }

    if profile.kind == Kind::Client {
        for entry in profile.document.proxies.iter().flatten() {
            match entry.get(PROXY_NAME_KEY).and_then(|v| v.as_str()) {
                Some(name) => push_section(&mut out, name, entry, Some(PROXY_NAME_KEY)),
                None => debug!("Skipping unnamed proxy in profile '{}'", profile.name),
            }
        }
    }

    out
}

fn push_section(out: &mut String, header: &str, section: &Section, skip_key: Option<&str>) {
    out.push_str(&format!("[{}]\n", header));
    for (key, value) in section.iter() {
        if Some(key) == skip_key {
            continue;
        }
        out.push_str(&format!("{} = {}\n", key, value));
    }
    out.push('\n');
}

/// Render `profile` into its per-instance file under `run/`
///
/// # Returns
/// The path of the written file
pub fn write_rendered(layout: &Layout, profile: &Profile) -> Result<PathBuf> {
    let path = layout.rendered_config_path(profile.kind, &profile.name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(&path, render(profile))?;
    debug!("Rendered {} profile '{}' to {}", profile.kind, profile.name, path.display());

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProfileDocument;
    use tempfile::TempDir;

    fn profile(kind: Kind, raw: &str) -> Profile {
        Profile::new(kind, "test", ProfileDocument::parse(raw).unwrap())
    }

    #[test]
    fn test_render_client_profile() {
        let p = profile(
            Kind::Client,
            r#"{"common": {"server_addr": "1.2.3.4"},
                "proxies": [{"name": "p1", "type": "tcp", "local_port": 8080}]}"#,
        );
        assert_eq!(
            render(&p),
            "[common]\nserver_addr = 1.2.3.4\n\n[p1]\ntype = tcp\nlocal_port = 8080\n\n"
        );
    }

    #[test]
    fn test_server_profile_never_renders_proxies() {
        let p = profile(
            Kind::Server,
            r#"{"common": {"bind_port": 7000},
                "proxies": [{"name": "p1", "type": "tcp"}]}"#,
        );
        assert_eq!(render(&p), "[common]\nbind_port = 7000\n\n");
    }

    #[test]
    fn test_unnamed_proxies_are_skipped() {
        let p = profile(
            Kind::Client,
            r#"{"proxies": [
                {"type": "tcp", "local_port": 22},
                {"name": 5, "type": "udp"},
                {"name": "web", "type": "http", "custom_domains": "example.com"}
            ]}"#,
        );
        assert_eq!(
            render(&p),
            "[web]\ntype = http\ncustom_domains = example.com\n\n"
        );
    }

    #[test]
    fn test_name_key_position_does_not_matter() {
        let p = profile(
            Kind::Client,
            r#"{"proxies": [{"type": "tcp", "name": "ssh", "use_encryption": true}]}"#,
        );
        assert_eq!(render(&p), "[ssh]\ntype = tcp\nuse_encryption = true\n\n");
    }

    #[test]
    fn test_empty_common_is_omitted() {
        assert_eq!(render(&profile(Kind::Server, r#"{"common": {}}"#)), "");
        assert_eq!(render(&profile(Kind::Client, "{}")), "");
    }

    #[test]
    fn test_render_is_deterministic() {
        let raw = r#"{"common": {"b": 1, "a": "x", "c": false},
                      "proxies": [{"name": "z", "k": 1.5}, {"name": "y"}]}"#;
        let first = render(&profile(Kind::Client, raw));
        let second = render(&profile(Kind::Client, raw));
        assert_eq!(first, second);
        assert_eq!(first, "[common]\nb = 1\na = x\nc = false\n\n[z]\nk = 1.5\n\n[y]\n\n");
    }

    #[test]
    fn test_write_rendered_uses_per_kind_file_name() {
        let temp_dir = TempDir::new().unwrap();
        let layout = Layout::new(temp_dir.path());
        let p = profile(Kind::Client, r#"{"common": {"server_addr": "10.0.0.1"}}"#);

        let path = write_rendered(&layout, &p).unwrap();

        assert!(path.ends_with("run/client/test/frpc.ini"));
        assert_eq!(fs::read_to_string(path).unwrap(), render(&p));
    }
}
