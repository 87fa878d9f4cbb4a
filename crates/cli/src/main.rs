// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 FRP Manager Contributors

// FRP Manager - CLI Client
// Command-line interface for managing frpc/frps profiles and processes

mod config;

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use comfy_table::{Cell, Color, ContentArrangement, Table};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use frp_manager_common::{
    configure_binaries, write_rendered, Error, Kind, Layout, ProcessStatus, Supervisor,
    DEFAULT_BASE_DIR_NAME,
};

#[derive(Parser)]
#[command(name = "frp-manager")]
#[command(about = "Profile manager and supervisor for frpc/frps", long_about = None)]
#[command(version)]
struct Cli {
    /// Base directory for profiles, runtime state and logs [default: ./.frp-manager]
    #[arg(long, global = true, env = "FRP_MANAGER_HOME")]
    base_dir: Option<String>,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum KindArg {
    Client,
    Server,
}

impl From<KindArg> for Kind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Client => Kind::Client,
            KindArg::Server => Kind::Server,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create the base directory tree
    Init,

    /// Set the frpc/frps binary paths
    Configure {
        /// Path to the frpc binary
        #[arg(long)]
        client: Option<String>,

        /// Path to the frps binary
        #[arg(long)]
        server: Option<String>,
    },

    /// Store a profile from a JSON file (replaces an existing one)
    Create {
        /// Profile kind
        #[arg(long = "type", value_enum)]
        kind: KindArg,

        /// Profile name
        #[arg(long)]
        name: String,

        /// JSON document with `common` and `proxies`
        #[arg(long)]
        file: String,
    },

    /// Render a profile to its INI file and print the path
    GenerateIni {
        /// Profile kind
        #[arg(long = "type", value_enum)]
        kind: KindArg,

        /// Profile name
        #[arg(long)]
        name: String,
    },

    /// List stored profiles
    List {
        /// Profile kind
        #[arg(long = "type", value_enum)]
        kind: KindArg,

        /// Show a table with process status
        #[arg(short, long)]
        long: bool,
    },

    /// Launch the binary for a profile
    Start {
        /// Profile kind
        #[arg(long = "type", value_enum)]
        kind: KindArg,

        /// Profile name
        #[arg(long)]
        name: String,
    },

    /// Stop a running profile
    Stop {
        /// Profile kind
        #[arg(long = "type", value_enum)]
        kind: KindArg,

        /// Profile name
        #[arg(long)]
        name: String,
    },

    /// Show whether a profile is running
    Status {
        /// Profile kind
        #[arg(long = "type", value_enum)]
        kind: KindArg,

        /// Profile name
        #[arg(long)]
        name: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {:#}", "Error:".red().bold(), err);
            ExitCode::from(exit_code(&err))
        }
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "frp_manager=debug,frp_manager_common=debug"
    } else {
        "warn"
    };

    // Logs go to stderr so stdout stays scriptable
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Exit code of the first library error in the chain, 1 otherwise
fn exit_code(err: &anyhow::Error) -> u8 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<Error>())
        .map_or(1, Error::exit_code)
}

fn run(cli: Cli) -> Result<()> {
    let base_dir = resolve_base_dir(cli.base_dir.as_deref())?;
    let layout = Layout::new(base_dir);
    layout
        .ensure()
        .with_context(|| format!("Failed to prepare {}", layout.base().display()))?;

    let cli_config = config::CliConfig::load(layout.base())?;
    let supervisor = Supervisor::new(layout.clone(), cli_config.supervisor);

    match cli.command {
        Commands::Init => {
            println!("{}", layout.base().display());
        }
        Commands::Configure { client, server } => {
            configure(&layout, client, server)?;
        }
        Commands::Create { kind, name, file } => {
            let kind = Kind::from(kind);
            let file = expand_path(&file)?;
            let path = supervisor.store().save_profile_from_file(kind, &name, &file)?;
            println!(
                "{}",
                format!("✓ Saved {} profile '{}' to {}", kind, name, path.display()).green()
            );
        }
        Commands::GenerateIni { kind, name } => {
            let profile = supervisor.store().load_profile(kind.into(), &name)?;
            let path = write_rendered(&layout, &profile)?;
            println!("{}", path.display());
        }
        Commands::List { kind, long } => {
            list_profiles(&supervisor, kind.into(), long)?;
        }
        Commands::Start { kind, name } => {
            let pid = supervisor.start(kind.into(), &name)?;
            println!("{}", pid);
        }
        Commands::Stop { kind, name } => {
            let kind = Kind::from(kind);
            match supervisor.stop(kind, &name)? {
                Some(pid) => println!(
                    "{}",
                    format!("✓ Stopped {} '{}' (pid {})", kind, name, pid).green()
                ),
                None => println!("{}", format!("{} '{}' is not running", kind, name).yellow()),
            }
        }
        Commands::Status { kind, name } => {
            match supervisor.status(kind.into(), &name)? {
                ProcessStatus::Running { pid } => println!("running (pid {})", pid),
                ProcessStatus::Stopped => println!("stopped"),
            }
        }
    }

    Ok(())
}

fn resolve_base_dir(raw: Option<&str>) -> Result<PathBuf> {
    match raw {
        Some(raw) => expand_path(raw),
        None => Ok(env::current_dir()
            .context("Could not determine current directory")?
            .join(DEFAULT_BASE_DIR_NAME)),
    }
}

/// Expand `~` and environment variables in a user-supplied path
fn expand_path(raw: &str) -> Result<PathBuf> {
    let expanded =
        shellexpand::full(raw).with_context(|| format!("Failed to expand path {}", raw))?;
    Ok(PathBuf::from(expanded.into_owned()))
}

fn configure(layout: &Layout, client: Option<String>, server: Option<String>) -> Result<()> {
    if client.is_none() && server.is_none() {
        anyhow::bail!("Nothing to configure: pass --client and/or --server");
    }

    let client = client.as_deref().map(expand_path).transpose()?;
    let server = server.as_deref().map(expand_path).transpose()?;

    let settings = configure_binaries(layout, client, server)?;
    for kind in Kind::ALL {
        match settings.get(kind) {
            Some(path) if path.exists() => {
                println!("{:<7} {}", kind, path.display());
            }
            Some(path) => {
                println!(
                    "{:<7} {} {}",
                    kind,
                    path.display(),
                    "(not found, start will fail)".yellow()
                );
            }
            None => println!("{:<7} {}", kind, "not configured".dimmed()),
        }
    }

    Ok(())
}

fn list_profiles(supervisor: &Supervisor, kind: Kind, long: bool) -> Result<()> {
    let names = supervisor.store().list_profiles(kind)?;

    if !long {
        for name in &names {
            println!("{}", name);
        }
        return Ok(());
    }

    if names.is_empty() {
        println!("{}", format!("No {} profiles found.", kind).yellow());
        return Ok(());
    }

    let mut table = Table::new();
    table
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Name", "Status", "PID"]);

    for name in &names {
        let (status_cell, pid) = match supervisor.status(kind, name)? {
            ProcessStatus::Running { pid } => (Cell::new("running").fg(Color::Green), pid.to_string()),
            ProcessStatus::Stopped => (Cell::new("stopped").fg(Color::DarkGrey), "-".to_string()),
        };
        table.add_row(vec![Cell::new(name), status_cell, Cell::new(pid)]);
    }

    println!("{table}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_start_command() {
        let cli = Cli::try_parse_from([
            "frp-manager", "start", "--type", "server", "--name", "edge",
        ])
        .unwrap();

        match cli.command {
            Commands::Start { kind, name } => {
                assert_eq!(kind, KindArg::Server);
                assert_eq!(name, "edge");
            }
            _ => panic!("expected start"),
        }
    }

    #[test]
    fn test_parse_generate_ini_and_global_flags() {
        let cli = Cli::try_parse_from([
            "frp-manager", "generate-ini", "--type", "client", "--name", "office",
            "--base-dir", "/tmp/frp", "-v",
        ])
        .unwrap();

        assert!(cli.verbose);
        assert_eq!(cli.base_dir.as_deref(), Some("/tmp/frp"));
        assert!(matches!(cli.command, Commands::GenerateIni { .. }));
    }

    #[test]
    fn test_list_long_flag_is_separate_from_verbose() {
        for flag in ["-l", "--long"] {
            let cli = Cli::try_parse_from(["frp-manager", "list", "--type", "client", flag]).unwrap();
            assert!(!cli.verbose);
            assert!(matches!(cli.command, Commands::List { kind: KindArg::Client, long: true }));
        }

        let cli = Cli::try_parse_from(["frp-manager", "list", "--type", "client", "-v"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::List { long: false, .. }));
    }

    #[test]
    fn test_rejects_unknown_kind() {
        let result = Cli::try_parse_from(["frp-manager", "list", "--type", "proxy"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_exit_code_follows_library_error() {
        let err = anyhow::Error::new(Error::BinaryNotConfigured {
            kind: Kind::Server,
            reason: "no binary configured for kind=server".into(),
        })
        .context("while starting");
        assert_eq!(exit_code(&err), 4);

        assert_eq!(exit_code(&anyhow::anyhow!("plain failure")), 1);
    }

    #[test]
    fn test_configure_requires_a_path() {
        let temp_dir = TempDir::new().unwrap();
        let layout = Layout::new(temp_dir.path());

        assert!(configure(&layout, None, None).is_err());
        configure(&layout, Some("/opt/frp/frpc".into()), None).unwrap();
        assert_eq!(
            frp_manager_common::get_binary_path(&layout, Kind::Client).unwrap(),
            Some(PathBuf::from("/opt/frp/frpc"))
        );
    }

    #[test]
    fn test_explicit_base_dir_is_used() {
        let base = resolve_base_dir(Some("/srv/frp-manager")).unwrap();
        assert_eq!(base, PathBuf::from("/srv/frp-manager"));
    }
}
