//! CLI command definitions and handlers

mod assess;
mod inspect;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Parse and validate workers count (0-64, 0 = auto)
fn parse_workers(s: &str) -> Result<usize, String> {
    let n: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if n > 64 {
        Err("workers cannot exceed 64".to_string())
    } else {
        Ok(n)
    }
}

/// cloudgov - governance assessment for cloud resource snapshots
#[derive(Parser, Debug)]
#[command(name = "cloudgov")]
#[command(
    version,
    about = "Governance assessment for cloud resource inventories: naming, tagging, dependencies and identity",
    after_help = "\
Examples:
  cloudgov assess inventory.json                          Full assessment, inventory only
  cloudgov assess inventory.json --directory entra.json   Identity analyzers in enhanced mode
  cloudgov assess inventory.json -t naming --scheme naming.toml
  cloudgov filter inventory.json                          Show what the filter drops
  cloudgov classify abc-prod-web-vm-01 --type Microsoft.Compute/virtualMachines
  cloudgov example --scheme naming.json                   Print an example compliant name"
)]
pub struct Cli {
    /// Log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "info", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    /// Number of parallel workers (0 = auto)
    #[arg(long, global = true, value_parser = parse_workers)]
    pub workers: Option<usize>,

    /// Directory holding cloudgov.toml or .cloudgovrc.json
    #[arg(long, global = true, default_value = ".")]
    pub config: PathBuf,

    /// Write JSON output to this file instead of stdout
    #[arg(long, short = 'o', global = true)]
    pub output: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a governance assessment over a resource inventory
    #[command(after_help = "\
Assessment types:
  naming, tagging, dependencies, identity-applications, identity-users,
  identity-rbac, identity-conditional-access, identity-stale,
  identity-full, full (default)")]
    Assess {
        /// Inventory JSON file (array or {\"value\": [...]})
        inventory: PathBuf,

        /// Assessment type (default: [defaults] assessment, else full)
        #[arg(long = "type", short = 't')]
        assessment: Option<String>,

        /// Identity directory snapshot; without it identity analyzers run limited
        #[arg(long)]
        directory: Option<PathBuf>,

        /// Naming scheme file (.json or .toml)
        #[arg(long)]
        scheme: Option<PathBuf>,

        /// Restrict to these subscription ids (repeatable)
        #[arg(long = "subscription")]
        subscriptions: Vec<String>,

        /// Exit with code 1 if findings at this severity or higher exist
        #[arg(long, value_parser = ["critical", "high", "medium", "low"])]
        fail_on: Option<String>,
    },

    /// Apply the resource filter and report what was excluded
    Filter {
        /// Inventory JSON file
        inventory: PathBuf,
    },

    /// Tokenize and classify a resource name
    Classify {
        name: String,

        /// Resource type used for abbreviation matching
        #[arg(long = "type", default_value = "")]
        resource_type: String,

        /// Also check the name against this naming scheme
        #[arg(long)]
        scheme: Option<PathBuf>,
    },

    /// Print an example name for a naming scheme
    Example {
        /// Naming scheme file; defaults to the standard scheme
        #[arg(long)]
        scheme: Option<PathBuf>,

        /// Company token for the standard scheme
        #[arg(long, default_value = "abc")]
        company: String,
    },

    /// Build the dependency graph and print topology statistics
    Topology {
        /// Inventory JSON file
        inventory: PathBuf,
    },
}

/// Run the CLI with parsed arguments
pub fn run(cli: Cli) -> Result<()> {
    let output = cli.output.as_deref();
    match cli.command {
        Commands::Assess {
            ref inventory,
            ref assessment,
            ref directory,
            ref scheme,
            ref subscriptions,
            ref fail_on,
        } => assess::run(
            &cli.config,
            cli.workers,
            assess::AssessArgs {
                inventory,
                assessment: assessment.as_deref(),
                directory: directory.as_deref(),
                scheme: scheme.as_deref(),
                subscriptions,
                fail_on: fail_on.as_deref(),
            },
            output,
        ),
        Commands::Filter { ref inventory } => inspect::filter(&cli.config, inventory, output),
        Commands::Classify {
            ref name,
            ref resource_type,
            ref scheme,
        } => inspect::classify(name, resource_type, scheme.as_deref(), output),
        Commands::Example {
            ref scheme,
            ref company,
        } => inspect::example(scheme.as_deref(), company, output),
        Commands::Topology { ref inventory } => inspect::topology(&cli.config, inventory, output),
    }
}

/// Pretty JSON to `output`, or stdout
fn write_json<T: Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    match output {
        Some(path) => {
            std::fs::write(path, json + "\n")
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
        None => println!("{}", json),
    }
    Ok(())
}

/// Cancel `token` on Ctrl-C.
///
/// The signal listener runs on its own single-threaded tokio runtime so the
/// rayon workers never block on it.
fn cancel_on_interrupt(token: CancellationToken) {
    let spawned = std::thread::Builder::new()
        .name("cloudgov-signal".into())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(e) => {
                    warn!("Interrupt handling unavailable: {}", e);
                    return;
                }
            };
            runtime.block_on(async {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupt received, cancelling assessment");
                    token.cancel();
                }
            });
        });
    if let Err(e) = spawned {
        warn!("Failed to start interrupt handler: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_workers() {
        assert_eq!(parse_workers("0"), Ok(0));
        assert_eq!(parse_workers("8"), Ok(8));
        assert!(parse_workers("65").is_err());
        assert!(parse_workers("many").is_err());
    }

    #[test]
    fn test_cli_parses_assess() {
        let cli = Cli::try_parse_from([
            "cloudgov",
            "--workers",
            "2",
            "assess",
            "inv.json",
            "-t",
            "identity-full",
            "--subscription",
            "s1",
            "--subscription",
            "s2",
        ])
        .expect("parse");
        assert_eq!(cli.workers, Some(2));
        match cli.command {
            Commands::Assess {
                assessment,
                subscriptions,
                ..
            } => {
                assert_eq!(assessment.as_deref(), Some("identity-full"));
                assert_eq!(subscriptions, vec!["s1", "s2"]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_write_json_to_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.json");
        write_json(&serde_json::json!({"score": 100.0}), Some(&path)).expect("write");
        let text = std::fs::read_to_string(&path).expect("read");
        assert!(text.contains("\"score\": 100.0"));
    }
}
