// SPDX-FileCopyrightText: 2026 Linecast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Linecast - SMS campaign line rotation, rate limiting and suppression.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod dnc;
mod lines;
mod process;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use linecast_config::model::LinecastConfig;

/// Linecast - SMS campaign line rotation, rate limiting and suppression.
#[derive(Parser, Debug)]
#[command(name = "linecast", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the rotation driver until interrupted.
    Serve,
    /// Manage the do-not-contact list.
    Dnc {
        #[command(subcommand)]
        action: DncCommand,
    },
    /// Classify an audience file offline and print the bucket counts.
    Process {
        /// JSON array of contact records.
        audience: PathBuf,
        /// Campaign the audience belongs to.
        #[arg(long)]
        campaign: String,
        /// Contact status that gets its own bucket (repeatable).
        #[arg(long = "status")]
        statuses: Vec<String>,
        /// Print every bucket's entries, not only the counts.
        #[arg(long)]
        full: bool,
    },
    /// Show the configured phone line pool.
    Lines {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
}

/// `linecast dnc` actions.
#[derive(Subcommand, Debug)]
enum DncCommand {
    /// Suppress one or more numbers.
    Add {
        numbers: Vec<String>,
        #[arg(long)]
        reason: Option<String>,
    },
    /// Lift suppression for one or more numbers.
    Remove { numbers: Vec<String> },
    /// Report whether a number is suppressed.
    Check { number: String },
    /// List every suppressed number, oldest first.
    List {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Add every number in a file, one per line.
    Import {
        file: PathBuf,
        #[arg(long)]
        reason: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => linecast_config::load_and_validate_path(path),
        None => linecast_config::load_and_validate(),
    };
    let config: LinecastConfig = match loaded {
        Ok(config) => config,
        Err(errors) => {
            linecast_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Dnc { action }) => match action {
            DncCommand::Add { numbers, reason } => dnc::run_add(&config, &numbers, reason).await,
            DncCommand::Remove { numbers } => dnc::run_remove(&config, &numbers).await,
            DncCommand::Check { number } => dnc::run_check(&config, &number).await,
            DncCommand::List { json } => dnc::run_list(&config, json).await,
            DncCommand::Import { file, reason } => dnc::run_import(&config, &file, reason).await,
        },
        Some(Commands::Process {
            audience,
            campaign,
            statuses,
            full,
        }) => process::run_process(&config, &audience, &campaign, statuses, full).await,
        Some(Commands::Lines { json }) => lines::run_lines(&config, json),
        None => {
            println!("linecast: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        // Only jemalloc supports advancing the epoch.
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn cli_parses_process_with_repeated_statuses() {
        let cli = Cli::parse_from([
            "linecast",
            "process",
            "audience.json",
            "--campaign",
            "fall",
            "--status",
            "hot",
            "--status",
            "warm",
        ]);
        match cli.command {
            Some(Commands::Process {
                campaign, statuses, full, ..
            }) => {
                assert_eq!(campaign, "fall");
                assert_eq!(statuses, vec!["hot", "warm"]);
                assert!(!full);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn cli_parses_global_config_after_subcommand() {
        let cli = Cli::parse_from(["linecast", "dnc", "check", "5551234567", "--config", "x.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
        assert!(matches!(
            cli.command,
            Some(Commands::Dnc {
                action: DncCommand::Check { .. }
            })
        ));
    }

    #[test]
    fn binary_loads_config_defaults() {
        let config = linecast_config::load_and_validate_str("")
            .expect("default config should be valid");
        assert_eq!(config.service.name, "linecast");
        assert_eq!(config.lines.len(), 5);
    }
}
