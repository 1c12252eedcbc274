//! # vca CLI entry point
//!
//! Parses arguments, installs the tracing subscriber, loads configuration
//! and dispatches to the subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use vca_cli::commands::{run, Command};
use vca_cli::config::Config;

/// Verifiable credential issuance with proof-of-work anchoring and
/// dual-consent disclosure.
#[derive(Parser, Debug)]
#[command(name = "vca", version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). `RUST_LOG` wins when set.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, env = "VCA_LOG_JSON", global = true)]
    log_json: bool,

    /// Path to a YAML configuration file.
    #[arg(long, env = "VCA_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    let result = Config::load(cli.config.as_deref()).and_then(|config| {
        tracing::debug!(?config, "configuration loaded");
        run(&cli.command, &config)
    });

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

fn init_tracing(verbose: u8, json: bool) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
