//! SettingsDesk command-line driver
//!
//! Runs engine operations against a SQLite option store and prints the
//! JSON envelope each one returns.
//!
//! Usage:
//!   settingsdesk --db options.sqlite --schema schema.json save --name 'theme[colors][primary]' --value '#fff'

use std::path::PathBuf;
use std::process::ExitCode;
use anyhow::Result;
use clap::Parser;
use settingsdesk_cli::{build_engine, execute, Command};
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "settingsdesk")]
#[command(about = "Schema-driven settings engine")]
struct Args {
    /// Path to the SQLite option database
    #[arg(long, default_value = "settingsdesk.sqlite")]
    db: PathBuf,

    /// Path to the schema JSON file
    #[arg(short, long)]
    schema: Option<PathBuf>,

    /// Path to the engine config TOML file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let engine = build_engine(&args.db, args.schema.as_deref(), args.config.as_deref())?;
    debug!("Running {:?}", args.command);
    let envelope = execute(&engine, &args.command)?;
    println!("{}", serde_json::to_string_pretty(&envelope)?);

    Ok(if envelope.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
