use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{ArgAction, Parser};
use rustmemodb_restore::{BootstrapConfig, BootstrapOrchestrator, ClusterSeed};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const EXIT_USAGE: u8 = 1;
const EXIT_BOOTSTRAP_FAILED: u8 = 2;

#[derive(Parser)]
#[command(name = "rustmemodb-restore")]
#[command(about = "Restores a backed up database as the founding member of a new cluster")]
struct Cli {
    #[arg(long)]
    home_dir: PathBuf,
    #[arg(long)]
    database: String,
    #[arg(long)]
    config: PathBuf,
    #[arg(long)]
    from: PathBuf,
    #[arg(
        long,
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value_t = false,
        default_missing_value = "true"
    )]
    force: bool,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = err.print();
            return ExitCode::SUCCESS;
        }
        Err(err) => {
            eprintln!("{}", err.kind());
            print_usage(&mut io::stdout().lock());
            return ExitCode::from(EXIT_USAGE);
        }
    };

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    match run(cli) {
        Ok(seed) => {
            println!("Cluster Seed: {}", seed);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Bootstrap did not complete: {:#}", err);
            ExitCode::from(EXIT_BOOTSTRAP_FAILED)
        }
    }
}

fn run(cli: Cli) -> Result<ClusterSeed> {
    let config = BootstrapConfig::load(cli.home_dir, cli.database, cli.config, cli.from, cli.force)
        .context("Failed to load configuration")?;

    let mut orchestrator = BootstrapOrchestrator::new();
    orchestrator
        .run(&config)
        .with_context(|| format!("Failed to bootstrap database '{}'", config.database_name))
}

fn print_usage(out: &mut impl Write) {
    let _ = writeln!(out, "RustMemDB Restore New Cluster Tool");
    let _ = writeln!(out, "\tThe restore tool is used to restore a backed up core database");
    let _ = writeln!(out, "Usage:");
    let _ = writeln!(out, "--home-dir <path-to-rustmemodb>");
    let _ = writeln!(out, "--from <path-to-backup-directory>");
    let _ = writeln!(out, "--database <database-name>");
    let _ = writeln!(out, "--config <path-to-config-directory>");
    let _ = writeln!(out, "--force");
}
