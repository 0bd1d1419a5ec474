pub mod disks;
pub mod handlers;

use std::process::ExitCode;

use crate::presentation::cli::{Cli, Commands};
use clap::Parser;
use flashprobe_core::ProbeConfig;
use flashprobe_core::error::Result;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

pub fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cfg = match &cli.config {
        Some(path) => ProbeConfig::load(path)?,
        None => ProbeConfig::default(),
    };

    match cli.command {
        Commands::Devices { all } => handlers::handle_devices(all),
        Commands::Write {
            mount,
            percent,
            force,
        } => handlers::handle_write(&cfg, mount, percent, force),
        Commands::Verify {
            mount,
            cleanup,
            json,
        } => handlers::handle_verify(&cfg, mount, cleanup, json),
        Commands::Ledger { mount, json } => handlers::handle_ledger(&cfg, mount, json),
    }
}
