use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about = "flashprobe: check the real capacity of flash media", long_about = None)]
pub struct Cli {
    /// TOML file overriding the default tunables
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Debug-level logging (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List mounted filesystems with their capacity
    Devices {
        /// include fixed disks, not only removable media
        #[arg(long)]
        all: bool,
    },

    /// Fill the device with test data and record digests
    Write {
        /// mount point (or any directory) on the device under test
        mount: PathBuf,

        /// share of free space to test, 1-100
        #[arg(long, default_value_t = 100.0, value_parser = parse_percent)]
        percent: f64,

        /// allow testing a disk that is not reported as removable
        #[arg(long)]
        force: bool,
    },

    /// Read back the test data and compare digests
    Verify {
        mount: PathBuf,

        /// delete the test data afterwards
        #[arg(long)]
        cleanup: bool,

        /// print the report as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Show the recorded ledger and which files are still on the device
    Ledger {
        mount: PathBuf,

        #[arg(long)]
        json: bool,
    },
}

pub fn parse_percent(s: &str) -> Result<f64, String> {
    let v: f64 = s
        .trim_end_matches('%')
        .parse()
        .map_err(|_| format!("not a number: {s}"))?;
    if v > 0.0 && v <= 100.0 {
        Ok(v)
    } else {
        Err(format!("percent must be in (0, 100], got {v}"))
    }
}
