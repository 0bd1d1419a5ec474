#![forbid(unsafe_code)]

pub mod config;
pub mod domain;
pub mod error;
pub mod progress;
pub mod staging;

pub mod util {
    pub mod copy;
    pub mod varint;
}

pub mod chunking {
    pub mod generator;
}

pub mod hash {
    pub mod digest;

    pub use digest::{DIGEST_LEN, Digest, DigestHasher, digest_bytes, digest_file, digest_reader};
}

pub mod container {
    pub mod ledger;
    pub mod summary;
}

pub mod device;

pub mod capacity {
    pub mod verifier;
    pub mod writer;
}

pub mod report {
    pub mod chart;
    pub mod stats;
}

pub mod list;

// Re-exports: stable API surface
pub use capacity::verifier::{CapacityVerifier, verify};
pub use capacity::writer::{CapacityWriter, write};
pub use config::ProbeConfig;
pub use domain::{DeviceTarget, QUICK_LABEL, SpeedSample, VerifyReport, WriteReport};
pub use error::{ProbeError, Result};
pub use list::list;
pub use report::chart::{ChartOptions, render};
