use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ProbeError, Result};

pub const MIB: u64 = 1024 * 1024;

/// Tunables for one write/verify session. Passed by value into the writer and
/// verifier; nothing here is read from ambient state.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProbeConfig {
    /// Directory created at the device root to hold test artifacts.
    pub test_dir_name: String,
    pub chunk_size: u64,
    pub quick_test_size: u64,
    /// Scratch buffer reused by the chunk generator.
    pub buffer_size: usize,
    /// Bounded buffer for staging <-> device transfers.
    pub copy_buffer_size: usize,
    pub hash_block_size: usize,
    /// Fraction of the requested space actually written; leaves headroom on
    /// the device.
    pub safety_margin: f64,
    pub max_display_bars: usize,
    pub chart_height: usize,
    /// Files at or below this size never report progress.
    pub progress_threshold: u64,
    pub progress_step: u64,
    pub staging_dir: PathBuf,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            test_dir_name: "VerifyTest".to_string(),
            chunk_size: 64 * MIB,
            quick_test_size: MIB,
            buffer_size: (64 * MIB) as usize,
            copy_buffer_size: MIB as usize,
            hash_block_size: (8 * MIB) as usize,
            safety_margin: 0.95,
            max_display_bars: 10,
            chart_height: 16,
            progress_threshold: 100 * MIB,
            progress_step: 32 * MIB,
            staging_dir: std::env::temp_dir().join("flashprobe-staging"),
        }
    }
}

impl ProbeConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> Result<Self> {
        let config: ProbeConfig =
            toml::from_str(s).map_err(|e| ProbeError::Config(format!("toml: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure(
            !self.test_dir_name.is_empty()
                && !self.test_dir_name.contains(['/', '\\'])
                && self.test_dir_name != ".."
                && self.test_dir_name != ".",
            || format!("test_dir_name must be a plain directory name, got {:?}", self.test_dir_name),
        )?;
        ensure(self.chunk_size > 0, || "chunk_size must be > 0".into())?;
        ensure(self.quick_test_size > 0, || "quick_test_size must be > 0".into())?;
        ensure(self.buffer_size > 0, || "buffer_size must be > 0".into())?;
        ensure(self.copy_buffer_size > 0, || "copy_buffer_size must be > 0".into())?;
        ensure(self.hash_block_size > 0, || "hash_block_size must be > 0".into())?;
        ensure(self.safety_margin > 0.0 && self.safety_margin <= 1.0, || {
            format!("safety_margin must be in (0, 1], got {}", self.safety_margin)
        })?;
        ensure(self.max_display_bars > 0, || "max_display_bars must be > 0".into())?;
        ensure(self.chart_height >= 2, || {
            format!("chart_height must be >= 2, got {}", self.chart_height)
        })?;
        ensure(self.progress_step > 0, || "progress_step must be > 0".into())?;
        ensure(!self.staging_dir.as_os_str().is_empty(), || {
            "staging_dir must be non-empty".into()
        })?;
        Ok(())
    }
}

fn ensure(cond: bool, msg: impl FnOnce() -> String) -> Result<()> {
    if cond {
        Ok(())
    } else {
        Err(ProbeError::Config(msg()))
    }
}
