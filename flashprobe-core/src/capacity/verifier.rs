use std::fs::File;
use std::io::Write;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::config::ProbeConfig;
use crate::container::ledger::Ledger;
use crate::device::{Backend, DeviceFs, open_device};
use crate::domain::{
    ChunkRecord, DeviceTarget, FileOutcome, FileStatus, LEDGER_FILE_NAME, PurgeReport,
    QUICK_FILE_NAME, QUICK_LABEL, SpeedSample, VerifyReport,
};
use crate::error::{ProbeError, Result};
use crate::hash::digest_file;
use crate::progress::Progress;
use crate::staging::StagingDir;
use crate::util::copy::copy_bounded;

/// Read-back half of a capacity test.
pub struct CapacityVerifier<'a> {
    cfg: ProbeConfig,
    device: &'a dyn DeviceFs,
}

struct Checked {
    size: u64,
    matched: bool,
}

impl<'a> CapacityVerifier<'a> {
    pub fn new(cfg: ProbeConfig, device: &'a dyn DeviceFs) -> Self {
        Self { cfg, device }
    }

    /// Load the ledger written by a previous run. Absent, malformed or empty
    /// ledgers are all `Format` errors.
    pub fn load_ledger(&self) -> Result<Ledger> {
        self.cfg.validate()?;
        if !self.device.exists(LEDGER_FILE_NAME) {
            return Err(ProbeError::Format(format!(
                "no test data found: {} is missing",
                self.device.dir().join(LEDGER_FILE_NAME).display()
            )));
        }
        let ledger = Ledger::read_from(self.device.open(LEDGER_FILE_NAME)?)?;
        if ledger.is_empty() {
            return Err(ProbeError::Format("ledger holds no entries".into()));
        }
        Ok(ledger)
    }

    pub fn verify(&self, target: &DeviceTarget) -> Result<VerifyReport> {
        let ledger = self.load_ledger()?;
        info!(
            device = %target.name,
            files = ledger.len(),
            "starting verification"
        );
        let staging = StagingDir::open(&self.cfg.staging_dir)?;
        let started = Instant::now();
        let mut report = VerifyReport::default();
        let mut ordinal = 0usize;

        for rec in ledger.records() {
            if !self.device.exists(&rec.name) {
                warn!(file = %rec.name, "missing");
                report.record(FileOutcome {
                    name: rec.name.clone(),
                    status: FileStatus::Missing,
                    size: 0,
                    detail: None,
                });
                continue;
            }

            let label = if rec.name.eq_ignore_ascii_case(QUICK_FILE_NAME) {
                QUICK_LABEL.to_string()
            } else {
                ordinal += 1;
                ordinal.to_string()
            };

            let t0 = Instant::now();
            let outcome = match self.check_one(&staging, rec) {
                Ok(Checked { size, matched }) => {
                    let sample = SpeedSample::measure(label, size, t0.elapsed());
                    debug!(file = %rec.name, matched, speed_mbps = sample.speed_mbps, "checked");
                    report.samples.push(sample);
                    report.bytes_checked += size;
                    if !matched {
                        warn!(file = %rec.name, "digest mismatch");
                    }
                    FileOutcome {
                        name: rec.name.clone(),
                        status: if matched {
                            FileStatus::Verified
                        } else {
                            FileStatus::Corrupted
                        },
                        size,
                        detail: (!matched).then(|| "digest mismatch".to_string()),
                    }
                }
                Err(e) => {
                    warn!(file = %rec.name, error = %e, "read failed");
                    FileOutcome {
                        name: rec.name.clone(),
                        status: FileStatus::Corrupted,
                        size: self.device.size(&rec.name).unwrap_or(0),
                        detail: Some(e.to_string()),
                    }
                }
            };
            report.record(outcome);
        }

        report.elapsed = started.elapsed();
        drop(staging);
        info!(
            verified = report.verified,
            corrupted = report.corrupted,
            missing = report.missing,
            passed = report.passed(),
            "verification finished"
        );
        Ok(report)
    }

    /// Copy one file off the device and digest the local copy. The staged
    /// copy is removed on every exit path.
    fn check_one(&self, staging: &StagingDir, rec: &ChunkRecord) -> Result<Checked> {
        let size = self.device.size(&rec.name)?;
        let staged = staging.file(&rec.name);
        {
            let mut src = self.device.open(&rec.name)?;
            let mut dst = File::create(staged.path())
                .map_err(|e| ProbeError::Staging(format!("{}: {e}", staged.path().display())))?;
            let mut buf = vec![0u8; self.cfg.copy_buffer_size];
            let mut progress = Progress::from_config("read", &rec.name, size, &self.cfg);
            copy_bounded(&mut src, &mut dst, &mut buf, &mut progress)
                .map_err(|e| ProbeError::medium(self.device.dir().join(&rec.name), e))?;
            dst.flush()?;
        }
        let actual = digest_file(
            staged.path(),
            self.cfg.hash_block_size,
            self.cfg.progress_threshold,
            self.cfg.progress_step,
        )?;
        Ok(Checked {
            size,
            matched: actual == rec.digest,
        })
    }

    /// Delete all test artifacts, ledger included.
    pub fn purge(&self) -> Result<PurgeReport> {
        let r = self.device.remove_all()?;
        info!(files = r.files_removed, bytes = r.bytes_removed, "test data removed");
        Ok(r)
    }
}

/// Verify the test data on the filesystem mounted at `target.root_path`.
pub fn verify(target: &DeviceTarget, cfg: &ProbeConfig) -> Result<VerifyReport> {
    let device = open_device(Backend::Fs, target, cfg)?;
    CapacityVerifier::new(cfg.clone(), device.as_ref()).verify(target)
}
