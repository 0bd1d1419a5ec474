use std::fs::File;
use std::io::{BufWriter, Write};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::chunking::generator::{ChunkGenerator, generate};
use crate::config::ProbeConfig;
use crate::container::ledger::Ledger;
use crate::container::summary::RunSummary;
use crate::device::{Backend, DeviceFs, open_device};
use crate::domain::{
    CapacityCheck, ChunkFailure, ChunkStage, DeviceTarget, LEDGER_FILE_NAME, QUICK_FILE_NAME, QUICK_LABEL,
    SUMMARY_FILE_NAME, SpeedSample, WriteReport, WriteStatus, chunk_file_name,
};
use crate::error::{ProbeError, Result};
use crate::hash::{Digest, digest_file};
use crate::progress::Progress;
use crate::staging::StagingDir;
use crate::util::copy::copy_bounded;

/// Bytes to write for a run: the requested share of free space, scaled down
/// by the safety margin.
pub fn plan_test_size(available: u64, fraction: f64, safety_margin: f64) -> u64 {
    (available as f64 * fraction * safety_margin).floor() as u64
}

pub fn chunk_count(total: u64, chunk_size: u64) -> u64 {
    total.div_ceil(chunk_size.max(1))
}

/// Sizes of the fixed-size chunks covering `total`; only the last may be
/// shorter. Computed on demand, one chunk at a time.
pub fn plan_chunks(total: u64, chunk_size: u64) -> impl DoubleEndedIterator<Item = u64> {
    let chunk_size = chunk_size.max(1);
    (0..chunk_count(total, chunk_size)).map(move |i| (total - i * chunk_size).min(chunk_size))
}

/// Fill-and-record half of a capacity test.
pub struct CapacityWriter<'a> {
    cfg: ProbeConfig,
    device: &'a dyn DeviceFs,
}

enum Content<'g> {
    Seeded(u64),
    Generated(&'g mut ChunkGenerator, u64),
}

impl<'a> CapacityWriter<'a> {
    pub fn new(cfg: ProbeConfig, device: &'a dyn DeviceFs) -> Self {
        Self { cfg, device }
    }

    pub fn write(&self, target: &DeviceTarget, fraction: f64) -> Result<WriteReport> {
        if !(fraction > 0.0 && fraction <= 1.0) {
            return Err(ProbeError::Config(format!(
                "fraction of capacity must be in (0, 1], got {fraction}"
            )));
        }
        self.cfg.validate()?;

        let planned_bytes =
            plan_test_size(target.available_bytes, fraction, self.cfg.safety_margin);
        let chunks_planned = chunk_count(planned_bytes, self.cfg.chunk_size);
        info!(
            device = %target.name,
            root = %target.root_path.display(),
            available = target.available_bytes,
            planned_bytes,
            chunks = chunks_planned,
            "starting capacity write"
        );

        self.device.reset()?;
        let staging = StagingDir::open(&self.cfg.staging_dir)?;

        let mut report = WriteReport {
            status: WriteStatus::Completed,
            percent: fraction * 100.0,
            planned_bytes,
            bytes_written: 0,
            chunks_planned: usize::try_from(chunks_planned).unwrap_or(usize::MAX),
            chunks_written: 0,
            ledger_entries: 0,
            samples: Vec::new(),
            elapsed: Duration::ZERO,
            failure: None,
            ledger_saved: false,
            summary_saved: false,
            capacity_check: None,
        };
        let started = Instant::now();
        let mut ledger = Ledger::new();

        // Smoke test before committing to a long run.
        let quick_size = self.cfg.quick_test_size;
        match self.write_one(&staging, QUICK_FILE_NAME, None, quick_size, Content::Seeded(0)) {
            Ok((digest, elapsed)) => {
                let sample = SpeedSample::measure(QUICK_LABEL, quick_size, elapsed);
                info!(speed_mbps = sample.speed_mbps, "quick test passed");
                ledger.push(QUICK_FILE_NAME, digest)?;
                report.samples.push(sample);
            }
            Err(failure) => {
                warn!(reason = %failure.reason, "quick test failed; aborting");
                report.status = WriteStatus::QuickTestFailed;
                report.failure = Some(failure);
                report.elapsed = started.elapsed();
                return Ok(report);
            }
        }

        let buffer_size = (self.cfg.buffer_size as u64).min(self.cfg.chunk_size) as usize;
        let mut generator = ChunkGenerator::new(buffer_size)?;

        for (i, size) in plan_chunks(planned_bytes, self.cfg.chunk_size).enumerate() {
            let name = chunk_file_name(i);
            debug!(chunk = i + 1, of = chunks_planned, size, "writing chunk");
            let content = Content::Generated(&mut generator, i as u64 + 1);
            match self.write_one(&staging, &name, Some(i), size, content) {
                Ok((digest, elapsed)) => {
                    let sample = SpeedSample::measure((i + 1).to_string(), size, elapsed);
                    debug!(chunk = %name, speed_mbps = sample.speed_mbps, "chunk written");
                    ledger.push(name, digest)?;
                    report.samples.push(sample);
                    report.bytes_written += size;
                    report.chunks_written += 1;
                }
                Err(failure) => {
                    warn!(
                        chunk = %failure.name,
                        stage = ?failure.stage,
                        reason = %failure.reason,
                        written = report.bytes_written,
                        "write failed; stopping"
                    );
                    report.status = WriteStatus::Partial;
                    report.failure = Some(failure);
                    break;
                }
            }
        }
        report.elapsed = started.elapsed();
        report.ledger_entries = ledger.len();
        if fraction >= 1.0 && report.status == WriteStatus::Completed {
            let check = CapacityCheck::assess(target.total_capacity_bytes, report.bytes_written);
            if !check.consistent {
                warn!(
                    declared = check.declared_bytes,
                    written = check.written_bytes,
                    percent = check.written_percent,
                    "device may be smaller than declared"
                );
            }
            report.capacity_check = Some(check);
        }

        report.ledger_saved = self.persist(LEDGER_FILE_NAME, &ledger.to_bytes()?);
        let mut summary = RunSummary::for_target(target);
        summary.percent = report.percent;
        summary.planned_bytes = planned_bytes;
        summary.bytes_written = report.bytes_written;
        summary.file_count = ledger.len();
        summary.elapsed = report.elapsed;
        summary.status = report.status;
        report.summary_saved = self.persist(SUMMARY_FILE_NAME, summary.render().as_bytes());

        drop(staging);
        info!(
            status = ?report.status,
            bytes_written = report.bytes_written,
            chunks = report.chunks_written,
            elapsed_s = report.elapsed.as_secs_f64(),
            "capacity write finished"
        );
        Ok(report)
    }

    /// Generate, digest and transfer one file. Returns the digest of the staged
    /// copy and the transfer time alone.
    fn write_one(
        &self,
        staging: &StagingDir,
        name: &str,
        index: Option<usize>,
        size: u64,
        content: Content<'_>,
    ) -> std::result::Result<(Digest, Duration), ChunkFailure> {
        let fail = |stage: ChunkStage, reason: String| ChunkFailure {
            index,
            name: name.to_string(),
            stage,
            reason,
        };
        let staged = staging.file(name);

        let generated = (|| -> std::io::Result<()> {
            let mut w = BufWriter::new(File::create(staged.path())?);
            let mut progress = Progress::from_config("generate", name, size, &self.cfg);
            match content {
                Content::Seeded(seed) => {
                    w.write_all(&generate(size as usize, seed))?;
                    progress.advance(size);
                }
                Content::Generated(generator, seed) => {
                    generator.write_chunk(&mut w, size, seed, &mut progress)?;
                }
            }
            w.flush()
        })();
        generated.map_err(|e| fail(ChunkStage::Generate, e.to_string()))?;

        let digest = digest_file(
            staged.path(),
            self.cfg.hash_block_size,
            self.cfg.progress_threshold,
            self.cfg.progress_step,
        )
        .map_err(|e| fail(ChunkStage::Digest, e.to_string()))?;

        let started = Instant::now();
        let transferred = self.transfer(staged.path(), name, size);
        let elapsed = started.elapsed();
        if let Err(e) = transferred {
            if let Err(rm) = self.device.remove(name) {
                debug!(file = name, error = %rm, "could not remove partial file");
            }
            return Err(fail(ChunkStage::Transfer, e.to_string()));
        }
        Ok((digest, elapsed))
    }

    fn transfer(&self, staged: &std::path::Path, name: &str, size: u64) -> Result<()> {
        let mut src = File::open(staged).map_err(|e| ProbeError::Staging(e.to_string()))?;
        let mut dst = self.device.create(name)?;
        let mut buf = vec![0u8; self.cfg.copy_buffer_size];
        let mut progress = Progress::from_config("transfer", name, size, &self.cfg);
        let copied = copy_bounded(&mut src, &mut dst, &mut buf, &mut progress)
            .map_err(|e| ProbeError::medium(self.device.dir().join(name), e))?;
        dst.flush()
            .map_err(|e| ProbeError::medium(self.device.dir().join(name), e))?;
        if copied != size {
            return Err(ProbeError::Staging(format!(
                "staged {name} holds {copied} bytes, expected {size}"
            )));
        }
        Ok(())
    }

    fn persist(&self, name: &str, bytes: &[u8]) -> bool {
        let res = self.device.create(name).and_then(|mut w| {
            w.write_all(bytes)
                .and_then(|_| w.flush())
                .map_err(|e| ProbeError::medium(self.device.dir().join(name), e))
        });
        match res {
            Ok(()) => true,
            Err(e) => {
                warn!(file = name, error = %e, "could not persist to device");
                false
            }
        }
    }
}

/// Run a capacity write against the filesystem mounted at `target.root_path`.
pub fn write(target: &DeviceTarget, fraction: f64, cfg: &ProbeConfig) -> Result<WriteReport> {
    let device = open_device(Backend::Fs, target, cfg)?;
    CapacityWriter::new(cfg.clone(), device.as_ref()).write(target, fraction)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_applies_fraction_and_margin() {
        assert_eq!(plan_test_size(1_000_000, 1.0, 0.95), 950_000);
        assert_eq!(plan_test_size(1_000_000, 0.5, 0.95), 475_000);
        assert_eq!(plan_test_size(0, 1.0, 0.95), 0);
    }

    #[test]
    fn chunks_cover_total_with_short_tail() {
        let plan = |t, c| plan_chunks(t, c).collect::<Vec<_>>();
        assert_eq!(plan(25, 10), vec![10, 10, 5]);
        assert_eq!(plan(20, 10), vec![10, 10]);
        assert_eq!(plan(3, 10), vec![3]);
        assert!(plan(0, 10).is_empty());
        assert_eq!(chunk_count(25, 10), 3);
        assert_eq!(chunk_count(0, 10), 0);
    }

    #[test]
    fn huge_plans_are_not_materialised() {
        assert_eq!(chunk_count(u64::MAX, 1), u64::MAX);
        let head: Vec<u64> = plan_chunks(u64::MAX, 1).take(3).collect();
        assert_eq!(head, vec![1, 1, 1]);
        let tail = plan_chunks(1 << 40, 3).next_back();
        assert_eq!(tail, Some((1 << 40) % 3));
    }
}
