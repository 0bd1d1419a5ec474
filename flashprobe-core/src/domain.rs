use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::hash::Digest;

/// Label carried by the smoke-test sample; excluded from throughput charts.
pub const QUICK_LABEL: &str = "Quick";
pub const QUICK_FILE_NAME: &str = "quicktest.bin";
pub const LEDGER_FILE_NAME: &str = "checksums.dat";
pub const SUMMARY_FILE_NAME: &str = "test_info.txt";

pub fn chunk_file_name(index: usize) -> String {
    format!("test_{index:04}.bin")
}

/// A mounted volume as seen by the platform at selection time.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DeviceTarget {
    pub name: String,
    pub root_path: PathBuf,
    pub total_capacity_bytes: u64,
    pub available_bytes: u64,
    pub is_removable: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkRecord {
    pub name: String,
    pub digest: Digest,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SpeedSample {
    pub label: String,
    pub size_bytes: u64,
    pub speed_mbps: f64,
}

impl SpeedSample {
    /// Throughput in MiB/s. Elapsed time is clamped so an instantaneous
    /// transfer yields a large finite value rather than infinity.
    pub fn measure(label: impl Into<String>, size_bytes: u64, elapsed: Duration) -> Self {
        let secs = elapsed.as_secs_f64().max(1e-6);
        Self {
            label: label.into(),
            size_bytes,
            speed_mbps: size_bytes as f64 / (1024.0 * 1024.0) / secs,
        }
    }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct AggregatedSample {
    pub label: String,
    pub total_size: u64,
    pub weighted_avg_speed: f64,
    pub min_speed: f64,
    pub max_speed: f64,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChunkStage {
    Generate,
    Digest,
    Transfer,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ChunkFailure {
    /// `None` for the quick test.
    pub index: Option<usize>,
    pub name: String,
    pub stage: ChunkStage,
    pub reason: String,
}

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WriteStatus {
    Completed,
    QuickTestFailed,
    Partial,
}

/// Share of the declared capacity a full run must reach to be taken at face
/// value.
pub const CONSISTENT_CAPACITY_SHARE: f64 = 0.95;

/// Bytes written by a full (100%) run set against the declared capacity.
#[derive(Clone, Copy, Debug, Serialize, PartialEq)]
pub struct CapacityCheck {
    pub declared_bytes: u64,
    pub written_bytes: u64,
    /// Percentage of the declared capacity actually written.
    pub written_percent: f64,
    pub consistent: bool,
}

impl CapacityCheck {
    pub fn assess(declared_bytes: u64, written_bytes: u64) -> Self {
        let written_percent = if declared_bytes == 0 {
            100.0
        } else {
            written_bytes as f64 * 100.0 / declared_bytes as f64
        };
        Self {
            declared_bytes,
            written_bytes,
            written_percent,
            consistent: written_bytes as f64 >= declared_bytes as f64 * CONSISTENT_CAPACITY_SHARE,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct WriteReport {
    pub status: WriteStatus,
    pub percent: f64,
    pub planned_bytes: u64,
    /// Bytes of full chunks written; the quick test is not counted.
    pub bytes_written: u64,
    pub chunks_planned: usize,
    pub chunks_written: usize,
    pub ledger_entries: usize,
    pub samples: Vec<SpeedSample>,
    pub elapsed: Duration,
    pub failure: Option<ChunkFailure>,
    pub ledger_saved: bool,
    pub summary_saved: bool,
    /// Set only for completed full-capacity runs.
    pub capacity_check: Option<CapacityCheck>,
}

impl WriteReport {
    pub fn succeeded(&self) -> bool {
        self.status == WriteStatus::Completed && self.ledger_saved
    }
}

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Verified,
    Corrupted,
    Missing,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct FileOutcome {
    pub name: String,
    pub status: FileStatus,
    pub size: u64,
    pub detail: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct VerifyReport {
    pub outcomes: Vec<FileOutcome>,
    pub verified: usize,
    pub corrupted: usize,
    pub missing: usize,
    pub bytes_checked: u64,
    pub bytes_verified: u64,
    pub samples: Vec<SpeedSample>,
    pub elapsed: Duration,
}

impl VerifyReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn passed(&self) -> bool {
        self.corrupted == 0 && self.missing == 0
    }

    pub(crate) fn record(&mut self, outcome: FileOutcome) {
        match outcome.status {
            FileStatus::Verified => {
                self.verified += 1;
                self.bytes_verified += outcome.size;
            }
            FileStatus::Corrupted => self.corrupted += 1,
            FileStatus::Missing => self.missing += 1,
        }
        self.outcomes.push(outcome);
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, PartialEq, Eq)]
pub struct PurgeReport {
    pub files_removed: u64,
    pub bytes_removed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_names_are_zero_padded() {
        assert_eq!(chunk_file_name(0), "test_0000.bin");
        assert_eq!(chunk_file_name(42), "test_0042.bin");
        assert_eq!(chunk_file_name(12345), "test_12345.bin");
    }

    #[test]
    fn measure_reports_mib_per_second() {
        let s = SpeedSample::measure("1", 10 * 1024 * 1024, Duration::from_millis(500));
        assert!((s.speed_mbps - 20.0).abs() < 1e-9);
    }

    #[test]
    fn measure_zero_elapsed_is_finite() {
        let s = SpeedSample::measure("1", 1024, Duration::ZERO);
        assert!(s.speed_mbps.is_finite());
    }

    #[test]
    fn capacity_check_uses_ninety_five_percent_of_declared() {
        let ok = CapacityCheck::assess(1000, 950);
        assert!(ok.consistent);
        assert!((ok.written_percent - 95.0).abs() < 1e-9);

        let short = CapacityCheck::assess(1000, 949);
        assert!(!short.consistent);

        let fake = CapacityCheck::assess(64 * 1024, 8 * 1024);
        assert!(!fake.consistent);
        assert!((fake.written_percent - 12.5).abs() < 1e-9);

        assert!(CapacityCheck::assess(0, 0).consistent);
    }

    #[test]
    fn verdict_requires_no_corrupt_or_missing() {
        let mut r = VerifyReport::default();
        r.record(FileOutcome {
            name: "a".into(),
            status: FileStatus::Verified,
            size: 4,
            detail: None,
        });
        assert!(r.passed());
        r.record(FileOutcome {
            name: "b".into(),
            status: FileStatus::Missing,
            size: 0,
            detail: None,
        });
        assert!(!r.passed());
        assert_eq!(r.total(), 2);
        assert_eq!(r.bytes_verified, 4);
    }
}
