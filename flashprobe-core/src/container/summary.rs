use std::fmt::Write as _;
use std::time::Duration;

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::domain::{DeviceTarget, WriteStatus};

/// Human-readable record of one write session, stored as `key: value` lines.
#[derive(Clone, Debug)]
pub struct RunSummary {
    pub timestamp: OffsetDateTime,
    pub device_name: String,
    pub root_path: String,
    pub total_capacity_bytes: u64,
    pub available_bytes: u64,
    pub percent: f64,
    pub planned_bytes: u64,
    pub bytes_written: u64,
    pub file_count: usize,
    pub elapsed: Duration,
    pub status: WriteStatus,
}

impl RunSummary {
    pub fn for_target(target: &DeviceTarget) -> Self {
        Self {
            timestamp: OffsetDateTime::now_utc(),
            device_name: target.name.clone(),
            root_path: target.root_path.display().to_string(),
            total_capacity_bytes: target.total_capacity_bytes,
            available_bytes: target.available_bytes,
            percent: 0.0,
            planned_bytes: 0,
            bytes_written: 0,
            file_count: 0,
            elapsed: Duration::ZERO,
            status: WriteStatus::Completed,
        }
    }

    pub fn render(&self) -> String {
        let ts = self
            .timestamp
            .format(&Rfc3339)
            .unwrap_or_else(|_| self.timestamp.unix_timestamp().to_string());
        let status = match self.status {
            WriteStatus::Completed => "completed",
            WriteStatus::QuickTestFailed => "quick test failed",
            WriteStatus::Partial => "partial",
        };
        let mut out = String::new();
        let _ = writeln!(out, "timestamp: {ts}");
        let _ = writeln!(out, "device: {}", self.device_name);
        let _ = writeln!(out, "root: {}", self.root_path);
        let _ = writeln!(out, "declared_capacity_bytes: {}", self.total_capacity_bytes);
        let _ = writeln!(out, "available_bytes: {}", self.available_bytes);
        let _ = writeln!(out, "tested_percent: {:.0}", self.percent);
        let _ = writeln!(out, "planned_bytes: {}", self.planned_bytes);
        let _ = writeln!(out, "bytes_written: {}", self.bytes_written);
        let _ = writeln!(out, "file_count: {}", self.file_count);
        let _ = writeln!(out, "elapsed_seconds: {:.1}", self.elapsed.as_secs_f64());
        let _ = writeln!(out, "status: {status}");
        out
    }
}
