//! Human-readable rendering of reports. Everything returns a `String`; the
//! handlers decide where it goes.

use std::fmt::Write as _;

use flashprobe_core::domain::{FileStatus, VerifyReport, WriteReport, WriteStatus};
use flashprobe_core::list::LedgerRow;
use flashprobe_core::{ChartOptions, DeviceTarget, ProbeConfig, QUICK_LABEL, render};

const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];

pub fn format_bytes(n: u64) -> String {
    let mut v = n as f64;
    let mut unit = 0;
    while v >= 1024.0 && unit + 1 < UNITS.len() {
        v /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{n} B")
    } else {
        format!("{v:.2} {}", UNITS[unit])
    }
}

pub fn devices_table(devices: &[DeviceTarget]) -> String {
    let mut out = String::new();
    if devices.is_empty() {
        out.push_str("No matching devices found.\n");
        return out;
    }
    let _ = writeln!(
        out,
        "{:<20} {:<30} {:>12} {:>12}  removable",
        "device", "mount", "total", "available"
    );
    for d in devices {
        let _ = writeln!(
            out,
            "{:<20} {:<30} {:>12} {:>12}  {}",
            d.name,
            d.root_path.display(),
            format_bytes(d.total_capacity_bytes),
            format_bytes(d.available_bytes),
            if d.is_removable { "yes" } else { "no" }
        );
    }
    out
}

pub fn write_summary(target: &DeviceTarget, report: &WriteReport, cfg: &ProbeConfig) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Device {} ({}): tested {:.0}% of {} free",
        target.name,
        target.root_path.display(),
        report.percent,
        format_bytes(target.available_bytes)
    );
    if let Some(q) = report.samples.iter().find(|s| s.label == QUICK_LABEL) {
        let _ = writeln!(
            out,
            "Quick test: {} at {:.2} MB/s",
            format_bytes(q.size_bytes),
            q.speed_mbps
        );
    }
    let _ = writeln!(
        out,
        "Wrote {} of {} files ({} of {}) in {:.1} s",
        report.chunks_written,
        report.chunks_planned,
        format_bytes(report.bytes_written),
        format_bytes(report.planned_bytes),
        report.elapsed.as_secs_f64()
    );
    if let Some(f) = &report.failure {
        let _ = writeln!(out, "Stopped at {} ({:?}): {}", f.name, f.stage, f.reason);
    }
    match report.status {
        WriteStatus::Completed => out.push_str("Write completed. Run `verify` to check the data.\n"),
        WriteStatus::Partial => out.push_str(
            "Write stopped early. The device may hold less than it reports; run `verify` on what was written.\n",
        ),
        WriteStatus::QuickTestFailed => {
            out.push_str("Quick test failed. The device is not writable; nothing else was written.\n")
        }
    }
    if let Some(check) = &report.capacity_check {
        if check.consistent {
            let _ = writeln!(
                out,
                "Capacity appears consistent with the declared {}.",
                format_bytes(check.declared_bytes)
            );
        } else {
            let _ = writeln!(
                out,
                "Capacity may be smaller than declared: only {:.1}% of {} was written.",
                check.written_percent,
                format_bytes(check.declared_bytes)
            );
        }
    }
    if !report.ledger_saved && report.status != WriteStatus::QuickTestFailed {
        out.push_str("Warning: the checksum ledger could not be saved; verification will not be possible.\n");
    }

    let chart = render(
        &report.samples,
        QUICK_LABEL,
        &ChartOptions::from_config("WRITE SPEED", cfg),
    );
    if !chart.is_empty() {
        out.push('\n');
        out.push_str(&chart);
    }
    out
}

pub fn verify_summary(report: &VerifyReport, cfg: &ProbeConfig) -> String {
    let mut out = String::new();
    for o in &report.outcomes {
        let tag = match o.status {
            FileStatus::Verified => "[OK]",
            FileStatus::Corrupted => "[CORRUPT]",
            FileStatus::Missing => "[MISSING]",
        };
        let _ = write!(out, "  {tag:<10} {:<16} {:>12}", o.name, format_bytes(o.size));
        if let Some(d) = &o.detail {
            let _ = write!(out, "  {d}");
        }
        out.push('\n');
    }
    let _ = writeln!(
        out,
        "\nVerified {} / Corrupted {} / Missing {} of {} files ({} checked in {:.1} s)",
        report.verified,
        report.corrupted,
        report.missing,
        report.total(),
        format_bytes(report.bytes_checked),
        report.elapsed.as_secs_f64()
    );
    if report.passed() {
        let _ = writeln!(out, "PASS: all {} files match their recorded digests", report.total());
    } else {
        out.push_str("FAIL: the device did not return the data written to it\n");
    }

    let chart = render(
        &report.samples,
        QUICK_LABEL,
        &ChartOptions::from_config("READ SPEED", cfg),
    );
    if !chart.is_empty() {
        out.push('\n');
        out.push_str(&chart);
    }
    out
}

pub fn ledger_table(rows: &[LedgerRow]) -> String {
    let mut out = String::new();
    for r in rows {
        let size = r.size.map(format_bytes).unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            out,
            "{:<16} {} {:>12}  {}",
            r.name,
            r.digest,
            size,
            if r.present { "present" } else { "missing" }
        );
    }
    let present = rows.iter().filter(|r| r.present).count();
    let _ = writeln!(out, "{} entries, {} present", rows.len(), present);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use flashprobe_core::domain::{CapacityCheck, FileOutcome};
    use std::path::PathBuf;
    use std::time::Duration;

    fn full_run(declared: u64, written: u64) -> (DeviceTarget, WriteReport) {
        let target = DeviceTarget {
            name: "USB".into(),
            root_path: PathBuf::from("/media/usb"),
            total_capacity_bytes: declared,
            available_bytes: declared,
            is_removable: true,
        };
        let report = WriteReport {
            status: WriteStatus::Completed,
            percent: 100.0,
            planned_bytes: written,
            bytes_written: written,
            chunks_planned: 1,
            chunks_written: 1,
            ledger_entries: 2,
            samples: Vec::new(),
            elapsed: Duration::from_secs(2),
            failure: None,
            ledger_saved: true,
            summary_saved: true,
            capacity_check: Some(CapacityCheck::assess(declared, written)),
        };
        (target, report)
    }

    #[test]
    fn full_run_reports_consistent_capacity() {
        let (target, report) = full_run(1024 * 1024, 1000 * 1024);
        let text = write_summary(&target, &report, &ProbeConfig::default());
        assert!(text.contains("Capacity appears consistent with the declared 1.00 MiB."));
        assert!(!text.contains("smaller than declared"));
    }

    #[test]
    fn full_run_flags_short_capacity() {
        let (target, report) = full_run(1024 * 1024, 256 * 1024);
        let text = write_summary(&target, &report, &ProbeConfig::default());
        assert!(text.contains("Capacity may be smaller than declared: only 25.0% of 1.00 MiB was written."));
    }

    #[test]
    fn bytes_pick_the_largest_unit() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1023), "1023 B");
        assert_eq!(format_bytes(1024), "1.00 KiB");
        assert_eq!(format_bytes(64 * 1024 * 1024), "64.00 MiB");
        assert_eq!(format_bytes(3 * 1024 * 1024 * 1024 / 2), "1.50 GiB");
    }

    #[test]
    fn verify_summary_flags_failures() {
        let report = VerifyReport {
            outcomes: vec![
                FileOutcome {
                    name: "test_0000.bin".into(),
                    status: FileStatus::Verified,
                    size: 1024,
                    detail: None,
                },
                FileOutcome {
                    name: "test_0001.bin".into(),
                    status: FileStatus::Missing,
                    size: 0,
                    detail: None,
                },
            ],
            verified: 1,
            missing: 1,
            ..VerifyReport::default()
        };
        let text = verify_summary(&report, &ProbeConfig::default());
        assert!(text.contains("[MISSING]"));
        assert!(text.contains("Verified 1 / Corrupted 0 / Missing 1 of 2 files"));
        assert!(text.contains("FAIL"));
    }

    #[test]
    fn empty_device_list() {
        assert_eq!(devices_table(&[]), "No matching devices found.\n");
    }
}
