use std::path::PathBuf;
use std::process::ExitCode;

use flashprobe_core::device::{Backend, DeviceFs, open_device};
use flashprobe_core::domain::PurgeReport;
use flashprobe_core::error::{ProbeError, Result};
use flashprobe_core::{
    CapacityVerifier, CapacityWriter, DeviceTarget, ProbeConfig, VerifyReport, list,
};
use tracing::{info, warn};

use super::disks;
use crate::presentation::output;

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| ProbeError::Io(e.into()))
}

pub fn handle_devices(all: bool) -> Result<ExitCode> {
    let devices: Vec<_> = disks::mounted()
        .into_iter()
        .filter(|d| all || d.is_removable)
        .collect();
    print!("{}", output::devices_table(&devices));
    Ok(ExitCode::SUCCESS)
}

pub fn handle_write(cfg: &ProbeConfig, mount: PathBuf, percent: f64, force: bool) -> Result<ExitCode> {
    let target = disks::target_for(&mount)?;
    if !target.is_removable {
        if !force {
            return Err(ProbeError::Config(format!(
                "{} ({}) is not removable media; pass --force to test it anyway",
                target.name,
                target.root_path.display()
            )));
        }
        warn!(device = %target.name, "testing a non-removable disk");
    }

    let device = open_device(Backend::Fs, &target, cfg)?;
    let report = CapacityWriter::new(cfg.clone(), device.as_ref()).write(&target, percent / 100.0)?;
    print!("{}", output::write_summary(&target, &report, cfg));
    Ok(if report.succeeded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

pub fn handle_verify(cfg: &ProbeConfig, mount: PathBuf, cleanup: bool, json: bool) -> Result<ExitCode> {
    let target = disks::target_for(&mount)?;
    let device = open_device(Backend::Fs, &target, cfg)?;
    let (report, _) = verify_session(cfg, &target, device.as_ref(), cleanup, |report| {
        if json {
            println!("{}", to_json(report)?);
        } else {
            print!("{}", output::verify_summary(report, cfg));
        }
        Ok(())
    })?;

    Ok(if report.passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Verify, show the report, then purge when asked. The verdict is fixed before
/// cleanup runs; a failed purge is only logged.
fn verify_session(
    cfg: &ProbeConfig,
    target: &DeviceTarget,
    device: &dyn DeviceFs,
    cleanup: bool,
    show: impl FnOnce(&VerifyReport) -> Result<()>,
) -> Result<(VerifyReport, Option<PurgeReport>)> {
    let verifier = CapacityVerifier::new(cfg.clone(), device);
    let report = verifier.verify(target)?;
    show(&report)?;

    if !cleanup {
        return Ok((report, None));
    }
    match verifier.purge() {
        Ok(purged) => {
            info!(
                files = purged.files_removed,
                bytes = %output::format_bytes(purged.bytes_removed),
                "cleanup done"
            );
            Ok((report, Some(purged)))
        }
        Err(e) => {
            warn!(error = %e, "cleanup failed; test data left on the device");
            Ok((report, None))
        }
    }
}

pub fn handle_ledger(cfg: &ProbeConfig, mount: PathBuf, json: bool) -> Result<ExitCode> {
    let target = disks::target_for(&mount)?;
    let device = open_device(Backend::Fs, &target, cfg)?;
    let rows = list(device.as_ref(), cfg)?;
    if json {
        println!("{}", to_json(&rows)?);
    } else {
        print!("{}", output::ledger_table(&rows));
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flashprobe_core::device::FsDevice;
    use std::io::{self, Read, Write};
    use std::path::Path;

    /// Filesystem device on a medium that refuses deletions.
    struct Undeletable(FsDevice);

    impl DeviceFs for Undeletable {
        fn dir(&self) -> &Path {
            self.0.dir()
        }
        fn reset(&self) -> Result<()> {
            self.0.reset()
        }
        fn create(&self, name: &str) -> Result<Box<dyn Write + '_>> {
            self.0.create(name)
        }
        fn open(&self, name: &str) -> Result<Box<dyn Read + '_>> {
            self.0.open(name)
        }
        fn exists(&self, name: &str) -> bool {
            self.0.exists(name)
        }
        fn size(&self, name: &str) -> Result<u64> {
            self.0.size(name)
        }
        fn remove(&self, name: &str) -> Result<()> {
            self.0.remove(name)
        }
        fn remove_all(&self) -> Result<PurgeReport> {
            Err(ProbeError::medium(
                self.0.dir(),
                io::Error::other("read-only file system"),
            ))
        }
    }

    fn setup(root: &Path) -> (ProbeConfig, DeviceTarget) {
        let cfg = ProbeConfig {
            chunk_size: 8 * 1024,
            quick_test_size: 1024,
            buffer_size: 4096,
            copy_buffer_size: 1024,
            hash_block_size: 4096,
            safety_margin: 1.0,
            staging_dir: root.join("stage"),
            ..ProbeConfig::default()
        };
        let mount = root.join("mnt");
        std::fs::create_dir_all(&mount).unwrap();
        let target = DeviceTarget {
            name: "SIMULATED".into(),
            root_path: mount,
            total_capacity_bytes: 20 * 1024,
            available_bytes: 20 * 1024,
            is_removable: true,
        };
        flashprobe_core::write(&target, 1.0, &cfg).unwrap();
        (cfg, target)
    }

    #[test]
    fn failed_cleanup_keeps_passing_verdict() {
        let root = tempfile::tempdir().unwrap();
        let (cfg, target) = setup(root.path());
        let device = Undeletable(FsDevice::new(&target, &cfg));

        let mut shown = false;
        let (report, purged) = verify_session(&cfg, &target, &device, true, |r| {
            shown = r.passed();
            Ok(())
        })
        .expect("purge failure must not fail the session");
        assert!(shown);
        assert!(report.passed());
        assert!(purged.is_none());
        assert!(device.exists("checksums.dat"));
    }

    #[test]
    fn cleanup_removes_test_data_after_verdict() {
        let root = tempfile::tempdir().unwrap();
        let (cfg, target) = setup(root.path());
        let device = FsDevice::new(&target, &cfg);

        let (report, purged) = verify_session(&cfg, &target, &device, true, |_| Ok(())).unwrap();
        assert!(report.passed());
        // quick test, three chunks, ledger, summary
        assert_eq!(purged.map(|p| p.files_removed), Some(6));
        assert!(!device.dir().exists());
    }
}
