// Ledger listing, config files and the throughput chart over real runs

mod common;

use std::fs;

use common::*;
use flashprobe_core::device::FsDevice;
use flashprobe_core::{ChartOptions, ProbeConfig, QUICK_LABEL, list, render, write};

#[test]
fn test_list_reports_presence_and_size() {
    let root = tempfile::tempdir().unwrap();
    let cfg = small_config(root.path());
    let target = target(root.path(), 25 * KIB);
    write(&target, 1.0, &cfg).unwrap();

    let dev = FsDevice::new(&target, &cfg);
    fs::remove_file(target.root_path.join("VerifyTest").join("test_0001.bin")).unwrap();

    let rows = list(&dev, &cfg).unwrap();
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0].name, "quicktest.bin");
    assert_eq!(rows[0].size, Some(2 * KIB));
    assert!(rows[1].present);
    assert!(!rows[2].present);
    assert_eq!(rows[2].size, None);
    assert_eq!(rows[3].size, Some(5 * KIB));
    assert_eq!(rows[3].digest.to_hex().len(), 32);
}

#[test]
fn test_list_without_ledger_fails() {
    let root = tempfile::tempdir().unwrap();
    let cfg = small_config(root.path());
    let target = target(root.path(), 25 * KIB);
    let dev = FsDevice::new(&target, &cfg);
    assert!(is_format(&list(&dev, &cfg).unwrap_err()));
}

#[test]
fn test_config_file_overrides_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("flashprobe.toml");
    fs::write(
        &path,
        "test_dir_name = \"ProbeRun\"\nchunk_size = 4096\nmax_display_bars = 5\n",
    )
    .unwrap();

    let cfg = ProbeConfig::load(&path).unwrap();
    assert_eq!(cfg.test_dir_name, "ProbeRun");
    assert_eq!(cfg.chunk_size, 4096);
    assert_eq!(cfg.max_display_bars, 5);
    assert_eq!(cfg.quick_test_size, ProbeConfig::default().quick_test_size);
}

#[test]
fn test_missing_config_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ProbeConfig::load(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, flashprobe_core::ProbeError::Io(_)));
}

#[test]
fn test_chart_of_a_real_run_excludes_quick_test() {
    let root = tempfile::tempdir().unwrap();
    let mut cfg = small_config(root.path());
    cfg.chunk_size = KIB;
    cfg.buffer_size = 512;
    let target = target(root.path(), 25 * KIB);

    let report = write(&target, 1.0, &cfg).unwrap();
    assert_eq!(report.samples.len(), 26);

    let text = render(&report.samples, QUICK_LABEL, &ChartOptions::from_config("WRITE SPEED", &cfg));
    assert!(text.starts_with("WRITE SPEED\n"));
    assert!(text.contains("(25 samples grouped into 9 bars)"));
    assert!(text.contains("1-3 = chunks 1 to 3"));
}
