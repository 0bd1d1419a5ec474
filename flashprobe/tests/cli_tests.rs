use std::process::Command;

fn flashprobe() -> Command {
    Command::new(env!("CARGO_BIN_EXE_flashprobe"))
}

#[test]
fn test_help_lists_subcommands() {
    let out = flashprobe().arg("--help").output().expect("run");
    assert!(out.status.success());
    let text = String::from_utf8_lossy(&out.stdout);
    for cmd in ["devices", "write", "verify", "ledger"] {
        assert!(text.contains(cmd), "missing {cmd} in:\n{text}");
    }
}

#[test]
fn test_out_of_range_percent_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let out = flashprobe()
        .args(["write", "--percent", "150"])
        .arg(dir.path())
        .output()
        .expect("run");
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("percent"));
}

#[test]
fn test_ledger_without_test_data_fails() {
    let dir = tempfile::tempdir().unwrap();
    let out = flashprobe().arg("ledger").arg(dir.path()).output().expect("run");
    assert!(!out.status.success());
}

#[test]
fn test_invalid_config_file_fails_before_any_io() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = dir.path().join("bad.toml");
    std::fs::write(&cfg, "safety_margin = 2.0\n").unwrap();
    let out = flashprobe()
        .arg("--config")
        .arg(&cfg)
        .arg("verify")
        .arg(dir.path())
        .output()
        .expect("run");
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("safety_margin"));
}

#[test]
fn test_errors_are_printed_for_humans() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = dir.path().join("bad.toml");
    std::fs::write(&cfg, "chunk_size = 0\n").unwrap();
    let out = flashprobe()
        .arg("--config")
        .arg(&cfg)
        .arg("ledger")
        .arg(dir.path())
        .output()
        .expect("run");
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("error: Config error: chunk_size must be > 0"), "{stderr}");
    assert!(!stderr.contains("Config(\""), "{stderr}");
}
