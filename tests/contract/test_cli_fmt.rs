use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Contract tests for `reqm fmt`

fn fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/requirements.txt")
}

fn reqm() -> Command {
    let home = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join("reqm-home");
    let mut cmd = Command::cargo_bin("reqm").unwrap();
    cmd.env_remove("REQM_CONFIG")
        .env_remove("RUST_LOG")
        .env("HOME", &home)
        .env("XDG_CONFIG_HOME", &home);
    cmd
}

const MESSY: &str = "\n#Base\nnumpy >= 1.26 , < 3   # arrays\nh5py\n\n\n\n#   Export\nonnxruntime-gpu\n\n";
const CANONICAL: &str = "# Base\nnumpy>=1.26,<3  # arrays\nh5py\n\n# Export\nonnxruntime-gpu\n";

#[test]
fn test_fmt_reference_manifest_is_canonical() {
    let expected = fs::read_to_string(fixture()).unwrap();

    reqm().arg("fmt").arg(fixture()).assert().success().stdout(expected);

    reqm()
        .args(["fmt", "--check"])
        .arg(fixture())
        .assert()
        .success()
        .stdout(predicate::str::contains("is formatted"));
}

#[test]
fn test_fmt_prints_canonical_form() {
    reqm()
        .args(["fmt", "-"])
        .write_stdin(MESSY)
        .assert()
        .success()
        .stdout(CANONICAL);
}

#[test]
fn test_fmt_output_is_stable() {
    reqm()
        .args(["fmt", "--check", "-"])
        .write_stdin(CANONICAL)
        .assert()
        .success();
}

#[test]
fn test_fmt_check_detects_changes() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("requirements.txt");
    fs::write(&path, MESSY).unwrap();

    reqm()
        .args(["fmt", "--check"])
        .arg(&path)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("would be reformatted"));

    assert_eq!(fs::read_to_string(&path).unwrap(), MESSY);
}

#[test]
fn test_fmt_write_rewrites_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("requirements.txt");
    fs::write(&path, MESSY).unwrap();

    reqm()
        .args(["fmt", "--write"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Formatted"));
    assert_eq!(fs::read_to_string(&path).unwrap(), CANONICAL);

    reqm()
        .args(["fmt", "--write"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("already formatted"));
}

#[test]
fn test_fmt_write_rejects_stdin() {
    reqm()
        .args(["fmt", "--write", "-"])
        .write_stdin(MESSY)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("stdin"));
}

#[test]
fn test_fmt_check_and_write_conflict() {
    reqm()
        .args(["fmt", "--check", "--write"])
        .arg(fixture())
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}
