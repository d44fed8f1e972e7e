use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Contract tests for `reqm check`

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

fn write_manifest(temp_dir: &TempDir, content: &str) -> PathBuf {
    let path = temp_dir.path().join("requirements.txt");
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_check_reference_manifest_is_clean() {
    reqm()
        .arg("check")
        .arg(fixture())
        .assert()
        .success()
        .stdout(predicate::str::contains("10 packages, no problems found"));
}

#[test]
fn test_check_reports_invalid_identifier() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_manifest(&temp_dir, "numpy\n%torch\n");

    reqm()
        .arg("check")
        .arg(&path)
        .assert()
        .code(1)
        .stdout(predicate::str::contains(":2: error[invalid-requirement]"));
}

#[test]
fn test_check_reports_duplicates_by_normalized_name() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_manifest(&temp_dir, "# Base\nopencv-python\ntorch\n\n# Extra\nOpenCV_Python\n");

    reqm()
        .arg("check")
        .arg(&path)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("error[duplicate-package]"))
        .stdout(predicate::str::contains("OpenCV_Python"));
}

#[test]
fn test_check_allow_duplicates_downgrades_to_warning() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_manifest(&temp_dir, "numpy\nnumpy\n");

    reqm()
        .args(["check", "--allow-duplicates"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("warning[duplicate-package]"));

    reqm()
        .args(["check", "--allow-duplicates", "--strict"])
        .arg(&path)
        .assert()
        .code(1);
}

#[test]
fn test_check_require_pins() {
    reqm()
        .args(["check", "--require-pins"])
        .arg(fixture())
        .assert()
        .success()
        .stdout(predicate::str::contains("warning[unpinned]"));

    reqm()
        .args(["check", "--require-pins", "--strict", "-"])
        .write_stdin("numpy==1.26.4\ntorch>=2.0,<3\n")
        .assert()
        .success();
}

#[test]
fn test_check_policy_from_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_manifest(&temp_dir, "numpy\n");
    let config = temp_dir.path().join("reqm.toml");
    fs::write(&config, "[check]\nrequire_pins = true\n").unwrap();

    reqm()
        .args(["check", "--strict", "--config"])
        .arg(&config)
        .arg(&path)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("'numpy' has no version constraint"));
}

#[test]
fn test_check_flags_override_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_manifest(&temp_dir, "numpy\nNumPy==1.26.4\n");
    let config = temp_dir.path().join("reqm.toml");
    fs::write(&config, "[check]\nrequire_pins = true\nallow_duplicates = true\n").unwrap();

    reqm()
        .args(["check", "--strict", "--no-require-pins", "--config"])
        .arg(&config)
        .arg(&path)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("no version constraint").not())
        .stdout(predicate::str::contains("warning[duplicate-package]"));

    reqm()
        .args(["check", "--no-require-pins", "--no-allow-duplicates", "--config"])
        .arg(&config)
        .arg(&path)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("error[duplicate-package]"));

    reqm()
        .args(["check", "--no-require-pins", "--require-pins", "--config"])
        .arg(&config)
        .arg("-")
        .write_stdin("numpy\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("warning[unpinned]"));
}

#[test]
fn test_check_rejects_unknown_config_keys() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_manifest(&temp_dir, "numpy\n");
    let config = temp_dir.path().join("reqm.toml");
    fs::write(&config, "[check]\nrequire_pinz = true\n").unwrap();

    reqm()
        .args(["check", "--config"])
        .arg(&config)
        .arg(&path)
        .assert()
        .code(2);
}

#[test]
fn test_check_empty_manifest_warns() {
    reqm()
        .args(["check", "-"])
        .write_stdin("# nothing here\n\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("warning[empty-manifest]"));
}

#[test]
fn test_check_json_output() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_manifest(&temp_dir, "numpy\nnot a package\n");

    let output = reqm().args(["check", "--json"]).arg(&path).output().unwrap();
    assert_eq!(output.status.code(), Some(1));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["clean"], false);
    assert_eq!(json["packages"], 1);
    assert_eq!(json["errors"], 1);
    assert_eq!(json["diagnostics"][0]["line"], 2);
}

#[test]
fn test_check_duplicates_across_includes() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("base.txt"), "numpy\n").unwrap();
    let path = write_manifest(&temp_dir, "-r base.txt\nnumpy\n");

    reqm().arg("check").arg(&path).assert().success();

    reqm()
        .args(["check", "--follow-includes"])
        .arg(&path)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("duplicate-package"));
}

#[test]
fn test_check_include_cycle() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("a.txt"), "-r b.txt\n").unwrap();
    fs::write(temp_dir.path().join("b.txt"), "-r a.txt\n").unwrap();

    reqm()
        .current_dir(&temp_dir)
        .args(["check", "--follow-includes", "a.txt"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("include cycle"));
}
