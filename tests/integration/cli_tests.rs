//! CLI integration tests
//!
//! These tests run the binary against temporary project trees.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;

fn assetsweep() -> Command {
    let mut cmd = Command::cargo_bin("assetsweep").unwrap();
    cmd.env("NO_COLOR", "1");
    cmd
}

fn utf16_record(text: &str) -> Vec<u8> {
    let units: Vec<u16> = text.encode_utf16().collect();
    let mut out = (units.len() as u32).to_le_bytes().to_vec();
    for unit in units {
        out.extend(unit.to_le_bytes());
    }
    out
}

fn write(root: &Path, relative: &str, contents: &[u8]) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// fx/boom.efk uses fx/boom_particle.png; other/orphan.png is unused
fn sample_project() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let mut effect = b"SKFE".to_vec();
    effect.extend(utf16_record("boom_particle.png"));
    write(dir.path(), "fx/boom.efk", &effect);
    write(dir.path(), "fx/boom_particle.png", b"png");
    write(dir.path(), "other/orphan.png", b"orphan");
    dir
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_help() {
    assetsweep()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--backup-dir"))
        .stdout(predicate::str::contains("--parallel"));
}

#[test]
fn test_version() {
    assetsweep()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_missing_root_fails() {
    assetsweep()
        .args(["--quiet", "/no/such/project/anywhere"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

// ============================================================================
// Reports
// ============================================================================

#[test]
fn test_terminal_report() {
    let project = sample_project();
    assetsweep()
        .arg("--quiet")
        .arg(project.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 1 unused assets"))
        .stdout(predicate::str::contains("orphan.png"))
        .stdout(predicate::str::contains("boom_particle.png").not());
}

#[test]
fn test_show_references() {
    let project = sample_project();
    assetsweep()
        .args(["--quiet", "--show-references"])
        .arg(project.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("fx/boom.efk"))
        .stdout(predicate::str::contains("boom_particle.png"));
}

#[test]
fn test_json_report() {
    let project = sample_project();
    let output = assetsweep()
        .args(["--quiet", "--format", "json"])
        .arg(project.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["unused"][0]["path"], "other/orphan.png");
    assert_eq!(value["statistics"]["containers"]["effect"], 1);
}

#[test]
fn test_json_output_file() {
    let project = sample_project();
    let out = project.path().join("report.json");
    assetsweep()
        .args(["--quiet", "--format", "json", "--output"])
        .arg(&out)
        .arg(project.path())
        .assert()
        .success();

    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(out).unwrap()).unwrap();
    assert_eq!(value["statistics"]["unused"], 1);
}

#[test]
fn test_parallel_flag() {
    let project = sample_project();
    assetsweep()
        .args(["--quiet", "--parallel", "--threads", "2"])
        .arg(project.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("orphan.png"));
}

#[test]
fn test_retain_flag() {
    let project = sample_project();
    assetsweep()
        .args(["--quiet", "--retain", "orphan.png"])
        .arg(project.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No unused assets found!"));
}

#[test]
fn test_ext_flag() {
    let project = sample_project();
    write(project.path(), "other/unused.dds", b"dds");
    assetsweep()
        .args(["--quiet", "--ext", "dds"])
        .arg(project.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("unused.dds"))
        .stdout(predicate::str::contains("orphan.png").not());
}

#[test]
fn test_config_file_in_project() {
    let project = sample_project();
    write(
        project.path(),
        ".assetsweep.yml",
        b"retain_patterns:\n  - \"other/**\"\n",
    );
    assetsweep()
        .arg("--quiet")
        .arg(project.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No unused assets found!"));
}

#[test]
fn test_invalid_config_fails() {
    let project = sample_project();
    let config = project.path().join("bad.toml");
    fs::write(&config, "exclude = [\"[unclosed\"]\n").unwrap();
    assetsweep()
        .args(["--quiet", "--config"])
        .arg(&config)
        .arg(project.path())
        .assert()
        .failure();
}

// ============================================================================
// Deletion
// ============================================================================

#[test]
fn test_delete_dry_run_keeps_files() {
    let project = sample_project();
    assetsweep()
        .args(["--quiet", "--delete", "--dry-run"])
        .arg(project.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Dry run - would delete"));

    assert!(project.path().join("other/orphan.png").exists());
}
