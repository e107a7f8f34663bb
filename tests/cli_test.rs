//! Integration tests for the flowgraph binary.
// The cargo_bin function is marked deprecated in favor of cargo_bin! macro,
// but both work correctly. Suppressing until assert_cmd stabilizes the new API.
#![allow(deprecated)]

use assert_cmd::cargo::cargo_bin;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn setup_flow(definition: &str) -> (TempDir, PathBuf) {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("flow.yml");
    fs::write(&path, definition).unwrap();
    (temp, path)
}

const ETL: &str = r#"
name: etl
version: "1"
tasks:
  - name: extract
  - name: transform
    params: [data]
    keywords: { data: extract }
  - name: load
    upstream: [transform]
"#;

const CYCLIC: &str = r#"
name: loop
tasks:
  - name: a
    upstream: [b]
  - name: b
    upstream: [a]
"#;

#[test]
fn cli_shows_help() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin("flowgraph"));
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("validate"))
        .stdout(predicate::str::contains("serialize"));
    Ok(())
}

#[test]
fn cli_shows_version() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin("flowgraph"));
    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    Ok(())
}

#[test]
fn cli_requires_subcommand() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin("flowgraph"));
    cmd.assert().failure();
    Ok(())
}

#[test]
fn cli_validate_reports_counts() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp, path) = setup_flow(ETL);
    let mut cmd = Command::new(cargo_bin("flowgraph"));
    cmd.arg("validate").arg(&path);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("3 tasks, 2 edges"));
    Ok(())
}

#[test]
fn cli_validate_rejects_cycles() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp, path) = setup_flow(CYCLIC);
    let mut cmd = Command::new(cargo_bin("flowgraph"));
    cmd.arg("validate").arg(&path);
    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("acyclic"));
    Ok(())
}

#[test]
fn cli_missing_file_fails() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let mut cmd = Command::new(cargo_bin("flowgraph"));
    cmd.arg("validate").arg(temp.path().join("nope.yml"));
    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("not found"));
    Ok(())
}

#[test]
fn cli_order_prints_tasks() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp, path) = setup_flow(ETL);
    let mut cmd = Command::new(cargo_bin("flowgraph"));
    cmd.arg("order").arg(&path);
    cmd.assert()
        .success()
        .stdout(predicate::eq("extract\ntransform\nload\n"));
    Ok(())
}

#[test]
fn cli_order_from_root() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp, path) = setup_flow(ETL);
    let mut cmd = Command::new(cargo_bin("flowgraph"));
    cmd.arg("order").arg(&path).args(["--root", "transform"]);
    cmd.assert()
        .success()
        .stdout(predicate::eq("transform\nload\n"));
    Ok(())
}

#[test]
fn cli_inspect_shows_roots_and_terminals() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp, path) = setup_flow(ETL);
    let mut cmd = Command::new(cargo_bin("flowgraph"));
    cmd.arg("inspect").arg(&path);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Roots:        extract"))
        .stdout(predicate::str::contains("Terminals:    load"))
        .stdout(predicate::str::contains("Graph digest:"));
    Ok(())
}

#[test]
fn cli_serialize_is_stable() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp, path) = setup_flow(ETL);

    let first = Command::new(cargo_bin("flowgraph"))
        .arg("serialize")
        .arg(&path)
        .output()?;
    let second = Command::new(cargo_bin("flowgraph"))
        .arg("serialize")
        .arg(&path)
        .output()?;

    assert!(first.status.success());
    assert_eq!(first.stdout, second.stdout);

    let json: serde_json::Value = serde_json::from_slice(&first.stdout)?;
    assert_eq!(json["name"], "etl");
    assert_eq!(json["tasks"].as_array().map(Vec::len), Some(3));
    Ok(())
}

#[test]
fn cli_serialize_reads_seed_from_env() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp, path) = setup_flow(ETL);

    let flag = Command::new(cargo_bin("flowgraph"))
        .args(["serialize", "--compact", "--seed", "abc"])
        .arg(&path)
        .output()?;
    let env = Command::new(cargo_bin("flowgraph"))
        .args(["serialize", "--compact"])
        .arg(&path)
        .env("FLOWGRAPH_SEED", "abc")
        .output()?;

    assert!(flag.status.success());
    assert_eq!(flag.stdout, env.stdout);
    Ok(())
}

#[test]
fn cli_debug_logs_to_stderr() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp, path) = setup_flow(ETL);
    let mut cmd = Command::new(cargo_bin("flowgraph"));
    cmd.args(["--debug", "order"]).arg(&path);
    cmd.assert()
        .success()
        .stdout(predicate::eq("extract\ntransform\nload\n"))
        .stderr(predicate::str::contains("DEBUG"));
    Ok(())
}
