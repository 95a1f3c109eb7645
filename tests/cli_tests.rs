//! Integration tests for the suthing command line
#![allow(deprecated)] // suppress assert_cmd::Command::cargo_bin deprecation in tests

use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_convert_json_to_yaml() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.json");
    let output = dir.path().join("out.yaml");
    fs::write(&input, r#"{"name": "suthing", "tags": ["a", "b"]}"#).unwrap();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("suthing");
    cmd.arg("convert").arg(&input).arg(&output);
    cmd.assert().success();

    let yaml = fs::read_to_string(&output).unwrap();
    assert!(yaml.contains("name: suthing"));
    let back: serde_json::Value = serde_yaml_ng::from_str(&yaml).unwrap();
    assert_eq!(back["tags"][1], "b");
}

#[test]
fn test_convert_missing_input_fails() {
    let dir = TempDir::new().unwrap();
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("suthing");
    cmd.arg("convert")
        .arg(dir.path().join("absent.json"))
        .arg(dir.path().join("out.json"));

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load"));
}

#[test]
fn test_equals_identical_files() {
    let dir = TempDir::new().unwrap();
    let a = dir.path().join("a.json");
    let b = dir.path().join("b.yaml");
    fs::write(&a, r#"{"x": [1, 2], "y": {"z": "w"}}"#).unwrap();
    fs::write(&b, "y:\n  z: w\nx:\n  - 1\n  - 2\n").unwrap();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("suthing");
    cmd.arg("equals").arg(&a).arg(&b);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("equal"));
}

#[test]
fn test_equals_reports_differences() {
    let dir = TempDir::new().unwrap();
    let a = dir.path().join("a.json");
    let b = dir.path().join("b.json");
    fs::write(&a, r#"{"x": [1, 2], "y": 1}"#).unwrap();
    fs::write(&b, r#"{"x": [1, 3], "y": 1}"#).unwrap();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("suthing");
    cmd.arg("equals").arg(&a).arg(&b);
    cmd.assert()
        .code(1)
        .stdout(predicate::str::contains("$.x[1]"));
}

#[test]
fn test_connection_from_url() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("suthing");
    cmd.arg("connection").arg("http://localhost:8529");

    let output = cmd.output().unwrap();
    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed["connection_type"], "arango");
    assert_eq!(parsed["hostname"], "localhost");
    assert_eq!(parsed["port"], "8529");
}

#[test]
fn test_connection_from_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("db.yaml");
    fs::write(
        &path,
        "db_type: neo4j\nhostname: graph\nport: 7687\ncred_name: neo\n",
    )
    .unwrap();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("suthing");
    cmd.arg("connection").arg(&path);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"connection_type\": \"neo4j\""))
        .stdout(predicate::str::contains("\"url\": \"http://graph:7687\""))
        .stdout(predicate::str::contains("\"username\": \"neo\""));
}

#[test]
fn test_connection_without_kind_fails() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("suthing");
    cmd.arg("connection").arg("http://localhost");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("db_type"));
}

#[test]
fn test_time_text_summary() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("suthing");
    cmd.arg("time").arg("-n").arg("2").arg("--").arg("true");
    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Call Timing Summary"))
        .stderr(predicate::str::contains("time(program=true)"));
}

#[test]
fn test_time_json_reports() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("suthing");
    cmd.args(["time", "-n", "3", "--format", "json", "--", "echo", "hi"]);

    let output = cmd.output().unwrap();
    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();

    let runs = parsed["runs"].as_array().unwrap();
    assert_eq!(runs.len(), 3);
    for run in runs {
        assert_eq!(run["succeeded"], true);
        assert!(run["elapsed"].as_f64().unwrap() >= 0.0);
    }
    assert_eq!(parsed["summary"][0]["key"], "time(program=echo)");
    assert_eq!(parsed["summary"][0]["calls"], 3);
}

#[test]
fn test_time_propagates_exit_code() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("suthing");
    cmd.args(["time", "--", "false"]);
    cmd.assert().code(1);
}

#[test]
fn test_time_unknown_program() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("suthing");
    cmd.args(["time", "--format", "json", "--", "suthing-no-such-program-xyz"]);

    let output = cmd.output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed["runs"][0]["succeeded"], false);
    assert!(parsed["runs"][0]["failure"]
        .as_str()
        .unwrap()
        .contains("Failed to spawn"));
}
