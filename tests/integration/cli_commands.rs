#![allow(missing_docs)]

use std::fs;
use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use serde_json::Value;
use tempfile::TempDir;

const MANIFEST_DIR: &str = env!("CARGO_MANIFEST_DIR");

fn fixture(name: &str) -> String {
    Path::new(MANIFEST_DIR)
        .join("tests/fixtures")
        .join(name)
        .display()
        .to_string()
}

#[test]
fn run_writes_command_log() {
    let dir = TempDir::new().expect("tempdir");
    let db = dir.path().join("db.txt");
    let log = dir.path().join("log.txt");
    cargo_bin_cmd!("geodex")
        .current_dir(MANIFEST_DIR)
        .env_remove("GEODEX_CONFIG")
        .args(["--theme", "plain", "run"])
        .arg(&db)
        .arg(fixture("highland_va.script"))
        .arg(&log)
        .assert()
        .success();

    let text = fs::read_to_string(&log).expect("log written");
    assert!(text.contains("Command 1:\tworld"));
    assert!(text.contains("Imported features by name: 10"));
    assert!(text.contains("Terminating execution of commands."));
    let stored = fs::read_to_string(&db).expect("db written");
    assert_eq!(stored.lines().count(), 10);
    assert!(stored.starts_with("1498397|Monterey|"));
}

#[test]
fn run_reports_json_summary() {
    let dir = TempDir::new().expect("tempdir");
    let output = cargo_bin_cmd!("geodex")
        .current_dir(MANIFEST_DIR)
        .env_remove("GEODEX_CONFIG")
        .args(["--format", "json", "--pool-capacity", "4", "run"])
        .arg(dir.path().join("db.txt"))
        .arg(fixture("highland_va.script"))
        .arg(dir.path().join("log.txt"))
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: Value = serde_json::from_slice(&output).expect("json output");
    assert_eq!(json["summary"]["commands"], 11);
    assert_eq!(json["summary"]["quit"], true);
    assert_eq!(json["stats"]["pool_capacity"], 4);
    assert_eq!(json["stats"]["pool_len"], 4);
    assert_eq!(json["stats"]["names"]["elements"], 9);
}

#[test]
fn import_prints_index_statistics() {
    let dir = TempDir::new().expect("tempdir");
    let output = cargo_bin_cmd!("geodex")
        .env_remove("GEODEX_CONFIG")
        .args(["--format", "json", "--bucket-capacity", "2", "import"])
        .arg(dir.path().join("db.txt"))
        .arg(fixture("highland_va.txt"))
        .args(["--world", "0800000W", "0790000W", "380000N", "390000N"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: Value = serde_json::from_slice(&output).expect("json output");
    assert_eq!(json["summary"]["records"], 10);
    assert_eq!(json["summary"]["out_of_world"], 1);
    assert_eq!(json["stats"]["spatial"]["points"], 7);
    assert_eq!(json["stats"]["spatial"]["bucket_capacity"], 2);
}

#[test]
fn config_file_sets_index_options() {
    let dir = TempDir::new().expect("tempdir");
    let config = dir.path().join("config.toml");
    fs::write(&config, "[index]\nhash_slots = 4\n").expect("write config");
    let output = cargo_bin_cmd!("geodex")
        .args(["--format", "json", "--config"])
        .arg(&config)
        .arg("import")
        .arg(dir.path().join("db.txt"))
        .arg(fixture("highland_va.txt"))
        .args(["--world", "0800000W", "0790000W", "380000N", "390000N"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: Value = serde_json::from_slice(&output).expect("json output");
    assert!(json["stats"]["names"]["rehashes"].as_u64().expect("rehashes") >= 1);
}

#[test]
fn bad_input_exits_with_error() {
    let dir = TempDir::new().expect("tempdir");
    cargo_bin_cmd!("geodex")
        .env_remove("GEODEX_CONFIG")
        .arg("import")
        .arg(dir.path().join("db.txt"))
        .arg(fixture("highland_va.txt"))
        .args(["--world", "0790000W", "0800000W", "380000N", "390000N"])
        .assert()
        .failure()
        .code(1);

    cargo_bin_cmd!("geodex")
        .env_remove("GEODEX_CONFIG")
        .args(["--pool-capacity", "0", "run"])
        .arg(dir.path().join("db.txt"))
        .arg(fixture("highland_va.script"))
        .arg(dir.path().join("log.txt"))
        .assert()
        .failure()
        .code(1);
}
