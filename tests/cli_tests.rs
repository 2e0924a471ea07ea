//! End-to-end tests of the `bta` binary that need no network access

use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Run `bta` with an isolated configuration directory
fn bta(config_home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_bta"))
        .args(args)
        .env("XDG_CONFIG_HOME", config_home)
        .env("HOME", config_home)
        .env("RUST_LOG", "off")
        .env_remove("BTA_REGION")
        .env_remove("BTA_PRICE_DATA_DIR")
        .env_remove("BTA_READ_PERCENTAGE")
        .env_remove("AZURE_STORAGE_ACCOUNT")
        .env_remove("AZURE_STORAGE_CONNECTION_STRING")
        .env_remove("AZURE_STORAGE_CONTAINER")
        .output()
        .expect("failed to run bta")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    assert!(
        output.status.success(),
        "bta failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout is not JSON")
}

#[test]
fn test_version() {
    let home = TempDir::new().unwrap();
    let output = bta(home.path(), &["version"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_local_folder_json_report() {
    let home = TempDir::new().unwrap();
    let data = TempDir::new().unwrap();
    std::fs::write(data.path().join("large.bin"), vec![1u8; 2048]).unwrap();
    std::fs::write(data.path().join("tiny.txt"), b"hi").unwrap();

    let folder = data.path().to_string_lossy().to_string();
    let output = bta(
        home.path(),
        &["local", &folder, "--size", "1KB", "--days", "30", "--format", "json"],
    );
    let report = stdout_json(&output);

    assert_eq!(report["region"], "EastUS2");
    assert_eq!(report["summary"]["all"]["Hot"]["count"], 2);
    assert_eq!(report["summary"]["all"]["Hot"]["total_size_bytes"], 2050);
    assert_eq!(report["summary"]["matching"]["Hot"]["count"], 1);
    assert_eq!(report["uploads"].as_array().unwrap().len(), 3);
    assert!(report["incomplete"].as_array().unwrap().is_empty());
}

#[test]
fn test_local_missing_folder_is_reported_incomplete() {
    let home = TempDir::new().unwrap();
    let missing = home.path().join("does-not-exist");
    let missing = missing.to_string_lossy().to_string();

    let output = bta(home.path(), &["local", &missing, "--format", "json"]);
    let report = stdout_json(&output);
    assert_eq!(report["incomplete"].as_array().unwrap().len(), 1);
    assert_eq!(report["summary"]["all"]["Hot"]["count"], 0);
}

#[test]
fn test_regions_lists_builtin_region() {
    let home = TempDir::new().unwrap();
    let output = bta(home.path(), &["regions", "--format", "json"]);
    let regions = stdout_json(&output);
    let regions = regions.as_array().unwrap();
    assert!(regions
        .iter()
        .any(|r| r["region"] == "eastus2" && r["default"] == true));
}

#[test]
fn test_unknown_region_fails() {
    let home = TempDir::new().unwrap();
    let data = TempDir::new().unwrap();
    let folder = data.path().to_string_lossy().to_string();

    let output = bta(home.path(), &["local", &folder, "--region", "Atlantis"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Atlantis"));
}

#[test]
fn test_config_set_then_show() {
    let home = TempDir::new().unwrap();

    let output = bta(home.path(), &["config", "set", "days", "120", "--no-color"]);
    assert!(output.status.success());
    assert!(home.path().join("bta").join("bta.conf").exists());

    let entries = stdout_json(&bta(home.path(), &["config", "show", "--format", "json"]));
    let days = entries
        .as_array()
        .unwrap()
        .iter()
        .find(|e| e["key"] == "days")
        .unwrap();
    assert_eq!(days["value"], "120");
}

#[test]
fn test_analyze_without_account_fails_cleanly() {
    let home = TempDir::new().unwrap();
    let output = bta(home.path(), &["analyze", "--container", "logs"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("No storage account configured"));
}
