use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::tempdir;

#[test]
fn test_config_path_command() {
    let dir = tempdir().unwrap();

    cargo_bin_cmd!("coreconnect")
        .env("CORECONNECT_HOME", dir.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_init_creates_file() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("config.toml");

    cargo_bin_cmd!("coreconnect")
        .env("CORECONNECT_HOME", dir.path())
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created config at"));

    let contents = fs::read_to_string(&config_path).unwrap();
    assert!(contents.contains("request_timeout_secs = 30"));
    assert!(contents.contains("# api_url ="));
}

#[test]
fn test_config_init_fails_if_exists() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("config.toml"), "# existing config").unwrap();

    cargo_bin_cmd!("coreconnect")
        .env("CORECONNECT_HOME", dir.path())
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_set_api_url_writes_config() {
    let dir = tempdir().unwrap();

    cargo_bin_cmd!("coreconnect")
        .env("CORECONNECT_HOME", dir.path())
        .args(["config", "set-api-url", "http://localhost:5000/"])
        .assert()
        .success()
        .stdout(predicate::str::contains("API URL set to http://localhost:5000"));

    let contents = fs::read_to_string(dir.path().join("config.toml")).unwrap();
    assert!(contents.contains("api_url = \"http://localhost:5000\""));
}

#[test]
fn test_set_api_url_rejects_garbage() {
    let dir = tempdir().unwrap();

    cargo_bin_cmd!("coreconnect")
        .env("CORECONNECT_HOME", dir.path())
        .args(["config", "set-api-url", "not a url"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid API base URL"));
}
