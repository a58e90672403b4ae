//! End-to-end tests of the `domassist` binary

mod common;

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::WEBHOOK_PATH;

/// Binary with an isolated state database and no config file
fn domassist(dir: &TempDir) -> Command {
    domassist_with_config(dir, &dir.path().join("missing.yaml"))
}

fn domassist_with_config(dir: &TempDir, config: &Path) -> Command {
    let mut cmd = Command::cargo_bin("domassist").expect("binary builds");
    cmd.env("DOMASSIST_STATE_DB", dir.path().join("state.db"))
        .env_remove("DOMASSIST_WEBHOOK_URL")
        .env_remove("DOMASSIST_ENABLE_CONSENT")
        .env_remove("DOMASSIST_GATE_ENABLED")
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(config);
    cmd
}

#[test]
fn test_extract_prints_contact_json() {
    let dir = TempDir::new().unwrap();
    let output = domassist(&dir)
        .args(["extract", "Meine E-Mail: anna@example.com"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let profile: Value = serde_json::from_slice(&output.stdout).expect("stdout is JSON");
    assert_eq!(profile["email"], "anna@example.com");
}

#[test]
fn test_gate_status_disabled_by_default() {
    let dir = TempDir::new().unwrap();
    domassist(&dir)
        .args(["gate", "status", "--path", "/preise"])
        .assert()
        .success()
        .stdout(predicate::str::contains("disabled"));
}

#[test]
fn test_consent_status_without_record() {
    let dir = TempDir::new().unwrap();
    domassist(&dir)
        .args(["consent", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("no consent"));
}

#[test]
fn test_invalid_config_file_fails() {
    let (_dir, config_path) = common::temp_config_file("widget:\n  enable_voice: definitely\n");
    let state = TempDir::new().unwrap();
    domassist_with_config(&state, &config_path)
        .args(["extract", "hallo"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse config"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_send_requires_consent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": "unused"})))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut cmd = domassist(&dir);
    cmd.args([
        "--webhook-url",
        &format!("{}{}", server.uri(), WEBHOOK_PATH),
        "send",
        "Hallo",
    ]);

    let output = tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Datenschutzerklärung"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_send_with_consent_prints_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(WEBHOOK_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"response": "Hallo aus dem Test"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut cmd = domassist(&dir);
    cmd.args([
        "--webhook-url",
        &format!("{}{}", server.uri(), WEBHOOK_PATH),
        "send",
        "Hallo",
        "--accept-consent",
    ]);

    let output = tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Hallo aus dem Test"));

    // Consent was persisted for later runs
    let state = domassist(&dir).args(["consent", "status"]).output().unwrap();
    assert!(String::from_utf8_lossy(&state.stdout).contains("granted"));
}
