//! Integration tests for the `resttc` CLI binary.
//!
//! Argument parsing, help output, completions, local config and credential
//! commands, plus one full round trip against a wiremock server.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use resttc_config::CredentialStore;

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `resttc` binary with env isolation.
///
/// Clears all `RESTTC_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn resttc_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("resttc");
    cmd.env("HOME", "/tmp/resttc-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/resttc-cli-test-nonexistent")
        .env("XDG_CACHE_HOME", "/tmp/resttc-cli-test-nonexistent")
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("RESTTC_ALIAS")
        .env_remove("RESTTC_CONFIG")
        .env_remove("RESTTC_CREDENTIAL_DIR")
        .env_remove("RESTTC_CACHE_DIR")
        .env_remove("RESTTC_OUTPUT")
        .env_remove("RESTTC_INSECURE")
        .env_remove("RESTTC_TIMEOUT");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn write_config(dir: &Path, body: &str) -> std::path::PathBuf {
    let path = dir.join("aliases.toml");
    std::fs::write(&path, body).unwrap();
    path
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = resttc_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    resttc_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("Teamcenter")
            .and(predicate::str::contains("contents"))
            .and(predicate::str::contains("backlink"))
            .and(predicate::str::contains("query")),
    );
}

#[test]
fn test_version_flag() {
    resttc_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("resttc"));
}

#[test]
fn test_completions_bash() {
    resttc_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_query_entry_needs_equals() {
    let output = resttc_cmd()
        .args(["query", "Item Revision...", "-e", "Name"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("ENTRY=VALUE"));
}

// ── Local commands ──────────────────────────────────────────────────

#[test]
fn test_aliases_as_json() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        dir.path(),
        r#"
default_alias = "DEV"

[aliases.DEV]
host = "plm-dev"
port = 8080

[aliases.PROD]
scheme = "https"
host = "plm"
port = 443
"#,
    );

    let output = resttc_cmd()
        .arg("--config")
        .arg(&config)
        .arg("--credential-dir")
        .arg(dir.path())
        .args(["aliases", "-o", "json"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let aliases: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(aliases[0]["name"], "DEV");
    assert_eq!(aliases[0]["url"], "http://plm-dev:8080");
    assert_eq!(aliases[0]["default"], true);
    assert_eq!(aliases[0]["credentials"], false);
    assert_eq!(aliases[1]["name"], "PROD");
    assert_eq!(aliases[1]["default"], false);
}

#[test]
fn test_missing_explicit_config_is_reported() {
    let output = resttc_cmd()
        .args(["--config", "/tmp/resttc-cli-test-nonexistent/none.toml", "aliases"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(combined_output(&output).contains("Configuration file not found"));
}

#[test]
fn test_credential_create_from_stdin() {
    let dir = tempfile::tempdir().unwrap();

    resttc_cmd()
        .arg("--credential-dir")
        .arg(dir.path())
        .args(["--alias", "LAB", "credential", "create"])
        .args(["--username", "ed", "--password-stdin", "--expiry", "8"])
        .write_stdin("s3cret\n")
        .assert()
        .success();

    let text = std::fs::read_to_string(dir.path().join("LAB_CredFile.ini")).unwrap();
    assert!(text.contains("Username=ed\n"));
    assert!(text.contains("Expiry=8\n"));
    assert!(!text.contains("s3cret"));
    assert!(dir.path().join("LAB_key.key").is_file());

    let creds = CredentialStore::new(dir.path()).load("LAB").unwrap();
    assert_eq!(creds.username(), "ed");
}

#[test]
fn test_empty_password_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let output = resttc_cmd()
        .arg("--credential-dir")
        .arg(dir.path())
        .args(["credential", "create", "-u", "ed", "--password-stdin"])
        .write_stdin("\n")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(!dir.path().join("DEFAULT_key.key").exists());
}

#[test]
fn test_missing_credentials_exit_code() {
    let dir = tempfile::tempdir().unwrap();
    let output = resttc_cmd()
        .arg("--credential-dir")
        .arg(dir.path())
        .args(["--alias", "NOWHERE", "url", "REQ-010_A"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
    let text = combined_output(&output);
    assert!(text.contains("NOWHERE"), "{text}");
    assert!(text.contains("credential create"), "{text}");
}

#[test]
fn test_invalid_identifier_exit_code() {
    let dir = tempfile::tempdir().unwrap();
    CredentialStore::new(dir.path())
        .create("DEFAULT", "ed", &SecretString::from("pw".to_string()), None)
        .unwrap();

    let output = resttc_cmd()
        .arg("--credential-dir")
        .arg(dir.path())
        .args(["url", "NOREVISION"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("ITEMID_REV"));
}

// ── Server round trip ───────────────────────────────────────────────

fn endpoint(operation: &str) -> String {
    format!("/tc/JsonRestServices/{operation}")
}

async fn mount_session(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path(endpoint("Core-2011-06-Session/login")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "serverInfo": {} })))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path(endpoint("Core-2006-03-Session/logout")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_summary_logs_in_and_out() {
    let server = MockServer::start().await;
    mount_session(&server).await;
    Mock::given(method("POST"))
        .and(path(endpoint("Core-2007-01-DataManagement/getItemFromId")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "output": [{ "item": { "uid": "ri" }, "itemRevOutput": { "uid": "rr" } }],
            "ServiceData": { "modelObjects": { "rr": {
                "uid": "rr",
                "type": "Requirement Revision",
                "props": { "object_string": { "uiValues": ["REQ-010/A;1-Introduction"] } }
            } } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let port = server.address().port();
    let config = write_config(
        dir.path(),
        &format!(
            "[aliases.FIXTURE]\nhost = \"127.0.0.1\"\nport = {port}\nfms_port = {port}\n"
        ),
    );
    CredentialStore::new(dir.path())
        .create("FIXTURE", "ed", &SecretString::from("s3cret".to_string()), None)
        .unwrap();

    let mut cmd = resttc_cmd();
    cmd.arg("--config")
        .arg(&config)
        .arg("--credential-dir")
        .arg(dir.path())
        .arg("--cache-dir")
        .arg(dir.path())
        .args(["--alias", "FIXTURE", "-o", "plain", "summary", "SPEC-001_A", "REQ-010_A"]);
    let output = tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap();

    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        "REQ-010/A;1-Introduction"
    );
}
