//! End-to-end tests for the `pagerduty` binary.
//!
//! Each test runs the compiled binary against a local API stand-in with an
//! isolated XDG config directory.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use serde_json::{Value, json};
use std::process::Command;

mod utils;
use utils::{pagerduty_cmd, set_sequential_responder, start_mitm};

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

#[tokio::test]
async fn get_prints_the_response_body() {
    let (addr, handler, shutdown) = start_mitm().await.expect("start server");
    let seen = set_sequential_responder(
        &handler,
        vec![(200, json!({"user": {"id": "PXPGF42", "name": "Earline Greenholt"}}).to_string())],
    );
    let home = tempfile::tempdir().expect("tempdir");

    let output = tokio::task::spawn_blocking(move || {
        pagerduty_cmd(addr, home.path())
            .args(["get", "/users/PXPGF42", "-q", "include[]=contact_methods"])
            .output()
            .expect("run binary")
    })
    .await
    .expect("spawn blocking");

    assert!(output.status.success(), "{output:?}");
    assert_eq!(
        stdout_json(&output),
        json!({"user": {"id": "PXPGF42", "name": "Earline Greenholt"}})
    );
    let seen = seen.lock().expect("lock seen");
    let req = seen.first().expect("request");
    assert_eq!(req.path, "/users/PXPGF42");
    assert_eq!(req.query, "include%5B%5D=contact_methods");
    assert_eq!(req.header("authorization"), Some("Token token=dummy"));
    assert_eq!(
        req.header("accept"),
        Some("application/vnd.pagerduty+json;version=2")
    );
    drop(seen);
    shutdown.shutdown().await;
}

#[tokio::test]
async fn list_merges_offset_pages() {
    let (addr, handler, shutdown) = start_mitm().await.expect("start server");
    let seen = set_sequential_responder(
        &handler,
        vec![
            (
                200,
                json!({"users": [{"id": "U1"}, {"id": "U2"}], "offset": 0, "limit": 2, "more": true})
                    .to_string(),
            ),
            (
                200,
                json!({"users": [{"id": "U3"}], "offset": 2, "limit": 2, "more": false}).to_string(),
            ),
        ],
    );
    let home = tempfile::tempdir().expect("tempdir");

    let output = tokio::task::spawn_blocking(move || {
        pagerduty_cmd(addr, home.path())
            .args(["list", "/users"])
            .output()
            .expect("run binary")
    })
    .await
    .expect("spawn blocking");

    assert!(output.status.success(), "{output:?}");
    assert_eq!(
        stdout_json(&output),
        json!([{"id": "U1"}, {"id": "U2"}, {"id": "U3"}])
    );
    let queries: Vec<_> = seen
        .lock()
        .expect("lock seen")
        .iter()
        .map(|r| r.query.clone())
        .collect();
    assert_eq!(queries, ["offset=0", "offset=2"]);
    shutdown.shutdown().await;
}

#[tokio::test]
async fn list_with_token_paging_sends_headers() {
    let (addr, handler, shutdown) = start_mitm().await.expect("start server");
    let seen = set_sequential_responder(
        &handler,
        vec![
            (
                200,
                json!({"triggers": [{"id": "T1"}], "next_page_token": "next"}).to_string(),
            ),
            (
                200,
                json!({"triggers": [{"id": "T2"}], "next_page_token": ""}).to_string(),
            ),
        ],
    );
    let home = tempfile::tempdir().expect("tempdir");

    let output = tokio::task::spawn_blocking(move || {
        pagerduty_cmd(addr, home.path())
            .args([
                "list",
                "/incident_workflows/triggers",
                "--token-paging",
                "--header",
                "x-early-access=incident-workflows-early-access",
            ])
            .output()
            .expect("run binary")
    })
    .await
    .expect("spawn blocking");

    assert!(output.status.success(), "{output:?}");
    assert_eq!(stdout_json(&output), json!([{"id": "T1"}, {"id": "T2"}]));
    let seen = seen.lock().expect("lock seen");
    assert_eq!(seen.len(), 2);
    assert_eq!(seen.get(1).expect("second").query, "page_token=next");
    assert!(
        seen.iter()
            .all(|r| r.header("x-early-access") == Some("incident-workflows-early-access"))
    );
    drop(seen);
    shutdown.shutdown().await;
}

#[tokio::test]
async fn validate_reports_rejected_token() {
    let (addr, handler, shutdown) = start_mitm().await.expect("start server");
    set_sequential_responder(
        &handler,
        vec![(
            401,
            json!({"error": {"message": "Authentication required", "code": 2006}}).to_string(),
        )],
    );
    let home = tempfile::tempdir().expect("tempdir");

    tokio::task::spawn_blocking(move || {
        pagerduty_cmd(addr, home.path())
            .arg("validate")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Authentication required (code 2006)"));
    })
    .await
    .expect("spawn blocking");

    shutdown.shutdown().await;
}

#[tokio::test]
async fn login_then_validate_uses_stored_profile() {
    let (addr, handler, shutdown) = start_mitm().await.expect("start server");
    let seen = set_sequential_responder(
        &handler,
        vec![(200, json!({"abilities": ["teams", "sso"]}).to_string())],
    );
    let home = tempfile::tempdir().expect("tempdir");
    let config_home = home.path().to_path_buf();

    let output = tokio::task::spawn_blocking(move || {
        pagerduty_cmd(addr, &config_home)
            .env_remove("PAGERDUTY_TOKEN")
            .args(["login", "--profile", "ops", "stored-token"])
            .assert()
            .success();
        pagerduty_cmd(addr, &config_home)
            .env_remove("PAGERDUTY_TOKEN")
            .args(["validate", "--profile", "ops"])
            .output()
            .expect("run binary")
    })
    .await
    .expect("spawn blocking");

    assert!(output.status.success(), "{output:?}");
    assert_eq!(
        stdout_json(&output),
        json!({"valid": true, "abilities": ["teams", "sso"]})
    );
    let stored = std::fs::read_to_string(home.path().join("pagerduty/credentials.toml"))
        .expect("credentials written");
    assert!(stored.contains("[ops]"), "{stored}");
    let seen = seen.lock().expect("lock seen");
    let req = seen.first().expect("request");
    assert_eq!(req.path, "/abilities");
    assert_eq!(req.header("authorization"), Some("Token token=stored-token"));
    drop(seen);
    shutdown.shutdown().await;
}

#[test]
fn missing_token_reports_configuration_error() {
    let home = tempfile::tempdir().expect("tempdir");
    let mut cmd = Command::cargo_bin("pagerduty").expect("binary");
    cmd.env_remove("PAGERDUTY_TOKEN")
        .env_remove("PAGERDUTY_PROFILE")
        .env("XDG_CONFIG_HOME", home.path())
        .env("PAGERDUTY_BASE_URL", "http://127.0.0.1:9")
        .arg("validate");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("configuration error"));
}

#[test]
fn invalid_config_file_reports_configuration_error() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "not = [valid").expect("write broken config");

    let mut cmd = Command::cargo_bin("pagerduty").expect("binary");
    cmd.env("XDG_CONFIG_HOME", dir.path())
        .arg("--config")
        .arg(&path)
        .arg("validate");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("configuration error"));
}
