use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("comex-chat").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage: comex-chat <COMMAND>"))
        .stdout(predicate::str::contains("chat"))
        .stdout(predicate::str::contains("health"))
        .stdout(predicate::str::contains("--version"));
}

#[test]
fn test_cli_chat_help() {
    let mut cmd = Command::cargo_bin("comex-chat").unwrap();
    cmd.arg("chat")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage: comex-chat chat"))
        .stdout(predicate::str::contains("--endpoint <ENDPOINT>"))
        .stdout(predicate::str::contains("--user-id <USER_ID>"))
        .stdout(predicate::str::contains("--timeout <TIMEOUT>"))
        .stdout(predicate::str::contains("--log-file <LOG_FILE>"))
        .stdout(predicate::str::contains("http://127.0.0.1:8000/chat"));
}

#[test]
fn test_cli_no_command() {
    let mut cmd = Command::cargo_bin("comex-chat").unwrap();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage: comex-chat <COMMAND>"));
}

#[test]
fn test_cli_rejects_zero_timeout() {
    let mut cmd = Command::cargo_bin("comex-chat").unwrap();
    cmd.args(["health", "--timeout", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("timeout must be at least one second"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cli_health_reports_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "healthy" })))
        .mount(&server)
        .await;

    let mut cmd = Command::cargo_bin("comex-chat").unwrap();
    cmd.env_remove("CHAT_ENDPOINT")
        .args(["health", "--endpoint", &format!("{}/chat", server.uri())])
        .assert()
        .success()
        .stdout(predicate::str::contains("healthy"));
}

#[test]
fn test_cli_health_unreachable_backend() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let mut cmd = Command::cargo_bin("comex-chat").unwrap();
    cmd.args(["health", "--endpoint", &format!("http://{}/chat", addr)])
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not reachable"));
}

#[test]
fn test_cli_health_invalid_endpoint() {
    let mut cmd = Command::cargo_bin("comex-chat").unwrap();
    cmd.args(["health", "--endpoint", "not a url"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid chat endpoint"));
}
