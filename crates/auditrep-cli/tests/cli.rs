//! Integration tests for the auditrep binary.

use assert_cmd::Command;
use predicates::str::contains;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const RESPONSE: &str = "\
| AUDIT TITLE | Customer Satisfaction Audit |
| OK | Conforming |
| OFI | Opportunity for improvement |
| NC | Nonconformity |
| NA | Not applicable |
| PROCESS | SIGHTED EVIDENCE | OK | OFI | NC | NA | ADDITIONAL COMMENTS |
| Customer Feedback | feedback.xlsx | | | | | |
| NONCONFORMANCES | Nil |
| OPPORTUNITIES FOR IMPROVEMENTS | Nil |
## AUDIT REPORT FINAL COMMENTS
Customer scores need attention.
Internal Auditor
";

fn cmd() -> Command {
    Command::cargo_bin("auditrep").unwrap()
}

fn write_response(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("response.md");
    fs::write(&path, RESPONSE).unwrap();
    path
}

fn write_manifest(dir: &TempDir) -> PathBuf {
    fs::write(dir.path().join("feedback.png"), [0x89u8, 0x50, 0x4e, 0x47]).unwrap();
    let path = dir.path().join("evidence.json");
    fs::write(
        &path,
        r#"[{"file_name": "feedback.xlsx", "images": [{"path": "feedback.png", "score": "15/25"}]}]"#,
    )
    .unwrap();
    path
}

#[test]
fn parse_prints_section_model() {
    let dir = TempDir::new().unwrap();
    let response = write_response(&dir);

    let output = cmd().arg("parse").arg("--response").arg(&response).output().unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["header"]["AUDIT TITLE"], "Customer Satisfaction Audit");
    assert_eq!(json["body"][0]["process"], "Customer Feedback");
    assert_eq!(json["legend"]["OFI"], "Opportunity for improvement");
}

#[test]
fn assemble_promotes_low_score() {
    let dir = TempDir::new().unwrap();
    let response = write_response(&dir);
    let manifest = write_manifest(&dir);

    let output = cmd()
        .arg("assemble")
        .arg("--response")
        .arg(&response)
        .arg("--evidence")
        .arg(&manifest)
        .arg("--with-actions")
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["rows"][0]["classification"], "NC");
    assert_eq!(json["rows"][0]["evidence"]["file_name"], "feedback.xlsx");
    assert_eq!(json["rows"][0]["evidence"]["tier"], "exact");
    let nc = json["footer"]["NONCONFORMANCES"].as_str().unwrap();
    assert!(nc.starts_with("Customer Feedback: Low score of 15/25"));
    assert_eq!(json["corrective_action"]["issue_type"], "Nonconformance");
}

#[test]
fn assemble_yaml_with_config() {
    let dir = TempDir::new().unwrap();
    let response = write_response(&dir);
    let config = dir.path().join("assembly.yaml");
    fs::write(&config, "footer:\n  placeholder: \"None\"\n").unwrap();

    cmd()
        .args(["--format", "yaml", "assemble", "--auditor", "Jane Smith", "--config"])
        .arg(&config)
        .arg("--response")
        .arg(&response)
        .assert()
        .success()
        .stdout(contains("processes:"))
        .stdout(contains("Customer Feedback"));
}

#[test]
fn classify_boundaries() {
    cmd()
        .args(["classify", "20/25"])
        .assert()
        .success()
        .stdout(contains("\"category\": \"OK\""));

    cmd()
        .args(["classify", "19/25"])
        .assert()
        .success()
        .stdout(contains("\"category\": \"OFI\""))
        .stdout(contains("8DB3E2"));

    cmd()
        .args(["classify", "5"])
        .assert()
        .success()
        .stdout(contains("\"category\": \"NC\""))
        .stdout(contains("5/10"));
}

#[test]
fn missing_response_fails() {
    cmd()
        .args(["parse", "--response", "/nonexistent/response.md"])
        .assert()
        .failure()
        .stderr(contains("Failed to read response"));
}

#[test]
fn invalid_config_fails() {
    let dir = TempDir::new().unwrap();
    let response = write_response(&dir);
    let config = dir.path().join("assembly.json");
    fs::write(&config, r#"{"thresholds": {"ok": 50, "ofi": 90}}"#).unwrap();

    cmd()
        .arg("parse")
        .arg("--response")
        .arg(&response)
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(contains("Failed to load config"));
}
