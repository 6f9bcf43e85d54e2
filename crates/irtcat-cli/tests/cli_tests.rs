//! CLI integration tests using assert_cmd.

use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn irtcat() -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("irtcat").unwrap();
    cmd.env_remove("IRTCAT_MAX_QUESTIONS")
        .env_remove("IRTCAT_TARGET_SE")
        .env_remove("IRTCAT_SEED");
    cmd
}

fn bank_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../item-banks")
        .join(name)
}

#[test]
fn validate_algebra_bank() {
    irtcat()
        .arg("validate")
        .arg("--bank")
        .arg("../../item-banks/algebra.toml")
        .assert()
        .success()
        .stdout(predicate::str::contains("24 items"))
        .stdout(predicate::str::contains("All item banks valid"));
}

#[test]
fn validate_directory() {
    irtcat()
        .arg("validate")
        .arg("--bank")
        .arg("../../item-banks")
        .assert()
        .success()
        .stdout(predicate::str::contains("Algebra"))
        .stdout(predicate::str::contains("Reading Comprehension (16 items)"));
}

#[test]
fn validate_reports_warnings() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("thin.toml");
    std::fs::write(
        &path,
        r#"
[bank]
id = "thin"
name = "Thin"

[[items]]
id = "t1"
subject = "math"
topic = "counting"
band = "beginner"
guessing = 0.6
"#,
    )
    .unwrap();

    irtcat()
        .arg("validate")
        .arg("--bank")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("[t1] WARNING: guessing 0.6"))
        .stdout(predicate::str::contains("no items in the expert band"))
        .stdout(predicate::str::contains("warning(s) found"));
}

#[test]
fn validate_nonexistent_file() {
    irtcat()
        .arg("validate")
        .arg("--bank")
        .arg("nonexistent.toml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    irtcat()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created irtcat.toml"))
        .stdout(predicate::str::contains("Created item-banks/example.toml"));

    assert!(dir.path().join("irtcat.toml").exists());
    assert!(dir.path().join("item-banks/example.toml").exists());

    irtcat()
        .current_dir(dir.path())
        .arg("validate")
        .arg("--bank")
        .arg("item-banks/example.toml")
        .assert()
        .success()
        .stdout(predicate::str::contains("All item banks valid"));
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("irtcat.toml"), "max_questions = 12\n").unwrap();

    irtcat()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("irtcat.toml already exists"));

    let content = std::fs::read_to_string(dir.path().join("irtcat.toml")).unwrap();
    assert_eq!(content, "max_questions = 12\n");
}

#[test]
fn estimate_from_stdin() {
    let request = r#"{
        "items": [
            {"id": "q1", "band": "beginner", "guessing": 0.0},
            {"id": "q2", "band": "advanced", "guessing": 0.0}
        ],
        "history": [
            {"item_id": "q1", "correct": true},
            {"item_id": "q2", "correct": false}
        ]
    }"#;

    irtcat()
        .arg("estimate")
        .write_stdin(request)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"continue\": true"))
        .stdout(predicate::str::contains("\"reason\": \"minimum_exposure\""))
        .stdout(predicate::str::contains("\"sequence\": 2"));
}

#[test]
fn estimate_accepts_partial_stopping_rule() {
    let request = r#"{"items": [], "history": [], "stopping": {"max_questions": 10}}"#;

    irtcat()
        .arg("estimate")
        .write_stdin(request)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"continue\": true"));
}

#[test]
fn estimate_with_bank_stops_at_cap() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("request.json");
    let history: Vec<String> = (1..=6)
        .map(|i| format!(r#"{{"item_id": "alg-{:03}", "correct": {}}}"#, i * 3, i % 2 == 0))
        .collect();
    std::fs::write(
        &input,
        format!(
            r#"{{"history": [{}], "stopping": {{"max_questions": 6, "target_se": 0.05}}}}"#,
            history.join(",")
        ),
    )
    .unwrap();

    irtcat()
        .arg("estimate")
        .arg("--input")
        .arg(&input)
        .arg("--bank")
        .arg(bank_path("algebra.toml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("\"continue\": false"))
        .stdout(predicate::str::contains("\"reason\": \"max_questions\""));
}

#[test]
fn next_item_from_bank() {
    irtcat()
        .arg("next-item")
        .arg("--bank")
        .arg(bank_path("reading.toml"))
        .write_stdin(r#"{"history": [{"item_id": "read-008", "correct": true}]}"#)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\": \"item\""))
        .stdout(predicate::str::contains("\"subject\": \"reading\""))
        .stdout(predicate::str::contains("read-008").not());
}

#[test]
fn next_item_reports_exhaustion() {
    let request = r#"{
        "items": [{"id": "only", "band": "beginner"}],
        "history": [{"item_id": "only", "correct": true}]
    }"#;

    irtcat()
        .arg("next-item")
        .write_stdin(request)
        .assert()
        .success()
        .stdout(predicate::str::contains("no_item_available"));
}

#[test]
fn metrics_as_table() {
    let request = r#"{
        "items": [
            {"id": "q1", "band": "beginner"},
            {"id": "q2", "band": "intermediate"},
            {"id": "q3", "band": "advanced"}
        ],
        "history": [
            {"item_id": "q1", "correct": true, "elapsed_secs": 20.0},
            {"item_id": "q2", "correct": true, "elapsed_secs": 30.0},
            {"item_id": "q3", "correct": false, "elapsed_secs": 40.0}
        ],
        "strategy": {"kind": "progressive"}
    }"#;

    irtcat()
        .arg("metrics")
        .arg("--format")
        .arg("table")
        .write_stdin(request)
        .assert()
        .success()
        .stdout(predicate::str::contains("Algorithm"))
        .stdout(predicate::str::contains("progressive"))
        .stdout(predicate::str::contains("30.0s"));
}

#[test]
fn metrics_rejects_unknown_format() {
    irtcat()
        .arg("metrics")
        .arg("--format")
        .arg("xml")
        .write_stdin(r#"{"items": []}"#)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown format"));
}

#[test]
fn malformed_request_fails() {
    irtcat()
        .arg("estimate")
        .write_stdin("{ not json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse request JSON"));
}

#[test]
fn simulate_writes_reports() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("results");

    irtcat()
        .current_dir(dir.path())
        .arg("simulate")
        .arg("--bank")
        .arg(bank_path("algebra.toml"))
        .arg("--examinees")
        .arg("6")
        .arg("--seed")
        .arg("11")
        .arg("--max-questions")
        .arg("12")
        .arg("--output")
        .arg(&output)
        .arg("--format")
        .arg("all")
        .assert()
        .success()
        .stderr(predicate::str::contains("Complete: 6/6 sessions"))
        .stderr(predicate::str::contains("RMSE"));

    let files: Vec<String> = std::fs::read_dir(&output)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert!(files.iter().any(|f| f.ends_with(".json")), "{files:?}");
    assert!(files.iter().any(|f| f.ends_with(".html")), "{files:?}");
}

#[test]
fn simulate_with_goal_strategy() {
    let dir = TempDir::new().unwrap();

    irtcat()
        .current_dir(dir.path())
        .arg("simulate")
        .arg("--bank")
        .arg(bank_path("algebra.toml"))
        .arg("--examinees")
        .arg("3")
        .arg("--seed")
        .arg("2")
        .arg("--strategy")
        .arg("goal_aligned")
        .arg("--subjects")
        .arg("geometry")
        .arg("--format")
        .arg("none")
        .assert()
        .success()
        .stderr(predicate::str::contains("strategy goal_aligned"));

    assert!(!dir.path().join("irtcat-results").exists());
}

#[test]
fn simulate_examinee_profile_flags() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("results");

    irtcat()
        .current_dir(dir.path())
        .arg("simulate")
        .arg("--bank")
        .arg(bank_path("algebra.toml"))
        .arg("--examinees")
        .arg("4")
        .arg("--seed")
        .arg("5")
        .arg("--strategy")
        .arg("confidence_aware")
        .arg("--confidence")
        .arg("--fatigue")
        .arg("0.2")
        .arg("--pace")
        .arg("1.5")
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stderr(predicate::str::contains("Complete: 4/4 sessions"));

    let report = std::fs::read_dir(&output).unwrap().next().unwrap().unwrap().path();
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(report).unwrap()).unwrap();
    assert_eq!(json["config"]["pace"], 1.5);
    assert_eq!(json["config"]["fatigue"], 0.2);
    assert_eq!(json["config"]["report_confidence"], true);

    let sessions = json["sessions"].as_array().unwrap();
    assert_eq!(sessions.len(), 4);
    for session in sessions {
        for response in session["summary"]["responses"].as_array().unwrap() {
            assert!(response["confidence"].is_f64(), "{response}");
        }
    }
}

#[test]
fn simulate_rejects_negative_fatigue() {
    irtcat()
        .arg("simulate")
        .arg("--bank")
        .arg(bank_path("algebra.toml"))
        .arg("--fatigue")
        .arg("-0.5")
        .arg("--format")
        .arg("none")
        .assert()
        .failure()
        .stderr(predicate::str::contains("fatigue must be non-negative"));
}

#[test]
fn simulate_rejects_unknown_strategy() {
    irtcat()
        .arg("simulate")
        .arg("--bank")
        .arg(bank_path("algebra.toml"))
        .arg("--strategy")
        .arg("random")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown strategy"));
}

#[test]
fn help_output() {
    irtcat()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("adaptive testing"));
}

#[test]
fn version_output() {
    irtcat()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("irtcat"));
}
