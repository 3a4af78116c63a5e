use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::path::Path;

fn movies(fixture_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("movies_cli").unwrap();
    cmd.env_remove("SQL_MOVIES_FIXTURE_DIR")
        .env_remove("SQL_MOVIES_QUERY_TIMEOUT_SECS")
        .env_remove("SQL_MOVIES_LOG_LEVEL")
        .arg("--fixture-dir")
        .arg(fixture_dir);
    cmd
}

fn stdout_json(cmd: &mut Command) -> Value {
    let output = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).unwrap()
}

fn read_logs(dir: &Path) -> String {
    std::fs::read_dir(dir)
        .unwrap()
        .filter_map(Result::ok)
        .filter_map(|entry| std::fs::read_to_string(entry.path()).ok())
        .collect()
}

#[test]
fn prepare_writes_stage_file_and_prints_its_path() {
    let dir = tempfile::tempdir().unwrap();

    movies(dir.path())
        .args(["prepare", "06"])
        .assert()
        .success()
        .stdout(predicate::str::contains("06.db"));

    assert!(dir.path().join("06.db").is_file());
}

#[test]
fn query_prints_rows_as_json_array() {
    let dir = tempfile::tempdir().unwrap();
    movies(dir.path()).args(["prepare", "06"]).assert().success();

    let rows = stdout_json(movies(dir.path()).args([
        "query",
        "06",
        "SELECT id, genre FROM genres WHERE id <= 2 ORDER BY id",
    ]));

    assert_eq!(
        rows,
        json!([
            { "id": 1, "genre": "Drama" },
            { "id": 2, "genre": "Thriller" },
        ])
    );
}

#[test]
fn single_query_prints_first_row_or_null() {
    let dir = tempfile::tempdir().unwrap();
    movies(dir.path()).args(["prepare", "06"]).assert().success();

    let first = stdout_json(movies(dir.path()).args([
        "query",
        "06",
        "SELECT count(*) AS total FROM movies",
        "--single",
    ]));
    assert_eq!(first, json!({ "total": 15 }));

    let none = stdout_json(movies(dir.path()).args([
        "query",
        "06",
        "SELECT genre FROM genres WHERE genre = 'Western'",
        "--single",
    ]));
    assert_eq!(none, Value::Null);
}

#[test]
fn query_on_unprepared_stage_fails_without_creating_a_file() {
    let dir = tempfile::tempdir().unwrap();

    movies(dir.path())
        .args(["query", "05", "SELECT 1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("fixture for stage `05` not found"));

    assert!(!dir.path().join("05.db").exists());
}

#[test]
fn copy_duplicates_stage_and_refuses_self_copy() {
    let dir = tempfile::tempdir().unwrap();
    movies(dir.path()).args(["prepare", "06"]).assert().success();
    let source_len = std::fs::metadata(dir.path().join("06.db")).unwrap().len();

    movies(dir.path())
        .args(["copy", "06", "07"])
        .assert()
        .success()
        .stdout(predicate::str::contains("07.db"));
    assert!(dir.path().join("07.db").is_file());

    movies(dir.path())
        .args(["copy", "06", "06"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("onto itself"));
    assert_eq!(
        std::fs::metadata(dir.path().join("06.db")).unwrap().len(),
        source_len
    );

    let count = stdout_json(movies(dir.path()).args([
        "query",
        "06",
        "SELECT count(*) AS total FROM movies",
        "--single",
    ]));
    assert_eq!(count, json!({ "total": 15 }));
}

#[test]
fn log_file_receives_events_from_each_run() {
    let dir = tempfile::tempdir().unwrap();
    let log_dir = tempfile::tempdir().unwrap();
    let log_dir_arg = log_dir.path().to_str().unwrap();

    movies(dir.path())
        .args(["--log-dir", log_dir_arg, "--log-level", "info", "prepare", "06"])
        .assert()
        .success();
    movies(dir.path())
        .args([
            "--log-dir",
            log_dir_arg,
            "--log-level",
            "info",
            "query",
            "06",
            "SELECT * FROM table_absent_from_fixture",
        ])
        .assert()
        .failure();

    let written = read_logs(log_dir.path());
    assert!(written.contains("event=fixture_prepare module=db status=ok stage=06"));
    assert!(written.contains("event=cli_exit module=cli status=ok"));
    assert!(written.contains("event=cli_exit module=cli status=error error_code=sqlite_error"));
    assert!(!written.contains("table_absent_from_fixture"));
}
