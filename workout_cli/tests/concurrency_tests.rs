//! Concurrency tests for wtimer.
//!
//! These tests verify that repeated and overlapping processes can safely:
//! - Append exercises to the same workout one run at a time
//! - Append exercises from many processes at once without losing any
//! - Read the store while another process writes it

use assert_cmd::Command;
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

fn cli() -> Command {
    let isolated = std::env::temp_dir().join("wtimer-tests-no-config");
    let mut cmd = Command::cargo_bin("wtimer").expect("Failed to find wtimer binary");
    cmd.env("XDG_CONFIG_HOME", &isolated).env("HOME", &isolated);
    cmd
}

fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

#[test]
fn test_sequential_additions_are_kept() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    cli().args(["new", "Circuit", "--data-dir"]).arg(&data_dir).assert().success();

    // Run with slight delays (more realistic than thundering herd)
    for i in 0..5 {
        thread::sleep(Duration::from_millis(i * 5));
        cli()
            .args(["add-exercise", "Circuit", "--name"])
            .arg(format!("Station {}", i))
            .arg("--data-dir")
            .arg(&data_dir)
            .assert()
            .success();
    }

    let stored = std::fs::read_to_string(data_dir.join("workouts.json")).unwrap();
    let workouts: serde_json::Value = serde_json::from_str(&stored).unwrap();
    let count = workouts[0]["exercises"].as_array().unwrap().len();
    assert_eq!(count, 5, "Expected 5 exercises, got {}", count);
}

#[test]
fn test_concurrent_reads_and_writes() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    cli().args(["new", "Shared", "--data-dir"]).arg(&data_dir).assert().success();

    let writer_dir = data_dir.clone();
    let writer = thread::spawn(move || {
        for i in 0..3 {
            cli()
                .args(["add-exercise", "Shared", "--name"])
                .arg(format!("Move {}", i))
                .arg("--data-dir")
                .arg(&writer_dir)
                .assert()
                .success();
        }
    });

    let reader_dir = data_dir.clone();
    let reader = thread::spawn(move || {
        for _ in 0..3 {
            cli()
                .args(["show", "Shared", "--data-dir"])
                .arg(&reader_dir)
                .assert()
                .success();
        }
    });

    writer.join().expect("Writer thread panicked");
    reader.join().expect("Reader thread panicked");

    // The store is always a complete JSON document
    let stored = std::fs::read_to_string(data_dir.join("workouts.json")).unwrap();
    let workouts: serde_json::Value = serde_json::from_str(&stored).unwrap();
    assert_eq!(workouts[0]["exercises"].as_array().unwrap().len(), 3);
}

#[test]
fn test_parallel_writers_keep_every_exercise() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    cli().args(["new", "Crowd", "--data-dir"]).arg(&data_dir).assert().success();

    let writers: Vec<_> = (0..8)
        .map(|i| {
            let dir = data_dir.clone();
            thread::spawn(move || {
                cli()
                    .args(["add-exercise", "Crowd", "--name"])
                    .arg(format!("E{}", i))
                    .arg("--data-dir")
                    .arg(&dir)
                    .assert()
                    .success();
            })
        })
        .collect();

    for writer in writers {
        writer.join().expect("Writer thread panicked");
    }

    let stored = std::fs::read_to_string(data_dir.join("workouts.json")).unwrap();
    let workouts: serde_json::Value = serde_json::from_str(&stored).unwrap();
    let mut names: Vec<String> = workouts[0]["exercises"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["name"].as_str().unwrap().to_string())
        .collect();
    names.sort();
    let expected: Vec<String> = (0..8).map(|i| format!("E{}", i)).collect();
    assert_eq!(names, expected);
}
