//! Integration tests for CLI functionality
//!
//! These tests drive the compiled binary end to end. Unit tests for argument
//! parsing and task file loading live in the respective module files.

use slotplan::cli::TaskLoader;
use slotplan::{ConfigDiscovery, EngineConfig};
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const TASKS_TOML: &str = r#"
[[tasks]]
id = "3f0c9a1e-8c1b-4b7e-9d52-0a3c2f7e5b11"
title = "Draft"
priority = "HIGH"
estimated_duration = 3600

[[tasks]]
id = "8a6d4b2c-1f3e-4a5b-8c7d-9e0f1a2b3c4d"
title = "Review"
estimated_duration = 1800
due_date = "2026-03-02T17:00:00Z"
dependencies = ["3f0c9a1e-8c1b-4b7e-9d52-0a3c2f7e5b11"]
"#;

fn slotplan(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_slotplan"))
        .current_dir(dir)
        .env_remove("SLOTPLAN_CONFIG")
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("binary should run")
}

fn write_fixture(dir: &TempDir) {
    fs::write(dir.path().join("tasks.toml"), TASKS_TOML).unwrap();
    EngineConfig::default()
        .to_toml_file(dir.path().join("slotplan.toml"))
        .unwrap();
}

#[test]
fn test_task_file_loads_from_disk() {
    let temp_dir = TempDir::new().unwrap();
    write_fixture(&temp_dir);

    let file = TaskLoader::load(temp_dir.path().join("tasks.toml")).unwrap();
    assert_eq!(file.tasks.len(), 2);
    assert_eq!(file.tasks[1].dependencies, vec![file.tasks[0].id]);
}

#[test]
fn test_config_candidates_include_directory_files() {
    let temp_dir = TempDir::new().unwrap();
    let candidates = ConfigDiscovery::directory_candidates(temp_dir.path());

    assert!(candidates.contains(&temp_dir.path().join("slotplan.toml")));
    assert!(candidates.contains(&temp_dir.path().join(".slotplan").join("config.toml")));
}

#[test]
fn test_schedule_command_prints_json_with_analytics() {
    let temp_dir = TempDir::new().unwrap();
    write_fixture(&temp_dir);

    let output = slotplan(
        temp_dir.path(),
        &[
            "schedule",
            "tasks.toml",
            "--config",
            "slotplan.toml",
            "--now",
            "2026-03-02T08:00:00Z",
            "--analytics",
        ],
    );
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let slots = json["schedule"]["slots"].as_array().unwrap();
    assert_eq!(slots.len(), 2);
    assert_eq!(slots[0]["start"], "2026-03-02T09:00:00Z");
    assert_eq!(slots[1]["start"], "2026-03-02T10:15:00Z");
    assert_eq!(json["analytics"]["total_tasks"], 2);
    assert_eq!(json["analytics"]["total_scheduled_minutes"], 90);
}

#[test]
fn test_optimal_start_command() {
    let temp_dir = TempDir::new().unwrap();
    write_fixture(&temp_dir);

    let output = slotplan(
        temp_dir.path(),
        &[
            "optimal-start",
            "tasks.toml",
            "8a6d4b2c-1f3e-4a5b-8c7d-9e0f1a2b3c4d",
            "--now",
            "2026-03-02T09:00:00Z",
        ],
    );
    assert!(output.status.success());

    // Draft is unfinished, so Review waits for its full hour
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["start"], "2026-03-02T10:00:00Z");
}

#[test]
fn test_missing_task_file_fails() {
    let temp_dir = TempDir::new().unwrap();

    let output = slotplan(temp_dir.path(), &["schedule", "missing.json"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("missing.json"));
}
