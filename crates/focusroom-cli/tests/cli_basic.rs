//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own temporary data directory.

use std::process::Command;

use tempfile::TempDir;

struct Cli {
    data_dir: TempDir,
}

impl Cli {
    fn new() -> Self {
        Self {
            data_dir: TempDir::new().unwrap(),
        }
    }

    /// Run a CLI command and return (stdout, stderr, exit code).
    fn run(&self, args: &[&str]) -> (String, String, i32) {
        let output = Command::new(env!("CARGO_BIN_EXE_focusroom"))
            .args(args)
            .env("FOCUSROOM_DATA_DIR", self.data_dir.path())
            .env_remove("FOCUSROOM_LOG")
            .output()
            .expect("Failed to execute CLI command");

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let code = output.status.code().unwrap_or(-1);

        (stdout, stderr, code)
    }

    fn json(&self, args: &[&str]) -> serde_json::Value {
        let (stdout, stderr, code) = self.run(args);
        assert_eq!(code, 0, "{args:?} failed: {stderr}");
        serde_json::from_str(&stdout).unwrap()
    }
}

#[test]
fn test_config_defaults() {
    let cli = Cli::new();
    let settings = cli.json(&["config", "list"]);
    assert_eq!(settings["weeklyFocusGoal"], 600);
    assert_eq!(settings["theme"], "light");
    assert_eq!(settings["timerPresets"].as_array().unwrap().len(), 3);
}

#[test]
fn test_config_set_and_get() {
    let cli = Cli::new();
    let (stdout, _, code) = cli.run(&["config", "set", "weeklyFocusGoal", "240"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "ok");

    let (stdout, _, code) = cli.run(&["config", "get", "weeklyFocusGoal"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "240");

    let progress = cli.json(&["progress", "show"]);
    assert_eq!(progress["weeklyFocusGoal"], 240);

    cli.run(&["config", "reset"]);
    let (stdout, _, _) = cli.run(&["config", "get", "weeklyFocusGoal"]);
    assert_eq!(stdout.trim(), "600");
}

#[test]
fn test_config_rejects_bad_input() {
    let cli = Cli::new();
    let (_, _, code) = cli.run(&["config", "set", "nonexistent", "1"]);
    assert_ne!(code, 0);
    let (_, stderr, code) = cli.run(&["config", "set", "weeklyFocusGoal", "0"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("weeklyFocusGoal"));
    let (_, _, code) = cli.run(&["config", "get", "nonexistent"]);
    assert_ne!(code, 0);
}

#[test]
fn test_timer_duration() {
    let cli = Cli::new();
    let timer = cli.json(&["timer", "duration", "600"]);
    assert_eq!(timer["durationSeconds"], 600);
    assert_eq!(timer["mode"], "idle");

    let status = cli.json(&["timer", "status"]);
    assert_eq!(status["durationSeconds"], 600);
    assert_eq!(status["remainingSeconds"], 600);
}

#[test]
fn test_timer_rejects_negative_duration() {
    let cli = Cli::new();
    let (_, stderr, code) = cli.run(&["timer", "duration", "-5"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("Invalid duration"));
    assert_eq!(cli.json(&["timer", "status"])["durationSeconds"], 1500);
}

#[test]
fn test_timer_preset() {
    let cli = Cli::new();
    let timer = cli.json(&["timer", "preset", "short break"]);
    assert_eq!(timer["durationSeconds"], 300);

    let (_, _, code) = cli.run(&["timer", "preset", "marathon"]);
    assert_ne!(code, 0);
}

#[test]
fn test_timer_run_records_session() {
    let cli = Cli::new();
    let (stdout, stderr, code) = cli.run(&["timer", "run", "--seconds", "1"]);
    assert_eq!(code, 0, "timer run failed: {stderr}");
    assert!(stdout.contains("\"SessionCompleted\""));
    assert!(stdout.contains("\"durationMinutes\""));
    assert!(stdout.contains("first_session"));
    assert!(stderr.contains("First Session"));

    let history = cli.json(&["history", "--limit", "5"]);
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["type"], "focus");

    let progress = cli.json(&["progress", "show"]);
    assert_eq!(progress["totalSessions"], 1);
    assert_eq!(progress["streak"], 1);
}

#[test]
fn test_break_run_unlocks_break_achievement() {
    let cli = Cli::new();
    let (_, stderr, code) = cli.run(&["timer", "run", "--seconds", "1", "--break"]);
    assert_eq!(code, 0, "timer run failed: {stderr}");

    let unlocked = cli.json(&["progress", "achievements", "--unlocked"]);
    let ids: Vec<&str> = unlocked
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|a| a["id"].as_str())
        .collect();
    assert_eq!(ids, vec!["take_a_break"]);
    assert_eq!(cli.json(&["progress", "show"])["totalSessions"], 0);
}

#[test]
fn test_progress_achievements() {
    let cli = Cli::new();
    let all = cli.json(&["progress", "achievements"]);
    assert!(all.as_array().unwrap().len() >= 15);
    assert!(all.as_array().unwrap().iter().all(|a| a["unlocked"] == false));
}
