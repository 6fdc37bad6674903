//! Basic CLI E2E tests.
//!
//! Tests run the built binary against an isolated data directory and verify
//! outputs and exit codes.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use tempfile::TempDir;

struct Output {
    stdout: String,
    stderr: String,
    code: i32,
}

fn command(home: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_debate-tutor"));
    cmd.args(args)
        .env("DEBATE_TUTOR_HOME", home)
        .env_remove("DEBATE_TUTOR_LOG")
        .env_remove("GEMINI_API_KEY");
    cmd
}

/// Run a CLI command and return output.
fn run_cli(home: &Path, args: &[&str]) -> Output {
    let output = command(home, args)
        .output()
        .expect("Failed to execute CLI command");
    Output {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        code: output.status.code().unwrap_or(-1),
    }
}

/// Run a CLI command with `input` piped to stdin.
fn run_cli_with_input(home: &Path, args: &[&str], input: &str) -> Output {
    let mut child = command(home, args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn CLI command");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(input.as_bytes())
        .unwrap();
    let output = child.wait_with_output().unwrap();
    Output {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        code: output.status.code().unwrap_or(-1),
    }
}

fn save_scenario(home: &Path, user: Option<&str>) -> String {
    let mut args = vec!["scenario", "generate", "--topic", "Homework", "--time", "60", "--save"];
    if let Some(user) = user {
        args.extend(["--user", user]);
    }
    let out = run_cli(home, &args);
    assert_eq!(out.code, 0, "generate failed: {}", out.stderr);
    let scenario: serde_json::Value = serde_json::from_str(&out.stdout).unwrap();
    scenario["id"].as_str().unwrap().to_string()
}

#[test]
fn test_generate_prints_standard_layout() {
    let home = TempDir::new().unwrap();
    let out = run_cli(
        home.path(),
        &["scenario", "generate", "--topic", "Uniforms", "--time", "60", "--groups", "4"],
    );
    assert_eq!(out.code, 0, "stderr: {}", out.stderr);

    let scenario: serde_json::Value = serde_json::from_str(&out.stdout).unwrap();
    assert_eq!(scenario["title"], "Uniforms");
    assert_eq!(scenario["groupCount"], 4);
    let totals: Vec<u64> = scenario["stages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["totalTime"].as_u64().unwrap())
        .collect();
    assert_eq!(totals, vec![18, 30, 12]);

    let list = run_cli(home.path(), &["scenario", "list"]);
    assert_eq!(list.code, 0);
    assert_eq!(list.stdout.trim(), "[]", "unsaved scenario must not be listed");
}

#[test]
fn test_generate_uses_config_defaults() {
    let home = TempDir::new().unwrap();
    let set = run_cli(home.path(), &["config", "set", "generator.default_total_time", "30"]);
    assert_eq!(set.code, 0, "stderr: {}", set.stderr);

    let out = run_cli(home.path(), &["scenario", "generate", "--topic", "Recess"]);
    let scenario: serde_json::Value = serde_json::from_str(&out.stdout).unwrap();
    assert_eq!(scenario["totalTime"], 30);
    assert_eq!(scenario["groupCount"], 4);
}

#[test]
fn test_invalid_input_exits_with_validation_code() {
    let home = TempDir::new().unwrap();
    let out = run_cli(
        home.path(),
        &["scenario", "generate", "--topic", "X", "--time", "0"],
    );
    assert_eq!(out.code, 2);
    assert!(out.stderr.contains("total_time"));
}

#[test]
fn test_save_show_set_time_delete() {
    let home = TempDir::new().unwrap();
    let id = save_scenario(home.path(), None);

    let show = run_cli(home.path(), &["scenario", "show", &id]);
    assert_eq!(show.code, 0);
    assert!(show.stdout.contains("\"1-1\""));

    let edit = run_cli(home.path(), &["--user", "t1", "scenario", "set-time", &id, "1", "1", "10"]);
    assert_eq!(edit.code, 0, "stderr: {}", edit.stderr);
    let edited: serde_json::Value = serde_json::from_str(&edit.stdout).unwrap();
    assert_eq!(edited["stages"][0]["activities"][0]["timeMinutes"], 10);
    assert_eq!(edited["stages"][0]["totalTime"], 10 + 4 + 5 + 5);
    assert!(edit.stderr.contains("lesson length"), "drift warning expected");

    let zero = run_cli(home.path(), &["--user", "t1", "scenario", "set-time", &id, "0", "1", "10"]);
    assert_eq!(zero.code, 2);

    let delete = run_cli(home.path(), &["--user", "t1", "scenario", "delete", &id]);
    assert_eq!(delete.code, 0);

    let gone = run_cli(home.path(), &["scenario", "show", &id]);
    assert_eq!(gone.code, 3);
}

#[test]
fn test_owned_scenarios_are_private() {
    let home = TempDir::new().unwrap();
    let id = save_scenario(home.path(), Some("alice"));

    let mine = run_cli(home.path(), &["--user", "alice", "scenario", "list"]);
    let listed: Vec<serde_json::Value> = serde_json::from_str(&mine.stdout).unwrap();
    assert_eq!(listed.len(), 1);

    let other = run_cli(home.path(), &["--user", "bob", "scenario", "show", &id]);
    assert_eq!(other.code, 4);
    let delete = run_cli(home.path(), &["--user", "bob", "scenario", "delete", &id]);
    assert_eq!(delete.code, 4);
}

#[test]
fn test_write_without_user_is_rejected() {
    let home = TempDir::new().unwrap();
    let id = save_scenario(home.path(), None);
    let out = run_cli(home.path(), &["scenario", "delete", &id]);
    assert_eq!(out.code, 4);
}

#[test]
fn test_ai_without_api_key_is_config_error() {
    let home = TempDir::new().unwrap();
    let out = run_cli(
        home.path(),
        &["scenario", "ai", "--topic", "Zoos", "--difficulty", "beginner", "--time", "40", "--groups", "4"],
    );
    assert_eq!(out.code, 1);
    assert!(out.stderr.contains("GEMINI_API_KEY"));
}

#[test]
fn test_ai_rejects_out_of_range_request_before_calling_service() {
    let home = TempDir::new().unwrap();
    let out = run_cli(
        home.path(),
        &["scenario", "ai", "--topic", "Zoos", "--time", "5", "--groups", "4"],
    );
    assert_eq!(out.code, 2);
}

#[test]
fn test_facilitate_session() {
    let home = TempDir::new().unwrap();
    let id = save_scenario(home.path(), None);

    let out = run_cli_with_input(
        home.path(),
        &["facilitate", &id],
        "next\ngo 3 2\nnext\nprev\nbogus\nstatus\nquit\n",
    );
    assert_eq!(out.code, 0, "stderr: {}", out.stderr);

    let events: Vec<serde_json::Value> = out
        .stdout
        .lines()
        .filter(|l| l.starts_with('{'))
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    let kinds: Vec<&str> = events.iter().map(|e| e["type"].as_str().unwrap()).collect();
    assert_eq!(
        kinds,
        vec![
            "state_snapshot",
            "activity_selected",
            "activity_selected",
            "scenario_completed",
            "activity_selected",
            "state_snapshot",
        ]
    );
    assert_eq!(events[1]["activity_id"], "1-2");
    assert_eq!(events[4]["activity_id"], "3-1");
    assert_eq!(events[5]["activity_id"], "3-1");
    assert!(out.stderr.contains("unknown command"));
}

#[test]
fn test_facilitate_ends_on_eof() {
    let home = TempDir::new().unwrap();
    let id = save_scenario(home.path(), None);
    let out = run_cli_with_input(home.path(), &["facilitate", &id], "status\n");
    assert_eq!(out.code, 0);
}

#[test]
fn test_config_get_set_reset() {
    let home = TempDir::new().unwrap();

    let get = run_cli(home.path(), &["config", "get", "ai.model"]);
    assert_eq!(get.code, 0);
    assert_eq!(get.stdout.trim(), "gemini-1.5-pro");

    let set = run_cli(home.path(), &["config", "set", "facilitation.announce_expiry", "false"]);
    assert_eq!(set.code, 0);
    let get = run_cli(home.path(), &["config", "get", "facilitation.announce_expiry"]);
    assert_eq!(get.stdout.trim(), "false");

    let bad = run_cli(home.path(), &["config", "set", "generator.default_total_time", "lots"]);
    assert_ne!(bad.code, 0);
    let unknown = run_cli(home.path(), &["config", "get", "nope"]);
    assert_ne!(unknown.code, 0);

    let reset = run_cli(home.path(), &["config", "reset"]);
    assert_eq!(reset.code, 0);
    let get = run_cli(home.path(), &["config", "get", "facilitation.announce_expiry"]);
    assert_eq!(get.stdout.trim(), "true");
}
