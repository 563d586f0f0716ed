use std::path::PathBuf;
use std::process::Command;

use serde_json::Value;

fn cli() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_rep_cli"));
    command
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .env_remove("PHYSIO_TRAINER_CONFIG")
        .env("RUST_LOG", "warn");
    command
}

fn fixture_file(name: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join(name)
        .to_string_lossy()
        .into_owned()
}

fn json_lines(stdout: Vec<u8>) -> Vec<Value> {
    String::from_utf8(stdout)
        .expect("stdout UTF-8")
        .lines()
        .map(|line| serde_json::from_str(line).expect("JSON line"))
        .collect()
}

#[test]
fn replay_bundled_fixture_counts_reps() {
    let output = cli()
        .args(["replay", "--input", "squat_session"])
        .output()
        .expect("failed to run rep_cli replay");
    assert!(
        output.status.success(),
        "CLI exited with {:?}: {}",
        output.status.code(),
        String::from_utf8_lossy(&output.stderr)
    );

    let lines = json_lines(output.stdout);
    assert_eq!(lines.len(), 11);

    assert_eq!(lines[2]["frame"], 2);
    assert_eq!(lines[2]["error"], "No pose detected");
    assert_eq!(lines[2]["code"], 3001);

    assert_eq!(lines[5]["reps"], 2);
    assert!(lines[5]["avg_angle"].is_null());
    assert_eq!(lines[6]["avg_angle"], 131.5);

    let last = lines.last().expect("final report");
    assert_eq!(last["reps"], 4);
    assert_eq!(last["stage"], "Up");
    assert_eq!(last["feedback"], "Great job, keep going!");
}

#[test]
fn replay_accepts_fixture_path() {
    let output = cli()
        .args(["replay", "--input", &fixture_file("squat_session.json"), "--session", "p1"])
        .output()
        .expect("failed to run replay by path");
    assert!(output.status.success());
}

#[test]
fn replay_detects_expectation_mismatch() {
    let output = cli()
        .args(["replay", "--input", "short_session_wrong_count"])
        .output()
        .expect("failed to run mismatch replay");
    assert_eq!(output.status.code(), Some(2));

    let stderr = String::from_utf8(output.stderr).expect("stderr UTF-8");
    assert!(
        stderr.contains("\"failures\""),
        "expected diff JSON in stderr, got {stderr}"
    );
    assert!(stderr.contains("final_reps"));
}

#[test]
fn replay_unknown_fixture_fails() {
    let output = cli()
        .args(["replay", "--input", "no_such_fixture"])
        .output()
        .expect("failed to run replay");
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn angles_drives_controller_directly() {
    let output = cli()
        .args(["angles", "--knee", "170,135,165,128,170,172"])
        .output()
        .expect("failed to run angles");
    assert!(output.status.success());

    let lines = json_lines(output.stdout);
    assert_eq!(lines.len(), 6);
    assert_eq!(lines[0]["phase"], "learning");
    assert_eq!(lines[2]["reps"], 1);
    assert_eq!(lines[5]["phase"], "counting");
    assert_eq!(lines[5]["baseline_angle"], 131.5);
}

#[test]
fn print_config_honors_config_file() {
    let path = std::env::temp_dir().join(format!("physio_trainer_cli_{}.json", std::process::id()));
    std::fs::write(&path, r#"{ "rep_counting": { "learn_target": 3 } }"#).expect("write config");

    let output = cli()
        .args(["print-config", "--config"])
        .arg(&path)
        .output()
        .expect("failed to run print-config");
    let _ = std::fs::remove_file(&path);
    assert!(output.status.success());

    let json: Value = serde_json::from_slice(&output.stdout).expect("config JSON");
    assert_eq!(json["rep_counting"]["learn_target"], 3);
    assert_eq!(json["rep_counting"]["recovery_threshold_angle"], 160.0);
    assert_eq!(json["feedback"]["cooldown_seconds"], 10);
}

#[test]
fn dump_fixtures_lists_assets() {
    let output = cli()
        .arg("dump-fixtures")
        .output()
        .expect("failed to run dump-fixtures");
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
    assert!(
        stdout.contains("squat_session"),
        "expected fixture listing, got {stdout}"
    );
}
