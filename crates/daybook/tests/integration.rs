//! CLI tests: run the compiled `daybook` binary against a temporary config.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn daybook_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_daybook"))
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let media_dir = root.join("media");
    fs::create_dir_all(&media_dir).unwrap();
    fs::write(media_dir.join("first.jpg"), b"jpeg bytes").unwrap();
    fs::write(media_dir.join("second.mp4"), b"mp4 bytes").unwrap();

    let config_content = format!(
        r#"[db]
path = "{}/data/daybook.sqlite"

[server]
bind = "127.0.0.1:0"

[media]
base_url = "https://blob.test/daybook"

[recap]
timezone = "utc"
compose_delay_ms = 0
"#,
        root.display()
    );

    let config_path = config_dir.join("daybook.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_daybook(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = daybook_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .env_remove("DAYBOOK_DB_PATH")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run daybook binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_daybook(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));

    let (_, _, success) = run_daybook(&config_path, &["init"]);
    assert!(success, "Second init failed (not idempotent)");
}

#[test]
fn test_add_list_get() {
    let (tmp, config_path) = setup_test_env();
    run_daybook(&config_path, &["init"]);

    let media_dir = tmp.path().join("media");
    let first = media_dir.join("first.jpg");
    let second = media_dir.join("second.mp4");
    let (stdout, stderr, success) = run_daybook(
        &config_path,
        &[
            "add",
            "--text",
            "Trip to the hills",
            "--lat",
            "12.5",
            "--lon",
            "-77.2",
            "--media",
            first.to_str().unwrap(),
            "--media",
            second.to_str().unwrap(),
        ],
    );
    assert!(success, "add failed: stdout={}, stderr={}", stdout, stderr);
    let id = stdout
        .trim()
        .strip_prefix("Journal entry created: ")
        .unwrap()
        .to_string();

    let (stdout, _, success) = run_daybook(&config_path, &["list", "--json"]);
    assert!(success);
    let entries: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(entries[0]["id"], id.as_str());
    assert_eq!(entries[0]["location"]["longitude"], -77.2);
    assert_eq!(
        entries[0]["mediaUrls"],
        serde_json::json!([
            "https://blob.test/daybook/first.jpg",
            "https://blob.test/daybook/second.mp4"
        ])
    );

    let (stdout, _, success) = run_daybook(&config_path, &["get", &id]);
    assert!(success);
    assert!(stdout.contains("Trip to the hills"));
    assert!(stdout.contains("--- Media (2) ---"));
}

#[test]
fn test_get_unknown_entry_fails() {
    let (_tmp, config_path) = setup_test_env();
    run_daybook(&config_path, &["init"]);

    let (_, stderr, success) = run_daybook(&config_path, &["get", "no-such-id"]);
    assert!(!success);
    assert!(stderr.contains("entry not found"));
}

#[test]
fn test_recap_dry_run_and_run() {
    let (_tmp, config_path) = setup_test_env();
    run_daybook(&config_path, &["init"]);
    run_daybook(&config_path, &["add", "--text", "just now"]);

    let (stdout, stderr, success) = run_daybook(&config_path, &["recap", "--dry-run"]);
    assert!(success, "recap failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("entries:   1"));
    assert!(stdout.contains("video:     (none)"));

    // Text only: nothing to compose.
    let (stdout, _, success) = run_daybook(&config_path, &["recap"]);
    assert!(success);
    assert!(stdout.contains("CompositionSkipped -> Closed"));
}

#[test]
fn test_missing_config_fails() {
    let tmp = TempDir::new().unwrap();
    let (_, stderr, success) = run_daybook(&tmp.path().join("absent.toml"), &["init"]);
    assert!(!success);
    assert!(stderr.contains("Failed to read config file"));
}
