//! Integration tests for the command-line interface
//!
//! Runs the built binary against a scratch directory for apply, check,
//! parse and prompt.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

const SOURCE: &str = "def divide(a, b):\n    return a / b\n\nprint(divide(4, 0))\n";

const RESPONSE: &str = r#"Here are the fixes:
```json
[
  {"kind": "insert_before", "issue": "guard zero", "anchor": "    return a / b\n",
   "insertion": "    if b == 0:\n        return None"},
  {"kind": "replace", "issue": "fix call", "target": "print(divide(4, 0))\n",
   "replacement": "print(divide(4, 2))"}
]
```"#;

/// Helper to create a scratch directory with a source file and a response
fn setup_workspace(response: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("divide.py"), SOURCE).unwrap();
    fs::write(dir.path().join("response.txt"), response).unwrap();
    dir
}

fn command(dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_anchor-patcher"));
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG");
    cmd
}

fn run(dir: &Path, args: &[&str]) -> Output {
    command(dir).args(args).output().unwrap()
}

fn run_with_stdin(dir: &Path, args: &[&str], stdin: &str) -> Output {
    let mut child = command(dir)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(stdin.as_bytes())
        .unwrap();
    child.wait_with_output().unwrap()
}

#[test]
fn test_apply_help() {
    let dir = TempDir::new().unwrap();
    let output = run(dir.path(), &["apply", "--help"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Review and apply suggested patches"));
    assert!(stdout.contains("--dry-run"));
}

#[test]
fn test_apply_yes() {
    let dir = setup_workspace(RESPONSE);
    let output = run(
        dir.path(),
        &["apply", "--file", "divide.py", "--suggestions", "response.txt", "--yes"],
    );

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Received 2 patch(es) (anchor format)."));
    assert!(stdout.contains("INSERT BEFORE: guard zero: Applied"));
    assert!(stdout.contains("Summary:"));

    let patched = fs::read_to_string(dir.path().join("divide.py")).unwrap();
    assert_eq!(
        patched,
        "def divide(a, b):\n    if b == 0:\n        return None\n    return a / b\n\nprint(divide(4, 2))\n"
    );
}

#[test]
fn test_apply_dry_run_leaves_file() {
    let dir = setup_workspace(RESPONSE);
    let output = run(
        dir.path(),
        &[
            "apply",
            "--file",
            "divide.py",
            "--suggestions",
            "response.txt",
            "--yes",
            "--dry-run",
            "--diff",
        ],
    );

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("DRY RUN"));
    assert!(stdout.contains("Would apply"));
    assert!(stdout.contains("+print(divide(4, 2))"));
    assert!(stdout.contains("-print(divide(4, 0))"));
    assert_eq!(
        fs::read_to_string(dir.path().join("divide.py")).unwrap(),
        SOURCE
    );
}

#[test]
fn test_apply_interactive_answers() {
    let dir = setup_workspace(RESPONSE);
    let output = run_with_stdin(
        dir.path(),
        &["apply", "--file", "divide.py", "--suggestions", "response.txt"],
        "s\na\n",
    );

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("[1/2] INSERT BEFORE: guard zero"));
    assert!(stdout.contains("[a] Apply Fix"));
    assert!(stdout.contains("guard zero: Skipped"));

    let patched = fs::read_to_string(dir.path().join("divide.py")).unwrap();
    assert_eq!(
        patched,
        "def divide(a, b):\n    return a / b\n\nprint(divide(4, 2))\n"
    );
}

#[test]
fn test_apply_interactive_quit_stops_batch() {
    let dir = setup_workspace(RESPONSE);
    let output = run_with_stdin(
        dir.path(),
        &["apply", "--file", "divide.py", "--suggestions", "response.txt"],
        "q\n",
    );

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Not attempted"));
    assert_eq!(
        fs::read_to_string(dir.path().join("divide.py")).unwrap(),
        SOURCE
    );
}

#[test]
fn test_apply_interactive_requires_suggestions_file() {
    let dir = setup_workspace(RESPONSE);
    let output = run_with_stdin(dir.path(), &["apply", "--file", "divide.py"], RESPONSE);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--suggestions"));
}

#[test]
fn test_apply_reads_stdin_with_yes() {
    let dir = setup_workspace("");
    let output = run_with_stdin(
        dir.path(),
        &["apply", "--file", "divide.py", "--yes"],
        RESPONSE,
    );

    assert!(output.status.success());
    let patched = fs::read_to_string(dir.path().join("divide.py")).unwrap();
    assert!(patched.contains("print(divide(4, 2))"));
}

#[test]
fn test_apply_no_fixes() {
    let dir = setup_workspace("The code looks correct to me.");
    let output = run(
        dir.path(),
        &["apply", "--file", "divide.py", "--suggestions", "response.txt", "--yes"],
    );

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("No fixes suggested."));
}

#[test]
fn test_apply_config_mode_skip_all() {
    let dir = setup_workspace(RESPONSE);
    fs::write(
        dir.path().join("anchor-patcher.toml"),
        "[review]\nmode = \"skip-all\"\n",
    )
    .unwrap();

    let output = run(
        dir.path(),
        &["apply", "--file", "divide.py", "--suggestions", "response.txt"],
    );

    assert!(output.status.success());
    assert_eq!(
        fs::read_to_string(dir.path().join("divide.py")).unwrap(),
        SOURCE
    );
}

#[test]
fn test_invalid_config_fails() {
    let dir = setup_workspace(RESPONSE);
    fs::write(
        dir.path().join("anchor-patcher.toml"),
        "[review]\ncontext_lines = 5000\n",
    )
    .unwrap();

    let output = run(dir.path(), &["parse", "--suggestions", "response.txt"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("review.context_lines"));
}

#[test]
fn test_check_reports_not_found() {
    let response = r#"[{"kind": "delete", "issue": "stale", "target": "return a // b"},
                      {"kind": "delete", "issue": "drop call", "target": "print(divide(4, 0))\n"}]"#;
    let dir = setup_workspace(response);
    let output = run(
        dir.path(),
        &["check", "--file", "divide.py", "--suggestions", "response.txt"],
    );

    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stdout.contains("Patch Check Report"));
    assert!(stdout.contains("DELETE: drop call: Would apply"));
    assert!(stderr.contains("DELETE: stale: Not found"));
    assert!(stderr.contains("closest line 2"));
    assert_eq!(
        fs::read_to_string(dir.path().join("divide.py")).unwrap(),
        SOURCE
    );
}

#[test]
fn test_check_hints_follow_batch_order() {
    // Both misses share an issue text but point at different lines
    let response = r#"[{"kind": "delete", "issue": "stale", "target": "return a // b"},
                      {"kind": "delete", "issue": "stale", "target": "prnt(divide(4, 0))"}]"#;
    let dir = setup_workspace(response);
    let output = run(
        dir.path(),
        &["check", "--file", "divide.py", "--suggestions", "response.txt"],
    );

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    let first = stderr.find("closest line 2").unwrap();
    let second = stderr.find("closest line 4").unwrap();
    assert!(first < second);
    assert_eq!(stderr.matches("closest line").count(), 2);
}

#[test]
fn test_check_all_found() {
    let dir = setup_workspace(RESPONSE);
    let output = run(
        dir.path(),
        &["check", "--file", "divide.py", "--suggestions", "response.txt"],
    );

    assert!(output.status.success());
}

#[test]
fn test_parse_converts_legacy() {
    let response = r#"[{"start_line": 2, "end_line": 2, "issue": "guard", "operation": "replace",
                       "suggested_fix": "    return a / b if b else None"}]"#;
    let dir = setup_workspace(response);
    let output = run(
        dir.path(),
        &["parse", "--file", "divide.py", "--suggestions", "response.txt"],
    );

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Format: legacy"));

    let patches: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(patches[0]["kind"], "replace");
    assert_eq!(patches[0]["target"], "    return a / b");
    assert_eq!(patches[0]["occurrence_index"], 0);
}

#[test]
fn test_parse_no_legacy() {
    let response = r#"[{"start_line": 2, "issue": "guard", "operation": "delete"}]"#;
    let dir = setup_workspace(response);
    let output = run(
        dir.path(),
        &[
            "parse",
            "--file",
            "divide.py",
            "--suggestions",
            "response.txt",
            "--no-legacy",
        ],
    );

    assert!(output.status.success());
    let patches: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(patches, serde_json::json!([]));
}

#[test]
fn test_prompt_command() {
    let dir = setup_workspace(RESPONSE);
    fs::write(
        dir.path().join("trace.txt"),
        "ZeroDivisionError: division by zero",
    )
    .unwrap();

    let output = run(
        dir.path(),
        &["prompt", "--file", "divide.py", "--trace", "trace.txt"],
    );

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("You are a Python debugging expert."));
    assert!(stdout.contains("```python\ndef divide(a, b):"));
    assert!(stdout.contains("ZeroDivisionError: division by zero"));
}
