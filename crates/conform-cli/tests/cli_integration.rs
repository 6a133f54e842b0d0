//! Integration tests for the `conform` binary.
//!
//! Each test writes a manifest into a temporary directory and runs the
//! built binary against it.

use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

const LOGGERS: &str = r#"
[[interface]]
name = "Logger"
methods = ["log(string) -> void", "level() -> int readonly"]

[[type]]
name = "FileLogger"
methods = ["log(string) -> void", "level() -> int readonly nothrow", "flush()"]

[[type]]
name = "NetLogger"
methods = ["log(bytes) -> void"]

[[permit]]
interface = "Logger"
type = "FileLogger"
"#;

fn write_manifest(source: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("conform.toml");
    std::fs::write(&path, source).expect("write manifest");
    (dir, path)
}

fn conform(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_conform"))
        .args(args)
        .env("NO_COLOR", "1")
        .env_remove("CONFORM_LOG")
        .output()
        .expect("failed to run conform")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

// ────────────────────────────────────────────────────────────────────────────
// check
// ────────────────────────────────────────────────────────────────────────────

#[test]
fn test_check_passes_when_permitted_pairs_conform() {
    let (_dir, path) = write_manifest(LOGGERS);
    let output = conform(&["check", path.to_str().unwrap()]);
    let text = stdout(&output);

    assert!(output.status.success(), "stdout:\n{}", text);
    assert!(text.contains("PASS"));
    assert!(text.contains("FileLogger as Logger"));
    assert!(text.contains("SKIP"));
    assert!(text.contains("2 pair(s) checked: 1 compatible, 1 incompatible"));
    // Unpermitted pairs are not explained unless selected
    assert!(!text.contains("E0101"));
}

#[test]
fn test_check_fails_on_permitted_incompatible_pair() {
    let source = format!("{}\n[[permit]]\ninterface = \"Logger\"\ntype = \"NetLogger\"\n", LOGGERS);
    let (_dir, path) = write_manifest(&source);
    let output = conform(&["check", path.to_str().unwrap()]);
    let text = stdout(&output);

    assert!(!output.status.success());
    assert!(text.contains("FAIL"));
    assert!(text.contains("error[E0103]"), "stdout:\n{}", text);
    assert!(text.contains("error[E0101]"), "stdout:\n{}", text);
    assert!(text.contains("1 permitted pair(s) incompatible"));
}

#[test]
fn test_check_selected_pair_explains_mismatches() {
    let (_dir, path) = write_manifest(LOGGERS);
    let output = conform(&[
        "check",
        path.to_str().unwrap(),
        "--interface",
        "Logger",
        "--type",
        "NetLogger",
    ]);
    let text = stdout(&output);

    // Not permitted, so not a failure
    assert!(output.status.success());
    assert!(text.contains("1 pair(s) checked"));
    assert!(text.contains("error[E0101]"), "stdout:\n{}", text);
}

#[test]
fn test_check_unknown_interface() {
    let (_dir, path) = write_manifest(LOGGERS);
    let output = conform(&["check", path.to_str().unwrap(), "--interface", "Sink"]);

    assert!(!output.status.success());
    let err = String::from_utf8_lossy(&output.stderr);
    assert!(err.contains("no interface named 'Sink'"), "stderr:\n{}", err);
}

#[test]
fn test_check_json_report() {
    let (_dir, path) = write_manifest(LOGGERS);
    let output = conform(&["check", path.to_str().unwrap(), "--format", "json"]);
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(report["ok"], true);
    let pairs = report["pairs"].as_array().unwrap();
    assert_eq!(pairs.len(), 2);
    assert_eq!(pairs[0]["type"], "FileLogger");
    assert_eq!(pairs[0]["compatible"], true);
    assert_eq!(pairs[0]["permitted"], true);
    assert_eq!(pairs[1]["compatible"], false);
    assert_eq!(pairs[1]["mismatches"][0]["reason"]["kind"], "type_mismatch");
    assert_eq!(pairs[1]["mismatches"][1]["reason"]["kind"], "missing");
}

#[test]
fn test_check_invalid_signature() {
    let (_dir, path) = write_manifest("[[interface]]\nname = \"Logger\"\nmethods = [\"log(string\"]\n");
    let output = conform(&["check", path.to_str().unwrap()]);
    let text = stdout(&output);

    assert!(!output.status.success());
    assert!(text.contains("error[E0010]"), "stdout:\n{}", text);
    assert!(text.contains("Logger signature"));
}

#[test]
fn test_check_invalid_signature_json() {
    let (_dir, path) = write_manifest("[[interface]]\nname = \"Logger\"\nmethods = [\"log(string\"]\n");
    let output = conform(&["check", path.to_str().unwrap(), "--format", "json"]);
    assert!(!output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(report["ok"], false);
    assert_eq!(report["errors"][0]["code"], "E0010");
}

#[test]
fn test_check_missing_manifest() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");
    let output = conform(&["check", path.to_str().unwrap()]);

    assert!(!output.status.success());
    let err = String::from_utf8_lossy(&output.stderr);
    assert!(err.contains("cannot load"), "stderr:\n{}", err);
}

// ────────────────────────────────────────────────────────────────────────────
// inspect
// ────────────────────────────────────────────────────────────────────────────

#[test]
fn test_inspect_lists_groups_and_slots() {
    let source = r#"
[[interface]]
name = "Canvas"
methods = ["draw(int, int) -> void", "draw(float, float) -> void", "clear()"]

[[type]]
name = "Screen"
methods = ["draw(int, int) -> void", "clear()"]

[[permit]]
interface = "Canvas"
type = "Screen"
"#;
    let (_dir, path) = write_manifest(source);
    let output = conform(&["inspect", path.to_str().unwrap()]);
    let text = stdout(&output);

    assert!(output.status.success(), "stdout:\n{}", text);
    assert!(text.contains("interface Canvas"));
    assert!(text.contains("(2 overloads)"));
    assert!(text.contains("#0   draw(int, int) -> void"));
    assert!(text.contains("#1   draw(float, float) -> void"));
    assert!(text.contains("#2   clear() -> void"));
    assert!(text.contains("type Screen"));
    assert!(text.contains("Screen as Canvas"));
}
