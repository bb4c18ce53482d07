//! CLI Integration Tests
//!
//! These tests drive the `tlog` binary against a temporary log directory.
//!
//! ```
//! cargo test --package tlog-cli --test cli_integration
//! ```

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

/// Run tlog with `--dir` pointing at `dir`.
fn run_tlog(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tlog"))
        .env_remove("TLOG_DIR")
        .env_remove("RUST_LOG")
        .arg("--dir")
        .arg(dir)
        .args(args)
        .output()
        .expect("Failed to run tlog binary")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// Temp dir holding a generated full day for 2025-12-21.
fn generated_day() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let output = run_tlog(tmp.path(), &["generate", "2025-12-21", "--seed", "7"]);
    assert!(output.status.success(), "generate failed: {}", stderr(&output));
    tmp
}

// =============================================================================
// Help and Version Tests
// =============================================================================

#[test]
fn test_help_command() {
    let tmp = TempDir::new().unwrap();
    let output = run_tlog(tmp.path(), &["--help"]);
    assert!(output.status.success());

    let text = stdout(&output);
    for command in ["list", "show", "stats", "export", "cleanup", "generate", "completions"] {
        assert!(text.contains(command), "help should mention {command}");
    }
}

#[test]
fn test_version_command() {
    let tmp = TempDir::new().unwrap();
    let output = run_tlog(tmp.path(), &["--version"]);
    assert!(output.status.success());
    assert!(stdout(&output).starts_with("tlog "));
}

#[test]
fn test_completions_bash() {
    let tmp = TempDir::new().unwrap();
    let output = run_tlog(tmp.path(), &["completions", "bash"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("tlog"));
}

#[test]
fn test_invalid_minute_rejected() {
    let tmp = TempDir::new().unwrap();
    let output = run_tlog(tmp.path(), &["show", "2025-12-21", "--minute", "24:00"]);
    assert!(!output.status.success());
}

// =============================================================================
// Data Tests
// =============================================================================

#[test]
fn test_list_empty_dir() {
    let tmp = TempDir::new().unwrap();
    let output = run_tlog(&tmp.path().join("missing"), &["list"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("No day files found."));
}

#[test]
fn test_generate_writes_full_file() {
    let tmp = generated_day();
    let path = tmp.path().join("log_20251221.bin");
    assert_eq!(std::fs::metadata(&path).unwrap().len(), 17292);

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(&bytes[0..4], b"TLOG");
    assert_eq!(u16::from_le_bytes([bytes[9], bytes[10]]), 1440);
}

#[test]
fn test_generate_refuses_overwrite() {
    let tmp = generated_day();
    let output = run_tlog(tmp.path(), &["generate", "2025-12-21"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("--force"));

    let output = run_tlog(tmp.path(), &["generate", "2025-12-21", "--force", "-q"]);
    assert!(output.status.success());
}

#[test]
fn test_list_json() {
    let tmp = generated_day();
    let output = run_tlog(tmp.path(), &["list", "--format", "json"]);
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let days = value.as_array().unwrap();
    assert_eq!(days.len(), 1);
    assert_eq!(days[0]["date"], "2025-12-21");
    assert_eq!(days[0]["file"], "log_20251221.bin");
    assert_eq!(days[0]["samples"], 1440);
}

#[test]
fn test_show_single_minute() {
    let tmp = generated_day();
    let output = run_tlog(tmp.path(), &["show", "2025-12-21", "--minute", "12:00"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("12:00"));
}

#[test]
fn test_show_range_csv() {
    let tmp = generated_day();
    let output = run_tlog(
        tmp.path(),
        &["show", "20251221", "--from", "06:00", "--to", "06:59", "--step", "15", "-f", "csv"],
    );
    assert!(output.status.success());

    let text = stdout(&output);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "t,temp,hum,heat,setpoint,press");
    assert_eq!(lines.len(), 5);
    assert!(lines[1].starts_with("06:00,"));
    assert!(lines[4].starts_with("06:45,"));
}

#[test]
fn test_show_missing_day() {
    let tmp = TempDir::new().unwrap();
    let output = run_tlog(tmp.path(), &["show", "2025-12-21"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Failed to load 2025-12-21"));
}

#[test]
fn test_stats_json() {
    let tmp = generated_day();
    let output = run_tlog(tmp.path(), &["stats", "2025-12-21", "-f", "json", "--compact"]);
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(value["valid_samples"], 1440);
    assert!(value["heater_on_minutes"].as_u64().unwrap() > 0);
    let min = value["min_temperature"].as_f64().unwrap();
    let max = value["max_temperature"].as_f64().unwrap();
    assert!(min < max);
}

#[test]
fn test_export_json_decimated() {
    let tmp = generated_day();
    let output = run_tlog(tmp.path(), &["export", "2025-12-21", "--step", "60"]);
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(value["date"], "2025-12-21");
    assert_eq!(value["samples"], 1440);
    let data = value["data"].as_array().unwrap();
    assert_eq!(data.len(), 24);
    assert_eq!(data[1]["t"], "01:00");
}

#[test]
fn test_export_binary_to_file() {
    let tmp = generated_day();
    let out = tmp.path().join("copy.bin");
    let output = run_tlog(
        tmp.path(),
        &["export", "2025-12-21", "-f", "bin", "-o", out.to_str().unwrap()],
    );
    assert!(output.status.success());

    let original = std::fs::read(tmp.path().join("log_20251221.bin")).unwrap();
    assert_eq!(std::fs::read(&out).unwrap(), original);
}

#[test]
fn test_cleanup_keeps_window() {
    let tmp = TempDir::new().unwrap();
    for date in ["2025-12-01", "2025-12-20", "2025-12-21"] {
        let output = run_tlog(tmp.path(), &["generate", date, "--seed", "1", "--until", "10"]);
        assert!(output.status.success());
    }

    let output = run_tlog(tmp.path(), &["cleanup", "--keep", "2", "--today", "2025-12-21"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("Removed log_20251201.bin"));

    assert!(!tmp.path().join("log_20251201.bin").exists());
    assert!(tmp.path().join("log_20251220.bin").exists());
    assert!(tmp.path().join("log_20251221.bin").exists());
}
