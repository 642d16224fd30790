//! Integration tests for the `tailwatch` CLI binary.
//!
//! These tests validate argument parsing, help output, shell completions,
//! list management, and analysis against throwaway Kismet databases. No
//! test touches the user's real configuration or the network.
#![allow(clippy::unwrap_used)]

use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use rusqlite::{Connection, params};
use tempfile::TempDir;

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `tailwatch` binary with env isolation.
///
/// Clears all `TAILWATCH_*` env vars and points home and config
/// directories at `home` so nothing outside the sandbox is read.
fn tailwatch_cmd(home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("tailwatch");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env("XDG_DATA_HOME", home.join(".local/share"))
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("TAILWATCH_CONFIG")
        .env_remove("TAILWATCH_DATABASE")
        .env_remove("TAILWATCH_OUTPUT")
        .env_remove("TAILWATCH_WIGLE_USER")
        .env_remove("TAILWATCH_WIGLE_PASSWORD");
    cmd
}

/// Sandbox with a config file whose lists live inside it.
struct Sandbox {
    dir: TempDir,
    config: PathBuf,
}

impl Sandbox {
    fn new() -> Self {
        Self::with_extra("")
    }

    fn with_extra(extra: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("config.toml");
        let body = format!(
            "[capture]\ndirectory = {captures:?}\n\n[lists]\ndenylist = {deny:?}\nallowlist = {allow:?}\n\n{extra}",
            captures = dir.path().join("captures").display().to_string(),
            deny = dir.path().join("deny.json").display().to_string(),
            allow = dir.path().join("allow.json").display().to_string(),
        );
        std::fs::write(&config, body).unwrap();
        Self { dir, config }
    }

    fn cmd(&self) -> assert_cmd::Command {
        let mut cmd = tailwatch_cmd(self.dir.path());
        cmd.arg("--config").arg(&self.config);
        cmd
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Write a Kismet database with the given `(mac, type, first, last)` rows.
    fn capture(&self, rows: &[(&str, &str, i64, i64)]) -> PathBuf {
        let path = self.path("Kismet-20240601-10-00-00-1.kismet");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE devices (
                first_time INT, last_time INT, devkey TEXT, phyname TEXT, devmac TEXT,
                strongest_signal INT, min_lat REAL, min_lon REAL, max_lat REAL,
                max_lon REAL, avg_lat REAL, avg_lon REAL, bytes_data INT,
                type TEXT, device BLOB
            );",
        )
        .unwrap();
        for (mac, kind, first, last) in rows {
            conn.execute(
                "INSERT INTO devices (devmac, type, first_time, last_time, bytes_data, device,
                                      min_lat, min_lon, avg_lat, avg_lon)
                 VALUES (?1, ?2, ?3, ?4, 2048, '{}', 37.1, -113.5, 37.2, -113.6)",
                params![mac, kind, first, last],
            )
            .unwrap();
        }
        path
    }
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).unwrap()
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let sb = Sandbox::new();
    let output = tailwatch_cmd(sb.dir.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    let sb = Sandbox::new();
    tailwatch_cmd(sb.dir.path()).arg("--help").assert().success().stdout(
        predicate::str::contains("following you")
            .and(predicate::str::contains("analyze"))
            .and(predicate::str::contains("watch"))
            .and(predicate::str::contains("deny")),
    );
}

#[test]
fn test_version_flag() {
    let sb = Sandbox::new();
    tailwatch_cmd(sb.dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("tailwatch"));
}

#[test]
fn test_invalid_subcommand() {
    let sb = Sandbox::new();
    tailwatch_cmd(sb.dir.path())
        .arg("frobnicate")
        .assert()
        .failure()
        .code(2);
}

#[test]
fn test_invalid_output_format() {
    let sb = Sandbox::new();
    sb.cmd()
        .args(["-o", "xml", "deny", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("xml"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_each_shell() {
    let sb = Sandbox::new();
    for shell in ["bash", "zsh", "fish"] {
        tailwatch_cmd(sb.dir.path())
            .args(["completions", shell])
            .assert()
            .success()
            .stdout(predicate::str::contains("tailwatch"));
    }
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path_follows_flag() {
    let sb = Sandbox::new();
    sb.cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(sb.config.display().to_string()));
}

#[test]
fn test_config_show_masks_password() {
    let sb = Sandbox::with_extra("[geo]\nusername = \"AIDtest\"\npassword = \"hunter2\"\n");
    sb.cmd()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("AIDtest")
                .and(predicate::str::contains("****"))
                .and(predicate::str::contains("hunter2").not()),
        );
}

#[test]
fn test_invalid_config_is_reported() {
    let sb = Sandbox::with_extra("[detection]\nreport_limit = 0\n");
    sb.cmd()
        .args(["deny", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("report_limit"));
}

// ── Lists ───────────────────────────────────────────────────────────

#[test]
fn test_deny_add_then_list() {
    let sb = Sandbox::new();
    sb.cmd()
        .args(["deny", "add", "aa-bb-cc-dd-ee-01", "00:03:93:00:00:02"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Denied 2"));

    sb.cmd()
        .args(["-o", "plain", "deny", "list"])
        .assert()
        .success()
        .stdout("00:03:93:00:00:02\nAA:BB:CC:DD:EE:01\n");

    let saved = std::fs::read_to_string(sb.path("deny.json")).unwrap();
    assert_eq!(saved, "[\n  \"00:03:93:00:00:02\",\n  \"AA:BB:CC:DD:EE:01\"\n]\n");

    sb.cmd()
        .args(["deny", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Apple"));
}

#[test]
fn test_deny_remove_reports_json() {
    let sb = Sandbox::new();
    sb.cmd()
        .args(["deny", "add", "AA:BB:CC:DD:EE:01"])
        .assert()
        .success();
    let output = sb
        .cmd()
        .args(["-o", "json", "deny", "rm", "aa:bb:cc:dd:ee:01"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let update = stdout_json(&output);
    assert_eq!(update["changed"], 1);
    assert_eq!(update["total"], 0);
}

#[test]
fn test_malformed_mac_is_usage_error() {
    let sb = Sandbox::new();
    sb.cmd()
        .args(["allow", "add", "not-a-mac"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("not-a-mac"));
}

#[test]
fn test_malformed_list_is_left_unchanged() {
    let sb = Sandbox::new();
    let original = "[\"AA:00:00:00:00:01\",\"AA:00:00:00:00:02\",]";
    std::fs::write(sb.path("deny.json"), original).unwrap();
    sb.cmd()
        .args(["deny", "add", "AA:00:00:00:00:03"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("list_unreadable"));
    assert_eq!(std::fs::read_to_string(sb.path("deny.json")).unwrap(), original);
}

#[test]
fn test_clear_requires_yes_without_terminal() {
    let sb = Sandbox::new();
    sb.cmd()
        .args(["allow", "add", "AA:BB:CC:DD:EE:01"])
        .assert()
        .success();
    sb.cmd().args(["allow", "clear"]).assert().failure().code(2);
    sb.cmd()
        .args(["-y", "allow", "clear"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleared 1"));
}

// ── Analysis ────────────────────────────────────────────────────────

#[test]
fn test_analyze_json_report() {
    let sb = Sandbox::new();
    let db = sb.capture(&[
        ("AA:BB:CC:DD:EE:01", "Wi-Fi Client", 1_700_000_000, 1_700_000_600),
        ("AA:BB:CC:DD:EE:02", "BTLE", 1_700_000_000, 1_700_000_010),
        ("AA:BB:CC:DD:EE:03", "RTL433", 1_700_000_000, 1_700_000_010),
    ]);

    let output = sb
        .cmd()
        .arg("--database")
        .arg(&db)
        .args(["-o", "json", "analyze"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let report = stdout_json(&output);
    assert_eq!(report["total_devices"], 2);
    assert_eq!(report["devices"][0]["identity"], "AA:BB:CC:DD:EE:01");
    assert_eq!(report["devices"][0]["transport"], "wifi");
    assert_eq!(report["devices"][0]["appearances"], 1);
    assert_eq!(report["devices"][0]["is_persistent"], true);
    assert_eq!(report["devices"][1]["transport"], "bluetooth_le");
    assert!(report.get("error").is_none());
}

#[test]
fn test_analyze_finds_newest_capture_in_directory() {
    let sb = Sandbox::new();
    std::fs::create_dir_all(sb.path("captures")).unwrap();
    let db = sb.capture(&[("AA:BB:CC:DD:EE:01", "Wi-Fi AP", 100, 200)]);
    std::fs::rename(&db, sb.path("captures").join("Kismet-20240601-10-00-00-1.kismet")).unwrap();

    sb.cmd()
        .args(["-o", "plain", "analyze"])
        .assert()
        .success()
        .stdout("AA:BB:CC:DD:EE:01\n");
}

#[test]
fn test_analyze_missing_capture_fails() {
    let sb = Sandbox::new();
    sb.cmd()
        .arg("--database")
        .arg(sb.path("absent.kismet"))
        .arg("analyze")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Analysis failed"));
}

#[test]
fn test_deny_auto_excludes_current_devices() {
    let sb = Sandbox::new();
    let db = sb.capture(&[
        ("AA:BB:CC:DD:EE:01", "Wi-Fi Client", 100, 200),
        ("AA:BB:CC:DD:EE:02", "RTL433", 100, 200),
    ]);

    let output = sb
        .cmd()
        .arg("--database")
        .arg(&db)
        .args(["-y", "-o", "json", "deny", "auto"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));
    let outcome = stdout_json(&output);
    assert_eq!(outcome["seen"], 2);
    assert_eq!(outcome["added"], 2);

    let output = sb
        .cmd()
        .arg("--database")
        .arg(&db)
        .args(["-o", "json", "analyze"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["total_devices"], 0);
}

#[test]
fn test_track_prints_position() {
    let sb = Sandbox::new();
    let db = sb.capture(&[("AA:BB:CC:DD:EE:01", "Wi-Fi Client", 100, 200)]);
    sb.cmd()
        .arg("--database")
        .arg(&db)
        .args(["-o", "plain", "track", "aa:bb:cc:dd:ee:01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("37.2,-113.6"));
}

#[test]
fn test_watch_stops_after_passes() {
    let sb = Sandbox::new();
    let db = sb.capture(&[("AA:BB:CC:DD:EE:01", "Wi-Fi Client", 100, 200)]);
    sb.cmd()
        .arg("--database")
        .arg(&db)
        .args(["watch", "--interval", "50ms", "--passes", "2"])
        .timeout(std::time::Duration::from_secs(30))
        .assert()
        .success()
        .stdout(predicate::str::contains("1 devices analyzed"));
}

// ── Geo ─────────────────────────────────────────────────────────────

#[test]
fn test_geo_without_credentials() {
    let sb = Sandbox::new();
    sb.cmd()
        .args(["geo", "lookup", "HomeNet"])
        .assert()
        .failure()
        .code(3);
}
