//! Binary-level tests for the `reforge` CLI.

use std::fs;
use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

const DB_SYNC: &str = r#"#!/usr/bin/env python3
"""Synchronise the reporting database."""
import logging
import os
import sqlite3
from pathlib import Path

logger = logging.getLogger(__name__)
DB_PATH = Path(os.environ.get("DB_PATH", "data/app.db"))


def sync(rows: list) -> int:
    try:
        with sqlite3.connect(DB_PATH) as conn:
            for row in rows:
                conn.execute("INSERT INTO t VALUES (?)", (row,))
    except sqlite3.Error as exc:
        logger.error("sync failed: %s", exc)
        return 1
    return 0


if __name__ == "__main__":
    raise SystemExit(sync([]))
"#;

/// A workspace with its own config file so no test touches the user's
/// catalog or config directory.
struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new(catalog: &str) -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("scripts")).unwrap();
        let config = format!(
            "[catalog]\nbackend = \"{catalog}\"\npath = \"{}\"\n\n[discovery]\nroot = \"{}\"\n",
            dir.path().join("catalog.db").display(),
            dir.path().join("scripts").display()
        );
        fs::write(dir.path().join("reforge.toml"), config).unwrap();
        Self { dir }
    }

    fn write(&self, relative: &str, content: &str) {
        let path = self.dir.path().join("scripts").join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn cmd(&self) -> assert_cmd::Command {
        let mut cmd = cargo_bin_cmd!("reforge");
        cmd.current_dir(self.path())
            .env_remove("RUST_LOG")
            .arg("--no-color")
            .arg("--config")
            .arg(self.path().join("reforge.toml"));
        cmd
    }
}

// ============================================================================
// Surface
// ============================================================================

#[test]
fn help_lists_subcommands() {
    cargo_bin_cmd!("reforge")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("analyze"))
        .stdout(predicate::str::contains("templates"));
}

#[test]
fn version_flag() {
    cargo_bin_cmd!("reforge")
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn unknown_category_is_a_usage_error() {
    cargo_bin_cmd!("reforge")
        .args(["run", "--category", "astrology"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("database"));
}

#[test]
fn shell_completions() {
    cargo_bin_cmd!("reforge")
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("reforge"));
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn config_show_reflects_file_and_env() {
    let ws = Workspace::new("memory");
    ws.cmd()
        .env("REFORGE_REGENERATION__ENVIRONMENT", "staging")
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("backend = \"memory\""))
        .stdout(predicate::str::contains("environment = \"staging\""));
}

#[test]
fn missing_config_file_exits_with_configuration_code() {
    cargo_bin_cmd!("reforge")
        .args(["--config", "/definitely/not/here.toml", "config", "show"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("Configuration error"));
}

// ============================================================================
// analyze
// ============================================================================

#[test]
fn analyze_reports_gate_as_json() {
    let ws = Workspace::new("memory");
    ws.write("db_sync.py", DB_SYNC);

    let output = ws
        .cmd()
        .args(["--output-format", "json", "analyze"])
        .arg(ws.path().join("scripts").join("db_sync.py"))
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(json["analysis"]["category"], "database");
    assert_eq!(json["verdict"]["accepted"], true);
}

#[test]
fn analyze_trivial_script_is_below_gate() {
    let ws = Workspace::new("memory");
    ws.write("foo.py", "def foo():\n    pass\n");

    ws.cmd()
        .args(["--output-format", "plain", "analyze"])
        .arg(ws.path().join("scripts").join("foo.py"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Below the extraction gate"));
}

#[test]
fn analyze_missing_file_is_not_found() {
    let ws = Workspace::new("memory");
    ws.cmd()
        .args(["analyze", "nope.py"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("File not found"));
}

// ============================================================================
// run + templates
// ============================================================================

#[test]
fn run_persists_templates_to_sqlite() {
    let ws = Workspace::new("sqlite");
    ws.write("db/db_sync.py", DB_SYNC);
    ws.write("foo.py", "def foo():\n    pass\n");

    let output = ws
        .cmd()
        .args(["--output-format", "json", "run"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let summary: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(summary["total"], 2);
    assert_eq!(summary["validated"], 1);
    assert_eq!(summary["skipped"], 1);
    assert_eq!(summary["by_category"]["database"], 1);
    assert!(summary["duration_seconds"].is_number());

    ws.cmd()
        .args(["--output-format", "plain", "templates", "--format", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("db_sync"));
}

#[test]
fn run_with_failures_exits_five() {
    let ws = Workspace::new("memory");
    ws.write("db_sync.py", DB_SYNC);
    ws.write("broken.py", "def broken(:\n    pass\n");

    ws.cmd()
        .args(["--output-format", "plain", "run"])
        .assert()
        .code(5)
        .stdout(predicate::str::contains("PARSE_ERROR"))
        .stderr(predicate::str::contains("did not regenerate cleanly"));
}

#[test]
fn run_missing_root_is_not_found() {
    let ws = Workspace::new("memory");
    ws.cmd()
        .args(["run", "--root"])
        .arg(ws.path().join("absent"))
        .assert()
        .code(3);
}

#[test]
fn quiet_run_prints_nothing_on_success() {
    let ws = Workspace::new("memory");
    ws.write("db_sync.py", DB_SYNC);

    ws.cmd()
        .args(["--quiet", "--output-format", "plain", "run"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}
