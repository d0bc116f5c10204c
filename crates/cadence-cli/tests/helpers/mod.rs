#![allow(dead_code)]

use assert_cmd::Command;
use std::path::PathBuf;
use tempfile::TempDir;

pub const OWNER_ID: &str = "0190c5a2-0000-7000-8000-000000000001";
pub const OTHER_ID: &str = "0190c5a2-0000-7000-8000-000000000002";

/// Runs the `cadence` binary against a throwaway database.
pub struct CliTestHarness {
    temp_dir: TempDir,
    db_path: PathBuf,
}

impl CliTestHarness {
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test.db");

        Self { temp_dir, db_path }
    }

    /// A command acting as [`OWNER_ID`]. The working directory is the temp dir so
    /// no stray `cadence.toml` is picked up.
    pub fn command(&self) -> Command {
        self.command_as(OWNER_ID, "user")
    }

    pub fn command_as(&self, actor_id: &str, role: &str) -> Command {
        let mut cmd = Command::cargo_bin("cadence").expect("Failed to find cadence binary");
        cmd.current_dir(self.temp_dir.path())
            .env_remove("RUST_LOG")
            .env("CADENCE_DATABASE_PATH", &self.db_path)
            .env("CADENCE_ACTOR_ID", actor_id)
            .env("CADENCE_ACTOR_ROLE", role);
        cmd
    }

    pub fn run_success(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.command().args(args).assert().success()
    }

    pub fn run_failure(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.command().args(args).assert().failure()
    }

    /// Runs a successful command and returns its stdout without color codes.
    pub fn stdout_of(&self, args: &[&str]) -> String {
        let output = self.run_success(args).get_output().stdout.clone();
        strip_ansi(&String::from_utf8_lossy(&output))
    }

    /// Adds a series and returns its full id.
    pub fn add_series(&self, args: &[&str]) -> String {
        let mut full = vec!["add"];
        full.extend_from_slice(args);
        let stdout = self.stdout_of(&full);
        extract_id(&stdout, "Series ID:").expect("add printed no series id")
    }
}

/// Pulls the value printed after `label`.
pub fn extract_id(stdout: &str, label: &str) -> Option<String> {
    stdout
        .lines()
        .find_map(|line| line.split_once(label))
        .map(|(_, rest)| rest.trim().to_string())
}

pub fn strip_ansi(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();
    while let Some(c) = chars.next() {
        if c == '\u{1b}' {
            for next in chars.by_ref() {
                if next.is_ascii_alphabetic() {
                    break;
                }
            }
        } else {
            out.push(c);
        }
    }
    out
}

pub mod assertions {
    use predicates::prelude::*;

    pub fn has_error() -> impl Predicate<str> {
        predicate::str::contains("Error")
    }

    pub fn created_successfully() -> impl Predicate<str> {
        predicate::str::contains("✓").and(predicate::str::contains("Series ID"))
    }
}
