#![allow(dead_code)]

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

pub const EMAIL: &str = "ada@example.com";
pub const PASSWORD: &str = "analytical-engine";

/// A throwaway data directory with instant auth and no demo seed.
pub struct TestHome {
    dir: TempDir,
}

impl TestHome {
    pub fn new() -> Self {
        Self::with_seed(false)
    }

    pub fn with_seed(seed: bool) -> Self {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        let config = format!(
            "[auth]\nlatency_ms = 0\n\n[tasks]\nseed_on_empty = {seed}\n"
        );
        fs::write(dir.path().join("tasksphere.toml"), config).expect("write config");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn cmd(&self) -> Command {
        let mut cmd = tasksphere_cmd();
        cmd.env("TASKSPHERE_HOME", self.path());
        cmd
    }

    /// Run with `--json`, require success, return the envelope.
    pub fn json(&self, args: &[&str]) -> Value {
        let output = self
            .cmd()
            .args(args)
            .arg("--json")
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        serde_json::from_slice(&output).expect("json envelope")
    }

    /// Run with `--json`, require the given exit code, return the envelope.
    pub fn json_failure(&self, args: &[&str], code: i32) -> Value {
        let output = self
            .cmd()
            .args(args)
            .arg("--json")
            .assert()
            .code(code)
            .get_output()
            .stdout
            .clone();
        serde_json::from_slice(&output).expect("json error envelope")
    }

    pub fn signup(&self) -> Value {
        self.json(&[
            "signup", "--name", "Ada", "--email", EMAIL, "--password", PASSWORD,
        ])
    }

    /// Create a task and return its id.
    pub fn add_task(&self, args: &[&str]) -> String {
        let mut full = vec!["task", "add"];
        full.extend_from_slice(args);
        let value = self.json(&full);
        value["data"]["id"].as_str().expect("task id").to_string()
    }

    pub fn read_json(&self, name: &str) -> Value {
        let raw = fs::read_to_string(self.path().join(name)).expect("read store file");
        serde_json::from_str(&raw).expect("store file json")
    }
}

pub fn tasksphere_cmd() -> Command {
    let mut cmd = Command::cargo_bin("tasksphere").expect("binary");
    cmd.env_remove("TASKSPHERE_HOME")
        .env_remove("TASKSPHERE_PASSWORD")
        .env_remove("RUST_LOG");
    cmd
}
