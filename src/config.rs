//! Configuration loading and management
//!
//! Handles parsing of `tasksphere.toml` in the data directory.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// File name of the configuration inside the data directory
pub const CONFIG_FILE: &str = "tasksphere.toml";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Authentication configuration
    #[serde(default)]
    pub auth: AuthConfig,

    /// Task store configuration
    #[serde(default)]
    pub tasks: TasksConfig,
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Simulated network latency for login, signup and reset
    #[serde(default = "default_latency_ms")]
    pub latency_ms: u64,
}

fn default_latency_ms() -> u64 {
    1000
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            latency_ms: default_latency_ms(),
        }
    }
}

impl AuthConfig {
    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }
}

/// Task store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TasksConfig {
    /// Project assigned to tasks created without one
    #[serde(default = "default_project")]
    pub default_project: String,

    /// Seed the demo dataset when both collections are empty
    #[serde(default = "default_seed_on_empty")]
    pub seed_on_empty: bool,
}

fn default_project() -> String {
    "default".to_string()
}

fn default_seed_on_empty() -> bool {
    true
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            default_project: default_project(),
            seed_on_empty: default_seed_on_empty(),
        }
    }
}

impl Config {
    /// Load configuration from a `tasksphere.toml` file
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a data directory, or return defaults
    pub fn load_from_dir(dir: &Path) -> Self {
        let config_path = dir.join(CONFIG_FILE);
        if !config_path.exists() {
            return Self::default();
        }
        match Self::load(&config_path) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(path = %config_path.display(), %err, "ignoring invalid config");
                Self::default()
            }
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> crate::error::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> crate::error::Result<()> {
        if self.tasks.default_project.trim().is_empty() {
            return Err(crate::error::Error::InvalidConfig(
                "tasks.default_project cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn defaults_are_expected() {
        let cfg = Config::default();
        assert_eq!(cfg.auth.latency_ms, 1000);
        assert_eq!(cfg.tasks.default_project, "default");
        assert!(cfg.tasks.seed_on_empty);
    }

    #[test]
    fn load_parses_overrides() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        let content = r#"
[auth]
latency_ms = 0

[tasks]
default_project = "inbox"
seed_on_empty = false
"#;
        fs::write(&path, content.trim()).expect("write config");

        let cfg = Config::load(&path).expect("load config");
        assert_eq!(cfg.auth.latency_ms, 0);
        assert_eq!(cfg.auth.latency(), Duration::ZERO);
        assert_eq!(cfg.tasks.default_project, "inbox");
        assert!(!cfg.tasks.seed_on_empty);
    }

    #[test]
    fn blank_default_project_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "[tasks]\ndefault_project = \"  \"\n").expect("write config");

        let err = Config::load(&path).expect_err("invalid config");
        match err {
            crate::error::Error::InvalidConfig(_) => {}
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn retired_iteration_key_is_ignored() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "[auth]\nlatency_ms = 5\npbkdf2_iterations = 200000\n")
            .expect("write config");

        let cfg = Config::load(&path).expect("load config");
        assert_eq!(cfg.auth.latency_ms, 5);
    }

    #[test]
    fn load_from_dir_defaults_when_missing_or_invalid() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = Config::load_from_dir(dir.path());
        assert_eq!(cfg.auth.latency_ms, 1000);

        fs::write(dir.path().join(CONFIG_FILE), "[tasks]\ndefault_project = \"\"\n")
            .expect("write config");
        let cfg = Config::load_from_dir(dir.path());
        assert_eq!(cfg.tasks.default_project, "default");
    }

    #[test]
    fn save_writes_toml() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.toml");
        Config::default().save(&path).expect("save config");

        let written = fs::read_to_string(&path).expect("read config");
        assert!(written.contains("latency_ms = 1000"));
        assert!(written.contains("default_project = \"default\""));
    }
}
