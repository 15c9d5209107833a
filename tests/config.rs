use std::fs;

use tasksphere::config::{Config, CONFIG_FILE};

#[test]
fn load_from_dir_defaults_on_invalid_config() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join(CONFIG_FILE), "[auth]\nlatency_ms = \"slow\"\n")
        .expect("write invalid config");

    let cfg = Config::load_from_dir(dir.path());
    assert_eq!(cfg.auth.latency_ms, 1000);
    assert_eq!(cfg.tasks.default_project, "default");
}

#[test]
fn partial_config_keeps_other_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join(CONFIG_FILE), "[tasks]\nseed_on_empty = false\n")
        .expect("write config");

    let cfg = Config::load_from_dir(dir.path());
    assert!(!cfg.tasks.seed_on_empty);
    assert_eq!(cfg.tasks.default_project, "default");
    assert_eq!(cfg.auth.latency_ms, 1000);
}

#[test]
fn saved_config_loads_back() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join(CONFIG_FILE);

    let mut cfg = Config::default();
    cfg.auth.latency_ms = 5;
    cfg.tasks.default_project = "inbox".to_string();
    cfg.save(&path)?;

    let loaded = Config::load(&path)?;
    assert_eq!(loaded.auth.latency_ms, 5);
    assert_eq!(loaded.tasks.default_project, "inbox");
    Ok(())
}
