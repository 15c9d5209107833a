//! Data directory resolution.
//!
//! Order: explicit `--data-dir`, then `TASKSPHERE_HOME`, then the platform
//! data directory (e.g. `~/.local/share/tasksphere` on Linux).

use std::path::{Path, PathBuf};

use directories::ProjectDirs;

use crate::error::{Error, Result};

pub const HOME_ENV: &str = "TASKSPHERE_HOME";

pub fn resolve_data_dir(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = explicit {
        return Ok(dir.to_path_buf());
    }
    if let Some(dir) = std::env::var_os(HOME_ENV).filter(|value| !value.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    platform_data_dir().ok_or_else(|| {
        Error::InvalidConfig(format!(
            "no home directory found; pass --data-dir or set {HOME_ENV}"
        ))
    })
}

pub fn platform_data_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "tasksphere").map(|dirs| dirs.data_dir().to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_dir_wins() {
        let dir = Path::new("/tmp/tasksphere-explicit");
        assert_eq!(resolve_data_dir(Some(dir)).unwrap(), dir);
    }
}
