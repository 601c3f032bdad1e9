//! Common utilities for integration tests

pub mod cli;

use std::path::{Path, PathBuf};

/// Write a config file rooting every hostwatch path under `base_dir`
pub fn write_config(base_dir: &Path, extra: &str) -> PathBuf {
    let path = base_dir.join("hostwatch.toml");
    let contents = format!("base_dir = {:?}\n{}", base_dir.display().to_string(), extra);
    std::fs::write(&path, contents).expect("Failed to write config");
    path
}
