//! Shared test utilities for ncv-infrastructure tests

#![allow(dead_code)] // Test utilities may not all be used in every test file

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Settings file declaring a small texture hierarchy and one rule
pub const BASIC_SETTINGS: &str = r#"
[validation]
unmatched = "fail"
excluded_directories = ["/Game/Legacy"]

[pipeline]
max_workers = 2
chunk_size = 64

[[classes]]
name = "Asset"

[[classes]]
name = "Texture"
parent = "Asset"

[[classes]]
name = "Texture2D"
parent = "Texture"

[[rules]]
id = "texture"
target = "Texture"
pattern = "{PREFIX:T_}{ALPHANUM}"
"#;

/// Write `content` to `dir/name`, creating parent directories
pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

/// Temporary directory holding `ncv.toml` with `content`
pub fn settings_dir(content: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = write_file(dir.path(), "ncv.toml", content);
    (dir, path)
}
