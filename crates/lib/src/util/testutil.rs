//! Test utilities for hearth-lib.

use std::path::{Path, PathBuf};

/// Write `content` to `relative` under `root`, creating parent directories.
pub fn write_file(root: &Path, relative: &str, content: &str) -> PathBuf {
  let path = root.join(relative);
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent).unwrap();
  }
  std::fs::write(&path, content).unwrap();
  path
}

/// Manifest text declaring a single leaf target.
pub fn leaf_manifest(name: &str, file: &str, class: &str) -> String {
  format!("targets:\n  {name}:\n    file: {file}\n    class: {class}\n")
}
