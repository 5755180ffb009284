//! Filesystem primitives.

use std::fs;

use serde_json::Value;
use tracing::debug;

use super::{TaskContext, TaskPrimitive, param_str, parse_mode};
use crate::error::BuildError;

/// `chmod(mode, path...)`: set the permission bits of one or more paths.
pub struct Chmod;

impl TaskPrimitive for Chmod {
  fn run(&self, ctx: &mut TaskContext<'_>, params: &[Value]) -> Result<(), BuildError> {
    let (mode, paths) = match params {
      [mode, paths @ ..] if !paths.is_empty() => (parse_mode("chmod", mode)?, paths),
      _ => return Err(BuildError::invalid("chmod", "expected a mode and at least one path")),
    };

    for path in paths {
      let path = ctx.resolve_path(&param_str("chmod", path)?);
      debug!(path = %path.display(), mode = %format!("{:o}", mode), "changing permissions");
      set_mode(&path, mode).map_err(|e| BuildError::TaskFailed {
        task: "chmod".to_string(),
        message: format!("{}: {}", path.display(), e),
      })?;
    }
    Ok(())
  }
}

#[cfg(unix)]
fn set_mode(path: &std::path::Path, mode: u32) -> std::io::Result<()> {
  use std::os::unix::fs::PermissionsExt;
  fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_mode(_path: &std::path::Path, _mode: u32) -> std::io::Result<()> {
  Err(std::io::Error::new(
    std::io::ErrorKind::Unsupported,
    "permission modes are only supported on unix",
  ))
}

/// `mkdir(path...)`: create directories and their parents.
pub struct Mkdir;

impl TaskPrimitive for Mkdir {
  fn run(&self, ctx: &mut TaskContext<'_>, params: &[Value]) -> Result<(), BuildError> {
    if params.is_empty() {
      return Err(BuildError::invalid("mkdir", "expected at least one path"));
    }
    for path in params {
      let path = ctx.resolve_path(&param_str("mkdir", path)?);
      debug!(path = %path.display(), "creating directory");
      fs::create_dir_all(&path)?;
    }
    Ok(())
  }
}

/// `copy(from, to)`: copy a file. Copying onto a directory keeps the file name.
pub struct CopyFile;

impl TaskPrimitive for CopyFile {
  fn run(&self, ctx: &mut TaskContext<'_>, params: &[Value]) -> Result<(), BuildError> {
    let [from, to] = params else {
      return Err(BuildError::invalid("copy", "expected a source and a destination"));
    };
    let from = ctx.resolve_path(&param_str("copy", from)?);
    let mut to = ctx.resolve_path(&param_str("copy", to)?);
    if to.is_dir() {
      if let Some(name) = from.file_name() {
        to = to.join(name);
      }
    }

    debug!(from = %from.display(), to = %to.display(), "copying file");
    fs::copy(&from, &to).map_err(|e| BuildError::TaskFailed {
      task: "copy".to_string(),
      message: format!("{} -> {}: {}", from.display(), to.display(), e),
    })?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::output::MemorySink;
  use crate::task::TaskCatalog;
  use serde_json::json;
  use tempfile::TempDir;

  fn run(temp: &TempDir, name: &str, params: &[Value]) -> Result<(), BuildError> {
    let catalog = TaskCatalog::with_builtins();
    let mut sink = MemorySink::new();
    let mut ctx = TaskContext::new(&catalog, &mut sink, temp.path());
    ctx.task(name, params)
  }

  #[cfg(unix)]
  #[test]
  fn chmod_sets_mode_on_every_path() {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("a.sh"), "").unwrap();
    fs::write(temp.path().join("b.sh"), "").unwrap();

    run(&temp, "chmod", &[json!(750), json!("a.sh"), json!("b.sh")]).unwrap();

    for name in ["a.sh", "b.sh"] {
      let mode = fs::metadata(temp.path().join(name)).unwrap().permissions().mode();
      assert_eq!(mode & 0o7777, 0o750, "{name}");
    }
  }

  #[test]
  fn chmod_without_path_is_invalid() {
    let temp = TempDir::new().unwrap();
    assert!(matches!(
      run(&temp, "chmod", &[json!(777)]),
      Err(BuildError::InvalidParameters { .. })
    ));
  }

  #[test]
  fn chmod_missing_file_fails() {
    let temp = TempDir::new().unwrap();
    assert!(matches!(
      run(&temp, "chmod", &[json!("0644"), json!("missing")]),
      Err(BuildError::TaskFailed { .. })
    ));
  }

  #[test]
  fn mkdir_creates_parents() {
    let temp = TempDir::new().unwrap();
    run(&temp, "mkdir", &[json!("out/bin"), json!("out/lib")]).unwrap();
    assert!(temp.path().join("out/bin").is_dir());
    assert!(temp.path().join("out/lib").is_dir());
  }

  #[test]
  fn copy_into_directory_keeps_name() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("tool"), "bin").unwrap();
    fs::create_dir(temp.path().join("dist")).unwrap();

    run(&temp, "copy", &[json!("tool"), json!("dist")]).unwrap();

    assert_eq!(fs::read_to_string(temp.path().join("dist/tool")).unwrap(), "bin");
  }

  #[test]
  fn copy_requires_two_params() {
    let temp = TempDir::new().unwrap();
    assert!(matches!(
      run(&temp, "copy", &[json!("only")]),
      Err(BuildError::InvalidParameters { .. })
    ));
  }
}
