//! Task primitives.
//!
//! Task units perform their work by invoking named primitives through a
//! [`TaskContext`]. The engine does not interpret primitive parameters: each
//! [`TaskPrimitive`] validates its own and reports problems as
//! [`BuildError::InvalidParameters`].
//!
//! # Built-in primitives
//!
//! - `chmod(mode, path...)` - change file permissions ([`fs::Chmod`])
//! - `mkdir(path...)` - create directories ([`fs::Mkdir`])
//! - `copy(from, to)` - copy a file ([`fs::CopyFile`])
//! - `exec(program, args...)` - run a program ([`exec::Exec`])
//! - `echo(text...)` - print a line ([`Echo`])

pub mod exec;
pub mod fs;
mod params;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::info;

use crate::error::BuildError;
use crate::output::{OutputSink, StyleConfig};

pub use params::{param_str, parse_mode};

/// A built-in build action addressed by name.
pub trait TaskPrimitive {
  fn run(&self, ctx: &mut TaskContext<'_>, params: &[Value]) -> Result<(), BuildError>;
}

/// Name-addressed registry of task primitives.
#[derive(Default)]
pub struct TaskCatalog {
  tasks: HashMap<String, Box<dyn TaskPrimitive>>,
}

impl TaskCatalog {
  /// An empty catalog.
  pub fn new() -> Self {
    Self::default()
  }

  /// A catalog holding every built-in primitive.
  pub fn with_builtins() -> Self {
    let mut catalog = Self::new();
    catalog
      .register("chmod", fs::Chmod)
      .register("mkdir", fs::Mkdir)
      .register("copy", fs::CopyFile)
      .register("exec", exec::Exec)
      .register("echo", Echo);
    catalog
  }

  /// Register a primitive, replacing any previous one with the same name.
  pub fn register(&mut self, name: &str, task: impl TaskPrimitive + 'static) -> &mut Self {
    self.tasks.insert(name.to_string(), Box::new(task));
    self
  }

  pub fn get(&self, name: &str) -> Option<&dyn TaskPrimitive> {
    self.tasks.get(name).map(|t| t.as_ref())
  }

  /// Registered names, sorted.
  pub fn names(&self) -> Vec<&str> {
    let mut names: Vec<&str> = self.tasks.keys().map(String::as_str).collect();
    names.sort_unstable();
    names
  }
}

/// What a running task unit can reach.
pub struct TaskContext<'a> {
  catalog: &'a TaskCatalog,
  sink: &'a mut dyn OutputSink,
  working_dir: &'a Path,
}

impl<'a> TaskContext<'a> {
  pub fn new(catalog: &'a TaskCatalog, sink: &'a mut dyn OutputSink, working_dir: &'a Path) -> Self {
    Self {
      catalog,
      sink,
      working_dir,
    }
  }

  /// Invoke the primitive registered under `name`.
  pub fn task(&mut self, name: &str, params: &[Value]) -> Result<(), BuildError> {
    let catalog = self.catalog;
    let task = catalog
      .get(name)
      .ok_or_else(|| BuildError::UnknownTask(name.to_string()))?;
    info!(task = %name, params = params.len(), "running task");
    task.run(self, params)
  }

  /// Print a plain line to the output sink.
  pub fn print(&mut self, text: &str) -> Result<(), BuildError> {
    self.sink.print_line(text, &StyleConfig::PLAIN).map_err(BuildError::Output)
  }

  pub fn working_dir(&self) -> &Path {
    self.working_dir
  }

  /// Resolve a task parameter path against the working directory.
  pub fn resolve_path(&self, path: &str) -> PathBuf {
    self.working_dir.join(path)
  }
}

/// `echo(text...)`: print the parameters joined by spaces.
pub struct Echo;

impl TaskPrimitive for Echo {
  fn run(&self, ctx: &mut TaskContext<'_>, params: &[Value]) -> Result<(), BuildError> {
    let words = params
      .iter()
      .map(|p| param_str("echo", p))
      .collect::<Result<Vec<_>, _>>()?;
    ctx.print(&words.join(" "))
  }
}
