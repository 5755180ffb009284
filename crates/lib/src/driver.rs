//! Execution driver.
//!
//! [`Core`] owns the build state for one invocation, drives the
//! [`Resolver`], instantiates the resolved task unit and runs it. Resolution
//! and build errors are reported through [`Core::fail_build`]; programmer
//! errors are returned to the caller. [`Core::close`] consumes the driver and
//! yields the [`BuildStatus`] the binary turns into an exit code.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use tracing::{debug, info, warn};

use crate::consts::MANIFEST_FILENAME;
use crate::error::{HearthError, Result};
use crate::location::LocationRegistry;
use crate::output::{OutputSink, StyleConfig};
use crate::resolve::{ManifestIndex, Resolver, TargetPath, render_path};
use crate::task::{TaskCatalog, TaskContext};
use crate::unit::UnitRegistry;

/// Terminal result of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStatus {
  Success,
  Failed,
}

impl BuildStatus {
  /// Process exit code for this status.
  pub fn code(self) -> u8 {
    match self {
      BuildStatus::Success => 0,
      BuildStatus::Failed => 1,
    }
  }

  pub fn is_success(self) -> bool {
    matches!(self, BuildStatus::Success)
  }
}

impl From<BuildStatus> for ExitCode {
  fn from(status: BuildStatus) -> Self {
    ExitCode::from(status.code())
  }
}

/// Per-invocation state. Values are set once; `failed` only ever becomes `true`.
#[derive(Default)]
struct BuildState {
  arguments: Option<Vec<String>>,
  separator: Option<char>,
  sink: Option<Box<dyn OutputSink>>,
  failed: bool,
}

/// The execution driver.
pub struct Core {
  state: BuildState,
  working_dir: PathBuf,
  manifest_name: String,
  locations: LocationRegistry,
  units: UnitRegistry,
  tasks: TaskCatalog,
}

impl Core {
  /// A driver rooted at `working_dir` with the built-in task catalog.
  pub fn new(working_dir: impl Into<PathBuf>) -> Self {
    Self {
      state: BuildState::default(),
      working_dir: working_dir.into(),
      manifest_name: MANIFEST_FILENAME.to_string(),
      locations: LocationRegistry::new(),
      units: UnitRegistry::new(),
      tasks: TaskCatalog::with_builtins(),
    }
  }

  pub fn with_initial_manifest(mut self, name: impl Into<String>) -> Self {
    self.manifest_name = name.into();
    self
  }

  pub fn with_locations(mut self, locations: LocationRegistry) -> Self {
    self.locations = locations;
    self
  }

  pub fn with_units(mut self, units: UnitRegistry) -> Self {
    self.units = units;
    self
  }

  pub fn with_tasks(mut self, tasks: TaskCatalog) -> Self {
    self.tasks = tasks;
    self
  }

  /// Set the command-line arguments. The first is the program name.
  pub fn set_arguments<I, S>(&mut self, arguments: I) -> Result<&mut Self>
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let arguments: Vec<String> = arguments.into_iter().map(Into::into).collect();
    if arguments.is_empty() {
      return Err(HearthError::InvalidArgument(
        "arguments must include the program name".to_string(),
      ));
    }
    if self.state.arguments.is_some() {
      return Err(HearthError::IllegalState("arguments are already set".to_string()));
    }
    self.state.arguments = Some(arguments);
    Ok(self)
  }

  pub fn arguments(&self) -> Result<&[String]> {
    self
      .state
      .arguments
      .as_deref()
      .ok_or_else(|| HearthError::IllegalState("arguments have not been set".to_string()))
  }

  /// Argument at `index`, `None` when there are fewer arguments.
  pub fn argument(&self, index: usize) -> Result<Option<&str>> {
    Ok(self.arguments()?.get(index).map(String::as_str))
  }

  /// Set the directory separator: a single non-alphanumeric character.
  pub fn set_separator(&mut self, separator: &str) -> Result<&mut Self> {
    let mut chars = separator.chars();
    let separator = match (chars.next(), chars.next()) {
      (Some(c), None) if !c.is_alphanumeric() && !c.is_whitespace() => c,
      _ => {
        return Err(HearthError::InvalidArgument(format!(
          "invalid directory separator '{}'",
          separator
        )));
      }
    };
    if self.state.separator.is_some() {
      return Err(HearthError::IllegalState("directory separator is already set".to_string()));
    }
    self.state.separator = Some(separator);
    Ok(self)
  }

  pub fn separator(&self) -> Result<char> {
    self
      .state
      .separator
      .ok_or_else(|| HearthError::IllegalState("directory separator has not been set".to_string()))
  }

  pub fn set_sink(&mut self, sink: Box<dyn OutputSink>) -> Result<&mut Self> {
    if self.state.sink.is_some() {
      return Err(HearthError::IllegalState("output sink is already set".to_string()));
    }
    self.state.sink = Some(sink);
    Ok(self)
  }

  pub fn sink(&mut self) -> Result<&mut dyn OutputSink> {
    match self.state.sink.as_deref_mut() {
      Some(sink) => Ok(sink),
      None => Err(HearthError::IllegalState("output sink has not been set".to_string())),
    }
  }

  /// Whether a build failure has been recorded.
  pub fn failed(&self) -> bool {
    self.state.failed
  }

  pub fn working_dir(&self) -> &Path {
    &self.working_dir
  }

  /// Resolve and run the target named by the second argument, or list every
  /// target when there is none.
  pub fn run(&mut self) -> Result<&mut Self> {
    let arguments = self.arguments()?.to_vec();
    let count = arguments.len();
    let separator = self.separator()?;
    debug!(count, "running with arguments");

    let banner = format!(
      "Hearth: {} ({})",
      render_path(&self.working_dir, separator),
      self.manifest_name
    );
    self.print(&banner, &StyleConfig::banner())?;

    let mut resolver = Resolver::new(&self.working_dir)
      .with_separator(separator)
      .with_locations(&self.locations)
      .with_initial_manifest(&self.manifest_name);

    let outcome = match arguments.get(1) {
      None => self.list(&mut resolver),
      Some(target) => self.execute(&mut resolver, target),
    };

    match outcome {
      Ok(()) => Ok(self),
      Err(err) if err.is_build_failure() => Ok(self.fail_build(&err)),
      Err(err) => Err(err),
    }
  }

  /// Report a failed build and record it.
  pub fn fail_build(&mut self, error: &HearthError) -> &mut Self {
    self.state.failed = true;
    warn!(error = %error, "build failed");

    let mut lines = vec![
      ("BUILD FAILED".to_string(), StyleConfig::failure()),
      (error.to_string(), StyleConfig::PLAIN),
    ];
    if let Some(origin) = error.origin() {
      lines.push((format!("  at {}", origin), StyleConfig::detail()));
    }

    for (text, style) in lines {
      if let Err(e) = self.print(&text, &style) {
        warn!(error = %e, "cannot report build failure");
        break;
      }
    }
    self
  }

  /// Finish the run and report its status.
  pub fn close(self) -> BuildStatus {
    let status = if self.state.failed {
      BuildStatus::Failed
    } else {
      BuildStatus::Success
    };
    debug!(?status, "closing");
    status
  }

  fn list(&mut self, resolver: &mut Resolver) -> Result<()> {
    let index = resolver.index()?;
    info!(targets = index.entries.len(), "listing targets");
    for line in render_index(&index, resolver) {
      self.print(&line, &StyleConfig::PLAIN)?;
    }
    Ok(())
  }

  fn execute(&mut self, resolver: &mut Resolver, argument: &str) -> Result<()> {
    let target = TargetPath::parse(argument)?;
    let resolved = resolver.lookup(&target)?.clone();
    let mut unit = self.units.instantiate(&resolved)?;

    info!(path = %target, class = %resolved.class_name, "running target");
    {
      let sink = self
        .state
        .sink
        .as_deref_mut()
        .ok_or_else(|| HearthError::IllegalState("output sink has not been set".to_string()))?;
      let mut ctx = TaskContext::new(&self.tasks, sink, &self.working_dir);
      unit.main(&mut ctx)?;
    }

    self.print(&format!("BUILD SUCCESSFUL ({})", target), &StyleConfig::success())
  }

  fn print(&mut self, text: &str, style: &StyleConfig) -> Result<()> {
    self.sink()?.print_line(text, style).map_err(HearthError::Output)
  }
}

fn render_index(index: &ManifestIndex, resolver: &Resolver) -> Vec<String> {
  if index.is_empty() {
    return vec!["No targets defined.".to_string()];
  }

  let width = index.targets().map(str::len).max().unwrap_or(0);
  let mut lines = vec!["Available targets:".to_string()];
  for entry in &index.entries {
    let source = match &entry.file {
      Some(file) => resolver.display_path(file),
      None => "(source missing)".to_string(),
    };
    let mut line = format!("  {:<width$}  {}  {}", entry.target, entry.class_name, source);
    if let Some(description) = &entry.description {
      line.push_str("  - ");
      line.push_str(description);
    }
    lines.push(line);
  }
  lines
}
