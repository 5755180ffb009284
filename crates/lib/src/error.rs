//! Error taxonomy for target resolution and execution.
//!
//! Errors fall into three groups:
//! - programmer errors ([`HearthError::InvalidConfiguration`], [`HearthError::InvalidArgument`],
//!   [`HearthError::IllegalState`]) which are returned to the caller untouched
//! - resolution errors (missing or malformed manifests, unknown targets)
//! - build errors ([`BuildError`]) raised while a task unit runs
//!
//! The last two abort the current run and are reported through
//! [`Core::fail_build`](crate::driver::Core::fail_build).

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Why a target path segment could not be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundReason {
  /// The segment is not a key of the current manifest.
  NoSuchEntry,
  /// A leaf was reached while segments remained.
  PastLeaf,
  /// The path ended on a nested manifest instead of a leaf.
  NotALeaf,
  /// No registered location contains the referenced sub-manifest.
  ManifestMissing,
  /// No registered location contains the task-unit source file.
  SourceMissing,
}

impl std::fmt::Display for NotFoundReason {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let text = match self {
      NotFoundReason::NoSuchEntry => "no such target",
      NotFoundReason::PastLeaf => "target is a leaf and cannot be descended into",
      NotFoundReason::NotALeaf => "name refers to a manifest, not a target",
      NotFoundReason::ManifestMissing => "sub-manifest not found in any location",
      NotFoundReason::SourceMissing => "task unit source not found in any location",
    };
    f.write_str(text)
  }
}

/// Errors raised by the engine.
#[derive(Debug, Error)]
pub enum HearthError {
  /// Malformed location registry input.
  #[error("invalid configuration: {0}")]
  InvalidConfiguration(String),

  /// Malformed build state input.
  #[error("invalid argument: {0}")]
  InvalidArgument(String),

  /// A value was read before it was set, or set twice.
  #[error("illegal state: {0}")]
  IllegalState(String),

  /// The initial manifest does not exist in the working directory.
  #[error("manifest not found: {}", .path.display())]
  ManifestNotFound { path: PathBuf },

  /// A manifest exists but is structurally invalid.
  #[error("invalid manifest {}: {message}", .path.display())]
  ManifestParse { path: PathBuf, message: String },

  /// A target path segment could not be resolved.
  #[error("target '{segment}' not found{}: {reason}", under(.walked))]
  TargetNotFound {
    segment: String,
    walked: String,
    reason: NotFoundReason,
  },

  /// The target argument does not form a valid path.
  #[error("invalid target path '{0}'")]
  InvalidTargetPath(String),

  /// Reading a manifest failed for a reason other than absence.
  #[error("cannot read {}: {source}", .path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// Writing to the output sink failed.
  #[error("cannot write output: {0}")]
  Output(#[source] io::Error),

  /// The task unit failed.
  #[error(transparent)]
  Build(BuildError),
}

impl From<BuildError> for HearthError {
  fn from(err: BuildError) -> Self {
    match err {
      BuildError::Output(source) => HearthError::Output(source),
      other => HearthError::Build(other),
    }
  }
}

fn under(walked: &str) -> String {
  if walked.is_empty() {
    String::new()
  } else {
    format!(" under '{}'", walked)
  }
}

impl HearthError {
  /// Whether this error aborts the run as a failed build.
  ///
  /// Programmer errors and output failures return `false` and are
  /// propagated instead.
  pub fn is_build_failure(&self) -> bool {
    !matches!(
      self,
      HearthError::InvalidConfiguration(_)
        | HearthError::InvalidArgument(_)
        | HearthError::IllegalState(_)
        | HearthError::Output(_)
    )
  }

  /// The file this error originated from, when known.
  pub fn origin(&self) -> Option<String> {
    match self {
      HearthError::ManifestNotFound { path } | HearthError::ManifestParse { path, .. } | HearthError::Io { path, .. } => {
        Some(path.display().to_string())
      }
      HearthError::Build(err) => err.origin(),
      _ => None,
    }
  }
}

/// Errors raised while loading or running a task unit.
#[derive(Debug, Error)]
pub enum BuildError {
  /// No factory or script class matches the type name.
  #[error("task unit '{class}' not found in {}", .file.display())]
  UnitNotFound { class: String, file: PathBuf },

  /// The unit's script raised an error.
  #[error("{message}")]
  Script { file: PathBuf, message: String },

  /// No primitive is registered under this name.
  #[error("unknown task '{0}'")]
  UnknownTask(String),

  /// A primitive rejected its parameters.
  #[error("task '{task}': {message}")]
  InvalidParameters { task: String, message: String },

  /// A primitive failed while running.
  #[error("task '{task}' failed: {message}")]
  TaskFailed { task: String, message: String },

  /// Failure raised by the unit itself.
  #[error("{0}")]
  Failed(String),

  /// Writing to the output sink failed while the unit ran.
  #[error("cannot write output: {0}")]
  Output(#[source] io::Error),

  /// I/O error while running a primitive.
  #[error("io error: {0}")]
  Io(#[from] io::Error),
}

impl BuildError {
  /// Convenience constructor for units reporting their own failure.
  pub fn failed(message: impl Into<String>) -> Self {
    BuildError::Failed(message.into())
  }

  pub(crate) fn invalid(task: &str, message: impl Into<String>) -> Self {
    BuildError::InvalidParameters {
      task: task.to_string(),
      message: message.into(),
    }
  }

  /// The source file this error originated from, when known.
  pub fn origin(&self) -> Option<String> {
    match self {
      BuildError::UnitNotFound { file, .. } | BuildError::Script { file, .. } => Some(file.display().to_string()),
      _ => None,
    }
  }
}

/// Result alias for engine operations.
pub type Result<T, E = HearthError> = std::result::Result<T, E>;
