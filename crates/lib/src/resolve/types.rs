use std::fmt;
use std::path::{Path, PathBuf};

use crate::consts::TARGET_SEPARATOR;
use crate::error::{HearthError, Result};

/// A slash-delimited target address split into segments.
///
/// Always holds at least one segment and never an empty one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetPath {
  segments: Vec<String>,
}

impl TargetPath {
  /// Parse a command-line target argument such as `group/sub/target`.
  ///
  /// Leading and trailing separators are ignored.
  pub fn parse(arg: &str) -> Result<Self> {
    let trimmed = arg.trim().trim_matches(TARGET_SEPARATOR);
    if trimmed.is_empty() {
      return Err(HearthError::InvalidTargetPath(arg.to_string()));
    }

    let segments: Vec<String> = trimmed.split(TARGET_SEPARATOR).map(str::to_string).collect();
    if segments.iter().any(|s| s.trim().is_empty()) {
      return Err(HearthError::InvalidTargetPath(arg.to_string()));
    }
    Ok(Self { segments })
  }

  /// Build a path from already split segments.
  pub fn from_segments<I, S>(segments: I) -> Result<Self>
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
    if segments.is_empty() || segments.iter().any(|s| s.is_empty() || s.contains(TARGET_SEPARATOR)) {
      return Err(HearthError::InvalidTargetPath(segments.join("/")));
    }
    Ok(Self { segments })
  }

  pub fn segments(&self) -> &[String] {
    &self.segments
  }

  pub fn len(&self) -> usize {
    self.segments.len()
  }

  pub fn is_empty(&self) -> bool {
    self.segments.is_empty()
  }
}

impl fmt::Display for TargetPath {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.segments.join("/"))
  }
}

/// Output of a successful lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
  pub target: TargetPath,
  /// Absolute path of the task-unit source.
  pub file: PathBuf,
  /// Fully-qualified type name to instantiate.
  pub class_name: String,
}

/// One target found by an index walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
  /// Full target path, `/`-delimited.
  pub target: String,
  pub class_name: String,
  /// Resolved source, `None` when no location has it.
  pub file: Option<PathBuf>,
  pub description: Option<String>,
}

/// Complete listing of every target reachable from the root manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestIndex {
  pub entries: Vec<IndexEntry>,
  /// Every manifest parsed, root first.
  pub manifests: Vec<PathBuf>,
}

impl ManifestIndex {
  pub fn get(&self, target: &str) -> Option<&IndexEntry> {
    self.entries.iter().find(|e| e.target == target)
  }

  pub fn targets(&self) -> impl Iterator<Item = &str> {
    self.entries.iter().map(|e| e.target.as_str())
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

/// Render a path using the given directory separator.
pub fn render_path(path: &Path, separator: char) -> String {
  path
    .to_string_lossy()
    .chars()
    .map(|c| if c == '/' || c == '\\' { separator } else { c })
    .collect()
}
