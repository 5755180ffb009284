//! Target resolution.
//!
//! The [`Resolver`] turns a root manifest plus a [`LocationRegistry`] into
//! resolved targets. It offers two walks over the same parse primitive:
//!
//! - [`Resolver::lookup`] follows one [`TargetPath`] and parses only the
//!   manifests on that branch
//! - [`Resolver::index`] parses every reachable manifest and lists all targets
//!
//! Nested manifests and task-unit sources are searched through the registry in
//! priority order, relative to the directory of the manifest that references
//! them. The working directory is always the first location.

mod types;

pub use types::*;

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::consts::MANIFEST_FILENAME;
use crate::error::{HearthError, NotFoundReason, Result};
use crate::location::LocationRegistry;
use crate::manifest::{Entry, ManifestNode};

/// Resolves target paths against a manifest tree.
#[derive(Debug, Clone)]
pub struct Resolver {
  working_dir: PathBuf,
  manifest_name: String,
  separator: char,
  locations: LocationRegistry,
  resolved: Option<ResolvedTarget>,
}

impl Resolver {
  /// Create a resolver rooted at `working_dir`.
  pub fn new(working_dir: impl Into<PathBuf>) -> Self {
    let working_dir = working_dir.into();
    let mut locations = LocationRegistry::new();
    locations.add_location(working_dir.to_string_lossy().into_owned());
    Self {
      working_dir,
      manifest_name: MANIFEST_FILENAME.to_string(),
      separator: std::path::MAIN_SEPARATOR,
      locations,
      resolved: None,
    }
  }

  /// Set the file name of the root manifest, relative to the working directory.
  pub fn with_initial_manifest(mut self, name: impl Into<String>) -> Self {
    self.manifest_name = name.into();
    self
  }

  pub fn with_separator(mut self, separator: char) -> Self {
    self.separator = separator;
    self
  }

  /// Append locations after the working directory, keeping their order.
  pub fn with_locations(mut self, locations: &LocationRegistry) -> Self {
    for location in locations.iter() {
      let location = self.absolutize(location);
      self.locations.add_location(location);
    }
    self
  }

  pub fn locations(&self) -> &LocationRegistry {
    &self.locations
  }

  pub fn initial_manifest(&self) -> &str {
    &self.manifest_name
  }

  pub fn separator(&self) -> char {
    self.separator
  }

  /// Walk `target` segment by segment and record the task unit it names.
  pub fn lookup(&mut self, target: &TargetPath) -> Result<&ResolvedTarget> {
    self.resolved = None;
    let mut node = self.load_root()?;
    let segments = target.segments();
    let mut walked: Vec<&str> = Vec::with_capacity(segments.len());

    for (i, segment) in segments.iter().enumerate() {
      let last = i + 1 == segments.len();
      let not_found = |reason: NotFoundReason, walked: String| HearthError::TargetNotFound {
        segment: segment.clone(),
        walked,
        reason,
      };

      match node.get(segment).cloned() {
        None => return Err(not_found(NotFoundReason::NoSuchEntry, walked.join("/"))),

        Some(Entry::Unit(unit)) => {
          if !last {
            walked.push(segment);
            return Err(HearthError::TargetNotFound {
              segment: segments[i + 1].clone(),
              walked: walked.join("/"),
              reason: NotFoundReason::PastLeaf,
            });
          }

          let file = self
            .find_source(&node, &unit.file)
            .ok_or_else(|| not_found(NotFoundReason::SourceMissing, walked.join("/")))?;

          info!(path = %target, file = %file.display(), class = %unit.class, "target resolved");
          let resolved = ResolvedTarget {
            target: target.clone(),
            file,
            class_name: unit.class,
          };
          return Ok(self.resolved.insert(resolved));
        }

        Some(Entry::Manifest(dir)) => {
          if last {
            return Err(not_found(NotFoundReason::NotALeaf, walked.join("/")));
          }
          node = self
            .load_nested(&node, &dir)?
            .ok_or_else(|| not_found(NotFoundReason::ManifestMissing, walked.join("/")))?;
        }
      }

      walked.push(segment);
    }

    Err(HearthError::InvalidTargetPath(target.to_string()))
  }

  /// Parse every reachable manifest and list all targets.
  pub fn index(&mut self) -> Result<ManifestIndex> {
    let root = self.load_root()?;
    let mut index = ManifestIndex::default();
    let mut prefix = Vec::new();
    let mut stack = Vec::new();
    self.walk(&root, &mut prefix, &mut stack, &mut index)?;
    debug!(
      targets = index.entries.len(),
      manifests = index.manifests.len(),
      "manifest tree indexed"
    );
    Ok(index)
  }

  /// Source file of the last successful lookup.
  pub fn target_file(&self) -> Result<&Path> {
    self.resolved().map(|r| r.file.as_path())
  }

  /// Type name of the last successful lookup.
  pub fn target_class_name(&self) -> Result<&str> {
    self.resolved().map(|r| r.class_name.as_str())
  }

  pub fn resolved(&self) -> Result<&ResolvedTarget> {
    self
      .resolved
      .as_ref()
      .ok_or_else(|| HearthError::IllegalState("no target has been resolved".to_string()))
  }

  /// Render a path with the configured directory separator.
  pub fn display_path(&self, path: &Path) -> String {
    render_path(path, self.separator)
  }

  fn walk(
    &self,
    node: &ManifestNode,
    prefix: &mut Vec<String>,
    stack: &mut Vec<PathBuf>,
    index: &mut ManifestIndex,
  ) -> Result<()> {
    let key = dunce::canonicalize(&node.path).unwrap_or_else(|_| node.path.clone());
    if stack.contains(&key) {
      return Err(HearthError::ManifestParse {
        path: node.path.clone(),
        message: format!("manifest cycle through '{}'", prefix.join("/")),
      });
    }
    stack.push(key);
    index.manifests.push(node.path.clone());

    for (name, entry) in &node.entries {
      prefix.push(name.clone());
      match entry {
        Entry::Unit(unit) => index.entries.push(IndexEntry {
          target: prefix.join("/"),
          class_name: unit.class.clone(),
          file: self.find_source(node, &unit.file),
          description: unit.description.clone(),
        }),
        Entry::Manifest(dir) => {
          let child = self.load_nested(node, dir)?.ok_or_else(|| {
            let segment = prefix.pop().unwrap_or_default();
            HearthError::TargetNotFound {
              segment,
              walked: prefix.join("/"),
              reason: NotFoundReason::ManifestMissing,
            }
          })?;
          self.walk(&child, prefix, stack, index)?;
        }
      }
      prefix.pop();
    }

    stack.pop();
    Ok(())
  }

  /// Parse the root manifest and register the locations it declares.
  fn load_root(&mut self) -> Result<ManifestNode> {
    let path = self.working_dir.join(&self.manifest_name);
    let root = ManifestNode::load(&path, Path::new(""))?;

    if let Some(value) = &root.locations {
      let mut declared = LocationRegistry::new();
      declared.add_locations(value)?;
      for location in declared.iter() {
        let location = self.absolutize(location);
        self.locations.add_location(location);
      }
    }
    Ok(root)
  }

  /// Find and parse the manifest that `dir` refers to from `parent`.
  ///
  /// Returns `None` when no location contains it.
  fn load_nested(&self, parent: &ManifestNode, dir: &str) -> Result<Option<ManifestNode>> {
    let rel_dir = parent.rel_dir.join(dir);
    let Some(path) = self.locations.find(&rel_dir.join(&self.manifest_name)) else {
      debug!(dir = %rel_dir.display(), "sub-manifest not found in any location");
      return Ok(None);
    };
    debug!(path = %path.display(), "descending into sub-manifest");
    ManifestNode::load(&path, &rel_dir).map(Some)
  }

  fn find_source(&self, node: &ManifestNode, file: &str) -> Option<PathBuf> {
    let file = Path::new(file);
    let found = if file.is_absolute() {
      file.exists().then(|| file.to_path_buf())
    } else {
      self.locations.find(&node.rel_dir.join(file))
    }?;
    Some(dunce::canonicalize(&found).unwrap_or(found))
  }

  fn absolutize(&self, location: &str) -> String {
    let path = Path::new(location);
    if path.is_absolute() {
      location.to_string()
    } else {
      self.working_dir.join(path).to_string_lossy().into_owned()
    }
  }
}
