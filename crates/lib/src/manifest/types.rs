//! Manifest document types.
//!
//! # Format
//!
//! ```yaml
//! locations: [../shared]
//! targets:
//!   demo:
//!     file: targets/demo.lua
//!     class: Hearth.Target.Demo
//!     description: Demo target
//! manifests:
//!   web: web
//! ```
//!
//! `targets` and `manifests` share one name space per document: a name
//! present in both is rejected at parse time.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::{HearthError, Result};

/// A leaf reference to a task unit.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UnitRef {
  /// Source file, relative to the manifest's directory unless absolute.
  pub file: String,
  /// Fully-qualified type name to instantiate.
  pub class: String,
  #[serde(default)]
  pub description: Option<String>,
}

/// One entry of a manifest mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
  Unit(UnitRef),
  /// Sub-directory holding a nested manifest.
  Manifest(String),
}

/// On-disk shape of a manifest document.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestDoc {
  #[serde(default)]
  locations: Option<serde_yaml::Value>,
  #[serde(default)]
  targets: BTreeMap<String, UnitRef>,
  #[serde(default)]
  manifests: BTreeMap<String, String>,
}

/// A parsed manifest document.
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestNode {
  /// Path the document was read from.
  pub path: PathBuf,
  /// Directory of the document relative to the location it was found in.
  pub rel_dir: PathBuf,
  /// Raw `locations` value, validated by the location registry.
  pub locations: Option<serde_yaml::Value>,
  pub entries: BTreeMap<String, Entry>,
}

impl ManifestNode {
  /// Read and parse the manifest at `path`.
  ///
  /// A missing file is reported as [`HearthError::ManifestNotFound`]; callers
  /// that searched for the file first never see it.
  pub fn load(path: &Path, rel_dir: &Path) -> Result<Self> {
    debug!(path = %path.display(), "parsing manifest");
    let content = fs::read_to_string(path).map_err(|source| match source.kind() {
      io::ErrorKind::NotFound => HearthError::ManifestNotFound {
        path: path.to_path_buf(),
      },
      _ => HearthError::Io {
        path: path.to_path_buf(),
        source,
      },
    })?;
    Self::parse(&content, path, rel_dir)
  }

  /// Parse manifest text that was read from `path`.
  pub fn parse(content: &str, path: &Path, rel_dir: &Path) -> Result<Self> {
    let parse_error = |message: String| HearthError::ManifestParse {
      path: path.to_path_buf(),
      message,
    };

    // Comment-only documents parse as null.
    let value: serde_yaml::Value = if content.trim().is_empty() {
      serde_yaml::Value::Null
    } else {
      serde_yaml::from_str(content).map_err(|e| parse_error(e.to_string()))?
    };
    let doc: ManifestDoc = if value.is_null() {
      ManifestDoc::default()
    } else {
      serde_yaml::from_value(value).map_err(|e| parse_error(e.to_string()))?
    };

    let mut entries = BTreeMap::new();
    for (name, unit) in doc.targets {
      validate_name(&name).map_err(&parse_error)?;
      entries.insert(name, Entry::Unit(unit));
    }
    for (name, dir) in doc.manifests {
      validate_name(&name).map_err(&parse_error)?;
      if entries.contains_key(&name) {
        return Err(parse_error(format!(
          "'{}' is declared both as a target and as a manifest",
          name
        )));
      }
      if dir.trim().is_empty() {
        return Err(parse_error(format!("manifest '{}' has an empty directory", name)));
      }
      entries.insert(name, Entry::Manifest(dir));
    }

    Ok(Self {
      path: path.to_path_buf(),
      rel_dir: rel_dir.to_path_buf(),
      locations: doc.locations,
      entries,
    })
  }

  pub fn get(&self, name: &str) -> Option<&Entry> {
    self.entries.get(name)
  }

  /// Directory containing the document on disk.
  pub fn dir(&self) -> &Path {
    self.path.parent().unwrap_or(Path::new("."))
  }
}

fn validate_name(name: &str) -> std::result::Result<(), String> {
  if name.is_empty() || name.contains(crate::consts::TARGET_SEPARATOR) {
    Err(format!("invalid target name '{}'", name))
  } else {
    Ok(())
  }
}
