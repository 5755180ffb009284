//! Ordered, duplicate-free registry of search locations.
//!
//! Locations are filesystem roots searched for sub-manifests and task-unit
//! sources. Insertion order is lookup priority: the first location that
//! contains a file wins. Locations are only ever appended.

use std::env;
use std::path::{Path, PathBuf};

use serde_yaml::Value;
use tracing::{debug, trace};

use crate::error::{HearthError, Result};

/// Registry of search locations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationRegistry {
  locations: Vec<String>,
}

impl LocationRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Add one location, skipping it if already present.
  pub fn add_location(&mut self, location: impl Into<String>) -> &mut Self {
    let location = location.into();
    if self.locations.contains(&location) {
      trace!(location = %location, "location already registered");
    } else {
      debug!(location = %location, "registering location");
      self.locations.push(location);
    }
    self
  }

  /// Add a single location or a sequence of locations from a configuration value.
  ///
  /// Every candidate must be a string. The whole value is validated before
  /// anything is inserted, so a rejected value leaves the registry unchanged.
  pub fn add_locations(&mut self, locations: &Value) -> Result<&mut Self> {
    let candidates = match locations {
      Value::Sequence(items) => items.iter().collect::<Vec<_>>(),
      other => vec![other],
    };

    let mut accepted = Vec::with_capacity(candidates.len());
    for candidate in candidates {
      match candidate {
        Value::String(location) => accepted.push(location.clone()),
        other => {
          return Err(HearthError::InvalidConfiguration(format!(
            "a location must be a string, got {}",
            describe(other)
          )));
        }
      }
    }

    for location in accepted {
      self.add_location(location);
    }
    Ok(self)
  }

  /// Append every entry of a path-list environment variable.
  ///
  /// Unset or empty variables add nothing.
  pub fn add_env_paths(&mut self, var: &str) -> &mut Self {
    if let Some(value) = env::var_os(var) {
      for path in env::split_paths(&value) {
        if !path.as_os_str().is_empty() {
          self.add_location(path.to_string_lossy().into_owned());
        }
      }
    }
    self
  }

  /// Find the first location containing `relative`.
  pub fn find(&self, relative: &Path) -> Option<PathBuf> {
    self.locations.iter().find_map(|location| {
      let candidate = Path::new(location).join(relative);
      trace!(candidate = %candidate.display(), "probing location");
      candidate.exists().then_some(candidate)
    })
  }

  pub fn iter(&self) -> impl Iterator<Item = &str> {
    self.locations.iter().map(String::as_str)
  }

  pub fn len(&self) -> usize {
    self.locations.len()
  }

  pub fn is_empty(&self) -> bool {
    self.locations.is_empty()
  }
}

fn describe(value: &Value) -> &'static str {
  match value {
    Value::Null => "null",
    Value::Bool(_) => "a boolean",
    Value::Number(_) => "a number",
    Value::String(_) => "a string",
    Value::Sequence(_) => "a sequence",
    Value::Mapping(_) => "a mapping",
    Value::Tagged(_) => "a tagged value",
  }
}
