//! Implementation of the default `hearth [TARGET]` command.
//!
//! Without a target the manifest tree is indexed and listed; with one the
//! target is resolved and its task unit executed.

use std::path::{MAIN_SEPARATOR_STR, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use hearth_lib::consts::PATH_ENV;
use hearth_lib::location::LocationRegistry;
use hearth_lib::{BuildStatus, Core};

use crate::output::ConsoleSink;

/// Options collected from the command line.
#[derive(Debug)]
pub struct RunOptions {
  pub directory: Option<PathBuf>,
  pub manifest: String,
  pub locations: Vec<String>,
  pub target: Option<String>,
  pub no_color: bool,
}

/// Execute a run.
///
/// Search locations are registered in priority order: the working directory
/// (added by the resolver), `-L` flags, then `HEARTH_PATH`.
pub fn cmd_run(options: RunOptions) -> Result<BuildStatus> {
  let working_dir = match options.directory {
    Some(dir) => dir,
    None => std::env::current_dir().context("Failed to determine current directory")?,
  };
  let working_dir = dunce::canonicalize(&working_dir)
    .with_context(|| format!("Failed to access working directory: {}", working_dir.display()))?;

  let mut locations = LocationRegistry::new();
  for location in options.locations {
    locations.add_location(location);
  }
  locations.add_env_paths(PATH_ENV);
  debug!(locations = locations.len(), "registered search locations");

  let mut arguments = vec!["hearth".to_string()];
  arguments.extend(options.target);

  let mut core = Core::new(working_dir)
    .with_initial_manifest(options.manifest)
    .with_locations(locations);
  core
    .set_arguments(arguments)?
    .set_separator(MAIN_SEPARATOR_STR)?
    .set_sink(Box::new(ConsoleSink::new(options.no_color)))?;

  core.run().context("Run aborted")?;
  Ok(core.close())
}
