//! hearth-lib: target resolution and execution engine for Hearth
//!
//! Hearth loads a project manifest, resolves a slash-delimited target path to
//! a task unit and runs it:
//! - `location`: ordered search locations for sub-manifests and sources
//! - `manifest`: manifest documents and their parse primitive
//! - `resolve`: lazy target lookup and eager indexing of the manifest tree
//! - `unit`: task units, compiled-in or Lua scripts
//! - `task`: built-in task primitives units invoke by name
//! - `driver`: the execution driver owning per-run build state

pub mod consts;
pub mod driver;
pub mod error;
pub mod location;
pub mod manifest;
pub mod output;
pub mod resolve;
pub mod task;
pub mod unit;

#[cfg(test)]
mod util;

pub use driver::{BuildStatus, Core};
pub use error::{BuildError, HearthError, Result};
