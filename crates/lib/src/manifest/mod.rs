//! Manifest documents.
//!
//! A manifest maps target names either to a task unit (leaf) or to a nested
//! manifest living in a sub-directory. [`ManifestNode::load`] is the single
//! parse primitive shared by the lazy lookup walk and the eager index walk.

mod types;

pub use types::*;
