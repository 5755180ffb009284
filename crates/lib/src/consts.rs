//! Well-known names shared by the engine and the CLI.

/// Default file name of a manifest document.
pub const MANIFEST_FILENAME: &str = ".hearth.yml";

/// Environment variable holding extra search locations, in platform path-list syntax.
pub const PATH_ENV: &str = "HEARTH_PATH";

/// Separator between target path segments on the command line.
pub const TARGET_SEPARATOR: char = '/';

/// Name of the entry point every task unit exposes.
pub const UNIT_ENTRY_POINT: &str = "main";
