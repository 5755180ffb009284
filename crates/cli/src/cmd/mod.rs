mod run;

pub use run::{RunOptions, cmd_run};
