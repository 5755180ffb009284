mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use hearth_lib::consts::MANIFEST_FILENAME;

use crate::cmd::{RunOptions, cmd_run};

/// hearth - resolve a target from the project manifest and run it
#[derive(Parser)]
#[command(name = "hearth")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Target path such as `group/sub/target`; lists targets when omitted
  target: Option<String>,

  /// Name of the root manifest file
  #[arg(short, long, default_value = MANIFEST_FILENAME)]
  manifest: String,

  /// Additional search location (repeatable)
  #[arg(short = 'L', long = "location", value_name = "DIR")]
  locations: Vec<String>,

  /// Run as if started in DIR
  #[arg(short = 'C', long, value_name = "DIR")]
  directory: Option<PathBuf>,

  /// Disable colored output
  #[arg(long)]
  no_color: bool,

  /// Enable verbose output
  #[arg(short, long)]
  verbose: bool,
}

fn main() -> Result<ExitCode> {
  let cli = Cli::parse();

  let filter = if cli.verbose {
    EnvFilter::new("debug")
  } else {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
  };
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .without_time()
    .with_writer(std::io::stderr)
    .init();

  let status = cmd_run(RunOptions {
    directory: cli.directory,
    manifest: cli.manifest,
    locations: cli.locations,
    target: cli.target,
    no_color: cli.no_color,
  })?;
  Ok(status.into())
}
