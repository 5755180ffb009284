//! Program execution primitive.

use std::process::Command;

use serde_json::Value;
use tracing::debug;

use super::{TaskContext, TaskPrimitive, param_str};
use crate::error::BuildError;

/// `exec(program, args...)`: run a program in the working directory.
///
/// Standard output is forwarded line by line to the output sink. A non-zero
/// exit status fails the build.
pub struct Exec;

impl TaskPrimitive for Exec {
  fn run(&self, ctx: &mut TaskContext<'_>, params: &[Value]) -> Result<(), BuildError> {
    let Some((program, args)) = params.split_first() else {
      return Err(BuildError::invalid("exec", "expected a program"));
    };
    let program = param_str("exec", program)?;
    let args = args
      .iter()
      .map(|a| param_str("exec", a))
      .collect::<Result<Vec<_>, _>>()?;

    debug!(program = %program, args = ?args, working_dir = ?ctx.working_dir(), "spawning process");

    let output = Command::new(&program)
      .args(&args)
      .current_dir(ctx.working_dir())
      .output()
      .map_err(|e| BuildError::TaskFailed {
        task: "exec".to_string(),
        message: format!("cannot run '{}': {}", program, e),
      })?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    for line in stdout.lines() {
      ctx.print(line)?;
    }

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      if !stderr.is_empty() {
        debug!(stderr = %stderr, "command stderr");
      }
      return Err(BuildError::TaskFailed {
        task: "exec".to_string(),
        message: format!("'{}' exited with code {:?}: {}", program, output.status.code(), stderr.trim()),
      });
    }
    Ok(())
  }
}
