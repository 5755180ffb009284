use serde_json::Value;

use crate::error::BuildError;

/// Read a scalar parameter as text.
pub fn param_str(task: &str, value: &Value) -> Result<String, BuildError> {
  match value {
    Value::String(s) => Ok(s.clone()),
    Value::Number(n) => Ok(n.to_string()),
    Value::Bool(b) => Ok(b.to_string()),
    other => Err(BuildError::invalid(task, format!("expected a scalar parameter, got {}", other))),
  }
}

/// Parse a permission mode written as octal digits.
///
/// Accepts numbers whose decimal digits are read as octal (`755`) and strings
/// with an optional `0` or `0o` prefix (`"0755"`, `"0o755"`).
pub fn parse_mode(task: &str, value: &Value) -> Result<u32, BuildError> {
  let text = match value {
    Value::Number(n) if n.is_u64() => n.to_string(),
    Value::String(s) => s.trim().to_string(),
    other => return Err(BuildError::invalid(task, format!("invalid mode {}", other))),
  };
  let digits = text.strip_prefix("0o").unwrap_or(&text);
  if digits.is_empty() || !digits.chars().all(|c| c.is_digit(8)) {
    return Err(BuildError::invalid(task, format!("invalid mode '{}'", text)));
  }

  let mode = u32::from_str_radix(digits, 8).map_err(|_| BuildError::invalid(task, format!("invalid mode '{}'", text)))?;
  if mode > 0o7777 {
    return Err(BuildError::invalid(task, format!("mode '{}' out of range", text)));
  }
  Ok(mode)
}
