//! Lua script task units.
//!
//! A script is evaluated in a fresh Lua VM with `__dir` bound to the
//! directory of the file. The unit's class is a table found by walking the
//! dotted type name (`Hearth.Target.Demo`, `::` also accepted):
//!
//! 1. through the table the chunk returns
//! 2. through the globals the chunk defined
//! 3. failing both, a returned table that itself has a `main` function
//!
//! Running the unit creates an instance whose `__index` is the class, binds
//! `instance:task(name, ...)` to the task catalog and calls `instance:main()`.
//!
//! ```lua
//! Hearth = { Target = {} }
//! local Demo = {}
//!
//! function Demo:main()
//!   self:task("chmod", 755, __dir .. "/bin/run.sh")
//! end
//!
//! Hearth.Target.Demo = Demo
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use mlua::prelude::*;
use serde_json::Value;
use tracing::debug;

use super::TaskUnit;
use crate::consts::UNIT_ENTRY_POINT;
use crate::error::BuildError;
use crate::task::TaskContext;

/// Whether `path` is a Lua script.
pub fn is_script(path: &Path) -> bool {
  path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("lua"))
}

/// A task unit backed by a Lua class table.
pub struct LuaUnit {
  lua: Lua,
  class: LuaTable,
  file: PathBuf,
}

impl LuaUnit {
  /// Evaluate `path` and locate the class named `class_name`.
  pub fn load(path: &Path, class_name: &str) -> Result<Self, BuildError> {
    let lua = Lua::new();
    let (env, returned) = load_file_with_dir(&lua, path).map_err(|e| script_error(path, e))?;

    let segments = class_segments(class_name);
    let found = find_class(&returned, &segments)
      .and_then(|found| match found {
        Some(class) => Ok(Some(class)),
        None => find_class(&LuaValue::Table(env), &segments),
      })
      .map_err(|e| script_error(path, e))?;

    let class = match (found, returned) {
      (Some(class), _) => class,
      (None, LuaValue::Table(table)) if has_entry_point(&table) => table,
      _ => {
        return Err(BuildError::UnitNotFound {
          class: class_name.to_string(),
          file: path.to_path_buf(),
        });
      }
    };

    if !has_entry_point(&class) {
      return Err(BuildError::UnitNotFound {
        class: format!("{}.{}", class_name, UNIT_ENTRY_POINT),
        file: path.to_path_buf(),
      });
    }

    debug!(class = %class_name, file = %path.display(), "script unit loaded");
    Ok(Self {
      lua,
      class,
      file: path.to_path_buf(),
    })
  }

  fn instantiate(&self) -> LuaResult<LuaTable> {
    let instance = self.lua.create_table()?;
    let mt = self.lua.create_table()?;
    mt.set("__index", self.class.clone())?;
    instance.set_metatable(Some(mt))?;
    Ok(instance)
  }
}

impl TaskUnit for LuaUnit {
  fn main(&mut self, ctx: &mut TaskContext<'_>) -> Result<(), BuildError> {
    let instance = self.instantiate().map_err(|e| script_error(&self.file, e))?;
    let main: LuaFunction = self
      .class
      .get(UNIT_ENTRY_POINT)
      .map_err(|e| script_error(&self.file, e))?;

    // Primitive failures handed to Lua, by id. Only the one that escapes
    // `main` is reported; failures caught with `pcall` are dropped.
    let mut failures: Vec<BuildError> = Vec::new();

    let result = self.lua.scope(|scope| {
      let task = scope.create_function_mut(|lua, (_this, name, args): (LuaValue, String, LuaMultiValue)| {
        let params = args
          .into_iter()
          .map(|arg| lua.from_value::<Value>(arg))
          .collect::<LuaResult<Vec<_>>>()?;

        ctx.task(&name, &params).map_err(|e| {
          let failure = TaskFailure {
            id: failures.len(),
            message: e.to_string(),
          };
          failures.push(e);
          LuaError::external(failure)
        })
      })?;
      instance.set("task", task)?;
      main.call::<()>(instance.clone())
    });

    match result {
      Ok(()) => Ok(()),
      Err(e) => match escaped_failure(&e) {
        Some(id) if id < failures.len() => Err(failures.swap_remove(id)),
        _ => Err(script_error(&self.file, e)),
      },
    }
  }
}

/// A primitive failure raised into Lua, pointing back at the original error.
#[derive(Debug)]
struct TaskFailure {
  id: usize,
  message: String,
}

impl std::fmt::Display for TaskFailure {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(&self.message)
  }
}

impl std::error::Error for TaskFailure {}

/// The id of the primitive failure that `err` carries, if any.
fn escaped_failure(err: &LuaError) -> Option<usize> {
  match err {
    LuaError::CallbackError { cause, .. } | LuaError::WithContext { cause, .. } => escaped_failure(cause),
    LuaError::ExternalError(inner) => inner.downcast_ref::<TaskFailure>().map(|f| f.id),
    _ => None,
  }
}

/// Load a Lua file with a custom environment containing `__dir`.
///
/// Globals assigned by the chunk land in the returned environment table,
/// which falls back to `_G` for reads. Returns the environment and the
/// chunk's return value.
fn load_file_with_dir(lua: &Lua, path: &Path) -> LuaResult<(LuaTable, LuaValue)> {
  let content =
    fs::read_to_string(path).map_err(|e| LuaError::external(format!("cannot read '{}': {}", path.display(), e)))?;

  let dir = path.parent().unwrap_or(Path::new(".")).to_string_lossy().into_owned();

  let env = lua.create_table()?;
  env.set("__dir", dir)?;

  let mt = lua.create_table()?;
  mt.set("__index", lua.globals())?;
  env.set_metatable(Some(mt))?;

  let result = lua
    .load(content.as_str())
    .set_name(format!("@{}", path.display()))
    .set_environment(env.clone())
    .eval::<LuaValue>()?;

  Ok((env, result))
}

fn class_segments(class_name: &str) -> Vec<&str> {
  class_name
    .split("::")
    .flat_map(|part| part.split('.'))
    .filter(|s| !s.is_empty())
    .collect()
}

fn find_class(root: &LuaValue, segments: &[&str]) -> LuaResult<Option<LuaTable>> {
  if segments.is_empty() {
    return Ok(None);
  }

  let mut current = root.clone();
  for segment in segments {
    current = match current {
      LuaValue::Table(table) => table.get::<LuaValue>(*segment)?,
      _ => return Ok(None),
    };
  }

  match current {
    LuaValue::Table(table) => Ok(Some(table)),
    _ => Ok(None),
  }
}

fn has_entry_point(table: &LuaTable) -> bool {
  matches!(table.get::<LuaValue>(UNIT_ENTRY_POINT), Ok(LuaValue::Function(_)))
}

fn script_error(file: &Path, err: LuaError) -> BuildError {
  BuildError::Script {
    file: file.to_path_buf(),
    message: err.to_string(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::output::MemorySink;
  use crate::task::TaskCatalog;
  use crate::util::testutil::write_file;
  use tempfile::TempDir;

  fn run_unit(dir: &Path, unit: &mut LuaUnit) -> (Result<(), BuildError>, String) {
    let catalog = TaskCatalog::with_builtins();
    let mut sink = MemorySink::new();
    let result = {
      let mut ctx = TaskContext::new(&catalog, &mut sink, dir);
      unit.main(&mut ctx)
    };
    (result, sink.text())
  }

  const DEMO: &str = r#"
Hearth = { Target = {} }
local Demo = {}

function Demo:main()
  self:task("echo", "demo", "ran", 1)
end

Hearth.Target.Demo = Demo
"#;

  #[test]
  fn is_script_checks_extension() {
    assert!(is_script(Path::new("a/b.lua")));
    assert!(is_script(Path::new("B.LUA")));
    assert!(!is_script(Path::new("b.rs")));
    assert!(!is_script(Path::new("lua")));
  }

  #[test]
  fn class_segments_accepts_both_separators() {
    assert_eq!(class_segments("Hearth.Target.Demo"), vec!["Hearth", "Target", "Demo"]);
    assert_eq!(class_segments("Hearth::Target::Demo"), vec!["Hearth", "Target", "Demo"]);
    assert_eq!(class_segments("Demo"), vec!["Demo"]);
  }

  #[test]
  fn runs_class_defined_through_globals() {
    let temp = TempDir::new().unwrap();
    let file = write_file(temp.path(), "demo.lua", DEMO);

    let mut unit = LuaUnit::load(&file, "Hearth.Target.Demo").unwrap();
    let (result, output) = run_unit(temp.path(), &mut unit);

    result.unwrap();
    assert_eq!(output, "demo ran 1");
  }

  #[test]
  fn runs_class_from_returned_table() {
    let temp = TempDir::new().unwrap();
    let file = write_file(
      temp.path(),
      "lib.lua",
      r#"
local Build = {}
function Build:main() self:task("echo", "from", "module") end
return { Lib = { Build = Build } }
"#,
    );

    let mut unit = LuaUnit::load(&file, "Lib::Build").unwrap();
    assert_eq!(run_unit(temp.path(), &mut unit).1, "from module");
  }

  #[test]
  fn returned_class_table_is_accepted_directly() {
    let temp = TempDir::new().unwrap();
    let file = write_file(
      temp.path(),
      "single.lua",
      "local T = {}\nfunction T:main() self:task('echo', 'single') end\nreturn T\n",
    );

    let mut unit = LuaUnit::load(&file, "Any.Name").unwrap();
    assert_eq!(run_unit(temp.path(), &mut unit).1, "single");
  }

  #[test]
  fn instance_fields_do_not_leak_into_class() {
    let temp = TempDir::new().unwrap();
    let file = write_file(
      temp.path(),
      "count.lua",
      r#"
Counter = { count = 0 }
function Counter:main()
  self.count = self.count + 1
  self:task("echo", self.count, Counter.count)
end
"#,
    );

    let mut unit = LuaUnit::load(&file, "Counter").unwrap();
    assert_eq!(run_unit(temp.path(), &mut unit).1, "1 0");
    assert_eq!(run_unit(temp.path(), &mut unit).1, "1 0");
  }

  #[test]
  fn dir_points_at_script_directory() {
    let temp = TempDir::new().unwrap();
    let file = write_file(
      temp.path(),
      "sub/where.lua",
      "Where = {}\nfunction Where:main() self:task('echo', __dir) end\n",
    );

    let mut unit = LuaUnit::load(&file, "Where").unwrap();
    let (_, output) = run_unit(temp.path(), &mut unit);
    assert_eq!(output, temp.path().join("sub").to_string_lossy());
  }

  #[test]
  fn missing_class_is_unit_not_found() {
    let temp = TempDir::new().unwrap();
    let file = write_file(temp.path(), "demo.lua", DEMO);

    assert!(matches!(
      LuaUnit::load(&file, "Hearth.Target.Other"),
      Err(BuildError::UnitNotFound { .. })
    ));
  }

  #[test]
  fn class_without_main_is_unit_not_found() {
    let temp = TempDir::new().unwrap();
    let file = write_file(temp.path(), "nomain.lua", "NoMain = { run = function() end }\n");

    assert!(matches!(
      LuaUnit::load(&file, "NoMain"),
      Err(BuildError::UnitNotFound { class, .. }) if class == "NoMain.main"
    ));
  }

  #[test]
  fn syntax_error_is_script_error() {
    let temp = TempDir::new().unwrap();
    let file = write_file(temp.path(), "bad.lua", "this is not lua {{{");

    assert!(matches!(
      LuaUnit::load(&file, "Bad"),
      Err(BuildError::Script { .. })
    ));
  }

  #[test]
  fn runtime_error_carries_file_and_line() {
    let temp = TempDir::new().unwrap();
    let file = write_file(
      temp.path(),
      "boom.lua",
      "Boom = {}\nfunction Boom:main()\n  error('kaboom')\nend\n",
    );

    let mut unit = LuaUnit::load(&file, "Boom").unwrap();
    match run_unit(temp.path(), &mut unit).0.unwrap_err() {
      BuildError::Script { message, file: origin } => {
        assert!(message.contains("kaboom"), "{message}");
        assert!(message.contains("boom.lua:3"), "{message}");
        assert_eq!(origin, file);
      }
      other => panic!("expected Script, got {other:?}"),
    }
  }

  #[test]
  fn primitive_failure_keeps_its_type() {
    let temp = TempDir::new().unwrap();
    let file = write_file(
      temp.path(),
      "unknown.lua",
      "U = {}\nfunction U:main() self:task('teleport', 1) end\n",
    );

    let mut unit = LuaUnit::load(&file, "U").unwrap();
    assert!(matches!(
      run_unit(temp.path(), &mut unit).0,
      Err(BuildError::UnknownTask(name)) if name == "teleport"
    ));
  }

  #[test]
  fn caught_primitive_failure_does_not_fail_unit() {
    let temp = TempDir::new().unwrap();
    let file = write_file(
      temp.path(),
      "caught.lua",
      r#"
C = {}
function C:main()
  local ok = pcall(function() self:task('teleport') end)
  self:task('echo', 'recovered', tostring(ok))
end
"#,
    );

    let mut unit = LuaUnit::load(&file, "C").unwrap();
    let (result, output) = run_unit(temp.path(), &mut unit);
    result.unwrap();
    assert_eq!(output, "recovered false");
  }

  #[test]
  fn later_script_error_wins_over_caught_primitive_failure() {
    let temp = TempDir::new().unwrap();
    let file = write_file(
      temp.path(),
      "rethrow.lua",
      r#"
C = {}
function C:main()
  pcall(function() self:task('teleport') end)
  error('real failure')
end
"#,
    );

    let mut unit = LuaUnit::load(&file, "C").unwrap();
    match run_unit(temp.path(), &mut unit).0.unwrap_err() {
      BuildError::Script { message, .. } => assert!(message.contains("real failure"), "{message}"),
      other => panic!("expected Script, got {other:?}"),
    }
  }

  #[test]
  fn uncaught_primitive_failure_wins_over_caught_one() {
    let temp = TempDir::new().unwrap();
    let file = write_file(
      temp.path(),
      "second.lua",
      r#"
C = {}
function C:main()
  pcall(function() self:task('teleport') end)
  self:task('mkdir')
end
"#,
    );

    let mut unit = LuaUnit::load(&file, "C").unwrap();
    assert!(matches!(
      run_unit(temp.path(), &mut unit).0,
      Err(BuildError::InvalidParameters { task, .. }) if task == "mkdir"
    ));
  }

  #[cfg(unix)]
  #[test]
  fn chmod_from_script_changes_mode() {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new().unwrap();
    let target = write_file(temp.path(), "bin/run.sh", "#!/bin/sh\n");
    let file = write_file(
      temp.path(),
      "chmod.lua",
      "Demo = {}\nfunction Demo:main() self:task('chmod', 777, 'bin/run.sh') end\n",
    );

    let mut unit = LuaUnit::load(&file, "Demo").unwrap();
    run_unit(temp.path(), &mut unit).0.unwrap();

    let mode = fs::metadata(target).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o777);
  }
}
