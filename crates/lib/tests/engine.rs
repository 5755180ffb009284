//! End-to-end tests of the public engine API against on-disk projects.

use std::path::Path;

use hearth_lib::error::BuildError;
use hearth_lib::location::LocationRegistry;
use hearth_lib::output::SharedSink;
use hearth_lib::resolve::{Resolver, TargetPath};
use hearth_lib::task::{TaskCatalog, TaskContext, TaskPrimitive};
use hearth_lib::unit::{TaskUnit, UnitRegistry};
use hearth_lib::{BuildStatus, Core};
use serde_json::{Value, json};
use tempfile::TempDir;

fn write(root: &Path, relative: &str, content: &str) {
  let path = root.join(relative);
  std::fs::create_dir_all(path.parent().unwrap()).unwrap();
  std::fs::write(path, content).unwrap();
}

fn run(target: Option<&str>, core: Core) -> (BuildStatus, String) {
  let sink = SharedSink::new();
  let mut core = core;
  let mut arguments = vec!["hearth"];
  arguments.extend(target);
  core
    .set_arguments(arguments)
    .unwrap()
    .set_separator("/")
    .unwrap()
    .set_sink(Box::new(sink.clone()))
    .unwrap();
  core.run().unwrap();
  (core.close(), sink.text())
}

/// Records the parameters it was called with as a `greet` line.
struct Greet;

impl TaskPrimitive for Greet {
  fn run(&self, ctx: &mut TaskContext<'_>, params: &[Value]) -> Result<(), BuildError> {
    let names: Vec<String> = params.iter().map(|p| p.as_str().unwrap_or("?").to_string()).collect();
    ctx.print(&format!("greetings {}", names.join(" and ")))
  }
}

#[derive(Default)]
struct Welcome;

impl TaskUnit for Welcome {
  fn main(&mut self, ctx: &mut TaskContext<'_>) -> Result<(), BuildError> {
    ctx.task("greet", &[json!("ada"), json!("grace")])
  }
}

#[test]
fn compiled_unit_uses_custom_task() {
  let temp = TempDir::new().unwrap();
  write(
    temp.path(),
    ".hearth.yml",
    "targets:\n  welcome:\n    file: welcome.rs\n    class: App.Welcome\n",
  );
  write(temp.path(), "welcome.rs", "");

  let mut units = UnitRegistry::new();
  units.register_default::<Welcome>("App.Welcome");
  let mut tasks = TaskCatalog::with_builtins();
  tasks.register("greet", Greet);

  let core = Core::new(temp.path()).with_units(units).with_tasks(tasks);
  let (status, text) = run(Some("welcome"), core);

  assert_eq!(status, BuildStatus::Success, "{text}");
  assert!(text.contains("greetings ada and grace"), "{text}");
}

#[test]
fn lua_unit_in_shared_location_stages_files() {
  let project = TempDir::new().unwrap();
  let shared = TempDir::new().unwrap();
  write(project.path(), ".hearth.yml", "manifests:\n  web: web\n");
  write(project.path(), "index.html", "<p>hi</p>");
  write(
    shared.path(),
    "web/.hearth.yml",
    "targets:\n  site:\n    file: site.lua\n    class: Web.Site\n",
  );
  write(
    shared.path(),
    "web/site.lua",
    r#"
local Site = {}
function Site:main()
  self:task("mkdir", "out")
  self:task("copy", "index.html", "out")
end
return { Web = { Site = Site } }
"#,
  );

  let mut locations = LocationRegistry::new();
  locations.add_location(shared.path().to_string_lossy());
  let core = Core::new(project.path()).with_locations(locations);
  let (status, text) = run(Some("web/site"), core);

  assert_eq!(status, BuildStatus::Success, "{text}");
  assert_eq!(
    std::fs::read_to_string(project.path().join("out/index.html")).unwrap(),
    "<p>hi</p>"
  );
}

#[test]
fn failed_build_reports_and_closes_failed() {
  let temp = TempDir::new().unwrap();
  write(temp.path(), ".hearth.yml", "manifests:\n  web: web\n");

  let (status, text) = run(Some("web/site"), Core::new(temp.path()));

  assert_eq!(status, BuildStatus::Failed);
  assert!(text.contains("BUILD FAILED"), "{text}");
  assert!(text.contains("'web'"), "{text}");
}

#[test]
fn resolver_lookup_and_index_agree() {
  let temp = TempDir::new().unwrap();
  write(temp.path(), ".hearth.yml", "manifests:\n  a: a\n");
  write(temp.path(), "a/.hearth.yml", "manifests:\n  b: b\n");
  write(
    temp.path(),
    "a/b/.hearth.yml",
    "targets:\n  c:\n    file: c.lua\n    class: C\n",
  );
  write(temp.path(), "a/b/c.lua", "C = {}\nfunction C:main() end\n");

  let mut resolver = Resolver::new(temp.path());
  let index = resolver.index().unwrap();
  let entry = index.get("a/b/c").unwrap();

  let resolved = resolver.lookup(&TargetPath::parse("a/b/c").unwrap()).unwrap().clone();
  assert_eq!(Some(&resolved.file), entry.file.as_ref());
  assert_eq!(resolved.class_name, entry.class_name);
  assert_eq!(resolver.target_class_name().unwrap(), "C");
}
