//! Task units.
//!
//! A task unit is user-authored build logic exposing one entry point,
//! [`TaskUnit::main`]. Units are instantiated by type name through a
//! [`UnitRegistry`]:
//!
//! 1. compiled-in factories registered with [`UnitRegistry::register`]
//! 2. Lua scripts ([`lua::LuaUnit`]) for `.lua` sources
//!
//! The first that knows the type name wins.

pub mod lua;

use std::collections::HashMap;

use tracing::debug;

use crate::error::BuildError;
use crate::resolve::ResolvedTarget;
use crate::task::TaskContext;

/// User-authored build logic.
pub trait TaskUnit {
  /// Run the unit's build steps.
  fn main(&mut self, ctx: &mut TaskContext<'_>) -> Result<(), BuildError>;
}

type UnitFactory = Box<dyn Fn() -> Box<dyn TaskUnit>>;

/// Maps fully-qualified type names to unit constructors.
#[derive(Default)]
pub struct UnitRegistry {
  factories: HashMap<String, UnitFactory>,
}

impl UnitRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register a constructor for `class`, replacing any previous one.
  pub fn register<F, U>(&mut self, class: &str, factory: F) -> &mut Self
  where
    F: Fn() -> U + 'static,
    U: TaskUnit + 'static,
  {
    self
      .factories
      .insert(class.to_string(), Box::new(move || Box::new(factory()) as Box<dyn TaskUnit>));
    self
  }

  /// Register a unit constructed through [`Default`].
  pub fn register_default<U: TaskUnit + Default + 'static>(&mut self, class: &str) -> &mut Self {
    self.register(class, U::default)
  }

  pub fn contains(&self, class: &str) -> bool {
    self.factories.contains_key(class)
  }

  /// Construct the unit a resolved target names.
  pub fn instantiate(&self, target: &ResolvedTarget) -> Result<Box<dyn TaskUnit>, BuildError> {
    if let Some(factory) = self.factories.get(&target.class_name) {
      debug!(class = %target.class_name, "instantiating compiled-in unit");
      return Ok(factory());
    }

    if lua::is_script(&target.file) {
      debug!(class = %target.class_name, file = %target.file.display(), "loading script unit");
      return Ok(Box::new(lua::LuaUnit::load(&target.file, &target.class_name)?));
    }

    Err(BuildError::UnitNotFound {
      class: target.class_name.clone(),
      file: target.file.clone(),
    })
  }
}
