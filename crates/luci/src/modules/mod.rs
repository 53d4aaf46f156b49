//! Builtin modules, populated by the host at startup: `math`, `os`,
//! `json`, `regex`, `threading`, `time`, `typing` and `error_type`.

pub mod error_type;
pub mod json;
pub mod math;
pub mod os_mod;
pub mod regex_mod;
pub mod threading;
pub mod time_mod;
pub mod typing_mod;

use std::rc::Rc;

use indexmap::IndexMap;

use crate::builtins::{BuiltinDef, BuiltinFn};
use crate::env::{EnvRef, Environment};
use crate::object::{alloc, ModuleObj, ModuleState, ObjectKind, ObjectRef};
use crate::typing::make_function_type;

/// Name → module value for every builtin module.
#[must_use]
pub fn build_modules() -> IndexMap<String, ObjectRef, ahash::RandomState> {
    let mut modules: IndexMap<String, ObjectRef, ahash::RandomState> = IndexMap::default();
    modules.insert("error_type".to_string(), error_type::create_module());
    modules.insert("math".to_string(), math::create_module());
    modules.insert("json".to_string(), json::create_module());
    modules.insert("os".to_string(), os_mod::create_module());
    modules.insert("regex".to_string(), regex_mod::create_module());
    modules.insert("time".to_string(), time_mod::create_module());
    modules.insert("threading".to_string(), threading::create_module());
    modules.insert("typing".to_string(), typing_mod::create_module());
    modules
}

/// Allocates a loaded module over the given environment.
pub(crate) fn module_value(env: EnvRef) -> ObjectRef {
    alloc(ObjectKind::Module(ModuleObj {
        state: ModuleState::Loaded,
        env,
        file_name: String::new(),
    }))
}

pub(crate) fn new_module_env() -> EnvRef {
    Environment::new(None)
}

/// Registers a builtin function in a module environment.
pub(crate) fn add_function(
    env: &EnvRef,
    name: &str,
    argument_types: &str,
    return_type: &str,
    func: BuiltinFn,
) {
    let builtin = alloc(ObjectKind::Builtin(Rc::new(BuiltinDef {
        name: name.to_string(),
        func,
        declared_type: make_function_type(argument_types, return_type),
    })));
    let _ = env.borrow_mut().add(name, builtin, false, None);
}
