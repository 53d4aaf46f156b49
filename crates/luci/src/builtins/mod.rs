//! The builtin registry: global builtin functions, the per-tag method
//! tables and the builtin modules.
//!
//! Every builtin carries a declared function type (built through
//! [`crate::typing::make_function_type`]) used by type inference and by
//! `type_str`. Builtins receive their arguments unevaluated, like user
//! syntax nodes, and evaluate them against the caller's environment.

mod arrays;
mod convert;
mod freeze;
mod misc;
mod print;
mod sort;

use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::ast::{Expression, TypeExpression};
use crate::env::EnvRef;
use crate::errors::{ErrorObj, EvalResult, Flow};
use crate::evaluator::Evaluator;
use crate::object::{ObjectRef, Tag};
use crate::token::Token;
use crate::types::{build_type_tables, TypeTable};
use crate::typing::make_function_type;

pub type BuiltinFn =
    Box<dyn Fn(&mut Evaluator<'_>, &[Expression], &EnvRef, &Token) -> EvalResult>;

pub struct BuiltinDef {
    pub name: String,
    pub func: BuiltinFn,
    /// Declared signature, e.g. `fn(<[all],{all:all},str>) -> int`.
    pub declared_type: Arc<TypeExpression>,
}

/// Names → builtin functions, per-tag method tables and builtin modules.
/// Built once at interpreter startup.
pub struct Registry {
    pub builtins: IndexMap<String, Rc<BuiltinDef>, ahash::RandomState>,
    pub type_tables: HashMap<Tag, TypeTable>,
    pub modules: IndexMap<String, ObjectRef, ahash::RandomState>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        let mut builtins: IndexMap<String, Rc<BuiltinDef>, ahash::RandomState> =
            IndexMap::default();

        let mut add = |name: &str,
                       argument_types: &str,
                       return_type: &str,
                       func: BuiltinFn| {
            builtins.insert(
                name.to_string(),
                Rc::new(BuiltinDef {
                    name: name.to_string(),
                    func,
                    declared_type: make_function_type(argument_types, return_type),
                }),
            );
        };

        // object identity and internals
        add("address", "all", "int", Box::new(misc::address));
        add("internal_type_str", "all", "str", Box::new(misc::internal_type_str));

        // dictionary and set support
        add("lookup_hashable", "all", "bool", Box::new(misc::lookup_hashable));
        add("lookup_hash", "all", "int", Box::new(misc::lookup_hash));
        add("lookup_equal", "all, all", "bool", Box::new(misc::lookup_equal));

        // freeze protocol
        add("frozen", "all", "bool", Box::new(freeze::frozen));
        add("freeze", "all", "all", Box::new(freeze::freeze));
        add("defrost", "all", "all", Box::new(freeze::defrost));
        add("freezer", "all", "freezer", Box::new(freeze::freezer));

        // type system
        add("type_str", "all", "str", Box::new(misc::type_str));

        // errors
        add("error", "str", "error", Box::new(misc::error));

        // duplicating objects
        add("clone", "all", "all", Box::new(misc::clone));

        // documentation
        add("doc", "all", "str", Box::new(misc::doc));

        // communication with the outside world
        add("print", "all", "null", Box::new(print::print));
        add("eprint", "all", "null", Box::new(print::eprint));
        add("input_line", "", "str", Box::new(misc::input_line));
        add("version", "", "[int]", Box::new(misc::version));
        add("arg", "", "[str]", Box::new(misc::arg));
        add("format", "str, all", "str", Box::new(misc::format));

        // interpreter control
        add("run", "str", "null", Box::new(misc::run));
        add("run_once", "str", "null", Box::new(misc::run_once));
        add("exit", "int", "null", Box::new(misc::exit));

        // module control
        add("import", "str", "module", Box::new(misc::import));

        // environment query
        add("scope_names", "", "[str]", Box::new(misc::scope_names));

        // constructors for non-trivial empty builtins
        add("array", "", "[all]", Box::new(convert::array));
        add("array_double", "", "[double]", Box::new(convert::array_double));
        add("array_complex", "", "[complex]", Box::new(convert::array_complex));
        add("complex", "", "complex", Box::new(convert::complex));
        add("dict", "", "{all:all}", Box::new(convert::dict));
        add("set", "", "{all}", Box::new(convert::set));

        // arrays
        add("append", "[all], all", "[all]", Box::new(arrays::append));
        add("slice", "[all], int, int", "[all]", Box::new(arrays::slice));
        add("update", "[all], int, all", "[all]", Box::new(arrays::update));
        add("rotate", "[all], int", "[all]", Box::new(arrays::rotate));
        add("reverse", "[all]", "[all]", Box::new(arrays::reverse));
        add("sort", "[all]", "<bool>", Box::new(sort::sort));
        add("reversed", "[all]", "[all]", Box::new(arrays::reversed));
        add("rotated", "[all], int", "[all]", Box::new(arrays::rotated));
        add("sorted", "[all]", "[all]", Box::new(sort::sorted));
        add("is_sorted", "[all]", "bool", Box::new(sort::is_sorted));

        // ranges
        add("range", "int, int", "range", Box::new(convert::range));

        // arrays/dictionary/string
        add("len", "<[all],{all:all},str>", "int", Box::new(misc::len));

        // dictionary
        add("values", "{all:all}", "[all]", Box::new(misc::values));
        add("keys", "{all:all}", "[all]", Box::new(misc::keys));

        // string casts
        add("to_bool", "str", "bool", Box::new(convert::to_bool));
        add("to_int", "str", "int", Box::new(convert::to_int));
        add("to_double", "str", "double", Box::new(convert::to_double));

        // io
        add("open", "str", "io", Box::new(misc::open));

        Self {
            builtins,
            type_tables: build_type_tables(),
            modules: crate::modules::build_modules(),
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator<'_> {
    /// Evaluates builtin arguments in order, unwrapping bound properties.
    pub(crate) fn eval_builtin_args(
        &mut self,
        arguments: &[Expression],
        env: &EnvRef,
    ) -> Result<Vec<ObjectRef>, Flow> {
        let mut values = Vec::with_capacity(arguments.len());
        for argument in arguments {
            let value = self.eval_expression(argument, env, None)?;
            values.push(self.unwrap_member_value(value));
        }
        Ok(values)
    }
}

/// Argument count check shared by the builtin implementations.
pub(crate) fn expect_args(
    name: &str,
    values: &[ObjectRef],
    expected: usize,
) -> Result<(), Flow> {
    if values.len() == expected {
        Ok(())
    } else {
        Err(Flow::Error(ErrorObj::type_err(format!(
            "{name}: expected {expected} arguments, got {}",
            values.len()
        ))))
    }
}
