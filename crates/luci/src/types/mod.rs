//! Per-tag method tables for the builtin types.
//!
//! Member access on a builtin value resolves against the table for its
//! tag and yields a bound function carrying the receiver. Methods
//! validate their own receiver tag and argument count.

pub mod array;
pub mod dictionary;
pub mod error;
pub mod io;
pub mod set;
pub mod string;
pub mod thread;

use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::ast::TypeExpression;
use crate::errors::{ErrorObj, EvalResult, Flow};
use crate::evaluator::Evaluator;
use crate::object::{ObjectRef, PropertySlot, Tag};
use crate::token::Token;
use crate::typing::make_function_type;

pub type TypeMethodFn =
    fn(&mut Evaluator<'_>, &ObjectRef, Vec<ObjectRef>, &Token) -> EvalResult;

pub struct TypeMethodDef {
    pub name: &'static str,
    pub func: TypeMethodFn,
    /// Declared method signature, used for inference and `type_str`.
    pub declared_type: Arc<TypeExpression>,
}

/// Method and property tables of one builtin tag.
#[derive(Default)]
pub struct TypeTable {
    pub functions: IndexMap<&'static str, Rc<TypeMethodDef>, ahash::RandomState>,
    pub properties: IndexMap<&'static str, PropertySlot, ahash::RandomState>,
}

impl TypeTable {
    pub fn method(
        &mut self,
        name: &'static str,
        argument_types: &str,
        return_type: &str,
        func: TypeMethodFn,
    ) {
        self.functions.insert(
            name,
            Rc::new(TypeMethodDef {
                name,
                func,
                declared_type: make_function_type(argument_types, return_type),
            }),
        );
    }
}

/// Builds the tag → method-table registry.
#[must_use]
pub fn build_type_tables() -> HashMap<Tag, TypeTable> {
    let mut tables = HashMap::new();
    tables.insert(Tag::Array, array::table());
    tables.insert(Tag::ArrayDouble, array::table());
    tables.insert(Tag::ArrayComplex, array::table());
    tables.insert(Tag::Dictionary, dictionary::table());
    tables.insert(Tag::Set, set::table());
    tables.insert(Tag::String, string::table());
    tables.insert(Tag::Error, error::table());
    tables.insert(Tag::IOObject, io::table());
    tables.insert(Tag::Thread, thread::table());
    tables
}

/// Shared receiver/argument validation for the method implementations.
pub(crate) fn expect_method_args(
    name: &str,
    values: &[ObjectRef],
    allowed: &[usize],
) -> Result<(), Flow> {
    if allowed.contains(&values.len()) {
        return Ok(());
    }
    let rendered: Vec<String> = allowed.iter().map(ToString::to_string).collect();
    Err(Flow::Error(ErrorObj::type_err(format!(
        "{name}: expected {} arguments, got {}",
        rendered.join(","),
        values.len()
    ))))
}

pub(crate) fn wrong_receiver(name: &str, expected: &str, receiver: &ObjectRef) -> Flow {
    Flow::Error(ErrorObj::type_err(format!(
        "{name}: expected {expected}, got {}",
        receiver.borrow().tag()
    )))
}
