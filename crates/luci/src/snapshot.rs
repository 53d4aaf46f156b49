//! Send-able deep snapshots of runtime values.
//!
//! `thread(fn).start()` cannot ship `Rc`-based values to another OS
//! thread; instead the function and its captured environment chain are
//! copied into this plain tree on the spawning thread, sent across, and
//! rehydrated into fresh values by the thread's own evaluator. Values
//! owning host resources (io handles, threads, iterators, freezers) have
//! no meaningful clone on another thread and snapshot to null; modules are
//! skipped.

use std::collections::HashSet;
use std::rc::Rc;
use std::sync::Arc;

use num_complex::Complex64;

use crate::ast::{BlockStatement, Identifier, TypeExpression};
use crate::env::{EnvRef, Environment};
use crate::errors::ErrorKind;
use crate::object::{
    alloc, null_obj, DictMap, FunctionObj, HashKey, ObjectKind, ObjectRef, Property, PropertyMap,
    Range, SetData, UserInstance, UserTypeObj,
};

#[derive(Debug, Clone)]
pub enum SnapshotValue {
    Null,
    Integer(i64),
    Double(f64),
    Complex(Complex64),
    Boolean(bool),
    Char(u32),
    Str(String),
    Range(Range),
    Array(Vec<SnapshotValue>),
    ArrayDouble(Vec<f64>),
    ArrayComplex(Vec<Complex64>),
    Dict(Vec<(SnapshotValue, SnapshotValue)>),
    Set(Vec<SnapshotValue>),
    Error { kind: ErrorKind, message: String },
    Function(Box<SnapshotFunction>),
    UserType(Box<SnapshotUserType>),
    UserObject(Box<SnapshotUserObject>),
    Regex(String),
}

#[derive(Debug, Clone)]
pub struct SnapshotBinding {
    pub name: String,
    pub value: SnapshotValue,
    pub constant: bool,
    pub declared_type: Option<Arc<TypeExpression>>,
}

/// One environment frame, innermost frame last when chained.
#[derive(Debug, Clone)]
pub struct SnapshotFrame {
    pub bindings: Vec<SnapshotBinding>,
}

#[derive(Debug, Clone)]
pub struct SnapshotFunction {
    pub arguments: Vec<Identifier>,
    pub argument_types: Vec<Option<Arc<TypeExpression>>>,
    pub return_type: Option<Arc<TypeExpression>>,
    pub body: Arc<BlockStatement>,
    /// Captured environment chain, outermost first. `None` when the chain
    /// was cut to break a cycle; such functions re-capture the environment
    /// they are rehydrated into.
    pub env: Option<Vec<SnapshotFrame>>,
}

#[derive(Debug, Clone)]
pub struct SnapshotUserType {
    pub name: String,
    pub doc: Option<String>,
    pub functions: Vec<(String, SnapshotFunction)>,
    pub properties: Vec<(String, SnapshotValue, bool, Option<Arc<TypeExpression>>)>,
}

#[derive(Debug, Clone)]
pub struct SnapshotUserObject {
    pub user_type: SnapshotUserType,
    pub properties: Vec<(String, SnapshotValue, bool, Option<Arc<TypeExpression>>)>,
    pub has_destructor: bool,
}

/// Tracks environments currently being walked so closure cycles
/// (a function reachable from its own captured scope) terminate.
#[derive(Default)]
pub struct SnapshotTracker {
    visiting: HashSet<*const ()>,
}

/// Copies a value into its Send-able snapshot form.
#[must_use]
pub fn snapshot_value(object: &ObjectRef, tracker: &mut SnapshotTracker) -> SnapshotValue {
    let object = object.borrow();
    match &object.kind {
        ObjectKind::Null => SnapshotValue::Null,
        ObjectKind::Integer(value) => SnapshotValue::Integer(*value),
        ObjectKind::Double(value) => SnapshotValue::Double(*value),
        ObjectKind::Complex(value) => SnapshotValue::Complex(*value),
        ObjectKind::Boolean(value) => SnapshotValue::Boolean(*value),
        ObjectKind::Char(value) => SnapshotValue::Char(*value),
        ObjectKind::Str(value) => SnapshotValue::Str(value.clone()),
        ObjectKind::Range(range) => SnapshotValue::Range(*range),
        ObjectKind::Array(items) => SnapshotValue::Array(
            items
                .iter()
                .map(|item| snapshot_value(item, tracker))
                .collect(),
        ),
        ObjectKind::ArrayDouble(items) => SnapshotValue::ArrayDouble(items.clone()),
        ObjectKind::ArrayComplex(items) => SnapshotValue::ArrayComplex(items.clone()),
        ObjectKind::Dictionary(map) => SnapshotValue::Dict(
            map.iter()
                .map(|(key, value)| {
                    (
                        snapshot_value(&key.0, tracker),
                        snapshot_value(value, tracker),
                    )
                })
                .collect(),
        ),
        ObjectKind::Set(set) => SnapshotValue::Set(
            set.iter()
                .map(|key| snapshot_value(&key.0, tracker))
                .collect(),
        ),
        ObjectKind::Error(error) => SnapshotValue::Error {
            kind: error.kind,
            message: error.message.clone(),
        },
        ObjectKind::Function(function) => {
            SnapshotValue::Function(Box::new(snapshot_function(function, tracker)))
        }
        ObjectKind::UserType(user_type) => {
            SnapshotValue::UserType(Box::new(snapshot_user_type(user_type, tracker)))
        }
        ObjectKind::UserObject(instance) => {
            SnapshotValue::UserObject(Box::new(SnapshotUserObject {
                user_type: snapshot_user_type(&instance.user_type, tracker),
                properties: snapshot_properties(&instance.properties, tracker),
                has_destructor: instance.destructor.is_some(),
            }))
        }
        ObjectKind::Regex(pattern) => SnapshotValue::Regex(pattern.as_str().to_string()),
        // host-resource values do not cross threads
        _ => SnapshotValue::Null,
    }
}

fn snapshot_properties(
    properties: &PropertyMap,
    tracker: &mut SnapshotTracker,
) -> Vec<(String, SnapshotValue, bool, Option<Arc<TypeExpression>>)> {
    properties
        .iter()
        .map(|(name, slot)| {
            let slot = slot.borrow();
            (
                name.clone(),
                snapshot_value(&slot.value, tracker),
                slot.constant,
                slot.declared_type.clone(),
            )
        })
        .collect()
}

fn snapshot_user_type(user_type: &Rc<UserTypeObj>, tracker: &mut SnapshotTracker) -> SnapshotUserType {
    SnapshotUserType {
        name: user_type.name.clone(),
        doc: user_type.doc.clone(),
        functions: user_type
            .functions
            .iter()
            .map(|(name, function)| (name.clone(), snapshot_function(function, tracker)))
            .collect(),
        properties: snapshot_properties(&user_type.properties, tracker),
    }
}

/// Copies a function with its captured environment chain; a chain already
/// being walked is cut off.
#[must_use]
pub fn snapshot_function(function: &Rc<FunctionObj>, tracker: &mut SnapshotTracker) -> SnapshotFunction {
    let env = snapshot_env_chain(&function.env, tracker);
    SnapshotFunction {
        arguments: function.arguments.clone(),
        argument_types: function.argument_types.clone(),
        return_type: function.return_type.clone(),
        body: function.body.clone(),
        env,
    }
}

fn snapshot_env_chain(env: &EnvRef, tracker: &mut SnapshotTracker) -> Option<Vec<SnapshotFrame>> {
    let key = Rc::as_ptr(env).cast::<()>();
    if !tracker.visiting.insert(key) {
        return None;
    }

    let mut chain = vec![];
    let mut frames = vec![env.clone()];
    let mut cursor = env.borrow().outer.clone();
    while let Some(outer) = cursor {
        cursor = outer.borrow().outer.clone();
        frames.push(outer);
    }
    for frame in frames.iter().rev() {
        let frame = frame.borrow();
        let bindings = frame
            .store
            .iter()
            .map(|(name, binding)| SnapshotBinding {
                name: name.clone(),
                value: snapshot_value(&binding.value, tracker),
                constant: binding.constant,
                declared_type: binding.declared_type.clone(),
            })
            .collect();
        chain.push(SnapshotFrame { bindings });
    }

    tracker.visiting.remove(&key);
    Some(chain)
}

/// Rebuilds a snapshot into fresh values. `fallback_env` is handed to
/// functions whose captured chain was cut.
#[must_use]
pub fn rehydrate_value(value: &SnapshotValue, fallback_env: &EnvRef) -> ObjectRef {
    match value {
        SnapshotValue::Null => null_obj(),
        SnapshotValue::Integer(value) => alloc(ObjectKind::Integer(*value)),
        SnapshotValue::Double(value) => alloc(ObjectKind::Double(*value)),
        SnapshotValue::Complex(value) => alloc(ObjectKind::Complex(*value)),
        SnapshotValue::Boolean(value) => alloc(ObjectKind::Boolean(*value)),
        SnapshotValue::Char(value) => alloc(ObjectKind::Char(*value)),
        SnapshotValue::Str(value) => alloc(ObjectKind::Str(value.clone())),
        SnapshotValue::Range(range) => alloc(ObjectKind::Range(*range)),
        SnapshotValue::Array(items) => alloc(ObjectKind::Array(
            items
                .iter()
                .map(|item| rehydrate_value(item, fallback_env))
                .collect(),
        )),
        SnapshotValue::ArrayDouble(items) => alloc(ObjectKind::ArrayDouble(items.clone())),
        SnapshotValue::ArrayComplex(items) => alloc(ObjectKind::ArrayComplex(items.clone())),
        SnapshotValue::Dict(pairs) => {
            let mut map = DictMap::default();
            for (key, value) in pairs {
                let key = rehydrate_value(key, fallback_env);
                key.borrow_mut().frozen = 1;
                map.insert(HashKey(key), rehydrate_value(value, fallback_env));
            }
            alloc(ObjectKind::Dictionary(map))
        }
        SnapshotValue::Set(items) => {
            let mut set = SetData::default();
            for item in items {
                let key = rehydrate_value(item, fallback_env);
                key.borrow_mut().frozen = 1;
                set.insert(HashKey(key));
            }
            alloc(ObjectKind::Set(set))
        }
        SnapshotValue::Error { kind, message } => alloc(ObjectKind::Error(
            crate::errors::ErrorObj::new(*kind, message.clone()),
        )),
        SnapshotValue::Function(function) => alloc(ObjectKind::Function(rehydrate_function(
            function,
            fallback_env,
        ))),
        SnapshotValue::UserType(user_type) => alloc(ObjectKind::UserType(rehydrate_user_type(
            user_type,
            fallback_env,
        ))),
        SnapshotValue::UserObject(instance) => {
            let user_type = rehydrate_user_type(&instance.user_type, fallback_env);
            let destructor = if instance.has_destructor {
                user_type.functions.get("destruct").cloned()
            } else {
                None
            };
            let mut properties = PropertyMap::default();
            for (name, value, constant, declared_type) in &instance.properties {
                properties.insert(
                    name.clone(),
                    Rc::new(std::cell::RefCell::new(Property {
                        value: rehydrate_value(value, fallback_env),
                        constant: *constant,
                        declared_type: declared_type.clone(),
                    })),
                );
            }
            alloc(ObjectKind::UserObject(UserInstance {
                user_type,
                properties,
                destructor,
            }))
        }
        SnapshotValue::Regex(pattern) => match regex::Regex::new(pattern) {
            Ok(compiled) => alloc(ObjectKind::Regex(Rc::new(compiled))),
            Err(_) => null_obj(),
        },
    }
}

#[must_use]
pub fn rehydrate_function(function: &SnapshotFunction, fallback_env: &EnvRef) -> Rc<FunctionObj> {
    let env = match &function.env {
        None => fallback_env.clone(),
        Some(frames) => {
            let mut env = fallback_env.clone();
            for frame in frames {
                let nested = Environment::new(Some(env));
                for binding in &frame.bindings {
                    let value = rehydrate_value(&binding.value, &nested);
                    let _ = nested.borrow_mut().add(
                        &binding.name,
                        value,
                        binding.constant,
                        binding.declared_type.clone(),
                    );
                }
                env = nested;
            }
            env
        }
    };
    Rc::new(FunctionObj {
        doc: None,
        arguments: function.arguments.clone(),
        argument_types: function.argument_types.clone(),
        return_type: function.return_type.clone(),
        body: function.body.clone(),
        env,
    })
}

fn rehydrate_user_type(user_type: &SnapshotUserType, fallback_env: &EnvRef) -> Rc<UserTypeObj> {
    let mut functions = indexmap::IndexMap::default();
    for (name, function) in &user_type.functions {
        functions.insert(name.clone(), rehydrate_function(function, fallback_env));
    }
    let mut properties = PropertyMap::default();
    for (name, value, constant, declared_type) in &user_type.properties {
        properties.insert(
            name.clone(),
            Rc::new(std::cell::RefCell::new(Property {
                value: rehydrate_value(value, fallback_env),
                constant: *constant,
                declared_type: declared_type.clone(),
            })),
        );
    }
    Rc::new(UserTypeObj {
        name: user_type.name.clone(),
        doc: user_type.doc.clone(),
        functions,
        properties,
    })
}
