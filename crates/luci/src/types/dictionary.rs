//! Dictionary methods.

use crate::errors::{ErrorObj, EvalResult, Flow};
use crate::evaluator::Evaluator;
use crate::object::{alloc, boolean_obj, integer_obj, ObjectKind, ObjectRef};
use crate::token::Token;

use super::{expect_method_args, wrong_receiver, TypeTable};

pub fn table() -> TypeTable {
    let mut table = TypeTable::default();
    table.method("clear", "", "{all:all}", clear);
    table.method("empty", "", "bool", empty);
    table.method("size", "", "int", size);
    table.method("keys", "", "[all]", keys);
    table.method("values", "", "[all]", values_method);
    table.method("items", "", "[[all]]", items);
    table.method("update", "{all:all}", "{all:all}", update);
    table
}

fn clear(
    _evaluator: &mut Evaluator<'_>,
    receiver: &ObjectRef,
    values: Vec<ObjectRef>,
    _token: &Token,
) -> EvalResult {
    expect_method_args("clear", &values, &[0])?;
    if receiver.borrow().frozen > 0 {
        return Err(Flow::Error(ErrorObj::type_err(
            "dictionary clear expects a non-frozen object",
        )));
    }
    match &mut receiver.borrow_mut().kind {
        ObjectKind::Dictionary(map) => map.clear(),
        _ => return Err(wrong_receiver("clear", "Dictionary", receiver)),
    }
    Ok(receiver.clone())
}

fn empty(
    _evaluator: &mut Evaluator<'_>,
    receiver: &ObjectRef,
    values: Vec<ObjectRef>,
    _token: &Token,
) -> EvalResult {
    expect_method_args("empty", &values, &[0])?;
    match &receiver.borrow().kind {
        ObjectKind::Dictionary(map) => Ok(boolean_obj(map.is_empty())),
        _ => Err(wrong_receiver("empty", "Dictionary", receiver)),
    }
}

fn size(
    _evaluator: &mut Evaluator<'_>,
    receiver: &ObjectRef,
    values: Vec<ObjectRef>,
    _token: &Token,
) -> EvalResult {
    expect_method_args("size", &values, &[0])?;
    match &receiver.borrow().kind {
        ObjectKind::Dictionary(map) => Ok(integer_obj(map.len() as i64)),
        _ => Err(wrong_receiver("size", "Dictionary", receiver)),
    }
}

fn keys(
    _evaluator: &mut Evaluator<'_>,
    receiver: &ObjectRef,
    values: Vec<ObjectRef>,
    _token: &Token,
) -> EvalResult {
    expect_method_args("keys", &values, &[0])?;
    match &receiver.borrow().kind {
        ObjectKind::Dictionary(map) => Ok(alloc(ObjectKind::Array(
            map.keys().map(|key| key.0.clone()).collect(),
        ))),
        _ => Err(wrong_receiver("keys", "Dictionary", receiver)),
    }
}

fn values_method(
    _evaluator: &mut Evaluator<'_>,
    receiver: &ObjectRef,
    values: Vec<ObjectRef>,
    _token: &Token,
) -> EvalResult {
    expect_method_args("values", &values, &[0])?;
    match &receiver.borrow().kind {
        ObjectKind::Dictionary(map) => Ok(alloc(ObjectKind::Array(
            map.values().cloned().collect(),
        ))),
        _ => Err(wrong_receiver("values", "Dictionary", receiver)),
    }
}

/// `items()` yields `[key, value]` pairs in insertion order.
fn items(
    _evaluator: &mut Evaluator<'_>,
    receiver: &ObjectRef,
    values: Vec<ObjectRef>,
    _token: &Token,
) -> EvalResult {
    expect_method_args("items", &values, &[0])?;
    match &receiver.borrow().kind {
        ObjectKind::Dictionary(map) => {
            let pairs = map
                .iter()
                .map(|(key, value)| {
                    alloc(ObjectKind::Array(vec![key.0.clone(), value.clone()]))
                })
                .collect();
            Ok(alloc(ObjectKind::Array(pairs)))
        }
        _ => Err(wrong_receiver("items", "Dictionary", receiver)),
    }
}

/// Merges another dictionary into the receiver, overwriting existing
/// keys.
fn update(
    _evaluator: &mut Evaluator<'_>,
    receiver: &ObjectRef,
    values: Vec<ObjectRef>,
    _token: &Token,
) -> EvalResult {
    expect_method_args("update", &values, &[1])?;
    if receiver.borrow().frozen > 0 {
        return Err(Flow::Error(ErrorObj::type_err(
            "dictionary update expects a non-frozen object",
        )));
    }
    let additions: Vec<(ObjectRef, ObjectRef)> = match &values[0].borrow().kind {
        ObjectKind::Dictionary(map) => map
            .iter()
            .map(|(key, value)| (key.0.clone(), value.clone()))
            .collect(),
        _ => {
            return Err(Flow::Error(ErrorObj::type_err(
                "update: expected argument 1 of type dictionary",
            )))
        }
    };
    match &mut receiver.borrow_mut().kind {
        ObjectKind::Dictionary(map) => {
            for (key, value) in additions {
                map.insert(crate::object::HashKey(key), value);
            }
        }
        _ => return Err(wrong_receiver("update", "Dictionary", receiver)),
    }
    Ok(receiver.clone())
}
