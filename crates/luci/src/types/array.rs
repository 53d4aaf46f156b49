//! Methods shared by the three array variants. Mutating methods refuse a
//! frozen receiver.

use crate::errors::{ErrorObj, EvalResult, Flow};
use crate::evaluator::Evaluator;
use crate::object::{boolean_obj, deep_clone, integer_obj, null_obj, ObjectKind, ObjectRef};
use crate::token::Token;

use super::{expect_method_args, wrong_receiver, TypeTable};

pub fn table() -> TypeTable {
    let mut table = TypeTable::default();
    table.method("capacity", "", "int", capacity);
    table.method("clear", "", "[all]", clear);
    table.method("empty", "", "bool", empty);
    table.method("push_back", "all", "[all]", push_back);
    table.method("pop_back", "", "[all]", pop_back);
    table.method("reserve", "int", "[all]", reserve);
    table.method("reverse", "", "[all]", reverse);
    table.method("reversed", "", "[all]", reversed);
    table.method("size", "", "int", size);
    table.method("rotate", "int", "[all]", rotate);
    table.method("rotated", "int", "[all]", rotated);
    table
}

fn require_unfrozen(receiver: &ObjectRef, name: &str) -> Result<(), Flow> {
    if receiver.borrow().frozen > 0 {
        return Err(Flow::Error(ErrorObj::type_err(format!(
            "array {name} expects a non-frozen object"
        ))));
    }
    Ok(())
}

fn length_of(receiver: &ObjectRef) -> Option<usize> {
    match &receiver.borrow().kind {
        ObjectKind::Array(items) => Some(items.len()),
        ObjectKind::ArrayDouble(items) => Some(items.len()),
        ObjectKind::ArrayComplex(items) => Some(items.len()),
        _ => None,
    }
}

fn capacity(
    _evaluator: &mut Evaluator<'_>,
    receiver: &ObjectRef,
    values: Vec<ObjectRef>,
    _token: &Token,
) -> EvalResult {
    expect_method_args("capacity", &values, &[0])?;
    let capacity = match &receiver.borrow().kind {
        ObjectKind::Array(items) => items.capacity(),
        ObjectKind::ArrayDouble(items) => items.capacity(),
        ObjectKind::ArrayComplex(items) => items.capacity(),
        _ => return Err(wrong_receiver("capacity", "Array", receiver)),
    };
    Ok(integer_obj(capacity as i64))
}

fn clear(
    _evaluator: &mut Evaluator<'_>,
    receiver: &ObjectRef,
    values: Vec<ObjectRef>,
    _token: &Token,
) -> EvalResult {
    expect_method_args("clear", &values, &[0])?;
    require_unfrozen(receiver, "clear")?;
    match &mut receiver.borrow_mut().kind {
        ObjectKind::Array(items) => items.clear(),
        ObjectKind::ArrayDouble(items) => items.clear(),
        ObjectKind::ArrayComplex(items) => items.clear(),
        _ => return Err(wrong_receiver("clear", "Array", receiver)),
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
    match length_of(receiver) {
        Some(length) => Ok(boolean_obj(length == 0)),
        None => Err(wrong_receiver("empty", "Array", receiver)),
    }
}

fn push_back(
    _evaluator: &mut Evaluator<'_>,
    receiver: &ObjectRef,
    values: Vec<ObjectRef>,
    _token: &Token,
) -> EvalResult {
    expect_method_args("push_back", &values, &[1])?;
    require_unfrozen(receiver, "push_back")?;
    let item = values.into_iter().next().unwrap_or_else(null_obj);

    match receiver.borrow().tag() {
        crate::object::Tag::Array => {}
        crate::object::Tag::ArrayDouble => {
            let appended = match &item.borrow().kind {
                ObjectKind::Double(value) => *value,
                other => {
                    return Err(Flow::Error(ErrorObj::type_err(format!(
                        "push_back: cannot append {} to [double]",
                        other.tag()
                    ))))
                }
            };
            if let ObjectKind::ArrayDouble(items) = &mut receiver.borrow_mut().kind {
                items.push(appended);
            }
            return Ok(receiver.clone());
        }
        crate::object::Tag::ArrayComplex => {
            let appended = match &item.borrow().kind {
                ObjectKind::Complex(value) => *value,
                other => {
                    return Err(Flow::Error(ErrorObj::type_err(format!(
                        "push_back: cannot append {} to [complex]",
                        other.tag()
                    ))))
                }
            };
            if let ObjectKind::ArrayComplex(items) = &mut receiver.borrow_mut().kind {
                items.push(appended);
            }
            return Ok(receiver.clone());
        }
        _ => return Err(wrong_receiver("push_back", "Array", receiver)),
    }
    if let ObjectKind::Array(items) = &mut receiver.borrow_mut().kind {
        items.push(item);
    }
    Ok(receiver.clone())
}

fn pop_back(
    _evaluator: &mut Evaluator<'_>,
    receiver: &ObjectRef,
    values: Vec<ObjectRef>,
    _token: &Token,
) -> EvalResult {
    expect_method_args("pop_back", &values, &[0])?;
    require_unfrozen(receiver, "pop_back")?;
    let mut guard = receiver.borrow_mut();
    match &mut guard.kind {
        ObjectKind::Array(items) => {
            items.pop();
        }
        ObjectKind::ArrayDouble(items) => {
            items.pop();
        }
        ObjectKind::ArrayComplex(items) => {
            items.pop();
        }
        _ => return Err(wrong_receiver("pop_back", "Array", receiver)),
    }
    drop(guard);
    Ok(receiver.clone())
}

fn reserve(
    _evaluator: &mut Evaluator<'_>,
    receiver: &ObjectRef,
    values: Vec<ObjectRef>,
    _token: &Token,
) -> EvalResult {
    expect_method_args("reserve", &values, &[1])?;
    let additional = match &values[0].borrow().kind {
        ObjectKind::Integer(value) if *value >= 0 => *value as usize,
        _ => {
            return Err(Flow::Error(ErrorObj::type_err(
                "reserve: expected argument 1 of type integer",
            )))
        }
    };
    let mut guard = receiver.borrow_mut();
    match &mut guard.kind {
        ObjectKind::Array(items) => items.reserve(additional.saturating_sub(items.len())),
        ObjectKind::ArrayDouble(items) => items.reserve(additional.saturating_sub(items.len())),
        ObjectKind::ArrayComplex(items) => items.reserve(additional.saturating_sub(items.len())),
        _ => return Err(wrong_receiver("reserve", "Array", receiver)),
    }
    drop(guard);
    Ok(receiver.clone())
}

fn reverse(
    _evaluator: &mut Evaluator<'_>,
    receiver: &ObjectRef,
    values: Vec<ObjectRef>,
    _token: &Token,
) -> EvalResult {
    expect_method_args("reverse", &values, &[0])?;
    require_unfrozen(receiver, "reverse")?;
    let mut guard = receiver.borrow_mut();
    match &mut guard.kind {
        ObjectKind::Array(items) => items.reverse(),
        ObjectKind::ArrayDouble(items) => items.reverse(),
        ObjectKind::ArrayComplex(items) => items.reverse(),
        _ => return Err(wrong_receiver("reverse", "Array", receiver)),
    }
    drop(guard);
    Ok(receiver.clone())
}

fn reversed(
    _evaluator: &mut Evaluator<'_>,
    receiver: &ObjectRef,
    values: Vec<ObjectRef>,
    _token: &Token,
) -> EvalResult {
    expect_method_args("reversed", &values, &[0])?;
    let copy = deep_clone(receiver);
    let mut guard = copy.borrow_mut();
    match &mut guard.kind {
        ObjectKind::Array(items) => items.reverse(),
        ObjectKind::ArrayDouble(items) => items.reverse(),
        ObjectKind::ArrayComplex(items) => items.reverse(),
        _ => return Err(wrong_receiver("reversed", "Array", receiver)),
    }
    drop(guard);
    Ok(copy)
}

fn size(
    _evaluator: &mut Evaluator<'_>,
    receiver: &ObjectRef,
    values: Vec<ObjectRef>,
    _token: &Token,
) -> EvalResult {
    expect_method_args("size", &values, &[0])?;
    match length_of(receiver) {
        Some(length) => Ok(integer_obj(length as i64)),
        None => Err(wrong_receiver("size", "Array", receiver)),
    }
}

fn rotation_argument(values: &[ObjectRef]) -> Result<i64, Flow> {
    match &values[0].borrow().kind {
        ObjectKind::Integer(value) => Ok(*value),
        _ => Err(Flow::Error(ErrorObj::type_err(
            "rotate: expected argument 1 of type integer",
        ))),
    }
}

fn rotate_slice<T>(items: &mut [T], places: i64) {
    if items.is_empty() {
        return;
    }
    let shift = places.rem_euclid(items.len() as i64) as usize;
    items.rotate_left(shift);
}

fn rotate(
    _evaluator: &mut Evaluator<'_>,
    receiver: &ObjectRef,
    values: Vec<ObjectRef>,
    _token: &Token,
) -> EvalResult {
    expect_method_args("rotate", &values, &[1])?;
    require_unfrozen(receiver, "rotate")?;
    let places = rotation_argument(&values)?;
    let mut guard = receiver.borrow_mut();
    match &mut guard.kind {
        ObjectKind::Array(items) => rotate_slice(items, places),
        ObjectKind::ArrayDouble(items) => rotate_slice(items, places),
        ObjectKind::ArrayComplex(items) => rotate_slice(items, places),
        _ => return Err(wrong_receiver("rotate", "Array", receiver)),
    }
    drop(guard);
    Ok(receiver.clone())
}

fn rotated(
    _evaluator: &mut Evaluator<'_>,
    receiver: &ObjectRef,
    values: Vec<ObjectRef>,
    _token: &Token,
) -> EvalResult {
    expect_method_args("rotated", &values, &[1])?;
    let places = rotation_argument(&values)?;
    let copy = deep_clone(receiver);
    let mut guard = copy.borrow_mut();
    match &mut guard.kind {
        ObjectKind::Array(items) => rotate_slice(items, places),
        ObjectKind::ArrayDouble(items) => rotate_slice(items, places),
        ObjectKind::ArrayComplex(items) => rotate_slice(items, places),
        _ => return Err(wrong_receiver("rotated", "Array", receiver)),
    }
    drop(guard);
    Ok(copy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotate_left_and_negative() {
        let mut items = vec![1, 2, 3, 4];
        rotate_slice(&mut items, 1);
        assert_eq!(items, vec![2, 3, 4, 1]);
        rotate_slice(&mut items, -1);
        assert_eq!(items, vec![1, 2, 3, 4]);
    }
}
