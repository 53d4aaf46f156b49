//! Global array operations: `append`, `slice`, `update`, `rotate`,
//! `rotated`, `reverse`, `reversed`.

use crate::ast::Expression;
use crate::env::EnvRef;
use crate::errors::{ErrorKind, ErrorObj, EvalResult, Flow};
use crate::evaluator::index::normalized_array_index;
use crate::evaluator::Evaluator;
use crate::object::{alloc, deep_clone, ObjectKind, ObjectRef, Tag};
use crate::token::Token;

fn require_unfrozen(value: &ObjectRef, what: &str) -> Result<(), Flow> {
    if value.borrow().frozen > 0 {
        return Err(Flow::Error(ErrorObj::type_err(format!(
            "array {what} expects a non-frozen object"
        ))));
    }
    Ok(())
}

pub fn append(
    evaluator: &mut Evaluator<'_>,
    arguments: &[Expression],
    env: &EnvRef,
    _token: &Token,
) -> EvalResult {
    let values = evaluator.eval_builtin_args(arguments, env)?;
    super::expect_args("append", &values, 2)?;
    let target = &values[0];
    require_unfrozen(target, "push_back")?;
    let item = values[1].clone();

    match target.borrow().tag() {
        Tag::Array => {}
        Tag::ArrayDouble => {
            let appended = match &item.borrow().kind {
                ObjectKind::Double(value) => *value,
                other => {
                    return Err(Flow::Error(ErrorObj::type_err(format!(
                        "append: cannot append {} to [double]",
                        other.tag()
                    ))))
                }
            };
            if let ObjectKind::ArrayDouble(items) = &mut target.borrow_mut().kind {
                items.push(appended);
            }
            return Ok(target.clone());
        }
        Tag::ArrayComplex => {
            let appended = match &item.borrow().kind {
                ObjectKind::Complex(value) => *value,
                other => {
                    return Err(Flow::Error(ErrorObj::type_err(format!(
                        "append: cannot append {} to [complex]",
                        other.tag()
                    ))))
                }
            };
            if let ObjectKind::ArrayComplex(items) = &mut target.borrow_mut().kind {
                items.push(appended);
            }
            return Ok(target.clone());
        }
        other => {
            return Err(Flow::Error(ErrorObj::type_err(format!(
                "Invalid argument for first argument for append: {other}"
            ))))
        }
    }
    if let ObjectKind::Array(items) = &mut target.borrow_mut().kind {
        items.push(item);
    }
    Ok(target.clone())
}

pub fn slice(
    evaluator: &mut Evaluator<'_>,
    arguments: &[Expression],
    env: &EnvRef,
    token: &Token,
) -> EvalResult {
    let values = evaluator.eval_builtin_args(arguments, env)?;
    super::expect_args("slice", &values, 3)?;
    let target = &values[0];

    let length = array_like_length(target).ok_or_else(|| {
        Flow::Error(ErrorObj::type_err(format!(
            "Invalid argument for first argument for slice: {}",
            target.borrow().tag()
        )))
    })?;

    let start = integer_argument(&values[1], "second", "slice")?;
    let stop = integer_argument(&values[2], "third", "slice")?;

    let start_index = normalized_array_index(start, length);
    let stop_index = normalized_array_index(stop, length).max(start_index);

    if start_index >= length {
        return Err(Flow::Error(ErrorObj::with_token(
            ErrorKind::IndexError,
            format!("Slicing error, start index={start_index}, array size={length}"),
            token.clone(),
        )));
    }
    if stop_index > length {
        return Err(Flow::Error(ErrorObj::with_token(
            ErrorKind::IndexError,
            format!("Slicing error, stop index={stop_index}, array size={length}"),
            token.clone(),
        )));
    }

    let guard = target.borrow();
    let sliced = match &guard.kind {
        ObjectKind::Array(items) => ObjectKind::Array(items[start_index..stop_index].to_vec()),
        ObjectKind::ArrayDouble(items) => {
            ObjectKind::ArrayDouble(items[start_index..stop_index].to_vec())
        }
        ObjectKind::ArrayComplex(items) => {
            ObjectKind::ArrayComplex(items[start_index..stop_index].to_vec())
        }
        _ => unreachable!("length computed above"),
    };
    Ok(alloc(sliced))
}

/// `update(container, index, value)` shares the index-assignment path.
pub fn update(
    evaluator: &mut Evaluator<'_>,
    arguments: &[Expression],
    env: &EnvRef,
    token: &Token,
) -> EvalResult {
    let values = evaluator.eval_builtin_args(arguments, env)?;
    super::expect_args("update", &values, 3)?;
    evaluator.update_container(&values[0], &values[1], &values[2], token)
}

/// Rotates in place by the given number of places, to the left for
/// positive counts.
pub fn rotate(
    evaluator: &mut Evaluator<'_>,
    arguments: &[Expression],
    env: &EnvRef,
    _token: &Token,
) -> EvalResult {
    let values = evaluator.eval_builtin_args(arguments, env)?;
    super::expect_args("rotate", &values, 2)?;
    let target = &values[0];
    require_unfrozen(target, "rotate")?;
    let places = integer_argument(&values[1], "second", "rotate")?;

    let mut guard = target.borrow_mut();
    match &mut guard.kind {
        ObjectKind::Array(items) => rotate_in_place(items, places),
        ObjectKind::ArrayDouble(items) => rotate_in_place(items, places),
        ObjectKind::ArrayComplex(items) => rotate_in_place(items, places),
        other => {
            return Err(Flow::Error(ErrorObj::type_err(format!(
                "Invalid argument for first argument for rotate: {}",
                other.tag()
            ))))
        }
    }
    drop(guard);
    Ok(target.clone())
}

pub fn rotated(
    evaluator: &mut Evaluator<'_>,
    arguments: &[Expression],
    env: &EnvRef,
    _token: &Token,
) -> EvalResult {
    let values = evaluator.eval_builtin_args(arguments, env)?;
    super::expect_args("rotated", &values, 2)?;
    let copy = deep_clone(&values[0]);
    let places = integer_argument(&values[1], "second", "rotated")?;

    let mut guard = copy.borrow_mut();
    match &mut guard.kind {
        ObjectKind::Array(items) => rotate_in_place(items, places),
        ObjectKind::ArrayDouble(items) => rotate_in_place(items, places),
        ObjectKind::ArrayComplex(items) => rotate_in_place(items, places),
        other => {
            return Err(Flow::Error(ErrorObj::type_err(format!(
                "Invalid argument for first argument for rotated: {}",
                other.tag()
            ))))
        }
    }
    drop(guard);
    Ok(copy)
}

/// Reverses an array or string in place.
pub fn reverse(
    evaluator: &mut Evaluator<'_>,
    arguments: &[Expression],
    env: &EnvRef,
    _token: &Token,
) -> EvalResult {
    let values = evaluator.eval_builtin_args(arguments, env)?;
    super::expect_args("reverse", &values, 1)?;
    let target = &values[0];
    require_unfrozen(target, "reverse")?;

    let mut guard = target.borrow_mut();
    match &mut guard.kind {
        ObjectKind::Array(items) => items.reverse(),
        ObjectKind::ArrayDouble(items) => items.reverse(),
        ObjectKind::ArrayComplex(items) => items.reverse(),
        ObjectKind::Str(text) => *text = text.chars().rev().collect(),
        other => {
            return Err(Flow::Error(ErrorObj::type_err(format!(
                "Invalid argument for first argument for reversed: {}",
                other.tag()
            ))))
        }
    }
    drop(guard);
    Ok(target.clone())
}

pub fn reversed(
    evaluator: &mut Evaluator<'_>,
    arguments: &[Expression],
    env: &EnvRef,
    _token: &Token,
) -> EvalResult {
    let values = evaluator.eval_builtin_args(arguments, env)?;
    super::expect_args("reversed", &values, 1)?;
    let copy = deep_clone(&values[0]);

    let mut guard = copy.borrow_mut();
    match &mut guard.kind {
        ObjectKind::Array(items) => items.reverse(),
        ObjectKind::ArrayDouble(items) => items.reverse(),
        ObjectKind::ArrayComplex(items) => items.reverse(),
        ObjectKind::Str(text) => *text = text.chars().rev().collect(),
        other => {
            return Err(Flow::Error(ErrorObj::type_err(format!(
                "Invalid argument for first argument for reversed: {}",
                other.tag()
            ))))
        }
    }
    drop(guard);
    Ok(copy)
}

pub(crate) fn array_like_length(value: &ObjectRef) -> Option<usize> {
    match &value.borrow().kind {
        ObjectKind::Array(items) => Some(items.len()),
        ObjectKind::ArrayDouble(items) => Some(items.len()),
        ObjectKind::ArrayComplex(items) => Some(items.len()),
        _ => None,
    }
}

fn integer_argument(value: &ObjectRef, position: &str, name: &str) -> Result<i64, Flow> {
    match &value.borrow().kind {
        ObjectKind::Integer(value) => Ok(*value),
        other => Err(Flow::Error(ErrorObj::type_err(format!(
            "Invalid argument for {position} argument for {name}: {}, expected integer",
            other.tag()
        )))),
    }
}

fn rotate_in_place<T>(items: &mut [T], places: i64) {
    if items.is_empty() {
        return;
    }
    let length = items.len() as i64;
    let shift = places.rem_euclid(length) as usize;
    items.rotate_left(shift);
}
