//! `sort`, `sorted` and `is_sorted`.
//!
//! The in-place sort orders an index permutation and only then applies it
//! to the data, so a comparator that errors (user comparators are ordinary
//! functions and may return anything) leaves the data untouched and makes
//! `sort` yield `false`.

use std::rc::Rc;

use crate::ast::Expression;
use crate::env::EnvRef;
use crate::errors::{ErrorObj, EvalResult, Flow};
use crate::evaluator::infix::apply_infix_operator;
use crate::evaluator::Evaluator;
use crate::object::{
    alloc, boolean_obj, deep_clone, double_obj, FunctionObj, ObjectKind, ObjectRef, Tag,
};
use crate::token::{Token, TokenKind};

fn comparator_argument(
    values: &[ObjectRef],
    name: &str,
) -> Result<Option<Rc<FunctionObj>>, Flow> {
    match values.get(1) {
        None => Ok(None),
        Some(value) => match &value.borrow().kind {
            ObjectKind::Function(function) => Ok(Some(function.clone())),
            _ => Err(Flow::Error(ErrorObj::type_err(format!(
                "{name}: expected argument 2 to be a function"
            )))),
        },
    }
}

/// Compares two elements, by comparator or by the `<` infix rules.
/// A non-boolean outcome is an ordering failure.
fn is_smaller(
    evaluator: &mut Evaluator<'_>,
    comparator: Option<&Rc<FunctionObj>>,
    a: &ObjectRef,
    b: &ObjectRef,
    token: &Token,
) -> Result<bool, ()> {
    let outcome = match comparator {
        Some(function) => {
            evaluator.eval_function_with_values(function, vec![a.clone(), b.clone()], token)
        }
        None => apply_infix_operator(TokenKind::Lt, a, b).map_err(Flow::Error),
    };
    match outcome {
        Ok(value) => match &value.borrow().kind {
            ObjectKind::Boolean(result) => Ok(*result),
            _ => Err(()),
        },
        Err(_) => Err(()),
    }
}

/// Sorts an index permutation over the elements; `None` when the
/// comparator failed.
fn sort_ordering(
    evaluator: &mut Evaluator<'_>,
    elements: &[ObjectRef],
    comparator: Option<&Rc<FunctionObj>>,
    token: &Token,
) -> Option<Vec<usize>> {
    let mut ordering: Vec<usize> = (0..elements.len()).collect();
    let mut failed = false;
    ordering.sort_by(|&a, &b| {
        if failed {
            return std::cmp::Ordering::Equal;
        }
        match is_smaller(evaluator, comparator, &elements[a], &elements[b], token) {
            Ok(true) => std::cmp::Ordering::Less,
            Ok(false) => std::cmp::Ordering::Greater,
            Err(()) => {
                failed = true;
                std::cmp::Ordering::Equal
            }
        }
    });
    if failed {
        None
    } else {
        Some(ordering)
    }
}

/// Sorts an array-like value in place; `Ok(false)` reports a comparator
/// failure with the data untouched.
fn sort_in_place(
    evaluator: &mut Evaluator<'_>,
    target: &ObjectRef,
    comparator: Option<&Rc<FunctionObj>>,
    name: &str,
    token: &Token,
) -> Result<bool, Flow> {
    match target.borrow().tag() {
        Tag::Array | Tag::ArrayDouble | Tag::ArrayComplex => {}
        other => {
            return Err(Flow::Error(ErrorObj::type_err(format!(
                "Invalid argument for first argument for {name}: {other}"
            ))))
        }
    }

    match target.borrow().tag() {
        Tag::Array => {
            let elements: Vec<ObjectRef> = match &target.borrow().kind {
                ObjectKind::Array(items) => items.clone(),
                _ => vec![],
            };
            let Some(ordering) = sort_ordering(evaluator, &elements, comparator, token) else {
                return Ok(false);
            };
            let permuted: Vec<ObjectRef> =
                ordering.iter().map(|&index| elements[index].clone()).collect();
            if let ObjectKind::Array(items) = &mut target.borrow_mut().kind {
                *items = permuted;
            }
        }
        Tag::ArrayDouble => {
            let mut elements: Vec<f64> = match &target.borrow().kind {
                ObjectKind::ArrayDouble(items) => items.clone(),
                _ => vec![],
            };
            match comparator {
                None => elements.sort_by(f64::total_cmp),
                Some(function) => {
                    let boxed: Vec<ObjectRef> =
                        elements.iter().map(|value| double_obj(*value)).collect();
                    let Some(ordering) = sort_ordering(evaluator, &boxed, Some(function), token)
                    else {
                        return Ok(false);
                    };
                    elements = ordering.iter().map(|&index| elements[index]).collect();
                }
            }
            if let ObjectKind::ArrayDouble(items) = &mut target.borrow_mut().kind {
                *items = elements;
            }
        }
        _ => {
            // complex numbers have no natural order
            let Some(function) = comparator else {
                return Ok(false);
            };
            let elements: Vec<num_complex::Complex64> = match &target.borrow().kind {
                ObjectKind::ArrayComplex(items) => items.clone(),
                _ => vec![],
            };
            let boxed: Vec<ObjectRef> = elements
                .iter()
                .map(|value| alloc(ObjectKind::Complex(*value)))
                .collect();
            let Some(ordering) = sort_ordering(evaluator, &boxed, Some(function), token) else {
                return Ok(false);
            };
            let sorted: Vec<num_complex::Complex64> =
                ordering.iter().map(|&index| elements[index]).collect();
            if let ObjectKind::ArrayComplex(items) = &mut target.borrow_mut().kind {
                *items = sorted;
            }
        }
    }
    Ok(true)
}

pub fn sort(
    evaluator: &mut Evaluator<'_>,
    arguments: &[Expression],
    env: &EnvRef,
    token: &Token,
) -> EvalResult {
    let values = evaluator.eval_builtin_args(arguments, env)?;
    if values.is_empty() || values.len() > 2 {
        return Err(Flow::Error(ErrorObj::type_err(
            "sort: expected 1 or 2 arguments",
        )));
    }
    let comparator = comparator_argument(&values, "sort")?;
    let target = &values[0];

    if target.borrow().frozen > 0 {
        return Err(Flow::Error(ErrorObj::type_err(
            "array sort expects a non-frozen object",
        )));
    }

    let sorted = sort_in_place(evaluator, target, comparator.as_ref(), "sort", token)?;
    Ok(boolean_obj(sorted))
}

/// Returns a freshly sorted copy, leaving the argument untouched.
pub fn sorted(
    evaluator: &mut Evaluator<'_>,
    arguments: &[Expression],
    env: &EnvRef,
    token: &Token,
) -> EvalResult {
    let values = evaluator.eval_builtin_args(arguments, env)?;
    if values.is_empty() || values.len() > 2 {
        return Err(Flow::Error(ErrorObj::type_err(
            "sorted: expected 1 or 2 arguments",
        )));
    }
    let comparator = comparator_argument(&values, "sorted")?;
    let copy = deep_clone(&values[0]);
    sort_in_place(evaluator, &copy, comparator.as_ref(), "sorted", token)?;
    Ok(copy)
}

pub fn is_sorted(
    evaluator: &mut Evaluator<'_>,
    arguments: &[Expression],
    env: &EnvRef,
    token: &Token,
) -> EvalResult {
    let values = evaluator.eval_builtin_args(arguments, env)?;
    if values.is_empty() || values.len() > 2 {
        return Err(Flow::Error(ErrorObj::type_err(
            "is_sorted: expected 1 or 2 arguments",
        )));
    }
    let comparator = comparator_argument(&values, "is_sorted")?;
    let target = &values[0];

    let elements: Vec<ObjectRef> = match &target.borrow().kind {
        ObjectKind::Array(items) => items.clone(),
        ObjectKind::ArrayDouble(items) => items.iter().map(|value| double_obj(*value)).collect(),
        ObjectKind::ArrayComplex(items) => items
            .iter()
            .map(|value| alloc(ObjectKind::Complex(*value)))
            .collect(),
        other => {
            return Err(Flow::Error(ErrorObj::type_err(format!(
                "Invalid argument for first argument for is_sorted: {}",
                other.tag()
            ))))
        }
    };

    for window in elements.windows(2) {
        match is_smaller(evaluator, comparator.as_ref(), &window[1], &window[0], token) {
            Ok(true) => return Ok(boolean_obj(false)),
            Ok(false) => {}
            Err(()) => return Ok(boolean_obj(false)),
        }
    }
    Ok(boolean_obj(true))
}
