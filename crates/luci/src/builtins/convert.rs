//! Container constructors (`array`, `dict`, `set`, `range`, `complex`)
//! and string casts.

use num_complex::Complex64;

use crate::ast::Expression;
use crate::env::EnvRef;
use crate::errors::{ErrorObj, EvalResult, Flow};
use crate::evaluator::Evaluator;
use crate::object::{
    alloc, boolean_obj, double_obj, integer_obj, DictMap, ObjectKind, Range, SetData,
};
use crate::token::Token;
use crate::typing::parse_type;

/// `array()` makes an empty array; `array(range)` expands the range.
pub fn array(
    evaluator: &mut Evaluator<'_>,
    arguments: &[Expression],
    env: &EnvRef,
    _token: &Token,
) -> EvalResult {
    let values = evaluator.eval_builtin_args(arguments, env)?;
    if values.len() > 1 {
        return Err(Flow::Error(ErrorObj::type_err(
            "array: expected no or one argument",
        )));
    }
    let mut items = vec![];
    if let Some(value) = values.first() {
        match &value.borrow().kind {
            ObjectKind::Range(range) => {
                items.extend(range.values().map(integer_obj));
            }
            _ => {
                return Err(Flow::Error(ErrorObj::type_err(
                    "array: cannot convert first argument",
                )))
            }
        }
    }
    Ok(alloc(ObjectKind::Array(items)))
}

pub fn array_double(
    evaluator: &mut Evaluator<'_>,
    arguments: &[Expression],
    env: &EnvRef,
    _token: &Token,
) -> EvalResult {
    if arguments.len() > 1 {
        return Err(Flow::Error(ErrorObj::type_err(
            "array_double: expected at most 1 argument",
        )));
    }
    let mut items: Vec<f64> = vec![];
    if let Some(argument) = arguments.first() {
        let hint = parse_type("[double]");
        let value = evaluator.eval_expression(argument, env, Some(&hint))?;
        match &value.borrow().kind {
            ObjectKind::ArrayDouble(values) => items = values.clone(),
            _ => {
                return Err(Flow::Error(ErrorObj::type_err(
                    "array_double: cannot convert argument",
                )))
            }
        };
    }
    Ok(alloc(ObjectKind::ArrayDouble(items)))
}

pub fn array_complex(
    evaluator: &mut Evaluator<'_>,
    arguments: &[Expression],
    env: &EnvRef,
    _token: &Token,
) -> EvalResult {
    if arguments.len() > 1 {
        return Err(Flow::Error(ErrorObj::type_err(
            "array_complex: expected at most 1 argument",
        )));
    }
    let mut items: Vec<Complex64> = vec![];
    if let Some(argument) = arguments.first() {
        let hint = parse_type("[complex]");
        let value = evaluator.eval_expression(argument, env, Some(&hint))?;
        match &value.borrow().kind {
            ObjectKind::ArrayComplex(values) => items = values.clone(),
            _ => {
                return Err(Flow::Error(ErrorObj::type_err(
                    "array_complex: cannot convert argument",
                )))
            }
        };
    }
    Ok(alloc(ObjectKind::ArrayComplex(items)))
}

/// `complex()`, `complex(re)` or `complex(re, im)` over doubles.
pub fn complex(
    evaluator: &mut Evaluator<'_>,
    arguments: &[Expression],
    env: &EnvRef,
    _token: &Token,
) -> EvalResult {
    let values = evaluator.eval_builtin_args(arguments, env)?;
    if values.len() > 2 {
        return Err(Flow::Error(ErrorObj::type_err(
            "complex: expected less than 3 arguments",
        )));
    }
    let mut parts = [0.0_f64; 2];
    for (index, value) in values.iter().enumerate() {
        match &value.borrow().kind {
            ObjectKind::Double(part) => parts[index] = *part,
            _ => {
                return Err(Flow::Error(ErrorObj::type_err(format!(
                    "complex: argument {} needs to be a double",
                    index + 1
                ))))
            }
        }
    }
    Ok(alloc(ObjectKind::Complex(Complex64::new(parts[0], parts[1]))))
}

pub fn dict(
    evaluator: &mut Evaluator<'_>,
    arguments: &[Expression],
    env: &EnvRef,
    _token: &Token,
) -> EvalResult {
    let values = evaluator.eval_builtin_args(arguments, env)?;
    super::expect_args("dict", &values, 0)?;
    Ok(alloc(ObjectKind::Dictionary(DictMap::default())))
}

pub fn set(
    evaluator: &mut Evaluator<'_>,
    arguments: &[Expression],
    env: &EnvRef,
    _token: &Token,
) -> EvalResult {
    let values = evaluator.eval_builtin_args(arguments, env)?;
    super::expect_args("set", &values, 0)?;
    Ok(alloc(ObjectKind::Set(SetData::default())))
}

/// `range(upper)`, `range(lower, upper)` or `range(lower, upper, stride)`
/// with a strictly positive stride.
pub fn range(
    evaluator: &mut Evaluator<'_>,
    arguments: &[Expression],
    env: &EnvRef,
    _token: &Token,
) -> EvalResult {
    let values = evaluator.eval_builtin_args(arguments, env)?;
    if values.is_empty() || values.len() > 3 {
        return Err(Flow::Error(ErrorObj::type_err(
            "range: expected two or three arguments",
        )));
    }
    let mut bounds = [0_i64; 3];
    bounds[2] = 1;
    for (index, value) in values.iter().enumerate() {
        match &value.borrow().kind {
            ObjectKind::Integer(bound) => bounds[index] = *bound,
            other => {
                return Err(Flow::Error(ErrorObj::type_err(format!(
                    "range: argument {} needs to be Integer, got {}",
                    index + 1,
                    other.tag()
                ))))
            }
        }
    }
    let (lower, upper, stride) = match values.len() {
        1 => (0, bounds[0], 1),
        2 => (bounds[0], bounds[1], 1),
        _ => (bounds[0], bounds[1], bounds[2]),
    };
    if stride <= 0 {
        return Err(Flow::Error(ErrorObj::value_err(
            "range: stride must be positive",
        )));
    }
    Ok(alloc(ObjectKind::Range(Range {
        lower,
        upper,
        stride,
    })))
}

pub fn to_bool(
    evaluator: &mut Evaluator<'_>,
    arguments: &[Expression],
    env: &EnvRef,
    _token: &Token,
) -> EvalResult {
    let values = evaluator.eval_builtin_args(arguments, env)?;
    super::expect_args("to_bool", &values, 1)?;
    let text = match &values[0].borrow().kind {
        ObjectKind::Str(text) => text.clone(),
        other => {
            return Err(Flow::Error(ErrorObj::type_err(format!(
                "Invalid type for to_bool: {}",
                other.tag()
            ))))
        }
    };
    match text.as_str() {
        "false" => Ok(boolean_obj(false)),
        "true" => Ok(boolean_obj(true)),
        _ => match text.parse::<i64>() {
            Ok(value) => Ok(boolean_obj(value != 0)),
            Err(_) => Err(Flow::Error(ErrorObj::type_err(format!(
                "Invalid cast to_bool, invalid argument: {text}"
            )))),
        },
    }
}

pub fn to_int(
    evaluator: &mut Evaluator<'_>,
    arguments: &[Expression],
    env: &EnvRef,
    _token: &Token,
) -> EvalResult {
    let values = evaluator.eval_builtin_args(arguments, env)?;
    super::expect_args("to_int", &values, 1)?;
    let text = match &values[0].borrow().kind {
        ObjectKind::Str(text) => text.clone(),
        other => {
            return Err(Flow::Error(ErrorObj::type_err(format!(
                "Invalid type for to_int: {}",
                other.tag()
            ))))
        }
    };
    match text.trim().parse::<i64>() {
        Ok(value) => Ok(integer_obj(value)),
        Err(_) => Err(Flow::Error(ErrorObj::type_err(format!(
            "Invalid cast to_int, invalid argument: {text}"
        )))),
    }
}

pub fn to_double(
    evaluator: &mut Evaluator<'_>,
    arguments: &[Expression],
    env: &EnvRef,
    _token: &Token,
) -> EvalResult {
    let values = evaluator.eval_builtin_args(arguments, env)?;
    super::expect_args("to_double", &values, 1)?;
    let guard = values[0].borrow();
    match &guard.kind {
        ObjectKind::Str(text) => match text.trim().parse::<f64>() {
            Ok(value) => Ok(double_obj(value)),
            Err(_) => Err(Flow::Error(ErrorObj::type_err(format!(
                "Invalid cast to_double, invalid argument: {text}"
            )))),
        },
        ObjectKind::Integer(value) => Ok(double_obj(*value as f64)),
        other => Err(Flow::Error(ErrorObj::type_err(format!(
            "Invalid type for to_double: {}",
            other.tag()
        )))),
    }
}
