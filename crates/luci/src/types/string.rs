//! String methods.

use crate::errors::{ErrorObj, EvalResult, Flow};
use crate::evaluator::Evaluator;
use crate::object::{alloc, boolean_obj, integer_obj, string_obj, ObjectKind, ObjectRef};
use crate::token::Token;

use super::{expect_method_args, wrong_receiver, TypeTable};

pub fn table() -> TypeTable {
    let mut table = TypeTable::default();
    table.method("clear", "", "str", clear);
    table.method("is_empty", "", "bool", is_empty);
    table.method("size", "", "int", size);
    table.method("starts_with", "str", "bool", starts_with);
    table.method("ends_with", "str", "bool", ends_with);
    table.method("find", "str", "int", find);
    table.method("replace", "str, str", "str", replace);
    table.method("split", "str", "[str]", split);
    table.method("join", "[str]", "str", join);
    table
}

fn receiver_text(receiver: &ObjectRef, name: &str) -> Result<String, Flow> {
    match &receiver.borrow().kind {
        ObjectKind::Str(text) => Ok(text.clone()),
        _ => Err(wrong_receiver(name, "String", receiver)),
    }
}

fn string_argument(values: &[ObjectRef], index: usize, name: &str) -> Result<String, Flow> {
    match &values[index].borrow().kind {
        ObjectKind::Str(text) => Ok(text.clone()),
        _ => Err(Flow::Error(ErrorObj::type_err(format!(
            "{name}: expected argument {} of type str",
            index + 1
        )))),
    }
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
            "string clear expects a non-frozen object",
        )));
    }
    match &mut receiver.borrow_mut().kind {
        ObjectKind::Str(text) => text.clear(),
        _ => return Err(wrong_receiver("clear", "String", receiver)),
    }
    Ok(receiver.clone())
}

fn is_empty(
    _evaluator: &mut Evaluator<'_>,
    receiver: &ObjectRef,
    values: Vec<ObjectRef>,
    _token: &Token,
) -> EvalResult {
    expect_method_args("is_empty", &values, &[0])?;
    let text = receiver_text(receiver, "is_empty")?;
    Ok(boolean_obj(text.is_empty()))
}

fn size(
    _evaluator: &mut Evaluator<'_>,
    receiver: &ObjectRef,
    values: Vec<ObjectRef>,
    _token: &Token,
) -> EvalResult {
    expect_method_args("size", &values, &[0])?;
    let text = receiver_text(receiver, "size")?;
    Ok(integer_obj(text.chars().count() as i64))
}

fn starts_with(
    _evaluator: &mut Evaluator<'_>,
    receiver: &ObjectRef,
    values: Vec<ObjectRef>,
    _token: &Token,
) -> EvalResult {
    expect_method_args("starts_with", &values, &[1])?;
    let text = receiver_text(receiver, "starts_with")?;
    let prefix = string_argument(&values, 0, "starts_with")?;
    Ok(boolean_obj(text.starts_with(&prefix)))
}

fn ends_with(
    _evaluator: &mut Evaluator<'_>,
    receiver: &ObjectRef,
    values: Vec<ObjectRef>,
    _token: &Token,
) -> EvalResult {
    expect_method_args("ends_with", &values, &[1])?;
    let text = receiver_text(receiver, "ends_with")?;
    let suffix = string_argument(&values, 0, "ends_with")?;
    Ok(boolean_obj(text.ends_with(&suffix)))
}

/// Character index of the first occurrence, -1 when absent.
fn find(
    _evaluator: &mut Evaluator<'_>,
    receiver: &ObjectRef,
    values: Vec<ObjectRef>,
    _token: &Token,
) -> EvalResult {
    expect_method_args("find", &values, &[1])?;
    let text = receiver_text(receiver, "find")?;
    let needle = string_argument(&values, 0, "find")?;
    match text.find(&needle) {
        Some(byte_index) => {
            let char_index = text[..byte_index].chars().count();
            Ok(integer_obj(char_index as i64))
        }
        None => Ok(integer_obj(-1)),
    }
}

fn replace(
    _evaluator: &mut Evaluator<'_>,
    receiver: &ObjectRef,
    values: Vec<ObjectRef>,
    _token: &Token,
) -> EvalResult {
    expect_method_args("replace", &values, &[2])?;
    let text = receiver_text(receiver, "replace")?;
    let from = string_argument(&values, 0, "replace")?;
    let to = string_argument(&values, 1, "replace")?;
    Ok(string_obj(text.replace(&from, &to)))
}

/// Splits on any of the delimiter characters (default whitespace),
/// dropping empty tokens.
fn split(
    _evaluator: &mut Evaluator<'_>,
    receiver: &ObjectRef,
    values: Vec<ObjectRef>,
    _token: &Token,
) -> EvalResult {
    expect_method_args("split", &values, &[0, 1])?;
    let text = receiver_text(receiver, "split")?;
    let delimiters = if values.is_empty() {
        " \t\n\r".to_string()
    } else {
        string_argument(&values, 0, "split")?
    };
    let tokens: Vec<ObjectRef> = text
        .split(|ch: char| delimiters.contains(ch))
        .filter(|token| !token.is_empty())
        .map(string_obj)
        .collect();
    Ok(alloc(ObjectKind::Array(tokens)))
}

/// Joins an array of strings with the receiver as separator.
fn join(
    _evaluator: &mut Evaluator<'_>,
    receiver: &ObjectRef,
    values: Vec<ObjectRef>,
    _token: &Token,
) -> EvalResult {
    expect_method_args("join", &values, &[1])?;
    let separator = receiver_text(receiver, "join")?;
    let parts: Vec<String> = match &values[0].borrow().kind {
        ObjectKind::Array(items) => {
            let mut parts = Vec::with_capacity(items.len());
            for item in items {
                match &item.borrow().kind {
                    ObjectKind::Str(text) => parts.push(text.clone()),
                    _ => {
                        return Err(Flow::Error(ErrorObj::type_err(
                            "join: expected argument 1 of type array of str",
                        )))
                    }
                }
            }
            parts
        }
        _ => {
            return Err(Flow::Error(ErrorObj::type_err(
                "join: expected argument 1 of type array",
            )))
        }
    };
    Ok(string_obj(parts.join(&separator)))
}
