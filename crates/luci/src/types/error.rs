//! Error-value methods: message, kind code and source position.

use crate::errors::EvalResult;
use crate::evaluator::Evaluator;
use crate::object::{integer_obj, string_obj, ObjectKind, ObjectRef};
use crate::token::Token;

use super::{expect_method_args, wrong_receiver, TypeTable};

pub fn table() -> TypeTable {
    let mut table = TypeTable::default();
    table.method("message", "", "str", message);
    table.method("error_type", "", "int", error_type);
    table.method("file_name", "", "str", file_name);
    table.method("line", "", "int", line);
    table.method("column", "", "int", column);
    table
}

fn message(
    _evaluator: &mut Evaluator<'_>,
    receiver: &ObjectRef,
    values: Vec<ObjectRef>,
    _token: &Token,
) -> EvalResult {
    expect_method_args("message", &values, &[0])?;
    match &receiver.borrow().kind {
        ObjectKind::Error(error) => Ok(string_obj(error.message.clone())),
        _ => Err(wrong_receiver("message", "Error", receiver)),
    }
}

fn error_type(
    _evaluator: &mut Evaluator<'_>,
    receiver: &ObjectRef,
    values: Vec<ObjectRef>,
    _token: &Token,
) -> EvalResult {
    expect_method_args("error_type", &values, &[0])?;
    match &receiver.borrow().kind {
        ObjectKind::Error(error) => Ok(integer_obj(error.kind.code())),
        _ => Err(wrong_receiver("error_type", "Error", receiver)),
    }
}

fn file_name(
    _evaluator: &mut Evaluator<'_>,
    receiver: &ObjectRef,
    values: Vec<ObjectRef>,
    _token: &Token,
) -> EvalResult {
    expect_method_args("file_name", &values, &[0])?;
    match &receiver.borrow().kind {
        ObjectKind::Error(error) => {
            let name = error
                .token
                .as_ref()
                .and_then(|token| token.file.as_ref())
                .map_or_else(String::new, ToString::to_string);
            Ok(string_obj(name))
        }
        _ => Err(wrong_receiver("file_name", "Error", receiver)),
    }
}

fn line(
    _evaluator: &mut Evaluator<'_>,
    receiver: &ObjectRef,
    values: Vec<ObjectRef>,
    _token: &Token,
) -> EvalResult {
    expect_method_args("line", &values, &[0])?;
    match &receiver.borrow().kind {
        ObjectKind::Error(error) => Ok(integer_obj(
            error.token.as_ref().map_or(0, |token| token.line as i64),
        )),
        _ => Err(wrong_receiver("line", "Error", receiver)),
    }
}

fn column(
    _evaluator: &mut Evaluator<'_>,
    receiver: &ObjectRef,
    values: Vec<ObjectRef>,
    _token: &Token,
) -> EvalResult {
    expect_method_args("column", &values, &[0])?;
    match &receiver.borrow().kind {
        ObjectKind::Error(error) => Ok(integer_obj(
            error.token.as_ref().map_or(0, |token| token.column as i64),
        )),
        _ => Err(wrong_receiver("column", "Error", receiver)),
    }
}
