//! Set methods.

use crate::errors::{ErrorObj, EvalResult, Flow};
use crate::evaluator::Evaluator;
use crate::object::{boolean_obj, integer_obj, ObjectKind, ObjectRef};
use crate::token::Token;

use super::{expect_method_args, wrong_receiver, TypeTable};

pub fn table() -> TypeTable {
    let mut table = TypeTable::default();
    table.method("clear", "", "{all}", clear);
    table.method("empty", "", "bool", empty);
    table.method("size", "", "int", size);
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
            "set clear expects a non-frozen object",
        )));
    }
    match &mut receiver.borrow_mut().kind {
        ObjectKind::Set(set) => set.clear(),
        _ => return Err(wrong_receiver("clear", "Set", receiver)),
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
        ObjectKind::Set(set) => Ok(boolean_obj(set.is_empty())),
        _ => Err(wrong_receiver("empty", "Set", receiver)),
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
        ObjectKind::Set(set) => Ok(integer_obj(set.len() as i64)),
        _ => Err(wrong_receiver("size", "Set", receiver)),
    }
}
