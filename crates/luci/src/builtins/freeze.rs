//! The freeze protocol: `frozen`, `freeze`, `defrost` and the scope-bound
//! `freezer`.

use std::rc::Rc;

use crate::ast::Expression;
use crate::env::EnvRef;
use crate::errors::EvalResult;
use crate::evaluator::Evaluator;
use crate::object::{alloc, boolean_obj, FreezerGuard, ObjectKind};
use crate::token::Token;

pub fn frozen(
    evaluator: &mut Evaluator<'_>,
    arguments: &[Expression],
    env: &EnvRef,
    _token: &Token,
) -> EvalResult {
    let values = evaluator.eval_builtin_args(arguments, env)?;
    super::expect_args("frozen", &values, 1)?;
    let is_frozen = values[0].borrow().frozen > 0;
    Ok(boolean_obj(is_frozen))
}

pub fn freeze(
    evaluator: &mut Evaluator<'_>,
    arguments: &[Expression],
    env: &EnvRef,
    _token: &Token,
) -> EvalResult {
    let values = evaluator.eval_builtin_args(arguments, env)?;
    super::expect_args("freeze", &values, 1)?;
    values[0].borrow_mut().frozen += 1;
    Ok(values[0].clone())
}

pub fn defrost(
    evaluator: &mut Evaluator<'_>,
    arguments: &[Expression],
    env: &EnvRef,
    _token: &Token,
) -> EvalResult {
    let values = evaluator.eval_builtin_args(arguments, env)?;
    super::expect_args("defrost", &values, 1)?;
    {
        let mut target = values[0].borrow_mut();
        if target.frozen > 0 {
            target.frozen -= 1;
        }
    }
    Ok(values[0].clone())
}

/// Returns a value that keeps the target frozen for as long as it is
/// alive.
pub fn freezer(
    evaluator: &mut Evaluator<'_>,
    arguments: &[Expression],
    env: &EnvRef,
    _token: &Token,
) -> EvalResult {
    let values = evaluator.eval_builtin_args(arguments, env)?;
    super::expect_args("freezer", &values, 1)?;
    Ok(alloc(ObjectKind::Freezer(Rc::new(FreezerGuard::new(
        values[0].clone(),
    )))))
}
