//! `print` and `eprint`: arguments render via their inspection string,
//! strings unquoted, no separators, one trailing newline.

use crate::ast::Expression;
use crate::env::EnvRef;
use crate::errors::EvalResult;
use crate::evaluator::Evaluator;
use crate::object::{inspect, null_obj, ObjectKind};
use crate::token::Token;

fn print_impl(
    evaluator: &mut Evaluator<'_>,
    arguments: &[Expression],
    env: &EnvRef,
    to_stderr: bool,
) -> EvalResult {
    let mut output = String::new();
    for argument in arguments {
        let value = evaluator.eval_expression(argument, env, None)?;
        let value = evaluator.unwrap_member_value(value);
        let rendered = match &value.borrow().kind {
            ObjectKind::Str(text) => text.clone(),
            _ => inspect(&value),
        };
        output.push_str(&rendered);
    }
    output.push('\n');
    if to_stderr {
        evaluator.writer.write_err(&output);
    } else {
        evaluator.writer.write_out(&output);
    }
    Ok(null_obj())
}

pub fn print(
    evaluator: &mut Evaluator<'_>,
    arguments: &[Expression],
    env: &EnvRef,
    _token: &Token,
) -> EvalResult {
    print_impl(evaluator, arguments, env, false)
}

pub fn eprint(
    evaluator: &mut Evaluator<'_>,
    arguments: &[Expression],
    env: &EnvRef,
    _token: &Token,
) -> EvalResult {
    print_impl(evaluator, arguments, env, true)
}
