//! The `regex` module: compile patterns and match, search or replace.
//!
//! Optional flag bits on `regex(pattern, flags)`: 1 = case-insensitive,
//! 2 = multi-line.

use std::rc::Rc;

use regex::RegexBuilder;

use crate::errors::{ErrorObj, Flow};
use crate::object::{alloc, null_obj, string_obj, ObjectKind, ObjectRef};

use super::{add_function, module_value, new_module_env};

fn string_argument(values: &[ObjectRef], index: usize, name: &str) -> Result<String, Flow> {
    match &values[index].borrow().kind {
        ObjectKind::Str(text) => Ok(text.clone()),
        _ => Err(Flow::Error(ErrorObj::type_err(format!(
            "{name}: expected argument {} to be a str",
            index + 1
        )))),
    }
}

fn regex_argument(values: &[ObjectRef], name: &str) -> Result<Rc<regex::Regex>, Flow> {
    match &values[0].borrow().kind {
        ObjectKind::Regex(pattern) => Ok(pattern.clone()),
        _ => Err(Flow::Error(ErrorObj::type_err(format!(
            "{name}: expected argument 1 to be a regex"
        )))),
    }
}

fn groups_array(captures: &regex::Captures<'_>) -> ObjectRef {
    let groups = captures
        .iter()
        .map(|group| match group {
            Some(found) => string_obj(found.as_str().to_string()),
            None => string_obj(String::new()),
        })
        .collect();
    alloc(ObjectKind::Array(groups))
}

#[must_use]
pub fn create_module() -> ObjectRef {
    let env = new_module_env();

    add_function(
        &env,
        "regex",
        "str",
        "regex",
        Box::new(|evaluator, arguments, call_env, _token| {
            let values = evaluator.eval_builtin_args(arguments, call_env)?;
            if values.is_empty() || values.len() > 2 {
                return Err(Flow::Error(ErrorObj::type_err(
                    "regex: expected 1 or 2 arguments of type (str, int)",
                )));
            }
            let pattern = string_argument(&values, 0, "regex")?;
            let flags = match values.get(1) {
                None => 0,
                Some(value) => match &value.borrow().kind {
                    ObjectKind::Integer(flags) => *flags,
                    _ => {
                        return Err(Flow::Error(ErrorObj::type_err(
                            "regex: expected argument 2 to be an int",
                        )))
                    }
                },
            };
            let compiled = RegexBuilder::new(&pattern)
                .case_insensitive(flags & 1 != 0)
                .multi_line(flags & 2 != 0)
                .build()
                .map_err(|error| {
                    Flow::Error(ErrorObj::value_err(format!(
                        "regex: invalid pattern: {error}"
                    )))
                })?;
            Ok(alloc(ObjectKind::Regex(Rc::new(compiled))))
        }),
    );

    add_function(
        &env,
        "match",
        "regex, str",
        "<null, [str]>",
        Box::new(|evaluator, arguments, call_env, _token| {
            let values = evaluator.eval_builtin_args(arguments, call_env)?;
            if values.len() != 2 {
                return Err(Flow::Error(ErrorObj::type_err(
                    "match: expected 2 arguments of type (regex, str)",
                )));
            }
            let pattern = regex_argument(&values, "match")?;
            let haystack = string_argument(&values, 1, "match")?;
            // a match must span the whole input
            match pattern.captures(&haystack) {
                Some(captures)
                    if captures
                        .get(0)
                        .is_some_and(|whole| whole.start() == 0 && whole.end() == haystack.len()) =>
                {
                    Ok(groups_array(&captures))
                }
                _ => Ok(null_obj()),
            }
        }),
    );

    add_function(
        &env,
        "search",
        "regex, str",
        "<null, [str]>",
        Box::new(|evaluator, arguments, call_env, _token| {
            let values = evaluator.eval_builtin_args(arguments, call_env)?;
            if values.len() != 2 {
                return Err(Flow::Error(ErrorObj::type_err(
                    "search: expected 2 arguments of type (regex, str)",
                )));
            }
            let pattern = regex_argument(&values, "search")?;
            let haystack = string_argument(&values, 1, "search")?;
            match pattern.captures(&haystack) {
                Some(captures) => Ok(groups_array(&captures)),
                None => Ok(null_obj()),
            }
        }),
    );

    add_function(
        &env,
        "replace",
        "regex, str, str",
        "str",
        Box::new(|evaluator, arguments, call_env, _token| {
            let values = evaluator.eval_builtin_args(arguments, call_env)?;
            if values.len() != 3 {
                return Err(Flow::Error(ErrorObj::type_err(
                    "replace: expected 3 arguments of type (regex, str, str)",
                )));
            }
            let pattern = regex_argument(&values, "replace")?;
            let haystack = string_argument(&values, 1, "replace")?;
            let replacement = string_argument(&values, 2, "replace")?;
            Ok(string_obj(
                pattern.replace_all(&haystack, replacement.as_str()).into_owned(),
            ))
        }),
    );

    module_value(env)
}
