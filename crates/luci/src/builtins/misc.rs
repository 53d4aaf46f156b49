//! General-purpose global builtins: identity diagnostics, type queries,
//! cloning, documentation, interpreter control and container queries.

use std::rc::Rc;

use crate::ast::Expression;
use crate::env::{EnvRef, Environment};
use crate::errors::{ErrorKind, ErrorObj, EvalResult, Flow};
use crate::evaluator::Evaluator;
use crate::object::{
    alloc, boolean_obj, deep_clone, error_value, integer_obj, is_hashable, null_obj, object_eq,
    object_hash, string_obj, IoObj, ModuleObj, ModuleState, ObjectKind, OpenMode,
};
use crate::token::Token;

pub fn address(
    evaluator: &mut Evaluator<'_>,
    arguments: &[Expression],
    env: &EnvRef,
    _token: &Token,
) -> EvalResult {
    let values = evaluator.eval_builtin_args(arguments, env)?;
    super::expect_args("address", &values, 1)?;
    let pointer = Rc::as_ptr(&values[0]) as usize;
    Ok(integer_obj(pointer as i64))
}

pub fn internal_type_str(
    evaluator: &mut Evaluator<'_>,
    arguments: &[Expression],
    env: &EnvRef,
    _token: &Token,
) -> EvalResult {
    let values = evaluator.eval_builtin_args(arguments, env)?;
    super::expect_args("internal_type_str", &values, 1)?;
    let tag = values[0].borrow().tag();
    Ok(string_obj(tag.to_string()))
}

pub fn lookup_hashable(
    evaluator: &mut Evaluator<'_>,
    arguments: &[Expression],
    env: &EnvRef,
    _token: &Token,
) -> EvalResult {
    let values = evaluator.eval_builtin_args(arguments, env)?;
    super::expect_args("lookup_hashable", &values, 1)?;
    let hashable = is_hashable(&values[0].borrow());
    Ok(boolean_obj(hashable))
}

pub fn lookup_hash(
    evaluator: &mut Evaluator<'_>,
    arguments: &[Expression],
    env: &EnvRef,
    _token: &Token,
) -> EvalResult {
    let values = evaluator.eval_builtin_args(arguments, env)?;
    super::expect_args("lookup_hash", &values, 1)?;
    if !is_hashable(&values[0].borrow()) {
        return Err(Flow::Error(ErrorObj::type_err(
            "lookup_hash: trying to hash an unhashable type",
        )));
    }
    let hash = object_hash(&values[0].borrow());
    Ok(integer_obj(hash as i64))
}

pub fn lookup_equal(
    evaluator: &mut Evaluator<'_>,
    arguments: &[Expression],
    env: &EnvRef,
    _token: &Token,
) -> EvalResult {
    let values = evaluator.eval_builtin_args(arguments, env)?;
    super::expect_args("lookup_equal", &values, 2)?;
    Ok(boolean_obj(object_eq(&values[0], &values[1])))
}

pub fn type_str(
    evaluator: &mut Evaluator<'_>,
    arguments: &[Expression],
    env: &EnvRef,
    _token: &Token,
) -> EvalResult {
    let values = evaluator.eval_builtin_args(arguments, env)?;
    super::expect_args("type_str", &values, 1)?;
    match crate::typing::compute_type_of_value(&values[0]) {
        Some(ty) => Ok(string_obj(ty.text())),
        None => Err(Flow::Error(ErrorObj::type_err(
            "type_str: cannot compute type",
        ))),
    }
}

pub fn error(
    evaluator: &mut Evaluator<'_>,
    arguments: &[Expression],
    env: &EnvRef,
    _token: &Token,
) -> EvalResult {
    let values = evaluator.eval_builtin_args(arguments, env)?;
    super::expect_args("error", &values, 1)?;
    let message = match &values[0].borrow().kind {
        ObjectKind::Str(text) => text.clone(),
        _ => {
            return Err(Flow::Error(ErrorObj::type_err(
                "error: expected 1 argument to be a string",
            )))
        }
    };
    Ok(error_value(ErrorObj::new(ErrorKind::UndefinedError, message)))
}

pub fn clone(
    evaluator: &mut Evaluator<'_>,
    arguments: &[Expression],
    env: &EnvRef,
    _token: &Token,
) -> EvalResult {
    let values = evaluator.eval_builtin_args(arguments, env)?;
    super::expect_args("clone", &values, 1)?;
    Ok(deep_clone(&values[0]))
}

/// Extracts attached documentation from functions and user types.
pub fn doc(
    evaluator: &mut Evaluator<'_>,
    arguments: &[Expression],
    env: &EnvRef,
    _token: &Token,
) -> EvalResult {
    let values = evaluator.eval_builtin_args(arguments, env)?;
    super::expect_args("doc", &values, 1)?;
    let documentation = match &values[0].borrow().kind {
        ObjectKind::Function(function) => function.doc.clone(),
        ObjectKind::UserType(user_type) => user_type.doc.clone(),
        ObjectKind::BoundUserTypeFunction(bound) => bound.function.doc.clone(),
        _ => None,
    };
    match documentation {
        Some(text) => Ok(string_obj(text)),
        None => Ok(null_obj()),
    }
}

pub fn input_line(
    evaluator: &mut Evaluator<'_>,
    arguments: &[Expression],
    env: &EnvRef,
    _token: &Token,
) -> EvalResult {
    let values = evaluator.eval_builtin_args(arguments, env)?;
    super::expect_args("input_line", &values, 0)?;
    let mut line = String::new();
    match std::io::stdin().read_line(&mut line) {
        Ok(_) => {
            while line.ends_with('\n') || line.ends_with('\r') {
                line.pop();
            }
            Ok(string_obj(line))
        }
        Err(error) => Err(Flow::Error(ErrorObj::os_err(format!(
            "input_line: {error}"
        )))),
    }
}

pub fn version(
    evaluator: &mut Evaluator<'_>,
    arguments: &[Expression],
    env: &EnvRef,
    _token: &Token,
) -> EvalResult {
    let values = evaluator.eval_builtin_args(arguments, env)?;
    super::expect_args("version", &values, 0)?;
    let (major, minor, patch) = crate::version::VERSION;
    Ok(alloc(ObjectKind::Array(vec![
        integer_obj(major),
        integer_obj(minor),
        integer_obj(patch),
    ])))
}

pub fn arg(
    evaluator: &mut Evaluator<'_>,
    arguments: &[Expression],
    env: &EnvRef,
    _token: &Token,
) -> EvalResult {
    let values = evaluator.eval_builtin_args(arguments, env)?;
    super::expect_args("arg", &values, 0)?;
    let items = evaluator
        .program_args
        .iter()
        .map(|argument| string_obj(argument.clone()))
        .collect();
    Ok(alloc(ObjectKind::Array(items)))
}

pub fn format(
    evaluator: &mut Evaluator<'_>,
    arguments: &[Expression],
    env: &EnvRef,
    token: &Token,
) -> EvalResult {
    let values = evaluator.eval_builtin_args(arguments, env)?;
    if values.is_empty() {
        return Err(Flow::Error(ErrorObj::type_err(
            "format: expected at least 1 of type str",
        )));
    }
    let template = match &values[0].borrow().kind {
        ObjectKind::Str(text) => text.clone(),
        _ => {
            return Err(Flow::Error(ErrorObj::type_err(
                "format: expected argument 1 to be a string",
            )))
        }
    };
    crate::format::format_template(&template, &values[1..])
        .map(string_obj)
        .map_err(|error| Flow::Error(error.stamped(token)))
}

/// Executes a source file in the caller's environment.
pub fn run(
    evaluator: &mut Evaluator<'_>,
    arguments: &[Expression],
    env: &EnvRef,
    _token: &Token,
) -> EvalResult {
    let values = evaluator.eval_builtin_args(arguments, env)?;
    super::expect_args("run", &values, 1)?;
    let path = match &values[0].borrow().kind {
        ObjectKind::Str(text) => text.clone(),
        _ => {
            return Err(Flow::Error(ErrorObj::type_err(
                "run: expected argument 1 to be a string",
            )))
        }
    };
    let Ok(text) = std::fs::read_to_string(&path) else {
        return Err(Flow::Error(ErrorObj::os_err(format!(
            "run: {path} cannot be read"
        ))));
    };
    evaluator.run_source_in_env(&text, &path, env)
}

/// Canonical paths already executed through `run_once`; process-wide so
/// a shared prelude loads at most once however many runners exist.
static RUN_ONCE_PATHS: std::sync::Mutex<Option<std::collections::HashSet<std::path::PathBuf>>> =
    std::sync::Mutex::new(None);

/// Like `run`, but a canonical path executes at most once per process.
pub fn run_once(
    evaluator: &mut Evaluator<'_>,
    arguments: &[Expression],
    env: &EnvRef,
    _token: &Token,
) -> EvalResult {
    let values = evaluator.eval_builtin_args(arguments, env)?;
    super::expect_args("run_once", &values, 1)?;
    let path = match &values[0].borrow().kind {
        ObjectKind::Str(text) => text.clone(),
        _ => {
            return Err(Flow::Error(ErrorObj::type_err(
                "run_once: expected argument 1 to be a string",
            )))
        }
    };
    let canonical = std::fs::canonicalize(&path).unwrap_or_else(|_| path.clone().into());
    {
        let mut registry = match RUN_ONCE_PATHS.lock() {
            Ok(registry) => registry,
            Err(poisoned) => poisoned.into_inner(),
        };
        let paths = registry.get_or_insert_with(std::collections::HashSet::new);
        if !paths.insert(canonical) {
            return Ok(null_obj());
        }
    }

    let Ok(text) = std::fs::read_to_string(&path) else {
        return Err(Flow::Error(ErrorObj::os_err(format!(
            "run: {path} cannot be read"
        ))));
    };
    evaluator.run_source_in_env(&text, &path, env)
}

pub fn exit(
    evaluator: &mut Evaluator<'_>,
    arguments: &[Expression],
    env: &EnvRef,
    _token: &Token,
) -> EvalResult {
    let values = evaluator.eval_builtin_args(arguments, env)?;
    if values.len() > 1 {
        return Err(Flow::Error(ErrorObj::type_err(
            "exit: expected zero or 1 arguments",
        )));
    }
    let code = match values.first() {
        None => 0,
        Some(value) => match &value.borrow().kind {
            ObjectKind::Integer(code) => *code as i32,
            _ => {
                return Err(Flow::Error(ErrorObj::type_err(
                    "exit: argument needs to be of type int",
                )))
            }
        },
    };
    Err(Flow::Exit(code))
}

/// Loads a source file into a fresh module environment and returns the
/// module value.
pub fn import(
    evaluator: &mut Evaluator<'_>,
    arguments: &[Expression],
    env: &EnvRef,
    _token: &Token,
) -> EvalResult {
    let values = evaluator.eval_builtin_args(arguments, env)?;
    super::expect_args("import", &values, 1)?;
    let path = match &values[0].borrow().kind {
        ObjectKind::Str(text) => text.clone(),
        _ => {
            return Err(Flow::Error(ErrorObj::type_err(
                "import: expected argument 1 to be a string",
            )))
        }
    };
    let Ok(text) = std::fs::read_to_string(&path) else {
        return Err(Flow::Error(ErrorObj::os_err(format!(
            "import: {path} cannot be read"
        ))));
    };
    let module_env = Environment::new(None);
    evaluator.run_source_in_env(&text, &path, &module_env)?;
    Ok(alloc(ObjectKind::Module(ModuleObj {
        state: ModuleState::Loaded,
        env: module_env,
        file_name: path,
    })))
}

pub fn scope_names(
    evaluator: &mut Evaluator<'_>,
    arguments: &[Expression],
    env: &EnvRef,
    _token: &Token,
) -> EvalResult {
    let values = evaluator.eval_builtin_args(arguments, env)?;
    super::expect_args("scope_names", &values, 0)?;
    let names = env.borrow().visible_names();
    Ok(alloc(ObjectKind::Array(
        names.into_iter().map(string_obj).collect(),
    )))
}

pub fn len(
    evaluator: &mut Evaluator<'_>,
    arguments: &[Expression],
    env: &EnvRef,
    _token: &Token,
) -> EvalResult {
    let values = evaluator.eval_builtin_args(arguments, env)?;
    super::expect_args("len", &values, 1)?;
    let length = match &values[0].borrow().kind {
        ObjectKind::Str(text) => text.chars().count() as i64,
        ObjectKind::Array(items) => items.len() as i64,
        ObjectKind::ArrayDouble(items) => items.len() as i64,
        ObjectKind::ArrayComplex(items) => items.len() as i64,
        ObjectKind::Dictionary(map) => map.len() as i64,
        ObjectKind::Set(set) => set.len() as i64,
        ObjectKind::Range(range) => range.length(),
        other => {
            return Err(Flow::Error(ErrorObj::type_err(format!(
                "Invalid type for len: {}",
                other.tag()
            ))))
        }
    };
    Ok(integer_obj(length))
}

pub fn keys(
    evaluator: &mut Evaluator<'_>,
    arguments: &[Expression],
    env: &EnvRef,
    _token: &Token,
) -> EvalResult {
    let values = evaluator.eval_builtin_args(arguments, env)?;
    super::expect_args("keys", &values, 1)?;
    let keys = match &values[0].borrow().kind {
        ObjectKind::Dictionary(map) => map.keys().map(|key| key.0.clone()).collect(),
        other => {
            return Err(Flow::Error(ErrorObj::type_err(format!(
                "Invalid type for keys: {}",
                other.tag()
            ))))
        }
    };
    Ok(alloc(ObjectKind::Array(keys)))
}

pub fn values(
    evaluator: &mut Evaluator<'_>,
    arguments: &[Expression],
    env: &EnvRef,
    _token: &Token,
) -> EvalResult {
    let values = evaluator.eval_builtin_args(arguments, env)?;
    super::expect_args("values", &values, 1)?;
    let items = match &values[0].borrow().kind {
        ObjectKind::Dictionary(map) => map.values().cloned().collect(),
        other => {
            return Err(Flow::Error(ErrorObj::type_err(format!(
                "Invalid type for values: {}",
                other.tag()
            ))))
        }
    };
    Ok(alloc(ObjectKind::Array(items)))
}

/// Opens a file stream; a failed open yields an io value that reports
/// `is_open() == false`.
pub fn open(
    evaluator: &mut Evaluator<'_>,
    arguments: &[Expression],
    env: &EnvRef,
    _token: &Token,
) -> EvalResult {
    let values = evaluator.eval_builtin_args(arguments, env)?;
    if values.is_empty() || values.len() > 2 {
        return Err(Flow::Error(ErrorObj::type_err(
            "open: expected 1 or 2 argument of type (str,str)",
        )));
    }
    let path = match &values[0].borrow().kind {
        ObjectKind::Str(text) => text.clone(),
        _ => {
            return Err(Flow::Error(ErrorObj::type_err(
                "open: expected argument 1 to be a string",
            )))
        }
    };
    let mode_text = match values.get(1) {
        None => "r".to_string(),
        Some(value) => match &value.borrow().kind {
            ObjectKind::Str(text) => text.clone(),
            _ => {
                return Err(Flow::Error(ErrorObj::type_err(
                    "open: expected argument 2 to be a string",
                )))
            }
        },
    };
    let Some(mode) = OpenMode::parse(&mode_text) else {
        return Err(Flow::Error(ErrorObj::type_err(format!(
            "open: openmode has to be one of r,rb,w,wb,a, got {mode_text}"
        ))));
    };

    let file = crate::types::io::open_file(&path, mode);
    Ok(alloc(ObjectKind::IOObject(IoObj { path, mode, file })))
}
