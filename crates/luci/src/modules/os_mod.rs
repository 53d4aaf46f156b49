//! The `os` module: filesystem operations plus the `os::path` submodule
//! of pure string path helpers.

use std::path::{Path, PathBuf};

use crate::env::EnvRef;
use crate::errors::{ErrorObj, Flow};
use crate::object::{alloc, boolean_obj, integer_obj, null_obj, string_obj, ObjectKind, ObjectRef};

use super::{add_function, module_value, new_module_env};

fn string_args(values: &[ObjectRef], expected: usize, name: &str) -> Result<Vec<String>, Flow> {
    if values.len() != expected {
        return Err(Flow::Error(ErrorObj::type_err(format!(
            "{name}: expected {expected} arguments, got {}",
            values.len()
        ))));
    }
    let mut rendered = Vec::with_capacity(values.len());
    for (index, value) in values.iter().enumerate() {
        match &value.borrow().kind {
            ObjectKind::Str(text) => rendered.push(text.clone()),
            _ => {
                return Err(Flow::Error(ErrorObj::type_err(format!(
                    "{name}: expected argument {} to be a str",
                    index + 1
                ))))
            }
        }
    }
    Ok(rendered)
}

fn os_error(name: &str, error: impl std::fmt::Display) -> Flow {
    Flow::Error(ErrorObj::os_err(format!("{name}: {error}")))
}

/// Registers a `fn(str) -> str` path transform.
fn add_path_transform(
    env: &EnvRef,
    name: &'static str,
    transform: fn(&Path) -> String,
) {
    add_function(
        env,
        name,
        "str",
        "str",
        Box::new(move |evaluator, arguments, call_env, _token| {
            let values = evaluator.eval_builtin_args(arguments, call_env)?;
            let args = string_args(&values, 1, name)?;
            Ok(string_obj(transform(Path::new(&args[0]))))
        }),
    );
}

fn create_path_module() -> ObjectRef {
    let env = new_module_env();

    add_function(
        &env,
        "join",
        "[str]",
        "str",
        Box::new(|evaluator, arguments, call_env, _token| {
            let values = evaluator.eval_builtin_args(arguments, call_env)?;
            if values.len() != 1 {
                return Err(Flow::Error(ErrorObj::type_err("join: expected 1 argument")));
            }
            let segments: Vec<String> = match &values[0].borrow().kind {
                ObjectKind::Array(items) => {
                    let mut segments = Vec::with_capacity(items.len());
                    for item in items {
                        match &item.borrow().kind {
                            ObjectKind::Str(text) => segments.push(text.clone()),
                            _ => {
                                return Err(Flow::Error(ErrorObj::type_err(
                                    "join: expected argument 1 to be an array of str",
                                )))
                            }
                        }
                    }
                    segments
                }
                _ => {
                    return Err(Flow::Error(ErrorObj::type_err(
                        "join: expected argument 1 to be an array of str",
                    )))
                }
            };
            let mut joined = PathBuf::new();
            for segment in segments {
                joined.push(segment);
            }
            Ok(string_obj(joined.display().to_string()))
        }),
    );

    add_path_transform(&env, "root_name", |_path| String::new());
    add_path_transform(&env, "root_directory", |path| {
        if path.has_root() {
            std::path::MAIN_SEPARATOR.to_string()
        } else {
            String::new()
        }
    });
    add_path_transform(&env, "root_path", |path| {
        if path.has_root() {
            std::path::MAIN_SEPARATOR.to_string()
        } else {
            String::new()
        }
    });
    add_path_transform(&env, "relative_path", |path| {
        let mut components = path.components();
        if path.has_root() {
            components.next();
        }
        components.as_path().display().to_string()
    });
    add_path_transform(&env, "parent_path", |path| {
        path.parent()
            .map_or_else(String::new, |parent| parent.display().to_string())
    });
    add_path_transform(&env, "filename", |path| {
        path.file_name()
            .map_or_else(String::new, |name| name.to_string_lossy().into_owned())
    });
    add_path_transform(&env, "stem", |path| {
        path.file_stem()
            .map_or_else(String::new, |stem| stem.to_string_lossy().into_owned())
    });
    add_path_transform(&env, "extension", |path| {
        path.extension()
            .map_or_else(String::new, |extension| format!(".{}", extension.to_string_lossy()))
    });

    add_function(
        &env,
        "is_relative",
        "str",
        "bool",
        Box::new(|evaluator, arguments, call_env, _token| {
            let values = evaluator.eval_builtin_args(arguments, call_env)?;
            let args = string_args(&values, 1, "is_relative")?;
            Ok(boolean_obj(Path::new(&args[0]).is_relative()))
        }),
    );
    add_function(
        &env,
        "is_absolute",
        "str",
        "bool",
        Box::new(|evaluator, arguments, call_env, _token| {
            let values = evaluator.eval_builtin_args(arguments, call_env)?;
            let args = string_args(&values, 1, "is_absolute")?;
            Ok(boolean_obj(Path::new(&args[0]).is_absolute()))
        }),
    );

    module_value(env)
}

#[must_use]
pub fn create_module() -> ObjectRef {
    let env = new_module_env();

    add_function(
        &env,
        "absolute",
        "str",
        "str",
        Box::new(|evaluator, arguments, call_env, _token| {
            let values = evaluator.eval_builtin_args(arguments, call_env)?;
            let args = string_args(&values, 1, "absolute")?;
            let path = Path::new(&args[0]);
            let absolute = if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()
                    .map_err(|error| os_error("absolute", error))?
                    .join(path)
            };
            Ok(string_obj(absolute.display().to_string()))
        }),
    );
    add_function(
        &env,
        "canonical",
        "str",
        "str",
        Box::new(|evaluator, arguments, call_env, _token| {
            let values = evaluator.eval_builtin_args(arguments, call_env)?;
            let args = string_args(&values, 1, "canonical")?;
            let canonical =
                std::fs::canonicalize(&args[0]).map_err(|error| os_error("canonical", error))?;
            Ok(string_obj(canonical.display().to_string()))
        }),
    );
    add_function(
        &env,
        "weakly_canonical",
        "str",
        "str",
        Box::new(|evaluator, arguments, call_env, _token| {
            let values = evaluator.eval_builtin_args(arguments, call_env)?;
            let args = string_args(&values, 1, "weakly_canonical")?;
            let canonical = std::fs::canonicalize(&args[0])
                .unwrap_or_else(|_| PathBuf::from(&args[0]));
            Ok(string_obj(canonical.display().to_string()))
        }),
    );
    add_function(
        &env,
        "current_path",
        "",
        "str",
        Box::new(|evaluator, arguments, call_env, _token| {
            let values = evaluator.eval_builtin_args(arguments, call_env)?;
            string_args(&values, 0, "current_path")?;
            let current = std::env::current_dir().map_err(|error| os_error("current_path", error))?;
            Ok(string_obj(current.display().to_string()))
        }),
    );
    add_function(
        &env,
        "temp_directory_path",
        "",
        "str",
        Box::new(|evaluator, arguments, call_env, _token| {
            let values = evaluator.eval_builtin_args(arguments, call_env)?;
            string_args(&values, 0, "temp_directory_path")?;
            Ok(string_obj(std::env::temp_dir().display().to_string()))
        }),
    );
    add_function(
        &env,
        "exists",
        "str",
        "bool",
        Box::new(|evaluator, arguments, call_env, _token| {
            let values = evaluator.eval_builtin_args(arguments, call_env)?;
            let args = string_args(&values, 1, "exists")?;
            Ok(boolean_obj(Path::new(&args[0]).exists()))
        }),
    );
    add_function(
        &env,
        "create_directory",
        "str",
        "bool",
        Box::new(|evaluator, arguments, call_env, _token| {
            let values = evaluator.eval_builtin_args(arguments, call_env)?;
            let args = string_args(&values, 1, "create_directory")?;
            Ok(boolean_obj(std::fs::create_dir(&args[0]).is_ok()))
        }),
    );
    add_function(
        &env,
        "create_directories",
        "str",
        "bool",
        Box::new(|evaluator, arguments, call_env, _token| {
            let values = evaluator.eval_builtin_args(arguments, call_env)?;
            let args = string_args(&values, 1, "create_directories")?;
            Ok(boolean_obj(std::fs::create_dir_all(&args[0]).is_ok()))
        }),
    );
    add_function(
        &env,
        "remove",
        "str",
        "bool",
        Box::new(|evaluator, arguments, call_env, _token| {
            let values = evaluator.eval_builtin_args(arguments, call_env)?;
            let args = string_args(&values, 1, "remove")?;
            let path = Path::new(&args[0]);
            let removed = if path.is_dir() {
                std::fs::remove_dir(path).is_ok()
            } else {
                std::fs::remove_file(path).is_ok()
            };
            Ok(boolean_obj(removed))
        }),
    );
    add_function(
        &env,
        "remove_all",
        "str",
        "bool",
        Box::new(|evaluator, arguments, call_env, _token| {
            let values = evaluator.eval_builtin_args(arguments, call_env)?;
            let args = string_args(&values, 1, "remove_all")?;
            let path = Path::new(&args[0]);
            let removed = if path.is_dir() {
                std::fs::remove_dir_all(path).is_ok()
            } else {
                std::fs::remove_file(path).is_ok()
            };
            Ok(boolean_obj(removed))
        }),
    );
    add_function(
        &env,
        "copy",
        "str, str",
        "null",
        Box::new(|evaluator, arguments, call_env, _token| {
            let values = evaluator.eval_builtin_args(arguments, call_env)?;
            let args = string_args(&values, 2, "copy")?;
            std::fs::copy(&args[0], &args[1]).map_err(|error| os_error("copy", error))?;
            Ok(null_obj())
        }),
    );
    add_function(
        &env,
        "rename",
        "str, str",
        "null",
        Box::new(|evaluator, arguments, call_env, _token| {
            let values = evaluator.eval_builtin_args(arguments, call_env)?;
            let args = string_args(&values, 2, "rename")?;
            std::fs::rename(&args[0], &args[1]).map_err(|error| os_error("rename", error))?;
            Ok(null_obj())
        }),
    );
    add_function(
        &env,
        "list_dir",
        "str",
        "[str]",
        Box::new(|evaluator, arguments, call_env, _token| {
            let values = evaluator.eval_builtin_args(arguments, call_env)?;
            let args = string_args(&values, 1, "list_dir")?;
            let entries = std::fs::read_dir(&args[0]).map_err(|error| os_error("list_dir", error))?;
            let mut names = vec![];
            for entry in entries {
                let entry = entry.map_err(|error| os_error("list_dir", error))?;
                names.push(string_obj(entry.path().display().to_string()));
            }
            Ok(alloc(ObjectKind::Array(names)))
        }),
    );
    add_function(
        &env,
        "list_dir_recursively",
        "str",
        "[str]",
        Box::new(|evaluator, arguments, call_env, _token| {
            let values = evaluator.eval_builtin_args(arguments, call_env)?;
            let args = string_args(&values, 1, "list_dir_recursively")?;
            let mut names = vec![];
            let mut pending = vec![PathBuf::from(&args[0])];
            while let Some(directory) = pending.pop() {
                let entries = std::fs::read_dir(&directory)
                    .map_err(|error| os_error("list_dir_recursively", error))?;
                for entry in entries {
                    let entry = entry.map_err(|error| os_error("list_dir_recursively", error))?;
                    let path = entry.path();
                    names.push(string_obj(path.display().to_string()));
                    if path.is_dir() {
                        pending.push(path);
                    }
                }
            }
            Ok(alloc(ObjectKind::Array(names)))
        }),
    );
    add_function(
        &env,
        "system",
        "str",
        "int",
        Box::new(|evaluator, arguments, call_env, _token| {
            let values = evaluator.eval_builtin_args(arguments, call_env)?;
            let args = string_args(&values, 1, "system")?;
            let status = std::process::Command::new("sh")
                .arg("-c")
                .arg(&args[0])
                .status()
                .map_err(|error| os_error("system", error))?;
            Ok(integer_obj(i64::from(status.code().unwrap_or(-1))))
        }),
    );
    add_function(
        &env,
        "getenv",
        "str",
        "str",
        Box::new(|evaluator, arguments, call_env, _token| {
            let values = evaluator.eval_builtin_args(arguments, call_env)?;
            let args = string_args(&values, 1, "getenv")?;
            Ok(string_obj(std::env::var(&args[0]).unwrap_or_default()))
        }),
    );

    // the `os::path` submodule of pure string helpers
    let _ = env
        .borrow_mut()
        .add("path", create_path_module(), true, None);

    module_value(env)
}
