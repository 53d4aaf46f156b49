//! The `threading` module: `thread(fn[, arg])` and `sleep(double)`.

use std::sync::{Arc, Mutex};

use crate::errors::{ErrorObj, Flow};
use crate::object::{alloc, null_obj, ObjectKind, ObjectRef, ThreadObj};

use super::{add_function, module_value, new_module_env};

#[must_use]
pub fn create_module() -> ObjectRef {
    let env = new_module_env();

    add_function(
        &env,
        "thread",
        "fn() -> all",
        "thread",
        Box::new(|evaluator, arguments, call_env, _token| {
            let values = evaluator.eval_builtin_args(arguments, call_env)?;
            if values.is_empty() || values.len() > 2 {
                return Err(Flow::Error(ErrorObj::type_err(
                    "thread: expected 1 or 2 arguments of type (fn, all)",
                )));
            }
            let function = match &values[0].borrow().kind {
                ObjectKind::Function(function) => function.clone(),
                _ => {
                    return Err(Flow::Error(ErrorObj::type_err(
                        "thread: expected argument 1 to be a function",
                    )))
                }
            };
            let argument = values.get(1).cloned();
            Ok(alloc(ObjectKind::Thread(ThreadObj {
                function,
                argument,
                handle: None,
                result: Arc::new(Mutex::new(None)),
            })))
        }),
    );

    add_function(
        &env,
        "sleep",
        "double",
        "null",
        Box::new(|evaluator, arguments, call_env, _token| {
            let values = evaluator.eval_builtin_args(arguments, call_env)?;
            if values.len() != 1 {
                return Err(Flow::Error(ErrorObj::type_err("sleep: expected 1 argument")));
            }
            let seconds = match &values[0].borrow().kind {
                ObjectKind::Double(seconds) => *seconds,
                _ => {
                    return Err(Flow::Error(ErrorObj::type_err(
                        "sleep: expected argument 1 to be a double",
                    )))
                }
            };
            if seconds > 0.0 {
                std::thread::sleep(std::time::Duration::from_secs_f64(seconds));
            }
            Ok(null_obj())
        }),
    );

    module_value(env)
}
