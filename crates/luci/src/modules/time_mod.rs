//! The `time` module: `time() -> double`, seconds since the Unix epoch.

use chrono::Utc;

use crate::errors::{ErrorObj, Flow};
use crate::object::{double_obj, ObjectRef};

use super::{add_function, module_value, new_module_env};

#[must_use]
pub fn create_module() -> ObjectRef {
    let env = new_module_env();

    add_function(
        &env,
        "time",
        "",
        "double",
        Box::new(|evaluator, arguments, call_env, _token| {
            let values = evaluator.eval_builtin_args(arguments, call_env)?;
            if !values.is_empty() {
                return Err(Flow::Error(ErrorObj::type_err("time: expected no arguments")));
            }
            let now = Utc::now();
            Ok(double_obj(now.timestamp_micros() as f64 / 1e6))
        }),
    );

    module_value(env)
}
