//! The `typing` module: type-compatibility queries over rendered type
//! expressions.

use crate::errors::{ErrorObj, Flow};
use crate::object::{boolean_obj, ObjectKind, ObjectRef};
use crate::typing::{is_compatible, parse_type};

use super::{add_function, module_value, new_module_env};

#[must_use]
pub fn create_module() -> ObjectRef {
    let env = new_module_env();

    add_function(
        &env,
        "is_compatible_type_str",
        "str, str",
        "bool",
        Box::new(|evaluator, arguments, call_env, _token| {
            let values = evaluator.eval_builtin_args(arguments, call_env)?;
            if values.len() != 2 {
                return Err(Flow::Error(ErrorObj::type_err(
                    "is_compatible_type_str: expected 2 arguments",
                )));
            }
            let mut rendered = [String::new(), String::new()];
            for (index, value) in values.iter().enumerate() {
                match &value.borrow().kind {
                    ObjectKind::Str(text) => rendered[index] = text.clone(),
                    _ => {
                        return Err(Flow::Error(ErrorObj::type_err(format!(
                            "is_compatible_type_str: expected argument {} to be a str",
                            index + 1
                        ))))
                    }
                }
            }
            let a = parse_type(&rendered[0]);
            let b = parse_type(&rendered[1]);
            Ok(boolean_obj(is_compatible(Some(&a), Some(&b))))
        }),
    );

    module_value(env)
}
