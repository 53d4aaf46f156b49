//! The `json` module: `load(str) -> all` and `dump(all) -> str`, built on
//! serde_json with order-preserving maps so dictionaries round-trip in
//! insertion order.

use serde_json::Value as JsonValue;

use crate::errors::{ErrorKind, ErrorObj, Flow};
use crate::object::{
    alloc, boolean_obj, double_obj, inspect, integer_obj, null_obj, string_obj, DictMap, HashKey,
    ObjectKind, ObjectRef,
};

use super::{add_function, module_value, new_module_env};

#[must_use]
pub fn create_module() -> ObjectRef {
    let env = new_module_env();

    add_function(
        &env,
        "load",
        "str",
        "all",
        Box::new(|evaluator, arguments, call_env, _token| {
            let values = evaluator.eval_builtin_args(arguments, call_env)?;
            if values.len() != 1 {
                return Err(Flow::Error(ErrorObj::type_err("load: expected 1 argument")));
            }
            let text = match &values[0].borrow().kind {
                ObjectKind::Str(text) => text.clone(),
                _ => {
                    return Err(Flow::Error(ErrorObj::type_err(
                        "load: expected argument 1 to be a string",
                    )))
                }
            };
            let parsed: JsonValue = serde_json::from_str(&text).map_err(|error| {
                Flow::Error(ErrorObj::new(
                    ErrorKind::ValueError,
                    format!("load: invalid json: {error}"),
                ))
            })?;
            Ok(json_to_object(&parsed))
        }),
    );

    add_function(
        &env,
        "dump",
        "all",
        "str",
        Box::new(|evaluator, arguments, call_env, _token| {
            let values = evaluator.eval_builtin_args(arguments, call_env)?;
            if values.len() != 1 {
                return Err(Flow::Error(ErrorObj::type_err("dump: expected 1 argument")));
            }
            let rendered = object_to_json(&values[0])?;
            Ok(string_obj(rendered.to_string()))
        }),
    );

    module_value(env)
}

fn json_to_object(value: &JsonValue) -> ObjectRef {
    match value {
        JsonValue::Null => null_obj(),
        JsonValue::Bool(value) => boolean_obj(*value),
        JsonValue::Number(number) => {
            if let Some(value) = number.as_i64() {
                integer_obj(value)
            } else {
                double_obj(number.as_f64().unwrap_or(f64::NAN))
            }
        }
        JsonValue::String(text) => string_obj(text.clone()),
        JsonValue::Array(items) => {
            alloc(ObjectKind::Array(items.iter().map(json_to_object).collect()))
        }
        JsonValue::Object(entries) => {
            let mut map = DictMap::default();
            for (key, value) in entries {
                // string keys are scalars and hash without freezing
                map.insert(HashKey(string_obj(key.clone())), json_to_object(value));
            }
            alloc(ObjectKind::Dictionary(map))
        }
    }
}

fn object_to_json(object: &ObjectRef) -> Result<JsonValue, Flow> {
    let guard = object.borrow();
    match &guard.kind {
        ObjectKind::Null => Ok(JsonValue::Null),
        ObjectKind::Boolean(value) => Ok(JsonValue::Bool(*value)),
        ObjectKind::Integer(value) => Ok(JsonValue::Number((*value).into())),
        ObjectKind::Double(value) => serde_json::Number::from_f64(*value)
            .map(JsonValue::Number)
            .ok_or_else(|| {
                Flow::Error(ErrorObj::value_err(
                    "dump: cannot represent a non-finite double",
                ))
            }),
        ObjectKind::Str(text) => Ok(JsonValue::String(text.clone())),
        ObjectKind::Array(items) => {
            let mut rendered = Vec::with_capacity(items.len());
            for item in items {
                rendered.push(object_to_json(item)?);
            }
            Ok(JsonValue::Array(rendered))
        }
        ObjectKind::ArrayDouble(items) => {
            let mut rendered = Vec::with_capacity(items.len());
            for item in items {
                rendered.push(
                    serde_json::Number::from_f64(*item)
                        .map(JsonValue::Number)
                        .ok_or_else(|| {
                            Flow::Error(ErrorObj::value_err(
                                "dump: cannot represent a non-finite double",
                            ))
                        })?,
                );
            }
            Ok(JsonValue::Array(rendered))
        }
        ObjectKind::Dictionary(map) => {
            let mut entries = serde_json::Map::new();
            for (key, value) in map {
                let key_text = match &key.0.borrow().kind {
                    ObjectKind::Str(text) => text.clone(),
                    _ => {
                        return Err(Flow::Error(ErrorObj::type_err(format!(
                            "dump: dictionary keys must be strings, got {}",
                            inspect(&key.0)
                        ))))
                    }
                };
                entries.insert(key_text, object_to_json(value)?);
            }
            Ok(JsonValue::Object(entries))
        }
        other => Err(Flow::Error(ErrorObj::type_err(format!(
            "dump: cannot serialize {}",
            other.tag()
        )))),
    }
}
