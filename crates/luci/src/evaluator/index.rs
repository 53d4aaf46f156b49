//! Index expressions and the uniform `update(container, index, value)`
//! path used by index assignment.

use crate::ast::Expression;
use crate::env::EnvRef;
use crate::errors::{ErrorKind, ErrorObj, EvalResult, Flow};
use crate::object::{
    alloc, deep_clone, double_obj, inspect, integer_obj, is_hashable, is_value_assigned,
    string_obj, HashKey, ObjectKind, ObjectRef, Range,
};
use crate::token::Token;

use super::Evaluator;

/// Negative indices wrap from the end, modulo the length; out-of-range
/// values stay out of range and are reported by the caller.
#[must_use]
pub fn normalized_array_index(index: i64, length: usize) -> usize {
    if index < 0 {
        if length > 0 {
            let length = length as i64;
            return ((length - (index.abs() % length)) % length) as usize;
        }
        return usize::MAX;
    }
    index as usize
}

fn index_error(original: i64, normalized: usize, what: &str, length: usize, token: &Token) -> Flow {
    Flow::Error(ErrorObj::with_token(
        ErrorKind::IndexError,
        format!(
            "Indexing error, index={original} transformed to {normalized}, {what} size={length}"
        ),
        token.clone(),
    ))
}

impl Evaluator<'_> {
    pub(crate) fn eval_index_expression(&mut self, expression: &Expression, env: &EnvRef) -> EvalResult {
        let Expression::Index {
            token,
            expression: target,
            index,
        } = expression
        else {
            return Err(Flow::Error(ErrorObj::type_err("expected index expression")));
        };

        let index_value = self.eval_expression(index, env, None)?;
        let target_value = self.eval_expression(target, env, None)?;
        self.eval_index_value(&target_value, &index_value, token)
    }

    /// Indexes into an evaluated container with an evaluated index.
    pub(crate) fn eval_index_value(
        &mut self,
        target: &ObjectRef,
        index: &ObjectRef,
        token: &Token,
    ) -> EvalResult {
        let target_tag = target.borrow().tag();
        match target_tag {
            crate::object::Tag::Array => {
                let items: Vec<ObjectRef> = match &target.borrow().kind {
                    ObjectKind::Array(items) => items.clone(),
                    _ => vec![],
                };
                if items.is_empty() {
                    return Err(Flow::Error(ErrorObj::with_token(
                        ErrorKind::IndexError,
                        "Attempting index in empty array",
                        token.clone(),
                    )));
                }
                match index_values(index) {
                    IndexKind::Single(value) => {
                        let final_index = normalized_array_index(value, items.len());
                        items.get(final_index).cloned().ok_or_else(|| {
                            index_error(value, final_index, "array", items.len(), token)
                        })
                    }
                    IndexKind::Many(values) => {
                        let mut selected = Vec::with_capacity(values.len());
                        for value in values {
                            let final_index = normalized_array_index(value, items.len());
                            let Some(item) = items.get(final_index) else {
                                return Err(index_error(
                                    value,
                                    final_index,
                                    "array",
                                    items.len(),
                                    token,
                                ));
                            };
                            selected.push(item.clone());
                        }
                        Ok(alloc(ObjectKind::Array(selected)))
                    }
                    IndexKind::Invalid(tag) => Err(Flow::Error(ErrorObj::with_token(
                        ErrorKind::TypeError,
                        format!(
                            "Indexing in array must be done with Integer or Range but found {tag}"
                        ),
                        token.clone(),
                    ))),
                }
            }
            crate::object::Tag::ArrayDouble => {
                let items: Vec<f64> = match &target.borrow().kind {
                    ObjectKind::ArrayDouble(items) => items.clone(),
                    _ => vec![],
                };
                if items.is_empty() {
                    return Err(Flow::Error(ErrorObj::with_token(
                        ErrorKind::IndexError,
                        "Attempting index in empty array",
                        token.clone(),
                    )));
                }
                match index_values(index) {
                    IndexKind::Single(value) => {
                        let final_index = normalized_array_index(value, items.len());
                        items.get(final_index).copied().map(double_obj).ok_or_else(
                            || index_error(value, final_index, "array", items.len(), token),
                        )
                    }
                    IndexKind::Many(values) => {
                        let mut selected = Vec::with_capacity(values.len());
                        for value in values {
                            let final_index = normalized_array_index(value, items.len());
                            let Some(item) = items.get(final_index) else {
                                return Err(index_error(
                                    value,
                                    final_index,
                                    "array",
                                    items.len(),
                                    token,
                                ));
                            };
                            selected.push(*item);
                        }
                        Ok(alloc(ObjectKind::ArrayDouble(selected)))
                    }
                    IndexKind::Invalid(tag) => Err(Flow::Error(ErrorObj::with_token(
                        ErrorKind::TypeError,
                        format!(
                            "Indexing in array must be done with Integer or Range but found {tag}"
                        ),
                        token.clone(),
                    ))),
                }
            }
            crate::object::Tag::ArrayComplex => {
                let items: Vec<num_complex::Complex64> = match &target.borrow().kind {
                    ObjectKind::ArrayComplex(items) => items.clone(),
                    _ => vec![],
                };
                if items.is_empty() {
                    return Err(Flow::Error(ErrorObj::with_token(
                        ErrorKind::IndexError,
                        "Attempting index in empty array",
                        token.clone(),
                    )));
                }
                match index_values(index) {
                    IndexKind::Single(value) => {
                        let final_index = normalized_array_index(value, items.len());
                        items
                            .get(final_index)
                            .copied()
                            .map(|value| alloc(ObjectKind::Complex(value)))
                            .ok_or_else(|| {
                                index_error(value, final_index, "array", items.len(), token)
                            })
                    }
                    IndexKind::Many(values) => {
                        let mut selected = Vec::with_capacity(values.len());
                        for value in values {
                            let final_index = normalized_array_index(value, items.len());
                            let Some(item) = items.get(final_index) else {
                                return Err(index_error(
                                    value,
                                    final_index,
                                    "array",
                                    items.len(),
                                    token,
                                ));
                            };
                            selected.push(*item);
                        }
                        Ok(alloc(ObjectKind::ArrayComplex(selected)))
                    }
                    IndexKind::Invalid(tag) => Err(Flow::Error(ErrorObj::with_token(
                        ErrorKind::TypeError,
                        format!(
                            "Indexing in array must be done with Integer or Range but found {tag}"
                        ),
                        token.clone(),
                    ))),
                }
            }
            crate::object::Tag::Dictionary => {
                if !is_hashable(&index.borrow()) {
                    return Err(Flow::Error(ErrorObj::with_token(
                        ErrorKind::TypeError,
                        format!("Trying to look up unhashable key {}", inspect(index)),
                        token.clone(),
                    )));
                }
                let guard = target.borrow();
                let ObjectKind::Dictionary(map) = &guard.kind else {
                    unreachable!("tag checked above");
                };
                if map.is_empty() {
                    return Err(Flow::Error(ErrorObj::with_token(
                        ErrorKind::KeyError,
                        "Attempting index in empty dictionary",
                        token.clone(),
                    )));
                }
                map.get(&HashKey(index.clone())).cloned().ok_or_else(|| {
                    Flow::Error(ErrorObj::with_token(
                        ErrorKind::KeyError,
                        format!("Key {} not found", inspect(index)),
                        token.clone(),
                    ))
                })
            }
            crate::object::Tag::String => {
                let text: String = match &target.borrow().kind {
                    ObjectKind::Str(text) => text.clone(),
                    _ => String::new(),
                };
                if text.is_empty() {
                    return Err(Flow::Error(ErrorObj::with_token(
                        ErrorKind::TypeError,
                        "Attempting index in empty string",
                        token.clone(),
                    )));
                }
                let chars: Vec<char> = text.chars().collect();
                match index_values(index) {
                    IndexKind::Single(value) => {
                        let final_index = normalized_array_index(value, chars.len());
                        chars
                            .get(final_index)
                            .map(|ch| string_obj(ch.to_string()))
                            .ok_or_else(|| {
                                index_error(value, final_index, "string", chars.len(), token)
                            })
                    }
                    IndexKind::Many(values) => {
                        let mut selected = String::new();
                        for value in values {
                            let final_index = normalized_array_index(value, chars.len());
                            let Some(ch) = chars.get(final_index) else {
                                return Err(index_error(
                                    value,
                                    final_index,
                                    "string",
                                    chars.len(),
                                    token,
                                ));
                            };
                            selected.push(*ch);
                        }
                        Ok(string_obj(selected))
                    }
                    IndexKind::Invalid(tag) => Err(Flow::Error(ErrorObj::with_token(
                        ErrorKind::TypeError,
                        format!(
                            "Indexing in string must be done with Integer or Range but found {tag}"
                        ),
                        token.clone(),
                    ))),
                }
            }
            crate::object::Tag::Range => {
                let range: Range = match &target.borrow().kind {
                    ObjectKind::Range(range) => *range,
                    _ => unreachable!("tag checked above"),
                };
                let length = range.length() as usize;
                if length == 0 {
                    return Err(Flow::Error(ErrorObj::with_token(
                        ErrorKind::TypeError,
                        "Attempting index in empty range",
                        token.clone(),
                    )));
                }
                let values: Vec<i64> = range.values().collect();
                match index_values(index) {
                    IndexKind::Single(value) => {
                        let final_index = normalized_array_index(value, length);
                        values.get(final_index).copied().map(integer_obj).ok_or_else(
                            || index_error(value, final_index, "range", length, token),
                        )
                    }
                    IndexKind::Many(indices) => {
                        let mut selected = Vec::with_capacity(indices.len());
                        for value in indices {
                            let final_index = normalized_array_index(value, length);
                            let Some(item) = values.get(final_index) else {
                                return Err(index_error(value, final_index, "range", length, token));
                            };
                            selected.push(integer_obj(*item));
                        }
                        Ok(alloc(ObjectKind::Array(selected)))
                    }
                    IndexKind::Invalid(tag) => Err(Flow::Error(ErrorObj::with_token(
                        ErrorKind::IndexError,
                        format!(
                            "Indexing in range must be done with Integer or Range but found {tag}"
                        ),
                        token.clone(),
                    ))),
                }
            }
            other => Err(Flow::Error(ErrorObj::with_token(
                ErrorKind::TypeError,
                format!("Was expecting array, dictionary or string but found {other}"),
                token.clone(),
            ))),
        }
    }

    /// Uniform insert-or-assign used by index assignment and the `update`
    /// builtin. Frozen containers refuse the update.
    pub(crate) fn update_container(
        &mut self,
        container: &ObjectRef,
        index: &ObjectRef,
        value: &ObjectRef,
        token: &Token,
    ) -> EvalResult {
        let tag = container.borrow().tag();
        if container.borrow().frozen > 0 {
            return Err(Flow::Error(ErrorObj::with_token(
                ErrorKind::TypeError,
                format!("{tag} update expects a non-frozen object"),
                token.clone(),
            )));
        }

        match tag {
            crate::object::Tag::Array => {
                let index_value = require_integer_index(index, token)?;
                let length = match &container.borrow().kind {
                    ObjectKind::Array(items) => items.len(),
                    _ => 0,
                };
                let final_index = normalized_array_index(index_value, length);
                if final_index >= length {
                    return Err(index_error(index_value, final_index, "array", length, token));
                }
                let stored = if is_value_assigned(value) {
                    deep_clone(value)
                } else {
                    value.clone()
                };
                if let ObjectKind::Array(items) = &mut container.borrow_mut().kind {
                    items[final_index] = stored;
                }
                Ok(container.clone())
            }
            crate::object::Tag::ArrayDouble => {
                let index_value = require_integer_index(index, token)?;
                let new_value = match &value.borrow().kind {
                    ObjectKind::Double(value) => *value,
                    other => {
                        return Err(Flow::Error(ErrorObj::with_token(
                            ErrorKind::TypeError,
                            format!("Invalid value for update [double]: {}", other.tag()),
                            token.clone(),
                        )))
                    }
                };
                let length = match &container.borrow().kind {
                    ObjectKind::ArrayDouble(items) => items.len(),
                    _ => 0,
                };
                let final_index = normalized_array_index(index_value, length);
                if final_index >= length {
                    return Err(index_error(index_value, final_index, "array", length, token));
                }
                if let ObjectKind::ArrayDouble(items) = &mut container.borrow_mut().kind {
                    items[final_index] = new_value;
                }
                Ok(container.clone())
            }
            crate::object::Tag::ArrayComplex => {
                let index_value = require_integer_index(index, token)?;
                let new_value = match &value.borrow().kind {
                    ObjectKind::Complex(value) => *value,
                    other => {
                        return Err(Flow::Error(ErrorObj::with_token(
                            ErrorKind::TypeError,
                            format!("Invalid value for update [complex]: {}", other.tag()),
                            token.clone(),
                        )))
                    }
                };
                let length = match &container.borrow().kind {
                    ObjectKind::ArrayComplex(items) => items.len(),
                    _ => 0,
                };
                let final_index = normalized_array_index(index_value, length);
                if final_index >= length {
                    return Err(index_error(index_value, final_index, "array", length, token));
                }
                if let ObjectKind::ArrayComplex(items) = &mut container.borrow_mut().kind {
                    items[final_index] = new_value;
                }
                Ok(container.clone())
            }
            crate::object::Tag::String => {
                let index_value = require_integer_index(index, token)?;
                let replacement = match &value.borrow().kind {
                    ObjectKind::Str(text) => text.clone(),
                    other => {
                        return Err(Flow::Error(ErrorObj::with_token(
                            ErrorKind::TypeError,
                            format!("Invalid right hand side for string update: {}", other.tag()),
                            token.clone(),
                        )))
                    }
                };
                let length = match &container.borrow().kind {
                    ObjectKind::Str(text) => text.chars().count(),
                    _ => 0,
                };
                let final_index = normalized_array_index(index_value, length);
                if final_index >= length {
                    return Err(index_error(index_value, final_index, "string", length, token));
                }
                if replacement.is_empty() {
                    return Ok(container.clone());
                }
                if let ObjectKind::Str(text) = &mut container.borrow_mut().kind {
                    let mut chars: Vec<char> = text.chars().collect();
                    chars.splice(final_index..=final_index, replacement.chars());
                    *text = chars.into_iter().collect();
                }
                Ok(container.clone())
            }
            crate::object::Tag::Dictionary => {
                if !is_hashable(&index.borrow()) {
                    return Err(Flow::Error(ErrorObj::with_token(
                        ErrorKind::TypeError,
                        format!(
                            "Trying to add unhashable item to dict as key {}",
                            inspect(index)
                        ),
                        token.clone(),
                    )));
                }
                let stored = if is_value_assigned(value) {
                    deep_clone(value)
                } else {
                    value.clone()
                };
                if let ObjectKind::Dictionary(map) = &mut container.borrow_mut().kind {
                    map.insert(HashKey(index.clone()), stored);
                }
                Ok(container.clone())
            }
            other => Err(Flow::Error(ErrorObj::with_token(
                ErrorKind::TypeError,
                format!("Invalid type for update: {other}"),
                token.clone(),
            ))),
        }
    }
}

enum IndexKind {
    Single(i64),
    Many(Vec<i64>),
    Invalid(crate::object::Tag),
}

fn index_values(index: &ObjectRef) -> IndexKind {
    match &index.borrow().kind {
        ObjectKind::Integer(value) => IndexKind::Single(*value),
        ObjectKind::Range(range) => IndexKind::Many(range.values().collect()),
        other => IndexKind::Invalid(other.tag()),
    }
}

fn require_integer_index(index: &ObjectRef, token: &Token) -> Result<i64, Flow> {
    match &index.borrow().kind {
        ObjectKind::Integer(value) => Ok(*value),
        other => Err(Flow::Error(ErrorObj::with_token(
            ErrorKind::TypeError,
            format!("Invalid index for update: {}", other.tag()),
            token.clone(),
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_normalization() {
        assert_eq!(normalized_array_index(-1, 3), 2);
        assert_eq!(normalized_array_index(-3, 3), 0);
        assert_eq!(normalized_array_index(-4, 3), 2);
        assert_eq!(normalized_array_index(-7, 3), 2);
        assert_eq!(normalized_array_index(2, 3), 2);
        assert_eq!(normalized_array_index(5, 3), 5);
    }
}
