//! Infix operators, including assignment and compound assignment.
//!
//! Assignment is parsed as an ordinary infix node; the evaluator
//! dispatches on the left-hand side's shape. Operands evaluate left then
//! right; bound properties are unwrapped to their values first.

use crate::ast::Expression;
use crate::env::EnvRef;
use crate::errors::{ErrorKind, ErrorObj, EvalResult, Flow};
use crate::object::{
    alloc, boolean_obj, deep_clone, double_obj, integer_obj, is_value_assigned, object_eq,
    string_obj, ObjectKind, ObjectRef, Tag,
};
use crate::token::TokenKind;
use crate::typing::is_compatible_value;

use super::Evaluator;

impl Evaluator<'_> {
    pub(crate) fn eval_infix_expression(&mut self, expression: &Expression, env: &EnvRef) -> EvalResult {
        let Expression::Infix {
            token,
            operator,
            left,
            right,
        } = expression
        else {
            return Err(Flow::Error(ErrorObj::type_err("expected infix expression")));
        };

        if operator.kind == TokenKind::Assign {
            return self.eval_assignment(left, right, env, token);
        }
        if matches!(
            operator.kind,
            TokenKind::PlusAssign
                | TokenKind::MinusAssign
                | TokenKind::SlashAssign
                | TokenKind::AsteriskAssign
        ) {
            return self.eval_compound_assignment(operator.kind, left, right, env, token);
        }

        let left_value = self.eval_expression(left, env, None)?;
        let left_value = self.unwrap_member_value(left_value);
        let right_value = self.eval_expression(right, env, None)?;
        let right_value = self.unwrap_member_value(right_value);
        apply_infix_operator(operator.kind, &left_value, &right_value)
            .map_err(|error| Flow::Error(error.stamped(token)))
    }

    fn eval_assignment(
        &mut self,
        left: &Expression,
        right: &Expression,
        env: &EnvRef,
        token: &crate::token::Token,
    ) -> EvalResult {
        match left {
            Expression::Identifier(identifier) => {
                let value = self.eval_expression(right, env, None)?;
                self.assign_identifier(identifier, &value, env, token)
            }
            Expression::Index {
                expression, index, ..
            } => {
                let container = self.eval_expression(expression, env, None)?;
                let index_value = self.eval_expression(index, env, None)?;
                let value = self.eval_expression(right, env, None)?;
                self.update_container(&container, &index_value, &value, token)
            }
            Expression::Member { .. } => self.eval_member_assignment(left, right, env, token),
            _ => Err(Flow::Error(ErrorObj::with_token(
                ErrorKind::TypeError,
                format!(
                    "Lefthand of assignment needs to be identifier or index expression, found {}",
                    left.text()
                ),
                token.clone(),
            ))),
        }
    }

    pub(crate) fn assign_identifier(
        &mut self,
        identifier: &crate::ast::Identifier,
        value: &ObjectRef,
        env: &EnvRef,
        token: &crate::token::Token,
    ) -> EvalResult {
        let existing = env
            .borrow()
            .get(&identifier.value)
            .map_err(|error| Flow::Error(error.stamped(&identifier.token)))?;
        let declared_type = env.borrow().get_type(&identifier.value);

        if !is_compatible_value(declared_type.as_ref(), value, Some(&existing)) {
            let declared = declared_type.as_ref().map_or_else(
                || crate::typing::compute_type_of_value(&existing)
                    .map_or_else(String::new, |ty| ty.text()),
                |ty| ty.text(),
            );
            return Err(Flow::Error(ErrorObj::with_token(
                ErrorKind::TypeError,
                format!("Incompatible type {declared}"),
                token.clone(),
            )));
        }

        let stored = if is_value_assigned(value) {
            deep_clone(value)
        } else {
            value.clone()
        };
        stored.borrow_mut().declared_type = declared_type;

        env.borrow_mut()
            .set(&identifier.value, stored)
            .map_err(|error| Flow::Error(error.stamped(token)))
    }

    /// `+= -= *= /=` mutate the target in place; both sides must share a
    /// scalar tag.
    fn eval_compound_assignment(
        &mut self,
        operator: TokenKind,
        left: &Expression,
        right: &Expression,
        env: &EnvRef,
        token: &crate::token::Token,
    ) -> EvalResult {
        match left {
            Expression::Identifier(identifier) => {
                let target = env
                    .borrow()
                    .get(&identifier.value)
                    .map_err(|error| Flow::Error(error.stamped(&identifier.token)))?;
                let right_value = self.eval_expression(right, env, None)?;
                let right_value = self.unwrap_member_value(right_value);
                apply_compound_operator(operator, &target, &right_value)
                    .map_err(|error| Flow::Error(error.stamped(token)))?;
                Ok(target)
            }
            Expression::Index {
                expression, index, ..
            } => {
                let container = self.eval_expression(expression, env, None)?;
                let index_value = self.eval_expression(index, env, None)?;
                let right_value = self.eval_expression(right, env, None)?;
                let right_value = self.unwrap_member_value(right_value);

                // dense arrays hand out copies when indexed, so compute the
                // new element and write it back through the update path
                let element = self.eval_index_value(&container, &index_value, token)?;
                apply_compound_operator(operator, &element, &right_value)
                    .map_err(|error| Flow::Error(error.stamped(token)))?;
                self.update_container(&container, &index_value, &element, token)?;
                Ok(element)
            }
            _ => Err(Flow::Error(ErrorObj::with_token(
                ErrorKind::TypeError,
                format!(
                    "Lefthand of operator assignment needs to be identifier found {}",
                    left.text()
                ),
                token.clone(),
            ))),
        }
    }

    /// Bound property values participate in operators as their underlying
    /// value.
    pub(crate) fn unwrap_member_value(&self, value: ObjectRef) -> ObjectRef {
        let unwrapped = match &value.borrow().kind {
            ObjectKind::BoundBuiltinTypeProperty(bound)
            | ObjectKind::BoundUserTypeProperty(bound) => Some(bound.slot.borrow().value.clone()),
            _ => None,
        };
        unwrapped.unwrap_or(value)
    }
}

/// In-place mutation for compound assignment; only matching integer or
/// double pairs are allowed. The operand is read out first so `a += a`
/// never aliases the target borrow.
fn apply_compound_operator(
    operator: TokenKind,
    target: &ObjectRef,
    right: &ObjectRef,
) -> Result<(), ErrorObj> {
    enum Operand {
        Int(i64),
        Double(f64),
        Other(Tag),
    }
    let operand = match &right.borrow().kind {
        ObjectKind::Integer(value) => Operand::Int(*value),
        ObjectKind::Double(value) => Operand::Double(*value),
        other => Operand::Other(other.tag()),
    };

    let mut target_guard = target.borrow_mut();
    let tag = target_guard.tag();
    match (&mut target_guard.kind, operand) {
        (ObjectKind::Integer(value), Operand::Int(operand)) => {
            match operator {
                TokenKind::PlusAssign => *value = value.wrapping_add(operand),
                TokenKind::MinusAssign => *value = value.wrapping_sub(operand),
                TokenKind::AsteriskAssign => *value = value.wrapping_mul(operand),
                TokenKind::SlashAssign => {
                    if operand == 0 {
                        return Err(ErrorObj::value_err("Division by 0"));
                    }
                    *value /= operand;
                }
                _ => return Err(ErrorObj::type_err("unknown compound operator")),
            }
            Ok(())
        }
        (ObjectKind::Double(value), Operand::Double(operand)) => {
            match operator {
                TokenKind::PlusAssign => *value += operand,
                TokenKind::MinusAssign => *value -= operand,
                TokenKind::AsteriskAssign => *value *= operand,
                TokenKind::SlashAssign => *value /= operand,
                _ => return Err(ErrorObj::type_err("unknown compound operator")),
            }
            Ok(())
        }
        _ => Err(ErrorObj::type_err(format!(
            "Cannot use operator {operator} on type {tag}"
        ))),
    }
}

/// Exponentiation by squaring; a negative exponent yields 0.
#[must_use]
pub fn pow_int(x: i64, p: i64) -> i64 {
    if p < 0 {
        return 0;
    }
    if p == 0 {
        return 1;
    }
    if p == 1 {
        return x;
    }
    let half = pow_int(x, p / 2);
    if p % 2 == 0 {
        half.wrapping_mul(half)
    } else {
        x.wrapping_mul(half).wrapping_mul(half)
    }
}

/// Applies a non-assignment infix operator to two evaluated operands.
pub fn apply_infix_operator(
    operator: TokenKind,
    left: &ObjectRef,
    right: &ObjectRef,
) -> Result<ObjectRef, ErrorObj> {
    let left_tag = left.borrow().tag();
    let right_tag = right.borrow().tag();

    // equality across incompatible tags is simply false
    if left_tag != right_tag && !both_array_like(left_tag, right_tag) {
        return match operator {
            TokenKind::Eq => Ok(boolean_obj(false)),
            TokenKind::NotEq => Ok(boolean_obj(true)),
            _ => Err(ErrorObj::type_err(format!(
                "Type mismatch for operator {operator} for types {left_tag} and {right_tag}"
            ))),
        };
    }

    let left_guard = left.borrow();
    let right_guard = right.borrow();
    match (&left_guard.kind, &right_guard.kind) {
        (ObjectKind::Integer(a), ObjectKind::Integer(b)) => {
            integer_infix_operator(operator, *a, *b)
        }
        (ObjectKind::Double(a), ObjectKind::Double(b)) => double_infix_operator(operator, *a, *b),
        (ObjectKind::Complex(a), ObjectKind::Complex(b)) => match operator {
            TokenKind::Plus => Ok(alloc(ObjectKind::Complex(a + b))),
            TokenKind::Minus => Ok(alloc(ObjectKind::Complex(a - b))),
            TokenKind::Asterisk => Ok(alloc(ObjectKind::Complex(a * b))),
            TokenKind::Slash => Ok(alloc(ObjectKind::Complex(a / b))),
            TokenKind::Eq => Ok(boolean_obj(a == b)),
            TokenKind::NotEq => Ok(boolean_obj(a != b)),
            _ => Err(ErrorObj::type_err(format!(
                "unknown operator {operator} for Complex"
            ))),
        },
        (ObjectKind::Str(a), ObjectKind::Str(b)) => match operator {
            TokenKind::Plus => Ok(string_obj(format!("{a}{b}"))),
            TokenKind::Eq => Ok(boolean_obj(a == b)),
            TokenKind::NotEq => Ok(boolean_obj(a != b)),
            TokenKind::Lt => Ok(boolean_obj(a < b)),
            TokenKind::Gt => Ok(boolean_obj(a > b)),
            TokenKind::LtEq => Ok(boolean_obj(a <= b)),
            TokenKind::GtEq => Ok(boolean_obj(a >= b)),
            _ => Err(ErrorObj::type_err(format!(
                "unknown operator {operator} for String"
            ))),
        },
        (ObjectKind::Boolean(a), ObjectKind::Boolean(b)) => match operator {
            TokenKind::Eq => Ok(boolean_obj(a == b)),
            TokenKind::NotEq => Ok(boolean_obj(a != b)),
            TokenKind::DoublePipe => Ok(boolean_obj(*a || *b)),
            TokenKind::DoubleAmpersand => Ok(boolean_obj(*a && *b)),
            _ => Err(ErrorObj::type_err(format!(
                "unknown operator {operator} for Boolean"
            ))),
        },
        (ObjectKind::Null, ObjectKind::Null) => match operator {
            TokenKind::Eq => Ok(boolean_obj(true)),
            TokenKind::NotEq => Ok(boolean_obj(false)),
            _ => Err(ErrorObj::type_err(format!(
                "Cannot use operator {operator} on NULL types"
            ))),
        },
        (ObjectKind::Range(a), ObjectKind::Range(b)) => match operator {
            TokenKind::Eq => Ok(boolean_obj(a == b)),
            TokenKind::NotEq => Ok(boolean_obj(a != b)),
            _ => Err(ErrorObj::type_err(format!(
                "Cannot use operator {operator} on Range types"
            ))),
        },
        (ObjectKind::Dictionary(_), ObjectKind::Dictionary(_))
        | (ObjectKind::Set(_), ObjectKind::Set(_)) => match operator {
            TokenKind::Eq => Ok(boolean_obj(object_eq(left, right))),
            TokenKind::NotEq => Ok(boolean_obj(!object_eq(left, right))),
            _ => Err(ErrorObj::type_err(format!(
                "Cannot use operator {operator} on {left_tag} types"
            ))),
        },
        _ if both_array_like(left_tag, right_tag) => match operator {
            TokenKind::Eq => Ok(boolean_obj(array_like_eq(
                &left_guard.kind,
                &right_guard.kind,
            ))),
            TokenKind::NotEq => Ok(boolean_obj(!array_like_eq(
                &left_guard.kind,
                &right_guard.kind,
            ))),
            _ => Err(ErrorObj::type_err(format!(
                "Cannot use operator {operator} on Array types"
            ))),
        },
        _ => Err(ErrorObj::type_err(format!(
            "Type mismatch for operator {operator} for types {left_tag} and {right_tag}"
        ))),
    }
}

fn integer_infix_operator(operator: TokenKind, a: i64, b: i64) -> Result<ObjectRef, ErrorObj> {
    match operator {
        TokenKind::Plus => Ok(integer_obj(a.wrapping_add(b))),
        TokenKind::Minus => Ok(integer_obj(a.wrapping_sub(b))),
        TokenKind::Asterisk => Ok(integer_obj(a.wrapping_mul(b))),
        TokenKind::Slash => {
            if b == 0 {
                Err(ErrorObj::value_err("Division by 0"))
            } else {
                Ok(integer_obj(a / b))
            }
        }
        TokenKind::Percent => {
            if b == 0 {
                Err(ErrorObj::value_err("Division by 0"))
            } else {
                Ok(integer_obj(a % b))
            }
        }
        TokenKind::DoubleAsterisk => Ok(integer_obj(pow_int(a, b))),
        TokenKind::Gt => Ok(boolean_obj(a > b)),
        TokenKind::GtEq => Ok(boolean_obj(a >= b)),
        TokenKind::Lt => Ok(boolean_obj(a < b)),
        TokenKind::LtEq => Ok(boolean_obj(a <= b)),
        TokenKind::NotEq => Ok(boolean_obj(a != b)),
        TokenKind::Eq => Ok(boolean_obj(a == b)),
        _ => Err(ErrorObj::type_err(format!(
            "unknown operator {operator} for Integer"
        ))),
    }
}

fn double_infix_operator(operator: TokenKind, a: f64, b: f64) -> Result<ObjectRef, ErrorObj> {
    match operator {
        TokenKind::Plus => Ok(double_obj(a + b)),
        TokenKind::Minus => Ok(double_obj(a - b)),
        TokenKind::Asterisk => Ok(double_obj(a * b)),
        TokenKind::Slash => Ok(double_obj(a / b)),
        TokenKind::DoubleAsterisk => Ok(double_obj(a.powf(b))),
        TokenKind::Gt => Ok(boolean_obj(a > b)),
        TokenKind::GtEq => Ok(boolean_obj(a >= b)),
        TokenKind::Lt => Ok(boolean_obj(a < b)),
        TokenKind::LtEq => Ok(boolean_obj(a <= b)),
        TokenKind::NotEq => Ok(boolean_obj(a != b)),
        TokenKind::Eq => Ok(boolean_obj(a == b)),
        _ => Err(ErrorObj::type_err(format!(
            "unknown operator {operator} for Double"
        ))),
    }
}

fn both_array_like(a: Tag, b: Tag) -> bool {
    let array_like = |tag| matches!(tag, Tag::Array | Tag::ArrayDouble | Tag::ArrayComplex);
    array_like(a) && array_like(b)
}

/// Element-wise equality across the array variants, so `[1.0]` compares
/// equal to a dense double array with the same contents.
fn array_like_eq(a: &ObjectKind, b: &ObjectKind) -> bool {
    let len = |kind: &ObjectKind| match kind {
        ObjectKind::Array(items) => items.len(),
        ObjectKind::ArrayDouble(items) => items.len(),
        ObjectKind::ArrayComplex(items) => items.len(),
        _ => 0,
    };
    if len(a) != len(b) {
        return false;
    }
    let item = |kind: &ObjectKind, index: usize| -> Option<ObjectRef> {
        match kind {
            ObjectKind::Array(items) => items.get(index).cloned(),
            ObjectKind::ArrayDouble(items) => items.get(index).map(|value| double_obj(*value)),
            ObjectKind::ArrayComplex(items) => items
                .get(index)
                .map(|value| alloc(ObjectKind::Complex(*value))),
            _ => None,
        }
    };
    for index in 0..len(a) {
        let (Some(left), Some(right)) = (item(a, index), item(b, index)) else {
            return false;
        };
        if !object_eq(&left, &right) {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pow_int_squaring() {
        assert_eq!(pow_int(2, 10), 1024);
        assert_eq!(pow_int(3, 0), 1);
        assert_eq!(pow_int(3, 1), 3);
        assert_eq!(pow_int(5, -2), 0);
        assert_eq!(pow_int(-2, 3), -8);
    }

    #[test]
    fn integer_division_by_zero() {
        let error = integer_infix_operator(TokenKind::Slash, 1, 0).unwrap_err();
        assert_eq!(error.kind, crate::errors::ErrorKind::ValueError);
    }

    #[test]
    fn cross_tag_equality_is_false() {
        let result =
            apply_infix_operator(TokenKind::Eq, &integer_obj(1), &string_obj("1")).unwrap();
        assert!(matches!(result.borrow().kind, ObjectKind::Boolean(false)));
        let result =
            apply_infix_operator(TokenKind::NotEq, &integer_obj(1), &string_obj("1")).unwrap();
        assert!(matches!(result.borrow().kind, ObjectKind::Boolean(true)));
    }

    #[test]
    fn dense_and_generic_arrays_compare_elementwise() {
        let dense = alloc(ObjectKind::ArrayDouble(vec![1.0, 2.0]));
        let generic = alloc(ObjectKind::Array(vec![double_obj(1.0), double_obj(2.0)]));
        let result = apply_infix_operator(TokenKind::Eq, &dense, &generic).unwrap();
        assert!(matches!(result.borrow().kind, ObjectKind::Boolean(true)));
    }
}
