//! Member access (`.`), module member access (`::`) and member
//! assignment.
//!
//! Function lookup takes precedence over property lookup of the same name,
//! both for user types and for the builtin per-tag method tables.

use crate::ast::Expression;
use crate::env::EnvRef;
use crate::errors::{ErrorKind, ErrorObj, EvalResult, Flow};
use crate::object::{
    alloc, deep_clone, is_value_assigned, BoundBuiltinFunction, BoundProperty, BoundUserFunction,
    ObjectKind,
};
use crate::typing::is_compatible_value;

use super::Evaluator;

impl Evaluator<'_> {
    pub(crate) fn eval_member_expression(&mut self, expression: &Expression, env: &EnvRef) -> EvalResult {
        let Expression::Member {
            token,
            expression: target,
            member,
        } = expression
        else {
            return Err(Flow::Error(ErrorObj::type_err("expected member expression")));
        };

        let mut receiver = self.eval_expression(target, env, None)?;
        receiver = self.unwrap_member_value(receiver);

        let tag = receiver.borrow().tag();

        // builtin tags resolve through the per-tag method table
        if let Some(table) = self.registry.type_tables.get(&tag) {
            if let Some(method) = table.functions.get(member.value.as_str()) {
                return Ok(alloc(ObjectKind::BoundBuiltinTypeFunction(
                    BoundBuiltinFunction {
                        receiver,
                        method: method.clone(),
                    },
                )));
            }
            if let Some(slot) = table.properties.get(member.value.as_str()) {
                return Ok(alloc(ObjectKind::BoundBuiltinTypeProperty(BoundProperty {
                    receiver,
                    slot: slot.clone(),
                })));
            }
        }

        let resolution = match &receiver.borrow().kind {
            ObjectKind::UserObject(instance) => {
                if let Some(function) = instance.user_type.functions.get(member.value.as_str()) {
                    Some(Ok(ObjectKind::BoundUserTypeFunction(BoundUserFunction {
                        receiver: receiver.clone(),
                        function: function.clone(),
                    })))
                } else if let Some(slot) = instance.properties.get(member.value.as_str()) {
                    Some(Ok(ObjectKind::BoundUserTypeProperty(BoundProperty {
                        receiver: receiver.clone(),
                        slot: slot.clone(),
                    })))
                } else {
                    Some(Err(format!(
                        "Cannot resolve object member {}",
                        member.value
                    )))
                }
            }
            ObjectKind::UserType(user_type) => {
                if let Some(function) = user_type.functions.get(member.value.as_str()) {
                    Some(Ok(ObjectKind::BoundUserTypeFunction(BoundUserFunction {
                        receiver: receiver.clone(),
                        function: function.clone(),
                    })))
                } else if let Some(slot) = user_type.properties.get(member.value.as_str()) {
                    Some(Ok(ObjectKind::BoundUserTypeProperty(BoundProperty {
                        receiver: receiver.clone(),
                        slot: slot.clone(),
                    })))
                } else {
                    Some(Err(format!("Cannot resolve type member {}", member.value)))
                }
            }
            ObjectKind::Module(module) => {
                return module
                    .env
                    .borrow()
                    .get(&member.value)
                    .map_err(|error| Flow::Error(error.stamped(token)));
            }
            _ => None,
        };

        match resolution {
            Some(Ok(kind)) => Ok(alloc(kind)),
            Some(Err(message)) => Err(Flow::Error(ErrorObj::with_token(
                ErrorKind::TypeError,
                message,
                token.clone(),
            ))),
            None => Err(Flow::Error(ErrorObj::with_token(
                ErrorKind::TypeError,
                format!("Cannot evaluate member expression of type {tag}"),
                token.clone(),
            ))),
        }
    }

    pub(crate) fn eval_module_member_expression(
        &mut self,
        expression: &Expression,
        env: &EnvRef,
    ) -> EvalResult {
        let Expression::ModuleMember {
            token,
            expression: target,
            member,
        } = expression
        else {
            return Err(Flow::Error(ErrorObj::type_err(
                "expected module member expression",
            )));
        };

        let receiver = self.eval_expression(target, env, None)?;
        let resolved = match &receiver.borrow().kind {
            ObjectKind::Module(module) => module.env.borrow().get(&member.value),
            other => Err(ErrorObj::type_err(format!(
                "Cannot evaluate module member expression of type {}",
                other.tag()
            ))),
        };
        resolved.map_err(|error| Flow::Error(error.stamped(token)))
    }

    /// Assignment through `target.member = value`: resolves the property
    /// slot, which must exist and be non-const, and replaces its value
    /// after a declared-type check.
    pub(crate) fn eval_member_assignment(
        &mut self,
        left: &Expression,
        right: &Expression,
        env: &EnvRef,
        token: &crate::token::Token,
    ) -> EvalResult {
        let bound = self.eval_member_expression(left, env)?;
        let value = self.eval_expression(right, env, None)?;

        let slot = match &bound.borrow().kind {
            ObjectKind::BoundBuiltinTypeProperty(property)
            | ObjectKind::BoundUserTypeProperty(property) => Some(property.slot.clone()),
            _ => None,
        };
        let Some(slot) = slot else {
            return Err(Flow::Error(ErrorObj::with_token(
                ErrorKind::TypeError,
                "Cannot update member",
                token.clone(),
            )));
        };

        {
            let slot_guard = slot.borrow();
            if slot_guard.constant {
                return Err(Flow::Error(ErrorObj::with_token(
                    ErrorKind::TypeError,
                    format!("Cannot update const member {}", left.text()),
                    token.clone(),
                )));
            }
            if !is_compatible_value(slot_guard.declared_type.as_ref(), &value, Some(&slot_guard.value)) {
                let declared = slot_guard
                    .declared_type
                    .as_ref()
                    .map_or_else(String::new, |ty| ty.text());
                return Err(Flow::Error(ErrorObj::with_token(
                    ErrorKind::TypeError,
                    format!(
                        "Incompatible type {declared} for {}",
                        crate::object::inspect(&value)
                    ),
                    token.clone(),
                )));
            }
        }

        slot.borrow_mut().value = if is_value_assigned(&value) {
            deep_clone(&value)
        } else {
            value
        };
        Ok(bound)
    }
}
