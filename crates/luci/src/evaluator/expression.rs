//! Expression evaluation: literals, identifiers, control constructs.

use std::rc::Rc;
use std::sync::Arc;

use num_complex::Complex64;

use crate::ast::{
    Expression, ForExpression, FunctionLiteral, Identifier, IfExpression, TypeExpression,
    TypeLiteral,
};
use crate::env::{EnvRef, Environment};
use crate::errors::{ErrorKind, ErrorObj, EvalResult, Flow};
use crate::object::{
    alloc, boolean_obj, double_obj, integer_obj, is_hashable, is_truthy, null_obj, string_obj,
    DictMap, FreezerGuard, FunctionObj, HashKey, IterTarget, IteratorObj, ObjectKind, ObjectRef,
    Property, PropertyMap, Range, SetData, UserTypeObj,
};
use crate::typing::is_compatible_value;

use super::{stamp_flow, Evaluator};

impl Evaluator<'_> {
    pub(crate) fn eval_expression(
        &mut self,
        expression: &Expression,
        env: &EnvRef,
        type_hint: Option<&Arc<TypeExpression>>,
    ) -> EvalResult {
        match expression {
            Expression::Boolean { value, .. } => Ok(boolean_obj(*value)),
            Expression::Integer { value, .. } => Ok(integer_obj(*value)),
            Expression::Double { value, .. } => Ok(double_obj(*value)),
            Expression::Complex { value, .. } => Ok(alloc(ObjectKind::Complex(*value))),
            Expression::Str { value, .. } => Ok(string_obj(value.clone())),
            Expression::Null { .. } => Ok(null_obj()),
            Expression::Range {
                lower,
                upper,
                stride,
                ..
            } => Ok(alloc(ObjectKind::Range(Range {
                lower: *lower,
                upper: *upper,
                stride: *stride,
            }))),
            Expression::Identifier(identifier) => self.eval_identifier(identifier, env),
            Expression::ModuleIdentifier { token, path, .. } => env
                .borrow()
                .get(&path.join("::"))
                .map_err(|error| Flow::Error(error.stamped(token))),
            Expression::Function(function) => self.eval_function_literal(function, env),
            Expression::TypeLiteral(literal) => self.eval_type_literal(literal, env),
            Expression::Array { .. }
            | Expression::ArrayDouble { .. }
            | Expression::ArrayComplex { .. } => self.eval_array_literal(expression, env, type_hint),
            Expression::Dict { pairs, token } => self.eval_dict_literal(pairs, token, env),
            Expression::Set { elements, token } => self.eval_set_literal(elements, token, env),
            Expression::Prefix {
                token,
                operator,
                right,
            } => {
                let value = self.eval_expression(right, env, None)?;
                self.eval_prefix_operator(operator.kind, &value)
                    .map_err(|error| Flow::Error(error.stamped(token)))
            }
            Expression::Infix { .. } => self.eval_infix_expression(expression, env),
            Expression::Operator { token, .. } => Err(Flow::Error(ErrorObj::with_token(
                ErrorKind::TypeError,
                "operator expressions are not supported",
                token.clone(),
            ))),
            Expression::If(if_expression) => self.eval_if_expression(if_expression, env),
            Expression::While {
                condition, body, ..
            } => self.eval_while_expression(condition, body, env),
            Expression::For(for_expression) => self.eval_for_expression(for_expression, env),
            Expression::Call { .. } => self.eval_call_expression(expression, env),
            Expression::Index { .. } => self.eval_index_expression(expression, env),
            Expression::Member { .. } => self.eval_member_expression(expression, env),
            Expression::ModuleMember { .. } => self.eval_module_member_expression(expression, env),
        }
    }

    /// Builtins take precedence over environment bindings when resolving a
    /// bare name.
    pub(crate) fn eval_identifier(&mut self, identifier: &Identifier, env: &EnvRef) -> EvalResult {
        if let Some(builtin) = self.registry.builtins.get(identifier.value.as_str()) {
            return Ok(alloc(ObjectKind::Builtin(builtin.clone())));
        }
        env.borrow()
            .get(&identifier.value)
            .map_err(|error| Flow::Error(error.stamped(&identifier.token)))
    }

    fn eval_function_literal(&mut self, literal: &FunctionLiteral, env: &EnvRef) -> EvalResult {
        let function = alloc(ObjectKind::Function(Rc::new(FunctionObj {
            doc: literal.doc.clone(),
            arguments: literal.arguments.clone(),
            argument_types: literal.argument_types.clone(),
            return_type: literal.return_type.clone(),
            body: literal.body.clone(),
            env: env.clone(),
        })));
        if let Some(name) = &literal.name {
            env.borrow_mut()
                .add(&name.value, function.clone(), false, None)
                .map_err(|error| Flow::Error(error.stamped(&name.token)))?;
        }
        Ok(function)
    }

    /// A `type` literal evaluates to a user type value and registers it
    /// under its name in the current scope.
    fn eval_type_literal(&mut self, literal: &TypeLiteral, env: &EnvRef) -> EvalResult {
        let mut functions = indexmap::IndexMap::default();
        let mut properties = PropertyMap::default();

        for member in &literal.members {
            if let Expression::Function(function_literal) = &member.value {
                let function = Rc::new(FunctionObj {
                    doc: function_literal.doc.clone(),
                    arguments: function_literal.arguments.clone(),
                    argument_types: function_literal.argument_types.clone(),
                    return_type: function_literal.return_type.clone(),
                    body: function_literal.body.clone(),
                    env: env.clone(),
                });
                functions.insert(member.name.value.clone(), function);
            } else {
                let value = self.eval_expression(&member.value, env, member.declared_type.as_ref())?;
                properties.insert(
                    member.name.value.clone(),
                    Rc::new(std::cell::RefCell::new(Property {
                        value,
                        constant: member.constant,
                        declared_type: member.declared_type.clone(),
                    })),
                );
            }
        }

        let user_type = alloc(ObjectKind::UserType(Rc::new(UserTypeObj {
            name: literal.name.clone(),
            doc: literal.doc.clone(),
            functions,
            properties,
        })));
        env.borrow_mut()
            .add(&literal.name, user_type.clone(), false, None)
            .map_err(|error| Flow::Error(error.stamped(&literal.token)))?;
        Ok(user_type)
    }

    fn eval_array_literal(
        &mut self,
        expression: &Expression,
        env: &EnvRef,
        type_hint: Option<&Arc<TypeExpression>>,
    ) -> EvalResult {
        // dense literals keep their dense layout when the declared type
        // asks for it; otherwise they decay to a generic array
        let hint_element = type_hint.and_then(|hint| match hint.as_ref() {
            TypeExpression::Array { element, .. } => Some(element.clone()),
            _ => None,
        });
        let hint_name = hint_element.as_ref().and_then(|element| match element.as_ref() {
            TypeExpression::Identifier { value, .. } => Some(value.clone()),
            _ => None,
        });

        if hint_name.as_deref() == Some("double") {
            if let Expression::ArrayDouble { elements, .. } = expression {
                return Ok(alloc(ObjectKind::ArrayDouble(elements.clone())));
            }
            let values = self.eval_array_elements(expression, env)?;
            let mut doubles = Vec::with_capacity(values.len());
            for value in &values {
                match &value.borrow().kind {
                    ObjectKind::Double(value) => doubles.push(*value),
                    _ => {
                        return Err(Flow::Error(ErrorObj::type_err(
                            "Trying to build an array of wrong type",
                        )))
                    }
                }
            }
            return Ok(alloc(ObjectKind::ArrayDouble(doubles)));
        }

        if hint_name.as_deref() == Some("complex") {
            if let Expression::ArrayComplex { elements, .. } = expression {
                return Ok(alloc(ObjectKind::ArrayComplex(elements.clone())));
            }
            let values = self.eval_array_elements(expression, env)?;
            let mut complexes: Vec<Complex64> = Vec::with_capacity(values.len());
            for value in &values {
                match &value.borrow().kind {
                    ObjectKind::Complex(value) => complexes.push(*value),
                    _ => {
                        return Err(Flow::Error(ErrorObj::type_err(
                            "Trying to build an array of wrong type",
                        )))
                    }
                }
            }
            return Ok(alloc(ObjectKind::ArrayComplex(complexes)));
        }

        let values = self.eval_array_elements(expression, env)?;
        if let Some(element) = &hint_element {
            for value in &values {
                if !is_compatible_value(Some(element), value, None) {
                    return Err(Flow::Error(ErrorObj::type_err(
                        "Trying to make an array with elements of wrong type",
                    )));
                }
            }
        }
        Ok(alloc(ObjectKind::Array(values)))
    }

    pub(crate) fn eval_array_elements(
        &mut self,
        expression: &Expression,
        env: &EnvRef,
    ) -> Result<Vec<ObjectRef>, Flow> {
        match expression {
            Expression::Array { elements, .. } => {
                let mut values = Vec::with_capacity(elements.len());
                for element in elements {
                    values.push(self.eval_expression(element, env, None)?);
                }
                Ok(values)
            }
            Expression::ArrayDouble { elements, .. } => {
                Ok(elements.iter().map(|value| double_obj(*value)).collect())
            }
            Expression::ArrayComplex { elements, .. } => Ok(elements
                .iter()
                .map(|value| alloc(ObjectKind::Complex(*value)))
                .collect()),
            _ => Ok(vec![]),
        }
    }

    fn eval_dict_literal(
        &mut self,
        pairs: &[(Expression, Expression)],
        token: &crate::token::Token,
        env: &EnvRef,
    ) -> EvalResult {
        let mut map = DictMap::default();
        for (key_expression, value_expression) in pairs {
            let key = self.eval_expression(key_expression, env, None)?;
            if !is_hashable(&key.borrow()) {
                return Err(Flow::Error(ErrorObj::with_token(
                    ErrorKind::TypeError,
                    format!(
                        "Trying to add unhashable item to dict as key {}",
                        crate::object::inspect(&key)
                    ),
                    token.clone(),
                )));
            }
            let value = self.eval_expression(value_expression, env, None)?;
            map.insert(HashKey(key), value);
        }
        Ok(alloc(ObjectKind::Dictionary(map)))
    }

    fn eval_set_literal(
        &mut self,
        elements: &[Expression],
        token: &crate::token::Token,
        env: &EnvRef,
    ) -> EvalResult {
        let mut set = SetData::default();
        for element in elements {
            let value = self.eval_expression(element, env, None)?;
            if !is_hashable(&value.borrow()) {
                return Err(Flow::Error(ErrorObj::with_token(
                    ErrorKind::TypeError,
                    format!(
                        "Trying to add unhashable item to set {}",
                        crate::object::inspect(&value)
                    ),
                    token.clone(),
                )));
            }
            set.insert(HashKey(value));
        }
        Ok(alloc(ObjectKind::Set(set)))
    }

    pub(crate) fn eval_prefix_operator(
        &mut self,
        operator: crate::token::TokenKind,
        value: &ObjectRef,
    ) -> Result<ObjectRef, ErrorObj> {
        use crate::token::TokenKind;
        let guard = value.borrow();
        match (operator, &guard.kind) {
            (TokenKind::Bang, ObjectKind::Boolean(b)) => Ok(boolean_obj(!b)),
            (TokenKind::Bang, ObjectKind::Integer(i)) => Ok(boolean_obj(*i == 0)),
            (TokenKind::Bang, ObjectKind::Null) => Ok(boolean_obj(true)),
            (TokenKind::Minus, ObjectKind::Integer(i)) => Ok(integer_obj(-i)),
            (TokenKind::Minus, ObjectKind::Double(d)) => Ok(double_obj(-d)),
            (TokenKind::Minus, ObjectKind::Complex(c)) => Ok(alloc(ObjectKind::Complex(-c))),
            _ => Err(ErrorObj::type_err(format!(
                "Invalid prefix operator {} for {}",
                operator,
                value.borrow().tag()
            ))),
        }
    }

    fn eval_if_expression(&mut self, if_expression: &IfExpression, env: &EnvRef) -> EvalResult {
        let condition = self
            .eval_expression(&if_expression.condition, env, None)
            .map_err(|flow| stamp_flow(flow, &if_expression.token))?;

        let chosen = if is_truthy(&condition) {
            Some(&if_expression.consequence)
        } else {
            if_expression.alternative.as_ref()
        };

        let Some(block) = chosen else {
            return Ok(null_obj());
        };

        let scope = Environment::new(Some(env.clone()));
        let result = self
            .eval_statements(&block.statements, &scope)
            .map_err(|flow| stamp_flow(flow, &if_expression.token));
        match self.run_destructors(&scope) {
            Err(flow) => Err(flow),
            Ok(()) => result,
        }
    }

    /// Each iteration runs in a fresh child environment; `break` yields
    /// null, `continue` restarts, `return`/`exit` bubble up.
    fn eval_while_expression(
        &mut self,
        condition: &Expression,
        body: &crate::ast::BlockStatement,
        env: &EnvRef,
    ) -> EvalResult {
        loop {
            let condition_value = self.eval_expression(condition, env, None)?;
            if !is_truthy(&condition_value) {
                return Ok(null_obj());
            }

            let scope = Environment::new(Some(env.clone()));
            let result = self.eval_statements(&body.statements, &scope);
            match self.run_destructors(&scope) {
                Err(flow) => return Err(flow),
                Ok(()) => {}
            }
            match result {
                Ok(_) => {}
                Err(Flow::Break) => return Ok(null_obj()),
                Err(Flow::Continue) => {}
                Err(flow) => return Err(flow),
            }
        }
    }

    fn eval_for_expression(&mut self, for_expression: &ForExpression, env: &EnvRef) -> EvalResult {
        let iterable = self.eval_expression(&for_expression.iterable, env, None)?;
        let Some(mut iterator) = make_iterator(&iterable) else {
            return Err(Flow::Error(ErrorObj::with_token(
                ErrorKind::TypeError,
                format!("Cannot iterate over {}", for_expression.iterable.text()),
                for_expression.token.clone(),
            )));
        };

        while iterator.is_valid() {
            let Some(value) = iterator.next_value() else {
                break;
            };

            if !is_compatible_value(for_expression.iter_type.as_ref(), &value, None) {
                let expected = for_expression
                    .iter_type
                    .as_ref()
                    .map_or_else(String::new, |ty| ty.text());
                let got = crate::typing::compute_type_of_value(&value)
                    .map_or_else(|| "<invalid>".to_string(), |ty| ty.text());
                return Err(Flow::Error(ErrorObj::with_token(
                    ErrorKind::TypeError,
                    format!(
                        "Incompatible type for loop variable {}, expected {expected} but got {got}",
                        for_expression.name.value
                    ),
                    for_expression.token.clone(),
                )));
            }

            let scope = Environment::new(Some(env.clone()));
            scope
                .borrow_mut()
                .add(
                    &for_expression.name.value,
                    value,
                    for_expression.constant,
                    for_expression.iter_type.clone(),
                )
                .map_err(|error| Flow::Error(error.stamped(&for_expression.token)))?;

            let result = self.eval_statements(&for_expression.body.statements, &scope);
            match self.run_destructors(&scope) {
                Err(flow) => return Err(flow),
                Ok(()) => {}
            }
            match result {
                Ok(_) => {}
                Err(Flow::Break) => return Ok(null_obj()),
                Err(Flow::Continue) => {}
                Err(flow) => return Err(flow),
            }
        }
        Ok(null_obj())
    }
}

/// Requests an iterator for an iterable value. Container iterators freeze
/// their target for the duration of the iteration.
#[must_use]
pub fn make_iterator(iterable: &ObjectRef) -> Option<IteratorObj> {
    let target = match &iterable.borrow().kind {
        ObjectKind::Array(_) => IterTarget::Array(iterable.clone()),
        ObjectKind::ArrayDouble(_) => IterTarget::ArrayDouble(iterable.clone()),
        ObjectKind::ArrayComplex(_) => IterTarget::ArrayComplex(iterable.clone()),
        ObjectKind::Dictionary(_) => IterTarget::Dictionary(iterable.clone()),
        ObjectKind::Set(_) => IterTarget::Set(iterable.clone()),
        ObjectKind::Str(_) => IterTarget::Str(iterable.clone()),
        ObjectKind::Range(range) => {
            return Some(IteratorObj {
                target: IterTarget::Range(*range),
                index: 0,
                freezer: None,
            })
        }
        _ => return None,
    };
    Some(IteratorObj {
        target,
        index: 0,
        freezer: Some(Rc::new(FreezerGuard::new(iterable.clone()))),
    })
}
