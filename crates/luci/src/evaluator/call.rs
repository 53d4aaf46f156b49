//! Call expressions: free functions, builtins, bound methods and user
//! type constructors.

use std::rc::Rc;

use crate::ast::Expression;
use crate::env::{EnvRef, Environment};
use crate::errors::{ErrorKind, ErrorObj, EvalResult, Flow};
use crate::object::{
    alloc, deep_clone, null_obj, BoundUserFunction, FunctionObj, ObjectKind, ObjectRef, Property,
    PropertyMap, UserInstance,
};
use crate::token::Token;
use crate::typing::{compute_type_of_value, is_compatible_value};

use super::Evaluator;

impl Evaluator<'_> {
    pub(crate) fn eval_call_expression(&mut self, expression: &Expression, env: &EnvRef) -> EvalResult {
        let Expression::Call {
            token,
            function,
            arguments,
        } = expression
        else {
            return Err(Flow::Error(ErrorObj::type_err("expected call expression")));
        };

        let callee = match function.as_ref() {
            Expression::Identifier(identifier) => self.eval_identifier(identifier, env)?,
            Expression::Member { .. } => self.eval_member_expression(function, env)?,
            Expression::ModuleMember { .. } => self.eval_module_member_expression(function, env)?,
            other => self.eval_expression(other, env, None)?,
        };

        let kind = {
            let guard = callee.borrow();
            match &guard.kind {
                ObjectKind::Builtin(builtin) => Callee::Builtin(builtin.clone()),
                ObjectKind::Function(function) => Callee::Function(function.clone()),
                ObjectKind::BoundBuiltinTypeFunction(bound) => {
                    Callee::BoundBuiltin(bound.receiver.clone(), bound.method.clone())
                }
                ObjectKind::BoundUserTypeFunction(bound) => Callee::BoundUser(bound.clone()),
                ObjectKind::UserType(user_type) => Callee::Constructor(user_type.clone()),
                // a property holding a function is callable through it
                ObjectKind::BoundBuiltinTypeProperty(bound)
                | ObjectKind::BoundUserTypeProperty(bound) => {
                    let value = bound.slot.borrow().value.clone();
                    let inner = value.borrow();
                    match &inner.kind {
                        ObjectKind::Function(function) => Callee::Function(function.clone()),
                        _ => Callee::NotCallable,
                    }
                }
                _ => Callee::NotCallable,
            }
        };

        match kind {
            Callee::Builtin(builtin) => (builtin.func)(self, arguments, env, token),
            Callee::Function(function) => self.eval_function_call(&function, arguments, env, token),
            Callee::BoundBuiltin(receiver, method) => {
                let mut values = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    let value = self.eval_expression(argument, env, None)?;
                    values.push(self.unwrap_member_value(value));
                }
                (method.func)(self, &receiver, values, token)
            }
            Callee::BoundUser(bound) => self.eval_bound_user_function(&bound, arguments, env, token),
            Callee::Constructor(user_type) => {
                self.construct_user_object(&user_type, arguments, env, token)
            }
            Callee::NotCallable => Err(Flow::Error(ErrorObj::with_token(
                ErrorKind::TypeError,
                format!("Function {} not found", expression.text()),
                token.clone(),
            ))),
        }
    }

    /// Calls a free function: arguments evaluate in the caller's scope,
    /// bind by position into a child of the captured scope, and the result
    /// is checked against the declared return type.
    fn eval_function_call(
        &mut self,
        function: &Rc<FunctionObj>,
        arguments: &[Expression],
        env: &EnvRef,
        token: &Token,
    ) -> EvalResult {
        let mut values = Vec::with_capacity(arguments.len());
        for argument in arguments {
            let value = self.eval_expression(argument, env, None)?;
            values.push(self.unwrap_member_value(value));
        }
        self.eval_function_with_values(function, values, token)
    }

    /// Calls a function with already-evaluated arguments. Also the entry
    /// point for comparator callbacks and thread bodies.
    pub(crate) fn eval_function_with_values(
        &mut self,
        function: &Rc<FunctionObj>,
        values: Vec<ObjectRef>,
        token: &Token,
    ) -> EvalResult {
        let scope = Environment::new(Some(function.env.clone()));
        self.bind_arguments(function, values, &scope, token)?;

        let result = self.eval_statements(&function.body.statements, &scope);
        let result: EvalResult = match result {
            Ok(value) => Ok(value),
            Err(Flow::Return(value)) => Ok(value),
            Err(flow) => {
                // still sweep the call frame before propagating
                match self.run_destructors(&scope) {
                    Err(sweep) => return Err(sweep),
                    Ok(()) => return Err(flow),
                }
            }
        };
        match self.run_destructors(&scope) {
            Err(flow) => return Err(flow),
            Ok(()) => {}
        }
        let value = self.unwrap_member_value(result?);

        self.check_return_type(function.return_type.as_ref(), &value, token)?;
        Ok(value)
    }

    /// Calls a bound method with `this` (instances) or `this_type` (static
    /// access) in scope.
    pub(crate) fn eval_bound_user_function(
        &mut self,
        bound: &BoundUserFunction,
        arguments: &[Expression],
        env: &EnvRef,
        token: &Token,
    ) -> EvalResult {
        let mut values = Vec::with_capacity(arguments.len());
        for argument in arguments {
            let value = self.eval_expression(argument, env, None)?;
            values.push(self.unwrap_member_value(value));
        }
        self.eval_bound_user_function_with_values(bound, values, token)
    }

    pub(crate) fn eval_bound_user_function_with_values(
        &mut self,
        bound: &BoundUserFunction,
        values: Vec<ObjectRef>,
        token: &Token,
    ) -> EvalResult {
        let function = &bound.function;
        let scope = Environment::new(Some(function.env.clone()));

        let receiver_name = match bound.receiver.borrow().kind {
            ObjectKind::UserType(_) => "this_type",
            _ => "this",
        };
        scope
            .borrow_mut()
            .add(receiver_name, bound.receiver.clone(), false, None)
            .map_err(|error| Flow::Error(error.stamped(token)))?;

        self.bind_arguments(function, values, &scope, token)?;

        let result: EvalResult = match self.eval_statements(&function.body.statements, &scope) {
            Ok(value) => Ok(value),
            Err(Flow::Return(value)) => Ok(value),
            Err(flow) => {
                match self.run_destructors(&scope) {
                    Err(sweep) => return Err(sweep),
                    Ok(()) => return Err(flow),
                }
            }
        };
        match self.run_destructors(&scope) {
            Err(flow) => return Err(flow),
            Ok(()) => {}
        }
        let value = self.unwrap_member_value(result?);

        self.check_return_type(function.return_type.as_ref(), &value, token)?;
        Ok(value)
    }

    fn bind_arguments(
        &mut self,
        function: &Rc<FunctionObj>,
        values: Vec<ObjectRef>,
        scope: &EnvRef,
        token: &Token,
    ) -> Result<(), Flow> {
        if values.len() > function.arguments.len() {
            return Err(Flow::Error(ErrorObj::with_token(
                ErrorKind::TypeError,
                "Too many arguments provided for function",
                token.clone(),
            )));
        }
        // too few arguments surface later, when the body fails to resolve
        // the unbound name
        for (index, value) in values.into_iter().enumerate() {
            let declared = function.argument_types[index].as_ref();
            if !is_compatible_value(declared, &value, None) {
                let expected = declared.map_or_else(String::new, |ty| ty.text());
                let got = compute_type_of_value(&value)
                    .map_or_else(|| "<invalid>".to_string(), |ty| ty.text());
                return Err(Flow::Error(ErrorObj::with_token(
                    ErrorKind::TypeError,
                    format!(
                        "Incompatible type for argument {}, expected {expected} but got {got}",
                        index + 1
                    ),
                    token.clone(),
                )));
            }
            scope
                .borrow_mut()
                .add(
                    &function.arguments[index].value,
                    value,
                    false,
                    function.argument_types[index].clone(),
                )
                .map_err(|error| Flow::Error(error.stamped(token)))?;
        }
        Ok(())
    }

    fn check_return_type(
        &self,
        declared: Option<&std::sync::Arc<crate::ast::TypeExpression>>,
        value: &ObjectRef,
        token: &Token,
    ) -> Result<(), Flow> {
        if is_compatible_value(declared, value, None) {
            return Ok(());
        }
        let expected = declared.map_or_else(String::new, |ty| ty.text());
        let got = compute_type_of_value(value)
            .map_or_else(|| "<invalid>".to_string(), |ty| ty.text());
        Err(Flow::Error(ErrorObj::with_token(
            ErrorKind::TypeError,
            format!("Incompatible return type, expected {expected} but got {got}"),
            token.clone(),
        )))
    }

    /// Calling a user type is a shorthand for its constructor: allocate an
    /// instance with deep-cloned property defaults, run `construct` as a
    /// bound method, then attach `destruct` as the destructor. Attaching
    /// after construction keeps a failed construct from ever being
    /// destructed.
    fn construct_user_object(
        &mut self,
        user_type: &Rc<crate::object::UserTypeObj>,
        arguments: &[Expression],
        env: &EnvRef,
        token: &Token,
    ) -> EvalResult {
        let mut properties = PropertyMap::default();
        for (name, slot) in &user_type.properties {
            let slot = slot.borrow();
            properties.insert(
                name.clone(),
                Rc::new(std::cell::RefCell::new(Property {
                    value: deep_clone(&slot.value),
                    constant: slot.constant,
                    declared_type: slot.declared_type.clone(),
                })),
            );
        }

        let instance = alloc(ObjectKind::UserObject(UserInstance {
            user_type: user_type.clone(),
            properties,
            destructor: None,
        }));

        if let Some(construct) = user_type.functions.get("construct") {
            let bound = BoundUserFunction {
                receiver: instance.clone(),
                function: construct.clone(),
            };
            self.eval_bound_user_function(&bound, arguments, env, token)?;
        } else if !arguments.is_empty() {
            return Err(Flow::Error(ErrorObj::with_token(
                ErrorKind::TypeError,
                "Too many arguments provided for function",
                token.clone(),
            )));
        }

        if let Some(destruct) = user_type.functions.get("destruct") {
            if let ObjectKind::UserObject(user_instance) = &mut instance.borrow_mut().kind {
                user_instance.destructor = Some(destruct.clone());
            }
        }

        Ok(instance)
    }

    /// Runs a destructor as a bound method on a ghost instance. The
    /// declared return type of `destruct` is honored.
    pub(crate) fn eval_destructor(
        &mut self,
        destructor: &Rc<FunctionObj>,
        ghost: &ObjectRef,
        env: &EnvRef,
    ) -> Result<(), Flow> {
        let scope = Environment::new(Some(env.clone()));
        scope
            .borrow_mut()
            .add("this", ghost.clone(), false, None)
            .map_err(Flow::Error)?;

        let result = match self.eval_statements(&destructor.body.statements, &scope) {
            Ok(value) => value,
            Err(Flow::Return(value)) => value,
            Err(Flow::Break | Flow::Continue) => null_obj(),
            Err(flow) => return Err(flow),
        };
        let result = self.unwrap_member_value(result);

        if !is_compatible_value(destructor.return_type.as_ref(), &result, None) {
            let expected = destructor
                .return_type
                .as_ref()
                .map_or_else(String::new, |ty| ty.text());
            let got = compute_type_of_value(&result)
                .map_or_else(|| "<invalid>".to_string(), |ty| ty.text());
            return Err(Flow::Error(ErrorObj::type_err(format!(
                "Incompatible return type in destructor, expected {expected} but got {got}"
            ))));
        }
        Ok(())
    }
}

enum Callee {
    Builtin(Rc<crate::builtins::BuiltinDef>),
    Function(Rc<FunctionObj>),
    BoundBuiltin(ObjectRef, Rc<crate::types::TypeMethodDef>),
    BoundUser(BoundUserFunction),
    Constructor(Rc<crate::object::UserTypeObj>),
    NotCallable,
}
