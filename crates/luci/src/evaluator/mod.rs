//! The tree-walking evaluator.
//!
//! A family of mutually recursive functions over the AST. Results follow
//! the value-propagation protocol: `Ok` carries a value, `Err` carries a
//! [`Flow`] (error, return, break, continue or exit) that bubbles until
//! its matching construct consumes it. Scope exits sweep user-object
//! destructors before the environment frame is dropped.

mod call;
mod expression;
mod import;
pub(crate) mod index;
pub(crate) mod infix;
mod member;

use std::rc::Rc;

use crate::ast::{BlockStatement, LetStatement, Program, Statement, TryExceptStatement};
use crate::builtins::Registry;
use crate::env::{EnvRef, Environment};
use crate::errors::{ErrorKind, ErrorObj, EvalResult, Flow};
use crate::io::PrintWriter;
use crate::object::{
    alloc, deep_clone, error_value, is_value_assigned, null_obj, ObjectKind, UserInstance,
};
use crate::typing::is_compatible_value;

pub struct Evaluator<'w> {
    pub registry: Rc<Registry>,
    pub writer: &'w mut dyn PrintWriter,
    /// Command-line arguments exposed through the `arg()` builtin.
    pub program_args: Vec<String>,
}

impl<'w> Evaluator<'w> {
    pub fn new(writer: &'w mut dyn PrintWriter) -> Self {
        Self {
            registry: Rc::new(Registry::new()),
            writer,
            program_args: vec![],
        }
    }

    pub fn with_args(writer: &'w mut dyn PrintWriter, program_args: Vec<String>) -> Self {
        let mut evaluator = Self::new(writer);
        evaluator.program_args = program_args;
        evaluator
    }

    /// Evaluates a program in the given global environment, unwrapping any
    /// terminal `return`.
    pub fn eval_program(&mut self, program: &Program, env: &EnvRef) -> EvalResult {
        match self.eval_statements(&program.statements, env) {
            Ok(value) => Ok(value),
            Err(Flow::Return(value)) => Ok(value),
            Err(Flow::Break | Flow::Continue) => Ok(null_obj()),
            Err(flow) => Err(flow),
        }
    }

    /// Evaluates a statement list in order. A statement whose *value* is
    /// an error propagates that error: every consumer checks for the error
    /// tag before using a result.
    pub(crate) fn eval_statements(&mut self, statements: &[Statement], env: &EnvRef) -> EvalResult {
        let mut result = null_obj();
        for statement in statements {
            result = self.eval_statement(statement, env)?;
            let error = match &result.borrow().kind {
                ObjectKind::Error(error) => Some(error.clone()),
                _ => None,
            };
            if let Some(error) = error {
                return Err(Flow::Error(error.stamped(statement.token())));
            }
        }
        Ok(result)
    }

    pub(crate) fn eval_statement(&mut self, statement: &Statement, env: &EnvRef) -> EvalResult {
        match statement {
            Statement::Expression(expression_statement) => self
                .eval_expression(&expression_statement.expression, env, None)
                .map_err(|flow| stamp_flow(flow, &expression_statement.token)),
            Statement::Return(return_statement) => {
                let value = self.eval_expression(&return_statement.value, env, None)?;
                Err(Flow::Return(value))
            }
            Statement::Break { .. } => Err(Flow::Break),
            Statement::Continue { .. } => Err(Flow::Continue),
            Statement::Let(let_statement) => self.eval_let_statement(let_statement, env),
            Statement::Block(block) | Statement::Scope(block) => self.eval_scoped_block(block, env),
            Statement::TryExcept(try_statement) => self.eval_try_except(try_statement, env),
            Statement::Import(import_statement) => self.eval_import(import_statement, env),
        }
    }

    /// Runs a block in a fresh child environment with destructor sweep on
    /// exit.
    fn eval_scoped_block(&mut self, block: &BlockStatement, env: &EnvRef) -> EvalResult {
        let scope = Environment::new(Some(env.clone()));
        let result = self.eval_statements(&block.statements, &scope);
        match self.run_destructors(&scope) {
            Err(flow) => Err(flow),
            Ok(()) => result,
        }
    }

    fn eval_let_statement(&mut self, statement: &LetStatement, env: &EnvRef) -> EvalResult {
        // an error from the initializer is bound as a first-class value
        let value = match self.eval_expression(&statement.value, env, statement.declared_type.as_ref())
        {
            Ok(value) => value,
            Err(Flow::Error(error)) => error_value(error),
            Err(flow) => return Err(flow),
        };

        if !is_compatible_value(statement.declared_type.as_ref(), &value, None) {
            let declared = statement
                .declared_type
                .as_ref()
                .map_or_else(String::new, |ty| ty.text());
            return Err(Flow::Error(ErrorObj::with_token(
                ErrorKind::TypeError,
                format!(
                    "Incompatible type {declared} for {}",
                    statement.value.text()
                ),
                statement.token.clone(),
            )));
        }

        let stored = if is_value_assigned(&value) {
            deep_clone(&value)
        } else {
            value
        };
        stored.borrow_mut().declared_type = statement.declared_type.clone();

        env.borrow_mut()
            .add(
                &statement.name.value,
                stored,
                statement.constant,
                statement.declared_type.clone(),
            )
            .map_err(|error| Flow::Error(error.stamped(&statement.token)))?;
        Ok(null_obj())
    }

    /// `try { ... } except (name) { ... }`: the try block runs in the
    /// current scope; an error binds const into a fresh scope for the
    /// handler. A successful try yields the try block's value.
    fn eval_try_except(&mut self, statement: &TryExceptStatement, env: &EnvRef) -> EvalResult {
        match self.eval_statements(&statement.body.statements, env) {
            Ok(value) => Ok(value),
            Err(Flow::Error(error)) => {
                let scope = Environment::new(Some(env.clone()));
                let bound = error_value(error);
                bound.borrow_mut().declared_type = statement.error_type.clone();
                scope
                    .borrow_mut()
                    .add(
                        &statement.name.value,
                        bound,
                        true,
                        statement.error_type.clone(),
                    )
                    .map_err(|error| Flow::Error(error.stamped(&statement.token)))?;
                let result = self.eval_statements(&statement.handler.statements, &scope);
                match self.run_destructors(&scope) {
                    Err(flow) => Err(flow),
                    Ok(()) => result,
                }
            }
            Err(flow) => Err(flow),
        }
    }

    /// Sweeps the scope for user objects solely owned by it whose
    /// destructor is still attached, and runs each destructor exactly once
    /// on a ghost instance. A destructor error or exit replaces the
    /// scope's result.
    pub(crate) fn run_destructors(&mut self, env: &EnvRef) -> Result<(), Flow> {
        let mut targets = vec![];
        for binding in env.borrow().store.values() {
            if Rc::strong_count(&binding.value) != 1 {
                continue;
            }
            let has_destructor = matches!(
                &binding.value.borrow().kind,
                ObjectKind::UserObject(instance) if instance.destructor.is_some()
            );
            if has_destructor {
                targets.push(binding.value.clone());
            }
        }

        for target in targets {
            let detached = {
                let mut object = target.borrow_mut();
                let ObjectKind::UserObject(instance) = &mut object.kind else {
                    continue;
                };
                instance.destructor.take().map(|destructor| {
                    // the ghost shares the property slots but carries no
                    // destructor, so the teardown cannot recurse
                    let ghost = alloc(ObjectKind::UserObject(UserInstance {
                        user_type: instance.user_type.clone(),
                        properties: instance.properties.clone(),
                        destructor: None,
                    }));
                    (destructor, ghost)
                })
            };
            let Some((destructor, ghost)) = detached else {
                continue;
            };

            let result = self.eval_destructor(&destructor, &ghost, env);

            if let ObjectKind::UserObject(instance) = &mut target.borrow_mut().kind {
                instance.properties.clear();
            }

            match result {
                Err(Flow::Error(error)) => return Err(Flow::Error(error)),
                Err(Flow::Exit(code)) => return Err(Flow::Exit(code)),
                _ => {}
            }
        }
        Ok(())
    }
}

/// Stamps the statement token onto an error flow that lacks one.
pub(crate) fn stamp_flow(flow: Flow, token: &crate::token::Token) -> Flow {
    match flow {
        Flow::Error(error) => Flow::Error(error.stamped(token)),
        other => other,
    }
}
