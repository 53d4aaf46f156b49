//! Optional ahead-of-time analysis: infers function return types for
//! reporting and strips statements that can never execute because an
//! earlier statement in the same block terminates it.

use std::rc::Rc;

use crate::ast::{BlockStatement, Expression, Program, Statement};
use crate::typing::{compute_return_type, AnalysisContext};

/// One reportable finding of the analysis pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finding {
    /// A function's inferred return type, keyed by the binding name.
    ReturnType { name: String, rendered: String },
    /// Statements removed because they follow a terminal statement.
    UnreachableStatements { line: usize, removed: usize },
}

#[derive(Debug, Default)]
pub struct Analysis {
    pub findings: Vec<Finding>,
}

impl Analysis {
    #[must_use]
    pub fn report(&self) -> String {
        let mut out = String::new();
        for finding in &self.findings {
            match finding {
                Finding::ReturnType { name, rendered } => {
                    out.push_str(&format!("{name}: returns {rendered}\n"));
                }
                Finding::UnreachableStatements { line, removed } => {
                    out.push_str(&format!(
                        "line {line}: removed {removed} unreachable statement(s)\n"
                    ));
                }
            }
        }
        out
    }
}

fn is_terminal(statement: &Statement) -> bool {
    matches!(
        statement,
        Statement::Return(_) | Statement::Break { .. } | Statement::Continue { .. }
    )
}

fn strip_block(block: &mut BlockStatement, analysis: &mut Analysis) {
    if let Some(position) = block.statements.iter().position(is_terminal) {
        let removed = block.statements.len() - position - 1;
        if removed > 0 {
            let line = block.statements[position + 1].token().line;
            block.statements.truncate(position + 1);
            analysis
                .findings
                .push(Finding::UnreachableStatements { line, removed });
        }
    }
    for statement in &mut block.statements {
        strip_statement(statement, analysis);
    }
}

fn strip_statement(statement: &mut Statement, analysis: &mut Analysis) {
    match statement {
        Statement::Block(block) | Statement::Scope(block) => strip_block(block, analysis),
        Statement::TryExcept(statement) => {
            strip_block(&mut statement.body, analysis);
            strip_block(&mut statement.handler, analysis);
        }
        Statement::Expression(statement) => strip_expression(&mut statement.expression, analysis),
        Statement::Let(statement) => strip_expression(&mut statement.value, analysis),
        Statement::Return(statement) => strip_expression(&mut statement.value, analysis),
        _ => {}
    }
}

fn strip_expression(expression: &mut Expression, analysis: &mut Analysis) {
    match expression {
        Expression::If(if_expression) => {
            strip_block(&mut if_expression.consequence, analysis);
            if let Some(alternative) = &mut if_expression.alternative {
                strip_block(alternative, analysis);
            }
        }
        Expression::While { body, .. } => strip_block(body, analysis),
        Expression::For(for_expression) => strip_block(&mut for_expression.body, analysis),
        _ => {}
    }
}

fn report_function_types(
    statements: &[Statement],
    context: &Rc<AnalysisContext>,
    analysis: &mut Analysis,
) {
    for statement in statements {
        let (name, function) = match statement {
            Statement::Let(let_statement) => match &let_statement.value {
                Expression::Function(function) => {
                    (let_statement.name.value.clone(), function)
                }
                _ => continue,
            },
            Statement::Expression(expression_statement) => {
                match &expression_statement.expression {
                    Expression::Function(function) => match &function.name {
                        Some(name) => (name.value.clone(), function),
                        None => continue,
                    },
                    _ => continue,
                }
            }
            _ => continue,
        };

        let body_context = AnalysisContext::nested(context);
        for (argument, ty) in function.arguments.iter().zip(function.argument_types.iter()) {
            if let Some(ty) = ty {
                body_context.record(&argument.value, ty.clone());
            }
        }
        let inferred = compute_return_type(&function.body, &body_context, false);
        let rendered = match (&function.return_type, inferred) {
            (Some(declared), _) => declared.text(),
            (None, Some(inferred)) => inferred.text(),
            (None, None) => "null".to_string(),
        };
        analysis.findings.push(Finding::ReturnType { name, rendered });
    }
}

/// Runs the analysis: reports inferred return types for top-level
/// functions and removes unreachable statements from the tree in place.
pub fn analyze_program(program: &mut Program) -> Analysis {
    let mut analysis = Analysis::default();
    let context = AnalysisContext::new();
    report_function_types(&program.statements, &context, &mut analysis);

    if let Some(position) = program.statements.iter().position(is_terminal) {
        let removed = program.statements.len() - position - 1;
        if removed > 0 {
            let line = program.statements[position + 1].token().line;
            program.statements.truncate(position + 1);
            analysis
                .findings
                .push(Finding::UnreachableStatements { line, removed });
        }
    }
    for statement in &mut program.statements {
        strip_statement(statement, &mut analysis);
    }
    analysis
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_source;

    #[test]
    fn strips_statements_after_return() {
        let (mut program, errors) =
            parse_source("let f = fn() { return 1; let dead = 2; };", "");
        assert!(errors.is_empty());
        // reach into the function body
        let analysis = {
            let Statement::Let(let_statement) = &mut program.statements[0] else {
                panic!();
            };
            let Expression::Function(function) = &mut let_statement.value else {
                panic!();
            };
            let mut body = (*function.body).clone();
            let mut analysis = Analysis::default();
            strip_block(&mut body, &mut analysis);
            assert_eq!(body.statements.len(), 1);
            analysis
        };
        assert!(matches!(
            analysis.findings.as_slice(),
            [Finding::UnreachableStatements { removed: 1, .. }]
        ));
    }

    #[test]
    fn reports_function_return_types() {
        let (mut program, errors) = parse_source(
            "let f = fn(x: int) -> int { return x; }; let g = fn() { return \"s\"; };",
            "",
        );
        assert!(errors.is_empty());
        let analysis = analyze_program(&mut program);
        let rendered: Vec<String> = analysis
            .findings
            .iter()
            .filter_map(|finding| match finding {
                Finding::ReturnType { name, rendered } => Some(format!("{name}:{rendered}")),
                Finding::UnreachableStatements { .. } => None,
            })
            .collect();
        assert_eq!(rendered, vec!["f:int", "g:str"]);
    }
}
