//! Pratt parser.
//!
//! Two sub-languages share the precedence ladder: value expressions and type
//! expressions, each with their own prefix dispatch. The parser never
//! fails hard; errors are collected with their source position and parsing
//! resumes at the next recoverable point.

use std::fmt;
use std::sync::Arc;

use crate::ast::{
    BlockStatement, Expression, ExpressionStatement, ForExpression, FunctionLiteral, Identifier,
    IfExpression, ImportStatement, LetStatement, Program, ReturnStatement, Statement,
    TryExceptStatement, TypeExpression, TypeLiteral, TypeMember,
};
use crate::lexer::Lexer;
use crate::token::{Token, TokenKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl fmt::Display for ParserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{}): {}", self.line, self.column, self.message)
    }
}

/// Pratt parser precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    Lowest,
    Assign,
    Equals,
    LessGreater,
    Sum,
    Product,
    Power,
    Prefix,
    Call,
    Index,
}

fn precedence_of(kind: TokenKind) -> Precedence {
    match kind {
        TokenKind::Assign
        | TokenKind::PlusAssign
        | TokenKind::MinusAssign
        | TokenKind::SlashAssign
        | TokenKind::AsteriskAssign => Precedence::Assign,
        TokenKind::Eq | TokenKind::NotEq | TokenKind::LtEq | TokenKind::GtEq => Precedence::Equals,
        TokenKind::Lt | TokenKind::Gt | TokenKind::DoubleAmpersand | TokenKind::DoublePipe => {
            Precedence::LessGreater
        }
        TokenKind::Plus | TokenKind::Minus => Precedence::Sum,
        TokenKind::Slash | TokenKind::Asterisk | TokenKind::Percent => Precedence::Product,
        TokenKind::DoubleAsterisk => Precedence::Power,
        TokenKind::Lparen | TokenKind::Dot | TokenKind::DoubleColon => Precedence::Call,
        TokenKind::Lbracket => Precedence::Index,
        _ => Precedence::Lowest,
    }
}

pub struct Parser {
    lexer: Lexer,
    cur_token: Token,
    peek_token: Token,
    cur_doc: Vec<String>,
    pub errors: Vec<ParserError>,
}

impl Parser {
    #[must_use]
    pub fn new(lexer: Lexer) -> Self {
        let mut parser = Self {
            lexer,
            cur_token: Token::default(),
            peek_token: Token::default(),
            cur_doc: vec![],
            errors: vec![],
        };
        parser.advance();
        parser.advance();
        parser
    }

    fn advance(&mut self) {
        self.cur_token = std::mem::replace(&mut self.peek_token, self.lexer.next_token());
    }

    fn error(&mut self, message: impl Into<String>, token: &Token) {
        self.errors.push(ParserError {
            line: token.line,
            column: token.column,
            message: message.into(),
        });
    }

    fn peek_error(&mut self, expected: TokenKind) {
        let message = format!(
            "Expected next token to be {}, but got {}",
            expected, self.peek_token.kind
        );
        let token = self.peek_token.clone();
        self.error(message, &token);
    }

    fn expect_peek(&mut self, expected: TokenKind) -> bool {
        if self.peek_token.kind == expected {
            self.advance();
            true
        } else {
            self.peek_error(expected);
            false
        }
    }

    fn cur_precedence(&self) -> Precedence {
        precedence_of(self.cur_token.kind)
    }

    fn peek_precedence(&self) -> Precedence {
        precedence_of(self.peek_token.kind)
    }

    /// Drains the accumulated doc-comment run, joining the lines with the
    /// `/!` markers stripped.
    fn take_doc(&mut self) -> Option<String> {
        if self.cur_doc.is_empty() {
            return None;
        }
        let lines: Vec<String> = self
            .cur_doc
            .drain(..)
            .map(|line| {
                line.trim_start_matches("/!")
                    .trim_start_matches(' ')
                    .trim_end_matches('\n')
                    .to_string()
            })
            .collect();
        Some(lines.join("\n"))
    }

    pub fn parse_program(&mut self) -> Program {
        let mut program = Program { statements: vec![] };
        while self.cur_token.kind != TokenKind::Eof {
            if self.cur_token.kind == TokenKind::Illegal {
                let token = self.cur_token.clone();
                self.error(format!("invalid token {}", token.literal), &token);
                return program;
            }
            if let Some(statement) = self.parse_statement() {
                program.statements.push(statement);
            }
            self.advance();
        }
        program
    }

    fn parse_statement(&mut self) -> Option<Statement> {
        match self.cur_token.kind {
            TokenKind::Let => self.parse_let_statement().map(Statement::Let),
            TokenKind::Import => self.parse_import_statement().map(Statement::Import),
            TokenKind::Try => self.parse_try_except_statement().map(Statement::TryExcept),
            TokenKind::Return => self.parse_return_statement().map(Statement::Return),
            TokenKind::Break => Some(self.parse_break_statement()),
            TokenKind::Continue => Some(self.parse_continue_statement()),
            TokenKind::Scope => self.parse_scope_statement().map(Statement::Scope),
            TokenKind::Lbrace => Some(Statement::Block(self.parse_block_statement())),
            TokenKind::Comment => None,
            TokenKind::Doc => {
                self.cur_doc.push(self.cur_token.literal.clone());
                None
            }
            _ => self.parse_expression_statement().map(Statement::Expression),
        }
    }

    fn parse_expression_statement(&mut self) -> Option<ExpressionStatement> {
        let token = self.cur_token.clone();
        let expression = self.parse_expression(Precedence::Lowest)?;
        if self.peek_token.kind == TokenKind::Semicolon {
            self.advance();
        }
        Some(ExpressionStatement { token, expression })
    }

    fn parse_let_statement(&mut self) -> Option<LetStatement> {
        let token = self.cur_token.clone();
        self.advance();

        let constant = if self.cur_token.kind == TokenKind::Const {
            self.advance();
            true
        } else {
            false
        };

        if self.cur_token.kind != TokenKind::Ident {
            let cur = self.cur_token.clone();
            self.error(
                format!("Expected identifier after let, got {}", cur.kind),
                &cur,
            );
            return None;
        }
        let name = Identifier {
            token: self.cur_token.clone(),
            value: self.cur_token.literal.clone(),
        };
        self.advance();

        let declared_type = if self.cur_token.kind == TokenKind::Colon {
            self.advance();
            let ty = self.parse_type_expression()?;
            self.advance();
            Some(ty)
        } else {
            None
        };

        if self.cur_token.kind != TokenKind::Assign {
            let cur = self.cur_token.clone();
            self.error(format!("Expected {}", TokenKind::Assign), &cur);
            return None;
        }
        self.advance();

        let value = self.parse_expression(Precedence::Lowest)?;
        if self.peek_token.kind == TokenKind::Semicolon {
            self.advance();
        }

        Some(LetStatement {
            token,
            constant,
            name,
            declared_type,
            value,
        })
    }

    fn parse_import_statement(&mut self) -> Option<ImportStatement> {
        let token = self.cur_token.clone();
        self.advance();

        if self.cur_token.kind != TokenKind::Ident {
            let cur = self.cur_token.clone();
            self.error("Expected module path after import", &cur);
            return None;
        }
        let mut path = vec![self.cur_token.literal.clone()];
        while self.peek_token.kind == TokenKind::DoubleColon {
            self.advance();
            if !self.expect_peek(TokenKind::Ident) {
                return None;
            }
            path.push(self.cur_token.literal.clone());
        }

        if self.peek_token.kind == TokenKind::Semicolon {
            self.advance();
        }
        Some(ImportStatement { token, path })
    }

    fn parse_return_statement(&mut self) -> Option<ReturnStatement> {
        let token = self.cur_token.clone();
        self.advance();
        let value = self.parse_expression(Precedence::Lowest)?;
        if self.peek_token.kind == TokenKind::Semicolon {
            self.advance();
        }
        Some(ReturnStatement { token, value })
    }

    fn parse_break_statement(&mut self) -> Statement {
        let token = self.cur_token.clone();
        if self.peek_token.kind == TokenKind::Semicolon {
            self.advance();
        }
        Statement::Break { token }
    }

    fn parse_continue_statement(&mut self) -> Statement {
        let token = self.cur_token.clone();
        if self.peek_token.kind == TokenKind::Semicolon {
            self.advance();
        }
        Statement::Continue { token }
    }

    fn parse_scope_statement(&mut self) -> Option<BlockStatement> {
        let token = self.cur_token.clone();
        if !self.expect_peek(TokenKind::Lbrace) {
            return None;
        }
        let mut block = self.parse_block_statement();
        block.token = token;
        Some(block)
    }

    fn parse_try_except_statement(&mut self) -> Option<TryExceptStatement> {
        let token = self.cur_token.clone();

        if !self.expect_peek(TokenKind::Lbrace) {
            return None;
        }
        let body = self.parse_block_statement();

        if !self.expect_peek(TokenKind::Except) {
            return None;
        }
        if !self.expect_peek(TokenKind::Lparen) {
            return None;
        }
        self.advance();

        if self.cur_token.kind != TokenKind::Ident {
            let cur = self.cur_token.clone();
            self.error("Expected identifier in except clause", &cur);
            return None;
        }
        let name = Identifier {
            token: self.cur_token.clone(),
            value: self.cur_token.literal.clone(),
        };

        let error_type = if self.peek_token.kind == TokenKind::Colon {
            self.advance();
            self.advance();
            let ty = self.parse_type_expression()?;
            Some(ty)
        } else {
            None
        };

        if !self.expect_peek(TokenKind::Rparen) {
            return None;
        }
        if !self.expect_peek(TokenKind::Lbrace) {
            return None;
        }
        let handler = self.parse_block_statement();
        if self.peek_token.kind == TokenKind::Semicolon {
            self.advance();
        }

        Some(TryExceptStatement {
            token,
            body,
            name,
            error_type,
            handler,
        })
    }

    /// Current token is `{`; consumes up to the matching `}`.
    fn parse_block_statement(&mut self) -> BlockStatement {
        let token = self.cur_token.clone();
        let mut statements = vec![];
        self.advance();
        while self.cur_token.kind != TokenKind::Rbrace && self.cur_token.kind != TokenKind::Eof {
            if let Some(statement) = self.parse_statement() {
                statements.push(statement);
            }
            self.advance();
        }
        BlockStatement { token, statements }
    }

    fn parse_expression(&mut self, precedence: Precedence) -> Option<Expression> {
        let mut left = self.parse_prefix()?;

        while self.peek_token.kind != TokenKind::Semicolon && precedence < self.peek_precedence() {
            left = match self.peek_token.kind {
                TokenKind::Plus
                | TokenKind::Minus
                | TokenKind::Slash
                | TokenKind::Asterisk
                | TokenKind::DoubleAsterisk
                | TokenKind::Percent
                | TokenKind::Eq
                | TokenKind::NotEq
                | TokenKind::LtEq
                | TokenKind::GtEq
                | TokenKind::Lt
                | TokenKind::Gt
                | TokenKind::Assign
                | TokenKind::PlusAssign
                | TokenKind::MinusAssign
                | TokenKind::SlashAssign
                | TokenKind::AsteriskAssign
                | TokenKind::DoublePipe
                | TokenKind::DoubleAmpersand => {
                    self.advance();
                    self.parse_infix_expression(left)?
                }
                TokenKind::Lparen => {
                    self.advance();
                    self.parse_call_expression(left)?
                }
                TokenKind::Dot => {
                    self.advance();
                    self.parse_member_expression(left, false)?
                }
                TokenKind::DoubleColon => {
                    self.advance();
                    self.parse_member_expression(left, true)?
                }
                TokenKind::Lbracket => {
                    self.advance();
                    self.parse_index_expression(left)?
                }
                _ => return Some(left),
            };
        }
        Some(left)
    }

    fn parse_prefix(&mut self) -> Option<Expression> {
        match self.cur_token.kind {
            TokenKind::Ident => Some(Expression::Identifier(Identifier {
                token: self.cur_token.clone(),
                value: self.cur_token.literal.clone(),
            })),
            TokenKind::Null => Some(Expression::Null {
                token: self.cur_token.clone(),
            }),
            TokenKind::Int => self.parse_integer_literal(),
            TokenKind::Double => self.parse_double_literal(),
            TokenKind::Str => Some(self.parse_string_literal()),
            TokenKind::True | TokenKind::False => Some(Expression::Boolean {
                token: self.cur_token.clone(),
                value: self.cur_token.kind == TokenKind::True,
            }),
            TokenKind::Bang | TokenKind::Minus => self.parse_prefix_expression(),
            TokenKind::Lparen => self.parse_grouped_expression(),
            TokenKind::If => self.parse_if_expression().map(Expression::If),
            TokenKind::Function => self.parse_function_literal().map(Expression::Function),
            TokenKind::Type => self.parse_type_literal().map(Expression::TypeLiteral),
            TokenKind::While => self.parse_while_expression(),
            TokenKind::For => self.parse_for_expression().map(Expression::For),
            TokenKind::Lbracket => self.parse_array_literal(),
            TokenKind::Lbrace => self.parse_dict_or_set_literal(),
            _ => {
                let cur = self.cur_token.clone();
                self.error(
                    format!("no prefix parse function found for {}", cur.literal),
                    &cur,
                );
                None
            }
        }
    }

    fn parse_integer_literal(&mut self) -> Option<Expression> {
        let token = self.cur_token.clone();
        match token.literal.parse::<i64>() {
            Ok(value) => Some(Expression::Integer { token, value }),
            Err(_) => {
                let message = format!("could not parse {} as integer", token.literal);
                self.error(message, &token);
                None
            }
        }
    }

    fn parse_double_literal(&mut self) -> Option<Expression> {
        let token = self.cur_token.clone();
        match token.literal.parse::<f64>() {
            Ok(value) => Some(Expression::Double { token, value }),
            Err(_) => {
                let message = format!("could not parse {} as double", token.literal);
                self.error(message, &token);
                None
            }
        }
    }

    fn parse_string_literal(&self) -> Expression {
        let token = self.cur_token.clone();
        // the literal still carries its surrounding quotes
        let value = if token.literal.len() >= 2 {
            token.literal[1..token.literal.len() - 1].to_string()
        } else {
            String::new()
        };
        Expression::Str { token, value }
    }

    fn parse_prefix_expression(&mut self) -> Option<Expression> {
        let token = self.cur_token.clone();
        let operator = self.cur_token.clone();
        self.advance();
        let right = self.parse_expression(Precedence::Prefix)?;
        Some(Expression::Prefix {
            token,
            operator,
            right: Box::new(right),
        })
    }

    fn parse_infix_expression(&mut self, left: Expression) -> Option<Expression> {
        let token = self.cur_token.clone();
        let operator = self.cur_token.clone();
        let precedence = self.cur_precedence();
        self.advance();
        let right = self.parse_expression(precedence)?;
        Some(Expression::Infix {
            token,
            operator,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    fn parse_grouped_expression(&mut self) -> Option<Expression> {
        self.advance();
        let expression = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenKind::Rparen) {
            return None;
        }
        Some(expression)
    }

    fn parse_call_expression(&mut self, function: Expression) -> Option<Expression> {
        let token = self.cur_token.clone();
        let arguments = self.parse_expression_list(TokenKind::Rparen)?;
        Some(Expression::Call {
            token,
            function: Box::new(function),
            arguments,
        })
    }

    fn parse_member_expression(&mut self, expression: Expression, module: bool) -> Option<Expression> {
        let token = self.cur_token.clone();
        if !self.expect_peek(TokenKind::Ident) {
            return None;
        }
        let member = Identifier {
            token: self.cur_token.clone(),
            value: self.cur_token.literal.clone(),
        };
        Some(if module {
            Expression::ModuleMember {
                token,
                expression: Box::new(expression),
                member,
            }
        } else {
            Expression::Member {
                token,
                expression: Box::new(expression),
                member,
            }
        })
    }

    fn parse_index_expression(&mut self, expression: Expression) -> Option<Expression> {
        let token = self.cur_token.clone();
        self.advance();
        let index = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenKind::Rbracket) {
            return None;
        }
        Some(Expression::Index {
            token,
            expression: Box::new(expression),
            index: Box::new(index),
        })
    }

    fn parse_if_expression(&mut self) -> Option<IfExpression> {
        let token = self.cur_token.clone();
        if !self.expect_peek(TokenKind::Lparen) {
            return None;
        }
        self.advance();
        let condition = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenKind::Rparen) {
            return None;
        }
        if !self.expect_peek(TokenKind::Lbrace) {
            return None;
        }
        let consequence = self.parse_block_statement();

        let alternative = if self.peek_token.kind == TokenKind::Else {
            self.advance();
            if !self.expect_peek(TokenKind::Lbrace) {
                return None;
            }
            Some(self.parse_block_statement())
        } else {
            None
        };

        Some(IfExpression {
            token,
            condition: Box::new(condition),
            consequence,
            alternative,
        })
    }

    fn parse_while_expression(&mut self) -> Option<Expression> {
        let token = self.cur_token.clone();
        if !self.expect_peek(TokenKind::Lparen) {
            return None;
        }
        self.advance();
        let condition = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenKind::Rparen) {
            return None;
        }
        if !self.expect_peek(TokenKind::Lbrace) {
            return None;
        }
        let body = self.parse_block_statement();
        Some(Expression::While {
            token,
            condition: Box::new(condition),
            body,
        })
    }

    fn parse_for_expression(&mut self) -> Option<ForExpression> {
        let token = self.cur_token.clone();
        if !self.expect_peek(TokenKind::Lparen) {
            return None;
        }
        self.advance();

        let constant = if self.cur_token.kind == TokenKind::Const {
            self.advance();
            true
        } else {
            false
        };

        if self.cur_token.kind != TokenKind::Ident {
            let cur = self.cur_token.clone();
            self.error("Expected loop variable in for expression", &cur);
            return None;
        }
        let name = Identifier {
            token: self.cur_token.clone(),
            value: self.cur_token.literal.clone(),
        };
        self.advance();

        let iter_type = if self.cur_token.kind == TokenKind::Colon {
            self.advance();
            let ty = self.parse_type_expression()?;
            self.advance();
            Some(ty)
        } else {
            None
        };

        if self.cur_token.kind != TokenKind::In {
            let cur = self.cur_token.clone();
            self.error(format!("Expected {}", TokenKind::In), &cur);
            return None;
        }
        self.advance();

        let iterable = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenKind::Rparen) {
            return None;
        }
        if !self.expect_peek(TokenKind::Lbrace) {
            return None;
        }
        let body = self.parse_block_statement();

        Some(ForExpression {
            token,
            constant,
            name,
            iter_type,
            iterable: Box::new(iterable),
            body,
        })
    }

    fn parse_function_literal(&mut self) -> Option<FunctionLiteral> {
        let token = self.cur_token.clone();
        let doc = self.take_doc();

        let name = if self.peek_token.kind == TokenKind::Ident {
            self.advance();
            Some(Identifier {
                token: self.cur_token.clone(),
                value: self.cur_token.literal.clone(),
            })
        } else {
            None
        };

        if !self.expect_peek(TokenKind::Lparen) {
            return None;
        }
        let (arguments, argument_types) = self.parse_function_arguments()?;

        let return_type = if self.peek_token.kind == TokenKind::Arrow {
            self.advance();
            self.advance();
            Some(self.parse_type_expression()?)
        } else {
            None
        };

        if !self.expect_peek(TokenKind::Lbrace) {
            return None;
        }
        let body = self.parse_block_statement();

        Some(FunctionLiteral {
            token,
            doc,
            name,
            arguments,
            argument_types,
            return_type,
            body: Arc::new(body),
        })
    }

    #[allow(clippy::type_complexity)]
    fn parse_function_arguments(
        &mut self,
    ) -> Option<(Vec<Identifier>, Vec<Option<Arc<TypeExpression>>>)> {
        let mut identifiers = vec![];
        let mut types = vec![];

        if self.peek_token.kind == TokenKind::Rparen {
            self.advance();
            return Some((identifiers, types));
        }
        self.advance();

        loop {
            if self.cur_token.kind != TokenKind::Ident {
                let cur = self.cur_token.clone();
                self.error("Expected argument name", &cur);
                return None;
            }
            identifiers.push(Identifier {
                token: self.cur_token.clone(),
                value: self.cur_token.literal.clone(),
            });

            if self.peek_token.kind == TokenKind::Colon {
                self.advance();
                self.advance();
                types.push(Some(self.parse_type_expression()?));
            } else {
                types.push(None);
            }

            if self.peek_token.kind != TokenKind::Comma {
                break;
            }
            self.advance();
            self.advance();
        }

        if !self.expect_peek(TokenKind::Rparen) {
            return None;
        }
        Some((identifiers, types))
    }

    fn parse_type_literal(&mut self) -> Option<TypeLiteral> {
        let token = self.cur_token.clone();
        let doc = self.take_doc();
        self.advance();

        if self.cur_token.kind != TokenKind::Ident {
            let cur = self.cur_token.clone();
            self.error("Expected type name", &cur);
            return None;
        }
        let name = self.cur_token.literal.clone();

        if !self.expect_peek(TokenKind::Lbrace) {
            return None;
        }
        self.advance();

        let mut members = vec![];
        while self.cur_token.kind != TokenKind::Rbrace && self.cur_token.kind != TokenKind::Eof {
            if let Some(member) = self.parse_type_member() {
                members.push(member);
            }
            self.advance();
        }

        Some(TypeLiteral {
            token,
            name,
            doc,
            members,
        })
    }

    /// Parses one `[const] name [: type] = value ;` member of a type
    /// literal. `let` is accepted and skipped so members read like
    /// ordinary declarations.
    fn parse_type_member(&mut self) -> Option<TypeMember> {
        while matches!(
            self.cur_token.kind,
            TokenKind::Comment | TokenKind::Doc | TokenKind::Let | TokenKind::Function
        ) {
            match self.cur_token.kind {
                TokenKind::Doc => {
                    self.cur_doc.push(self.cur_token.literal.clone());
                    self.advance();
                }
                TokenKind::Comment => self.advance(),
                TokenKind::Let => {
                    self.advance();
                    break;
                }
                TokenKind::Function => {
                    // `fn name(...) {...}` sugar: rewrite as `name = fn(...)`.
                    return self.parse_method_member();
                }
                _ => unreachable!(),
            }
        }

        let token = self.cur_token.clone();
        let constant = if self.cur_token.kind == TokenKind::Const {
            self.advance();
            true
        } else {
            false
        };

        if self.cur_token.kind != TokenKind::Ident {
            let cur = self.cur_token.clone();
            self.error("Expected member name in type literal", &cur);
            return None;
        }
        let name = Identifier {
            token: self.cur_token.clone(),
            value: self.cur_token.literal.clone(),
        };
        self.advance();

        let declared_type = if self.cur_token.kind == TokenKind::Colon {
            self.advance();
            let ty = self.parse_type_expression()?;
            self.advance();
            Some(ty)
        } else {
            None
        };

        if self.cur_token.kind != TokenKind::Assign {
            let cur = self.cur_token.clone();
            self.error(format!("Expected {}", TokenKind::Assign), &cur);
            return None;
        }
        self.advance();

        let value = self.parse_expression(Precedence::Lowest)?;
        if self.peek_token.kind == TokenKind::Semicolon {
            self.advance();
        }

        Some(TypeMember {
            token,
            constant,
            name,
            declared_type,
            value,
        })
    }

    /// `fn name(args) [-> R] { ... }` inside a type literal: a method
    /// definition, equivalent to `name = fn(args) [-> R] { ... };`.
    fn parse_method_member(&mut self) -> Option<TypeMember> {
        let token = self.cur_token.clone();
        let function = self.parse_function_literal()?;
        let Some(name) = function.name.clone() else {
            self.error("Expected method name in type literal", &token);
            return None;
        };
        if self.peek_token.kind == TokenKind::Semicolon {
            self.advance();
        }

        Some(TypeMember {
            token,
            constant: false,
            name,
            declared_type: None,
            value: Expression::Function(function),
        })
    }

    fn parse_array_literal(&mut self) -> Option<Expression> {
        let mut token = self.cur_token.clone();
        let elements = self.parse_expression_list(TokenKind::Rbracket)?;

        // An array literal homogeneous in double literals is reclassified to
        // a dense double array; the final say on the element type stays with
        // the evaluator, which also sees the declared type of the binding.
        if !elements.is_empty() {
            if elements
                .iter()
                .all(|element| matches!(element, Expression::Double { .. }))
            {
                let doubles: Vec<f64> = elements
                    .iter()
                    .map(|element| match element {
                        Expression::Double { value, .. } => *value,
                        _ => unreachable!(),
                    })
                    .collect();
                let rendered: Vec<String> = elements.iter().map(Expression::text).collect();
                token.literal = format!("[{}]", rendered.join(", "));
                return Some(Expression::ArrayDouble {
                    token,
                    elements: doubles,
                });
            }
            if elements
                .iter()
                .all(|element| matches!(element, Expression::Complex { .. }))
            {
                let values: Vec<num_complex::Complex64> = elements
                    .iter()
                    .map(|element| match element {
                        Expression::Complex { value, .. } => *value,
                        _ => unreachable!(),
                    })
                    .collect();
                let rendered: Vec<String> = elements.iter().map(Expression::text).collect();
                token.literal = format!("[{}]", rendered.join(", "));
                return Some(Expression::ArrayComplex {
                    token,
                    elements: values,
                });
            }
        }

        Some(Expression::Array { token, elements })
    }

    /// A brace literal is ambiguous until the first element: a following
    /// `:` commits to dict, anything else to set. `{}` is a dict.
    fn parse_dict_or_set_literal(&mut self) -> Option<Expression> {
        let token = self.cur_token.clone();
        let mut pairs: Vec<(Expression, Expression)> = vec![];
        let mut elements: Vec<Expression> = vec![];
        let mut is_dict: Option<bool> = None;

        while self.peek_token.kind != TokenKind::Rbrace && self.peek_token.kind != TokenKind::Eof {
            self.advance();
            let key = self.parse_expression(Precedence::Lowest)?;

            if is_dict.is_none() {
                is_dict = Some(self.peek_token.kind == TokenKind::Colon);
            }

            if is_dict == Some(true) {
                if !self.expect_peek(TokenKind::Colon) {
                    return None;
                }
                self.advance();
                let value = self.parse_expression(Precedence::Lowest)?;
                pairs.push((key, value));
            } else {
                elements.push(key);
            }

            if self.peek_token.kind != TokenKind::Rbrace && !self.expect_peek(TokenKind::Comma) {
                return None;
            }
        }

        if !self.expect_peek(TokenKind::Rbrace) {
            return None;
        }

        match is_dict {
            Some(false) => Some(Expression::Set { token, elements }),
            // an empty brace literal is always a dictionary
            _ => Some(Expression::Dict { token, pairs }),
        }
    }

    fn parse_expression_list(&mut self, end: TokenKind) -> Option<Vec<Expression>> {
        let mut items = vec![];
        if self.peek_token.kind == end {
            self.advance();
            return Some(items);
        }
        self.advance();

        items.push(self.parse_expression(Precedence::Lowest)?);
        while self.peek_token.kind == TokenKind::Comma {
            self.advance();
            self.advance();
            items.push(self.parse_expression(Precedence::Lowest)?);
        }

        if !self.expect_peek(end) {
            return None;
        }
        Some(items)
    }

    // --- type expressions ------------------------------------------------

    /// Type expressions are prefix-only; there are no infix type operators.
    pub fn parse_type_expression(&mut self) -> Option<Arc<TypeExpression>> {
        let token = self.cur_token.clone();
        match self.cur_token.kind {
            TokenKind::Ident => Some(Arc::new(TypeExpression::Identifier {
                value: token.literal.clone(),
                token,
            })),
            TokenKind::Null => Some(Arc::new(TypeExpression::Null { token })),
            TokenKind::Any => Some(Arc::new(TypeExpression::Any { token })),
            TokenKind::All => Some(Arc::new(TypeExpression::All { token })),
            TokenKind::Lt => self.parse_type_choice(),
            TokenKind::Lbracket => self.parse_type_array(),
            TokenKind::Lbrace => self.parse_type_dictionary_or_set(),
            TokenKind::Function => self.parse_type_function(),
            _ => {
                self.error(
                    format!("no prefix parse type function found for {}", token.literal),
                    &token,
                );
                None
            }
        }
    }

    fn parse_type_choice(&mut self) -> Option<Arc<TypeExpression>> {
        let token = self.cur_token.clone();
        let choices = self.parse_type_expression_list(TokenKind::Gt)?;
        Some(Arc::new(TypeExpression::Choice { token, choices }))
    }

    fn parse_type_array(&mut self) -> Option<Arc<TypeExpression>> {
        let token = self.cur_token.clone();
        self.advance();
        if self.cur_token.kind == TokenKind::Rbracket {
            let cur = self.cur_token.clone();
            self.error("array type expression cannot be empty", &cur);
            return None;
        }
        let element = self.parse_type_expression()?;
        if !self.expect_peek(TokenKind::Rbracket) {
            return None;
        }
        Some(Arc::new(TypeExpression::Array { token, element }))
    }

    fn parse_type_dictionary_or_set(&mut self) -> Option<Arc<TypeExpression>> {
        let token = self.cur_token.clone();
        self.advance();
        let key = self.parse_type_expression()?;

        if self.peek_token.kind != TokenKind::Colon {
            if !self.expect_peek(TokenKind::Rbrace) {
                return None;
            }
            return Some(Arc::new(TypeExpression::Set {
                token,
                element: key,
            }));
        }

        self.advance();
        self.advance();
        let value = self.parse_type_expression()?;
        if !self.expect_peek(TokenKind::Rbrace) {
            return None;
        }
        Some(Arc::new(TypeExpression::Dictionary { token, key, value }))
    }

    fn parse_type_function(&mut self) -> Option<Arc<TypeExpression>> {
        let token = self.cur_token.clone();
        if !self.expect_peek(TokenKind::Lparen) {
            return None;
        }
        let arguments = self
            .parse_type_expression_list(TokenKind::Rparen)?
            .into_iter()
            .map(Some)
            .collect();

        if !self.expect_peek(TokenKind::Arrow) {
            return None;
        }
        self.advance();
        let ret = self.parse_type_expression()?;
        Some(Arc::new(TypeExpression::Function {
            token,
            arguments,
            ret: Some(ret),
        }))
    }

    fn parse_type_expression_list(&mut self, end: TokenKind) -> Option<Vec<Arc<TypeExpression>>> {
        let mut items = vec![];
        if self.peek_token.kind == end {
            self.advance();
            return Some(items);
        }
        self.advance();

        items.push(self.parse_type_expression()?);
        while self.peek_token.kind == TokenKind::Comma {
            self.advance();
            self.advance();
            items.push(self.parse_type_expression()?);
        }

        if !self.expect_peek(end) {
            return None;
        }
        Some(items)
    }
}

/// Convenience wrapper: lex and parse a source string.
#[must_use]
pub fn parse_source(source: &str, file_name: &str) -> (Program, Vec<ParserError>) {
    let mut parser = Parser::new(Lexer::new(source, file_name));
    let program = parser.parse_program();
    (program, parser.errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(source: &str) -> Program {
        let (program, errors) = parse_source(source, "");
        assert!(errors.is_empty(), "unexpected parse errors: {errors:?}");
        program
    }

    #[test]
    fn let_statement_shapes() {
        let program = parse_ok("let x = 5; let const y : int = 2; let z : <int,str> = 1;");
        assert_eq!(program.statements.len(), 3);
        let Statement::Let(first) = &program.statements[0] else {
            panic!("expected let statement");
        };
        assert_eq!(first.name.value, "x");
        assert!(!first.constant);

        let Statement::Let(second) = &program.statements[1] else {
            panic!("expected let statement");
        };
        assert!(second.constant);
        assert_eq!(second.declared_type.as_ref().map(|t| t.text()), Some("int".into()));

        let Statement::Let(third) = &program.statements[2] else {
            panic!("expected let statement");
        };
        assert_eq!(
            third.declared_type.as_ref().map(|t| t.text()),
            Some("<int,str>".into())
        );
    }

    #[test]
    fn bare_let_is_an_error() {
        let (_, errors) = parse_source("let x;", "");
        assert!(!errors.is_empty());
    }

    #[test]
    fn precedence_grouping() {
        let cases = [
            ("1 + 2 * 3;", "(1 + (2 * 3))"),
            ("(1 + 2) * 3;", "((1 + 2) * 3)"),
            ("-a * b;", "((-a) * b)"),
            ("!true == false;", "((!true) == false)"),
            ("a + b % c;", "(a + (b % c))"),
            ("2 ** 3 * 4;", "((2 ** 3) * 4)"),
            ("a < b && c > d;", "((a < b) && (c > d))"),
            ("a[1] + f(2);", "((a[1]) + f(2))"),
        ];
        for (source, expected) in cases {
            let program = parse_ok(source);
            let Statement::Expression(statement) = &program.statements[0] else {
                panic!("expected expression statement for {source}");
            };
            assert_eq!(statement.expression.text(), expected, "{source}");
        }
    }

    #[test]
    fn empty_brace_literal_is_dict() {
        let program = parse_ok("let a = {};");
        let Statement::Let(statement) = &program.statements[0] else {
            panic!("expected let");
        };
        assert!(matches!(statement.value, Expression::Dict { .. }));
    }

    #[test]
    fn brace_commitment_to_dict_or_set() {
        let program = parse_ok("let d = {\"a\": 1, \"b\": 2}; let s = {1, 2, 3};");
        let Statement::Let(dict) = &program.statements[0] else {
            panic!();
        };
        assert!(matches!(dict.value, Expression::Dict { ref pairs, .. } if pairs.len() == 2));
        let Statement::Let(set) = &program.statements[1] else {
            panic!();
        };
        assert!(matches!(set.value, Expression::Set { ref elements, .. } if elements.len() == 3));
    }

    #[test]
    fn statement_position_brace_is_a_block() {
        let program = parse_ok("{ let x = 1; }");
        assert!(matches!(program.statements[0], Statement::Block(_)));
    }

    #[test]
    fn homogeneous_double_array_is_reclassified() {
        let program = parse_ok("let a = [1.0, 2.0]; let b = [1.0, 2];");
        let Statement::Let(dense) = &program.statements[0] else {
            panic!();
        };
        assert!(matches!(dense.value, Expression::ArrayDouble { .. }));
        let Statement::Let(generic) = &program.statements[1] else {
            panic!();
        };
        assert!(matches!(generic.value, Expression::Array { .. }));
    }

    #[test]
    fn function_literal_with_types() {
        let program = parse_ok("let f = fn(x: int, y) -> int { return x; };");
        let Statement::Let(statement) = &program.statements[0] else {
            panic!();
        };
        let Expression::Function(function) = &statement.value else {
            panic!("expected function literal");
        };
        assert_eq!(function.arguments.len(), 2);
        assert_eq!(
            function.argument_types[0].as_ref().map(|t| t.text()),
            Some("int".into())
        );
        assert!(function.argument_types[1].is_none());
        assert_eq!(function.return_type.as_ref().map(|t| t.text()), Some("int".into()));
    }

    #[test]
    fn type_literal_members() {
        let program = parse_ok(
            "type P { let n: int = 0; fn construct(v: int) { this.n = v; } fn destruct() { print(1); } };",
        );
        let Statement::Expression(statement) = &program.statements[0] else {
            panic!();
        };
        let Expression::TypeLiteral(literal) = &statement.expression else {
            panic!("expected type literal, got {:?}", statement.expression.text());
        };
        assert_eq!(literal.name, "P");
        assert_eq!(literal.members.len(), 3);
        assert_eq!(literal.members[0].name.value, "n");
        assert_eq!(literal.members[1].name.value, "construct");
        assert_eq!(literal.members[2].name.value, "destruct");
    }

    #[test]
    fn try_except_with_type() {
        let program = parse_ok("try { risky(); } except (e : error) { print(e); }");
        let Statement::TryExcept(statement) = &program.statements[0] else {
            panic!();
        };
        assert_eq!(statement.name.value, "e");
        assert_eq!(
            statement.error_type.as_ref().map(|t| t.text()),
            Some("error".into())
        );
    }

    #[test]
    fn import_paths() {
        let program = parse_ok("import a::b::c;");
        let Statement::Import(statement) = &program.statements[0] else {
            panic!();
        };
        assert_eq!(statement.path, vec!["a", "b", "c"]);
    }

    #[test]
    fn for_with_const_and_type() {
        let program = parse_ok("for (const x : int in [1,2]) { print(x); }");
        let Statement::Expression(statement) = &program.statements[0] else {
            panic!();
        };
        let Expression::For(for_expression) = &statement.expression else {
            panic!();
        };
        assert!(for_expression.constant);
        assert_eq!(
            for_expression.iter_type.as_ref().map(|t| t.text()),
            Some("int".into())
        );
    }

    #[test]
    fn type_expression_shapes() {
        let cases = [
            ("let a : [double] = [1.0];", "[double]"),
            ("let a : {str:int} = {};", "{str:int}"),
            ("let a : {int} = {1};", "{int}"),
            ("let a : fn(int,str) -> bool = f;", "fn(int,str) -> bool"),
            ("let a : <int,null> = null;", "<int,null>"),
        ];
        for (source, expected) in cases {
            let (program, errors) = parse_source(source, "");
            assert!(errors.is_empty(), "{source}: {errors:?}");
            let Statement::Let(statement) = &program.statements[0] else {
                panic!();
            };
            assert_eq!(
                statement.declared_type.as_ref().map(|t| t.text()),
                Some(expected.to_string()),
                "{source}"
            );
        }
    }

    #[test]
    fn parse_errors_recover_per_statement() {
        let (program, errors) = parse_source("let = 5; let x = 2;", "");
        assert!(!errors.is_empty());
        assert!(!program.statements.is_empty());
    }

    #[test]
    fn round_trip_text_reparses() {
        let source = "let a = [3, 1, 2]; if (a < b) { let c = 1; } else { d(); } while (x) { break; }";
        let program = parse_ok(source);
        let rendered = program.text();
        let (reparsed, errors) = parse_source(&rendered, "");
        assert!(errors.is_empty(), "re-parse failed: {errors:?}\n{rendered}");
        assert_eq!(reparsed.text(), rendered);
    }
}
