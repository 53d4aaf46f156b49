//! Type expressions: compatibility, inference and merging.
//!
//! The compatibility relation reads "a value of declared form T fits where
//! U is required" and is structural; choice types are kept canonical
//! (alphabetically ordered by rendered text, de-duplicated) so merged
//! types compare by text.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use crate::ast::{BlockStatement, Expression, Statement, TypeExpression};
use crate::lexer::Lexer;
use crate::object::{ObjectKind, ObjectRef, Tag};
use crate::parser::Parser;
use crate::token::Token;

/// Lexical scope for ahead-of-time inference; mirrors the runtime
/// environment chain.
pub struct AnalysisContext {
    bindings: RefCell<HashMap<String, Arc<TypeExpression>>>,
    outer: Option<Rc<AnalysisContext>>,
}

impl AnalysisContext {
    #[must_use]
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            bindings: RefCell::new(HashMap::new()),
            outer: None,
        })
    }

    #[must_use]
    pub fn nested(outer: &Rc<Self>) -> Rc<Self> {
        Rc::new(Self {
            bindings: RefCell::new(HashMap::new()),
            outer: Some(outer.clone()),
        })
    }

    pub fn record(&self, name: &str, ty: Arc<TypeExpression>) {
        self.bindings.borrow_mut().insert(name.to_string(), ty);
    }

    #[must_use]
    pub fn find(&self, name: &str) -> Option<Arc<TypeExpression>> {
        if let Some(ty) = self.bindings.borrow().get(name) {
            return Some(ty.clone());
        }
        self.outer.as_ref().and_then(|outer| outer.find(name))
    }
}

fn identifier_type(name: &str) -> Arc<TypeExpression> {
    Arc::new(TypeExpression::Identifier {
        token: Token::synthetic(crate::token::TokenKind::Ident, name),
        value: name.to_string(),
    })
}

fn all_type() -> Arc<TypeExpression> {
    Arc::new(TypeExpression::All {
        token: Token::synthetic(crate::token::TokenKind::All, "all"),
    })
}

fn array_type(element: Arc<TypeExpression>) -> Arc<TypeExpression> {
    Arc::new(TypeExpression::Array {
        token: Token::synthetic(crate::token::TokenKind::Lbracket, "["),
        element,
    })
}

/// Flattens choices, sorts the alternatives alphabetically by rendered
/// text and drops duplicates; a single survivor collapses to itself.
#[must_use]
pub fn canonical_choice(choices: Vec<Arc<TypeExpression>>) -> Arc<TypeExpression> {
    let mut flat: Vec<Arc<TypeExpression>> = vec![];
    for choice in choices {
        match choice.as_ref() {
            TypeExpression::Choice { choices, .. } => flat.extend(choices.iter().cloned()),
            _ => flat.push(choice),
        }
    }
    flat.sort_by(|a, b| a.text().cmp(&b.text()));
    flat.dedup_by(|a, b| a.text() == b.text());
    if flat.len() == 1 {
        return flat.remove(0);
    }
    Arc::new(TypeExpression::Choice {
        token: Token::synthetic(crate::token::TokenKind::Lt, "<"),
        choices: flat,
    })
}

/// Merges two inferred types into a canonical choice, collapsing when one
/// side is missing or both render identically.
#[must_use]
pub fn merge_types(
    a: Option<Arc<TypeExpression>>,
    b: Option<Arc<TypeExpression>>,
) -> Option<Arc<TypeExpression>> {
    match (a, b) {
        (None, b) => b,
        (a, None) => a,
        (Some(a), Some(b)) => {
            if a.text() == b.text() {
                Some(a)
            } else {
                Some(canonical_choice(vec![a, b]))
            }
        }
    }
}

/// `is_compatible(T, U)`: a value of declared form T fits where U is
/// required.
#[must_use]
pub fn is_compatible(a: Option<&Arc<TypeExpression>>, b: Option<&Arc<TypeExpression>>) -> bool {
    let Some(a) = a else {
        return b.is_none() || matches!(b.map(AsRef::as_ref), Some(TypeExpression::All { .. }));
    };
    if matches!(a.as_ref(), TypeExpression::Any { .. }) {
        return true;
    }
    let Some(b) = b else {
        return false;
    };

    if let TypeExpression::Choice { choices, .. } = a.as_ref() {
        return choices.iter().all(|choice| is_compatible(Some(choice), Some(b)));
    }

    match b.as_ref() {
        TypeExpression::All { .. } => true,
        TypeExpression::Any { .. } => !matches!(a.as_ref(), TypeExpression::All { .. }),
        TypeExpression::Null { .. } => matches!(a.as_ref(), TypeExpression::Null { .. }),
        TypeExpression::Identifier { value: expected, .. } => match a.as_ref() {
            TypeExpression::Identifier { value, .. } => value == expected,
            _ => false,
        },
        TypeExpression::Choice { choices, .. } => choices
            .iter()
            .any(|choice| is_compatible(Some(a), Some(choice))),
        TypeExpression::Array { element: expected, .. } => match a.as_ref() {
            TypeExpression::Array { element, .. } => is_compatible(Some(element), Some(expected)),
            _ => false,
        },
        TypeExpression::Dictionary {
            key: expected_key,
            value: expected_value,
            ..
        } => match a.as_ref() {
            TypeExpression::Dictionary { key, value, .. } => {
                is_compatible(Some(key), Some(expected_key))
                    && is_compatible(Some(value), Some(expected_value))
            }
            _ => false,
        },
        TypeExpression::Set { element: expected, .. } => match a.as_ref() {
            TypeExpression::Set { element, .. } => is_compatible(Some(element), Some(expected)),
            _ => false,
        },
        TypeExpression::Function {
            arguments: expected_arguments,
            ret: expected_ret,
            ..
        } => match a.as_ref() {
            TypeExpression::Function { arguments, ret, .. } => {
                arguments.len() == expected_arguments.len()
                    && is_compatible(ret.as_ref(), expected_ret.as_ref())
                    && arguments
                        .iter()
                        .zip(expected_arguments.iter())
                        .all(|(have, want)| is_compatible(have.as_ref(), want.as_ref()))
            }
            _ => false,
        },
        TypeExpression::UserType { name: expected, .. } => match a.as_ref() {
            TypeExpression::UserType { name, .. } => name == expected,
            _ => false,
        },
        TypeExpression::Bound { .. } => a.text() == b.text(),
    }
}

fn identifier_matches_tag(name: &str, tag: Tag) -> bool {
    matches!(
        (name, tag),
        ("null", Tag::Null)
            | ("int", Tag::Integer)
            | ("double", Tag::Double)
            | ("complex", Tag::Complex)
            | ("bool", Tag::Boolean)
            | ("str", Tag::String)
            | ("error", Tag::Error)
            | ("io", Tag::IOObject)
            | ("module", Tag::Module)
            | ("thread", Tag::Thread)
            | ("regex", Tag::Regex)
            | ("range", Tag::Range)
            | ("freezer", Tag::Freezer)
    )
}

/// Compatibility of a runtime value with a declared type. `existing` is
/// the value currently bound at the site: an `any` declaration pins the
/// type computed from it, so later assignments must preserve that type.
#[must_use]
pub fn is_compatible_value(
    ty: Option<&Arc<TypeExpression>>,
    object: &ObjectRef,
    existing: Option<&ObjectRef>,
) -> bool {
    let Some(ty) = ty else {
        return true;
    };
    match ty.as_ref() {
        TypeExpression::All { .. } => true,
        TypeExpression::Any { .. } => match existing {
            None => true,
            Some(existing) => {
                let pinned = compute_type_of_value(existing);
                is_compatible_value(pinned.as_ref(), object, None)
            }
        },
        TypeExpression::Null { .. } => tag_matches(object, Tag::Null),
        TypeExpression::Identifier { value, .. } => {
            let tag = object.borrow().tag();
            if identifier_matches_tag(value, tag) {
                return true;
            }
            // a user-defined type name matches its instances
            if let ObjectKind::UserObject(instance) = &object.borrow().kind {
                return instance.user_type.name == *value;
            }
            false
        }
        TypeExpression::Choice { choices, .. } => choices
            .iter()
            .any(|choice| is_compatible_value(Some(choice), object, existing)),
        TypeExpression::Array { element, .. } => match &object.borrow().kind {
            ObjectKind::Array(items) => items
                .iter()
                .all(|item| is_compatible_value(Some(element), item, None)),
            ObjectKind::ArrayDouble(_) => {
                matches!(element.as_ref(), TypeExpression::Identifier { value, .. } if value == "double")
            }
            ObjectKind::ArrayComplex(_) => {
                matches!(element.as_ref(), TypeExpression::Identifier { value, .. } if value == "complex")
            }
            _ => false,
        },
        TypeExpression::Dictionary { key, value, .. } => match &object.borrow().kind {
            ObjectKind::Dictionary(map) => map.iter().all(|(map_key, map_value)| {
                is_compatible_value(Some(key), &map_key.0, None)
                    && is_compatible_value(Some(value), map_value, None)
            }),
            _ => false,
        },
        TypeExpression::Set { element, .. } => match &object.borrow().kind {
            ObjectKind::Set(set) => set
                .iter()
                .all(|key| is_compatible_value(Some(element), &key.0, None)),
            _ => false,
        },
        TypeExpression::Function { arguments, ret, .. } => match &object.borrow().kind {
            ObjectKind::Function(function) => {
                arguments.len() == function.argument_types.len()
                    && is_compatible(function.return_type.as_ref(), ret.as_ref())
                    && function
                        .argument_types
                        .iter()
                        .zip(arguments.iter())
                        .all(|(have, want)| is_compatible(have.as_ref(), want.as_ref()))
            }
            ObjectKind::Builtin(builtin) => {
                is_compatible(Some(&builtin.declared_type), Some(ty))
            }
            _ => false,
        },
        TypeExpression::UserType { name, .. } => match &object.borrow().kind {
            ObjectKind::UserType(user_type) => user_type.name == *name,
            _ => false,
        },
        TypeExpression::Bound { bound, .. } => is_compatible_value(Some(bound), object, existing),
    }
}

fn tag_matches(object: &ObjectRef, tag: Tag) -> bool {
    object.borrow().tag() == tag
}

/// The most specific type expression describing a runtime value. Values
/// that carry a declared type report that.
#[must_use]
pub fn compute_type_of_value(object: &ObjectRef) -> Option<Arc<TypeExpression>> {
    if let Some(declared) = &object.borrow().declared_type {
        return Some(declared.clone());
    }
    let object = object.borrow();
    match &object.kind {
        ObjectKind::Null => Some(identifier_type("null")),
        ObjectKind::Integer(_) => Some(identifier_type("int")),
        ObjectKind::Double(_) => Some(identifier_type("double")),
        ObjectKind::Complex(_) => Some(identifier_type("complex")),
        ObjectKind::Boolean(_) => Some(identifier_type("bool")),
        ObjectKind::Char(_) => Some(identifier_type("char")),
        ObjectKind::Str(_) => Some(identifier_type("str")),
        ObjectKind::Error(_) => Some(identifier_type("error")),
        ObjectKind::IOObject(_) => Some(identifier_type("io")),
        ObjectKind::Module(_) => Some(identifier_type("module")),
        ObjectKind::Thread(_) => Some(identifier_type("thread")),
        ObjectKind::Regex(_) => Some(identifier_type("regex")),
        ObjectKind::Range(_) => Some(identifier_type("range")),
        ObjectKind::Freezer(_) => Some(identifier_type("freezer")),
        ObjectKind::Array(items) => {
            if items.is_empty() {
                return Some(array_type(all_type()));
            }
            let mut merged = None;
            for item in items {
                merged = merge_types(merged, compute_type_of_value(item));
            }
            Some(array_type(merged.unwrap_or_else(all_type)))
        }
        ObjectKind::ArrayDouble(_) => Some(array_type(identifier_type("double"))),
        ObjectKind::ArrayComplex(_) => Some(array_type(identifier_type("complex"))),
        ObjectKind::Dictionary(map) => {
            let mut key_type = None;
            let mut value_type = None;
            for (key, value) in map {
                key_type = merge_types(key_type, compute_type_of_value(&key.0));
                value_type = merge_types(value_type, compute_type_of_value(value));
            }
            Some(Arc::new(TypeExpression::Dictionary {
                token: Token::synthetic(crate::token::TokenKind::Lbrace, "{"),
                key: key_type.unwrap_or_else(all_type),
                value: value_type.unwrap_or_else(all_type),
            }))
        }
        ObjectKind::Set(set) => {
            let mut element = None;
            for key in set {
                element = merge_types(element, compute_type_of_value(&key.0));
            }
            Some(Arc::new(TypeExpression::Set {
                token: Token::synthetic(crate::token::TokenKind::Lbrace, "{"),
                element: element.unwrap_or_else(all_type),
            }))
        }
        ObjectKind::Function(function) => Some(Arc::new(TypeExpression::Function {
            token: Token::synthetic(crate::token::TokenKind::Function, "fn"),
            arguments: function.argument_types.clone(),
            ret: function.return_type.clone(),
        })),
        ObjectKind::Builtin(builtin) => Some(builtin.declared_type.clone()),
        ObjectKind::UserType(user_type) => Some(Arc::new(TypeExpression::UserType {
            token: Token::synthetic(crate::token::TokenKind::Type, "type"),
            name: user_type.name.clone(),
        })),
        ObjectKind::UserObject(instance) => Some(identifier_type(&instance.user_type.name)),
        ObjectKind::BoundUserTypeFunction(bound) => {
            let function = &bound.function;
            let function_type = Arc::new(TypeExpression::Function {
                token: Token::synthetic(crate::token::TokenKind::Function, "fn"),
                arguments: function.argument_types.clone(),
                ret: function.return_type.clone(),
            });
            let bound_to = compute_type_of_value(&bound.receiver)?;
            Some(Arc::new(TypeExpression::Bound {
                token: Token::synthetic(crate::token::TokenKind::Dot, "."),
                bound_to,
                bound: function_type,
            }))
        }
        ObjectKind::BoundBuiltinTypeFunction(bound) => {
            let bound_to = compute_type_of_value(&bound.receiver)?;
            Some(Arc::new(TypeExpression::Bound {
                token: Token::synthetic(crate::token::TokenKind::Dot, "."),
                bound_to,
                bound: bound.method.declared_type.clone(),
            }))
        }
        ObjectKind::BoundUserTypeProperty(bound) | ObjectKind::BoundBuiltinTypeProperty(bound) => {
            let value = bound.slot.borrow().value.clone();
            compute_type_of_value(&value)
        }
        ObjectKind::Iterator(_) => None,
    }
}

/// Infers the most specific type an expression would evaluate to, without
/// evaluating it.
#[must_use]
pub fn compute_type(expression: &Expression, context: &Rc<AnalysisContext>) -> Option<Arc<TypeExpression>> {
    match expression {
        Expression::Boolean { .. } => Some(identifier_type("bool")),
        Expression::Integer { .. } => Some(identifier_type("int")),
        Expression::Double { .. } => Some(identifier_type("double")),
        Expression::Complex { .. } => Some(identifier_type("complex")),
        Expression::Str { .. } => Some(identifier_type("str")),
        Expression::Null { .. } => Some(Arc::new(TypeExpression::Null {
            token: Token::synthetic(crate::token::TokenKind::Null, "null"),
        })),
        Expression::Range { .. } => Some(identifier_type("range")),
        Expression::Identifier(identifier) => context.find(&identifier.value),
        Expression::Array { elements, .. } => {
            if elements.is_empty() {
                return Some(array_type(all_type()));
            }
            let mut merged = None;
            for element in elements {
                merged = merge_types(merged, compute_type(element, context));
            }
            Some(array_type(merged.unwrap_or_else(all_type)))
        }
        Expression::ArrayDouble { .. } => Some(array_type(identifier_type("double"))),
        Expression::ArrayComplex { .. } => Some(array_type(identifier_type("complex"))),
        Expression::Dict { pairs, .. } => {
            let mut key_type = None;
            let mut value_type = None;
            for (key, value) in pairs {
                key_type = merge_types(key_type, compute_type(key, context));
                value_type = merge_types(value_type, compute_type(value, context));
            }
            Some(Arc::new(TypeExpression::Dictionary {
                token: Token::synthetic(crate::token::TokenKind::Lbrace, "{"),
                key: key_type.unwrap_or_else(all_type),
                value: value_type.unwrap_or_else(all_type),
            }))
        }
        Expression::Set { elements, .. } => {
            let mut element = None;
            for item in elements {
                element = merge_types(element, compute_type(item, context));
            }
            Some(Arc::new(TypeExpression::Set {
                token: Token::synthetic(crate::token::TokenKind::Lbrace, "{"),
                element: element.unwrap_or_else(all_type),
            }))
        }
        Expression::Function(function) => Some(Arc::new(TypeExpression::Function {
            token: Token::synthetic(crate::token::TokenKind::Function, "fn"),
            arguments: function.argument_types.clone(),
            ret: function.return_type.clone(),
        })),
        Expression::Call { function, .. } => {
            let function_type = compute_type(function, context)?;
            match function_type.as_ref() {
                TypeExpression::Function { ret, .. } => ret.clone(),
                TypeExpression::Bound { bound, .. } => match bound.as_ref() {
                    TypeExpression::Function { ret, .. } => ret.clone(),
                    _ => None,
                },
                _ => None,
            }
        }
        Expression::Index { expression, .. } => {
            let target = compute_type(expression, context)?;
            compute_indexed_type(&target)
        }
        Expression::Infix {
            operator,
            left,
            right,
            ..
        } => {
            use crate::token::TokenKind;
            let left_type = compute_type(left, context);
            let right_type = compute_type(right, context);
            let same = match (&left_type, &right_type) {
                (Some(a), Some(b)) => a.text() == b.text(),
                _ => false,
            };
            match operator.kind {
                TokenKind::Plus
                | TokenKind::Minus
                | TokenKind::Slash
                | TokenKind::Asterisk
                | TokenKind::DoubleAsterisk
                | TokenKind::PlusAssign
                | TokenKind::MinusAssign
                | TokenKind::SlashAssign
                | TokenKind::AsteriskAssign => {
                    if same {
                        left_type
                    } else {
                        None
                    }
                }
                TokenKind::Percent => {
                    if same && left_type.as_ref().is_some_and(|ty| ty.text() == "int") {
                        left_type
                    } else {
                        None
                    }
                }
                TokenKind::Eq
                | TokenKind::NotEq
                | TokenKind::LtEq
                | TokenKind::GtEq
                | TokenKind::Lt
                | TokenKind::Gt => {
                    if same {
                        Some(identifier_type("bool"))
                    } else {
                        None
                    }
                }
                TokenKind::DoublePipe | TokenKind::DoubleAmpersand => {
                    if same && left_type.as_ref().is_some_and(|ty| ty.text() == "bool") {
                        Some(identifier_type("bool"))
                    } else {
                        None
                    }
                }
                _ => None,
            }
        }
        Expression::Prefix { operator, right, .. } => match operator.kind {
            crate::token::TokenKind::Bang => Some(identifier_type("bool")),
            crate::token::TokenKind::Minus => compute_type(right, context),
            _ => None,
        },
        _ => None,
    }
}

/// The element type obtained when indexing into a value of the given
/// type; `range` indexing yields `int`.
#[must_use]
pub fn compute_indexed_type(ty: &Arc<TypeExpression>) -> Option<Arc<TypeExpression>> {
    match ty.as_ref() {
        TypeExpression::Array { element, .. } | TypeExpression::Set { element, .. } => {
            Some(element.clone())
        }
        TypeExpression::Dictionary { value, .. } => Some(value.clone()),
        TypeExpression::Identifier { value, .. } if value == "range" => {
            Some(identifier_type("int"))
        }
        TypeExpression::Identifier { value, .. } if value == "str" => Some(identifier_type("str")),
        _ => None,
    }
}

/// Merges the types of all `return` paths in a block, recursing through
/// nested blocks and control constructs. With `implicit_return`, the
/// trailing expression statement (or `null` after a trailing `let`) also
/// contributes.
#[must_use]
pub fn compute_return_type(
    block: &BlockStatement,
    context: &Rc<AnalysisContext>,
    implicit_return: bool,
) -> Option<Arc<TypeExpression>> {
    let mut return_type = None;
    for statement in &block.statements {
        match statement {
            Statement::Return(ret) => {
                return_type = merge_types(return_type, compute_type(&ret.value, context));
            }
            Statement::Let(binding) => {
                if let Some(ty) = &binding.declared_type {
                    context.record(&binding.name.value, ty.clone());
                } else if let Some(ty) = compute_type(&binding.value, context) {
                    context.record(&binding.name.value, ty);
                }
            }
            Statement::Block(nested) | Statement::Scope(nested) => {
                let nested_context = AnalysisContext::nested(context);
                return_type = merge_types(
                    return_type,
                    compute_return_type(nested, &nested_context, false),
                );
            }
            Statement::TryExcept(statement) => {
                let body_context = AnalysisContext::nested(context);
                return_type = merge_types(
                    return_type,
                    compute_return_type(&statement.body, &body_context, false),
                );
                let handler_context = AnalysisContext::nested(context);
                handler_context.record(&statement.name.value, identifier_type("error"));
                return_type = merge_types(
                    return_type,
                    compute_return_type(&statement.handler, &handler_context, false),
                );
            }
            Statement::Expression(statement) => match &statement.expression {
                Expression::If(if_expression) => {
                    let consequence_context = AnalysisContext::nested(context);
                    return_type = merge_types(
                        return_type,
                        compute_return_type(&if_expression.consequence, &consequence_context, false),
                    );
                    if let Some(alternative) = &if_expression.alternative {
                        let alternative_context = AnalysisContext::nested(context);
                        return_type = merge_types(
                            return_type,
                            compute_return_type(alternative, &alternative_context, false),
                        );
                    }
                }
                Expression::For(for_expression) => {
                    let loop_context = AnalysisContext::nested(context);
                    if let Some(iterable_type) = compute_type(&for_expression.iterable, context) {
                        if let Some(element_type) = compute_indexed_type(&iterable_type) {
                            loop_context.record(&for_expression.name.value, element_type);
                        }
                    }
                    return_type = merge_types(
                        return_type,
                        compute_return_type(&for_expression.body, &loop_context, false),
                    );
                }
                Expression::While { body, .. } => {
                    let loop_context = AnalysisContext::nested(context);
                    return_type =
                        merge_types(return_type, compute_return_type(body, &loop_context, false));
                }
                _ => {}
            },
            _ => {}
        }
    }

    if !implicit_return {
        return return_type;
    }

    match block.statements.last() {
        Some(Statement::Expression(statement)) => {
            merge_types(return_type, compute_type(&statement.expression, context))
        }
        Some(Statement::Let(_)) => merge_types(
            return_type,
            Some(Arc::new(TypeExpression::Null {
                token: Token::synthetic(crate::token::TokenKind::Null, "null"),
            })),
        ),
        _ => return_type,
    }
}

/// Builds a declared function type from comma-separated argument and
/// return type strings, e.g. `make_function_type("int,int", "null")` gives
/// `fn(int,int) -> null`. Used to declare builtin signatures.
#[must_use]
pub fn make_function_type(argument_types: &str, return_type: &str) -> Arc<TypeExpression> {
    parse_type(&format!("fn({argument_types}) -> {return_type}"))
}

/// Parses a type expression from its text rendering; falls back to `all`.
#[must_use]
pub fn parse_type(text: &str) -> Arc<TypeExpression> {
    let mut parser = Parser::new(Lexer::new(text, ""));
    parser.parse_type_expression().unwrap_or_else(all_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{alloc, integer_obj, string_obj, ObjectKind};

    fn ty(text: &str) -> Arc<TypeExpression> {
        let mut parser = Parser::new(Lexer::new(text, ""));
        parser.parse_type_expression().expect("type parses")
    }

    #[test]
    fn compatibility_table() {
        // (T, U, expected) — T fits where U is required
        let cases = [
            ("any", "any", true),
            ("any", "double", true),
            ("double", "all", true),
            ("all", "any", false),
            ("null", "null", true),
            ("int", "int", true),
            ("int", "double", false),
            ("double", "<double,int>", true),
            ("<double,int>", "<double,int>", true),
            ("<double,int>", "double", false),
            ("[int]", "[int]", true),
            ("[int]", "[double]", false),
            ("{str:int}", "{str:int}", true),
            ("{str:int}", "{str:double}", false),
            ("{int}", "{int}", true),
            ("fn(int) -> bool", "fn(int) -> bool", true),
            ("fn(int) -> bool", "fn(int,int) -> bool", false),
        ];
        for (a, b, expected) in cases {
            assert_eq!(
                is_compatible(Some(&ty(a)), Some(&ty(b))),
                expected,
                "{a} vs {b}"
            );
        }
    }

    #[test]
    fn choice_types_are_canonical() {
        let merged = merge_types(Some(ty("str")), Some(ty("int"))).expect("merged");
        assert_eq!(merged.text(), "<int,str>");
        let merged = merge_types(Some(merged), Some(ty("int"))).expect("merged");
        assert_eq!(merged.text(), "<int,str>");
    }

    #[test]
    fn any_pins_existing_value_type() {
        let declared = ty("any");
        let existing = integer_obj(3);
        let replacement_int = integer_obj(5);
        let replacement_str = string_obj("x");
        assert!(is_compatible_value(
            Some(&declared),
            &replacement_int,
            Some(&existing)
        ));
        assert!(!is_compatible_value(
            Some(&declared),
            &replacement_str,
            Some(&existing)
        ));
    }

    #[test]
    fn value_compatibility_for_containers() {
        let declared = ty("[double]");
        let dense = alloc(ObjectKind::ArrayDouble(vec![1.0, 2.0]));
        assert!(is_compatible_value(Some(&declared), &dense, None));

        let generic = alloc(ObjectKind::Array(vec![integer_obj(1)]));
        assert!(!is_compatible_value(Some(&declared), &generic, None));
        assert!(is_compatible_value(Some(&ty("[int]")), &generic, None));
    }

    #[test]
    fn empty_array_value_types_as_all_elements() {
        let empty = alloc(ObjectKind::Array(vec![]));
        assert_eq!(
            compute_type_of_value(&empty).map(|t| t.text()),
            Some("[all]".to_string())
        );
    }

    #[test]
    fn function_type_builder() {
        assert_eq!(make_function_type("int,int", "null").text(), "fn(int,int) -> null");
        assert_eq!(make_function_type("", "str").text(), "fn() -> str");
        assert_eq!(
            make_function_type("<[all],{all:all},str>", "int").text(),
            "fn(<[all],{all:all},str>) -> int"
        );
    }

    #[test]
    fn return_type_over_branches() {
        let (program, errors) = crate::parser::parse_source(
            "if (x) { return 1; } else { return \"s\"; } return 2;",
            "",
        );
        assert!(errors.is_empty());
        let block = BlockStatement {
            token: Token::synthetic(crate::token::TokenKind::Lbrace, "{"),
            statements: program.statements,
        };
        let context = AnalysisContext::new();
        let merged = compute_return_type(&block, &context, false).expect("type");
        assert_eq!(merged.text(), "<int,str>");
    }
}
