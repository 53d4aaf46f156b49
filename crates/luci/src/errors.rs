//! The error taxonomy and the value-propagation protocol.
//!
//! Errors are first-class language values; evaluation never unwinds the
//! host stack with panics. Evaluation results are `Result<ObjectRef, Flow>`
//! so that `?` propagates errors and control-flow carriers alike: loops
//! consume `Break`/`Continue`, calls consume `Return`, `try/except`
//! consumes `Error`, and an unconsumed `Exit` becomes the process exit
//! code.

use std::fmt;

use strum::{Display, EnumString, IntoStaticStr};

use crate::token::Token;

/// Error kinds, exported as integers from the `error_type` builtin module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
pub enum ErrorKind {
    UndefinedError,
    /// Wrong number of arguments, wrong argument or operand types.
    TypeError,
    /// Attempt to modify a binding marked as const.
    ConstError,
    IdentifierNotFound,
    IdentifierAlreadyExists,
    /// An operation produced an invalid value, e.g. division by zero.
    ValueError,
    /// A dictionary key is not present.
    KeyError,
    /// An index is out of range.
    IndexError,
    /// A module could not be located or evaluated.
    ImportError,
    /// Dynamically run source failed to parse.
    SyntaxError,
    /// Failures from the OS or the file system.
    OsError,
}

impl ErrorKind {
    /// The integer code exported by the `error_type` module.
    #[must_use]
    pub fn code(self) -> i64 {
        match self {
            Self::UndefinedError => 0,
            Self::TypeError => 1,
            Self::ConstError => 2,
            Self::IdentifierNotFound => 3,
            Self::IdentifierAlreadyExists => 4,
            Self::ValueError => 5,
            Self::KeyError => 6,
            Self::IndexError => 7,
            Self::ImportError => 8,
            Self::SyntaxError => 9,
            Self::OsError => 10,
        }
    }
}

/// A structured error value: kind, message and (optionally) the token it
/// originated at. The token is stamped by the first caller that has one.
#[derive(Debug, Clone)]
pub struct ErrorObj {
    pub kind: ErrorKind,
    pub message: String,
    pub token: Option<Token>,
}

impl ErrorObj {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            token: None,
        }
    }

    #[must_use]
    pub fn with_token(kind: ErrorKind, message: impl Into<String>, token: Token) -> Self {
        Self {
            kind,
            message: message.into(),
            token: Some(token),
        }
    }

    #[must_use]
    pub fn type_err(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeError, message)
    }

    #[must_use]
    pub fn value_err(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ValueError, message)
    }

    #[must_use]
    pub fn index_err(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::IndexError, message)
    }

    #[must_use]
    pub fn key_err(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::KeyError, message)
    }

    #[must_use]
    pub fn import_err(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ImportError, message)
    }

    #[must_use]
    pub fn os_err(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::OsError, message)
    }

    /// Stamps `token` onto the error if it does not carry one yet.
    #[must_use]
    pub fn stamped(mut self, token: &Token) -> Self {
        if self.token.is_none() {
            self.token = Some(token.clone());
        }
        self
    }
}

impl fmt::Display for ErrorObj {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.token {
            Some(token) => match &token.file {
                Some(file) if !file.is_empty() => write!(
                    f,
                    "Error({}) at {}({},{})",
                    self.message, file, token.line, token.column
                ),
                _ => write!(
                    f,
                    "Error({}) at ({},{})",
                    self.message, token.line, token.column
                ),
            },
            None => write!(f, "Error({}) at (0,0)", self.message),
        }
    }
}

/// Non-local results of evaluating a node. These bubble through statement
/// lists until the matching construct consumes them; they are never user
/// visible as values (with the exception of `Error`, which `try/except`
/// and `let` rebind as a first-class error value).
#[derive(Debug, Clone)]
pub enum Flow {
    Error(ErrorObj),
    Return(crate::object::ObjectRef),
    Break,
    Continue,
    Exit(i32),
}

impl From<ErrorObj> for Flow {
    fn from(error: ErrorObj) -> Self {
        Self::Error(error)
    }
}

/// Result alias used by every evaluation function.
pub type EvalResult = Result<crate::object::ObjectRef, Flow>;
