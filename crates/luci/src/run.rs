//! Parse-and-evaluate facade used by the CLI, embedders and the test
//! suite.

use crate::env::{EnvRef, Environment};
use crate::errors::{ErrorObj, Flow};
use crate::evaluator::Evaluator;
use crate::io::PrintWriter;
use crate::object::{inspect, ObjectRef, Tag};
use crate::parser::{parse_source, ParserError};

/// Terminal outcome of running a program.
#[derive(Debug)]
pub enum Outcome {
    /// Normal completion with the final value's rendering (empty for
    /// null).
    Value(String),
    /// The program produced parser errors and was not evaluated.
    ParseErrors(Vec<ParserError>),
    /// The program terminated with an error value.
    Error(ErrorObj),
    /// The program requested an explicit exit code.
    Exit(i32),
}

impl Outcome {
    /// Process exit code mapping: 0 on success, 1 on a program error, the
    /// explicit code for `exit(n)`.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Value(_) => 0,
            Self::ParseErrors(_) => 1,
            Self::Error(_) => 1,
            Self::Exit(code) => *code,
        }
    }
}

/// A runner owning the global environment, so the REPL can feed it
/// multiple inputs against persistent state.
pub struct Runner {
    global: EnvRef,
    program_args: Vec<String>,
}

impl Runner {
    #[must_use]
    pub fn new(program_args: Vec<String>) -> Self {
        Self {
            global: Environment::new(None),
            program_args,
        }
    }

    /// Runs one source text against the persistent global environment.
    pub fn run(&mut self, source: &str, file_name: &str, writer: &mut dyn PrintWriter) -> Outcome {
        let (program, errors) = parse_source(source, file_name);
        if !errors.is_empty() {
            return Outcome::ParseErrors(errors);
        }

        let mut evaluator = Evaluator::with_args(writer, self.program_args.clone());
        match evaluator.eval_program(&program, &self.global) {
            Ok(value) => Outcome::Value(render_result(&value)),
            Err(Flow::Error(error)) => Outcome::Error(error),
            Err(Flow::Exit(code)) => Outcome::Exit(code),
            Err(Flow::Return(value)) => Outcome::Value(render_result(&value)),
            Err(Flow::Break | Flow::Continue) => Outcome::Value(String::new()),
        }
    }
}

fn render_result(value: &ObjectRef) -> String {
    if value.borrow().tag() == Tag::Null {
        return String::new();
    }
    inspect(value)
}

/// Runs a complete source text in a fresh environment.
pub fn run_source(source: &str, file_name: &str, writer: &mut dyn PrintWriter) -> Outcome {
    run_source_with_args(source, file_name, writer, vec![])
}

/// Runs a source text with command-line arguments for `arg()`.
pub fn run_source_with_args(
    source: &str,
    file_name: &str,
    writer: &mut dyn PrintWriter,
    program_args: Vec<String>,
) -> Outcome {
    Runner::new(program_args).run(source, file_name, writer)
}

/// Reads and runs a file; an unreadable file is an `OsError` outcome.
pub fn run_file(path: &str, writer: &mut dyn PrintWriter, program_args: Vec<String>) -> Outcome {
    match std::fs::read_to_string(path) {
        Ok(source) => run_source_with_args(&source, path, writer, program_args),
        Err(error) => Outcome::Error(ErrorObj::os_err(format!("File {path} cannot be read: {error}"))),
    }
}

/// Evaluates a single value-producing snippet; a convenience for tests.
pub fn eval_snippet(source: &str, writer: &mut dyn PrintWriter) -> Outcome {
    run_source(source, "", writer)
}
