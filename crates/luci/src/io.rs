//! Output capture for `print` and `eprint`.
//!
//! The evaluator writes program output through a [`PrintWriter`] rather
//! than to the process streams directly, so embedders and tests can collect
//! it. `StdPrint` is the default writer used by the CLI.

use std::io::Write as _;

/// Sink for the `print` (stdout) and `eprint` (stderr) builtins.
pub trait PrintWriter {
    fn write_out(&mut self, output: &str);
    fn write_err(&mut self, output: &str);
}

/// Writes to the real process streams.
#[derive(Debug, Default)]
pub struct StdPrint;

impl PrintWriter for StdPrint {
    fn write_out(&mut self, output: &str) {
        let mut stdout = std::io::stdout();
        let _ = stdout.write_all(output.as_bytes());
        let _ = stdout.flush();
    }

    fn write_err(&mut self, output: &str) {
        let mut stderr = std::io::stderr();
        let _ = stderr.write_all(output.as_bytes());
        let _ = stderr.flush();
    }
}

/// Collects all output into strings; the workhorse of the test suite.
#[derive(Debug, Default)]
pub struct CollectStringPrint {
    out: String,
    err: String,
}

impl CollectStringPrint {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn output(&self) -> &str {
        &self.out
    }

    #[must_use]
    pub fn error_output(&self) -> &str {
        &self.err
    }

    #[must_use]
    pub fn into_output(self) -> String {
        self.out
    }
}

impl PrintWriter for CollectStringPrint {
    fn write_out(&mut self, output: &str) {
        self.out.push_str(output);
    }

    fn write_err(&mut self, output: &str) {
        self.err.push_str(output);
    }
}

/// Ignores all output.
#[derive(Debug, Default)]
pub struct NoPrint;

impl PrintWriter for NoPrint {
    fn write_out(&mut self, _output: &str) {}

    fn write_err(&mut self, _output: &str) {}
}
