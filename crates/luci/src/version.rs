/// Interpreter version triple, exposed through the `version()` builtin.
pub const VERSION: (i64, i64, i64) = (0, 1, 0);
