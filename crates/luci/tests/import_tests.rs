//! File-backed module loading: `import a::b`, `run`, `run_once` and the
//! io builtins. File imports resolve against the working directory, so
//! the cwd-dependent sequences live in a single test.

use std::io::Write as _;

use luci::{run_source, CollectStringPrint, ErrorKind, Outcome};
use pretty_assertions::assert_eq;

fn run_ok(source: &str) -> String {
    let mut writer = CollectStringPrint::new();
    match run_source(source, "", &mut writer) {
        Outcome::Value(_) => writer.into_output(),
        other => panic!("expected success for {source:?}, got {other:?}"),
    }
}

fn run_error(source: &str) -> ErrorKind {
    let mut writer = CollectStringPrint::new();
    match run_source(source, "", &mut writer) {
        Outcome::Error(error) => error.kind,
        other => panic!("expected error for {source:?}, got {other:?}"),
    }
}

#[test]
fn run_executes_in_caller_scope() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("lib.luci");
    std::fs::write(&path, "let shared = 41;\n").expect("write");

    let source = format!("run(\"{}\"); print(shared + 1);", path.display());
    assert_eq!(run_ok(&source), "42\n");
}

#[test]
fn run_once_executes_only_once() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("counted.luci");
    std::fs::write(&path, "print(\"loaded\");\n").expect("write");

    let source = format!(
        "run_once(\"{0}\"); run_once(\"{0}\"); print(\"done\");",
        path.display()
    );
    assert_eq!(run_ok(&source), "loaded\ndone\n");
}

#[test]
fn run_of_missing_file_is_os_error() {
    assert_eq!(run_error("run(\"/no/such/file.luci\");"), ErrorKind::OsError);
}

#[test]
fn import_builtin_returns_a_module_value() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("answers.luci");
    std::fs::write(&path, "let answer = 42;\n").expect("write");

    let source = format!("let m = import(\"{}\"); print(m.answer);", path.display());
    assert_eq!(run_ok(&source), "42\n");
}

/// The `import a::b` statements resolve paths against the working
/// directory; everything cwd-dependent runs inside this one test.
#[test]
fn import_statements_resolve_against_cwd() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("alpha.luci"), "let value = 7;\n").expect("write");
    std::fs::create_dir(dir.path().join("pkg")).expect("mkdir");
    std::fs::write(dir.path().join("pkg/beta.luci"), "let value = 9;\n").expect("write");
    std::env::set_current_dir(dir.path()).expect("chdir");

    // plain import
    assert_eq!(run_ok("import alpha; print(alpha::value);"), "7\n");

    // nested import creates a Defined placeholder for the package segment
    assert_eq!(run_ok("import pkg::beta; print(pkg::beta::value);"), "9\n");

    // a missing module does not partially register its package
    let mut writer = CollectStringPrint::new();
    match run_source(
        "import pkg::missing; print(1);",
        "",
        &mut writer,
    ) {
        Outcome::Error(error) => assert_eq!(error.kind, ErrorKind::ImportError),
        other => panic!("expected import error, got {other:?}"),
    }
}

#[test]
fn io_write_then_read_round_trips() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("data.txt");
    {
        let mut file = std::fs::File::create(&path).expect("create");
        file.write_all(b"line one\nline two\n").expect("write");
    }

    let source = format!(
        "let f = open(\"{0}\", \"r\"); print(f.is_open()); print(f.read_line()); print(f.read_line()); f.close(); print(f.is_open());",
        path.display()
    );
    assert_eq!(run_ok(&source), "true\nline one\nline two\nfalse\n");
}

#[test]
fn io_write_mode_creates_content() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("out.txt");

    let source = format!(
        "let f = open(\"{0}\", \"w\"); f.write(\"payload\"); f.flush(); f.close();",
        path.display()
    );
    run_ok(&source);
    assert_eq!(std::fs::read_to_string(&path).expect("read"), "payload");
}

#[test]
fn io_read_lines_and_tell() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("lines.txt");
    std::fs::write(&path, "a\nb\nc\n").expect("write");

    let source = format!(
        "let f = open(\"{0}\"); print(f.tell()); print(f.read_lines());",
        path.display()
    );
    assert_eq!(run_ok(&source), "0\n[\"a\", \"b\", \"c\"]\n");
}

#[test]
fn open_with_bad_mode_is_refused() {
    assert_eq!(
        run_error("open(\"whatever\", \"rw\");"),
        ErrorKind::TypeError
    );
}
