//! Builtin module surface: math, json, regex, error_type, typing,
//! threading, time.

use luci::{run_source, CollectStringPrint, Outcome};
use pretty_assertions::assert_eq;

fn run_ok(source: &str) -> String {
    let mut writer = CollectStringPrint::new();
    match run_source(source, "", &mut writer) {
        Outcome::Value(_) => writer.into_output(),
        other => panic!("expected success for {source:?}, got {other:?}"),
    }
}

#[test]
fn math_functions() {
    assert_eq!(run_ok("import math; print(math::sqrt(4.0));"), "2.000000\n");
    assert_eq!(run_ok("import math; print(math.abs(-1.5));"), "1.500000\n");
    assert_eq!(run_ok("import math; print(math::pow(2.0, 10.0));"), "1024.000000\n");
    assert_eq!(run_ok("import math; print(math::round(1.4));"), "1.000000\n");
}

#[test]
fn error_type_constants() {
    assert_eq!(run_ok("import error_type; print(error_type::value_error);"), "5\n");
    assert_eq!(run_ok("import error_type; print(error_type::undefined_error);"), "0\n");
    assert_eq!(run_ok("import error_type; print(error_type::os_error);"), "10\n");
}

#[test]
fn error_codes_match_caught_errors() {
    let source = "import error_type; try { 1/0; } except (e) { print(e.error_type() == error_type::value_error); }";
    assert_eq!(run_ok(source), "true\n");
}

#[test]
fn json_round_trip() {
    let source = "import json; let d = {\"a\": 1, \"b\": [1.5, true, null]}; print(json::load(json::dump(d)) == d);";
    assert_eq!(run_ok(source), "true\n");
}

#[test]
fn json_dump_renders_in_insertion_order() {
    assert_eq!(
        run_ok("import json; print(json::dump({\"x\": 1, \"y\": \"s\"}));"),
        "{\"x\":1,\"y\":\"s\"}\n"
    );
}

#[test]
fn json_load_scalars() {
    assert_eq!(run_ok("import json; print(json::load(\"42\"));"), "42\n");
    assert_eq!(run_ok("import json; print(json::load(\"[1, 2]\"));"), "[1, 2]\n");
}

#[test]
fn regex_search_match_replace() {
    assert_eq!(
        run_ok("import regex; let r = regex::regex(\"a+\"); print(regex::search(r, \"baaad\")[0]);"),
        "aaa\n"
    );
    assert_eq!(
        run_ok("import regex; let r = regex::regex(\"b+\"); print(regex::match(r, \"aaa\") == null);"),
        "true\n"
    );
    assert_eq!(
        run_ok("import regex; let r = regex::regex(\"a+\"); print(regex::match(r, \"aaa\")[0]);"),
        "aaa\n"
    );
    assert_eq!(
        run_ok("import regex; let r = regex::regex(\"l+\"); print(regex::replace(r, \"hello\", \"L\"));"),
        "heLo\n"
    );
}

#[test]
fn regex_capture_groups() {
    assert_eq!(
        run_ok(
            "import regex; let r = regex::regex(\"(a+)(b+)\"); print(regex::search(r, \"xaabbx\")[2]);"
        ),
        "bb\n"
    );
}

#[test]
fn typing_compatibility_queries() {
    assert_eq!(
        run_ok("import typing; print(typing::is_compatible_type_str(\"int\", \"<int,str>\"));"),
        "true\n"
    );
    assert_eq!(
        run_ok("import typing; print(typing::is_compatible_type_str(\"all\", \"any\"));"),
        "false\n"
    );
}

#[test]
fn threads_run_and_return_values() {
    let source = "import threading; let t = threading::thread(fn() { return 41 + 1; }); t.start(); t.join(); print(t.value());";
    assert_eq!(run_ok(source), "42\n");
}

#[test]
fn threads_receive_their_argument() {
    let source = "import threading; let t = threading::thread(fn(x) { return x * 2; }, 21); t.start(); t.join(); print(t.value());";
    assert_eq!(run_ok(source), "42\n");
}

#[test]
fn thread_joinable_reflects_state() {
    let source = "import threading; let t = threading::thread(fn() { return 0; }); print(t.joinable()); t.start(); print(t.joinable()); t.join(); print(t.joinable());";
    assert_eq!(run_ok(source), "false\ntrue\nfalse\n");
}

#[test]
fn time_is_a_positive_double() {
    assert_eq!(run_ok("import time; print(time::time() > 0.0);"), "true\n");
}

#[test]
fn threading_sleep_accepts_zero() {
    assert_eq!(run_ok("import threading; threading::sleep(0.0); print(1);"), "1\n");
}

#[test]
fn reimporting_a_loaded_module_is_a_no_op() {
    assert_eq!(run_ok("import math; import math; print(math::abs(-1.0));"), "1.000000\n");
}
