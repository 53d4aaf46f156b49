//! End-to-end evaluation tests: whole programs in, captured stdout and
//! terminal outcomes out.

use luci::{run_source, CollectStringPrint, ErrorKind, Outcome};
use pretty_assertions::assert_eq;

fn run_ok(source: &str) -> String {
    let mut writer = CollectStringPrint::new();
    let outcome = run_source(source, "", &mut writer);
    match outcome {
        Outcome::Value(_) => writer.into_output(),
        other => panic!("expected success for {source:?}, got {other:?}"),
    }
}

fn run_error(source: &str) -> (ErrorKind, String) {
    let mut writer = CollectStringPrint::new();
    match run_source(source, "", &mut writer) {
        Outcome::Error(error) => (error.kind, error.message),
        other => panic!("expected error for {source:?}, got {other:?}"),
    }
}

#[test]
fn arithmetic_and_precedence() {
    assert_eq!(run_ok("print(1 + 2 * 3);"), "7\n");
    assert_eq!(run_ok("print((1 + 2) * 3);"), "9\n");
    assert_eq!(run_ok("print(2 ** 10);"), "1024\n");
    assert_eq!(run_ok("print(7 % 3);"), "1\n");
    assert_eq!(run_ok("print(-5);"), "-5\n");
    assert_eq!(run_ok("print(10 / 3);"), "3\n");
}

#[test]
fn sort_prints_ordered_array() {
    // spec scenario 1
    assert_eq!(run_ok("let a = [3,1,2]; sort(a); print(a);"), "[1, 2, 3]\n");
}

#[test]
fn dict_len() {
    // spec scenario 2
    assert_eq!(run_ok("let d = {\"x\":1, \"y\":2}; print(len(d));"), "2\n");
}

#[test]
fn named_function_squares() {
    // spec scenario 3
    assert_eq!(
        run_ok("fn f(x:int) -> int { return x*x; } print(f(5));"),
        "25\n"
    );
}

#[test]
fn out_of_range_index_assignment_is_index_error() {
    // spec scenario 4
    let (kind, _) = run_error("let a = [1]; a[5] = 2;");
    assert_eq!(kind, ErrorKind::IndexError);
}

#[test]
fn any_declaration_pins_first_assigned_type() {
    // spec scenario 5
    let (kind, _) = run_error("let a:any = 3; a = \"x\";");
    assert_eq!(kind, ErrorKind::TypeError);
    // same-tag reassignment stays fine
    assert_eq!(run_ok("let a:any = 3; a = 5; print(a);"), "5\n");
}

#[test]
fn constructor_and_destructor_run() {
    // spec scenario 6
    let source = "type P { let n:int = 0; fn construct(v:int) { this.n = v; } fn destruct() { print(\"bye\"); } } { let p = P(7); print(p.n); }";
    assert_eq!(run_ok(source), "7\nbye\n");
}

#[test]
fn destructor_runs_per_loop_iteration() {
    let source = "type D { fn destruct() { print(\"d\"); } } for (i in range(0, 2)) { let x = D(); print(i); }";
    assert_eq!(run_ok(source), "0\nd\n1\nd\n");
}

#[test]
fn booleans_and_comparisons() {
    assert_eq!(run_ok("print(1 < 2);"), "true\n");
    assert_eq!(run_ok("print(1 == 1);"), "true\n");
    assert_eq!(run_ok("print(1 != 1);"), "false\n");
    assert_eq!(run_ok("print(true && false);"), "false\n");
    assert_eq!(run_ok("print(true || false);"), "true\n");
    assert_eq!(run_ok("print(!true);"), "false\n");
    assert_eq!(run_ok("print(\"a\" < \"b\");"), "true\n");
}

#[test]
fn equality_across_tags_is_false() {
    assert_eq!(run_ok("print(1 == \"1\");"), "false\n");
    assert_eq!(run_ok("print(1 != \"1\");"), "true\n");
    assert_eq!(run_ok("print(null == null);"), "true\n");
}

#[test]
fn string_concatenation() {
    assert_eq!(run_ok("print(\"foo\" + \"bar\");"), "foobar\n");
}

#[test]
fn division_by_zero_is_value_error() {
    let (kind, message) = run_error("1 / 0;");
    assert_eq!(kind, ErrorKind::ValueError);
    assert_eq!(message, "Division by 0");
}

#[test]
fn integer_power_negative_exponent_is_zero() {
    assert_eq!(run_ok("print(2 ** -1);"), "0\n");
}

#[test]
fn if_else_expression_values() {
    assert_eq!(run_ok("print(if (true) { 3 } else { 2 });"), "3\n");
    assert_eq!(run_ok("print(if (false) { 3 } else { 2 });"), "2\n");
    // non-zero integers are truthy, null is falsy
    assert_eq!(run_ok("print(if (5) { 1 } else { 0 });"), "1\n");
    assert_eq!(run_ok("print(if (null) { 1 } else { 0 });"), "0\n");
}

#[test]
fn while_with_break_and_continue() {
    let source = "let i = 0; while (i < 10) { i = i + 1; if (i == 3) { continue; } if (i == 5) { break; } print(i); }";
    assert_eq!(run_ok(source), "1\n2\n4\n");
}

#[test]
fn for_over_containers() {
    assert_eq!(run_ok("for (x in [1,2,3]) { print(x); }"), "1\n2\n3\n");
    assert_eq!(run_ok("for (x in range(0, 3)) { print(x); }"), "0\n1\n2\n");
    assert_eq!(run_ok("for (c in \"ab\") { print(c); }"), "a\nb\n");
    assert_eq!(
        run_ok("let d = {\"k\": 1}; for (key in d) { print(key); }"),
        "k\n"
    );
}

#[test]
fn for_with_continue_and_break() {
    let source = "for (x in [1,2,3,4,5]) { if (x == 2) { continue; } if (x == 4) { break; } print(x); }";
    assert_eq!(run_ok(source), "1\n3\n");
}

#[test]
fn range_of_zero_length_runs_zero_times() {
    assert_eq!(run_ok("for (x in range(0, 0)) { print(x); } print(\"done\");"), "done\n");
    assert_eq!(run_ok("print(len(range(0, 0)));"), "0\n");
}

#[test]
fn mutating_the_iterable_inside_the_loop_is_refused() {
    let (kind, _) = run_error("let a = [1,2,3]; for (x in a) { append(a, x); }");
    assert_eq!(kind, ErrorKind::TypeError);
}

#[test]
fn closures_capture_their_scope() {
    let source = "let make = fn(n) { return fn(x) { return x + n; }; }; let add2 = make(2); print(add2(40));";
    assert_eq!(run_ok(source), "42\n");
}

#[test]
fn recursion_through_named_literal() {
    let source = "fn fib(n: int) -> int { if (n < 2) { return n; } return fib(n - 1) + fib(n - 2); } print(fib(10));";
    assert_eq!(run_ok(source), "55\n");
}

#[test]
fn call_argument_type_mismatch() {
    let (kind, message) = run_error("fn f(x:int) -> int { return x; } f(\"s\");");
    assert_eq!(kind, ErrorKind::TypeError);
    assert!(message.contains("Incompatible type for argument 1"), "{message}");
}

#[test]
fn too_many_arguments_is_a_type_error() {
    let (kind, message) = run_error("fn f(x) { return x; } f(1, 2);");
    assert_eq!(kind, ErrorKind::TypeError);
    assert!(message.contains("Too many arguments"), "{message}");
}

#[test]
fn too_few_arguments_fail_at_lookup() {
    let (kind, _) = run_error("fn f(x) { return x; } f();");
    assert_eq!(kind, ErrorKind::IdentifierNotFound);
}

#[test]
fn return_type_mismatch() {
    let (kind, message) = run_error("fn f() -> int { return \"s\"; } f();");
    assert_eq!(kind, ErrorKind::TypeError);
    assert!(message.contains("Incompatible return type"), "{message}");
}

#[test]
fn const_binding_refuses_assignment() {
    let (kind, _) = run_error("let const a = 1; a = 2;");
    assert_eq!(kind, ErrorKind::ConstError);
}

#[test]
fn unknown_identifier() {
    let (kind, _) = run_error("print(nope);");
    assert_eq!(kind, ErrorKind::IdentifierNotFound);
}

#[test]
fn duplicate_binding_in_same_scope() {
    let (kind, _) = run_error("let a = 1; let a = 2;");
    assert_eq!(kind, ErrorKind::IdentifierAlreadyExists);
    // a fresh scope may shadow
    assert_eq!(run_ok("let a = 1; { let a = 2; print(a); } print(a);"), "2\n1\n");
}

#[test]
fn try_except_catches_and_binds() {
    let source = "try { 1 / 0; } except (e) { print(e.message()); print(e.error_type()); }";
    assert_eq!(run_ok(source), "Division by 0\n5\n");
}

#[test]
fn try_without_error_yields_try_value() {
    let mut writer = CollectStringPrint::new();
    match run_source("try { 41 + 1; } except (e) { 0; }", "", &mut writer) {
        Outcome::Value(rendered) => assert_eq!(rendered, "42"),
        other => panic!("expected value outcome, got {other:?}"),
    }
}

#[test]
fn error_values_are_first_class() {
    let source = "let e = error(\"boom\"); print(e.message()); print(e.error_type());";
    assert_eq!(run_ok(source), "boom\n0\n");
}

#[test]
fn compound_assignment() {
    assert_eq!(run_ok("let a = 1; a += 2; print(a);"), "3\n");
    assert_eq!(run_ok("let a = 10; a -= 2; a *= 3; a /= 4; print(a);"), "6\n");
    let (kind, _) = run_error("let a = 1; a += 1.5;");
    assert_eq!(kind, ErrorKind::TypeError);
}

#[test]
fn negative_indexing_wraps() {
    assert_eq!(run_ok("let a = [1,2,3]; print(a[-1]);"), "3\n");
    assert_eq!(run_ok("let a = [1,2,3]; print(a[-4]);"), "3\n");
    assert_eq!(run_ok("print(\"abc\"[-1]);"), "c\n");
}

#[test]
fn range_indexing_expands() {
    assert_eq!(run_ok("let a = [10,20,30]; print(a[range(0, 2)]);"), "[10, 20]\n");
    assert_eq!(run_ok("print(range(5, 8)[1]);"), "6\n");
}

#[test]
fn dict_index_and_assignment() {
    assert_eq!(
        run_ok("let d = {\"a\": 1}; d[\"b\"] = 2; print(d[\"b\"]); print(len(d));"),
        "2\n2\n"
    );
    let (kind, _) = run_error("let d = {\"a\": 1}; d[\"missing\"];");
    assert_eq!(kind, ErrorKind::KeyError);
}

#[test]
fn unhashable_dict_key_is_refused() {
    let (kind, _) = run_error("let d = {}; d[[1,2]] = 1;");
    assert_eq!(kind, ErrorKind::TypeError);
}

#[test]
fn frozen_array_can_key_a_dict() {
    let source =
        "let d = {}; let k = [1,2]; freeze(k); d[k] = \"v\"; print(len(d)); print(d[k]);";
    assert_eq!(run_ok(source), "1\nv\n");
}

#[test]
fn freeze_refuses_mutation_and_defrost_restores() {
    let (kind, _) = run_error("let a = [1]; freeze(a); append(a, 2);");
    assert_eq!(kind, ErrorKind::TypeError);
    assert_eq!(
        run_ok("let a = [1]; freeze(a); defrost(a); append(a, 2); print(a);"),
        "[1, 2]\n"
    );
    assert_eq!(
        run_ok("let a = [1]; print(frozen(a)); freeze(a); print(frozen(a)); defrost(a); print(frozen(a));"),
        "false\ntrue\nfalse\n"
    );
}

#[test]
fn frozen_index_assignment_is_refused() {
    let (kind, _) = run_error("let a = [1]; freeze(a); a[0] = 2;");
    assert_eq!(kind, ErrorKind::TypeError);
}

#[test]
fn clone_is_deep() {
    assert_eq!(
        run_ok("let a = [1,2]; let b = clone(a); append(b, 3); print(a); print(b);"),
        "[1, 2]\n[1, 2, 3]\n"
    );
    assert_eq!(
        run_ok("let a = [[1]]; let b = clone(a); append(b[0], 2); print(a); print(b);"),
        "[[1]]\n[[1, 2]]\n"
    );
}

#[test]
fn scalars_do_not_alias_on_assignment() {
    assert_eq!(run_ok("let a = 1; let b = a; b = 2; print(a); print(b);"), "1\n2\n");
}

#[test]
fn aggregates_alias_on_assignment() {
    assert_eq!(
        run_ok("let a = [1]; let b = a; append(b, 2); print(a);"),
        "[1, 2]\n"
    );
}

#[test]
fn sort_with_comparator_and_failure_safety() {
    assert_eq!(
        run_ok("let a = [1,3,2]; print(sort(a, fn(x, y) { return x > y; })); print(a);"),
        "true\n[3, 2, 1]\n"
    );
    // a comparator error leaves the data untouched and reports false
    assert_eq!(
        run_ok("let a = [3,1,2]; print(sort(a, fn(x, y) { return \"bad\"; })); print(a);"),
        "false\n[3, 1, 2]\n"
    );
}

#[test]
fn sorted_leaves_source_untouched() {
    assert_eq!(
        run_ok("let a = [3,1,2]; let b = sorted(a); print(a); print(b);"),
        "[3, 1, 2]\n[1, 2, 3]\n"
    );
}

#[test]
fn is_sorted_checks_order() {
    assert_eq!(run_ok("print(is_sorted([1,2,3]));"), "true\n");
    assert_eq!(run_ok("print(is_sorted([2,1,3]));"), "false\n");
}

#[test]
fn mixed_type_sort_without_comparator_fails_softly() {
    assert_eq!(
        run_ok("let a = [1, \"x\"]; print(sort(a)); print(a);"),
        "false\n[1, \"x\"]\n"
    );
}

#[test]
fn array_builtin_methods() {
    assert_eq!(run_ok("let a = [1,2,3]; print(a.size());"), "3\n");
    assert_eq!(run_ok("let a = [1,2]; a.push_back(3); print(a);"), "[1, 2, 3]\n");
    assert_eq!(run_ok("let a = [1,2,3]; a.pop_back(); print(a);"), "[1, 2]\n");
    assert_eq!(run_ok("let a = [1,2,3]; a.reverse(); print(a);"), "[3, 2, 1]\n");
    assert_eq!(run_ok("let a = [1,2,3]; print(a.reversed()); print(a);"), "[3, 2, 1]\n[1, 2, 3]\n");
    assert_eq!(run_ok("let a = [1,2,3]; a.rotate(1); print(a);"), "[2, 3, 1]\n");
    assert_eq!(run_ok("let a = []; print(a.empty());"), "true\n");
    assert_eq!(run_ok("let a = [1,2,3]; a.clear(); print(a);"), "[]\n");
}

#[test]
fn string_builtin_methods() {
    assert_eq!(run_ok("print(\"hello\".size());"), "5\n");
    assert_eq!(run_ok("print(\"hello\".starts_with(\"he\"));"), "true\n");
    assert_eq!(run_ok("print(\"hello\".ends_with(\"lo\"));"), "true\n");
    assert_eq!(run_ok("print(\"hello\".find(\"ll\"));"), "2\n");
    assert_eq!(run_ok("print(\"hello\".find(\"zz\"));"), "-1\n");
    assert_eq!(run_ok("print(\"a-b\".replace(\"-\", \"+\"));"), "a+b\n");
    assert_eq!(run_ok("print(\"a b  c\".split());"), "[\"a\", \"b\", \"c\"]\n");
    assert_eq!(run_ok("print(\", \".join([\"a\", \"b\"]));"), "a, b\n");
}

#[test]
fn dict_builtin_methods() {
    assert_eq!(
        run_ok("let d = {\"a\":1, \"b\":2}; print(d.size()); print(d.keys()); print(d.values());"),
        "2\n[\"a\", \"b\"]\n[1, 2]\n"
    );
    assert_eq!(
        run_ok("let d = {\"a\":1}; d.update({\"b\":2}); print(d.size());"),
        "2\n"
    );
    assert_eq!(run_ok("let d = {\"a\":1}; print(d.items());"), "[[\"a\", 1]]\n");
}

#[test]
fn set_literals_and_methods() {
    assert_eq!(run_ok("let s = {1, 2, 3}; print(s.size());"), "3\n");
    assert_eq!(run_ok("let s = {1, 1, 2}; print(len(s));"), "2\n");
    assert_eq!(run_ok("let s = set(); print(s.empty());"), "true\n");
}

#[test]
fn empty_brace_literal_is_a_dict() {
    assert_eq!(run_ok("let a = {}; print(internal_type_str(a));"), "Dictionary\n");
}

#[test]
fn typed_arrays() {
    assert_eq!(
        run_ok("let a : [double] = [1.0, 2.0]; print(internal_type_str(a));"),
        "ArrayDouble\n"
    );
    assert_eq!(
        run_ok("let a = [1.0, 2.0]; print(internal_type_str(a));"),
        "Array\n"
    );
    assert_eq!(run_ok("let a : [double] = [1.5]; print(a[0]);"), "1.500000\n");
    let (kind, _) = run_error("let a : [double] = [1.0]; a[0] = 1;");
    assert_eq!(kind, ErrorKind::TypeError);
}

#[test]
fn type_str_reports_inferred_shapes() {
    assert_eq!(run_ok("print(type_str(3));"), "int\n");
    assert_eq!(run_ok("print(type_str(\"s\"));"), "str\n");
    assert_eq!(run_ok("print(type_str([]));"), "[all]\n");
    assert_eq!(run_ok("print(type_str([1, 2]));"), "[int]\n");
    assert_eq!(run_ok("print(type_str([1, \"s\"]));"), "[<int,str>]\n");
}

#[test]
fn let_with_declared_type_checks_value() {
    let (kind, _) = run_error("let a : int = \"s\";");
    assert_eq!(kind, ErrorKind::TypeError);
    assert_eq!(run_ok("let a : <int,str> = \"s\"; print(a);"), "s\n");
}

#[test]
fn scope_statement_isolates_bindings() {
    assert_eq!(run_ok("scope { let x = 1; print(x); } print(2);"), "1\n2\n");
    let (kind, _) = run_error("scope { let x = 1; } print(x);");
    assert_eq!(kind, ErrorKind::IdentifierNotFound);
}

#[test]
fn user_type_static_and_instance_members() {
    let source = "type C { let tag : str = \"c\"; fn describe() { return this.tag; } } let c = C(); print(c.describe()); print(c.tag);";
    assert_eq!(run_ok(source), "c\nc\n");
}

#[test]
fn user_type_const_member_refuses_update() {
    let (kind, _) =
        run_error("type C { let const k : int = 1; } let c = C(); c.k = 2;");
    assert_eq!(kind, ErrorKind::TypeError);
}

#[test]
fn member_type_annotation_is_checked() {
    let (kind, _) = run_error("type C { let n : int = 0; } let c = C(); c.n = \"s\";");
    assert_eq!(kind, ErrorKind::TypeError);
}

#[test]
fn instances_do_not_share_property_state() {
    let source = "type C { let n : int = 0; } let a = C(); let b = C(); a.n = 5; print(a.n); print(b.n);";
    assert_eq!(run_ok(source), "5\n0\n");
}

#[test]
fn exit_code_propagates() {
    let mut writer = CollectStringPrint::new();
    match run_source("print(1); exit(3); print(2);", "", &mut writer) {
        Outcome::Exit(code) => assert_eq!(code, 3),
        other => panic!("expected exit outcome, got {other:?}"),
    }
    assert_eq!(writer.output(), "1\n");
}

#[test]
fn format_builtin() {
    assert_eq!(run_ok("print(format(\"{0} and {1}\", 1, 2));"), "1 and 2\n");
    assert_eq!(run_ok("print(format(\"{0:.2f}\", 3.14159));"), "3.14\n");
    let (kind, _) = run_error("format(\"{0:Z}\", 1.0);");
    assert_eq!(kind, ErrorKind::ValueError);
}

#[test]
fn freezer_releases_on_scope_exit() {
    let source = "let a = [1]; { let f = freezer(a); print(frozen(a)); } print(frozen(a)); append(a, 2); print(a);";
    assert_eq!(run_ok(source), "true\nfalse\n[1, 2]\n");
}

#[test]
fn string_casts() {
    assert_eq!(run_ok("print(to_int(\"42\"));"), "42\n");
    assert_eq!(run_ok("print(to_bool(\"true\"));"), "true\n");
    assert_eq!(run_ok("print(to_double(\"1.5\"));"), "1.500000\n");
    let (kind, _) = run_error("to_int(\"abc\");");
    assert_eq!(kind, ErrorKind::TypeError);
}

#[test]
fn version_and_args_have_expected_shapes() {
    assert_eq!(run_ok("print(len(version()));"), "3\n");
    assert_eq!(run_ok("print(len(arg()));"), "0\n");
}

#[test]
fn lookup_helpers() {
    assert_eq!(run_ok("print(lookup_hashable(1));"), "true\n");
    assert_eq!(run_ok("print(lookup_hashable([1]));"), "false\n");
    assert_eq!(run_ok("let a = [1]; freeze(a); print(lookup_hashable(a));"), "true\n");
    assert_eq!(run_ok("print(lookup_equal(1, 1));"), "true\n");
}

#[test]
fn doc_builtin_returns_attached_docs() {
    let source = "/! adds one\nlet f = fn(x) { return x + 1; }; print(doc(f));";
    assert_eq!(run_ok(source), "adds one\n");
}

#[test]
fn slice_and_rotated_copies() {
    assert_eq!(run_ok("print(slice([1,2,3,4], 1, 3));"), "[2, 3]\n");
    assert_eq!(run_ok("let a = [1,2,3]; print(rotated(a, 1)); print(a);"), "[2, 3, 1]\n[1, 2, 3]\n");
}

#[test]
fn update_builtin_matches_index_assignment() {
    assert_eq!(run_ok("let a = [1,2]; update(a, 0, 9); print(a);"), "[9, 2]\n");
    assert_eq!(
        run_ok("let s = \"abc\"; update(s, 1, \"X\"); print(s);"),
        "aXc\n"
    );
}

#[test]
fn bang_on_integers_tests_zero() {
    assert_eq!(run_ok("print(!0);"), "true\n");
    assert_eq!(run_ok("print(!5);"), "false\n");
}
