//! `missing()` through real calls: omitted formals, defaults, forwarding
//! chains and cycles.

mod common;

use common::*;

fn missing_probe(interp: &Interpreter, name: &str, formal: Formal) {
    let probe = formal.name.as_str().to_string();
    define(interp, name, vec![formal], missing(&probe));
}

#[test]
fn test_omitted_and_supplied() {
    let interp = Interpreter::default();
    missing_probe(&interp, "f", Formal::required("x"));
    assert_eq!(interp.run(&[call("f", vec![])]), Ok(RValue::logical(true)));
    assert_eq!(interp.run(&[call("f", vec![int(1)])]), Ok(RValue::logical(false)));
}

#[test]
fn test_default_before_and_after_forcing() {
    let interp = Interpreter::default();
    missing_probe(&interp, "before", Formal::with_default("x", int(1)));
    define(
        &interp,
        "after",
        vec![Formal::with_default("x", int(1))],
        Expr::Block(vec![Expr::assign("v", Expr::lookup("x")), missing("x")]),
    );
    assert_eq!(interp.run(&[call("before", vec![])]), Ok(RValue::logical(true)));
    assert_eq!(interp.run(&[call("after", vec![])]), Ok(RValue::logical(true)));
    assert_eq!(interp.run(&[call("after", vec![int(2)])]), Ok(RValue::logical(false)));
}

#[test]
fn test_forwarding_chain() {
    // g <- function(x) h(x); h <- function(y) missing(y)
    let interp = Interpreter::default();
    missing_probe(&interp, "h", Formal::required("y"));
    define(
        &interp,
        "g",
        vec![Formal::required("x")],
        call("h", vec![Expr::lookup("x")]),
    );
    assert_eq!(interp.run(&[call("g", vec![])]), Ok(RValue::logical(true)));
    assert_eq!(interp.run(&[call("g", vec![int(5)])]), Ok(RValue::logical(false)));
}

#[test]
fn test_forwarding_two_levels() {
    let interp = Interpreter::default();
    missing_probe(&interp, "h", Formal::required("z"));
    define(&interp, "g", vec![Formal::required("y")], call("h", vec![Expr::lookup("y")]));
    define(&interp, "f", vec![Formal::required("x")], call("g", vec![Expr::lookup("x")]));
    assert_eq!(interp.run(&[call("f", vec![])]), Ok(RValue::logical(true)));
    assert_eq!(interp.run(&[call("f", vec![int(0)])]), Ok(RValue::logical(false)));
}

#[test]
fn test_forwarded_default_is_present_one_level_down() {
    // The default of `g` counts as missing only inside `g`.
    let interp = Interpreter::default();
    missing_probe(&interp, "h", Formal::required("y"));
    define(
        &interp,
        "g",
        vec![Formal::with_default("x", int(1))],
        call("h", vec![Expr::lookup("x")]),
    );
    assert_eq!(interp.run(&[call("g", vec![])]), Ok(RValue::logical(false)));
}

#[test]
fn test_non_symbol_argument_is_present() {
    let interp = Interpreter::default();
    missing_probe(&interp, "h", Formal::required("y"));
    let nested = Expr::Block(vec![Expr::lookup("nothing")]);
    assert_eq!(interp.run(&[call("h", vec![nested])]), Ok(RValue::logical(false)));
}

#[test]
fn test_self_referencing_default() {
    let interp = Interpreter::default();
    missing_probe(&interp, "f", Formal::with_default("x", Expr::lookup("x")));
    assert_eq!(interp.run(&[call("f", vec![])]), Ok(RValue::logical(true)));
}

#[test]
fn test_cycle_between_frames_of_one_function() {
    let global = Environment::new_global();
    let descriptor = FrameDescriptor::fresh();
    let a = global.new_child(descriptor);
    let b = global.new_child(descriptor);
    a.define(intern("x"), Binding::Promise(Promise::new(Expr::lookup("x"), &b)));
    b.define(intern("x"), Binding::Promise(Promise::new(Expr::lookup("x"), &a)));

    assert!(is_missing(&intern("x"), &a, 0));
    let checker = MissingChecker::default();
    assert!(checker.is_missing(&intern("x"), &a));
    assert!(checker.is_missing(&intern("x"), &b));
}

#[test]
fn test_checker_cache_spills_to_generic_path() {
    let interp = Interpreter::new(
        &EngineConfig::parse_toml("[engine]\nmissing_cache_size = 1\n").unwrap(),
    );
    missing_probe(&interp, "f", Formal::required("x"));
    missing_probe(&interp, "g", Formal::required("y"));
    assert_eq!(interp.run(&[call("f", vec![])]), Ok(RValue::logical(true)));
    assert_eq!(interp.run(&[call("g", vec![])]), Ok(RValue::logical(true)));
    assert_eq!(interp.run(&[call("g", vec![int(1)])]), Ok(RValue::logical(false)));
    assert_eq!(interp.missing_checker().cached_symbols(), vec![intern("x")]);
}

#[test]
fn test_invalid_missing_calls() {
    let interp = Interpreter::default();
    assert!(matches!(
        interp.run(&[Expr::Missing(vec![])]),
        Err(RError::InvalidArgumentCount { expected: 1, supplied: 0, .. })
    ));
    assert!(matches!(
        interp.run(&[Expr::Missing(vec![int(1)])]),
        Err(RError::Runtime(m)) if m == "invalid use of 'missing'"
    ));
}
