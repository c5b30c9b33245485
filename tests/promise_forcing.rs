//! Promise forcing through the interpreter: laziness, evaluate-once,
//! recursion detection and restoration after a failed force.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use common::*;

fn counting_interpreter() -> (Interpreter, Arc<AtomicUsize>) {
    let mut interp = Interpreter::default();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    interp
        .methods_mut()
        .register_fn("as.character", "tick", move |_| {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(RValue::string(&format!("tick{}", n)))
        });
    let mut object = RVector::integer(vec![0]);
    object.set_class(&["tick"]);
    interp.global().assign(intern("clock"), RValue::Vector(object));
    (interp, calls)
}

fn tick() -> Expr {
    call("as.character", vec![Expr::lookup("clock")])
}

#[test]
fn test_force_twice_returns_identical_value() {
    let (interp, calls) = counting_interpreter();
    define(
        &interp,
        "pair",
        vec![Formal::required("x")],
        Expr::Block(vec![
            Expr::assign("first", Expr::lookup("x")),
            Expr::lookup("x"),
        ]),
    );
    let result = interp.run(&[call("pair", vec![tick()])]).unwrap();
    assert_eq!(result, RValue::string("tick1"));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_unforced_argument_has_no_side_effects() {
    let (interp, calls) = counting_interpreter();
    define(&interp, "ignore", vec![Formal::required("x")], int(0));
    interp.run(&[call("ignore", vec![tick()])]).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_each_call_gets_fresh_promises() {
    let (interp, calls) = counting_interpreter();
    define(&interp, "id", vec![Formal::required("x")], Expr::lookup("x"));
    let first = interp.run(&[call("id", vec![tick()])]).unwrap();
    let second = interp.run(&[call("id", vec![tick()])]).unwrap();
    assert_eq!(first, RValue::string("tick1"));
    assert_eq!(second, RValue::string("tick2"));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_default_evaluated_in_callee_frame() {
    let interp = Interpreter::default();
    interp.global().assign(intern("y"), RValue::string("global"));
    define(
        &interp,
        "f",
        vec![Formal::with_default("x", Expr::lookup("y"))],
        Expr::Block(vec![
            Expr::assign("y", Expr::constant(RValue::string("local"))),
            Expr::lookup("x"),
        ]),
    );
    assert_eq!(interp.run(&[call("f", vec![])]), Ok(RValue::string("local")));
}

#[test]
fn test_supplied_argument_evaluated_in_caller_frame() {
    let interp = Interpreter::default();
    interp.global().assign(intern("y"), RValue::string("global"));
    define(
        &interp,
        "f",
        vec![Formal::required("x")],
        Expr::Block(vec![
            Expr::assign("y", Expr::constant(RValue::string("local"))),
            Expr::lookup("x"),
        ]),
    );
    let result = interp.run(&[call("f", vec![Expr::lookup("y")])]);
    assert_eq!(result, Ok(RValue::string("global")));
}

#[test]
fn test_mutually_recursive_defaults() {
    let interp = Interpreter::default();
    define(
        &interp,
        "f",
        vec![
            Formal::with_default("a", Expr::lookup("b")),
            Formal::with_default("b", Expr::lookup("a")),
        ],
        Expr::lookup("a"),
    );
    let err = interp.run(&[call("f", vec![])]).unwrap_err();
    assert_eq!(err, RError::RecursiveForce);
    assert!(err.to_string().contains("promise already under evaluation"));
}

#[test]
fn test_failed_force_restores_state() {
    let interp = Interpreter::default();
    let promise = Promise::new(Expr::lookup("pending"), interp.global());
    assert!(matches!(interp.force(&promise), Err(RError::ObjectNotFound(_))));
    assert_eq!(promise.state(), PromiseState::Unevaluated);
    assert!(promise.value().is_none());

    // Forcing again re-raises until the binding exists.
    assert!(matches!(interp.force(&promise), Err(RError::ObjectNotFound(_))));
    interp.global().assign(intern("pending"), RValue::int(1));
    assert_eq!(interp.force(&promise), Ok(RValue::int(1)));
    assert_eq!(promise.state(), PromiseState::Evaluated);
}

#[test]
fn test_reclaimed_default_frame_is_an_error() {
    let interp = Interpreter::default();
    let promise = {
        let frame = interp.global().new_child(FrameDescriptor::fresh());
        Promise::default_argument(Expr::constant(RValue::int(1)), &frame)
    };
    assert!(promise.environment_if_alive().is_none());
    assert!(matches!(interp.force(&promise), Err(RError::Runtime(_))));
}
