//! Shared helpers for the integration tests.
//!
//! - Building closures and calls without a parser
//! - Named vectors and matrices for access tests

#![allow(dead_code)]

use std::sync::Arc;

pub use rcore::backend::*;

/// Bind `name` to a closure in the interpreter's global frame.
pub fn define(interp: &Interpreter, name: &str, formals: Vec<Formal>, body: Expr) {
    let function = Arc::new(Function::named(name, formals, body));
    interp
        .run(&[Expr::assign(name, Expr::Function(function))])
        .expect("function definition failed");
}

pub fn call(name: &str, args: Vec<Expr>) -> Expr {
    Expr::call(name, args.into_iter().map(Arg::Positional).collect())
}

pub fn int(value: i32) -> Expr {
    Expr::constant(RValue::int(value))
}

pub fn missing(name: &str) -> Expr {
    Expr::Missing(vec![Expr::lookup(name)])
}

pub fn names(list: &[&str]) -> Vec<Option<String>> {
    list.iter().map(|s| Some(s.to_string())).collect()
}

pub fn named_ints(values: Vec<i32>, list: &[&str]) -> RValue {
    let mut vector = RVector::integer(values);
    vector.set_names(Some(names(list))).expect("names longer than vector");
    RValue::Vector(vector)
}

/// A `rows x cols` integer matrix holding `1..=rows*cols` column-major.
pub fn int_matrix(rows: usize, cols: usize) -> RValue {
    let mut vector = RVector::integer((1..=(rows * cols) as i32).collect());
    vector
        .set_dim(Some(vec![rows, cols]))
        .expect("dim does not match length");
    RValue::Vector(vector)
}

pub fn names_of(value: &RValue) -> Option<Vec<Option<String>>> {
    value.as_vector().and_then(RVector::names)
}
