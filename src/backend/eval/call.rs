//! Call setup: match actual arguments to formals and build the callee frame.
//!
//! Matching is exact-name first, then positional over the formals left
//! unmatched. Each formal is then bound to:
//! - a promise on the caller's frame for a supplied argument (an evaluated
//!   promise when the argument is a constant),
//! - a default promise on the callee frame for an omitted formal with a
//!   default,
//! - the missing marker otherwise.

use tracing::trace;

use super::closure::Closure;
use super::expression::{Arg, Expr};
use crate::backend::environment::{Binding, Environment};
use crate::backend::errors::{RError, RResult};
use crate::backend::promise::Promise;

/// Supplied expression per formal, in formal order.
pub(super) fn match_arguments<'a>(closure: &Closure, args: &'a [Arg]) -> RResult<Vec<Option<&'a Expr>>> {
    let formals = closure.function().formals();
    let mut matched: Vec<Option<&Expr>> = vec![None; formals.len()];
    let mut taken = vec![false; formals.len()];

    for arg in args {
        if let Arg::Named(name, expr) = arg {
            let Some(slot) = formals.iter().position(|f| &f.name == name) else {
                return Err(RError::runtime(format!("unused argument ({} = ...)", name)));
            };
            if taken[slot] {
                return Err(RError::runtime(format!(
                    "formal argument \"{}\" matched by multiple actual arguments",
                    name
                )));
            }
            taken[slot] = true;
            matched[slot] = Some(expr);
        }
    }

    let mut free = (0..formals.len()).filter(|&i| !taken[i]);
    for arg in args {
        let supplied = match arg {
            Arg::Named(..) => continue,
            Arg::Positional(expr) => Some(expr),
            Arg::Empty => None,
        };
        let Some(slot) = free.next() else {
            return Err(RError::InvalidArgumentCount {
                function: closure.name().to_string(),
                expected: formals.len(),
                supplied: args.len(),
            });
        };
        matched[slot] = supplied;
    }
    Ok(matched)
}

/// A new frame for `closure` with every formal bound.
pub(super) fn bind_arguments(closure: &Closure, args: &[Arg], caller: &Environment) -> RResult<Environment> {
    let function = closure.function();
    let matched = match_arguments(closure, args)?;
    let callee = closure.environment().new_child(function.descriptor());

    for (formal, supplied) in function.formals().iter().zip(matched) {
        let binding = match (supplied, &formal.default) {
            (Some(Expr::Constant(value)), _) => {
                Binding::Promise(Promise::evaluated(Expr::Constant(value.clone()), value.clone()))
            }
            (Some(expr), _) => Binding::Promise(Promise::new(expr.clone(), caller)),
            (None, Some(default)) => {
                Binding::Promise(Promise::default_argument(default.clone(), &callee))
            }
            (None, None) => Binding::Missing,
        };
        callee.define(formal.name.clone(), binding);
    }
    trace!(
        target: "rcore::eval",
        function = closure.name(),
        descriptor = function.descriptor().id(),
        "Call frame ready"
    );
    Ok(callee)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::eval::closure::{Formal, Function};
    use crate::backend::models::RValue;
    use crate::backend::symbol::intern;
    use std::sync::Arc;

    fn closure(formals: Vec<Formal>) -> Closure {
        let function = Function::named("f", formals, Expr::Constant(RValue::Null));
        Closure::new(Arc::new(function), Environment::new_global())
    }

    fn supplied_names(matched: &[Option<&Expr>]) -> Vec<Option<String>> {
        matched
            .iter()
            .map(|e| e.and_then(Expr::as_symbol).map(|s| s.as_str().to_string()))
            .collect()
    }

    #[test]
    fn test_named_then_positional() {
        let f = closure(vec![Formal::required("x"), Formal::required("y"), Formal::required("z")]);
        let args = vec![
            Arg::positional(Expr::lookup("a")),
            Arg::named("x", Expr::lookup("b")),
        ];
        let matched = match_arguments(&f, &args).unwrap();
        assert_eq!(
            supplied_names(&matched),
            vec![Some("b".to_string()), Some("a".to_string()), None]
        );
    }

    #[test]
    fn test_empty_argument_leaves_formal_unsupplied() {
        let f = closure(vec![Formal::required("x"), Formal::required("y")]);
        let args = vec![Arg::Empty, Arg::positional(Expr::lookup("b"))];
        let matched = match_arguments(&f, &args).unwrap();
        assert_eq!(supplied_names(&matched), vec![None, Some("b".to_string())]);
    }

    #[test]
    fn test_matching_errors() {
        let f = closure(vec![Formal::required("x")]);
        let too_many = vec![Arg::positional(Expr::lookup("a")), Arg::positional(Expr::lookup("b"))];
        assert!(matches!(
            match_arguments(&f, &too_many),
            Err(RError::InvalidArgumentCount { expected: 1, supplied: 2, .. })
        ));
        let unknown = vec![Arg::named("q", Expr::lookup("a"))];
        assert!(matches!(match_arguments(&f, &unknown), Err(RError::Runtime(_))));
        let twice = vec![Arg::named("x", Expr::lookup("a")), Arg::named("x", Expr::lookup("b"))];
        assert!(matches!(match_arguments(&f, &twice), Err(RError::Runtime(_))));
    }

    #[test]
    fn test_bindings_per_formal() {
        let f = closure(vec![
            Formal::required("a"),
            Formal::required("b"),
            Formal::with_default("c", Expr::Constant(RValue::int(3))),
            Formal::required("d"),
        ]);
        let caller = Environment::new_global();
        let args = vec![
            Arg::positional(Expr::Constant(RValue::int(1))),
            Arg::positional(Expr::lookup("v")),
        ];
        let frame = bind_arguments(&f, &args, &caller).unwrap();
        assert_eq!(frame.descriptor(), f.function().descriptor());

        match frame.get_local(&intern("a")) {
            Some(Binding::Promise(p)) => {
                assert!(p.is_evaluated());
                assert_eq!(p.value(), Some(&RValue::int(1)));
            }
            other => panic!("unexpected binding {:?}", other),
        }
        match frame.get_local(&intern("b")) {
            Some(Binding::Promise(p)) => {
                assert!(!p.is_default_argument());
                assert!(p.environment().unwrap().ptr_eq(&caller));
            }
            other => panic!("unexpected binding {:?}", other),
        }
        match frame.get_local(&intern("c")) {
            Some(Binding::Promise(p)) => {
                assert!(p.is_default_argument());
                assert!(p.environment().unwrap().ptr_eq(&frame));
            }
            other => panic!("unexpected binding {:?}", other),
        }
        assert!(matches!(frame.get_local(&intern("d")), Some(Binding::Missing)));
    }
}
