//! The `missing()` resolver.
//!
//! `missing(x)` asks whether the formal `x` of the current call was supplied.
//! Arguments forwarded by bare name (`g <- function(x) h(x)`) are followed
//! into the frame that created the promise, one level at a time, without
//! forcing anything.
//!
//! # Algorithm
//!
//! For `is_missing(symbol, frame, level)`:
//!
//! 1. Unbound in `frame`: not missing.
//! 2. Bound to the missing marker: missing.
//! 3. Bound to a promise `p`:
//!    - at level 0 a default-argument promise is missing;
//!    - at a deeper level an evaluated promise is present;
//!    - a promise under evaluation is a forwarding cycle and counts as missing;
//!    - an expression other than a bare symbol is present;
//!    - if `p` was created in a frame of the same function as `frame`, `p` is
//!      marked under evaluation while the check recurses into its frame, and
//!      restored afterwards whatever happens;
//!    - otherwise an evaluated `p` is present, else recurse at `level + 1`.
//! 4. Bound to a value: not missing.
//!
//! `MissingChecker` runs the same algorithm with a small per-symbol cache of
//! child checkers, one per recursion level, and falls back to the plain
//! recursive path once the cache is full.

use std::sync::Arc;

use parking_lot::Mutex;
use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::backend::environment::{Binding, Environment};
use crate::backend::errors::{RError, RResult};
use crate::backend::eval::Expr;
use crate::backend::models::RValue;
use crate::backend::symbol::{intern, Symbol};

/// Default number of symbols a checker caches per level
pub const DEFAULT_MISSING_CACHE_SIZE: usize = 3;

/// Uncached missingness check.
pub fn is_missing(symbol: &Symbol, frame: &Environment, level: usize) -> bool {
    check(symbol, frame, level, &mut |next, env| is_missing(next, env, level + 1))
}

fn check(
    symbol: &Symbol,
    frame: &Environment,
    level: usize,
    recurse: &mut dyn FnMut(&Symbol, &Environment) -> bool,
) -> bool {
    let promise = match frame.get_local(symbol) {
        None => return false,
        Some(Binding::Missing) => return true,
        Some(Binding::Value(_)) => return false,
        Some(Binding::Promise(p)) => p,
    };

    if level == 0 && promise.is_default_argument() {
        return true;
    }
    if level > 0 && promise.is_evaluated() {
        return false;
    }
    if promise.is_under_evaluation() {
        trace!(target: "rcore::missing", symbol = %symbol, level, "Forwarding cycle treated as missing");
        return true;
    }
    let Some(forwarded) = promise.expression_symbol().cloned() else {
        return false;
    };
    let Some(promise_frame) = promise.environment_if_alive() else {
        debug!(target: "rcore::missing", symbol = %symbol, "Promise frame reclaimed, treating as present");
        return false;
    };

    if promise_frame.descriptor() == frame.descriptor() {
        let _guard = promise.mark_under_evaluation();
        trace!(target: "rcore::missing", symbol = %symbol, forwarded = %forwarded, level, "Guarded recursion into same function");
        recurse(&forwarded, &promise_frame)
    } else if promise.is_evaluated() {
        false
    } else {
        trace!(target: "rcore::missing", symbol = %symbol, forwarded = %forwarded, level, "Following forwarded argument");
        recurse(&forwarded, &promise_frame)
    }
}

struct CachedCheck {
    symbol: Symbol,
    child: Arc<MissingChecker>,
}

/// Missingness checker for one recursion level, caching child checkers per
/// symbol.
pub struct MissingChecker {
    level: usize,
    limit: usize,
    entries: Mutex<SmallVec<[CachedCheck; DEFAULT_MISSING_CACHE_SIZE]>>,
}

impl MissingChecker {
    /// A top-level checker caching up to `limit` symbols per level.
    pub fn new(limit: usize) -> Self {
        Self::at_level(0, limit)
    }

    fn at_level(level: usize, limit: usize) -> Self {
        MissingChecker {
            level,
            limit,
            entries: Mutex::new(SmallVec::new()),
        }
    }

    pub fn level(&self) -> usize {
        self.level
    }

    /// Symbols with a cached child checker at this level.
    pub fn cached_symbols(&self) -> Vec<Symbol> {
        self.entries.lock().iter().map(|e| e.symbol.clone()).collect()
    }

    pub fn is_missing(&self, symbol: &Symbol, frame: &Environment) -> bool {
        match self.child_for(symbol) {
            Some(child) => check(symbol, frame, self.level, &mut |next, env| {
                child.is_missing(next, env)
            }),
            None => {
                debug!(target: "rcore::missing", symbol = %symbol, level = self.level, "Missing cache full, using generic check");
                is_missing(symbol, frame, self.level)
            }
        }
    }

    fn child_for(&self, symbol: &Symbol) -> Option<Arc<MissingChecker>> {
        let mut entries = self.entries.lock();
        if let Some(entry) = entries.iter().find(|e| &e.symbol == symbol) {
            return Some(entry.child.clone());
        }
        if entries.len() >= self.limit {
            return None;
        }
        let child = Arc::new(MissingChecker::at_level(self.level + 1, self.limit));
        entries.push(CachedCheck {
            symbol: symbol.clone(),
            child: child.clone(),
        });
        Some(child)
    }
}

impl Default for MissingChecker {
    fn default() -> Self {
        MissingChecker::new(DEFAULT_MISSING_CACHE_SIZE)
    }
}

/// Resolve the argument list of a `missing(...)` call to the symbol it asks
/// about: exactly one argument, a symbol or a single string.
pub fn missing_argument_symbol(args: &[Expr]) -> RResult<Symbol> {
    if args.len() != 1 {
        return Err(RError::InvalidArgumentCount {
            function: "missing".to_string(),
            expected: 1,
            supplied: args.len(),
        });
    }
    match &args[0] {
        Expr::Lookup(symbol) => Ok(symbol.clone()),
        Expr::Constant(value) => match value {
            RValue::Vector(_) | RValue::Symbol(_) => value
                .as_string_scalar()
                .map(intern)
                .ok_or_else(|| RError::runtime("invalid use of 'missing'")),
            _ => Err(RError::runtime("invalid use of 'missing'")),
        },
        _ => Err(RError::runtime("invalid use of 'missing'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::environment::FrameDescriptor;
    use crate::backend::promise::Promise;

    fn call_frame(parent: &Environment, descriptor: FrameDescriptor) -> Environment {
        parent.new_child(descriptor)
    }

    // ========================================================================
    // Direct bindings
    // ========================================================================

    #[test]
    fn test_unbound_symbol_is_not_missing() {
        let env = Environment::new_global();
        assert!(!is_missing(&intern("x"), &env, 0));
    }

    #[test]
    fn test_missing_marker() {
        let env = Environment::new_global();
        env.define(intern("x"), Binding::Missing);
        assert!(is_missing(&intern("x"), &env, 0));
    }

    #[test]
    fn test_value_is_present() {
        let env = Environment::new_global();
        env.assign(intern("x"), RValue::int(1));
        assert!(!is_missing(&intern("x"), &env, 0));
    }

    // ========================================================================
    // Promises
    // ========================================================================

    #[test]
    fn test_default_promise_missing_only_at_level_zero() {
        let global = Environment::new_global();
        let frame = call_frame(&global, FrameDescriptor::fresh());
        let promise = Promise::default_argument(Expr::Constant(RValue::int(1)), &frame);
        frame.define(intern("x"), Binding::Promise(promise));

        assert!(is_missing(&intern("x"), &frame, 0));
        assert!(!is_missing(&intern("x"), &frame, 1));
    }

    #[test]
    fn test_non_symbol_expression_is_present() {
        let global = Environment::new_global();
        let frame = call_frame(&global, FrameDescriptor::fresh());
        let promise = Promise::new(Expr::Constant(RValue::int(1)), &global);
        frame.define(intern("x"), Binding::Promise(promise));
        assert!(!is_missing(&intern("x"), &frame, 0));
    }

    #[test]
    fn test_forwarded_missing_argument() {
        // g <- function(x) h(x); h <- function(y) missing(y); g()
        let global = Environment::new_global();
        let g_frame = call_frame(&global, FrameDescriptor::fresh());
        g_frame.define(intern("x"), Binding::Missing);
        let h_frame = call_frame(&global, FrameDescriptor::fresh());
        h_frame.define(
            intern("y"),
            Binding::Promise(Promise::new(Expr::lookup("x"), &g_frame)),
        );

        assert!(is_missing(&intern("y"), &h_frame, 0));
        assert!(MissingChecker::default().is_missing(&intern("y"), &h_frame));
    }

    #[test]
    fn test_forwarded_present_argument() {
        let global = Environment::new_global();
        let g_frame = call_frame(&global, FrameDescriptor::fresh());
        g_frame.assign(intern("x"), RValue::int(3));
        let h_frame = call_frame(&global, FrameDescriptor::fresh());
        h_frame.define(
            intern("y"),
            Binding::Promise(Promise::new(Expr::lookup("x"), &g_frame)),
        );
        assert!(!is_missing(&intern("y"), &h_frame, 0));
    }

    #[test]
    fn test_evaluated_forwarded_promise_is_present() {
        let global = Environment::new_global();
        let g_frame = call_frame(&global, FrameDescriptor::fresh());
        g_frame.define(intern("x"), Binding::Missing);
        let h_frame = call_frame(&global, FrameDescriptor::fresh());
        let promise = Promise::new(Expr::lookup("x"), &g_frame);
        promise.force(|_, _| Ok(RValue::int(1))).unwrap();
        h_frame.define(intern("y"), Binding::Promise(promise));

        assert!(!is_missing(&intern("y"), &h_frame, 0));
    }

    #[test]
    fn test_promise_under_evaluation_counts_as_missing() {
        let global = Environment::new_global();
        let frame = call_frame(&global, FrameDescriptor::fresh());
        let promise = Promise::new(Expr::lookup("z"), &global);
        frame.define(intern("x"), Binding::Promise(promise.clone()));

        let _guard = promise.mark_under_evaluation();
        assert!(is_missing(&intern("x"), &frame, 0));
    }

    #[test]
    fn test_self_forwarding_cycle_terminates() {
        // f <- function(x) f(x), with both frames of the same function and
        // each promise pointing back at the other frame.
        let global = Environment::new_global();
        let descriptor = FrameDescriptor::fresh();
        let outer = call_frame(&global, descriptor);
        let inner = call_frame(&global, descriptor);
        let into_outer = Promise::new(Expr::lookup("x"), &outer);
        let into_inner = Promise::new(Expr::lookup("x"), &inner);
        inner.define(intern("x"), Binding::Promise(into_outer.clone()));
        outer.define(intern("x"), Binding::Promise(into_inner.clone()));

        assert!(is_missing(&intern("x"), &inner, 0));
        assert!(MissingChecker::new(3).is_missing(&intern("x"), &inner));
        assert!(!into_outer.is_under_evaluation());
        assert!(!into_inner.is_under_evaluation());
    }

    // ========================================================================
    // Cache
    // ========================================================================

    #[test]
    fn test_cache_is_bounded_and_agrees_with_generic_path() {
        let env = Environment::new_global();
        let names = ["a", "b", "c", "d", "e"];
        for (i, name) in names.iter().enumerate() {
            if i % 2 == 0 {
                env.define(intern(name), Binding::Missing);
            } else {
                env.assign(intern(name), RValue::int(i as i32));
            }
        }

        let checker = MissingChecker::new(3);
        for name in names {
            let symbol = intern(name);
            assert_eq!(
                checker.is_missing(&symbol, &env),
                is_missing(&symbol, &env, 0)
            );
        }
        assert_eq!(
            checker.cached_symbols(),
            vec![intern("a"), intern("b"), intern("c")]
        );
        assert_eq!(checker.level(), 0);
    }

    // ========================================================================
    // missing() arguments
    // ========================================================================

    #[test]
    fn test_missing_argument_validation() {
        assert_eq!(
            missing_argument_symbol(&[Expr::lookup("x")]).unwrap(),
            intern("x")
        );
        assert_eq!(
            missing_argument_symbol(&[Expr::Constant(RValue::string("x"))]).unwrap(),
            intern("x")
        );
        assert_eq!(
            missing_argument_symbol(&[]),
            Err(RError::InvalidArgumentCount {
                function: "missing".to_string(),
                expected: 1,
                supplied: 0,
            })
        );
        assert!(matches!(
            missing_argument_symbol(&[Expr::lookup("x"), Expr::lookup("y")]),
            Err(RError::InvalidArgumentCount { supplied: 2, .. })
        ));
        assert_eq!(
            missing_argument_symbol(&[Expr::Constant(RValue::int(1))]),
            Err(RError::runtime("invalid use of 'missing'"))
        );
    }
}
