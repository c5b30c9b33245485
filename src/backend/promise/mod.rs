//! Argument promises.
//!
//! A promise pairs an unevaluated expression with the frame it must be
//! evaluated in. Forcing evaluates it at most once and caches the value.
//!
//! # States
//!
//! ```text
//! Unevaluated ──┐
//!               ├─ force ─> UnderEvaluation ─ ok ─> Evaluated
//! Default ──────┘                 │
//!                                 └─ error ─> (state before the force)
//! ```
//!
//! Forcing a promise that is `UnderEvaluation` is a recursive reference and
//! fails with `RError::RecursiveForce`. A failed force puts the promise back
//! in the state it had before, so forcing it again re-raises the error.
//!
//! Whether a promise came from a formal's default expression is recorded
//! separately from its state and survives forcing.
//!
//! # Frames
//!
//! A supplied argument's promise keeps the caller frame alive until it is
//! evaluated, then releases it: a closure returned from the callee can
//! still force it after the caller has returned. A default argument's
//! promise lives in the callee frame it refers to and only holds it
//! weakly.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use tracing::trace;

use crate::backend::environment::{Environment, WeakEnvironment};
use crate::backend::errors::{RError, RResult};
use crate::backend::eval::Expr;
use crate::backend::models::RValue;
use crate::backend::symbol::Symbol;

/// Global counter for promise ids
static NEXT_PROMISE_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromiseState {
    Unevaluated,
    UnderEvaluation,
    Evaluated,
    /// Built from a formal's default expression and not forced yet
    Default,
}

struct PromiseInner {
    id: u64,
    expr: Expr,
    env: Option<WeakEnvironment>,
    /// Strong handle on `env`, dropped once the value is cached.
    pinned: Mutex<Option<Environment>>,
    state: Mutex<PromiseState>,
    value: OnceLock<RValue>,
    is_default: bool,
}

/// Shared handle on a promise. Clones refer to the same promise.
#[derive(Clone)]
pub struct Promise(Arc<PromiseInner>);

impl Promise {
    /// A promise for a supplied argument, evaluated later in `env`.
    pub fn new(expr: Expr, env: &Environment) -> Self {
        let promise = Self::build(expr, Some(env.downgrade()), PromiseState::Unevaluated, false);
        *promise.0.pinned.lock() = Some(env.clone());
        promise
    }

    /// A promise for a formal's default expression, bound to the callee frame.
    pub fn default_argument(expr: Expr, callee: &Environment) -> Self {
        Self::build(expr, Some(callee.downgrade()), PromiseState::Default, true)
    }

    /// A promise whose value was known at call setup. It has no frame.
    pub fn evaluated(expr: Expr, value: RValue) -> Self {
        let promise = Self::build(expr, None, PromiseState::Evaluated, false);
        let _ = promise.0.value.set(value);
        promise
    }

    fn build(expr: Expr, env: Option<WeakEnvironment>, state: PromiseState, is_default: bool) -> Self {
        Promise(Arc::new(PromiseInner {
            id: NEXT_PROMISE_ID.fetch_add(1, Ordering::Relaxed),
            expr,
            env,
            pinned: Mutex::new(None),
            state: Mutex::new(state),
            value: OnceLock::new(),
            is_default,
        }))
    }

    pub fn id(&self) -> u64 {
        self.0.id
    }

    pub fn expression(&self) -> &Expr {
        &self.0.expr
    }

    /// The symbol the expression names, if the argument was forwarded by name.
    pub fn expression_symbol(&self) -> Option<&Symbol> {
        self.0.expr.as_symbol()
    }

    pub fn state(&self) -> PromiseState {
        *self.0.state.lock()
    }

    pub fn is_default_argument(&self) -> bool {
        self.0.is_default
    }

    pub fn is_evaluated(&self) -> bool {
        self.state() == PromiseState::Evaluated
    }

    pub fn is_under_evaluation(&self) -> bool {
        self.state() == PromiseState::UnderEvaluation
    }

    /// The cached value, if forced.
    pub fn value(&self) -> Option<&RValue> {
        self.0.value.get()
    }

    /// The defining frame. A promise built without one, or whose frame has
    /// been reclaimed, is an error.
    pub fn environment(&self) -> RResult<Environment> {
        self.0
            .env
            .as_ref()
            .and_then(WeakEnvironment::upgrade)
            .ok_or_else(|| {
                RError::runtime(format!(
                    "environment of promise {} is no longer available",
                    self.0.id
                ))
            })
    }

    /// The defining frame, if it is still alive.
    pub fn environment_if_alive(&self) -> Option<Environment> {
        self.0.env.as_ref().and_then(WeakEnvironment::upgrade)
    }

    /// Evaluate the promise once and cache the value.
    ///
    /// `eval` runs with no lock held, so it may force other promises or this
    /// one (which then fails with `RecursiveForce`).
    pub fn force<F>(&self, eval: F) -> RResult<RValue>
    where
        F: FnOnce(&Expr, &Environment) -> RResult<RValue>,
    {
        if let Some(value) = self.0.value.get() {
            return Ok(value.clone());
        }

        let guard = self.begin_evaluation()?;
        trace!(target: "rcore::promise", id = self.0.id, previous = ?guard.previous, "Forcing promise");

        let env = self.environment()?;
        let value = eval(&self.0.expr, &env)?;

        let value = self.0.value.get_or_init(|| value).clone();
        guard.commit(PromiseState::Evaluated);
        let released = self.0.pinned.lock().take();
        drop(released);
        trace!(target: "rcore::promise", id = self.0.id, "Promise evaluated");
        Ok(value)
    }

    /// Mark the promise `UnderEvaluation` until the returned guard is dropped.
    /// Used by the missingness resolver to cut self-forwarding cycles.
    pub(crate) fn mark_under_evaluation(&self) -> StateGuard<'_> {
        let mut state = self.0.state.lock();
        let previous = *state;
        *state = PromiseState::UnderEvaluation;
        StateGuard {
            promise: self,
            previous,
            armed: true,
        }
    }

    fn begin_evaluation(&self) -> RResult<StateGuard<'_>> {
        let mut state = self.0.state.lock();
        match *state {
            PromiseState::UnderEvaluation => Err(RError::RecursiveForce),
            previous => {
                *state = PromiseState::UnderEvaluation;
                Ok(StateGuard {
                    promise: self,
                    previous,
                    armed: true,
                })
            }
        }
    }
}

/// Restores a promise's state when dropped unless committed.
pub(crate) struct StateGuard<'a> {
    promise: &'a Promise,
    previous: PromiseState,
    armed: bool,
}

impl StateGuard<'_> {
    fn commit(mut self, state: PromiseState) {
        *self.promise.0.state.lock() = state;
        self.armed = false;
    }
}

impl Drop for StateGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            *self.promise.0.state.lock() = self.previous;
        }
    }
}

impl PartialEq for Promise {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Promise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Promise")
            .field("id", &self.0.id)
            .field("expr", &self.0.expr)
            .field("state", &self.state())
            .field("is_default", &self.0.is_default)
            .finish()
    }
}
