//! A small tree-walking evaluator that drives the engine the way an R
//! interpreter would.
//!
//! # Evaluation
//!
//! - `Constant` evaluates to itself, `Function` to a closure over the current
//!   frame, `Block` to its last expression (`NULL` when empty).
//! - `Lookup` walks the parent chain. A promise found on the way is forced
//!   (at most once); the missing marker is an error.
//! - `Call` finds a closure by name (skipping non-function bindings, as R
//!   does), falling back to a builtin. Arguments are not evaluated at the
//!   call: each formal gets a promise (see `call`).
//! - `Missing` asks the missingness resolver about a formal without forcing.
//! - `Index` / `AssignIndex` go through the cached extract and replace
//!   engines.

#[macro_use]
mod macros;

mod builtin;
mod call;
mod closure;
mod expression;


pub use closure::{Closure, Formal, Function};
pub use expression::{Arg, Expr};

use tracing::{debug, trace};

use crate::backend::access::{PositionArg, VectorExtractor, VectorReplacer};
use crate::backend::config::EngineConfig;
use crate::backend::dispatch::MethodTable;
use crate::backend::environment::{Binding, Environment};
use crate::backend::errors::{RError, RResult};
use crate::backend::missing::{missing_argument_symbol, MissingChecker};
use crate::backend::models::RValue;
use crate::backend::promise::Promise;
use crate::backend::symbol::Symbol;

/// Evaluator state shared by every call: the global frame, class methods and
/// the cached access and missingness engines.
pub struct Interpreter {
    global: Environment,
    methods: MethodTable,
    extractor: VectorExtractor,
    replacer: VectorReplacer,
    missing: MissingChecker,
}

/// What a call's function position resolved to.
enum Callee {
    Closure(Closure),
    Builtin(Symbol),
}

impl Interpreter {
    pub fn new(config: &EngineConfig) -> Self {
        debug!(target: "rcore::eval", ?config, "Creating interpreter");
        Interpreter {
            global: Environment::new_global(),
            methods: MethodTable::new(),
            extractor: VectorExtractor::new(config.engine.extract_cache_size),
            replacer: VectorReplacer::new(config.engine.replace_cache_size),
            missing: MissingChecker::new(config.engine.missing_cache_size),
        }
    }

    pub fn global(&self) -> &Environment {
        &self.global
    }

    pub fn methods(&self) -> &MethodTable {
        &self.methods
    }

    pub fn methods_mut(&mut self) -> &mut MethodTable {
        &mut self.methods
    }

    pub fn extractor(&self) -> &VectorExtractor {
        &self.extractor
    }

    pub fn replacer(&self) -> &VectorReplacer {
        &self.replacer
    }

    pub fn missing_checker(&self) -> &MissingChecker {
        &self.missing
    }

    /// Evaluate top-level expressions in order, returning the last value.
    pub fn run(&self, exprs: &[Expr]) -> RResult<RValue> {
        let mut last = RValue::Null;
        for expr in exprs {
            last = self.eval(expr, &self.global)?;
        }
        Ok(last)
    }

    pub fn eval(&self, expr: &Expr, env: &Environment) -> RResult<RValue> {
        match expr {
            Expr::Constant(value) => Ok(value.clone()),
            Expr::Lookup(symbol) => self.lookup(symbol, env),
            Expr::Call { function, args } => match self.resolve_callee(function, env)? {
                Callee::Closure(closure) => self.call_closure(&closure, args, env),
                Callee::Builtin(name) => builtin::call_builtin(self, &name, args, env),
            },
            Expr::Missing(args) => self.eval_missing(args, env),
            Expr::Index {
                target,
                positions,
                mode,
            } => {
                let container = self.eval(target, env)?;
                let positions = self.eval_positions(positions, env)?;
                self.extractor.apply(&container, &positions, *mode, true)
            }
            Expr::Assign { symbol, value } => {
                let value = self.eval(value, env)?;
                env.assign(symbol.clone(), value.clone());
                Ok(value)
            }
            Expr::AssignIndex {
                symbol,
                positions,
                mode,
                value,
            } => {
                let value = self.eval(value, env)?;
                let positions = self.eval_positions(positions, env)?;
                let container = self.lookup(symbol, env)?;
                let updated = self
                    .replacer
                    .apply(container, &positions, value.clone(), *mode)?;
                env.assign(symbol.clone(), updated);
                Ok(value)
            }
            Expr::Function(function) => Ok(RValue::Closure(Closure::new(
                function.clone(),
                env.clone(),
            ))),
            Expr::Block(exprs) => {
                let mut last = RValue::Null;
                for expr in exprs {
                    last = self.eval(expr, env)?;
                }
                Ok(last)
            }
        }
    }

    /// Value of `symbol`, forcing a promise if one is bound.
    pub fn lookup(&self, symbol: &Symbol, env: &Environment) -> RResult<RValue> {
        match env.lookup(symbol) {
            None => Err(RError::ObjectNotFound(symbol.clone())),
            Some(Binding::Value(value)) => Ok(value),
            Some(Binding::Promise(promise)) => self.force(&promise),
            Some(Binding::Missing) => Err(RError::MissingArgument(symbol.clone())),
        }
    }

    pub fn force(&self, promise: &Promise) -> RResult<RValue> {
        promise.force(|expr, env| self.eval(expr, env))
    }

    pub fn call_closure(&self, closure: &Closure, args: &[Arg], caller: &Environment) -> RResult<RValue> {
        let frame = call::bind_arguments(closure, args, caller)?;
        trace!(target: "rcore::eval", function = closure.name(), "Evaluating closure body");
        self.eval(closure.function().body(), &frame)
    }

    pub(crate) fn eval_missing(&self, args: &[Expr], env: &Environment) -> RResult<RValue> {
        let symbol = missing_argument_symbol(args)?;
        let missing = self.missing.is_missing(&symbol, env);
        trace!(target: "rcore::eval", symbol = %symbol, missing, "missing()");
        Ok(RValue::logical(missing))
    }

    pub(crate) fn eval_arg(&self, arg: &Arg, env: &Environment) -> RResult<RValue> {
        match arg.expr() {
            Some(expr) => self.eval(expr, env),
            None => Err(RError::runtime("argument is empty")),
        }
    }

    fn eval_positions(&self, positions: &[Option<Expr>], env: &Environment) -> RResult<Vec<PositionArg>> {
        positions
            .iter()
            .map(|position| match position {
                Some(expr) => self.eval(expr, env).map(PositionArg::Value),
                None => Ok(PositionArg::Empty),
            })
            .collect()
    }

    fn resolve_callee(&self, function: &Expr, env: &Environment) -> RResult<Callee> {
        let Expr::Lookup(name) = function else {
            return match self.eval(function, env)? {
                RValue::Closure(closure) => Ok(Callee::Closure(closure)),
                _ => Err(RError::runtime("attempt to apply non-function")),
            };
        };

        let mut frame = Some(env.clone());
        while let Some(current) = frame {
            let value = match current.get_local(name) {
                Some(Binding::Value(value)) => Some(value),
                Some(Binding::Promise(promise)) => Some(self.force(&promise)?),
                Some(Binding::Missing) => return Err(RError::MissingArgument(name.clone())),
                None => None,
            };
            if let Some(RValue::Closure(closure)) = value {
                return Ok(Callee::Closure(closure));
            }
            frame = current.parent().cloned();
        }

        if builtin::is_builtin(name.as_str()) {
            return Ok(Callee::Builtin(name.clone()));
        }
        Err(RError::runtime(format!(
            "could not find function \"{}\"",
            name
        )))
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Interpreter::new(&EngineConfig::default())
    }
}
