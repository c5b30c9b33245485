use std::sync::Arc;

use super::closure::Function;
use crate::backend::access::ElementAccessMode;
use crate::backend::models::RValue;
use crate::backend::symbol::{intern, Symbol};

/// Expression tree driven by the interpreter.
#[derive(Debug, Clone)]
pub enum Expr {
    Constant(RValue),
    Lookup(Symbol),
    Call {
        function: Box<Expr>,
        args: Vec<Arg>,
    },
    /// `missing(x)`
    Missing(Vec<Expr>),
    /// `x[i]`, `x[[i]]`, `x$name`; `None` is an omitted position
    Index {
        target: Box<Expr>,
        positions: Vec<Option<Expr>>,
        mode: ElementAccessMode,
    },
    /// `x <- value`
    Assign { symbol: Symbol, value: Box<Expr> },
    /// `x[i] <- value` and friends
    AssignIndex {
        symbol: Symbol,
        positions: Vec<Option<Expr>>,
        mode: ElementAccessMode,
        value: Box<Expr>,
    },
    /// `function(formals) body`
    Function(Arc<Function>),
    Block(Vec<Expr>),
}

/// One actual argument of a call.
#[derive(Debug, Clone)]
pub enum Arg {
    Positional(Expr),
    Named(Symbol, Expr),
    /// `f(, y)`
    Empty,
}

impl Expr {
    pub fn lookup(name: &str) -> Self {
        Expr::Lookup(intern(name))
    }

    pub fn constant(value: impl Into<RValue>) -> Self {
        Expr::Constant(value.into())
    }

    /// Call of the function bound to `name`.
    pub fn call(name: &str, args: Vec<Arg>) -> Self {
        Expr::Call {
            function: Box::new(Expr::lookup(name)),
            args,
        }
    }

    pub fn index(target: Expr, positions: Vec<Option<Expr>>, mode: ElementAccessMode) -> Self {
        Expr::Index {
            target: Box::new(target),
            positions,
            mode,
        }
    }

    pub fn assign(name: &str, value: Expr) -> Self {
        Expr::Assign {
            symbol: intern(name),
            value: Box::new(value),
        }
    }

    pub fn assign_index(
        name: &str,
        positions: Vec<Option<Expr>>,
        mode: ElementAccessMode,
        value: Expr,
    ) -> Self {
        Expr::AssignIndex {
            symbol: intern(name),
            positions,
            mode,
            value: Box::new(value),
        }
    }

    /// The symbol of a bare-name expression.
    pub fn as_symbol(&self) -> Option<&Symbol> {
        match self {
            Expr::Lookup(symbol) => Some(symbol),
            _ => None,
        }
    }
}

impl Arg {
    pub fn positional(expr: Expr) -> Self {
        Arg::Positional(expr)
    }

    pub fn named(name: &str, expr: Expr) -> Self {
        Arg::Named(intern(name), expr)
    }

    pub fn expr(&self) -> Option<&Expr> {
        match self {
            Arg::Positional(expr) | Arg::Named(_, expr) => Some(expr),
            Arg::Empty => None,
        }
    }
}

impl From<Expr> for Arg {
    fn from(expr: Expr) -> Self {
        Arg::Positional(expr)
    }
}
