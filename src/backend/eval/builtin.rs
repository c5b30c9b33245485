//! Builtins reachable by name when no R binding shadows them.

use tracing::trace;

use super::expression::{Arg, Expr};
use super::Interpreter;
use crate::backend::coerce::as_character;
use crate::backend::environment::Environment;
use crate::backend::errors::{RError, RResult};
use crate::backend::models::RValue;
use crate::backend::symbol::Symbol;

pub(super) const BUILTINS: &[&str] = &["missing", "as.character", "force", "is.null"];

pub(super) fn is_builtin(name: &str) -> bool {
    BUILTINS.contains(&name)
}

pub(super) fn call_builtin(
    interp: &Interpreter,
    name: &Symbol,
    args: &[Arg],
    env: &Environment,
) -> RResult<RValue> {
    trace!(target: "rcore::eval", builtin = %name, "Calling builtin");
    match name.as_str() {
        "missing" => {
            let exprs = args
                .iter()
                .map(|arg| arg.expr().cloned().unwrap_or(Expr::Constant(RValue::Null)))
                .collect::<Vec<_>>();
            interp.eval_missing(&exprs, env)
        }
        "as.character" => {
            require_one_arg!("as.character", args);
            let value = interp.eval_arg(&args[0], env)?;
            as_character(&value, interp.methods())
        }
        "force" => {
            require_one_arg!("force", args);
            interp.eval_arg(&args[0], env)
        }
        "is.null" => {
            require_one_arg!("is.null", args);
            Ok(RValue::logical(interp.eval_arg(&args[0], env)?.is_null()))
        }
        other => Err(RError::runtime(format!(
            "could not find function \"{}\"",
            other
        ))),
    }
}
