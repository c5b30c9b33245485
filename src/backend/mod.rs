// Backend module for the promise and vector access engine
//
// This module provides:
// - `models`: R values, vectors and their attributes
// - `promise` / `missing`: argument promises and the `missing()` resolver
// - `access`: index resolution, extraction and replacement
// - `coerce` / `dispatch`: element casts and class-dispatched `as.character`
// - `eval`: call setup and a small evaluator driving the above

pub mod access;
pub mod coerce;
pub mod config;
pub mod dispatch;
pub mod environment;
pub mod errors;
pub mod eval;
pub mod logging;
pub mod missing;
pub mod models;
pub mod promise;
pub mod symbol;

pub use access::{
    extract, replace, resolve_positions, ElementAccessMode, PositionArg, VectorExtractor,
    VectorReplacer,
};
pub use coerce::as_character;
pub use config::{EngineConfig, LoggingConfig};
pub use dispatch::{ClassMethod, MethodTable};
pub use environment::{Binding, Environment, FrameDescriptor};
pub use errors::{RError, RResult};
pub use eval::{Arg, Closure, Expr, Formal, Function, Interpreter};
pub use logging::init_logging;
pub use missing::{is_missing, MissingChecker};
pub use models::*;
pub use promise::{Promise, PromiseState};
pub use symbol::{intern, intern_string, Symbol};
