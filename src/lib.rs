//! rcore - R argument-promise evaluation and vector indexing engine
//!
//! This library implements the parts of an R runtime that decide *when*
//! arguments are evaluated and *how* vectors are read and written.
//!
//! # Architecture
//!
//! 1. **Values** (`backend::models`)
//!    - Copy-on-write vectors of the six R vector types
//!    - Lazily created attributes: `names`, `dim`, `dimnames`, `class`
//!
//! 2. **Promises** (`backend::promise`, `backend::missing`)
//!    - Evaluate-once argument promises with recursion detection
//!    - `missing()` that follows forwarded arguments across frames
//!
//! 3. **Element access** (`backend::access`)
//!    - `[`, `[[` and `$` with positive, negative, logical, character and
//!      empty positions, matrices and arrays through `dim`
//!    - Assignment with promotion, recycling, extension and deletion
//!    - Plan caches keyed on the call shape
//!
//! 4. **Evaluator** (`backend::eval`)
//!    - Call setup building promises for actual arguments and defaults
//!
//! # Example
//!
//! ```rust
//! use rcore::backend::*;
//!
//! let interp = Interpreter::default();
//! let result = interp.run(&[
//!     Expr::assign("x", Expr::constant(RValue::ints(vec![1, 2]))),
//!     Expr::assign_index(
//!         "x",
//!         vec![Some(Expr::constant(RValue::int(4)))],
//!         ElementAccessMode::Subset,
//!         Expr::constant(RValue::double(0.5)),
//!     ),
//!     Expr::lookup("x"),
//! ]);
//! assert_eq!(result.unwrap().len(), 4);
//! ```

pub mod backend;

pub use backend::{
    as_character, extract, init_logging, is_missing, replace, EngineConfig, Environment,
    Interpreter, Promise, RError, RResult, RValue, RVector, Symbol,
};
