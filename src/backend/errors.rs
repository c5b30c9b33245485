//! Runtime errors raised by the engine.
//!
//! Every error surfaces to the calling interpreter frame as a user-visible R
//! error carrying a message. The only places that swallow an error are the
//! class-dispatch fallback in `coerce::as_character` and the state
//! restoration on the missingness path.

use std::fmt;

use super::symbol::Symbol;

/// Result type used throughout the engine
pub type RResult<T> = Result<T, RError>;

/// Error type for promise forcing, missingness checks and vector access
#[derive(Debug, Clone, PartialEq)]
pub enum RError {
    /// Wrong arity for an operation expecting a fixed argument shape
    InvalidArgumentCount {
        function: String,
        expected: usize,
        supplied: usize,
    },

    /// A promise was forced while already under evaluation
    RecursiveForce,

    /// Bad subscript: non-multiple replacement length, mixed signs,
    /// out-of-bounds, invalid names or dim vector
    Index(String),

    /// A value cannot be coerced to the requested type
    TypeCoercion(String),

    /// Foreign key not readable/writable, or wrong position shape
    ForeignAccess(String),

    /// An argument without a default was read but never supplied
    MissingArgument(Symbol),

    /// A symbol lookup failed in every enclosing frame
    ObjectNotFound(Symbol),

    /// Any other runtime error
    Runtime(String),

    /// Invalid engine configuration
    Config(String),
}

impl RError {
    pub fn index(msg: impl Into<String>) -> Self {
        RError::Index(msg.into())
    }

    pub fn coercion(msg: impl Into<String>) -> Self {
        RError::TypeCoercion(msg.into())
    }

    pub fn foreign(msg: impl Into<String>) -> Self {
        RError::ForeignAccess(msg.into())
    }

    pub fn runtime(msg: impl Into<String>) -> Self {
        RError::Runtime(msg.into())
    }
}

impl fmt::Display for RError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RError::InvalidArgumentCount {
                function,
                expected,
                supplied,
            } => write!(
                f,
                "{} arguments passed to '{}' which requires {}",
                supplied, function, expected
            ),
            RError::RecursiveForce => write!(
                f,
                "promise already under evaluation: recursive default argument reference or earlier problems?"
            ),
            RError::Index(msg) => write!(f, "{}", msg),
            RError::TypeCoercion(msg) => write!(f, "{}", msg),
            RError::ForeignAccess(msg) => write!(f, "{}", msg),
            RError::MissingArgument(name) => {
                write!(f, "argument \"{}\" is missing, with no default", name)
            }
            RError::ObjectNotFound(name) => write!(f, "object '{}' not found", name),
            RError::Runtime(msg) => write!(f, "{}", msg),
            RError::Config(msg) => write!(f, "invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for RError {}
