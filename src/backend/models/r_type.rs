//! Value types and their promotion order.

use std::fmt;

use crate::backend::errors::{RError, RResult};

/// The type of an R value.
///
/// The declaration order of the vector types is the promotion rank used by
/// replacement and coercion: `Null < Logical < Integer < Double < Complex <
/// Character < List`. `Symbol`, `Closure` and `Foreign` never take part in
/// promotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RType {
    Null,
    Logical,
    Integer,
    Double,
    Complex,
    Character,
    List,
    Symbol,
    Closure,
    Foreign,
}

impl RType {
    /// Map an R mode string to a type (`mode(x)` / `vector(mode, n)` style).
    pub fn from_mode(mode: &str) -> RResult<RType> {
        match mode {
            "logical" => Ok(RType::Logical),
            "integer" => Ok(RType::Integer),
            "double" | "numeric" => Ok(RType::Double),
            "complex" => Ok(RType::Complex),
            "character" => Ok(RType::Character),
            "list" => Ok(RType::List),
            "NULL" => Ok(RType::Null),
            "name" | "symbol" => Ok(RType::Symbol),
            "function" | "closure" => Ok(RType::Closure),
            other => Err(RError::coercion(format!("invalid 'mode' argument: '{}'", other))),
        }
    }

    /// The `typeof()` name.
    pub fn type_name(&self) -> &'static str {
        match self {
            RType::Null => "NULL",
            RType::Logical => "logical",
            RType::Integer => "integer",
            RType::Double => "double",
            RType::Complex => "complex",
            RType::Character => "character",
            RType::List => "list",
            RType::Symbol => "symbol",
            RType::Closure => "closure",
            RType::Foreign => "foreign",
        }
    }

    /// The implicit class used when a value carries no `class` attribute.
    pub fn implicit_class(&self) -> &'static str {
        match self {
            RType::Null => "NULL",
            RType::Logical => "logical",
            RType::Integer => "integer",
            RType::Double => "numeric",
            RType::Complex => "complex",
            RType::Character => "character",
            RType::List => "list",
            RType::Symbol => "name",
            RType::Closure => "function",
            RType::Foreign => "foreign",
        }
    }

    /// Logical through List
    pub fn is_vector(&self) -> bool {
        matches!(
            self,
            RType::Logical
                | RType::Integer
                | RType::Double
                | RType::Complex
                | RType::Character
                | RType::List
        )
    }

    pub fn is_atomic(&self) -> bool {
        self.is_vector() && *self != RType::List
    }

    /// The common type two vector types promote to.
    pub fn promote(self, other: RType) -> RType {
        self.max(other)
    }
}

impl fmt::Display for RType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}
