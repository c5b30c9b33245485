use std::fmt;

use super::element::{logical_from_bool, RComplex};
use super::foreign::ForeignRef;
use super::r_type::RType;
use super::vector::{RVector, VectorData};
use crate::backend::eval::Closure;
use crate::backend::symbol::{intern, Symbol};

/// An R value.
#[derive(Debug, Clone, PartialEq)]
pub enum RValue {
    /// `NULL`
    Null,
    /// A `name` object
    Symbol(Symbol),
    /// Any attributed vector, lists included
    Vector(RVector),
    /// A function closed over its defining environment
    Closure(Closure),
    /// A container outside the native value model
    Foreign(ForeignRef),
}

impl RValue {
    pub fn int(value: i32) -> Self {
        RValue::Vector(RVector::integer(vec![value]))
    }

    pub fn ints(values: Vec<i32>) -> Self {
        RValue::Vector(RVector::integer(values))
    }

    pub fn double(value: f64) -> Self {
        RValue::Vector(RVector::double(vec![value]))
    }

    pub fn doubles(values: Vec<f64>) -> Self {
        RValue::Vector(RVector::double(values))
    }

    pub fn logical(value: bool) -> Self {
        RValue::Vector(RVector::logical(vec![logical_from_bool(value)]))
    }

    pub fn logicals(values: Vec<u8>) -> Self {
        RValue::Vector(RVector::logical(values))
    }

    pub fn complexes(values: Vec<RComplex>) -> Self {
        RValue::Vector(RVector::complex(values))
    }

    pub fn string(value: &str) -> Self {
        RValue::Vector(RVector::character(vec![Some(value.to_string())]))
    }

    pub fn strings(values: &[&str]) -> Self {
        RValue::Vector(RVector::character(
            values.iter().map(|s| Some(s.to_string())).collect(),
        ))
    }

    pub fn list(values: Vec<RValue>) -> Self {
        RValue::Vector(RVector::list(values))
    }

    pub fn symbol(name: &str) -> Self {
        RValue::Symbol(intern(name))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, RValue::Null)
    }

    pub fn rtype(&self) -> RType {
        match self {
            RValue::Null => RType::Null,
            RValue::Symbol(_) => RType::Symbol,
            RValue::Vector(v) => v.rtype(),
            RValue::Closure(_) => RType::Closure,
            RValue::Foreign(_) => RType::Foreign,
        }
    }

    /// Length as R's `length()` reports it.
    pub fn len(&self) -> usize {
        match self {
            RValue::Null => 0,
            RValue::Vector(v) => v.len(),
            RValue::Symbol(_) | RValue::Closure(_) | RValue::Foreign(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_vector(&self) -> Option<&RVector> {
        match self {
            RValue::Vector(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_vector(self) -> Option<RVector> {
        match self {
            RValue::Vector(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, RValue::Vector(v) if v.rtype() == RType::List)
    }

    /// The single string of a length-1 character vector, or a symbol's name.
    pub fn as_string_scalar(&self) -> Option<&str> {
        match self {
            RValue::Symbol(s) => Some(s.as_str()),
            RValue::Vector(v) if v.len() == 1 => match v.data() {
                VectorData::Character(s) => s[0].as_deref(),
                _ => None,
            },
            _ => None,
        }
    }

    /// Class chain used for dispatch.
    pub fn class_hierarchy(&self) -> Vec<String> {
        match self {
            RValue::Vector(v) => v.class_hierarchy(),
            other => vec![other.rtype().implicit_class().to_string()],
        }
    }
}

impl From<RVector> for RValue {
    fn from(v: RVector) -> Self {
        RValue::Vector(v)
    }
}

impl fmt::Display for RValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RValue::Null => write!(f, "NULL"),
            RValue::Symbol(s) => write!(f, "{}", s),
            RValue::Vector(v) => write!(f, "<{} vector of length {}>", v.rtype(), v.len()),
            RValue::Closure(c) => write!(f, "<closure {}>", c.name()),
            RValue::Foreign(_) => write!(f, "<foreign object>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lengths() {
        assert_eq!(RValue::Null.len(), 0);
        assert_eq!(RValue::ints(vec![1, 2, 3]).len(), 3);
        assert_eq!(RValue::symbol("x").len(), 1);
    }

    #[test]
    fn test_string_scalar() {
        assert_eq!(RValue::string("a").as_string_scalar(), Some("a"));
        assert_eq!(RValue::symbol("x").as_string_scalar(), Some("x"));
        assert_eq!(RValue::strings(&["a", "b"]).as_string_scalar(), None);
        assert_eq!(RValue::int(1).as_string_scalar(), None);
    }

    #[test]
    fn test_class_hierarchy_of_non_vectors() {
        assert_eq!(RValue::Null.class_hierarchy(), vec!["NULL"]);
        assert_eq!(RValue::symbol("x").class_hierarchy(), vec!["name"]);
        assert!(RValue::list(vec![]).is_list());
    }
}
