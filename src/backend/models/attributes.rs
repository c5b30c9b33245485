//! Attribute storage and the well-known attributes.
//!
//! A vector's attribute map is `None` until the first write
//! (`init_attributes`). The map keeps insertion order like R's pairlist
//! and setting an attribute to `NULL` removes it.

use smallvec::SmallVec;
use std::sync::Arc;

use super::r_type::RType;
use super::r_value::RValue;
use super::vector::{RVector, VectorData};
use crate::backend::errors::{RError, RResult};
use crate::backend::symbol::{intern, Symbol};

pub const NAMES: &str = "names";
pub const DIM: &str = "dim";
pub const DIMNAMES: &str = "dimnames";
pub const CLASS: &str = "class";

/// Ordered attribute name → value mapping.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Attributes {
    entries: SmallVec<[(Symbol, RValue); 4]>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&RValue> {
        self.entries
            .iter()
            .find(|(k, _)| k.as_str() == name)
            .map(|(_, v)| v)
    }

    /// Insert or overwrite; `NULL` removes the entry.
    pub fn put(&mut self, name: Symbol, value: RValue) {
        if value.is_null() {
            self.remove(name.as_str());
            return;
        }
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<RValue> {
        let pos = self.entries.iter().position(|(k, _)| k.as_str() == name)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Symbol, &RValue)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }
}

impl RVector {
    /// The attribute map, `None` if no attribute was ever written.
    pub fn get_attributes(&self) -> Option<&Attributes> {
        self.attributes.as_deref()
    }

    /// The attribute map, allocating an empty one on first use.
    pub fn init_attributes(&mut self) -> &mut Attributes {
        self.attributes.get_or_insert_with(Box::default)
    }

    pub fn get_attr(&self, name: &str) -> Option<&RValue> {
        self.attributes.as_deref().and_then(|a| a.get(name))
    }

    /// Set an attribute, validating `names` and `dim`.
    pub fn set_attr(&mut self, name: &str, value: RValue) -> RResult<()> {
        match name {
            NAMES if !value.is_null() => {
                let names = names_from_value(&value)?;
                return self.set_names(Some(names));
            }
            DIM if !value.is_null() => {
                let dim = dim_from_value(&value)?;
                return self.set_dim(Some(dim));
            }
            _ => {}
        }
        if value.is_null() {
            self.remove_attr(name);
        } else {
            self.init_attributes().put(intern(name), value);
        }
        Ok(())
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<RValue> {
        let attrs = self.attributes.as_mut()?;
        let removed = attrs.remove(name);
        if attrs.is_empty() {
            self.attributes = None;
        }
        removed
    }

    /// The `names` attribute as strings (`None` entries are NA names).
    pub fn names(&self) -> Option<Vec<Option<String>>> {
        match self.get_attr(NAMES)? {
            RValue::Vector(v) => match v.data() {
                VectorData::Character(names) => Some(names.as_ref().clone()),
                _ => None,
            },
            _ => None,
        }
    }

    /// Set or clear `names`. Shorter name vectors are padded with NA;
    /// longer ones are an error.
    pub fn set_names(&mut self, names: Option<Vec<Option<String>>>) -> RResult<()> {
        let Some(mut names) = names else {
            self.remove_attr(NAMES);
            return Ok(());
        };
        if names.len() > self.len() {
            return Err(RError::index(format!(
                "'names' attribute [{}] must be the same length as the vector [{}]",
                names.len(),
                self.len()
            )));
        }
        names.resize(self.len(), None);
        let value = RValue::Vector(RVector::character(names));
        self.init_attributes().put(intern(NAMES), value);
        Ok(())
    }

    pub fn dim(&self) -> Option<Vec<usize>> {
        match self.get_attr(DIM)? {
            RValue::Vector(v) => match v.data() {
                VectorData::Integer(d) => Some(d.iter().map(|&x| x.max(0) as usize).collect()),
                _ => None,
            },
            _ => None,
        }
    }

    /// Set or clear `dim`. Clearing also drops `dimnames`.
    pub fn set_dim(&mut self, dim: Option<Vec<usize>>) -> RResult<()> {
        let Some(dim) = dim else {
            self.remove_attr(DIM);
            self.remove_attr(DIMNAMES);
            return Ok(());
        };
        let product = dim
            .iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d))
            .ok_or_else(|| RError::index("dims product is too large"))?;
        if product != self.len() {
            return Err(RError::index(format!(
                "dims [product {}] do not match the length of object [{}]",
                product,
                self.len()
            )));
        }
        let value = RValue::Vector(RVector::integer(dim.iter().map(|&d| d as i32).collect()));
        self.init_attributes().put(intern(DIM), value);
        Ok(())
    }

    /// `dimnames` as one optional name vector per dimension.
    pub fn dimnames(&self) -> Option<Vec<Option<Vec<Option<String>>>>> {
        let RValue::Vector(list) = self.get_attr(DIMNAMES)? else {
            return None;
        };
        let VectorData::List(entries) = list.data() else {
            return None;
        };
        Some(
            entries
                .iter()
                .map(|entry| match entry {
                    RValue::Vector(v) => match v.data() {
                        VectorData::Character(n) => Some(n.as_ref().clone()),
                        _ => None,
                    },
                    _ => None,
                })
                .collect(),
        )
    }

    pub fn set_dimnames(&mut self, dimnames: Vec<Option<Vec<Option<String>>>>) -> RResult<()> {
        let dim = self
            .dim()
            .ok_or_else(|| RError::index("'dimnames' applied to non-array"))?;
        if dimnames.len() != dim.len() {
            return Err(RError::index(format!(
                "length of 'dimnames' [{}] must match that of 'dims' [{}]",
                dimnames.len(),
                dim.len()
            )));
        }
        let mut entries = Vec::with_capacity(dimnames.len());
        for (k, names) in dimnames.into_iter().enumerate() {
            entries.push(match names {
                Some(n) if n.len() != dim[k] => {
                    return Err(RError::index(format!(
                        "length of 'dimnames' [{}] not equal to array extent",
                        k + 1
                    )))
                }
                Some(n) => RValue::Vector(RVector::character(n)),
                None => RValue::Null,
            });
        }
        self.init_attributes()
            .put(intern(DIMNAMES), RValue::Vector(RVector::list(entries)));
        Ok(())
    }

    /// True if the vector carries an explicit `class` attribute.
    pub fn is_object(&self) -> bool {
        self.get_attr(CLASS).is_some()
    }

    /// Explicit `class` attribute, or the implicit class chain.
    pub fn class_hierarchy(&self) -> Vec<String> {
        if let Some(RValue::Vector(v)) = self.get_attr(CLASS) {
            if let VectorData::Character(classes) = v.data() {
                return classes.iter().flatten().cloned().collect();
            }
        }
        let mut classes = Vec::new();
        match self.dim().map(|d| d.len()) {
            Some(2) => classes.extend(["matrix".to_string(), "array".to_string()]),
            Some(_) => classes.push("array".to_string()),
            None => {}
        }
        if self.rtype() == RType::Integer || self.rtype() == RType::Double {
            if self.rtype() == RType::Integer {
                classes.push("integer".to_string());
            }
            classes.push("numeric".to_string());
        } else {
            classes.push(self.rtype().implicit_class().to_string());
        }
        classes
    }

    pub fn set_class(&mut self, classes: &[&str]) {
        let value = RVector::character(classes.iter().map(|c| Some(c.to_string())).collect());
        self.init_attributes().put(intern(CLASS), RValue::Vector(value));
    }
}

fn names_from_value(value: &RValue) -> RResult<Vec<Option<String>>> {
    match value {
        RValue::Vector(v) => match v.data() {
            VectorData::Character(n) => Ok(n.as_ref().clone()),
            other if other.rtype().is_atomic() => {
                let cast = crate::backend::coerce::cast_data(other, RType::Character)?;
                match cast {
                    VectorData::Character(n) => Ok(Arc::try_unwrap(n).unwrap_or_else(|a| (*a).clone())),
                    _ => Err(RError::coercion("invalid 'names' attribute")),
                }
            }
            _ => Err(RError::coercion("invalid 'names' attribute")),
        },
        _ => Err(RError::coercion("invalid 'names' attribute")),
    }
}

fn dim_from_value(value: &RValue) -> RResult<Vec<usize>> {
    let invalid = || RError::index("invalid 'dim' attribute");
    let RValue::Vector(v) = value else {
        return Err(invalid());
    };
    let dims: Vec<f64> = match v.data() {
        VectorData::Integer(d) => d.iter().map(|&x| x as f64).collect(),
        VectorData::Double(d) => d.as_ref().clone(),
        _ => return Err(invalid()),
    };
    if dims.is_empty() {
        return Err(RError::index("length-0 dimension vector is invalid"));
    }
    dims.into_iter()
        .map(|d| {
            if d.is_nan() || d < 0.0 {
                Err(RError::index("the dims contain missing or negative values"))
            } else {
                Ok(d as usize)
            }
        })
        .collect()
}
