//! The read side of indexing.
//!
//! `[` keeps `names` (NA names for NA selections) and drops every other
//! attribute, except that matrix access keeps `dim`/`dimnames` unless `drop`
//! removes extents of 1. `[[` returns one element: the element itself for
//! lists, a length-1 vector for atomic vectors. `$` looks a name up in a list.

use std::sync::Arc;

use tracing::{debug, trace};

use super::positions::{
    classify, find_name, resolve_matrix, resolve_single, resolve_vector, PositionArg, Purpose,
    SingleIndex,
};
use super::{capacity, foreign, recursive, AccessShape, ElementAccessMode, PlanCache, PlanCacheStats};
use crate::backend::errors::{RError, RResult};
use crate::backend::models::{RType, RValue, RVector};

/// Extraction strategy fixed by a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractStrategy {
    Foreign,
    Null,
    Subset,
    Matrix,
    Subscript,
    Recursive,
    Field,
}

#[derive(Debug)]
pub struct ExtractPlan {
    shape: AccessShape,
    strategy: ExtractStrategy,
}

impl ExtractPlan {
    pub fn build(shape: &AccessShape) -> RResult<Self> {
        let strategy = match (shape.container, shape.mode) {
            (RType::Foreign, _) => ExtractStrategy::Foreign,
            (RType::Null, _) => ExtractStrategy::Null,
            (ty, _) if !ty.is_vector() => {
                return Err(RError::runtime(format!(
                    "object of type '{}' is not subsettable",
                    ty.type_name()
                )))
            }
            (_, ElementAccessMode::Field) => {
                if shape.container != RType::List {
                    return Err(RError::runtime("$ operator is invalid for atomic vectors"));
                }
                ExtractStrategy::Field
            }
            (_, ElementAccessMode::Subscript) if shape.positions.is_empty() => {
                return Err(RError::index("invalid subscript type 'symbol'"))
            }
            (_, ElementAccessMode::Subscript) if shape.recursive => ExtractStrategy::Recursive,
            _ if shape.is_matrix() => ExtractStrategy::Matrix,
            _ if shape.positions.len() > 1 => {
                return Err(RError::index("incorrect number of dimensions"))
            }
            (_, ElementAccessMode::Subscript) => ExtractStrategy::Subscript,
            (_, ElementAccessMode::Subset) => ExtractStrategy::Subset,
        };
        Ok(ExtractPlan {
            shape: shape.clone(),
            strategy,
        })
    }

    pub fn strategy(&self) -> ExtractStrategy {
        self.strategy
    }

    /// Guard: the plan applies only to calls of the shape it was built for.
    pub fn applies_to(&self, shape: &AccessShape) -> bool {
        &self.shape == shape
    }

    pub fn execute(
        &self,
        container: &RValue,
        positions: &[PositionArg],
        drop: bool,
    ) -> RResult<RValue> {
        let vector = match container {
            RValue::Foreign(object) => return foreign::read(object, positions),
            RValue::Null => return Ok(RValue::Null),
            RValue::Vector(v) => v,
            other => {
                return Err(RError::runtime(format!(
                    "object of type '{}' is not subsettable",
                    other.rtype().type_name()
                )))
            }
        };
        match self.strategy {
            ExtractStrategy::Foreign | ExtractStrategy::Null => Err(RError::runtime(
                "internal error: extraction plan does not match container",
            )),
            ExtractStrategy::Subset => subset(vector, positions),
            ExtractStrategy::Matrix if self.shape.mode == ElementAccessMode::Subscript => {
                let cell = subset_matrix(vector, positions, true)?;
                match cell.as_vector() {
                    Some(v) if v.len() == 1 => v
                        .element(0)
                        .ok_or_else(|| RError::index("subscript out of bounds")),
                    _ => Err(RError::index("attempt to select more than one element")),
                }
            }
            ExtractStrategy::Matrix => subset_matrix(vector, positions, drop),
            ExtractStrategy::Subscript => subscript(vector, &positions[0]),
            ExtractStrategy::Recursive => match &positions[0] {
                PositionArg::Value(path) => recursive::extract_path(vector, path),
                PositionArg::Empty => Err(RError::index("invalid subscript type 'symbol'")),
            },
            ExtractStrategy::Field => field(vector, positions),
        }
    }
}

/// `x[...]`, `x[[...]]` or `x$name` without a plan cache.
pub fn extract(
    container: &RValue,
    positions: &[PositionArg],
    mode: ElementAccessMode,
    drop: bool,
) -> RResult<RValue> {
    let shape = AccessShape::of(container, positions, None, mode);
    ExtractPlan::build(&shape)?.execute(container, positions, drop)
}

/// Extraction with a bounded cache of plans per call shape.
pub struct VectorExtractor {
    plans: PlanCache<ExtractPlan>,
}

impl VectorExtractor {
    pub fn new(cache_size: usize) -> Self {
        VectorExtractor {
            plans: PlanCache::new(capacity(cache_size)),
        }
    }

    pub fn apply(
        &self,
        container: &RValue,
        positions: &[PositionArg],
        mode: ElementAccessMode,
        drop: bool,
    ) -> RResult<RValue> {
        let shape = AccessShape::of(container, positions, None, mode);
        let mut plan = self.plans.get_or_build(&shape, |shape| {
            debug!(target: "rcore::extract", ?shape, "Building extraction plan");
            ExtractPlan::build(shape)
        })?;
        if !plan.applies_to(&shape) {
            debug!(target: "rcore::extract", ?shape, "Extraction plan guard failed, rebuilding");
            plan = Arc::new(ExtractPlan::build(&shape)?);
        }
        plan.execute(container, positions, drop)
    }

    pub fn stats(&self) -> PlanCacheStats {
        self.plans.stats()
    }

    pub fn cached_plans(&self) -> usize {
        self.plans.len()
    }

    pub fn clear(&self) {
        self.plans.clear();
    }
}

impl Default for VectorExtractor {
    fn default() -> Self {
        VectorExtractor::new(5)
    }
}

fn subset(vector: &RVector, positions: &[PositionArg]) -> RResult<RValue> {
    let arg = match positions.first() {
        None | Some(PositionArg::Empty) => return Ok(RValue::Vector(vector.clone())),
        Some(arg) => arg,
    };
    let names = vector.names();
    let position = classify(arg)?;
    let selection = resolve_vector(vector.len(), names.as_deref(), &position, Purpose::Extract);
    trace!(target: "rcore::extract", selected = selection.indices.len(), "Subset");

    let mut result = RVector::new(vector.data().select(&selection.indices));
    if let Some(names) = names {
        let picked = selection
            .indices
            .iter()
            .map(|idx| idx.and_then(|i| names[i].clone()))
            .collect();
        result.set_names(Some(picked))?;
    }
    Ok(RValue::Vector(result))
}

fn subset_matrix(vector: &RVector, positions: &[PositionArg], drop: bool) -> RResult<RValue> {
    let dims = vector.dim().unwrap_or_default();
    let selection = resolve_matrix(vector, &dims, positions)?;
    let per_dim = selection.per_dim.unwrap_or_default();
    let mut result = RVector::new(vector.data().select(&selection.indices));

    let dimnames = vector.dimnames();
    let picked_names: Vec<Option<Vec<Option<String>>>> = per_dim
        .iter()
        .enumerate()
        .map(|(k, sel)| {
            let names = dimnames.as_ref()?.get(k)?.as_ref()?;
            Some(sel.iter().map(|idx| idx.and_then(|i| names[i].clone())).collect())
        })
        .collect();
    let extents: Vec<usize> = per_dim.iter().map(Vec::len).collect();

    let kept: Vec<usize> = if drop {
        (0..extents.len()).filter(|&k| extents[k] != 1).collect()
    } else {
        (0..extents.len()).collect()
    };
    if kept.len() <= 1 {
        if let Some(&k) = kept.first() {
            if let Some(names) = &picked_names[k] {
                result.set_names(Some(names.clone()))?;
            }
        }
        return Ok(RValue::Vector(result));
    }

    result.set_dim(Some(kept.iter().map(|&k| extents[k]).collect()))?;
    if picked_names.iter().any(Option::is_some) {
        result.set_dimnames(kept.iter().map(|&k| picked_names[k].clone()).collect())?;
    }
    Ok(RValue::Vector(result))
}

fn subscript(vector: &RVector, arg: &PositionArg) -> RResult<RValue> {
    let is_list = vector.rtype() == RType::List;
    match resolve_single(vector, arg)? {
        SingleIndex::Index(i) => vector
            .element(i)
            .ok_or_else(|| RError::index("subscript out of bounds")),
        SingleIndex::NotFound if is_list => Ok(RValue::Null),
        SingleIndex::Na if is_list => Ok(RValue::Null),
        SingleIndex::NotFound => Err(RError::index("subscript out of bounds")),
        SingleIndex::Na => Ok(RValue::Vector(RVector::new(
            vector.data().select(&[None]),
        ))),
    }
}

fn field(vector: &RVector, positions: &[PositionArg]) -> RResult<RValue> {
    let name = field_name(positions)?;
    let names = vector.names().unwrap_or_default();
    Ok(find_name(&names, &name)
        .and_then(|i| vector.element(i))
        .unwrap_or(RValue::Null))
}

/// The member name of a `$` access.
pub(crate) fn field_name(positions: &[PositionArg]) -> RResult<String> {
    match positions {
        [PositionArg::Value(value)] => value
            .as_string_scalar()
            .map(str::to_string)
            .ok_or_else(|| RError::runtime("invalid subscript type for '$'")),
        _ => Err(RError::runtime("invalid subscript type for '$'")),
    }
}
