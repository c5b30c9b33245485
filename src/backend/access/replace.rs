//! The assignment side of indexing: `x[i] <- v`, `x[[i]] <- v`, `x$n <- v`.
//!
//! ## Semantics
//! - The result type is the higher-ranked of container and value
//!   (`logical < integer < double < complex < character < list`); values
//!   that are not vectors turn the container into a list.
//! - The value is recycled over the selected positions. A non-multiple
//!   length warns; a value longer than the selection is an error.
//! - Positions past the end extend the container with NA. Extension drops
//!   `dim`/`dimnames` and pads `names` with `""`.
//! - Assigning `NULL` into a list deletes the selected elements.
//! - Everything else about the container's attributes is kept.
//!
//! The container is taken by value: a uniquely owned container is updated in
//! place, a shared one is copied on the first write.

use std::slice;
use std::sync::Arc;

use tracing::{debug, trace, warn};

use super::extract::field_name;
use super::positions::{
    classify, resolve_matrix, resolve_single_replace, resolve_vector, Position, PositionArg,
    Purpose, Selection,
};
use super::{capacity, foreign, recursive, AccessShape, ElementAccessMode, PlanCache, PlanCacheStats};
use crate::backend::coerce::{cast_data, cast_vector};
use crate::backend::errors::{RError, RResult};
use crate::backend::models::{RType, RValue, RVector};

/// Replacement strategy fixed by a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceStrategy {
    Foreign,
    Recursive,
    /// `NULL` into a `NULL` container
    Unchanged,
    /// `NULL` into a list
    Delete,
    Field,
    Matrix { target: RType },
    Subscript { target: RType },
    Subset { target: RType },
}

#[derive(Debug)]
pub struct ReplacePlan {
    shape: AccessShape,
    strategy: ReplaceStrategy,
}

impl ReplacePlan {
    pub fn build(shape: &AccessShape) -> RResult<Self> {
        let value = shape.value.unwrap_or(RType::Null);
        let target = target_type(shape.container, value);
        let strategy = match shape.container {
            RType::Foreign => ReplaceStrategy::Foreign,
            ty if !ty.is_vector() && ty != RType::Null => return Err(not_subsettable(ty)),
            _ if shape.recursive => ReplaceStrategy::Recursive,
            RType::Null if value == RType::Null => ReplaceStrategy::Unchanged,
            RType::List if value == RType::Null => ReplaceStrategy::Delete,
            _ if value == RType::Null && shape.mode != ElementAccessMode::Subset => {
                return Err(RError::index("replacement has length zero"))
            }
            _ if shape.mode == ElementAccessMode::Field => ReplaceStrategy::Field,
            _ if shape.mode == ElementAccessMode::Subscript && shape.positions.is_empty() => {
                return Err(RError::index("[[ ]] with missing subscript"))
            }
            _ if shape.is_matrix() => ReplaceStrategy::Matrix { target },
            _ if shape.positions.len() > 1 => {
                return Err(RError::index("incorrect number of dimensions"))
            }
            _ if shape.mode == ElementAccessMode::Subscript => {
                ReplaceStrategy::Subscript { target }
            }
            _ => ReplaceStrategy::Subset { target },
        };
        Ok(ReplacePlan {
            shape: shape.clone(),
            strategy,
        })
    }

    pub fn strategy(&self) -> ReplaceStrategy {
        self.strategy
    }

    /// Guard: the plan applies only to calls of the shape it was built for.
    pub fn applies_to(&self, shape: &AccessShape) -> bool {
        &self.shape == shape
    }

    pub fn execute(
        &self,
        container: RValue,
        positions: &[PositionArg],
        value: RValue,
    ) -> RResult<RValue> {
        trace!(target: "rcore::replace", strategy = ?self.strategy, "Replacing");
        match self.strategy {
            ReplaceStrategy::Foreign => match &container {
                RValue::Foreign(object) => foreign::write(object, positions, value),
                _ => Err(plan_mismatch()),
            },
            ReplaceStrategy::Recursive => match positions {
                [PositionArg::Value(path)] => recursive::replace_path(container, path, value),
                _ => Err(plan_mismatch()),
            },
            ReplaceStrategy::Unchanged => Ok(container),
            ReplaceStrategy::Delete => {
                let list = into_vector(container)?;
                delete(list, positions, self.shape.mode).map(RValue::Vector)
            }
            ReplaceStrategy::Field => assign_field(container, positions, value),
            ReplaceStrategy::Matrix { target } => {
                let vector = into_vector(container)?;
                let dims = vector.dim().unwrap_or_default();
                let selection = resolve_matrix(&vector, &dims, positions)?;
                assign_selection(vector, selection, value_vector(value), target).map(RValue::Vector)
            }
            ReplaceStrategy::Subscript { target } => {
                assign_subscript(container, &positions[0], value, target)
            }
            ReplaceStrategy::Subset { target } => {
                assign_subset(container, positions.first(), value, target)
            }
        }
    }
}

/// `x[...] <- v`, `x[[...]] <- v` or `x$name <- v` without a plan cache.
pub fn replace(
    container: RValue,
    positions: &[PositionArg],
    value: RValue,
    mode: ElementAccessMode,
) -> RResult<RValue> {
    let shape = AccessShape::of(&container, positions, Some(&value), mode);
    ReplacePlan::build(&shape)?.execute(container, positions, value)
}

/// Assignment with a bounded cache of plans per call shape.
pub struct VectorReplacer {
    plans: PlanCache<ReplacePlan>,
}

impl VectorReplacer {
    pub fn new(cache_size: usize) -> Self {
        VectorReplacer {
            plans: PlanCache::new(capacity(cache_size)),
        }
    }

    pub fn apply(
        &self,
        container: RValue,
        positions: &[PositionArg],
        value: RValue,
        mode: ElementAccessMode,
    ) -> RResult<RValue> {
        let shape = AccessShape::of(&container, positions, Some(&value), mode);
        let mut plan = self.plans.get_or_build(&shape, |shape| {
            debug!(target: "rcore::replace", ?shape, "Building replacement plan");
            ReplacePlan::build(shape)
        })?;
        if !plan.applies_to(&shape) {
            debug!(target: "rcore::replace", ?shape, "Replacement plan guard failed, rebuilding");
            plan = Arc::new(ReplacePlan::build(&shape)?);
        }
        plan.execute(container, positions, value)
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

impl Default for VectorReplacer {
    fn default() -> Self {
        VectorReplacer::new(5)
    }
}

/// Single `[[<-` step, used level by level for nested lists.
pub(crate) fn assign_element(container: RValue, arg: &PositionArg, value: RValue) -> RResult<RValue> {
    replace(
        container,
        slice::from_ref(arg),
        value,
        ElementAccessMode::Subscript,
    )
}

fn target_type(container: RType, value: RType) -> RType {
    let value = match value {
        RType::Null => return if container == RType::Null { RType::Logical } else { container },
        v if v.is_vector() => v,
        _ => RType::List,
    };
    match container {
        RType::Null => value,
        c => c.promote(value),
    }
}

fn plan_mismatch() -> RError {
    RError::runtime("internal error: replacement plan does not match arguments")
}

fn not_subsettable(ty: RType) -> RError {
    RError::runtime(format!("object of type '{}' is not subsettable", ty.type_name()))
}

fn into_vector(container: RValue) -> RResult<RVector> {
    match container {
        RValue::Vector(v) => Ok(v),
        other => Err(not_subsettable(other.rtype())),
    }
}

/// The container as a vector of `target`; `NULL` becomes an empty one.
fn container_vector(container: RValue, target: RType) -> RResult<RVector> {
    match container {
        RValue::Null => RVector::empty(target)
            .ok_or_else(|| RError::runtime(format!("cannot create a vector of type '{}'", target))),
        other => into_vector(other),
    }
}

/// The value side as a vector; non-vectors become a one-element list.
fn value_vector(value: RValue) -> RVector {
    match value {
        RValue::Vector(v) => v,
        RValue::Null => RVector::list(Vec::new()),
        other => RVector::list(vec![other]),
    }
}

fn assign_subset(
    container: RValue,
    arg: Option<&PositionArg>,
    value: RValue,
    target: RType,
) -> RResult<RValue> {
    let vector = container_vector(container, target)?;
    let position = match arg {
        Some(arg) => classify(arg)?,
        None => Position::Missing,
    };
    let names = vector.names();
    let selection = resolve_vector(vector.len(), names.as_deref(), &position, Purpose::Replace);
    if value.is_null() {
        // `NULL` into an atomic vector: only an empty selection is allowed.
        if selection.indices.is_empty() {
            return Ok(RValue::Vector(vector));
        }
        return Err(RError::index("replacement has length zero"));
    }
    assign_selection(vector, selection, value_vector(value), target).map(RValue::Vector)
}

fn assign_subscript(
    container: RValue,
    arg: &PositionArg,
    value: RValue,
    target: RType,
) -> RResult<RValue> {
    let was_null = container.is_null();
    let single_value = value.as_vector().map_or(true, |v| v.len() == 1);
    let (target, value) = if target == RType::List {
        (RType::List, RVector::list(vec![value]))
    } else if single_value {
        (target, value_vector(value))
    } else if was_null {
        // `x <- NULL; x[[1]] <- 1:3` makes `x` a list.
        (RType::List, RVector::list(vec![value]))
    } else if value.is_empty() {
        return Err(RError::index("replacement has length zero"));
    } else {
        return Err(RError::index(
            "more elements supplied than there are to replace",
        ));
    };
    let vector = container_vector(container, target)?;
    let selection = resolve_single_replace(&vector, arg)?;
    assign_selection(vector, selection, value, target).map(RValue::Vector)
}

fn assign_field(container: RValue, positions: &[PositionArg], value: RValue) -> RResult<RValue> {
    let name = field_name(positions)?;
    let list = match container {
        RValue::Null => RVector::list(Vec::new()),
        RValue::Vector(v) if v.rtype() == RType::List => v,
        RValue::Vector(v) => {
            warn!(target: "rcore::replace", "Coercing LHS to a list");
            cast_vector(&v, RType::List)?
        }
        other => return Err(not_subsettable(other.rtype())),
    };
    let names = list.names();
    let selection = resolve_vector(
        list.len(),
        names.as_deref(),
        &Position::Names(vec![Some(name)]),
        Purpose::Replace,
    );
    assign_selection(list, selection, RVector::list(vec![value]), RType::List).map(RValue::Vector)
}

/// Remove the selected elements of a list.
fn delete(list: RVector, positions: &[PositionArg], mode: ElementAccessMode) -> RResult<RVector> {
    if positions.len() > 1 {
        return Err(RError::index("incorrect number of subscripts"));
    }
    let names = list.names();
    let position = match mode {
        ElementAccessMode::Field => Position::Names(vec![Some(field_name(positions)?)]),
        _ => match positions.first() {
            Some(arg) => classify(arg)?,
            None => Position::Missing,
        },
    };
    let selection = resolve_vector(list.len(), names.as_deref(), &position, Purpose::Extract);
    if mode == ElementAccessMode::Subscript && selection.indices.len() > 1 {
        return Err(RError::index(
            "more elements supplied than there are to replace",
        ));
    }
    let mut doomed = selection.targets();
    doomed.sort_unstable();
    doomed.dedup();
    if doomed.is_empty() {
        return Ok(list);
    }
    trace!(target: "rcore::replace", count = doomed.len(), "Deleting list elements");

    let mut list = list;
    list.set_dim(None)?;
    list.data_mut().remove_indices(&doomed);
    if let Some(mut names) = names {
        let mut index = 0;
        names.retain(|_| {
            let keep = doomed.binary_search(&index).is_err();
            index += 1;
            keep
        });
        list.set_names(Some(names))?;
    }
    list.recompute_complete();
    Ok(list)
}

/// Write `value` (recycled) into the selected positions of `vector`,
/// converting both to `target` and extending as needed.
fn assign_selection(
    vector: RVector,
    selection: Selection,
    value: RVector,
    target: RType,
) -> RResult<RVector> {
    let targets = selection.targets();
    if selection.has_na() && value.len() != 1 {
        return Err(RError::index(
            "NAs are not allowed in subscripted assignments",
        ));
    }
    if value.is_empty() && !selection.indices.is_empty() {
        return Err(RError::index("replacement has length zero"));
    }
    if value.len() > targets.len() && !targets.is_empty() {
        return Err(RError::index(
            "number of items to replace is not a multiple of replacement length",
        ));
    }
    if !targets.is_empty() && targets.len() % value.len() != 0 {
        warn!(
            target: "rcore::replace",
            items = targets.len(),
            replacement = value.len(),
            "number of items to replace is not a multiple of replacement length"
        );
    }

    let mut vector = if vector.rtype() == target {
        vector
    } else {
        trace!(target: "rcore::replace", from = %vector.rtype(), to = %target, "Promoting container");
        cast_vector(&vector, target)?
    };
    let values = cast_data(value.data(), target)?;
    let old_len = vector.len();
    let extended = selection.extends(old_len);
    let complete = vector.is_complete() && !extended && !values.has_na();

    if extended {
        let names = vector.names();
        vector.set_dim(None)?;
        vector.data_mut().extend_to(selection.new_len)?;
        if names.is_some() || !selection.new_names.is_empty() {
            let mut names = names.unwrap_or_else(|| vec![Some(String::new()); old_len]);
            names.resize(selection.new_len, Some(String::new()));
            for (slot, name) in &selection.new_names {
                names[*slot] = name.clone();
            }
            vector.set_names(Some(names))?;
        }
    }
    vector.data_mut().assign_recycled(&targets, &values)?;
    if complete {
        vector.set_complete(true);
    }
    Ok(vector)
}
