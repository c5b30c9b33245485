//! `[[` with a multi-element position on a list walks one level per element:
//! `x[[c(i, j)]]` is `x[[i]][[j]]`.
//!
//! Replacement descends iteratively, keeping the enclosing lists on a stack,
//! then rebuilds the path bottom-up. Only the lists along the path are
//! copied; siblings keep sharing storage with the original.

use tracing::trace;

use super::extract::extract;
use super::positions::{resolve_single, PositionArg, SingleIndex};
use super::replace::assign_element;
use super::ElementAccessMode;
use crate::backend::errors::{RError, RResult};
use crate::backend::models::{RValue, RVector};

fn path_steps(path: &RValue) -> RResult<Vec<PositionArg>> {
    match path {
        RValue::Vector(v) if v.rtype().is_atomic() => {
            Ok(v.elements().into_iter().map(PositionArg::Value).collect())
        }
        other => Err(RError::index(format!(
            "invalid subscript type '{}'",
            other.rtype().type_name()
        ))),
    }
}

/// `x[[path]]` for a path of length two or more.
pub fn extract_path(vector: &RVector, path: &RValue) -> RResult<RValue> {
    let steps = path_steps(path)?;
    let last = steps.len().saturating_sub(1);
    let mut current = RValue::Vector(vector.clone());
    for (level, step) in steps.iter().enumerate() {
        if level < last {
            check_level(&current, level + 1)?;
        }
        current = extract(
            &current,
            std::slice::from_ref(step),
            ElementAccessMode::Subscript,
            true,
        )?;
    }
    trace!(target: "rcore::extract", depth = steps.len(), "Recursive extraction");
    Ok(current)
}

/// `x[[path]] <- value` for a path of length two or more.
pub fn replace_path(container: RValue, path: &RValue, value: RValue) -> RResult<RValue> {
    let mut steps = path_steps(path)?;
    let Some(last) = steps.pop() else {
        return Err(RError::index("[[ ]] with missing subscript"));
    };

    let mut shells: Vec<(RValue, PositionArg)> = Vec::with_capacity(steps.len());
    let mut current = container;
    for (level, step) in steps.into_iter().enumerate() {
        check_level(&current, level + 1)?;
        let child = match &current {
            RValue::Vector(list) => match resolve_single(list, &step) {
                Ok(SingleIndex::Index(i)) => list.element(i),
                Ok(_) | Err(RError::Index(_)) => None,
                Err(e) => return Err(e),
            },
            _ => None,
        };
        let Some(child) = child else {
            return Err(RError::index(format!("no such index at level {}", level + 1)));
        };
        shells.push((current, step));
        current = child;
    }

    trace!(target: "rcore::replace", depth = shells.len() + 1, "Recursive replacement");
    let mut result = assign_element(current, &last, value)?;
    while let Some((shell, step)) = shells.pop() {
        result = assign_element(shell, &step, result)?;
    }
    Ok(result)
}

fn check_level(current: &RValue, level: usize) -> RResult<()> {
    match current {
        value if value.is_list() => Ok(()),
        RValue::Null => Err(RError::index("subscript out of bounds")),
        _ => Err(RError::index(format!(
            "recursive indexing failed at level {}",
            level
        ))),
    }
}
