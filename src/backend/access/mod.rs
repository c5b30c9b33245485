//! Element access: `[`, `[[` and `$` for reading and assignment.
//!
//! ## Layout
//! - `positions`: classify and resolve position arguments into indices
//! - `extract`: the read side (`x[i]`, `x[[i]]`, `x$name`)
//! - `replace`: the assignment side with promotion, recycling and extension
//! - `recursive`: `x[[c(i, j)]]` on nested lists
//! - `foreign`: single-key access to foreign objects
//!
//! ## Plans
//! `VectorExtractor` and `VectorReplacer` cache one plan per call shape
//! (`AccessShape`) in a bounded LRU. A plan fixes the strategy and result type
//! for that shape; its guard re-checks the shape before it runs. Caching never
//! changes results.

pub mod extract;
pub mod foreign;
pub mod positions;
pub mod recursive;
pub mod replace;

pub use extract::{extract, VectorExtractor};
pub use positions::{
    resolve_matrix, resolve_positions, resolve_vector, PositionArg, PositionKind, Purpose, Selection,
};
pub use replace::{replace, VectorReplacer};

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;
use smallvec::SmallVec;

use crate::backend::models::{RType, RValue};

/// How elements are addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementAccessMode {
    /// `[`
    Subset,
    /// `[[`
    Subscript,
    /// `$`
    Field,
}

/// Everything an access plan depends on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccessShape {
    pub mode: ElementAccessMode,
    pub container: RType,
    /// Value type for assignments, `None` for extraction
    pub value: Option<RType>,
    pub positions: SmallVec<[PositionKind; 2]>,
    /// Length of the container's `dim` attribute, 0 without one
    pub dims: usize,
    /// `[[` with a multi-element position on a list
    pub recursive: bool,
}

impl AccessShape {
    pub fn of(
        container: &RValue,
        positions: &[PositionArg],
        value: Option<&RValue>,
        mode: ElementAccessMode,
    ) -> Self {
        let recursive = mode == ElementAccessMode::Subscript
            && container.is_list()
            && positions.len() == 1
            && positions[0].len().is_some_and(|n| n > 1);
        AccessShape {
            mode,
            container: container.rtype(),
            value: value.map(RValue::rtype),
            positions: positions.iter().map(PositionArg::kind).collect(),
            dims: container
                .as_vector()
                .and_then(|v| v.dim())
                .map_or(0, |d| d.len()),
            recursive,
        }
    }

    /// True when positions address a matrix or array by dimension.
    pub fn is_matrix(&self) -> bool {
        self.dims >= 2 && self.positions.len() == self.dims
    }
}

/// Hit/miss counters of a plan cache.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PlanCacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Bounded LRU of plans keyed on call shape.
pub(crate) struct PlanCache<P> {
    plans: Mutex<LruCache<AccessShape, Arc<P>>>,
    stats: Mutex<PlanCacheStats>,
}

impl<P> PlanCache<P> {
    pub(crate) fn new(capacity: NonZeroUsize) -> Self {
        PlanCache {
            plans: Mutex::new(LruCache::new(capacity)),
            stats: Mutex::new(PlanCacheStats::default()),
        }
    }

    /// The cached plan for `shape`, or a freshly built one.
    pub(crate) fn get_or_build<E>(
        &self,
        shape: &AccessShape,
        build: impl FnOnce(&AccessShape) -> Result<P, E>,
    ) -> Result<Arc<P>, E> {
        if let Some(plan) = self.plans.lock().get(shape) {
            self.stats.lock().hits += 1;
            return Ok(plan.clone());
        }
        self.stats.lock().misses += 1;
        let plan = Arc::new(build(shape)?);
        self.plans.lock().put(shape.clone(), plan.clone());
        Ok(plan)
    }

    pub(crate) fn stats(&self) -> PlanCacheStats {
        *self.stats.lock()
    }

    pub(crate) fn len(&self) -> usize {
        self.plans.lock().len()
    }

    pub(crate) fn clear(&self) {
        self.plans.lock().clear();
    }
}

/// Cache capacity from a configured size, at least one.
pub(crate) fn capacity(size: usize) -> NonZeroUsize {
    NonZeroUsize::new(size).unwrap_or(NonZeroUsize::MIN)
}
