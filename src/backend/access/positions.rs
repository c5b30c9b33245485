//! Index resolution for `[`, `[[` and `$`.
//!
//! Position arguments are first classified into a [`Position`], then
//! resolved against a container's length and names (or, for matrices and
//! arrays, against each extent and the matching `dimnames` entry) into a
//! [`Selection`] of 0-based indices.
//!
//! Extraction and replacement differ only at the edges: out-of-range and
//! unknown names are NA for extraction and extend the container for
//! replacement.

use itertools::Itertools;

use crate::backend::errors::{RError, RResult};
use crate::backend::models::element::{INT_NA, LOGICAL_NA, LOGICAL_TRUE};
use crate::backend::models::{RType, RValue, RVector, VectorData};

/// One position argument of an indexing call. `Empty` is the omitted
/// argument of `x[]` or `m[, j]`.
#[derive(Debug, Clone, PartialEq)]
pub enum PositionArg {
    Empty,
    Value(RValue),
}

impl PositionArg {
    pub fn index(i: i32) -> Self {
        PositionArg::Value(RValue::int(i))
    }

    pub fn name(name: &str) -> Self {
        PositionArg::Value(RValue::string(name))
    }

    pub fn kind(&self) -> PositionKind {
        match self {
            PositionArg::Empty => PositionKind::Missing,
            PositionArg::Value(value) => match value.rtype() {
                RType::Null => PositionKind::Null,
                RType::Logical => PositionKind::Logical,
                RType::Integer => PositionKind::Integer,
                RType::Double => PositionKind::Double,
                RType::Character => PositionKind::Character,
                _ => PositionKind::Other,
            },
        }
    }

    /// Number of elements in the argument; `None` for `Empty`.
    pub fn len(&self) -> Option<usize> {
        match self {
            PositionArg::Empty => None,
            PositionArg::Value(value) => Some(value.len()),
        }
    }
}

impl From<RValue> for PositionArg {
    fn from(value: RValue) -> Self {
        PositionArg::Value(value)
    }
}

/// Type tag of a position argument, part of an access plan's shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PositionKind {
    Missing,
    Null,
    Logical,
    Integer,
    Double,
    Character,
    Other,
}

/// A classified position argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Position {
    /// `x[]`: everything
    Missing,
    /// 0-based indices, `None` for NA
    Positive(Vec<Option<usize>>),
    /// Sorted, de-duplicated 0-based exclusions
    Negative(Vec<usize>),
    /// Selection mask, recycled over the container
    Logical(Vec<u8>),
    Names(Vec<Option<String>>),
    /// `NULL` or only zeros
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Purpose {
    Extract,
    Replace,
}

/// Resolved indices into a container.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Selection {
    /// 0-based linear indices; `None` for NA positions
    pub indices: Vec<Option<usize>>,
    /// Container length needed to hold every index
    pub new_len: usize,
    /// Names for slots appended by unknown character positions
    pub new_names: Vec<(usize, Option<String>)>,
    /// Per-dimension selections for matrix and array access
    pub per_dim: Option<Vec<Vec<Option<usize>>>>,
}

impl Selection {
    /// Non-NA target indices.
    pub fn targets(&self) -> Vec<usize> {
        self.indices.iter().flatten().copied().collect()
    }

    pub fn has_na(&self) -> bool {
        self.indices.iter().any(Option::is_none)
    }

    pub fn extends(&self, len: usize) -> bool {
        self.new_len > len
    }
}

/// Classify one position argument.
pub fn classify(arg: &PositionArg) -> RResult<Position> {
    let value = match arg {
        PositionArg::Empty => return Ok(Position::Missing),
        PositionArg::Value(RValue::Null) => return Ok(Position::Empty),
        PositionArg::Value(value) => value,
    };
    let RValue::Vector(vector) = value else {
        return Err(invalid_subscript_type(value.rtype()));
    };
    match vector.data() {
        VectorData::Integer(v) => {
            classify_numeric(v.iter().map(|&k| if k == INT_NA { None } else { Some(k as i64) }))
        }
        VectorData::Double(v) => classify_numeric(v.iter().map(|&k| {
            if k.is_nan() {
                None
            } else {
                Some(k.trunc().clamp(i64::MIN as f64, i64::MAX as f64) as i64)
            }
        })),
        VectorData::Logical(v) => Ok(Position::Logical(v.as_ref().clone())),
        VectorData::Character(v) => Ok(Position::Names(v.as_ref().clone())),
        other => Err(invalid_subscript_type(other.rtype())),
    }
}

fn invalid_subscript_type(ty: RType) -> RError {
    RError::index(format!("invalid subscript type '{}'", ty.type_name()))
}

fn classify_numeric(values: impl Iterator<Item = Option<i64>>) -> RResult<Position> {
    let mut positive = Vec::new();
    let mut negative = Vec::new();
    let mut has_na = false;
    for value in values {
        match value {
            None => {
                has_na = true;
                positive.push(None);
            }
            Some(0) => {}
            Some(k) if k > 0 => positive.push(Some((k - 1) as usize)),
            Some(k) => negative.push((-(k + 1)) as usize),
        }
    }
    if negative.is_empty() {
        return Ok(if positive.is_empty() {
            Position::Empty
        } else {
            Position::Positive(positive)
        });
    }
    if has_na {
        return Err(RError::index("can't mix NAs with negative subscripts"));
    }
    if !positive.is_empty() {
        return Err(RError::index(
            "only 0's may be mixed with negative subscripts",
        ));
    }
    Ok(Position::Negative(
        negative.into_iter().sorted_unstable().dedup().collect(),
    ))
}

/// Resolve a classified position against a vector of length `len`.
pub fn resolve_vector(
    len: usize,
    names: Option<&[Option<String>]>,
    position: &Position,
    purpose: Purpose,
) -> Selection {
    let mut selection = Selection {
        new_len: len,
        ..Selection::default()
    };
    match position {
        Position::Missing => {
            selection.indices = (0..len).map(Some).collect();
        }
        Position::Empty => {}
        Position::Positive(indices) => {
            selection.indices = indices
                .iter()
                .map(|idx| match (idx, purpose) {
                    (Some(i), Purpose::Extract) if *i >= len => None,
                    _ => *idx,
                })
                .collect();
        }
        Position::Negative(excluded) => {
            let mut excluded = excluded.iter().peekable();
            selection.indices = (0..len)
                .filter(|i| {
                    while excluded.peek().is_some_and(|&&e| e < *i) {
                        excluded.next();
                    }
                    excluded.peek() != Some(&i)
                })
                .map(Some)
                .collect();
        }
        Position::Logical(mask) => {
            if !mask.is_empty() {
                let n = len.max(mask.len());
                for i in 0..n {
                    match mask[i % mask.len()] {
                        LOGICAL_TRUE if i < len || purpose == Purpose::Replace => {
                            selection.indices.push(Some(i))
                        }
                        LOGICAL_TRUE | LOGICAL_NA => selection.indices.push(None),
                        _ => {}
                    }
                }
            }
        }
        Position::Names(wanted) => {
            resolve_names(len, names, wanted, purpose, &mut selection);
        }
    }
    if purpose == Purpose::Replace {
        let highest = selection.indices.iter().flatten().max().map(|&i| i + 1);
        selection.new_len = selection.new_len.max(highest.unwrap_or(0));
    }
    selection
}

fn resolve_names(
    len: usize,
    names: Option<&[Option<String>]>,
    wanted: &[Option<String>],
    purpose: Purpose,
    selection: &mut Selection,
) {
    let existing = |name: &str| names.and_then(|names| find_name(names, name));
    for name in wanted {
        let found = name.as_deref().and_then(existing);
        match (found, purpose) {
            (Some(i), _) => selection.indices.push(Some(i)),
            (None, Purpose::Extract) => selection.indices.push(None),
            (None, Purpose::Replace) => {
                let appended = name.as_deref().and_then(|name| {
                    selection
                        .new_names
                        .iter()
                        .find(|(_, n)| !name.is_empty() && n.as_deref() == Some(name))
                        .map(|(slot, _)| *slot)
                });
                let slot = appended.unwrap_or_else(|| {
                    let slot = len + selection.new_names.len();
                    selection.new_names.push((slot, name.clone()));
                    slot
                });
                selection.indices.push(Some(slot));
            }
        }
    }
}

/// Index of the first element named `name`. `""` and NA never match.
pub fn find_name(names: &[Option<String>], name: &str) -> Option<usize> {
    if name.is_empty() {
        return None;
    }
    names.iter().position(|n| n.as_deref() == Some(name))
}

/// Resolve one position argument per dimension of a matrix or array.
///
/// Out-of-range positions and unknown names are errors; NA positions are
/// kept as `None`.
pub fn resolve_matrix(vector: &RVector, dims: &[usize], args: &[PositionArg]) -> RResult<Selection> {
    if args.len() != dims.len() {
        return Err(RError::index("incorrect number of dimensions"));
    }
    let dimnames = vector.dimnames();
    let mut per_dim = Vec::with_capacity(dims.len());
    for (k, arg) in args.iter().enumerate() {
        let names = dimnames
            .as_ref()
            .and_then(|d| d.get(k))
            .and_then(|n| n.as_deref());
        let position = classify(arg)?;
        if let Position::Names(wanted) = &position {
            let known = |n: &Option<String>| {
                n.as_deref()
                    .zip(names)
                    .is_some_and(|(n, names)| find_name(names, n).is_some())
            };
            if !wanted.iter().all(known) {
                return Err(RError::index("subscript out of bounds"));
            }
        }
        let selection = resolve_vector(dims[k], names, &position, Purpose::Replace);
        if selection.new_len > dims[k] {
            return Err(RError::index("subscript out of bounds"));
        }
        per_dim.push(selection.indices);
    }

    let strides: Vec<usize> = dims
        .iter()
        .scan(1usize, |stride, &extent| {
            let current = *stride;
            *stride *= extent;
            Some(current)
        })
        .collect();
    // First dimension varies fastest (column-major).
    let indices = per_dim
        .iter()
        .rev()
        .map(|sel| sel.iter().copied())
        .multi_cartesian_product()
        .map(|combo| {
            combo
                .iter()
                .rev()
                .zip(&strides)
                .try_fold(0usize, |offset, (idx, stride)| idx.map(|i| offset + i * stride))
        })
        .collect();

    Ok(Selection {
        indices,
        new_len: vector.len(),
        new_names: Vec::new(),
        per_dim: Some(per_dim),
    })
}

/// Resolve the positions of one `[` call: per dimension when there is one
/// position per `dim` extent, against the whole vector otherwise.
pub fn resolve_positions(
    vector: &RVector,
    positions: &[PositionArg],
    purpose: Purpose,
) -> RResult<Selection> {
    match vector.dim() {
        Some(dims) if dims.len() >= 2 && positions.len() == dims.len() => {
            resolve_matrix(vector, &dims, positions)
        }
        _ if positions.len() > 1 => Err(RError::index("incorrect number of dimensions")),
        _ => {
            let position = match positions.first() {
                Some(arg) => classify(arg)?,
                None => Position::Missing,
            };
            let names = vector.names();
            Ok(resolve_vector(vector.len(), names.as_deref(), &position, purpose))
        }
    }
}

/// Outcome of resolving a `[[` position for extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SingleIndex {
    Index(usize),
    /// NA position
    Na,
    /// Unknown name
    NotFound,
}

/// Resolve a `[[` position for extraction: exactly one element.
pub fn resolve_single(vector: &RVector, arg: &PositionArg) -> RResult<SingleIndex> {
    let position = classify(arg)?;
    let len = vector.len();
    match &position {
        Position::Missing => return Err(invalid_subscript_type(RType::Symbol)),
        Position::Names(wanted) if wanted.len() == 1 => {
            let names = vector.names();
            return Ok(match wanted[0].as_deref() {
                None => SingleIndex::Na,
                Some(name) => names
                    .as_deref()
                    .and_then(|n| find_name(n, name))
                    .map_or(SingleIndex::NotFound, SingleIndex::Index),
            });
        }
        Position::Positive(indices) if indices.len() == 1 => {
            return match indices[0] {
                None => Ok(SingleIndex::Na),
                Some(i) if i < len => Ok(SingleIndex::Index(i)),
                Some(_) => Err(RError::index("subscript out of bounds")),
            };
        }
        _ => {}
    }
    let selection = resolve_vector(len, vector.names().as_deref(), &position, Purpose::Extract);
    match selection.indices.as_slice() {
        [] => Err(RError::index("attempt to select less than one element")),
        [Some(i)] => Ok(SingleIndex::Index(*i)),
        [None] => Ok(SingleIndex::Na),
        _ => Err(RError::index("attempt to select more than one element")),
    }
}

/// Resolve a `[[<-` position: exactly one target, possibly past the end.
pub fn resolve_single_replace(vector: &RVector, arg: &PositionArg) -> RResult<Selection> {
    let position = classify(arg)?;
    if position == Position::Missing {
        return Err(RError::index("[[ ]] with missing subscript"));
    }
    let selection = resolve_vector(
        vector.len(),
        vector.names().as_deref(),
        &position,
        Purpose::Replace,
    );
    match selection.indices.as_slice() {
        [Some(_)] => Ok(selection),
        [] | [None] => Err(RError::index("[[ ]] with missing subscript")),
        _ => Err(RError::index(
            "more elements supplied than there are to replace",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::models::element::LOGICAL_FALSE;
    use crate::backend::models::double_na;

    fn pos(value: RValue) -> Position {
        classify(&PositionArg::Value(value)).unwrap()
    }

    fn names(list: &[&str]) -> Vec<Option<String>> {
        list.iter().map(|s| Some(s.to_string())).collect()
    }

    // ========================================================================
    // Classification
    // ========================================================================

    #[test]
    fn test_classify_numeric() {
        assert_eq!(
            pos(RValue::ints(vec![1, 0, 3])),
            Position::Positive(vec![Some(0), Some(2)])
        );
        assert_eq!(
            pos(RValue::doubles(vec![2.9, double_na()])),
            Position::Positive(vec![Some(1), None])
        );
        assert_eq!(
            pos(RValue::ints(vec![-3, -1, -3])),
            Position::Negative(vec![0, 2])
        );
        assert_eq!(pos(RValue::ints(vec![0, 0])), Position::Empty);
        assert_eq!(pos(RValue::Null), Position::Empty);
        assert_eq!(classify(&PositionArg::Empty).unwrap(), Position::Missing);
    }

    #[test]
    fn test_mixed_signs_are_errors() {
        assert!(matches!(
            classify(&RValue::ints(vec![1, -2]).into()),
            Err(RError::Index(_))
        ));
        assert!(matches!(
            classify(&RValue::ints(vec![INT_NA, -2]).into()),
            Err(RError::Index(_))
        ));
        assert!(matches!(
            classify(&RValue::list(vec![]).into()),
            Err(RError::Index(_))
        ));
    }

    // ========================================================================
    // Vector resolution
    // ========================================================================

    #[test]
    fn test_negative_selects_complement() {
        let sel = resolve_vector(3, None, &Position::Negative(vec![0, 7]), Purpose::Extract);
        assert_eq!(sel.indices, vec![Some(1), Some(2)]);
    }

    #[test]
    fn test_out_of_range_extract_is_na() {
        let sel = resolve_vector(2, None, &Position::Positive(vec![Some(0), Some(5)]), Purpose::Extract);
        assert_eq!(sel.indices, vec![Some(0), None]);
        assert_eq!(sel.new_len, 2);
    }

    #[test]
    fn test_out_of_range_replace_extends() {
        let sel = resolve_vector(2, None, &Position::Positive(vec![Some(4)]), Purpose::Replace);
        assert_eq!(sel.indices, vec![Some(4)]);
        assert_eq!(sel.new_len, 5);
        assert!(sel.extends(2));
    }

    #[test]
    fn test_logical_mask_recycles() {
        let mask = Position::Logical(vec![LOGICAL_TRUE, LOGICAL_FALSE]);
        let sel = resolve_vector(5, None, &mask, Purpose::Extract);
        assert_eq!(sel.indices, vec![Some(0), Some(2), Some(4)]);

        let with_na = Position::Logical(vec![LOGICAL_NA, LOGICAL_TRUE]);
        let sel = resolve_vector(2, None, &with_na, Purpose::Extract);
        assert_eq!(sel.indices, vec![None, Some(1)]);
    }

    #[test]
    fn test_long_logical_mask() {
        let mask = Position::Logical(vec![LOGICAL_FALSE, LOGICAL_FALSE, LOGICAL_TRUE]);
        assert_eq!(
            resolve_vector(2, None, &mask, Purpose::Extract).indices,
            vec![None]
        );
        let sel = resolve_vector(2, None, &mask, Purpose::Replace);
        assert_eq!(sel.indices, vec![Some(2)]);
        assert_eq!(sel.new_len, 3);
    }

    #[test]
    fn test_names_extract_and_replace() {
        let existing = names(&["a", "b"]);
        let wanted = Position::Names(names(&["b", "z"]));
        let sel = resolve_vector(2, Some(&existing), &wanted, Purpose::Extract);
        assert_eq!(sel.indices, vec![Some(1), None]);

        let sel = resolve_vector(2, Some(&existing), &wanted, Purpose::Replace);
        assert_eq!(sel.indices, vec![Some(1), Some(2)]);
        assert_eq!(sel.new_names, vec![(2, Some("z".to_string()))]);
        assert_eq!(sel.new_len, 3);
    }

    #[test]
    fn test_repeated_new_name_maps_to_one_slot() {
        let wanted = Position::Names(names(&["n", "n", "m"]));
        let sel = resolve_vector(1, None, &wanted, Purpose::Replace);
        assert_eq!(sel.indices, vec![Some(1), Some(1), Some(2)]);
        assert_eq!(sel.new_len, 3);
        assert_eq!(sel.new_names.len(), 2);
    }

    // ========================================================================
    // Matrices
    // ========================================================================

    fn matrix_2x3() -> RVector {
        let mut m = RVector::integer((1..=6).collect());
        m.set_dim(Some(vec![2, 3])).unwrap();
        m.set_dimnames(vec![Some(names(&["r1", "r2"])), Some(names(&["a", "b", "c"]))])
            .unwrap();
        m
    }

    #[test]
    fn test_matrix_cell_and_column() {
        let m = matrix_2x3();
        let sel = resolve_matrix(&m, &[2, 3], &[PositionArg::index(2), PositionArg::index(3)]).unwrap();
        assert_eq!(sel.indices, vec![Some(5)]);

        let sel = resolve_matrix(&m, &[2, 3], &[PositionArg::Empty, PositionArg::name("b")]).unwrap();
        assert_eq!(sel.indices, vec![Some(2), Some(3)]);
        assert_eq!(sel.per_dim, Some(vec![vec![Some(0), Some(1)], vec![Some(1)]]));
    }

    #[test]
    fn test_matrix_row_is_column_major() {
        let m = matrix_2x3();
        let sel = resolve_matrix(&m, &[2, 3], &[PositionArg::index(1), PositionArg::Empty]).unwrap();
        assert_eq!(sel.indices, vec![Some(0), Some(2), Some(4)]);
    }

    #[test]
    fn test_matrix_errors() {
        let m = matrix_2x3();
        assert_eq!(
            resolve_matrix(&m, &[2, 3], &[PositionArg::index(3), PositionArg::index(1)]),
            Err(RError::index("subscript out of bounds"))
        );
        assert_eq!(
            resolve_matrix(&m, &[2, 3], &[PositionArg::name("zz"), PositionArg::index(1)]),
            Err(RError::index("subscript out of bounds"))
        );
        assert_eq!(
            resolve_matrix(&m, &[2, 3], &[PositionArg::index(1)]),
            Err(RError::index("incorrect number of dimensions"))
        );
    }

    // ========================================================================
    // Single-element access
    // ========================================================================

    #[test]
    fn test_resolve_positions_picks_linear_or_matrix() {
        let m = matrix_2x3();
        let cell = resolve_positions(&m, &[PositionArg::index(2), PositionArg::index(3)], Purpose::Extract)
            .unwrap();
        assert_eq!(cell.indices, vec![Some(5)]);
        let linear = resolve_positions(&m, &[PositionArg::index(4)], Purpose::Extract).unwrap();
        assert_eq!(linear.indices, vec![Some(3)]);
        let all = resolve_positions(&m, &[], Purpose::Extract).unwrap();
        assert_eq!(all.indices.len(), 6);
        assert!(resolve_positions(
            &RVector::integer(vec![1]),
            &[PositionArg::index(1), PositionArg::index(1)],
            Purpose::Extract
        )
        .is_err());
    }

    #[test]
    fn test_resolve_single() {
        let mut v = RVector::integer(vec![10, 20, 30]);
        v.set_names(Some(names(&["a", "b", "c"]))).unwrap();

        assert_eq!(resolve_single(&v, &PositionArg::index(2)), Ok(SingleIndex::Index(1)));
        assert_eq!(resolve_single(&v, &PositionArg::name("c")), Ok(SingleIndex::Index(2)));
        assert_eq!(resolve_single(&v, &PositionArg::name("q")), Ok(SingleIndex::NotFound));
        assert_eq!(
            resolve_single(&v, &RValue::ints(vec![-1, -2]).into()),
            Ok(SingleIndex::Index(2))
        );
        assert_eq!(
            resolve_single(&v, &RValue::ints(vec![-1]).into()),
            Err(RError::index("attempt to select more than one element"))
        );
        assert_eq!(
            resolve_single(&v, &PositionArg::Value(RValue::Null)),
            Err(RError::index("attempt to select less than one element"))
        );
        assert_eq!(
            resolve_single(&v, &PositionArg::index(9)),
            Err(RError::index("subscript out of bounds"))
        );
    }

    #[test]
    fn test_resolve_single_replace() {
        let v = RVector::integer(vec![1, 2]);
        let sel = resolve_single_replace(&v, &PositionArg::index(4)).unwrap();
        assert_eq!(sel.indices, vec![Some(3)]);
        assert_eq!(sel.new_len, 4);
        assert!(resolve_single_replace(&v, &RValue::ints(vec![1, 2]).into()).is_err());
        assert!(resolve_single_replace(&v, &PositionArg::Empty).is_err());
    }
}
