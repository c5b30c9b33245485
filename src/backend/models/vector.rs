//! Vector storage with copy-on-write sharing.
//!
//! Element storage lives behind `Arc<Vec<T>>`. Cloning a vector shares the
//! storage; the first mutation through `data_mut()` copies it unless the
//! handle is the unique owner, in which case the mutation happens in place.
//! Attributes are cloned along with the vector.

use std::sync::Arc;

use super::attributes::Attributes;
use super::element::{doubles_identical, Element, RComplex};
use super::r_type::RType;
use super::r_value::RValue;
use crate::backend::errors::{RError, RResult};

/// Longest vector R can address (`R_XLEN_T_MAX`, 2^52).
pub const MAX_LENGTH: usize = 1 << 52;

/// Typed element storage.
#[derive(Debug, Clone)]
pub enum VectorData {
    Logical(Arc<Vec<u8>>),
    Integer(Arc<Vec<i32>>),
    Double(Arc<Vec<f64>>),
    Complex(Arc<Vec<RComplex>>),
    Character(Arc<Vec<Option<String>>>),
    List(Arc<Vec<RValue>>),
}

/// Run `$body` with `$v` bound to the storage of whichever variant `$data` is.
macro_rules! with_vector_data {
    ($data:expr, $v:ident => $body:expr) => {
        match $data {
            VectorData::Logical($v) => $body,
            VectorData::Integer($v) => $body,
            VectorData::Double($v) => $body,
            VectorData::Complex($v) => $body,
            VectorData::Character($v) => $body,
            VectorData::List($v) => $body,
        }
    };
}
pub(crate) use with_vector_data;

/// Like `with_vector_data!` but rebuilds the same variant from a `Vec` result.
macro_rules! map_vector_data {
    ($data:expr, $v:ident => $body:expr) => {
        match $data {
            VectorData::Logical($v) => VectorData::Logical(Arc::new($body)),
            VectorData::Integer($v) => VectorData::Integer(Arc::new($body)),
            VectorData::Double($v) => VectorData::Double(Arc::new($body)),
            VectorData::Complex($v) => VectorData::Complex(Arc::new($body)),
            VectorData::Character($v) => VectorData::Character(Arc::new($body)),
            VectorData::List($v) => VectorData::List(Arc::new($body)),
        }
    };
}
pub(crate) use map_vector_data;

impl VectorData {
    /// Zero-length storage of a vector type; `None` for non-vector types.
    pub fn empty(ty: RType) -> Option<VectorData> {
        VectorData::na_filled(ty, 0)
    }

    /// Storage of length `n` holding only NA (NULL for lists).
    pub fn na_filled(ty: RType, n: usize) -> Option<VectorData> {
        Some(match ty {
            RType::Logical => VectorData::Logical(Arc::new(vec![u8::na(); n])),
            RType::Integer => VectorData::Integer(Arc::new(vec![i32::na(); n])),
            RType::Double => VectorData::Double(Arc::new(vec![f64::na(); n])),
            RType::Complex => VectorData::Complex(Arc::new(vec![RComplex::na(); n])),
            RType::Character => VectorData::Character(Arc::new(vec![None; n])),
            RType::List => VectorData::List(Arc::new(vec![RValue::Null; n])),
            _ => return None,
        })
    }

    pub fn len(&self) -> usize {
        with_vector_data!(self, v => v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn rtype(&self) -> RType {
        match self {
            VectorData::Logical(_) => RType::Logical,
            VectorData::Integer(_) => RType::Integer,
            VectorData::Double(_) => RType::Double,
            VectorData::Complex(_) => RType::Complex,
            VectorData::Character(_) => RType::Character,
            VectorData::List(_) => RType::List,
        }
    }

    pub fn has_na(&self) -> bool {
        with_vector_data!(self, v => v.iter().any(Element::is_na))
    }

    pub fn is_na_at(&self, i: usize) -> bool {
        with_vector_data!(self, v => v.get(i).map(Element::is_na).unwrap_or(false))
    }

    /// True if both handles point at the same storage.
    pub fn shares_storage_with(&self, other: &VectorData) -> bool {
        match (self, other) {
            (VectorData::Logical(a), VectorData::Logical(b)) => Arc::ptr_eq(a, b),
            (VectorData::Integer(a), VectorData::Integer(b)) => Arc::ptr_eq(a, b),
            (VectorData::Double(a), VectorData::Double(b)) => Arc::ptr_eq(a, b),
            (VectorData::Complex(a), VectorData::Complex(b)) => Arc::ptr_eq(a, b),
            (VectorData::Character(a), VectorData::Character(b)) => Arc::ptr_eq(a, b),
            (VectorData::List(a), VectorData::List(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Gather elements; `None` or an index past the end yields NA.
    pub fn select(&self, indices: &[Option<usize>]) -> VectorData {
        map_vector_data!(self, v => select_elements(v.as_slice(), indices))
    }

    /// Grow to `n` elements, filling with NA. Never shrinks.
    ///
    /// Lengths past `MAX_LENGTH` and failed allocations are errors.
    pub fn extend_to(&mut self, n: usize) -> RResult<()> {
        if n > MAX_LENGTH {
            return Err(RError::index("subscript too large"));
        }
        with_vector_data!(self, v => {
            if v.len() < n {
                let data = Arc::make_mut(v);
                data.try_reserve_exact(n - data.len()).map_err(|_| {
                    RError::runtime(format!("cannot allocate vector of length {}", n))
                })?;
                data.resize(n, Element::na());
            }
        });
        Ok(())
    }

    /// Drop the elements at the given (sorted, unique) indices.
    pub fn remove_indices(&mut self, sorted: &[usize]) {
        with_vector_data!(self, v => {
            let data = Arc::make_mut(v);
            remove_sorted(data, sorted);
        })
    }

    /// Write `src[k % src.len()]` into `self[targets[k]]` for every target.
    ///
    /// Both sides must already have the same type and `self` must be long
    /// enough for every target.
    pub fn assign_recycled(&mut self, targets: &[usize], src: &VectorData) -> RResult<()> {
        match (self, src) {
            (VectorData::Logical(d), VectorData::Logical(s)) => assign_elements(d, targets, s.as_slice()),
            (VectorData::Integer(d), VectorData::Integer(s)) => assign_elements(d, targets, s.as_slice()),
            (VectorData::Double(d), VectorData::Double(s)) => assign_elements(d, targets, s.as_slice()),
            (VectorData::Complex(d), VectorData::Complex(s)) => assign_elements(d, targets, s.as_slice()),
            (VectorData::Character(d), VectorData::Character(s)) => {
                assign_elements(d, targets, s.as_slice())
            }
            (VectorData::List(d), VectorData::List(s)) => assign_elements(d, targets, s.as_slice()),
            (d, s) => {
                return Err(RError::runtime(format!(
                    "internal error: assigning {} elements into {} storage",
                    s.rtype(),
                    d.rtype()
                )))
            }
        }
        Ok(())
    }
}

fn select_elements<T: Element>(src: &[T], indices: &[Option<usize>]) -> Vec<T> {
    indices
        .iter()
        .map(|idx| match idx {
            Some(i) if *i < src.len() => src[*i].clone(),
            _ => T::na(),
        })
        .collect()
}

fn assign_elements<T: Element>(dst: &mut Arc<Vec<T>>, targets: &[usize], src: &[T]) {
    if targets.is_empty() || src.is_empty() {
        return;
    }
    let data = Arc::make_mut(dst);
    for (k, &target) in targets.iter().enumerate() {
        data[target] = src[k % src.len()].clone();
    }
}

fn remove_sorted<T>(data: &mut Vec<T>, sorted: &[usize]) {
    let mut skip = sorted.iter().peekable();
    let mut index = 0;
    data.retain(|_| {
        let keep = skip.peek().map_or(true, |&&s| s != index);
        if !keep {
            skip.next();
        }
        index += 1;
        keep
    });
}

impl PartialEq for VectorData {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (VectorData::Logical(a), VectorData::Logical(b)) => a == b,
            (VectorData::Integer(a), VectorData::Integer(b)) => a == b,
            (VectorData::Double(a), VectorData::Double(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| doubles_identical(*x, *y))
            }
            (VectorData::Complex(a), VectorData::Complex(b)) => a == b,
            (VectorData::Character(a), VectorData::Character(b)) => a == b,
            (VectorData::List(a), VectorData::List(b)) => a == b,
            _ => false,
        }
    }
}

/// An attributed R vector.
#[derive(Debug, Clone)]
pub struct RVector {
    data: VectorData,
    /// Boxed: `Attributes` stores `RValue`s inline.
    pub(super) attributes: Option<Box<Attributes>>,
    /// No element is NA. Only an optimization hint when false.
    complete: bool,
}

impl RVector {
    pub fn new(data: VectorData) -> Self {
        let complete = !data.has_na();
        RVector {
            data,
            attributes: None,
            complete,
        }
    }

    /// Build without scanning; the caller vouches for `complete`.
    pub fn with_complete(data: VectorData, complete: bool) -> Self {
        debug_assert!(!complete || !data.has_na());
        RVector {
            data,
            attributes: None,
            complete,
        }
    }

    pub fn logical(values: Vec<u8>) -> Self {
        RVector::new(VectorData::Logical(Arc::new(values)))
    }

    pub fn integer(values: Vec<i32>) -> Self {
        RVector::new(VectorData::Integer(Arc::new(values)))
    }

    pub fn double(values: Vec<f64>) -> Self {
        RVector::new(VectorData::Double(Arc::new(values)))
    }

    pub fn complex(values: Vec<RComplex>) -> Self {
        RVector::new(VectorData::Complex(Arc::new(values)))
    }

    pub fn character(values: Vec<Option<String>>) -> Self {
        RVector::new(VectorData::Character(Arc::new(values)))
    }

    pub fn list(values: Vec<RValue>) -> Self {
        RVector::with_complete(VectorData::List(Arc::new(values)), true)
    }

    pub fn empty(ty: RType) -> Option<Self> {
        VectorData::empty(ty).map(|d| RVector::with_complete(d, true))
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn rtype(&self) -> RType {
        self.data.rtype()
    }

    pub fn data(&self) -> &VectorData {
        &self.data
    }

    /// Mutable storage access. Clears `complete`; call
    /// `recompute_complete` afterwards if the flag matters.
    pub fn data_mut(&mut self) -> &mut VectorData {
        self.complete = false;
        &mut self.data
    }

    /// Replace the storage, keeping the attributes.
    pub fn with_data(self, data: VectorData) -> Self {
        let complete = !data.has_na();
        RVector {
            data,
            attributes: self.attributes,
            complete,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn set_complete(&mut self, complete: bool) {
        debug_assert!(!complete || !self.data.has_na());
        self.complete = complete;
    }

    pub fn recompute_complete(&mut self) {
        self.complete = !self.data.has_na();
    }

    /// Element `i` as a standalone value: the element itself for lists,
    /// a length-1 vector of the same type otherwise.
    pub fn element(&self, i: usize) -> Option<RValue> {
        if i >= self.len() {
            return None;
        }
        Some(match &self.data {
            VectorData::List(v) => v[i].clone(),
            other => RValue::Vector(RVector::new(other.select(&[Some(i)]))),
        })
    }

    /// Elements as standalone values (used when an atomic vector is stored
    /// into a list).
    pub fn elements(&self) -> Vec<RValue> {
        (0..self.len()).filter_map(|i| self.element(i)).collect()
    }
}

// `complete` is a hint and does not take part in equality.
impl PartialEq for RVector {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data && self.attributes == other.attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::models::element::{double_na, INT_NA};

    #[test]
    fn test_clone_shares_storage_until_write() {
        let a = RVector::integer(vec![1, 2, 3]);
        let mut b = a.clone();
        assert!(a.data().shares_storage_with(b.data()));

        b.data_mut()
            .assign_recycled(&[0], &VectorData::Integer(Arc::new(vec![9])))
            .unwrap();
        assert!(!a.data().shares_storage_with(b.data()));
        assert_eq!(a, RVector::integer(vec![1, 2, 3]));
        assert_eq!(b.data(), &VectorData::Integer(Arc::new(vec![9, 2, 3])));
    }

    #[test]
    fn test_unique_owner_mutates_in_place() {
        let mut a = RVector::double(vec![1.0, 2.0]);
        let before = match a.data() {
            VectorData::Double(v) => Arc::as_ptr(v),
            _ => unreachable!(),
        };
        a.data_mut()
            .assign_recycled(&[1], &VectorData::Double(Arc::new(vec![5.0])))
            .unwrap();
        let after = match a.data() {
            VectorData::Double(v) => Arc::as_ptr(v),
            _ => unreachable!(),
        };
        assert_eq!(before, after);
    }

    #[test]
    fn test_complete_flag() {
        assert!(RVector::integer(vec![1, 2]).is_complete());
        assert!(!RVector::integer(vec![1, INT_NA]).is_complete());
        assert!(!RVector::double(vec![double_na()]).is_complete());
        // A plain NaN is not NA.
        assert!(RVector::double(vec![f64::NAN]).is_complete());
    }

    #[test]
    fn test_select_out_of_range_is_na() {
        let v = VectorData::Integer(Arc::new(vec![10, 20]));
        let s = v.select(&[Some(1), None, Some(5)]);
        assert_eq!(s, VectorData::Integer(Arc::new(vec![20, INT_NA, INT_NA])));
    }

    #[test]
    fn test_extend_past_addressable_length() {
        let mut v = VectorData::Integer(Arc::new(vec![1]));
        assert!(matches!(v.extend_to(MAX_LENGTH + 1), Err(RError::Index(_))));
        assert_eq!(v.len(), 1);
    }

    #[test]
    fn test_extend_and_remove() {
        let mut v = VectorData::Character(Arc::new(vec![Some("a".into())]));
        v.extend_to(3).unwrap();
        assert_eq!(v.len(), 3);
        assert!(v.is_na_at(2));
        v.remove_indices(&[0, 2]);
        assert_eq!(v, VectorData::Character(Arc::new(vec![None])));
    }

    #[test]
    fn test_assign_type_mismatch_is_error() {
        let mut v = VectorData::Integer(Arc::new(vec![1]));
        let err = v
            .assign_recycled(&[0], &VectorData::Double(Arc::new(vec![1.0])))
            .unwrap_err();
        assert!(matches!(err, RError::Runtime(_)));
    }

    #[test]
    fn test_element_of_atomic_is_length_one_vector() {
        let v = RVector::integer(vec![4, 5]);
        assert_eq!(v.element(1), Some(RValue::Vector(RVector::integer(vec![5]))));
        assert_eq!(v.element(2), None);
    }
}
