//! Capability set for containers outside the native value model.
//!
//! Foreign objects are reached through three messages: `read`, `write` and
//! `key_info`. Indexing and replacement degrade to a single keyed operation
//! against this capability set.

use std::fmt;
use std::sync::Arc;

use super::r_value::RValue;
use crate::backend::errors::RResult;

/// A key addressed on a foreign object: a 0-based index or a member name.
#[derive(Debug, Clone, PartialEq)]
pub enum ForeignKey {
    Index(i64),
    Name(String),
}

impl fmt::Display for ForeignKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForeignKey::Index(i) => write!(f, "{}", i),
            ForeignKey::Name(n) => write!(f, "{}", n),
        }
    }
}

/// What a foreign object reports about one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyInfo {
    pub existing: bool,
    pub readable: bool,
    pub writable: bool,
}

impl KeyInfo {
    pub const NONE: KeyInfo = KeyInfo {
        existing: false,
        readable: false,
        writable: false,
    };

    pub const READ_WRITE: KeyInfo = KeyInfo {
        existing: true,
        readable: true,
        writable: true,
    };
}

/// Read/write/keyInfo capability set supplied by the interop collaborator.
pub trait ForeignObject: Send + Sync {
    fn read(&self, key: &ForeignKey) -> RResult<RValue>;

    fn write(&self, key: &ForeignKey, value: RValue) -> RResult<()>;

    fn key_info(&self, key: &ForeignKey) -> KeyInfo;

    /// The object describing this object's class, where static members live.
    fn class_object(&self) -> Option<ForeignRef> {
        None
    }
}

/// Shared handle to a foreign object; equality is identity.
#[derive(Clone)]
pub struct ForeignRef(Arc<dyn ForeignObject>);

impl ForeignRef {
    pub fn new(object: Arc<dyn ForeignObject>) -> Self {
        ForeignRef(object)
    }

    pub fn object(&self) -> &dyn ForeignObject {
        self.0.as_ref()
    }
}

impl fmt::Debug for ForeignRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ForeignRef({:p})", Arc::as_ptr(&self.0))
    }
}

impl PartialEq for ForeignRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
