//! Evaluation frames.
//!
//! An `Environment` is a cheap handle on a shared frame. Frames hold the
//! bindings of one call (or the global scope), a parent link and the
//! `FrameDescriptor` of the function that created them. Two frames with the
//! same descriptor belong to calls of the same function, which is what the
//! missingness resolver compares to spot self-forwarding.
//!
//! # Lifetime
//!
//! Promises refer to their defining frame through `WeakEnvironment` so they
//! never keep a frame alive; the frame owns its bindings (promises included).
//!
//! # Thread Safety
//!
//! Bindings sit behind a `parking_lot::RwLock`. Locks are never held while R
//! code runs: lookups clone the binding out before any forcing happens.


use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::backend::models::RValue;
use crate::backend::promise::Promise;
use crate::backend::symbol::Symbol;

/// Global counter for frame descriptors
static NEXT_DESCRIPTOR: AtomicU64 = AtomicU64::new(1);

/// Identity of the function whose calls create a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameDescriptor(u64);

impl FrameDescriptor {
    pub fn fresh() -> Self {
        FrameDescriptor(NEXT_DESCRIPTOR.fetch_add(1, Ordering::Relaxed))
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// What a symbol is bound to in a frame.
#[derive(Debug, Clone)]
pub enum Binding {
    Value(RValue),
    Promise(Promise),
    /// Formal without a supplied argument or default
    Missing,
}

struct Frame {
    descriptor: FrameDescriptor,
    bindings: RwLock<HashMap<Symbol, Binding>>,
    parent: Option<Environment>,
}

/// Shared handle on a frame. Clones refer to the same frame.
#[derive(Clone)]
pub struct Environment {
    frame: Arc<Frame>,
}

impl Environment {
    /// A top-level frame with a fresh descriptor.
    pub fn new_global() -> Self {
        Self::with_parent(FrameDescriptor::fresh(), None)
    }

    /// A frame for a call of the function identified by `descriptor`.
    pub fn new_child(&self, descriptor: FrameDescriptor) -> Self {
        Self::with_parent(descriptor, Some(self.clone()))
    }

    fn with_parent(descriptor: FrameDescriptor, parent: Option<Environment>) -> Self {
        Environment {
            frame: Arc::new(Frame {
                descriptor,
                bindings: RwLock::new(HashMap::new()),
                parent,
            }),
        }
    }

    pub fn descriptor(&self) -> FrameDescriptor {
        self.frame.descriptor
    }

    pub fn parent(&self) -> Option<&Environment> {
        self.frame.parent.as_ref()
    }

    /// Binding in this frame only. Never forces.
    pub fn get_local(&self, symbol: &Symbol) -> Option<Binding> {
        self.frame.bindings.read().get(symbol).cloned()
    }

    /// Binding in this frame or the nearest enclosing one. Never forces.
    pub fn lookup(&self, symbol: &Symbol) -> Option<Binding> {
        let mut env = Some(self);
        while let Some(current) = env {
            if let Some(binding) = current.get_local(symbol) {
                return Some(binding);
            }
            env = current.parent();
        }
        None
    }

    pub fn define(&self, symbol: Symbol, binding: Binding) {
        self.frame.bindings.write().insert(symbol, binding);
    }

    pub fn assign(&self, symbol: Symbol, value: RValue) {
        self.define(symbol, Binding::Value(value));
    }

    pub fn contains_local(&self, symbol: &Symbol) -> bool {
        self.frame.bindings.read().contains_key(symbol)
    }

    /// Names bound in this frame, sorted.
    pub fn symbols(&self) -> Vec<Symbol> {
        let mut symbols: Vec<Symbol> = self.frame.bindings.read().keys().cloned().collect();
        symbols.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        symbols
    }

    pub fn downgrade(&self) -> WeakEnvironment {
        WeakEnvironment(Arc::downgrade(&self.frame))
    }

    pub fn ptr_eq(&self, other: &Environment) -> bool {
        Arc::ptr_eq(&self.frame, &other.frame)
    }
}

impl PartialEq for Environment {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("descriptor", &self.frame.descriptor.id())
            .field("bindings", &self.frame.bindings.read().len())
            .field("has_parent", &self.frame.parent.is_some())
            .finish()
    }
}

/// Non-owning handle on a frame.
#[derive(Clone)]
pub struct WeakEnvironment(Weak<Frame>);

impl WeakEnvironment {
    /// `None` once the frame has been reclaimed.
    pub fn upgrade(&self) -> Option<Environment> {
        self.0.upgrade().map(|frame| Environment { frame })
    }
}

impl fmt::Debug for WeakEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(env) => write!(f, "WeakEnvironment({})", env.descriptor().id()),
            None => write!(f, "WeakEnvironment(<reclaimed>)"),
        }
    }
}
