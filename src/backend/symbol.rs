//! R symbols (`name` objects) used for bindings, formals and attribute keys.
//!
//! With the `symbol-interning` feature the symbol text is interned in a global
//! lasso `ThreadedRodeo` and a `Symbol` is a 4-byte key with O(1) comparison.
//! Without it the symbol owns its text. Both representations expose the same
//! API, so the rest of the crate never looks at the representation.
//!
//! # Example
//! ```
//! use rcore::backend::symbol::{intern, Symbol};
//!
//! let x = intern("x");
//! assert_eq!(x, Symbol::new("x"));
//! assert_eq!(x.as_str(), "x");
//! ```

use std::fmt;

#[cfg(feature = "symbol-interning")]
mod repr {
    use lasso::{Spur, ThreadedRodeo};
    use std::sync::OnceLock;

    static INTERNER: OnceLock<ThreadedRodeo> = OnceLock::new();

    #[inline]
    fn interner() -> &'static ThreadedRodeo {
        INTERNER.get_or_init(ThreadedRodeo::new)
    }

    #[derive(Copy, Clone, Eq, PartialEq, Hash)]
    pub struct Repr(Spur);

    impl Repr {
        #[inline]
        pub fn new(s: &str) -> Self {
            Repr(interner().get_or_intern(s))
        }

        #[inline]
        pub fn from_string(s: String) -> Self {
            Repr(interner().get_or_intern(s))
        }

        #[inline]
        pub fn as_str(&self) -> &str {
            interner().resolve(&self.0)
        }
    }
}

#[cfg(not(feature = "symbol-interning"))]
mod repr {
    use std::sync::Arc;

    #[derive(Clone, Eq, PartialEq, Hash)]
    pub struct Repr(Arc<str>);

    impl Repr {
        #[inline]
        pub fn new(s: &str) -> Self {
            Repr(Arc::from(s))
        }

        #[inline]
        pub fn from_string(s: String) -> Self {
            Repr(Arc::from(s))
        }

        #[inline]
        pub fn as_str(&self) -> &str {
            &self.0
        }
    }
}

/// An R symbol.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct Symbol(repr::Repr);

impl Symbol {
    #[inline]
    pub fn new(s: &str) -> Self {
        Symbol(repr::Repr::new(s))
    }

    #[inline]
    pub fn from_string(s: String) -> Self {
        Symbol(repr::Repr::from_string(s))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({:?})", self.as_str())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Symbol {
    #[inline]
    fn from(s: &str) -> Self {
        Symbol::new(s)
    }
}

impl From<String> for Symbol {
    #[inline]
    fn from(s: String) -> Self {
        Symbol::from_string(s)
    }
}

impl AsRef<str> for Symbol {
    #[inline]
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl PartialEq<str> for Symbol {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for Symbol {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

/// Intern a string and return a Symbol
#[inline]
pub fn intern(s: &str) -> Symbol {
    Symbol::new(s)
}

/// Intern an owned string and return a Symbol
#[inline]
pub fn intern_string(s: String) -> Symbol {
    Symbol::from_string(s)
}
