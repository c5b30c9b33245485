//! Class-based method lookup for generic conversions.
//!
//! A method is registered for a `(generic, class)` pair. Dispatch walks the
//! value's class hierarchy in order and calls the first method found. The
//! caller decides what to do when no method exists or a method fails; for
//! `as.character` that is a fallback to the default conversion.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::trace;

use crate::backend::errors::RResult;
use crate::backend::models::RValue;

/// A class-specific implementation of a generic.
pub trait ClassMethod: Send + Sync {
    /// Name of the generic, e.g. `as.character`
    fn generic(&self) -> &str;

    /// Class this method is registered for
    fn class(&self) -> &str;

    fn call(&self, value: &RValue) -> RResult<RValue>;
}

/// A method backed by a closure.
pub struct FnMethod<F> {
    generic: String,
    class: String,
    f: F,
}

impl<F> FnMethod<F>
where
    F: Fn(&RValue) -> RResult<RValue> + Send + Sync,
{
    pub fn new(generic: &str, class: &str, f: F) -> Self {
        FnMethod {
            generic: generic.to_string(),
            class: class.to_string(),
            f,
        }
    }
}

impl<F> ClassMethod for FnMethod<F>
where
    F: Fn(&RValue) -> RResult<RValue> + Send + Sync,
{
    fn generic(&self) -> &str {
        &self.generic
    }

    fn class(&self) -> &str {
        &self.class
    }

    fn call(&self, value: &RValue) -> RResult<RValue> {
        (self.f)(value)
    }
}

/// Registry of class methods, keyed by `(generic, class)`.
#[derive(Default, Clone)]
pub struct MethodTable {
    methods: HashMap<(String, String), Arc<dyn ClassMethod>>,
}

impl MethodTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, method: Arc<dyn ClassMethod>) {
        let key = (method.generic().to_string(), method.class().to_string());
        self.methods.insert(key, method);
    }

    pub fn register_fn<F>(&mut self, generic: &str, class: &str, f: F)
    where
        F: Fn(&RValue) -> RResult<RValue> + Send + Sync + 'static,
    {
        self.register(Arc::new(FnMethod::new(generic, class, f)));
    }

    /// First method for `generic` along `classes`.
    pub fn lookup(&self, generic: &str, classes: &[String]) -> Option<Arc<dyn ClassMethod>> {
        classes.iter().find_map(|class| {
            self.methods
                .get(&(generic.to_string(), class.clone()))
                .cloned()
        })
    }

    /// Dispatch on the value's class hierarchy. `None` when no method applies.
    pub fn dispatch(&self, generic: &str, value: &RValue) -> Option<RResult<RValue>> {
        let classes = value.class_hierarchy();
        let method = self.lookup(generic, &classes)?;
        trace!(target: "rcore::dispatch", generic, class = method.class(), "Dispatching");
        Some(method.call(value))
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::models::RVector;

    fn classed(classes: &[&str]) -> RValue {
        let mut v = RVector::double(vec![1.0]);
        v.set_class(classes);
        RValue::Vector(v)
    }

    #[test]
    fn test_dispatch_follows_hierarchy() {
        let mut table = MethodTable::new();
        table.register_fn("as.character", "base", |_| Ok(RValue::string("base")));
        table.register_fn("as.character", "derived", |_| Ok(RValue::string("derived")));

        let derived = classed(&["derived", "base"]);
        let base_only = classed(&["other", "base"]);
        assert_eq!(
            table.dispatch("as.character", &derived),
            Some(Ok(RValue::string("derived")))
        );
        assert_eq!(
            table.dispatch("as.character", &base_only),
            Some(Ok(RValue::string("base")))
        );
    }

    #[test]
    fn test_matrix_finds_array_method() {
        let mut table = MethodTable::new();
        table.register_fn("as.character", "array", |_| Ok(RValue::string("array")));

        let mut m = RVector::integer(vec![1, 2, 3, 4]);
        m.set_dim(Some(vec![2, 2])).unwrap();
        assert_eq!(
            table.dispatch("as.character", &RValue::Vector(m)),
            Some(Ok(RValue::string("array")))
        );
    }

    #[test]
    fn test_no_method() {
        let table = MethodTable::new();
        assert!(table.dispatch("as.character", &classed(&["foo"])).is_none());
        assert!(table.is_empty());
    }
}
