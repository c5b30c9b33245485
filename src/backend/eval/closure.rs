use std::fmt;
use std::sync::Arc;

use super::expression::Expr;
use crate::backend::environment::{Environment, FrameDescriptor};
use crate::backend::symbol::{intern, Symbol};

/// A formal parameter with an optional default expression.
#[derive(Debug, Clone)]
pub struct Formal {
    pub name: Symbol,
    pub default: Option<Expr>,
}

impl Formal {
    pub fn required(name: &str) -> Self {
        Formal {
            name: intern(name),
            default: None,
        }
    }

    pub fn with_default(name: &str, default: Expr) -> Self {
        Formal {
            name: intern(name),
            default: Some(default),
        }
    }
}

/// A function definition. Every call of it creates a frame carrying its
/// descriptor.
#[derive(Debug)]
pub struct Function {
    name: Option<String>,
    formals: Vec<Formal>,
    body: Expr,
    descriptor: FrameDescriptor,
}

impl Function {
    pub fn new(formals: Vec<Formal>, body: Expr) -> Self {
        Function {
            name: None,
            formals,
            body,
            descriptor: FrameDescriptor::fresh(),
        }
    }

    pub fn named(name: &str, formals: Vec<Formal>, body: Expr) -> Self {
        Function {
            name: Some(name.to_string()),
            ..Function::new(formals, body)
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn formals(&self) -> &[Formal] {
        &self.formals
    }

    pub fn body(&self) -> &Expr {
        &self.body
    }

    pub fn descriptor(&self) -> FrameDescriptor {
        self.descriptor
    }
}

/// A function closed over the frame it was created in.
#[derive(Clone)]
pub struct Closure {
    function: Arc<Function>,
    env: Environment,
}

impl Closure {
    pub fn new(function: Arc<Function>, env: Environment) -> Self {
        Closure { function, env }
    }

    pub fn function(&self) -> &Arc<Function> {
        &self.function
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    /// Name used in error messages.
    pub fn name(&self) -> &str {
        self.function.name().unwrap_or("<anonymous>")
    }
}

impl PartialEq for Closure {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.function, &other.function) && self.env.ptr_eq(&other.env)
    }
}

impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Closure")
            .field("name", &self.name())
            .field("formals", &self.function.formals.len())
            .field("descriptor", &self.function.descriptor)
            .finish()
    }
}
