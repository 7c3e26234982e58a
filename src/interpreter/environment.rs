use indexmap::IndexMap;
use std::cell::RefCell;
use std::rc::Rc;

use super::error::RuntimeError;
use crate::value::Value;

/// One lexical binding frame, linked to its defining parent for
/// fallback lookup. Frames are shared by `Rc` handle: closures keep
/// their defining chain alive, child frames keep their parents alive.
#[derive(Debug, Default)]
pub struct Scope {
    bindings: RefCell<IndexMap<Rc<str>, Value>>,
    parent: Option<Rc<Scope>>,
}

impl Scope {
    /// A root frame. Roots follow the bootstrapping convention: `set`
    /// on a name nobody owns defines it here instead of failing.
    pub fn root() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// A child frame whose lookups fall through to `self`.
    pub fn extend(self: &Rc<Self>) -> Rc<Self> {
        Rc::new(Self {
            bindings: RefCell::new(IndexMap::new()),
            parent: Some(Rc::clone(self)),
        })
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Creates or overwrites a binding in this frame only. Shadows any
    /// ancestor binding of the same name.
    pub fn def(&self, name: impl Into<Rc<str>>, value: Value) {
        self.bindings.borrow_mut().insert(name.into(), value);
    }

    /// The nearest frame, starting here, that owns `name`.
    pub fn lookup(self: &Rc<Self>, name: &str) -> Option<Rc<Scope>> {
        let mut scope = Rc::clone(self);
        loop {
            if scope.bindings.borrow().contains_key(name) {
                return Some(scope);
            }
            let parent = scope.parent.clone()?;
            scope = parent;
        }
    }

    /// Walks the chain and resolves `name`, failing with the offending
    /// name and a snapshot of everything currently bound.
    pub fn get(&self, name: &str) -> Result<Value, RuntimeError> {
        let mut scope = self;
        loop {
            if let Some(value) = scope.bindings.borrow().get(name) {
                return Ok(value.clone());
            }
            match &scope.parent {
                Some(parent) => scope = parent,
                None => return Err(RuntimeError::scope("get", name, self.snapshot())),
            }
        }
    }

    /// Mutates `name` in the nearest frame that owns it. A miss is an
    /// undefined-variable failure, except on a root scope, which
    /// defines into itself (how the bootstrap program installs its
    /// bindings).
    pub fn set(self: &Rc<Self>, name: &str, value: Value) -> Result<Value, RuntimeError> {
        match self.lookup(name) {
            Some(owner) => {
                owner.bindings.borrow_mut().insert(Rc::from(name), value.clone());
                Ok(value)
            }
            None if self.is_root() => {
                self.def(name, value.clone());
                Ok(value)
            }
            None => Err(RuntimeError::scope("set", name, self.snapshot())),
        }
    }

    /// Every name bound through the chain, innermost first, for
    /// undefined-variable diagnostics.
    pub fn snapshot(&self) -> Vec<String> {
        let mut names = Vec::new();
        let mut scope = Some(self);
        while let Some(current) = scope {
            for name in current.bindings.borrow().keys() {
                if !names.iter().any(|n| n == &**name) {
                    names.push(name.to_string());
                }
            }
            scope = current.parent.as_deref();
        }
        names
    }
}
