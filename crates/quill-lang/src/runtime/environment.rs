//! Lexical scopes.
//!
//! An `Environment` is a cheap handle onto a shared scope. Cloning the handle
//! aliases the scope, which is how closures, call frames and loop bodies all
//! see (and mutate) the same bindings. Children point at parents only, so the
//! chain itself never forms a cycle.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::RuntimeError;
use crate::runtime::value::Value;

#[derive(Clone, Default)]
pub struct Environment {
    inner: Rc<RefCell<Scope>>,
}

#[derive(Default)]
struct Scope {
    store: FxHashMap<String, Value>,
    constants: FxHashSet<String>,
    outer: Option<Environment>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh child scope whose lookups fall back to `outer`.
    pub fn enclosed(outer: &Environment) -> Self {
        let scope = Scope { outer: Some(outer.clone()), ..Scope::default() };
        Self { inner: Rc::new(RefCell::new(scope)) }
    }

    /// Walk local then outer scopes. `None` is "not found", never a stored null.
    pub fn get(&self, name: &str) -> Option<Value> {
        let scope = self.inner.borrow();
        match scope.store.get(name) {
            Some(v) => Some(v.clone()),
            None => scope.outer.as_ref()?.get(name),
        }
    }

    /// `let`: the name must not already be bound in this scope.
    pub fn define(&self, name: &str, value: Value) -> Result<(), RuntimeError> {
        let mut scope = self.inner.borrow_mut();
        if scope.store.contains_key(name) {
            return Err(RuntimeError::AlreadyAssigned(name.to_string()));
        }
        scope.store.insert(name.to_string(), value);
        Ok(())
    }

    /// `const`: the name must not already be a constant in this scope.
    pub fn define_const(&self, name: &str, value: Value) -> Result<(), RuntimeError> {
        let mut scope = self.inner.borrow_mut();
        if scope.constants.contains(name) {
            return Err(RuntimeError::ConstantReassign(name.to_string()));
        }
        scope.store.insert(name.to_string(), value);
        scope.constants.insert(name.to_string());
        Ok(())
    }

    /// Overwrite an existing binding in whichever scope owns it.
    pub fn reassign(&self, name: &str, value: Value) -> Result<(), RuntimeError> {
        let mut scope = self.inner.borrow_mut();
        if scope.store.contains_key(name) {
            if scope.constants.contains(name) {
                return Err(RuntimeError::ConstantReassign(name.to_string()));
            }
            scope.store.insert(name.to_string(), value);
            return Ok(());
        }
        match &scope.outer {
            Some(outer) => outer.reassign(name, value),
            None => Err(RuntimeError::IdentifierNotFound(name.to_string())),
        }
    }

    pub fn is_const(&self, name: &str) -> bool {
        let scope = self.inner.borrow();
        if scope.store.contains_key(name) {
            return scope.constants.contains(name);
        }
        scope.outer.as_ref().is_some_and(|outer| outer.is_const(name))
    }

    pub fn ptr_eq(&self, other: &Environment) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Environment {
    // values may hold closures over this very scope
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scope = self.inner.borrow();
        let mut names: Vec<_> = scope.store.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("Environment")
            .field("names", &names)
            .field("has_outer", &scope.outer.is_some())
            .finish()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
