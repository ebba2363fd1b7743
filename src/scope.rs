//! Chained name → value environments with closure semantics.
//!
//! # The assignment rule
//!
//! [`Scope::assign`] writes into the *current* scope's own map only if that
//! name is already bound there, or if the scope has no parent at all.
//! Otherwise it delegates to the parent. Since a freshly created call scope
//! starts out empty, the very first write to any name from inside a
//! function body - including binding its own parameters - never lands
//! locally: it walks all the way up to the root, because nothing ever
//! matched the "already bound here" half of the rule. Only the *second* and
//! later writes to that name, from that same scope, land locally once the
//! root copy is found... except they never do, because the search always
//! restarts from the call scope, which remains permanently empty. The net
//! effect is that nested call scopes behave as transparent pass-through
//! layers and the root scope acts as a single catch-all for every name ever
//! introduced anywhere in the program.
//!
//! This is surprising, and it is specified behavior, not a bug: an
//! implementation that instead gives every call its own private bindings
//! would change observable program output and must not be substituted here.
use std::collections::HashMap;
use std::rc::Rc;
use std::cell::RefCell;

use crate::error::{InterpError, Result};
use crate::value::Value;

struct ScopeInner {
    bindings: HashMap<String, Value>,
    parent: Option<Scope>,
}

/// A lexical scope. Cheap to clone - clones share the same underlying
/// bindings map via [`Rc`] - which is what lets a closure capture "the
/// scope in effect right now" just by holding onto a `Scope` handle.
#[derive(Clone)]
pub struct Scope(Rc<RefCell<ScopeInner>>);

impl Scope {
    /// Creates a new scope with no parent. Exactly one such root exists per
    /// program run; it is the eventual destination of every assignment that
    /// reaches the top of the chain.
    pub fn root() -> Self {
        Self(Rc::new(RefCell::new(ScopeInner {
            bindings: HashMap::new(),
            parent: None,
        })))
    }

    /// Creates a new, empty scope chained under `parent`. Used on function
    /// entry; the scope is discarded on return, surviving only through
    /// whatever closures captured it.
    pub fn child_of(parent: &Scope) -> Self {
        Self(Rc::new(RefCell::new(ScopeInner {
            bindings: HashMap::new(),
            parent: Some(parent.clone()),
        })))
    }

    /// Searches this scope's own bindings, then its ancestors, in order.
    pub fn look_up(&self, name: &str) -> Result<Value> {
        let inner = self.0.borrow();
        if let Some(value) = inner.bindings.get(name) {
            return Ok(value.clone());
        }
        match &inner.parent {
            Some(parent) => {
                let parent = parent.clone();
                drop(inner);
                parent.look_up(name)
            }
            None => Err(InterpError::runtime(format!("no variable {name}"))),
        }
    }

    /// Writes `value` under `name`, following the assignment rule described
    /// in the module docs.
    pub fn assign(&self, name: &str, value: Value) {
        let mut inner = self.0.borrow_mut();
        if inner.bindings.contains_key(name) || inner.parent.is_none() {
            inner.bindings.insert(name.to_string(), value);
            return;
        }
        let parent = inner.parent.clone().unwrap();
        drop(inner);
        parent.assign(name, value);
    }

    pub fn ptr_eq(&self, other: &Scope) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_walks_up_the_chain() {
        let root = Scope::root();
        root.assign("x", Value::Number(1.0));
        let child = Scope::child_of(&root);
        assert_eq!(child.look_up("x").unwrap().type_name(), "number");
    }

    #[test]
    fn unbound_lookup_fails() {
        let root = Scope::root();
        assert!(root.look_up("missing").is_err());
    }

    #[test]
    fn assign_in_a_fresh_child_scope_ascends_to_the_root() {
        let root = Scope::root();
        let child = Scope::child_of(&root);
        child.assign("n", Value::Number(42.0));
        // The child never got its own binding: the write climbed to root.
        assert!(matches!(root.look_up("n"), Ok(Value::Number(n)) if n == 42.0));
    }

    #[test]
    fn assign_prefers_an_existing_local_binding() {
        let root = Scope::root();
        let child = Scope::child_of(&root);
        // Pre-populate child's own map directly to simulate a prior local write.
        child.0.borrow_mut().bindings.insert("n".to_string(), Value::Number(1.0));
        child.assign("n", Value::Number(2.0));
        assert!(matches!(child.look_up("n"), Ok(Value::Number(n)) if n == 2.0));
        // Root was never touched.
        assert!(root.look_up("n").is_err());
    }
}
