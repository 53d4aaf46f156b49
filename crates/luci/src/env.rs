//! Scope environments.
//!
//! An environment is a binding frame with a strong reference to its
//! enclosing frame. `has`/`get`/`set` walk outward; `add` only touches the
//! current frame. Frames are created on scope entry and dropped on exit,
//! after the destructor sweep has run.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;

use crate::ast::TypeExpression;
use crate::errors::{ErrorKind, ErrorObj};
use crate::object::ObjectRef;

/// Environments constructed since process start, for `-s` statistics.
pub static ENVIRONMENTS_CONSTRUCTED: AtomicUsize = AtomicUsize::new(0);
/// Environments destructed since process start, for `-s` statistics.
pub static ENVIRONMENTS_DESTRUCTED: AtomicUsize = AtomicUsize::new(0);

pub type EnvRef = Rc<RefCell<Environment>>;

pub struct Binding {
    pub value: ObjectRef,
    pub constant: bool,
    pub declared_type: Option<Arc<TypeExpression>>,
}

pub struct Environment {
    pub outer: Option<EnvRef>,
    pub store: IndexMap<String, Binding, ahash::RandomState>,
}

impl Environment {
    #[must_use]
    pub fn new(outer: Option<EnvRef>) -> EnvRef {
        ENVIRONMENTS_CONSTRUCTED.fetch_add(1, Ordering::Relaxed);
        Rc::new(RefCell::new(Self {
            outer,
            store: IndexMap::default(),
        }))
    }

    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        if self.store.contains_key(name) {
            return true;
        }
        match &self.outer {
            Some(outer) => outer.borrow().has(name),
            None => false,
        }
    }

    pub fn get(&self, name: &str) -> Result<ObjectRef, ErrorObj> {
        if let Some(binding) = self.store.get(name) {
            return Ok(binding.value.clone());
        }
        match &self.outer {
            Some(outer) => outer.borrow().get(name),
            None => Err(ErrorObj::new(
                ErrorKind::IdentifierNotFound,
                format!("identifier not found: {name}"),
            )),
        }
    }

    /// The declared type recorded at the binding site, if any.
    #[must_use]
    pub fn get_type(&self, name: &str) -> Option<Arc<TypeExpression>> {
        if let Some(binding) = self.store.get(name) {
            return binding.declared_type.clone();
        }
        match &self.outer {
            Some(outer) => outer.borrow().get_type(name),
            None => None,
        }
    }

    /// Replaces the value of an existing binding, walking outward to find
    /// it. Fails on const bindings and on unknown names.
    pub fn set(&mut self, name: &str, value: ObjectRef) -> Result<ObjectRef, ErrorObj> {
        if let Some(binding) = self.store.get_mut(name) {
            if binding.constant {
                return Err(ErrorObj::new(
                    ErrorKind::ConstError,
                    format!("cannot update const identifier: {name}"),
                ));
            }
            binding.value = value.clone();
            return Ok(value);
        }
        match &self.outer {
            Some(outer) => outer.borrow_mut().set(name, value),
            None => Err(ErrorObj::new(
                ErrorKind::IdentifierNotFound,
                format!("identifier not found: {name}"),
            )),
        }
    }

    /// Adds a binding in this frame only.
    pub fn add(
        &mut self,
        name: &str,
        value: ObjectRef,
        constant: bool,
        declared_type: Option<Arc<TypeExpression>>,
    ) -> Result<ObjectRef, ErrorObj> {
        if self.store.contains_key(name) {
            return Err(ErrorObj::new(
                ErrorKind::IdentifierAlreadyExists,
                format!("identifier already exists: {name}"),
            ));
        }
        self.store.insert(
            name.to_string(),
            Binding {
                value: value.clone(),
                constant,
                declared_type,
            },
        );
        Ok(value)
    }

    /// Names visible from this frame, outermost first.
    #[must_use]
    pub fn visible_names(&self) -> Vec<String> {
        let mut names = match &self.outer {
            Some(outer) => outer.borrow().visible_names(),
            None => vec![],
        };
        names.extend(self.store.keys().cloned());
        names
    }
}

impl Drop for Environment {
    fn drop(&mut self) {
        ENVIRONMENTS_DESTRUCTED.fetch_add(1, Ordering::Relaxed);
    }
}
