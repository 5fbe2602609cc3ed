use crate::Object;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared handle to an [`Environment`]. Closures keep their defining environment alive through it.
pub type Env = Rc<RefCell<Environment>>;

/// A scope mapping names to values, with an optional enclosing scope.
#[derive(Default)]
pub struct Environment {
    store: HashMap<String, Object>,
    outer: Option<Env>,
}

impl Environment {
    /// Create a new global environment.
    pub fn new() -> Env {
        Rc::new(RefCell::new(Self::default()))
    }

    /// Create a scope whose misses fall through to `outer`.
    pub fn new_enclosed(outer: Env) -> Env {
        Rc::new(RefCell::new(Self {
            store: HashMap::new(),
            outer: Some(outer),
        }))
    }

    /// Looks `name` up in this scope, then in the enclosing ones.
    pub fn get(&self, name: &str) -> Option<Object> {
        match self.store.get(name) {
            Some(val) => Some(val.clone()),
            None => self.outer.as_ref().and_then(|outer| outer.borrow().get(name)),
        }
    }

    /// Binds `name` in this scope, shadowing any enclosing binding.
    pub fn set(&mut self, name: impl Into<String>, val: Object) {
        self.store.insert(name.into(), val);
    }
}
