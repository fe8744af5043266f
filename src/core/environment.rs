use std::cell::RefCell;
use std::collections::HashMap;
use std::iter::FromIterator;
use std::mem;
use std::rc::Rc;

use super::Object;

/// A shared handle to a frame.
///
/// Frames are shared rather than copied: a call frame points at the frame its
/// function was defined in, and every closure created inside a frame keeps
/// it alive for as long as the closure is reachable.
pub type Env = Rc<RefCell<Environment>>;

/// A single scope: local bindings plus an optional enclosing scope.
///
/// ```notrust
///     +---------------+
///     | call frame    |
///     | =             |
///     | values: {     |
///     |   y: 3        |
///     | }             |
///     |               |
///     | enclosing: ---+------>+---------------+
///     +---------------+       | closure frame |
///                             | =             |
///                             | values: {     |
///                             |   x: 2        |
///                             | }             |
///                             |               |
///                             | enclosing: ---+------> root
///                             +---------------+
/// ```
///
/// Lookups walk outward through `enclosing`. Bindings only ever land in the
/// local frame, so an inner scope can shadow an outer name but never
/// overwrite it.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    values: HashMap<String, Object>,
    enclosing: Option<Env>,
}

impl Environment {
    /// Creates a new, empty root frame.
    #[must_use]
    #[allow(clippy::new_ret_no_self)]
    pub fn new() -> Env {
        Rc::new(RefCell::new(Environment::default()))
    }

    /// Creates an empty frame whose lookups fall back to `enclosing`.
    #[must_use]
    pub fn enclosed(enclosing: &Env) -> Env {
        Rc::new(RefCell::new(Environment {
            values: HashMap::new(),
            enclosing: Some(Rc::clone(enclosing)),
        }))
    }

    /// Binds `name` to `value` in this frame, replacing any local binding of
    /// the same name.
    pub fn set(&mut self, name: String, value: Object) {
        self.values.insert(name, value);
    }

    /// Returns the value of `name` in the first frame it's found in.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Object> {
        match self.values.get(name) {
            Some(value) => Some(value.clone()),
            None => self
                .enclosing
                .as_ref()
                .and_then(|enclosing| enclosing.borrow().get(name)),
        }
    }

    /// Drops the bindings of a finished call frame once nothing outside the
    /// frame can reach it.
    ///
    /// A closure bound in the frame it captured holds that frame through its
    /// own `Rc`. If those closures and `frame` account for every strong
    /// reference, the frame is unreachable and clearing it breaks the cycle.
    pub fn release(frame: Env) {
        let self_references = frame
            .borrow()
            .values
            .values()
            .filter(|value| match value {
                Object::Function(function) => function.captures(&frame),
                _ => false,
            })
            .count();

        if Rc::strong_count(&frame) == self_references + 1 {
            let values = mem::take(&mut frame.borrow_mut().values);
            drop(values);
        }
    }

    /// Wraps this frame in a fresh shared handle.
    #[must_use]
    pub fn into_env(self) -> Env {
        Rc::new(RefCell::new(self))
    }
}

/// Builds a root frame from `(name, value)` pairs.
impl FromIterator<(String, Object)> for Environment {
    fn from_iter<T>(iter: T) -> Self
    where
        T: IntoIterator<Item = (String, Object)>,
    {
        let mut values = HashMap::new();
        values.extend(iter);

        Environment {
            values,
            enclosing: None,
        }
    }
}
