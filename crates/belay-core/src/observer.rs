//! Ordered callback registry.

use std::fmt;

/// Callback invoked with a borrowed value.
pub type Handler<T> = Box<dyn FnMut(&T) + Send>;

/// Observers notified in registration order.
pub struct Observers<T> {
    handlers: Vec<Handler<T>>,
}

impl<T> Observers<T> {
    /// Empty registry.
    pub fn new() -> Self {
        Self { handlers: Vec::new() }
    }

    /// Register a handler. Handlers are never removed; the registry lives as
    /// long as its owner.
    pub fn register(&mut self, handler: impl FnMut(&T) + Send + 'static) {
        self.handlers.push(Box::new(handler));
    }

    /// Invoke every handler with `value`, oldest first.
    pub fn notify(&mut self, value: &T) {
        for handler in &mut self.handlers {
            handler(value);
        }
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// True if no handler is registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl<T> Default for Observers<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Observers<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers").field("handlers", &self.handlers.len()).finish()
    }
}
