//! Typed value scopes handlers resolve their arguments from.
//!
//! The application owns one [`Injector`]. Every request gets a [`Scope`] whose parent is
//! that injector: values registered on the scope (usually by middleware) are only seen by
//! the rest of that request's chain, and lookups fall back to the application values.

use http::Extensions;

/// Application-wide values, keyed by their type.
#[derive(Debug, Default, Clone)]
pub struct Injector {
    values: Extensions,
}

impl Injector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `value`, returning the value of the same type it replaced, if any.
    pub fn register<T: Clone + Send + Sync + 'static>(&mut self, value: T) -> Option<T> {
        self.values.insert(value)
    }

    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.values.get::<T>()
    }

    pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
        self.get::<T>().is_some()
    }

    /// Opens a child scope for one request.
    pub fn scope(&self) -> Scope<'_> {
        Scope { values: Extensions::new(), parent: Some(self) }
    }
}

/// Request-scoped values, falling back to the application's [`Injector`].
#[derive(Debug, Default)]
pub struct Scope<'app> {
    values: Extensions,
    parent: Option<&'app Injector>,
}

impl<'app> Scope<'app> {
    pub fn register<T: Clone + Send + Sync + 'static>(&mut self, value: T) -> Option<T> {
        self.values.insert(value)
    }

    /// Resolves a value, looking in the request scope first.
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.values.get::<T>().or_else(|| self.parent.and_then(Injector::get::<T>))
    }
}
