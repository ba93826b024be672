use crate::error::ConfigError;
use crate::handler::RequestHandler;
use crate::router::route::RouteBuilder;
use crate::router::{Route, RouteTable};
use http::Method;
use tracing::debug;

/// An ordered, nestable group of routes under configuration.
///
/// Routes are matched in the order they are declared. Child collections are mounted under
/// a path prefix with [`mount`](Self::mount); mounting takes the child by value, so a
/// collection lives in exactly one place in the tree. Nothing is compiled until
/// [`freeze`](Self::freeze) flattens the tree into a [`RouteTable`].
#[derive(Debug, Default)]
pub struct RouteCollection {
    routes: Vec<RouteBuilder>,
    children: Vec<RouteCollection>,
    prefix: String,
}

macro_rules! method_route {
    ($(#[$doc:meta])* $method:ident, $($verb:ident),+) => {
        $(#[$doc])*
        pub fn $method<H: RequestHandler + 'static>(&mut self, path: impl Into<String>, handler: H) -> &mut RouteBuilder {
            let route = self.all(path, handler);
            route.methods([$(Method::$verb),+]);
            route
        }
    };
}

impl RouteCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an already configured route.
    pub fn add_route(&mut self, route: RouteBuilder) -> &mut RouteBuilder {
        self.routes.push(route);
        let last = self.routes.len() - 1;
        &mut self.routes[last]
    }

    /// Creates a route that matches all methods.
    pub fn all<H: RequestHandler + 'static>(&mut self, path: impl Into<String>, handler: H) -> &mut RouteBuilder {
        self.add_route(RouteBuilder::new(path, handler))
    }

    /// Creates a route restricted to the given methods.
    pub fn route<H, I>(&mut self, methods: I, path: impl Into<String>, handler: H) -> &mut RouteBuilder
    where
        H: RequestHandler + 'static,
        I: IntoIterator<Item = Method>,
    {
        let route = self.all(path, handler);
        route.methods(methods);
        route
    }

    method_route!(
        /// Creates a route for `GET` and `HEAD` requests.
        get, GET, HEAD
    );
    method_route!(
        /// Creates a route for `POST` requests.
        post, POST
    );
    method_route!(
        /// Creates a route for `PUT` requests.
        put, PUT
    );
    method_route!(
        /// Creates a route for `DELETE` requests.
        delete, DELETE
    );
    method_route!(
        /// Creates a route for `PATCH` requests.
        patch, PATCH
    );
    method_route!(
        /// Creates a route for `OPTIONS` requests.
        options, OPTIONS
    );

    /// Creates a passthrough route for middleware.
    ///
    /// The route handles all methods and its pattern is not anchored at the end, so it
    /// matches every request whose path starts with `path`. Its handler usually calls
    /// [`RequestContext::next`](crate::RequestContext::next) to hand the request on.
    pub fn middleware<H: RequestHandler + 'static>(&mut self, path: impl Into<String>, handler: H) -> &mut RouteBuilder {
        let route = self.all(path, handler);
        route.passthrough(true);
        route
    }

    /// Mounts `collection` on `prefix`. All its routes, and those of its own children,
    /// get the prefix prepended when the tree is frozen.
    pub fn mount(&mut self, prefix: &str, mut collection: RouteCollection) -> &mut Self {
        collection.prefix = normalize_prefix(prefix);
        debug!(prefix = %collection.prefix, routes = collection.routes.len(), "mount route collection");
        self.children.push(collection);
        self
    }

    pub fn routes(&self) -> &[RouteBuilder] {
        &self.routes
    }

    pub fn children(&self) -> &[RouteCollection] {
        &self.children
    }

    /// The normalized prefix this collection was mounted with, empty for a root.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Total number of routes in this collection and all of its descendants.
    pub fn len(&self) -> usize {
        self.routes.len() + self.children.iter().map(RouteCollection::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Compiles every route of the tree into one flat table.
    ///
    /// The table lists this collection's own routes first, then each child's routes in
    /// mount order, each child's own routes preceding those of its children. A route's
    /// path is prefixed with the concatenated prefixes of all its ancestors.
    pub fn freeze(&self) -> Result<RouteTable, ConfigError> {
        let mut routes = Vec::with_capacity(self.len());
        self.flatten_into(&self.prefix, &mut routes)?;
        Ok(RouteTable::new(routes))
    }

    fn flatten_into(&self, prefix: &str, routes: &mut Vec<Route>) -> Result<(), ConfigError> {
        for route in &self.routes {
            routes.push(route.freeze(prefix)?);
        }
        for child in &self.children {
            let child_prefix = normalize_prefix(&format!("{prefix}{}", child.prefix));
            child.flatten_into(&child_prefix, routes)?;
        }
        Ok(())
    }
}

/// Forces a non-empty prefix to start with `/`, and makes a trailing `/` optional so
/// mounted routes don't all require one.
fn normalize_prefix(prefix: &str) -> String {
    if prefix.is_empty() {
        return String::new();
    }
    let mut normalized = String::with_capacity(prefix.len() + 2);
    if !prefix.starts_with('/') {
        normalized.push('/');
    }
    normalized.push_str(prefix);
    if normalized.ends_with('/') {
        normalized.push('?');
    }
    normalized
}
