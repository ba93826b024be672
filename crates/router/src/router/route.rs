use crate::error::ConfigError;
use crate::handler::RequestHandler;
use crate::request::{PathParams, RequestHeader};
use crate::router::filter::{AllFilter, Filter, MethodFilter, PathFilter, all_filter};
use crate::router::pattern;
use http::Method;
use once_cell::sync::Lazy;
use regex::Regex;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new("\\W+").expect("static pattern is valid"));

type Attributes = HashMap<String, Arc<dyn Any + Send + Sync>>;

/// A route under configuration.
///
/// Every setter returns `&mut Self` so routes can be configured fluently right after
/// they are declared on a [`RouteCollection`](super::RouteCollection). Nothing is compiled
/// until the owning collection is frozen.
pub struct RouteBuilder {
    path: String,
    methods: Vec<Method>,
    handler: Arc<dyn RequestHandler>,
    assertions: HashMap<String, String>,
    attributes: Attributes,
    filters: Vec<Arc<dyn Filter>>,
    name: Option<String>,
    passthrough: bool,
}

impl RouteBuilder {
    /// Creates a route with a path that handles all methods.
    pub fn new<H: RequestHandler + 'static>(path: impl Into<String>, handler: H) -> Self {
        Self {
            path: path.into(),
            methods: Vec::new(),
            handler: Arc::new(handler),
            assertions: HashMap::new(),
            attributes: HashMap::new(),
            filters: Vec::new(),
            name: None,
            passthrough: false,
        }
    }

    /// Sets the methods handled by the route. An empty set, or the `*` verb, means all methods.
    pub fn methods<I: IntoIterator<Item = Method>>(&mut self, methods: I) -> &mut Self {
        self.methods = methods.into_iter().collect();
        self
    }

    pub fn handler<H: RequestHandler + 'static>(&mut self, handler: H) -> &mut Self {
        self.handler = Arc::new(handler);
        self
    }

    /// Restricts the param `name` to values matching `pattern`.
    ///
    /// The pattern is checked right away, so a typo fails at configuration time rather than
    /// on the first request.
    pub fn assert(&mut self, name: impl Into<String>, pattern: &str) -> Result<&mut Self, ConfigError> {
        let name = name.into();
        let wrapped = format!("({pattern})");
        Regex::new(&wrapped).map_err(|e| ConfigError::invalid_assertion(&name, e))?;
        self.assertions.insert(name, wrapped);
        Ok(self)
    }

    pub fn name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = Some(name.into());
        self
    }

    pub fn attribute<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) -> &mut Self {
        self.attributes.insert(key.into(), Arc::new(value));
        self
    }

    /// Adds an extra filter the request must pass, on top of the path and method ones.
    pub fn with<F: Filter + 'static>(&mut self, filter: F) -> &mut Self {
        self.filters.push(Arc::new(filter));
        self
    }

    pub(crate) fn passthrough(&mut self, passthrough: bool) -> &mut Self {
        self.passthrough = passthrough;
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_passthrough(&self) -> bool {
        self.passthrough
    }

    /// Compiles the route as mounted under `prefix`.
    pub(crate) fn freeze(&self, prefix: &str) -> Result<Route, ConfigError> {
        let path = format!("{prefix}{}", self.path);
        let (pattern, params) = pattern::compile(&path, &self.assertions, self.passthrough)?.into_parts();

        let name = self.name.clone().unwrap_or_else(|| default_name(&path, &self.methods));
        let methods = MethodFilter::new(self.methods.iter().cloned());

        let mut filter = all_filter();
        filter.and(PathFilter::new(pattern.clone())).and(methods.clone());
        for extra in &self.filters {
            filter.and_shared(Arc::clone(extra));
        }

        Ok(Route {
            path,
            pattern,
            params,
            methods,
            handler: Arc::clone(&self.handler),
            assertions: self.assertions.clone(),
            attributes: self.attributes.clone(),
            filter,
            name,
            passthrough: self.passthrough,
        })
    }
}

impl fmt::Debug for RouteBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteBuilder")
            .field("path", &self.path)
            .field("methods", &self.methods)
            .field("assertions", &self.assertions)
            .field("name", &self.name)
            .field("passthrough", &self.passthrough)
            .finish_non_exhaustive()
    }
}

/// Derives a name like `_item_id__GET_HEAD_` from the path and methods.
fn default_name(path: &str, methods: &[Method]) -> String {
    let methods = methods.iter().map(Method::as_str).collect::<Vec<_>>().join(" ");
    NON_WORD.replace_all(&format!("{path}_[{methods}]"), "_").into_owned()
}

/// A frozen route: compiled pattern, method set, handler and metadata, all read-only.
pub struct Route {
    path: String,
    pattern: Regex,
    params: Vec<String>,
    methods: MethodFilter,
    handler: Arc<dyn RequestHandler>,
    assertions: HashMap<String, String>,
    attributes: Attributes,
    filter: AllFilter,
    name: String,
    passthrough: bool,
}

impl Route {
    /// The declared path with every ancestor prefix applied.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    /// Route param names, in capture order.
    ///
    /// For instance a route declared as `/catalog/:category/:productId`
    /// returns `["category", "productId"]`.
    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn methods(&self) -> &[Method] {
        self.methods.methods()
    }

    pub fn handler(&self) -> &dyn RequestHandler {
        self.handler.as_ref()
    }

    pub fn assertion(&self, param: &str) -> Option<&str> {
        self.assertions.get(param).map(String::as_str)
    }

    pub fn attribute<T: Any + Send + Sync>(&self, key: &str) -> Option<&T> {
        self.attributes.get(key).and_then(|value| value.downcast_ref::<T>())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_passthrough(&self) -> bool {
        self.passthrough
    }

    /// Returns true if every filter of the route accepts the request.
    #[inline]
    pub fn matches(&self, req: &RequestHeader) -> bool {
        self.filter.matches(req)
    }

    /// Binds the values captured from `path` into `params`, zipping capture group `i`
    /// with the `i`-th declared param. Optional params that did not participate are unbound.
    pub(crate) fn bind_params(&self, path: &str, params: &mut PathParams) {
        let Some(captures) = self.pattern.captures(path) else {
            return;
        };
        for (name, value) in self.params.iter().zip(captures.iter().skip(1)) {
            match value {
                Some(value) => params.insert(name, value.as_str()),
                None => params.remove(name),
            }
        }
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("pattern", &self.pattern.as_str())
            .field("methods", &self.methods.methods())
            .field("params", &self.params)
            .field("passthrough", &self.passthrough)
            .finish_non_exhaustive()
    }
}
