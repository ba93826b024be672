//! Request filters that decide whether a route accepts a request.
//!
//! Every frozen route carries an [`AllFilter`] made of a [`PathFilter`] for its compiled
//! pattern, a [`MethodFilter`] for its method set, and whatever extra filters the route was
//! configured with. A route matches a request iff all of them do, so new kinds of matchers
//! (host, header, content type) slot in without touching the matching loop.
//!
//! ## Thread Safety
//!
//! All filters must implement the `Filter` trait, which requires `Send + Sync`.
//! The frozen route table is shared by every request-handling thread, so its filters are too.
//!
//! # Examples
//!
//! ```
//! use micro_router::router::filter::{all_filter, header, MethodFilter};
//! use http::{HeaderName, HeaderValue, Method};
//!
//! let mut combined = all_filter();
//! combined
//!     .and(MethodFilter::new([Method::GET]))
//!     .and(header(HeaderName::from_static("x-api-key"), HeaderValue::from_static("secret")));
//! ```

use crate::request::RequestHeader;
use http::{HeaderName, HeaderValue, Method};
use regex::Regex;
use std::fmt;
use std::sync::Arc;

/// Core trait for request filtering.
///
/// Implementors of this trait can be used to filter HTTP requests
/// based on custom logic. Filters can be composed using [`AllFilter`]
/// and [`AnyFilter`].
pub trait Filter: Send + Sync {
    /// Check if the request matches this filter's criteria.
    fn matches(&self, req: &RequestHeader) -> bool;
}

impl<F: Filter + ?Sized> Filter for Arc<F> {
    #[inline]
    fn matches(&self, req: &RequestHeader) -> bool {
        (**self).matches(req)
    }
}

/// A filter that wraps a closure.
struct FnFilter<F: Fn(&RequestHeader) -> bool>(F);

impl<F: Fn(&RequestHeader) -> bool + Send + Sync> Filter for FnFilter<F> {
    fn matches(&self, req: &RequestHeader) -> bool {
        (self.0)(req)
    }
}

/// Creates a new filter from a closure.
///
/// # Example
/// ```
/// use micro_router::router::filter::fn_filter;
///
/// let no_query = fn_filter(|req| req.uri().query().is_none());
/// ```
pub fn fn_filter<F>(f: F) -> impl Filter
where
    F: Fn(&RequestHeader) -> bool + Send + Sync,
{
    FnFilter(f)
}

/// Creates a new OR-composed filter chain.
pub fn any_filter() -> AnyFilter {
    AnyFilter::new()
}

/// Compose filters with OR logic.
///
/// If any inner filter succeeds, the whole filter succeeds.
/// An empty filter chain returns true by default.
pub struct AnyFilter {
    filters: Vec<Arc<dyn Filter>>,
}

impl AnyFilter {
    fn new() -> Self {
        Self { filters: vec![] }
    }

    /// Add a new filter to the OR chain.
    pub fn or<F: Filter + 'static>(&mut self, filter: F) -> &mut Self {
        self.filters.push(Arc::new(filter));
        self
    }
}

impl fmt::Debug for AnyFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyFilter").field("filters", &self.filters.len()).finish()
    }
}

impl Filter for AnyFilter {
    fn matches(&self, req: &RequestHeader) -> bool {
        self.filters.is_empty() || self.filters.iter().any(|filter| filter.matches(req))
    }
}

/// Creates a new AND-composed filter chain.
pub fn all_filter() -> AllFilter {
    AllFilter::new()
}

/// Compose filters with AND logic.
///
/// All inner filters must succeed for the whole filter to succeed.
/// An empty filter chain returns true by default. Filters are checked in the order
/// they were added and checking stops at the first one that fails.
pub struct AllFilter {
    filters: Vec<Arc<dyn Filter>>,
}

impl AllFilter {
    fn new() -> Self {
        Self { filters: vec![] }
    }

    /// Add a new filter to the AND chain.
    pub fn and<F: Filter + 'static>(&mut self, filter: F) -> &mut Self {
        self.filters.push(Arc::new(filter));
        self
    }

    pub(crate) fn and_shared(&mut self, filter: Arc<dyn Filter>) -> &mut Self {
        self.filters.push(filter);
        self
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl fmt::Debug for AllFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AllFilter").field("filters", &self.filters.len()).finish()
    }
}

impl Filter for AllFilter {
    fn matches(&self, req: &RequestHeader) -> bool {
        self.filters.iter().all(|filter| filter.matches(req))
    }
}

/// A filter that matches a set of HTTP methods, ignoring ASCII case.
///
/// An empty set, or a set containing the `*` verb, accepts every method.
#[derive(Debug, Clone, Default)]
pub struct MethodFilter {
    methods: Vec<Method>,
}

impl MethodFilter {
    pub fn new<I: IntoIterator<Item = Method>>(methods: I) -> Self {
        Self { methods: methods.into_iter().collect() }
    }

    /// Creates a filter that accepts every method.
    pub fn any() -> Self {
        Self::default()
    }

    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    pub fn accepts_all(&self) -> bool {
        self.methods.is_empty() || self.methods.iter().any(|method| method.as_str() == "*")
    }

    pub fn accepts(&self, method: &Method) -> bool {
        self.accepts_all() || self.methods.iter().any(|m| m.as_str().eq_ignore_ascii_case(method.as_str()))
    }
}

impl Filter for MethodFilter {
    fn matches(&self, req: &RequestHeader) -> bool {
        self.accepts(req.method())
    }
}

/// A filter that matches the request path against a compiled route pattern.
#[derive(Debug, Clone)]
pub struct PathFilter(Regex);

impl PathFilter {
    pub fn new(pattern: Regex) -> Self {
        Self(pattern)
    }

    pub fn pattern(&self) -> &Regex {
        &self.0
    }
}

impl Filter for PathFilter {
    fn matches(&self, req: &RequestHeader) -> bool {
        self.0.is_match(req.path())
    }
}

/// Creates a filter that matches a specific header name and value.
#[inline]
pub fn header(header_name: HeaderName, header_value: HeaderValue) -> HeaderFilter {
    HeaderFilter(header_name, header_value)
}

/// A filter that matches HTTP headers.
#[derive(Debug, Clone)]
pub struct HeaderFilter(HeaderName, HeaderValue);

impl Filter for HeaderFilter {
    fn matches(&self, req: &RequestHeader) -> bool {
        req.headers().get(&self.0).is_some_and(|value| self.1.eq(value))
    }
}
