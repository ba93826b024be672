//! Route declaration, compilation and matching.
//!
//! Routes are declared on a [`RouteCollection`] tree, which [`RouteCollection::freeze`]
//! compiles into a flat [`RouteTable`]. The table is immutable and `Send + Sync`: matching
//! a request against it never mutates anything, so one table serves every request thread.

mod collection;
pub mod filter;
pub mod pattern;
mod route;

pub use collection::RouteCollection;
pub use route::{Route, RouteBuilder};

use crate::request::RequestHeader;
use std::fmt;

/// A frozen, flattened, ordered list of routes.
pub struct RouteTable {
    routes: Vec<Route>,
}

/// The routes accepting a request, in table order.
#[derive(Debug, Clone)]
pub struct RouteResult<'table> {
    routes: Vec<&'table Route>,
}

impl RouteTable {
    pub(crate) fn new(routes: Vec<Route>) -> Self {
        Self { routes }
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Looks a route up by name.
    pub fn route(&self, name: &str) -> Option<&Route> {
        self.routes.iter().find(|route| route.name() == name)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Returns every route whose filters all accept `req`, preserving table order.
    ///
    /// An empty result is a normal outcome: the caller answers it with a not-found response.
    pub fn match_all<'table>(&'table self, req: &RequestHeader) -> RouteResult<'table> {
        RouteResult { routes: self.routes.iter().filter(|route| route.matches(req)).collect() }
    }
}

impl fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.routes.iter()).finish()
    }
}

impl<'table> RouteResult<'table> {
    /// Returns true if no routes were matched
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Gets the matched routes
    pub fn routes(&self) -> &[&'table Route] {
        &self.routes
    }
}

impl<'table> IntoIterator for RouteResult<'table> {
    type Item = &'table Route;
    type IntoIter = std::vec::IntoIter<&'table Route>;

    fn into_iter(self) -> Self::IntoIter {
        self.routes.into_iter()
    }
}
