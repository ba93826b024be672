/// A named route table shape to benchmark, with the request paths to dispatch against it.
#[derive(Debug, Copy, Clone)]
pub struct TestCase {
    name: &'static str,
    group: TestGroup,
    routes: RouteSet,
}

impl TestCase {
    pub fn new(name: &'static str, group: TestGroup, routes: RouteSet) -> Self {
        Self { name, group, routes }
    }

    pub fn small(name: &'static str, routes: RouteSet) -> Self {
        Self::new(name, TestGroup::Small, routes)
    }

    pub fn normal(name: &'static str, routes: RouteSet) -> Self {
        Self::new(name, TestGroup::Normal, routes)
    }

    pub fn large(name: &'static str, routes: RouteSet) -> Self {
        Self::new(name, TestGroup::Large, routes)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn group(&self) -> TestGroup {
        self.group
    }

    pub fn routes(&self) -> &RouteSet {
        &self.routes
    }

    /// How many times the route set is repeated under distinct prefixes.
    pub fn copies(&self) -> usize {
        match self.group {
            TestGroup::Small => 1,
            TestGroup::Normal => 10,
            TestGroup::Large => 100,
        }
    }
}

/// Route paths to declare and request paths that hit them.
#[derive(Debug, Copy, Clone)]
pub struct RouteSet {
    paths: &'static [&'static str],
    requests: &'static [&'static str],
}

impl RouteSet {
    pub const fn new(paths: &'static [&'static str], requests: &'static [&'static str]) -> Self {
        Self { paths, requests }
    }

    pub fn paths(&self) -> &'static [&'static str] {
        self.paths
    }

    pub fn requests(&self) -> &'static [&'static str] {
        self.requests
    }
}

#[derive(Clone, Copy, Debug)]
pub enum TestGroup {
    Small,
    Normal,
    Large,
}

/// A typical catalog API: static pages, params, optional params and assertions.
pub static CATALOG: RouteSet = RouteSet::new(
    &[
        "/",
        "/about",
        "/catalog",
        "/catalog/:category",
        "/catalog/:category/:productId",
        "/catalog/:category/:productId/reviews/:page?",
        "/users/:id/orders",
        "/users/:id/orders/:orderId",
        "/files/([\\w./]+)",
    ],
    &["/", "/catalog/books/42", "/catalog/books/42/reviews", "/users/7/orders/1001", "/missing/path"],
);
