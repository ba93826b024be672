//! Typed handler arguments.
//!
//! Every parameter of a [`handler_fn`](crate::handler_fn) after the request context is
//! resolved through [`FromContext`]. Extraction happens before the handler runs: if any
//! argument fails, the handler is skipped and the extraction error's status is set on
//! the response, which the dispatch chain then answers like any other error status.

mod extract_header;
mod extract_inject;
mod extract_tuple;
mod extract_url;
mod from_context;

pub use from_context::FromContext;

/// Represented as url query data
///
/// when request with url query, we can using this struct to inject data,
/// note: the struct must impl [`serde::Deserialize`]
///
/// # Example
/// ```
/// # use serde::Deserialize;
/// # use micro_router::extract::Query;
/// # use micro_router::RequestContext;
/// # #[allow(dead_code, reason = "doc example")]
/// #[derive(Deserialize, Debug)]
/// struct Params {
///     name: String,
///     zip: String,
/// }
///
/// pub fn handle(_ctx: &mut RequestContext, Query(params): Query<Params>) -> String {
///     format!("received params: {:?}", params)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Query<T>(pub T);

/// A value resolved from the request scope, or from the application scope behind it.
///
/// # Example
/// ```
/// # use micro_router::extract::Inject;
/// # use micro_router::RequestContext;
/// #[derive(Clone)]
/// struct Database {
///     url: String,
/// }
///
/// pub fn handle(_ctx: &mut RequestContext, Inject(db): Inject<Database>) -> String {
///     format!("connected to {}", db.url)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Inject<T>(pub T);
