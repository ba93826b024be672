//! URL extraction: the uri itself, the path params bound so far and the query string.
//!
//! # Example
//! ```no_run
//! # use serde::Deserialize;
//! # use micro_router::extract::Query;
//! # use micro_router::{PathParams, RequestContext};
//!
//! #[derive(Deserialize)]
//! struct Paging {
//!     page: u32,
//! }
//!
//! fn handler(_ctx: &mut RequestContext, params: PathParams, Query(paging): Query<Paging>) {
//!     println!("category {:?}, page {}", params.get("category"), paging.page);
//! }
//! ```

use crate::error::ExtractError;
use crate::extract::from_context::FromContext;
use crate::extract::Query;
use crate::request::PathParams;
use crate::RequestContext;
use http::Uri;
use serde::de::DeserializeOwned;

impl FromContext for Uri {
    fn from_context(ctx: &RequestContext<'_, '_>) -> Result<Self, ExtractError> {
        Ok(ctx.uri().clone())
    }
}

impl FromContext for PathParams {
    fn from_context(ctx: &RequestContext<'_, '_>) -> Result<Self, ExtractError> {
        Ok(ctx.params().clone())
    }
}

/// Deserializes the query string with `serde_urlencoded`. A request without a query
/// string deserializes from an empty one, so structs whose fields are all optional
/// still extract.
impl<T> FromContext for Query<T>
where
    T: DeserializeOwned,
{
    fn from_context(ctx: &RequestContext<'_, '_>) -> Result<Self, ExtractError> {
        let query = ctx.uri().query().unwrap_or_default();
        serde_urlencoded::from_str::<T>(query).map(Query).map_err(ExtractError::invalid_query)
    }
}
