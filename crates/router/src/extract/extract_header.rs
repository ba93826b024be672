use crate::error::ExtractError;
use crate::extract::from_context::FromContext;
use crate::RequestContext;
use http::{HeaderMap, Method};

impl FromContext for Method {
    fn from_context(ctx: &RequestContext<'_, '_>) -> Result<Self, ExtractError> {
        Ok(ctx.method().clone())
    }
}

impl FromContext for HeaderMap {
    fn from_context(ctx: &RequestContext<'_, '_>) -> Result<Self, ExtractError> {
        Ok(ctx.headers().clone())
    }
}
