use crate::error::ExtractError;
use crate::RequestContext;

/// Builds a handler argument from the request context.
pub trait FromContext: Sized {
    fn from_context(ctx: &RequestContext<'_, '_>) -> Result<Self, ExtractError>;
}

/// An optional argument never fails: a failed extraction becomes `None`.
impl<T> FromContext for Option<T>
where
    T: FromContext,
{
    fn from_context(ctx: &RequestContext<'_, '_>) -> Result<Self, ExtractError> {
        Ok(T::from_context(ctx).ok())
    }
}

/// Lets a handler inspect the extraction error itself instead of skipping the call.
impl<T> FromContext for Result<T, ExtractError>
where
    T: FromContext,
{
    fn from_context(ctx: &RequestContext<'_, '_>) -> Result<Self, ExtractError> {
        Ok(T::from_context(ctx))
    }
}

impl FromContext for () {
    fn from_context(_ctx: &RequestContext<'_, '_>) -> Result<Self, ExtractError> {
        Ok(())
    }
}
