use crate::error::ExtractError;
use crate::extract::from_context::FromContext;
use crate::extract::Inject;
use crate::RequestContext;

impl<T> FromContext for Inject<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn from_context(ctx: &RequestContext<'_, '_>) -> Result<Self, ExtractError> {
        ctx.resolve::<T>().cloned().map(Inject).ok_or_else(ExtractError::missing_dependency::<T>)
    }
}
