use crate::error::ExtractError;
use crate::extract::from_context::FromContext;
use crate::RequestContext;

macro_rules! impl_from_context_for_tuple {
    ($($param:ident)*) => {
        impl<$($param,)*> FromContext for ($($param,)*)
        where
            $($param: FromContext,)*
        {
            fn from_context(ctx: &RequestContext<'_, '_>) -> Result<Self, ExtractError> {
                Ok(($($param::from_context(ctx)?,)*))
            }
        }
    }
}

impl_from_context_for_tuple! { A }
impl_from_context_for_tuple! { A B }
impl_from_context_for_tuple! { A B C }
impl_from_context_for_tuple! { A B C D }
impl_from_context_for_tuple! { A B C D E }
impl_from_context_for_tuple! { A B C D E F }
impl_from_context_for_tuple! { A B C D E F G }
impl_from_context_for_tuple! { A B C D E F G H }
