use crate::RequestContext;

/// Represents a handler function: it always receives the request context, followed by
/// the values extracted for its remaining parameters.
pub trait FnTrait<Args> {
    type Output;
    fn call(&self, ctx: &mut RequestContext<'_, '_>, args: Args) -> Self::Output;
}

/// impl `Fn` for `FnTrait`, from 0 extra parameters to 8 extra parameters
///
/// for example, it will impl Fn(&mut RequestContext, A, B) like this:
///```ignore
/// impl<Func, Out, A, B> FnTrait<(A, B)> for Func
///    where
///        Func: Fn(&mut RequestContext<'_, '_>, A, B) -> Out,
/// {
///    type Output = Out;
///
///    #[inline]
///    #[allow(non_snake_case)]
///    fn call(&self, ctx: &mut RequestContext<'_, '_>, (A, B): (A, B)) -> Self::Output {
///        (self)(ctx, A, B)
///    }
/// }
///```
macro_rules! impl_fn_trait_for_fn ({ $($param:ident)* } => {
    impl<Func, Out, $($param,)*> FnTrait<($($param,)*)> for Func
    where
        Func: Fn(&mut RequestContext<'_, '_>, $($param),*) -> Out,
    {
        type Output = Out;

        #[inline]
        #[allow(non_snake_case, reason = "macro generated params reuse the type param names")]
        fn call(&self, ctx: &mut RequestContext<'_, '_>, ($($param,)*): ($($param,)*)) -> Self::Output {
            (self)(ctx, $($param,)*)
        }
    }
});

impl_fn_trait_for_fn! {}
impl_fn_trait_for_fn! { A }
impl_fn_trait_for_fn! { A B }
impl_fn_trait_for_fn! { A B C }
impl_fn_trait_for_fn! { A B C D }
impl_fn_trait_for_fn! { A B C D E }
impl_fn_trait_for_fn! { A B C D E F }
impl_fn_trait_for_fn! { A B C D E F G }
impl_fn_trait_for_fn! { A B C D E F G H }
