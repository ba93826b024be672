use crate::error::HandlerError;
use crate::extract::FromContext;
use crate::fn_trait::FnTrait;
use crate::responder::Responder;
use crate::RequestContext;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::warn;

/// Something a route can dispatch a request to.
///
/// A handler runs with exclusive access to the request's [`RequestContext`]. It writes the
/// response through the context, and calls [`RequestContext::next`] if the request should
/// continue to the next matched route.
pub trait RequestHandler: Send + Sync {
    fn invoke(&self, ctx: &mut RequestContext<'_, '_>) -> Result<(), HandlerError>;
}

impl<T: RequestHandler + ?Sized> RequestHandler for Arc<T> {
    fn invoke(&self, ctx: &mut RequestContext<'_, '_>) -> Result<(), HandlerError> {
        (**self).invoke(ctx)
    }
}

impl<T: RequestHandler + ?Sized> RequestHandler for Box<T> {
    fn invoke(&self, ctx: &mut RequestContext<'_, '_>) -> Result<(), HandlerError> {
        (**self).invoke(ctx)
    }
}

/// a `FnTrait` holder which represents any handler Fn
pub struct FnHandler<F, Args> {
    f: F,
    _phantom: PhantomData<fn(Args)>,
}

impl<F, Args> FnHandler<F, Args>
where
    F: FnTrait<Args>,
{
    fn new(f: F) -> Self {
        Self { f, _phantom: PhantomData }
    }
}

/// Wraps a function taking the request context plus up to 8 extracted arguments.
///
/// ```
/// use micro_router::{handler_fn, RequestContext, PathParams};
///
/// fn show(_ctx: &mut RequestContext, params: PathParams) -> String {
///     format!("item {}", params.get("id").unwrap_or("?"))
/// }
///
/// let handler = handler_fn(show);
/// # let _ = handler;
/// ```
pub fn handler_fn<F, Args>(f: F) -> FnHandler<F, Args>
where
    F: FnTrait<Args>,
{
    FnHandler::new(f)
}

impl<F, Args> RequestHandler for FnHandler<F, Args>
where
    F: FnTrait<Args> + Send + Sync,
    F::Output: Responder,
    Args: FromContext,
{
    fn invoke(&self, ctx: &mut RequestContext<'_, '_>) -> Result<(), HandlerError> {
        let args = match Args::from_context(ctx) {
            Ok(args) => args,
            Err(e) => {
                warn!(path = ctx.path(), cause = %e, "failed to extract handler arguments");
                ctx.set_status(e.status());
                return Ok(());
            }
        };
        let responder = self.f.call(ctx, args);
        responder.respond_to(ctx)
    }
}

impl<F, Args> std::fmt::Debug for FnHandler<F, Args> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnHandler").field("fn", &std::any::type_name::<F>()).finish()
    }
}
