//! Converts handler return values into writes on the response.
//!
//! This module provides the [`Responder`] trait which defines how different types
//! are written through the [`RequestContext`]. It includes implementations for common types
//! like Result, Option, String, etc.
//!
//! Responders write into the context rather than building a response value, since a
//! middleware handler may already have set headers or a status before the route
//! handler returns.

use crate::error::HandlerError;
use crate::RequestContext;
use http::StatusCode;
use serde::Serialize;

/// A trait for types that can be written as a response.
///
/// Types implementing this trait can be returned directly from a
/// [`handler_fn`](crate::handler_fn) and will be written to the response.
pub trait Responder {
    fn respond_to(self, ctx: &mut RequestContext<'_, '_>) -> Result<(), HandlerError>;
}

/// A handler returning nothing has already written what it needed through the context.
impl Responder for () {
    fn respond_to(self, _ctx: &mut RequestContext<'_, '_>) -> Result<(), HandlerError> {
        Ok(())
    }
}

/// The Ok value is written, the Err value fails the request with a server error.
impl<T, E> Responder for Result<T, E>
where
    T: Responder,
    E: Into<HandlerError>,
{
    fn respond_to(self, ctx: &mut RequestContext<'_, '_>) -> Result<(), HandlerError> {
        match self {
            Ok(t) => t.respond_to(ctx),
            Err(e) => Err(e.into()),
        }
    }
}

/// `None` answers with 404 Not Found.
impl<T: Responder> Responder for Option<T> {
    fn respond_to(self, ctx: &mut RequestContext<'_, '_>) -> Result<(), HandlerError> {
        match self {
            Some(t) => t.respond_to(ctx),
            None => {
                ctx.set_status(StatusCode::NOT_FOUND);
                Ok(())
            }
        }
    }
}

impl Responder for StatusCode {
    fn respond_to(self, ctx: &mut RequestContext<'_, '_>) -> Result<(), HandlerError> {
        ctx.set_status(self);
        Ok(())
    }
}

/// Sets the status before writing the content.
impl<T: Responder> Responder for (StatusCode, T) {
    fn respond_to(self, ctx: &mut RequestContext<'_, '_>) -> Result<(), HandlerError> {
        let (status, responder) = self;
        ctx.set_status(status);
        responder.respond_to(ctx)
    }
}

impl Responder for String {
    fn respond_to(self, ctx: &mut RequestContext<'_, '_>) -> Result<(), HandlerError> {
        ctx.write_text(&self)?;
        Ok(())
    }
}

impl Responder for &'static str {
    fn respond_to(self, ctx: &mut RequestContext<'_, '_>) -> Result<(), HandlerError> {
        ctx.write_text(self)?;
        Ok(())
    }
}

/// Serializes the value as JSON.
///
/// # Example
/// ```
/// # use micro_router::responder::Json;
/// # use micro_router::{PathParams, RequestContext};
/// # use serde::Serialize;
/// #[derive(Serialize)]
/// struct Product {
///     id: String,
/// }
///
/// fn show(_ctx: &mut RequestContext, params: PathParams) -> Json<Product> {
///     Json(Product { id: params.get("id").unwrap_or_default().to_owned() })
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Json<T>(pub T);

impl<T: Serialize> Responder for Json<T> {
    fn respond_to(self, ctx: &mut RequestContext<'_, '_>) -> Result<(), HandlerError> {
        ctx.write_json(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::Json;
    use crate::{handler_fn, Micro, RequestContext};
    use http::header::CONTENT_TYPE;
    use http::{Request, Response, StatusCode};
    use bytes::Bytes;
    use serde::Serialize;
    use std::io;

    fn dispatch(app: &Micro, path: &str) -> Response<Bytes> {
        app.handle_request(Request::get(path).body(()).unwrap()).unwrap()
    }

    #[derive(Serialize)]
    struct Product {
        id: u32,
        name: &'static str,
    }

    fn text(_ctx: &mut RequestContext) -> &'static str {
        "hello"
    }

    fn created(_ctx: &mut RequestContext) -> (StatusCode, String) {
        (StatusCode::CREATED, "made".to_owned())
    }

    fn json(_ctx: &mut RequestContext) -> Json<Product> {
        Json(Product { id: 1, name: "book" })
    }

    fn missing(_ctx: &mut RequestContext) -> Option<&'static str> {
        None
    }

    fn failing(_ctx: &mut RequestContext) -> Result<String, io::Error> {
        Err(io::Error::other("disk on fire"))
    }

    fn app() -> Micro {
        let mut app = Micro::new();
        app.get("/text", handler_fn(text)).unwrap();
        app.post("/created", handler_fn(created)).unwrap();
        app.get("/created", handler_fn(created)).unwrap();
        app.get("/json", handler_fn(json)).unwrap();
        app.get("/missing", handler_fn(missing)).unwrap();
        app.get("/failing", handler_fn(failing)).unwrap();
        app
    }

    #[test]
    fn text_sets_plain_content_type() {
        let response = dispatch(&app(), "/text");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "text/plain; charset=utf-8");
        assert_eq!(response.body().as_ref(), b"hello");
    }

    #[test]
    fn status_tuple() {
        let response = dispatch(&app(), "/created");
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.body().as_ref(), b"made");
    }

    #[test]
    fn json_body() {
        let response = dispatch(&app(), "/json");
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(response.body().as_ref(), br#"{"id":1,"name":"book"}"#);
    }

    #[test]
    fn none_is_not_found() {
        let response = dispatch(&app(), "/missing");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.body().as_ref(), b"404 page not found\n");
    }

    #[test]
    fn err_is_internal_error() {
        let response = dispatch(&app(), "/failing");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.body().as_ref(), b"Internal Server Error");
    }
}
