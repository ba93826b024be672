//! An in-process HTTP request router and middleware dispatcher.
//!
//! Routes are declared with path patterns such as `/catalog/:category/:productId?`,
//! optional method restrictions and param assertions. On boot they are frozen into an
//! immutable, flat [`RouteTable`](router::RouteTable). Every request is matched against
//! the whole table, and the handlers of all matching routes form a chain: each handler
//! decides whether to hand the request on with [`RequestContext::next`].
//!
//! # Features
//!
//! - Regex-backed path patterns with named, optional and raw-group params
//! - Passthrough routes for middleware, nested route collections mounted under prefixes
//! - Error statuses short-circuit the chain and are answered by per-status handlers
//! - Typed handler arguments resolved from the request and from injected values
//! - Handler failures and panics are contained to their own request
//!
//! # Example
//!
//! ```
//! use http::{Request, StatusCode};
//! use micro_router::{handler_fn, HandlerError, Micro, PathParams, RequestContext};
//! use micro_router::router::RouteCollection;
//!
//! fn log(ctx: &mut RequestContext) -> Result<(), HandlerError> {
//!     ctx.insert_header(http::header::SERVER, http::HeaderValue::from_static("micro"));
//!     ctx.next()
//! }
//!
//! fn product(_ctx: &mut RequestContext, params: PathParams) -> String {
//!     format!("{} #{}", params.get("category").unwrap_or_default(), params.get("productId").unwrap_or_default())
//! }
//!
//! let mut catalog = RouteCollection::new();
//! catalog.get("/:category/:productId", handler_fn(product)).assert("productId", "\\d+").unwrap();
//!
//! let mut app = Micro::new();
//! app.middleware("/", handler_fn(log)).unwrap();
//! app.mount("/catalog", catalog).unwrap();
//!
//! let response = app.handle_request(Request::get("/catalog/books/42").body(()).unwrap()).unwrap();
//! assert_eq!(response.status(), StatusCode::OK);
//! assert_eq!(response.body().as_ref(), b"books #42");
//!
//! let response = app.handle_request(Request::get("/catalog/books/abc").body(()).unwrap()).unwrap();
//! assert_eq!(response.status(), StatusCode::NOT_FOUND);
//! ```

mod app;
mod context;
mod fn_trait;
mod handler;
mod inject;
mod request;
mod response;

pub mod error;
pub mod event;
pub mod extract;
pub mod responder;
pub mod router;
pub mod status;

pub use app::Micro;
pub use context::RequestContext;
pub use error::{ConfigError, ExtractError, HandlerError};
pub use event::EventEmitter;
pub use fn_trait::FnTrait;
pub use handler::{handler_fn, FnHandler, RequestHandler};
pub use inject::{Injector, Scope};
pub use request::{PathParams, RequestHeader};
pub use response::{BufferedResponse, ResponseSink, ResponseWriter};
