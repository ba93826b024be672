//! The application facade: configuration, boot and the transport entry point.

use crate::context::RequestContext;
use crate::error::ConfigError;
use crate::event::{self, EventEmitter};
use crate::handler::RequestHandler;
use crate::inject::Injector;
use crate::request::RequestHeader;
use crate::response::{BufferedResponse, ResponseSink};
use crate::router::{RouteBuilder, RouteCollection, RouteTable};
use crate::status::StatusHandlers;
use bytes::Bytes;
use http::{Method, Request, Response};
use once_cell::sync::OnceCell;
use serde_json::json;
use std::any::Any;
use std::backtrace::Backtrace;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error, info};

/// A micro application.
///
/// Configuration happens through `&mut self` and is rejected with
/// [`ConfigError::AlreadyBooted`] once the application has booted. Booting freezes the
/// declared routes into a [`RouteTable`]; it happens either explicitly with
/// [`boot`](Self::boot) or on the first request. After that the application is only used
/// through `&self` and can be shared by any number of request threads.
///
/// ```
/// use micro_router::{handler_fn, Micro, RequestContext};
/// use http::{Request, StatusCode};
///
/// fn hello(_ctx: &mut RequestContext) -> &'static str {
///     "hello"
/// }
///
/// let mut app = Micro::new();
/// app.get("/hello", handler_fn(hello)).unwrap();
///
/// let response = app.handle_request(Request::get("/hello").body(()).unwrap()).unwrap();
/// assert_eq!(response.status(), StatusCode::OK);
/// assert_eq!(response.body().as_ref(), b"hello");
/// ```
#[derive(Debug)]
pub struct Micro {
    routes: RouteCollection,
    status_handlers: StatusHandlers,
    injector: Injector,
    events: Arc<EventEmitter>,
    table: OnceCell<RouteTable>,
}

macro_rules! app_route {
    ($(#[$doc:meta])* $method:ident) => {
        $(#[$doc])*
        pub fn $method<H: RequestHandler + 'static>(
            &mut self,
            path: impl Into<String>,
            handler: H,
        ) -> Result<&mut RouteBuilder, ConfigError> {
            Ok(self.routes_mut()?.$method(path, handler))
        }
    };
}

impl Micro {
    pub fn new() -> Self {
        let events = Arc::new(EventEmitter::new());
        let mut injector = Injector::new();
        injector.register(Arc::clone(&events));
        Self {
            routes: RouteCollection::new(),
            status_handlers: StatusHandlers::new(),
            injector,
            events,
            table: OnceCell::new(),
        }
    }

    /// The root route collection, for configuration that goes beyond the shortcuts below.
    pub fn routes_mut(&mut self) -> Result<&mut RouteCollection, ConfigError> {
        self.ensure_not_booted()?;
        Ok(&mut self.routes)
    }

    pub fn routes(&self) -> &RouteCollection {
        &self.routes
    }

    app_route!(
        /// Declares a route for all methods.
        all
    );
    app_route!(
        /// Declares a `GET` and `HEAD` route.
        get
    );
    app_route!(
        /// Declares a `POST` route.
        post
    );
    app_route!(
        /// Declares a `PUT` route.
        put
    );
    app_route!(
        /// Declares a `DELETE` route.
        delete
    );
    app_route!(
        /// Declares a `PATCH` route.
        patch
    );
    app_route!(
        /// Declares an `OPTIONS` route.
        options
    );
    app_route!(
        /// Declares a passthrough route for middleware, see [`RouteCollection::middleware`].
        middleware
    );

    /// Declares a route restricted to the given methods.
    pub fn route<H, I>(&mut self, methods: I, path: impl Into<String>, handler: H) -> Result<&mut RouteBuilder, ConfigError>
    where
        H: RequestHandler + 'static,
        I: IntoIterator<Item = Method>,
    {
        Ok(self.routes_mut()?.route(methods, path, handler))
    }

    /// Mounts a collection of routes under `prefix`.
    pub fn mount(&mut self, prefix: &str, collection: RouteCollection) -> Result<&mut Self, ConfigError> {
        self.routes_mut()?.mount(prefix, collection);
        Ok(self)
    }

    /// Registers an application-wide value handlers can resolve by type.
    ///
    /// Returns the previously registered value of the same type, if any.
    pub fn register<T: Clone + Send + Sync + 'static>(&mut self, value: T) -> Result<Option<T>, ConfigError> {
        self.ensure_not_booted()?;
        Ok(self.injector.register(value))
    }

    /// Sets the handler answering responses with the error status `code`.
    ///
    /// Fails if the application already booted, or if `code` is below 400.
    pub fn error<H: RequestHandler + 'static>(&mut self, code: u16, handler: H) -> Result<&mut Self, ConfigError> {
        self.ensure_not_booted()?;
        self.status_handlers.insert(code, handler)?;
        Ok(self)
    }

    /// Freezes the routes. Booting twice returns the table built the first time.
    pub fn boot(&self) -> Result<&RouteTable, ConfigError> {
        self.table.get_or_try_init(|| {
            let table = self.routes.freeze()?;
            info!(routes = table.len(), "micro application booted");
            Ok(table)
        })
    }

    pub fn is_booted(&self) -> bool {
        self.table.get().is_some()
    }

    /// The frozen routes, `None` until the application booted.
    pub fn table(&self) -> Option<&RouteTable> {
        self.table.get()
    }

    pub fn events(&self) -> &EventEmitter {
        &self.events
    }

    pub fn injector(&self) -> &Injector {
        &self.injector
    }

    /// Runs one request through the matched routes, writing the response into `sink`.
    ///
    /// The only error is a configuration error surfacing from a lazy boot. Handler
    /// failures and panics are answered with a 500 response and never escape.
    pub fn handle(&self, header: &RequestHeader, sink: &mut dyn ResponseSink) -> Result<(), ConfigError> {
        let table = self.boot()?;
        let matches = table.match_all(header);
        debug!(method = %header.method(), path = header.path(), matched = matches.len(), "dispatch request");
        self.events.emit(event::REQUEST, &[json!(header.method().as_str()), json!(header.path()), json!(matches.len())]);

        let mut ctx =
            RequestContext::new(header, sink, matches, self.injector.scope(), &self.status_handlers, &self.events);
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| ctx.next().and_then(|()| ctx.finish())));
        let cause = match outcome {
            Ok(Ok(())) => return Ok(()),
            Ok(Err(e)) => error_chain(&*e),
            Err(panic) => panic_message(panic.as_ref()),
        };

        let backtrace = Backtrace::capture();
        error!(
            method = %header.method(),
            path = header.path(),
            cause = %cause,
            backtrace = %backtrace,
            "request handler failed"
        );
        ctx.handle_internal_error(&cause);
        Ok(())
    }

    /// Runs a request through the application and buffers the whole response.
    pub fn handle_request<B>(&self, request: Request<B>) -> Result<Response<Bytes>, ConfigError> {
        let header = RequestHeader::from(request);
        let mut response = BufferedResponse::new();
        self.handle(&header, &mut response)?;
        Ok(response.into_response())
    }

    fn ensure_not_booted(&self) -> Result<(), ConfigError> {
        if self.is_booted() {
            return Err(ConfigError::AlreadyBooted);
        }
        Ok(())
    }
}

impl Default for Micro {
    fn default() -> Self {
        Self::new()
    }
}

/// Joins an error with its sources, outermost first.
fn error_chain(e: &(dyn std::error::Error + 'static)) -> String {
    let mut chain = e.to_string();
    let mut source = e.source();
    while let Some(cause) = source {
        chain.push_str(": ");
        chain.push_str(&cause.to_string());
        source = cause.source();
    }
    chain
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "handler panicked".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::{Micro, error_chain};
    use crate::error::ConfigError;
    use crate::event::{self, EventEmitter};
    use crate::extract::Inject;
    use crate::response::BufferedResponse;
    use crate::router::{RouteCollection, RouteTable};
    use crate::{handler_fn, HandlerError, PathParams, RequestContext, RequestHandler, RequestHeader};
    use bytes::Bytes;
    use http::{Method, Request, Response, StatusCode};
    use std::sync::{Arc, Barrier, Mutex};

    /// Records which handlers ran, in order.
    #[derive(Clone, Default)]
    struct Trail(Arc<Mutex<Vec<&'static str>>>);

    impl Trail {
        fn push(&self, step: &'static str) {
            self.0.lock().unwrap().push(step);
        }

        fn steps(&self) -> Vec<&'static str> {
            self.0.lock().unwrap().clone()
        }
    }

    /// A handler recording its name, then optionally advancing and setting a status.
    struct Step {
        name: &'static str,
        advance: bool,
        status: Option<StatusCode>,
        body: Option<&'static str>,
    }

    impl Step {
        fn new(name: &'static str) -> Self {
            Self { name, advance: false, status: None, body: None }
        }

        fn advancing(name: &'static str) -> Self {
            Self { advance: true, ..Self::new(name) }
        }

        fn status(mut self, status: StatusCode) -> Self {
            self.status = Some(status);
            self
        }

        fn body(mut self, body: &'static str) -> Self {
            self.body = Some(body);
            self
        }
    }

    impl RequestHandler for Step {
        fn invoke(&self, ctx: &mut RequestContext<'_, '_>) -> Result<(), HandlerError> {
            if let Some(trail) = ctx.resolve::<Trail>() {
                trail.push(self.name);
            }
            if let Some(status) = self.status {
                ctx.set_status(status);
            }
            if let Some(body) = self.body {
                ctx.write_str(body)?;
            }
            if self.advance {
                ctx.next()?;
            }
            Ok(())
        }
    }

    fn app() -> (Micro, Trail) {
        let trail = Trail::default();
        let mut app = Micro::new();
        app.register(trail.clone()).unwrap();
        (app, trail)
    }

    fn get(app: &Micro, path: &str) -> Response<Bytes> {
        app.handle_request(Request::get(path).body(()).unwrap()).unwrap()
    }

    #[test]
    fn handlers_run_in_table_order() {
        let (mut app, trail) = app();
        app.all("/x", Step::advancing("first")).unwrap();
        app.get("/x", Step::advancing("second")).unwrap();
        app.all("/x", Step::new("third").body("done")).unwrap();

        let response = get(&app, "/x");
        assert_eq!(trail.steps(), ["first", "second", "third"]);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body().as_ref(), b"done");
    }

    #[test]
    fn chain_stops_when_a_handler_does_not_advance() {
        let (mut app, trail) = app();
        app.all("/x", Step::new("first").body("first")).unwrap();
        app.all("/x", Step::new("second")).unwrap();
        app.all("/x", Step::new("third")).unwrap();

        let response = get(&app, "/x");
        assert_eq!(trail.steps(), ["first"]);
        assert_eq!(response.body().as_ref(), b"first");
    }

    #[test]
    fn error_status_runs_registered_handler_and_stops() {
        let (mut app, trail) = app();
        app.error(404, Step::new("custom 404").body("nothing here")).unwrap();
        app.all("/x", Step::new("first").status(StatusCode::NOT_FOUND)).unwrap();
        app.all("/x", Step::new("second")).unwrap();

        let response = get(&app, "/x");
        assert_eq!(trail.steps(), ["first", "custom 404"]);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.body().as_ref(), b"nothing here");
    }

    #[test]
    fn error_status_mid_chain_short_circuits() {
        let (mut app, trail) = app();
        app.middleware("/", Step::advancing("log")).unwrap();
        app.middleware("/admin", Step::advancing("guard").status(StatusCode::FORBIDDEN)).unwrap();
        app.get("/admin/panel", Step::new("panel")).unwrap();

        let response = get(&app, "/admin/panel");
        assert_eq!(trail.steps(), ["log", "guard"]);
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(response.body().as_ref(), b"Forbidden\n");
    }

    #[test]
    fn error_status_after_body_skips_handler() {
        let (mut app, trail) = app();
        app.error(500, Step::new("custom 500").body("custom")).unwrap();
        app.all("/x", Step::advancing("partial").body("partial ").status(StatusCode::INTERNAL_SERVER_ERROR)).unwrap();

        let response = get(&app, "/x");
        assert_eq!(trail.steps(), ["partial"]);
        assert_eq!(response.body().as_ref(), b"partial Internal Server Error\n");
    }

    #[test]
    fn not_found_runs_once_without_route_handlers() {
        let (mut app, trail) = app();
        app.error(404, Step::new("custom 404")).unwrap();
        app.get("/x", Step::new("x")).unwrap();

        let response = get(&app, "/y");
        assert_eq!(trail.steps(), ["custom 404"]);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn default_not_found() {
        let (app, _trail) = app();
        let response = get(&app, "/anything");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()[http::header::CONTENT_TYPE], "text/plain; charset=utf-8");
        assert_eq!(response.body().as_ref(), b"404 page not found\n");
    }

    #[test]
    fn advancing_past_the_last_route_is_not_found() {
        let (mut app, trail) = app();
        app.error(404, Step::new("custom 404")).unwrap();
        app.middleware("/", Step::advancing("log")).unwrap();

        get(&app, "/x");
        assert_eq!(trail.steps(), ["log", "custom 404"]);
    }

    #[test]
    fn params_are_bound_per_route() {
        fn show(ctx: &mut RequestContext) -> String {
            let params = ctx.params().iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>();
            params.join("&")
        }

        let (mut app, _trail) = app();
        app.middleware("/catalog/:category", Step::advancing("section")).unwrap();
        app.get("/catalog/:category/:productId", handler_fn(show)).unwrap();

        let response = get(&app, "/catalog/books/42");
        assert_eq!(response.body().as_ref(), b"category=books&productId=42");
    }

    #[test]
    fn params_bind_decoded_path() {
        fn search(_ctx: &mut RequestContext, params: PathParams) -> String {
            params.get("term").unwrap_or_default().to_owned()
        }

        let (mut app, _trail) = app();
        app.get("/search/:term", handler_fn(search)).unwrap().assert("term", ".+").unwrap();

        let response = get(&app, "/search/hello%20world");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body().as_ref(), b"hello world");
    }

    #[test]
    fn not_found_after_body_keeps_status() {
        let (mut app, _trail) = app();
        app.middleware("/", Step::advancing("greet").body("hello ")).unwrap();

        let response = get(&app, "/x");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body().as_ref(), b"hello 404 page not found\n");
    }

    #[test]
    fn handler_error_becomes_500() {
        fn broken(_ctx: &mut RequestContext) -> Result<(), HandlerError> {
            Err("database unavailable".into())
        }

        let (mut app, _trail) = app();
        app.get("/broken", handler_fn(broken)).unwrap();

        let response = get(&app, "/broken");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.body().as_ref(), b"Internal Server Error");
    }

    #[test]
    fn panic_becomes_500_and_app_keeps_serving() {
        fn explode(_ctx: &mut RequestContext) {
            panic!("boom");
        }
        fn fine(_ctx: &mut RequestContext) -> &'static str {
            "fine"
        }

        let (mut app, _trail) = app();
        app.error(500, Step::new("custom 500").body("sorry")).unwrap();
        app.get("/explode", handler_fn(explode)).unwrap();
        app.get("/fine", handler_fn(fine)).unwrap();

        let causes = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&causes);
        app.events().add_listener(event::INTERNAL_ERROR, move |_, args| {
            recorded.lock().unwrap().push(args[1].as_str().unwrap_or_default().to_owned());
            true
        });

        let response = get(&app, "/explode");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.body().as_ref(), b"sorry");
        assert_eq!(*causes.lock().unwrap(), ["boom"]);

        assert_eq!(get(&app, "/fine").body().as_ref(), b"fine");
    }

    #[test]
    fn error_code_below_400_is_rejected() {
        let (mut app, _trail) = app();
        let result = app.error(399, Step::new("nope"));
        assert!(matches!(result, Err(ConfigError::InvalidErrorCode(399))));
    }

    #[test]
    fn configuration_after_boot_is_rejected() {
        let (mut app, _trail) = app();
        app.get("/x", Step::new("x")).unwrap();
        assert!(!app.is_booted());
        assert_eq!(app.boot().unwrap().len(), 1);
        assert!(app.is_booted());

        assert!(matches!(app.error(500, Step::new("late")), Err(ConfigError::AlreadyBooted)));
        assert!(matches!(app.get("/late", Step::new("late")), Err(ConfigError::AlreadyBooted)));
        assert!(matches!(app.mount("/late", RouteCollection::new()), Err(ConfigError::AlreadyBooted)));
        assert!(matches!(app.register(1u8), Err(ConfigError::AlreadyBooted)));
        assert_eq!(app.table().map(|table| table.len()), Some(1));
    }

    #[test]
    fn first_request_boots_lazily() {
        let (mut app, _trail) = app();
        app.get("/x", Step::new("x")).unwrap();
        get(&app, "/x");
        assert!(app.is_booted());
    }

    #[test]
    fn invalid_route_fails_boot() {
        let (mut app, _trail) = app();
        app.get("/broken/(\\d+", Step::new("x")).unwrap();

        let header = RequestHeader::new(Method::GET, "/broken/1".parse().unwrap());
        let mut sink = BufferedResponse::new();
        assert!(matches!(app.handle(&header, &mut sink), Err(ConfigError::UnbalancedGroup { .. })));
        assert!(!app.is_booted());
    }

    #[test]
    fn mounted_collections_dispatch() {
        let (mut app, trail) = app();
        let mut api = RouteCollection::new();
        api.get("/users", Step::new("users"));
        let mut v1 = RouteCollection::new();
        v1.mount("/api", api);
        app.mount("/v1", v1).unwrap();

        assert_eq!(get(&app, "/v1/api/users").status(), StatusCode::OK);
        assert_eq!(trail.steps(), ["users"]);
    }

    #[test]
    fn emitter_is_injectable_and_sees_requests() {
        fn announce(ctx: &mut RequestContext, Inject(events): Inject<Arc<EventEmitter>>) {
            events.emit("custom", &[serde_json::json!(ctx.path())]);
        }

        let (mut app, _trail) = app();
        app.get("/announce", handler_fn(announce)).unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        for name in [event::REQUEST, "custom"] {
            let seen = Arc::clone(&seen);
            app.events().add_listener(name, move |event, _| {
                seen.lock().unwrap().push(event.to_owned());
                true
            });
        }

        get(&app, "/announce");
        assert_eq!(*seen.lock().unwrap(), ["micro.request", "custom"]);
    }

    #[test]
    fn app_is_shared_across_threads() {
        fn hello(_ctx: &mut RequestContext) -> &'static str {
            "hello"
        }

        let (mut app, _trail) = app();
        app.get("/hello", handler_fn(hello)).unwrap();
        app.boot().unwrap();

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| assert_eq!(get(&app, "/hello").body().as_ref(), b"hello"));
            }
        });
    }

    #[test]
    fn concurrent_first_requests_boot_once() {
        fn hello(_ctx: &mut RequestContext) -> &'static str {
            "hello"
        }

        const THREADS: usize = 8;
        let (mut app, _trail) = app();
        app.get("/hello", handler_fn(hello)).unwrap();
        assert!(!app.is_booted());

        let start = Barrier::new(THREADS);
        let results = std::thread::scope(|scope| {
            let handles = (0..THREADS)
                .map(|_| {
                    scope.spawn(|| {
                        start.wait();
                        let response = get(&app, "/hello");
                        let table = app.table().unwrap() as *const RouteTable as usize;
                        (table, response.status(), response.into_body())
                    })
                })
                .collect::<Vec<_>>();
            handles.into_iter().map(|handle| handle.join().unwrap()).collect::<Vec<_>>()
        });

        let booted = app.table().unwrap() as *const RouteTable as usize;
        for (table, status, body) in results {
            assert_eq!(table, booted);
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body.as_ref(), b"hello");
        }
    }

    #[test]
    fn error_chain_lists_sources() {
        #[derive(Debug, thiserror::Error)]
        #[error("loading catalog failed")]
        struct LoadError(#[source] std::io::Error);

        let error = LoadError(std::io::Error::other("disk gone"));
        assert_eq!(error_chain(&error), "loading catalog failed: disk gone");
    }
}
