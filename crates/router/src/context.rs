//! Per-request dispatch state.
//!
//! A [`RequestContext`] owns everything that belongs to one request: the cursor over the
//! routes that matched it, the params bound so far, the request scope of the injector and
//! the response writer. Nothing in it is shared with another request.

use crate::error::{ExtractError, HandlerError};
use crate::event::{self, EventEmitter};
use crate::inject::Scope;
use crate::request::{PathParams, RequestHeader};
use crate::response::{ResponseSink, ResponseWriter};
use crate::router::{Route, RouteResult};
use crate::status::{self, StatusHandlers};
use http::header::{CONTENT_TYPE, InvalidHeaderValue, LOCATION};
use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri};
use mime::Mime;
use serde::Serialize;
use serde_json::{Value, json};
use std::fmt;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, error, trace};

/// The state of one request moving through its matched routes.
///
/// Handlers receive the context mutably. Calling [`next`](Self::next) hands the request to
/// the handler of the next matched route; a handler that returns without calling it ends
/// the chain.
pub struct RequestContext<'app, 'req> {
    header: &'req RequestHeader,
    response: ResponseWriter<'req>,
    params: PathParams,
    scope: Scope<'app>,
    chain: std::vec::IntoIter<&'app Route>,
    status_handlers: &'app StatusHandlers,
    events: &'app EventEmitter,
    halted: bool,
}

impl<'app, 'req> RequestContext<'app, 'req> {
    pub(crate) fn new(
        header: &'req RequestHeader,
        sink: &'req mut dyn ResponseSink,
        matches: RouteResult<'app>,
        scope: Scope<'app>,
        status_handlers: &'app StatusHandlers,
        events: &'app EventEmitter,
    ) -> Self {
        Self {
            header,
            response: ResponseWriter::new(sink),
            params: PathParams::empty(),
            scope,
            chain: matches.into_iter(),
            status_handlers,
            events,
            halted: false,
        }
    }

    /// Advances the request to the next matched route.
    ///
    /// In order:
    /// 1. an error status already set on the response is answered by its status handler,
    ///    and the chain stops;
    /// 2. if no matched route is left, the not-found handler answers and the chain stops;
    /// 3. otherwise the next route's captured params are bound and its handler runs.
    ///
    /// Once the chain has stopped, further calls do nothing.
    pub fn next(&mut self) -> Result<(), HandlerError> {
        if self.halted {
            return Ok(());
        }
        if let Some(status) = self.response.error_status() {
            return self.handle_status_error(status);
        }
        let Some(route) = self.chain.next() else {
            return self.handle_not_found();
        };

        let path = self.header.path();
        route.bind_params(path, &mut self.params);
        trace!(route = route.name(), path, "invoke route handler");
        route.handler().invoke(self)
    }

    /// Answers an error status a handler set without advancing the chain afterwards.
    pub(crate) fn finish(&mut self) -> Result<(), HandlerError> {
        match self.response.error_status() {
            Some(status) if !self.halted => self.handle_status_error(status),
            _ => Ok(()),
        }
    }

    fn handle_status_error(&mut self, status: StatusCode) -> Result<(), HandlerError> {
        self.halted = true;
        self.events.emit(event::STATUS_ERROR, &[json!(status.as_u16()), json!(self.path())]);

        let handlers = self.status_handlers;
        match handlers.get(status) {
            Some(handler) if self.response.written() == 0 => {
                debug!(status = status.as_u16(), path = self.path(), "answer status with its handler");
                handler.invoke(self)
            }
            _ => {
                debug!(
                    status = status.as_u16(),
                    written = self.response.written(),
                    path = self.path(),
                    "answer status with its reason phrase"
                );
                status::write_status_text(self, status)?;
                Ok(())
            }
        }
    }

    fn handle_not_found(&mut self) -> Result<(), HandlerError> {
        self.halted = true;
        debug!(method = %self.method(), path = self.path(), "no route left to handle the request");
        self.events.emit(event::NOT_FOUND, &[json!(self.method().as_str()), json!(self.path())]);

        if self.response.written() == 0 {
            self.response.set_status(StatusCode::NOT_FOUND);
        }
        let handlers = self.status_handlers;
        match handlers.get(StatusCode::NOT_FOUND) {
            Some(handler) => handler.invoke(self),
            None => Ok(status::write_status_text(self, StatusCode::NOT_FOUND)?),
        }
    }

    /// Answers a request whose handler failed or panicked with a server error.
    ///
    /// The 500 handler only runs if no body went out yet; a failure inside it is logged
    /// and swallowed.
    pub(crate) fn handle_internal_error(&mut self, cause: &str) {
        self.halted = true;
        self.events.emit(event::INTERNAL_ERROR, &[json!(self.path()), json!(cause)]);

        if self.response.written() > 0 {
            debug!(written = self.response.written(), "response already started, leave it as is");
            return;
        }
        self.response.set_status(StatusCode::INTERNAL_SERVER_ERROR);

        let handlers = self.status_handlers;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| match handlers.get(StatusCode::INTERNAL_SERVER_ERROR) {
            Some(handler) => handler.invoke(self),
            None => Ok(status::write_status_text(self, StatusCode::INTERNAL_SERVER_ERROR)?),
        }));
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!(cause = %e, "internal error handler failed"),
            Err(_) => error!("internal error handler panicked"),
        }
    }

    pub fn header(&self) -> &'req RequestHeader {
        self.header
    }

    pub fn method(&self) -> &'req Method {
        self.header.method()
    }

    pub fn uri(&self) -> &'req Uri {
        self.header.uri()
    }

    pub fn headers(&self) -> &'req HeaderMap {
        self.header.headers()
    }

    pub fn path(&self) -> &'req str {
        self.header.path()
    }

    /// The params bound by every route the request went through so far.
    pub fn params(&self) -> &PathParams {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    /// Returns the bound value of the path param `name`, failing with
    /// [`ExtractError::MissingParam`] if no route bound it.
    pub fn require_param(&self, name: &str) -> Result<&str, ExtractError> {
        self.param(name).ok_or_else(|| ExtractError::MissingParam { name: name.to_owned() })
    }

    /// Number of matched routes not visited yet.
    pub fn remaining(&self) -> usize {
        self.chain.len()
    }

    /// The last status a handler set, `None` if none did.
    pub fn status(&self) -> Option<StatusCode> {
        self.response.status()
    }

    /// Setting a status of 400 or more stops the chain at the next [`next`](Self::next)
    /// call, or when the current handler returns.
    pub fn set_status(&mut self, status: StatusCode) {
        self.response.set_status(status);
    }

    /// Number of body bytes written so far.
    pub fn written(&self) -> usize {
        self.response.written()
    }

    pub fn response_headers_mut(&mut self) -> &mut HeaderMap {
        self.response.headers_mut()
    }

    pub fn insert_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.response.headers_mut().insert(name, value);
    }

    pub fn write(&mut self, buf: &[u8]) -> io::Result<()> {
        self.response.write(buf)
    }

    pub fn write_str(&mut self, s: &str) -> io::Result<()> {
        self.response.write(s.as_bytes())
    }

    /// Writes `s`, defaulting the content type to `text/plain; charset=utf-8`.
    pub fn write_text(&mut self, s: &str) -> io::Result<()> {
        self.default_content_type(&mime::TEXT_PLAIN_UTF_8);
        self.write_str(s)
    }

    /// Serializes `value` as the JSON body.
    pub fn write_json<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), HandlerError> {
        let body = serde_json::to_vec(value)?;
        self.set_content_type(&mime::APPLICATION_JSON);
        self.write(&body)?;
        Ok(())
    }

    /// Writes `value` wrapped in a call to `callback`, for JSONP clients.
    pub fn write_jsonp<T: Serialize + ?Sized>(&mut self, value: &T, callback: &str) -> Result<(), HandlerError> {
        let body = serde_json::to_string(value)?;
        self.set_content_type(&mime::APPLICATION_JAVASCRIPT);
        self.write_str(&format!("{callback}({body})"))?;
        Ok(())
    }

    /// Points the client at `location` with the given redirect status.
    pub fn redirect(&mut self, location: &str, status: StatusCode) -> Result<(), InvalidHeaderValue> {
        let location = HeaderValue::try_from(location)?;
        self.insert_header(LOCATION, location);
        self.set_status(status);
        Ok(())
    }

    /// Registers a value for the rest of this request's chain.
    pub fn register<T: Clone + Send + Sync + 'static>(&mut self, value: T) -> Option<T> {
        self.scope.register(value)
    }

    /// Resolves a value from the request scope, then from the application scope.
    pub fn resolve<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.scope.get::<T>()
    }

    pub fn events(&self) -> &'app EventEmitter {
        self.events
    }

    pub fn emit(&self, event: &str, args: &[Value]) {
        self.events.emit(event, args);
    }

    fn set_content_type(&mut self, mime: &Mime) {
        if let Ok(value) = HeaderValue::from_str(mime.as_ref()) {
            self.insert_header(CONTENT_TYPE, value);
        }
    }

    fn default_content_type(&mut self, mime: &Mime) {
        if !self.response.headers_mut().contains_key(CONTENT_TYPE) {
            self.set_content_type(mime);
        }
    }
}

impl fmt::Debug for RequestContext<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("method", self.method())
            .field("path", &self.path())
            .field("params", &self.params)
            .field("response", &self.response)
            .field("remaining", &self.chain.len())
            .field("halted", &self.halted)
            .finish_non_exhaustive()
    }
}
