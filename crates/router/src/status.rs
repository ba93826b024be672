//! Handlers answering error statuses.

use crate::error::ConfigError;
use crate::handler::{handler_fn, RequestHandler};
use crate::RequestContext;
use http::header::{CONTENT_TYPE, X_CONTENT_TYPE_OPTIONS};
use http::{HeaderValue, StatusCode};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// The handlers registered per error status code.
///
/// A fresh registry answers 404 and 500 with the default handlers; every other error
/// status falls back to [`write_status_text`].
pub struct StatusHandlers {
    handlers: HashMap<u16, Arc<dyn RequestHandler>>,
}

impl StatusHandlers {
    pub fn new() -> Self {
        let mut handlers: HashMap<u16, Arc<dyn RequestHandler>> = HashMap::new();
        handlers.insert(StatusCode::NOT_FOUND.as_u16(), Arc::new(handler_fn(not_found)));
        handlers.insert(StatusCode::INTERNAL_SERVER_ERROR.as_u16(), Arc::new(handler_fn(internal_server_error)));
        Self { handlers }
    }

    /// Registers the handler for `code`, replacing any earlier one.
    ///
    /// Only error codes may have a handler: anything below 400 is rejected.
    pub fn insert<H: RequestHandler + 'static>(&mut self, code: u16, handler: H) -> Result<(), ConfigError> {
        if code < 400 {
            return Err(ConfigError::InvalidErrorCode(code));
        }
        self.handlers.insert(code, Arc::new(handler));
        Ok(())
    }

    pub fn get(&self, status: StatusCode) -> Option<&dyn RequestHandler> {
        self.handlers.get(&status.as_u16()).map(|handler| &**handler)
    }

    pub fn contains(&self, status: StatusCode) -> bool {
        self.handlers.contains_key(&status.as_u16())
    }
}

impl Default for StatusHandlers {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StatusHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut codes = self.handlers.keys().copied().collect::<Vec<_>>();
        codes.sort_unstable();
        f.debug_struct("StatusHandlers").field("codes", &codes).finish()
    }
}

/// The default 404 handler. Once a body went out, the text is only appended.
pub fn not_found(ctx: &mut RequestContext) -> std::io::Result<()> {
    const TEXT: &[u8] = b"404 page not found\n";
    if ctx.written() > 0 {
        return ctx.write(TEXT);
    }
    ctx.set_status(StatusCode::NOT_FOUND);
    write_plain_text(ctx, TEXT)
}

/// The default 500 handler: the reason phrase, nothing else.
pub fn internal_server_error(ctx: &mut RequestContext) -> std::io::Result<()> {
    let reason = StatusCode::INTERNAL_SERVER_ERROR.canonical_reason().unwrap_or_default();
    ctx.write(reason.as_bytes())
}

/// Answers `status` with its reason phrase as a plain text body.
///
/// If part of a body already went out, only the text is appended: the status and headers
/// can no longer change.
pub fn write_status_text(ctx: &mut RequestContext, status: StatusCode) -> std::io::Result<()> {
    let text = format!("{}\n", status.canonical_reason().unwrap_or_else(|| status.as_str()));
    if ctx.written() > 0 {
        return ctx.write(text.as_bytes());
    }
    ctx.set_status(status);
    write_plain_text(ctx, text.as_bytes())
}

fn write_plain_text(ctx: &mut RequestContext, body: &[u8]) -> std::io::Result<()> {
    ctx.insert_header(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
    ctx.insert_header(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    ctx.write(body)
}
