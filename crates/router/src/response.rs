//! The response side of a dispatch.
//!
//! The transport hands the router a [`ResponseSink`]. Dispatch wraps it in a
//! [`ResponseWriter`] that remembers the last status set and how many body bytes went out,
//! which is what the chain needs to decide whether an error status can still be answered
//! by a status handler.

use bytes::{Bytes, BytesMut};
use http::{HeaderMap, Response, StatusCode};
use std::fmt;
use std::io;

/// Where a dispatched request writes its response.
#[cfg_attr(test, mockall::automock)]
pub trait ResponseSink {
    fn set_status(&mut self, status: StatusCode);

    fn headers_mut(&mut self) -> &mut HeaderMap;

    fn write(&mut self, buf: &[u8]) -> io::Result<()>;
}

/// Tracks the status and body length of a response as it is written.
pub struct ResponseWriter<'req> {
    sink: &'req mut dyn ResponseSink,
    status: Option<StatusCode>,
    written: usize,
}

impl<'req> ResponseWriter<'req> {
    pub fn new(sink: &'req mut dyn ResponseSink) -> Self {
        Self { sink, status: None, written: 0 }
    }

    /// The last status explicitly set, `None` if the handlers never set one.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// The status if it is a client or server error.
    pub fn error_status(&self) -> Option<StatusCode> {
        self.status.filter(|status| status.as_u16() >= 400)
    }

    /// Number of body bytes written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = Some(status);
        self.sink.set_status(status);
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        self.sink.headers_mut()
    }

    pub fn write(&mut self, buf: &[u8]) -> io::Result<()> {
        self.sink.write(buf)?;
        self.written += buf.len();
        Ok(())
    }
}

impl fmt::Debug for ResponseWriter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseWriter").field("status", &self.status).field("written", &self.written).finish()
    }
}

/// A sink that buffers the whole response in memory.
#[derive(Debug, Default)]
pub struct BufferedResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: BytesMut,
}

impl BufferedResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn into_response(self) -> Response<Bytes> {
        let mut response = Response::new(self.body.freeze());
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

impl ResponseSink for BufferedResponse {
    fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<()> {
        self.body.extend_from_slice(buf);
        Ok(())
    }
}
