//! Request description types used by the router.
//!
//! The router never sees a request body. It works on a [`RequestHeader`] that the transport
//! layer has already parsed, and collects the values captured from the path into [`PathParams`].

use http::request::Parts;
use http::{HeaderMap, Method, Request, Uri, Version};
use once_cell::sync::OnceCell;
use percent_encoding::percent_decode_str;

/// The parsed head of an HTTP request: method, uri, version and headers.
#[derive(Debug)]
pub struct RequestHeader {
    inner: Request<()>,
    decoded_path: OnceCell<String>,
}

impl AsRef<Request<()>> for RequestHeader {
    fn as_ref(&self) -> &Request<()> {
        &self.inner
    }
}

impl RequestHeader {
    /// Builds a header with the given method and uri and no headers.
    pub fn new(method: Method, uri: Uri) -> Self {
        let mut inner = Request::new(());
        *inner.method_mut() = method;
        *inner.uri_mut() = uri;
        Self::from_request(inner)
    }

    fn from_request(inner: Request<()>) -> Self {
        Self { inner, decoded_path: OnceCell::new() }
    }

    /// Consumes the header and returns the inner `Request<()>`.
    pub fn into_inner(self) -> Request<()> {
        self.inner
    }

    /// Returns a reference to the request's HTTP method.
    pub fn method(&self) -> &Method {
        self.inner.method()
    }

    /// Returns a reference to the request's URI.
    pub fn uri(&self) -> &Uri {
        self.inner.uri()
    }

    /// Returns the percent-decoded path of the request's URI.
    ///
    /// Routes match and bind against this path. Invalid UTF-8 sequences are replaced.
    pub fn path(&self) -> &str {
        self.decoded_path
            .get_or_init(|| percent_decode_str(self.inner.uri().path()).decode_utf8_lossy().into_owned())
    }

    /// Returns the path component of the request's URI as sent, still percent-encoded.
    pub fn raw_path(&self) -> &str {
        self.inner.uri().path()
    }

    /// Returns the request's HTTP version.
    pub fn version(&self) -> Version {
        self.inner.version()
    }

    /// Returns a reference to the request's headers.
    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        self.inner.headers_mut()
    }
}

impl From<Parts> for RequestHeader {
    fn from(parts: Parts) -> Self {
        Self::from_request(Request::from_parts(parts, ()))
    }
}

impl<T> From<Request<T>> for RequestHeader {
    fn from(request: Request<T>) -> Self {
        let (parts, _body) = request.into_parts();
        parts.into()
    }
}

/// Values captured from the request path, keyed by the declared param names.
///
/// Params accumulate across the routes of one dispatch chain: a later route rebinding a
/// name overwrites the earlier value, and insertion order is kept for iteration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams {
    entries: Vec<(String, String)>,
}

impl PathParams {
    /// Creates an empty PathParams instance with no parameters
    #[inline]
    pub fn empty() -> Self {
        Self { entries: Vec::new() }
    }

    /// Returns true if there are no path parameters
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of path parameters
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Gets the value of a path parameter by its name
    pub fn get(&self, key: impl AsRef<str>) -> Option<&str> {
        let key = key.as_ref();
        self.entries.iter().find(|(name, _)| name == key).map(|(_, value)| value.as_str())
    }

    /// Iterates over `(name, value)` pairs in binding order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub(crate) fn insert(&mut self, key: &str, value: &str) {
        match self.entries.iter_mut().find(|(name, _)| name == key) {
            Some((_, existing)) => value.clone_into(existing),
            None => self.entries.push((key.to_owned(), value.to_owned())),
        }
    }

    pub(crate) fn remove(&mut self, key: &str) {
        self.entries.retain(|(name, _)| name != key);
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PathParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = PathParams::empty();
        for (key, value) in iter {
            params.insert(&key.into(), &value.into());
        }
        params
    }
}
