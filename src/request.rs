//! Incoming HTTP request type.

use bytes::Bytes;
use http::{HeaderMap, Method, Uri, header};
use thiserror::Error;

use crate::form::{self, Form, FormError};

/// Request bodies larger than this are refused with `413` before they are
/// fully read.
pub const MAX_BODY: usize = 10 << 20;

/// Why a request path could not be percent-decoded.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum PathError {
    #[error("invalid escape \"{0}\" in path")]
    InvalidEscape(String),

    #[error("path is not valid UTF-8 once decoded")]
    InvalidUtf8,
}

/// Percent-decodes a raw request path.
pub(crate) fn decode_path(raw: &str) -> Result<String, PathError> {
    form::unescape(raw).map_err(|e| match e {
        FormError::InvalidEscape(escape) => PathError::InvalidEscape(escape),
        _ => PathError::InvalidUtf8,
    })
}

/// An incoming HTTP request with its body fully buffered.
///
/// Handed by value to the `create`, `update` and `act` capabilities.
#[derive(Debug)]
pub struct Request {
    pub(crate) method: Method,
    pub(crate) uri: Uri,
    pub(crate) path: String,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Bytes,
}

impl Request {
    /// `path` is the already-decoded form of `parts.uri.path()`.
    pub(crate) fn new(parts: http::request::Parts, path: String, body: Bytes) -> Self {
        Self {
            method: parts.method,
            uri: parts.uri,
            path,
            headers: parts.headers,
            body,
        }
    }

    pub fn method(&self) -> &Method { &self.method }
    pub fn uri(&self) -> &Uri { &self.uri }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// The percent-decoded request path, e.g. `/snips/42`.
    pub fn path(&self) -> &str { &self.path }

    /// The raw query string, without the leading `?`.
    pub fn query(&self) -> Option<&str> { self.uri.query() }

    /// Case-insensitive header lookup. Non-UTF-8 values are skipped.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Parses the query string and, for urlencoded `POST`/`PUT`/`PATCH`
    /// bodies, the body into a [`Form`].
    pub fn form(&self) -> Result<Form, FormError> {
        let content_type = self.headers.get(header::CONTENT_TYPE)
            .map(|v| v.to_str().map_err(|_| FormError::MediaType(String::from_utf8_lossy(v.as_bytes()).into_owned())))
            .transpose()?;
        form::parse(&self.method, content_type, self.query(), &self.body)
    }

    pub(crate) fn into_headers(self) -> HeaderMap { self.headers }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urlencoded(method: &str, uri: &str, body: &'static [u8]) -> Request {
        let (parts, ()) = http::Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(())
            .unwrap()
            .into_parts();
        let path = decode_path(parts.uri.path()).unwrap();
        Request::new(parts, path, Bytes::from_static(body))
    }

    #[test]
    fn path_is_decoded_and_query_kept_raw() {
        let req = urlencoded("GET", "/snips/a%20b?x=%41", b"");
        assert_eq!(req.path(), "/snips/a b");
        assert_eq!(req.query(), Some("x=%41"));
        assert_eq!(req.form().unwrap().get("x"), Some("A"));
    }

    #[test]
    fn header_lookup_ignores_case() {
        let req = urlencoded("GET", "/snips/", b"");
        assert_eq!(req.header("Content-Type"), Some("application/x-www-form-urlencoded"));
        assert_eq!(req.header("x-missing"), None);
    }

    #[test]
    fn undecodable_paths_are_rejected() {
        assert_eq!(decode_path("/snips/%zz"), Err(PathError::InvalidEscape("%zz".to_owned())));
        assert_eq!(decode_path("/snips/%ff"), Err(PathError::InvalidUtf8));
        assert_eq!(
            PathError::InvalidEscape("%zz".to_owned()).to_string(),
            "invalid escape \"%zz\" in path",
        );
    }

    #[test]
    fn post_form_reads_body() {
        let req = urlencoded("POST", "/snips/", b"body=hi");
        assert_eq!(req.form().unwrap().get("body"), Some("hi"));
    }

    #[test]
    fn get_form_ignores_body() {
        let req = urlencoded("GET", "/snips/?q=1", b"body=hi");
        let form = req.form().unwrap();
        assert_eq!(form.get("q"), Some("1"));
        assert!(!form.contains_key("body"));
    }
}
