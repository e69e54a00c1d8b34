//! Outgoing HTTP response type, the fixed helper vocabulary, and the
//! [`IntoResponse`] conversion trait.
//!
//! Capabilities build a [`Response`] and return it. The dispatcher itself
//! only ever answers through the helpers below:
//!
//! | Helper | Status | Body | Header |
//! |---|---|---|---|
//! | [`Response::not_found`] | 404 | `404 Not Found` | |
//! | [`Response::not_found_with`] | 404 | caller's text | |
//! | [`Response::not_implemented`] | 501 | `501 Not Implemented` | |
//! | [`Response::created`] | 201 | `201 Created` | `Location` |
//! | [`Response::updated`] | 200 | `200 OK` | `Location` |
//! | [`Response::bad_request`] | 400 | caller's text | |
//! | [`Response::no_content`] | 204 | `204 No Content` | |
//! | [`Response::payload_too_large`] | 413 | `413 Payload Too Large` | |

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue, LOCATION};
use http::StatusCode;
use http_body_util::Full;
use tracing::warn;

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

// ── Response ─────────────────────────────────────────────────────────────────

/// An outgoing HTTP response.
///
/// ```rust
/// use resty::Response;
/// use http::StatusCode;
///
/// Response::json(br#"{"id":1}"#.to_vec());
/// Response::text("hello");
/// Response::status(StatusCode::ACCEPTED);
///
/// Response::builder()
///     .status(StatusCode::CREATED)
///     .header("location", "/snips/42")
///     .json(br#"{"id":42}"#.to_vec());
/// ```
#[derive(Debug)]
pub struct Response {
    pub(crate) body: Vec<u8>,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) status: StatusCode,
}

impl Response {
    /// `200 OK` — `application/json`.
    pub fn json(body: Vec<u8>) -> Self {
        Self::builder().json(body)
    }

    /// `200 OK` — `text/plain; charset=utf-8`.
    pub fn text(body: impl Into<String>) -> Self {
        Self::builder().text(body)
    }

    /// Response with no body.
    pub fn status(code: StatusCode) -> Self {
        Self { body: Vec::new(), headers: Vec::new(), status: code }
    }

    /// Builder for responses that need a custom status or extra headers.
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder { headers: Vec::new(), status: StatusCode::OK }
    }

    /// `404 Not Found`.
    pub fn not_found() -> Self {
        Self::canned(StatusCode::NOT_FOUND, "404 Not Found")
    }

    /// `404 Not Found` with a diagnostic, e.g. naming the missing resource.
    pub fn not_found_with(text: impl Into<String>) -> Self {
        Self::builder().status(StatusCode::NOT_FOUND).text(text)
    }

    /// `501 Not Implemented`. Sent whenever a resource lacks the capability
    /// a request routes to.
    pub fn not_implemented() -> Self {
        Self::canned(StatusCode::NOT_IMPLEMENTED, "501 Not Implemented")
    }

    /// `201 Created` pointing at the new item.
    pub fn created(location: &str) -> Self {
        Self::builder()
            .status(StatusCode::CREATED)
            .header(LOCATION.as_str(), location)
            .text("201 Created")
    }

    /// `200 OK` with a location, for use after a `PUT`.
    pub fn updated(location: &str) -> Self {
        Self::builder()
            .status(StatusCode::OK)
            .header(LOCATION.as_str(), location)
            .text("200 OK")
    }

    /// `400 Bad Request` carrying instructions for the client.
    pub fn bad_request(text: impl Into<String>) -> Self {
        Self::builder().status(StatusCode::BAD_REQUEST).text(text)
    }

    /// `204 No Content`. The body is kept on the value but never reaches the
    /// wire; hyper strips bodies from 204 responses.
    pub fn no_content() -> Self {
        Self::canned(StatusCode::NO_CONTENT, "204 No Content")
    }

    /// `413 Payload Too Large`. Sent when a request body exceeds
    /// [`MAX_BODY`](crate::MAX_BODY).
    pub fn payload_too_large() -> Self {
        Self::canned(StatusCode::PAYLOAD_TOO_LARGE, "413 Payload Too Large")
    }

    fn canned(status: StatusCode, body: &str) -> Self {
        Self::builder().status(status).text(body)
    }

    pub fn code(&self) -> StatusCode { self.status }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Case-insensitive lookup of a header set on this response.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Converts into the `http` type hyper writes. Headers that are not
    /// valid on the wire are dropped with a warning.
    pub(crate) fn into_inner(self) -> http::Response<Full<Bytes>> {
        let mut res = http::Response::new(Full::new(Bytes::from(self.body)));
        *res.status_mut() = self.status;
        for (name, value) in self.headers {
            match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(&value)) {
                (Ok(name), Ok(value)) => {
                    res.headers_mut().append(name, value);
                }
                _ => warn!(header = %name, "dropping invalid response header"),
            }
        }
        res
    }
}

// ── ResponseBuilder ───────────────────────────────────────────────────────────

/// Fluent builder for [`Response`].
///
/// Obtain via [`Response::builder()`]. Defaults to `200 OK`.
/// Terminated by a typed body method.
pub struct ResponseBuilder {
    headers: Vec<(String, String)>,
    status: StatusCode,
}

impl ResponseBuilder {
    pub fn status(mut self, code: StatusCode) -> Self {
        self.status = code;
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    /// Terminate with a JSON body (`application/json`).
    pub fn json(self, body: Vec<u8>) -> Response {
        self.finish("application/json", body)
    }

    /// Terminate with a plain-text body (`text/plain; charset=utf-8`).
    pub fn text(self, body: impl Into<String>) -> Response {
        self.finish(TEXT_PLAIN, body.into().into_bytes())
    }

    /// Terminate with no body.
    pub fn no_body(self) -> Response {
        Response { body: Vec::new(), headers: self.headers, status: self.status }
    }

    fn finish(self, content_type: &str, body: Vec<u8>) -> Response {
        let mut headers = vec![("content-type".to_owned(), content_type.to_owned())];
        headers.extend(self.headers);
        Response { body, headers, status: self.status }
    }
}

// ── IntoResponse ──────────────────────────────────────────────────────────────

/// Conversion into an HTTP [`Response`].
///
/// Every capability callback returns some `impl IntoResponse`.
pub trait IntoResponse {
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response { self }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> Response { Response::text(self) }
}

impl IntoResponse for String {
    fn into_response(self) -> Response { Response::text(self) }
}

/// Return a status directly from a capability: `return StatusCode::GONE`
impl IntoResponse for StatusCode {
    fn into_response(self) -> Response { Response::status(self) }
}

/// Lets a capability use `?` on its own errors, as long as both sides
/// render as responses.
impl<T, E> IntoResponse for Result<T, E>
where
    T: IntoResponse,
    E: IntoResponse,
{
    fn into_response(self) -> Response {
        match self {
            Ok(ok) => ok.into_response(),
            Err(err) => err.into_response(),
        }
    }
}
