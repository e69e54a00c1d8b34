//! `application/x-www-form-urlencoded` parsing for informed capabilities.

use std::borrow::Cow;

use http::Method;
use thiserror::Error;

use crate::request::MAX_BODY;

const FORM_MEDIA_TYPE: &str = "application/x-www-form-urlencoded";

/// Why a request's form data could not be parsed.
///
/// The `Display` text is what the client sees in the `400 Bad Request` body.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum FormError {
    #[error("invalid URL escape \"{0}\"")]
    InvalidEscape(String),

    #[error("invalid semicolon separator in query")]
    Semicolon,

    #[error("invalid UTF-8 in form data")]
    InvalidUtf8,

    #[error("form body too large")]
    TooLarge,

    #[error("mime: invalid media type \"{0}\"")]
    MediaType(String),
}

/// Parsed form values: an ordered multi-map of keys to values.
///
/// Body values (when the body is a urlencoded form) precede query-string
/// values, so [`Form::get`] prefers the body.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Form {
    pairs: Vec<(String, String)>,
}

impl Form {
    pub fn new() -> Self {
        Self::default()
    }

    /// First value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs.iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Every value for `key`, in arrival order.
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.pairs.iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize { self.pairs.len() }
    pub fn is_empty(&self) -> bool { self.pairs.is_empty() }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }
}

/// Builds the form for a request: body pairs first, then query pairs.
///
/// Only `POST`, `PUT` and `PATCH` bodies are considered, and only when the
/// content type is `application/x-www-form-urlencoded`.
pub(crate) fn parse(
    method: &Method,
    content_type: Option<&str>,
    query: Option<&str>,
    body: &[u8],
) -> Result<Form, FormError> {
    let mut form = Form::new();

    let reads_body = *method == Method::POST || *method == Method::PUT || *method == Method::PATCH;
    if reads_body && is_form_media_type(content_type)? {
        if body.len() > MAX_BODY {
            return Err(FormError::TooLarge);
        }
        let body = std::str::from_utf8(body).map_err(|_| FormError::InvalidUtf8)?;
        parse_pairs(body, &mut form)?;
    }

    if let Some(query) = query {
        parse_pairs(query, &mut form)?;
    }

    Ok(form)
}

fn is_form_media_type(content_type: Option<&str>) -> Result<bool, FormError> {
    let Some(raw) = content_type else { return Ok(false) };
    let essence = raw.split(';').next().unwrap_or_default().trim();
    match essence.split_once('/') {
        Some((ty, sub)) if !ty.is_empty() && !sub.is_empty() => {
            Ok(essence.eq_ignore_ascii_case(FORM_MEDIA_TYPE))
        }
        _ => Err(FormError::MediaType(raw.to_owned())),
    }
}

fn parse_pairs(input: &str, form: &mut Form) -> Result<(), FormError> {
    for segment in input.split('&') {
        if segment.is_empty() {
            continue;
        }
        if segment.contains(';') {
            return Err(FormError::Semicolon);
        }
        let (key, value) = segment.split_once('=').unwrap_or((segment, ""));
        form.push(unescape_component(key)?, unescape_component(value)?);
    }
    Ok(())
}

/// Decodes one form component: `+` is a space, `%XX` a byte.
fn unescape_component(s: &str) -> Result<String, FormError> {
    let spaced: Cow<'_, str> = if s.contains('+') {
        Cow::Owned(s.replace('+', " "))
    } else {
        Cow::Borrowed(s)
    };
    unescape(&spaced)
}

/// Strict percent-decoding: every `%` must start a two-digit hex escape and
/// the decoded bytes must be UTF-8.
pub(crate) fn unescape(s: &str) -> Result<String, FormError> {
    let bytes = s.as_bytes();
    let mut i = 0;
    while let Some(offset) = bytes[i..].iter().position(|&b| b == b'%') {
        let at = i + offset;
        let escape = bytes.get(at + 1..at + 3);
        if !escape.is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit)) {
            let end = (at + 3).min(bytes.len());
            return Err(FormError::InvalidEscape(String::from_utf8_lossy(&bytes[at..end]).into_owned()));
        }
        i = at + 3;
    }

    urlencoding::decode(s)
        .map(Cow::into_owned)
        .map_err(|_| FormError::InvalidUtf8)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORM: Option<&str> = Some("application/x-www-form-urlencoded");

    #[test]
    fn query_pairs_are_decoded() {
        let form = parse(&Method::GET, None, Some("q=hello+world&tag=a%2Fb&flag"), b"").unwrap();
        assert_eq!(form.get("q"), Some("hello world"));
        assert_eq!(form.get("tag"), Some("a/b"));
        assert_eq!(form.get("flag"), Some(""));
        assert_eq!(form.len(), 3);
    }

    #[test]
    fn empty_segments_are_skipped() {
        let form = parse(&Method::GET, None, Some("&&a=1&&"), b"").unwrap();
        assert_eq!(form.iter().collect::<Vec<_>>(), vec![("a", "1")]);
    }

    #[test]
    fn body_values_precede_query_values() {
        let form = parse(&Method::POST, FORM, Some("k=query"), b"k=body").unwrap();
        assert_eq!(form.get("k"), Some("body"));
        assert_eq!(form.get_all("k").collect::<Vec<_>>(), vec!["body", "query"]);
    }

    #[test]
    fn get_ignores_body() {
        let form = parse(&Method::GET, FORM, None, b"k=body").unwrap();
        assert!(form.is_empty());
    }

    #[test]
    fn non_form_body_is_ignored() {
        let form = parse(&Method::POST, Some("application/json"), None, b"{}").unwrap();
        assert!(form.is_empty());
    }

    #[test]
    fn media_type_parameters_are_tolerated() {
        let ct = Some("Application/X-WWW-Form-Urlencoded; charset=utf-8");
        let form = parse(&Method::PUT, ct, None, b"a=1").unwrap();
        assert_eq!(form.get("a"), Some("1"));
    }

    #[test]
    fn invalid_escape_is_rejected() {
        let err = parse(&Method::GET, None, Some("a=%zz"), b"").unwrap_err();
        assert_eq!(err, FormError::InvalidEscape("%zz".to_owned()));
        assert_eq!(err.to_string(), "invalid URL escape \"%zz\"");
    }

    #[test]
    fn truncated_escape_is_rejected() {
        let err = parse(&Method::GET, None, Some("a=%4"), b"").unwrap_err();
        assert_eq!(err, FormError::InvalidEscape("%4".to_owned()));
    }

    #[test]
    fn semicolon_is_rejected() {
        let err = parse(&Method::GET, None, Some("a=1;b=2"), b"").unwrap_err();
        assert_eq!(err, FormError::Semicolon);
    }

    #[test]
    fn non_utf8_escape_is_rejected() {
        let err = parse(&Method::GET, None, Some("a=%ff"), b"").unwrap_err();
        assert_eq!(err, FormError::InvalidUtf8);
    }

    #[test]
    fn oversized_body_is_rejected() {
        let body = vec![b'a'; MAX_BODY + 1];
        let err = parse(&Method::POST, FORM, None, &body).unwrap_err();
        assert_eq!(err, FormError::TooLarge);
    }

    #[test]
    fn malformed_media_type_is_rejected() {
        let err = parse(&Method::POST, Some("garbage"), None, b"a=1").unwrap_err();
        assert!(matches!(err, FormError::MediaType(_)));
    }
}
