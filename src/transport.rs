//! The boundary between the dispatcher and whatever carries bytes.
//!
//! A host (the bundled hyper [`Server`](crate::Server), a test, a CGI shim)
//! hands the dispatcher a [`RawRequest`] and writes the returned [`Outgoing`]
//! back verbatim: status line, headers, body.

use std::collections::HashMap;

use bytes::Bytes;
use http_body_util::Full;
use serde_json::{Map, Value};
use tracing::warn;

use crate::method::Method;

/// A file received as part of a multipart upload, decoded by the host.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct UploadedFile {
    pub field: String,
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// Inbound request descriptor.
///
/// `query` is parsed from `url` by [`RawRequest::new`]. Leave `form` as `None`
/// to let the dispatcher derive it from the body and its content type.
#[derive(Clone, Debug, Default)]
pub struct RawRequest {
    pub method: String,
    /// Request target as received, query string included.
    pub url: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub query: HashMap<String, String>,
    pub form: Option<Map<String, Value>>,
    pub files: Vec<UploadedFile>,
}

impl RawRequest {
    /// Builds a descriptor for `method` and the request target `url`.
    ///
    /// ```rust
    /// use larvatus::RawRequest;
    ///
    /// let raw = RawRequest::new("GET", "/search?q=rust&page=2");
    /// assert_eq!(raw.path, "/search");
    /// assert_eq!(raw.query["q"], "rust");
    /// ```
    pub fn new(method: &str, url: &str) -> Self {
        let (path, query) = match url.split_once('?') {
            Some((path, query)) => (path, parse_pairs(query.as_bytes())),
            None                => (url, HashMap::new()),
        };
        Self {
            method: method.to_owned(),
            url: url.to_owned(),
            path: path.to_owned(),
            query,
            ..Self::default()
        }
    }

    pub fn get(url: &str) -> Self { Self::new(Method::Get.as_str(), url) }
    pub fn post(url: &str) -> Self { Self::new(Method::Post.as_str(), url) }
    pub fn put(url: &str) -> Self { Self::new(Method::Put.as_str(), url) }
    pub fn delete(url: &str) -> Self { Self::new(Method::Delete.as_str(), url) }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Supplies pre-parsed form fields, bypassing body parsing.
    pub fn form(mut self, form: Map<String, Value>) -> Self {
        self.form = Some(form);
        self
    }

    pub fn file(mut self, file: UploadedFile) -> Self {
        self.files.push(file);
        self
    }

    /// Converts a hyper request head plus its collected body.
    pub(crate) fn from_http(parts: &http::request::Parts, body: Bytes) -> Self {
        let target = parts.uri.path_and_query().map_or("/", |pq| pq.as_str());
        let mut raw = Self::new(parts.method.as_str(), target);
        raw.headers = parts
            .headers
            .iter()
            .filter_map(|(name, value)| match value.to_str() {
                Ok(value) => Some((name.as_str().to_owned(), value.to_owned())),
                Err(_) => {
                    warn!(header = %name, "dropping non-UTF-8 header value");
                    None
                }
            })
            .collect();
        raw.body = body.to_vec();
        raw
    }
}

/// Decodes `application/x-www-form-urlencoded` pairs. The last duplicate wins.
pub(crate) fn parse_pairs(input: &[u8]) -> HashMap<String, String> {
    url::form_urlencoded::parse(input).into_owned().collect()
}

/// Outbound snapshot taken when a response is sent.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Outgoing {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Outgoing {
    /// What a host emits for a request that never reached `send`: `500`, no body.
    pub fn unterminated() -> Self {
        Self { status: 500, headers: Vec::new(), body: Vec::new() }
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub(crate) fn into_http(self) -> http::Response<Full<Bytes>> {
        let mut builder = http::Response::builder().status(self.status);
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder.body(Full::new(Bytes::from(self.body))).unwrap_or_else(|e| {
            warn!("unrepresentable response: {e}");
            let mut fallback = http::Response::new(Full::new(Bytes::new()));
            *fallback.status_mut() = http::StatusCode::INTERNAL_SERVER_ERROR;
            fallback
        })
    }
}
