//! Outgoing HTTP response builder.
//!
//! A [`Response`] starts as `200 OK` with no headers and an empty body. Handlers
//! mutate it and finish with [`Response::send`]. The first `send` freezes the
//! response: later writes, header changes and sends are silently ignored, so
//! exactly one response leaves the dispatcher whatever path a request takes.

use serde::Serialize;
use tracing::trace;

use crate::error::Error;
use crate::status::{IntoStatus, Status};
use crate::transport::Outgoing;

const JSON: &str = "application/json";
const TEXT: &str = "text/plain; charset=utf-8";
const HTML: &str = "text/html; charset=utf-8";
const JSON_CSP: &str = "default-src 'self'";

/// An outgoing HTTP response.
///
/// ```rust
/// use larvatus::{Response, Status};
///
/// let mut res = Response::new();
/// res.set_status(Status::Created);
/// res.set_header("location", "/users/42");
/// res.json(&serde_json::json!({ "id": 42 })).unwrap();
/// res.send();
///
/// res.write("ignored");
/// assert_eq!(res.body(), br#"{"id":42}"#);
/// ```
#[derive(Debug)]
pub struct Response {
    status: u16,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
    sent: bool,
}

impl Response {
    pub fn new() -> Self {
        Self { status: Status::Ok.into(), headers: Vec::new(), body: Vec::new(), sent: false }
    }

    pub fn status(&self) -> u16 { self.status }
    pub fn headers(&self) -> &[(String, String)] { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }
    pub fn is_sent(&self) -> bool { self.sent }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn set_status(&mut self, code: impl IntoStatus) {
        if self.frozen() {
            return;
        }
        self.status = code.into_status();
    }

    /// Sets a header, replacing any value already stored under the same
    /// (case-insensitive) name. Headers are emitted in first-set order.
    pub fn set_header(&mut self, name: &str, value: &str) {
        if self.frozen() {
            return;
        }
        match self.headers.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
            Some((_, existing)) => value.clone_into(existing),
            None => self.headers.push((name.to_owned(), value.to_owned())),
        }
    }

    /// Appends to the body.
    pub fn write(&mut self, chunk: impl AsRef<[u8]>) {
        if self.frozen() {
            return;
        }
        self.body.extend_from_slice(chunk.as_ref());
    }

    /// Replaces the body with `value` serialized as JSON and sets
    /// `content-type` and `content-security-policy`.
    pub fn json<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Error> {
        if self.frozen() {
            return Ok(());
        }
        let body = serde_json::to_vec(value)?;
        self.set_header("content-type", JSON);
        self.set_header("content-security-policy", JSON_CSP);
        self.body = body;
        Ok(())
    }

    /// Replaces the body with plain text.
    pub fn text(&mut self, body: impl Into<String>) {
        self.replace_body(TEXT, body.into().into_bytes());
    }

    /// Replaces the body with HTML.
    pub fn html(&mut self, body: impl Into<String>) {
        self.replace_body(HTML, body.into().into_bytes());
    }

    /// Freezes the response for transmission. Returns `false` if it had
    /// already been sent.
    pub fn send(&mut self) -> bool {
        if self.sent {
            trace!("send ignored, response already sent");
            return false;
        }
        self.sent = true;
        true
    }

    fn replace_body(&mut self, content_type: &str, body: Vec<u8>) {
        if self.frozen() {
            return;
        }
        self.set_header("content-type", content_type);
        self.body = body;
    }

    fn frozen(&self) -> bool {
        if self.sent {
            trace!("mutation ignored, response already sent");
        }
        self.sent
    }

    /// The transmitted snapshot, or `None` if `send` was never called.
    pub(crate) fn into_outgoing(self) -> Option<Outgoing> {
        self.sent.then(|| Outgoing { status: self.status, headers: self.headers, body: self.body })
    }
}

impl Default for Response {
    fn default() -> Self { Self::new() }
}
