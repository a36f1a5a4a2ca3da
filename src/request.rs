//! Incoming HTTP request type.

use std::collections::HashMap;

use serde_json::{Map, Value};
use tracing::debug;

use crate::transport::{RawRequest, UploadedFile, parse_pairs};

/// Path parameters captured by the matched route.
pub type Params = HashMap<String, String>;

/// An incoming HTTP request.
///
/// Everything except the path parameters is fixed when the request is built.
/// The dispatcher fills [`params`](Request::params) once, after the route
/// matched; handlers may adjust them through [`params_mut`](Request::params_mut).
#[derive(Debug)]
pub struct Request {
    method: String,
    url: String,
    path: String,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
    query: HashMap<String, String>,
    form: Map<String, Value>,
    files: Vec<UploadedFile>,
    params: Params,
}

impl Request {
    pub(crate) fn from_raw(raw: RawRequest) -> Self {
        let form = match raw.form {
            Some(form) => form,
            None => parse_body(&raw.headers, &raw.body),
        };
        Self {
            method: raw.method,
            url: raw.url,
            path: raw.path,
            headers: raw.headers,
            body: raw.body,
            query: raw.query,
            form,
            files: raw.files,
            params: Params::new(),
        }
    }

    pub fn method(&self) -> &str { &self.method }
    pub fn url(&self) -> &str { &self.url }
    pub fn path(&self) -> &str { &self.path }
    pub fn headers(&self) -> &[(String, String)] { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }
    pub fn query(&self) -> &HashMap<String, String> { &self.query }
    pub fn form(&self) -> &Map<String, Value> { &self.form }
    pub fn files(&self) -> &[UploadedFile] { &self.files }
    pub fn params(&self) -> &Params { &self.params }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/:id`, `req.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Returns a decoded query-string value.
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }

    pub fn params_mut(&mut self) -> &mut Params {
        &mut self.params
    }

    pub(crate) fn set_params(&mut self, params: Params) {
        self.params = params;
    }
}

/// Derives form fields from a urlencoded or JSON-object body.
fn parse_body(headers: &[(String, String)], body: &[u8]) -> Map<String, Value> {
    if body.is_empty() {
        return Map::new();
    }
    let content_type = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-type"))
        .map(|(_, v)| v.split(';').next().unwrap_or_default().trim().to_ascii_lowercase());

    match content_type.as_deref() {
        Some("application/x-www-form-urlencoded") => parse_pairs(body)
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect(),
        Some("application/json") => match serde_json::from_slice(body) {
            Ok(Value::Object(fields)) => fields,
            Ok(_) => Map::new(),
            Err(e) => {
                debug!("unparseable JSON body: {e}");
                Map::new()
            }
        },
        _ => Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn snapshots_raw_request() {
        let req = Request::from_raw(
            RawRequest::post("/users?page=2")
                .header("X-Request-Id", "abc")
                .body("hello"),
        );
        assert_eq!(req.method(), "POST");
        assert_eq!(req.url(), "/users?page=2");
        assert_eq!(req.path(), "/users");
        assert_eq!(req.header("x-request-id"), Some("abc"));
        assert_eq!(req.body(), b"hello");
        assert_eq!(req.query_param("page"), Some("2"));
        assert!(req.params().is_empty());
        assert!(req.form().is_empty());
    }

    #[test]
    fn carries_uploaded_files() {
        let avatar = UploadedFile {
            field: "avatar".to_owned(),
            filename: "ada.png".to_owned(),
            content_type: Some("image/png".to_owned()),
            data: vec![0x89, b'P', b'N', b'G'],
        };
        let req = Request::from_raw(RawRequest::post("/users/1/avatar").file(avatar.clone()));
        assert_eq!(req.files(), [avatar]);
    }

    #[test]
    fn parses_urlencoded_form() {
        let req = Request::from_raw(
            RawRequest::post("/users")
                .header("Content-Type", "application/x-www-form-urlencoded; charset=utf-8")
                .body("name=Ada+Lovelace&role=admin"),
        );
        assert_eq!(req.form()["name"], json!("Ada Lovelace"));
        assert_eq!(req.form()["role"], json!("admin"));
    }

    #[test]
    fn parses_json_object_body() {
        let req = Request::from_raw(
            RawRequest::post("/users")
                .header("content-type", "application/json")
                .body(r#"{"name":"ada","age":36}"#),
        );
        assert_eq!(req.form()["age"], json!(36));
    }

    #[test]
    fn non_object_or_invalid_json_yields_empty_form() {
        for body in ["[1,2]", "{not json"] {
            let req = Request::from_raw(
                RawRequest::post("/").header("content-type", "application/json").body(body),
            );
            assert!(req.form().is_empty());
        }
    }

    #[test]
    fn host_supplied_form_wins() {
        let mut form = Map::new();
        form.insert("k".to_owned(), json!("v"));
        let req = Request::from_raw(
            RawRequest::post("/")
                .header("content-type", "application/json")
                .body(r#"{"other":1}"#)
                .form(form),
        );
        assert_eq!(req.form().len(), 1);
        assert_eq!(req.form()["k"], json!("v"));
    }

    #[test]
    fn params_are_replaced_and_mutable() {
        let mut req = Request::from_raw(RawRequest::get("/users/42"));
        req.set_params([("id".to_owned(), "42".to_owned())].into_iter().collect());
        assert_eq!(req.param("id"), Some("42"));
        req.params_mut().insert("id".to_owned(), "43".to_owned());
        assert_eq!(req.param("id"), Some("43"));
    }
}
