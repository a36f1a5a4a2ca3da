//! Template rendering for handlers that answer with HTML.
//!
//! Rendering is independent of routing: a handler renders to a `String` and
//! passes it to [`Response::html`](crate::Response::html).

use std::collections::HashMap;

use serde_json::Value;

use crate::error::Error;

/// Renders a named template with `data`.
pub trait Renderer: Send + Sync {
    fn render(&self, name: &str, data: &Value) -> Result<String, Error>;
}

/// Templates held in memory, with `{{ key }}` placeholders.
///
/// A placeholder is replaced by the top-level field `key` of the data object:
/// strings verbatim, other values as JSON, missing fields as nothing. Shared
/// values set with [`Templates::set`] are used when the data lacks the key.
///
/// ```rust
/// use larvatus::view::{Renderer, Templates};
/// use serde_json::json;
///
/// let views = Templates::new()
///     .template("hello", "<h1>Hello, {{ name }}</h1>")
///     .set("name", "stranger");
///
/// assert_eq!(views.render("hello", &json!({ "name": "Ada" })).unwrap(), "<h1>Hello, Ada</h1>");
/// assert_eq!(views.render("hello", &json!({})).unwrap(), "<h1>Hello, stranger</h1>");
/// assert!(views.render("missing", &json!({})).is_err());
/// ```
#[derive(Clone, Debug, Default)]
pub struct Templates {
    templates: HashMap<String, String>,
    shared: HashMap<String, Value>,
}

impl Templates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn template(mut self, name: &str, source: &str) -> Self {
        self.templates.insert(name.to_owned(), source.to_owned());
        self
    }

    pub fn set(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.shared.insert(key.to_owned(), value.into());
        self
    }

    fn lookup<'a>(&'a self, data: &'a Value, key: &str) -> Option<&'a Value> {
        data.get(key).or_else(|| self.shared.get(key))
    }
}

impl Renderer for Templates {
    fn render(&self, name: &str, data: &Value) -> Result<String, Error> {
        let source = self
            .templates
            .get(name)
            .ok_or_else(|| Error::TemplateNotFound(name.to_owned()))?;

        let mut out = String::with_capacity(source.len());
        let mut rest = source.as_str();
        while let Some(start) = rest.find("{{") {
            let Some(len) = rest[start + 2..].find("}}") else {
                break;
            };
            out.push_str(&rest[..start]);
            let key = rest[start + 2..start + 2 + len].trim();
            match self.lookup(data, key) {
                Some(Value::String(s)) => out.push_str(s),
                Some(value) => out.push_str(&value.to_string()),
                None => {}
            }
            rest = &rest[start + 2 + len + 2..];
        }
        out.push_str(rest);
        Ok(out)
    }
}
