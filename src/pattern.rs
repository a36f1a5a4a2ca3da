//! Route template compilation and path matching.
//!
//! A template such as `/users/:id/posts/:post` is split on `/` once, at
//! registration time. Segments starting with `:` capture exactly one
//! non-empty path segment; every other segment must match byte-for-byte.
//!
//! Matching is strict about segment counts: `/users/` carries a trailing empty
//! segment, so it never matches the template `/users` (and vice versa).

use crate::error::Error;

#[derive(Clone, Debug, Eq, PartialEq)]
enum Segment {
    Literal(String),
    Capture(String),
}

/// A compiled route template.
///
/// Two patterns are equal when they were compiled from the same template.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PathPattern {
    template: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Compiles `template`.
    ///
    /// Fails when the template does not start with `/`, or when a capture name
    /// is empty or contains anything but ASCII alphanumerics and `_`.
    ///
    /// ```rust
    /// use larvatus::PathPattern;
    ///
    /// let pattern = PathPattern::compile("/posts/:id/comments/:comment").unwrap();
    /// let params = pattern.match_path("/posts/42/comments/7").unwrap();
    /// assert_eq!(params[0], ("id".to_owned(), "42".to_owned()));
    /// assert_eq!(params[1], ("comment".to_owned(), "7".to_owned()));
    ///
    /// assert!(PathPattern::compile("/posts/:").is_err());
    /// ```
    pub fn compile(template: &str) -> Result<Self, Error> {
        if !template.starts_with('/') {
            return Err(Error::invalid_route(template, "must start with `/`"));
        }

        let segments = template
            .split('/')
            .map(|part| match part.strip_prefix(':') {
                Some("") => Err(Error::invalid_route(template, "empty parameter name")),
                Some(name) if !name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') => {
                    Err(Error::invalid_route(template, format!("invalid parameter name `{name}`")))
                }
                Some(name) => Ok(Segment::Capture(name.to_owned())),
                None => Ok(Segment::Literal(part.to_owned())),
            })
            .collect::<Result<_, _>>()?;

        Ok(Self { template: template.to_owned(), segments })
    }

    /// Matches `path` (without query string) against this pattern.
    ///
    /// Returns the captured `(name, value)` pairs in template order. Values are
    /// taken verbatim from the path; no percent-decoding is applied.
    pub fn match_path(&self, path: &str) -> Option<Vec<(String, String)>> {
        let mut parts = path.split('/');
        let mut params = Vec::new();

        for segment in &self.segments {
            let part = parts.next()?;
            match segment {
                Segment::Literal(literal) if literal == part => {}
                Segment::Literal(_) => return None,
                Segment::Capture(_) if part.is_empty() => return None,
                Segment::Capture(name) => params.push((name.clone(), part.to_owned())),
            }
        }

        // Any leftover segment means the path is longer than the template.
        if parts.next().is_some() {
            return None;
        }
        Some(params)
    }

    /// Returns the template this pattern was compiled from.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Returns the capture names in template order.
    pub fn param_names(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Capture(name) => Some(name.as_str()),
                Segment::Literal(_) => None,
            })
            .collect()
    }
}
