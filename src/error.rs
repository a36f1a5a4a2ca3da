//! Unified error type.

use thiserror::Error;

/// The error type returned by larvatus' fallible operations.
///
/// A missing route is not an `Error`: it is a normal routing outcome answered
/// with a `404`. `Error` covers startup misconfiguration (bad route templates,
/// bad config files), transport failures, and failures raised by handlers or
/// middleware, which the [`ErrorHandler`](crate::middleware::ErrorHandler)
/// turns into a `500`.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// A route template that cannot be compiled.
    #[error("invalid route `{template}`: {reason}")]
    InvalidRoute { template: String, reason: String },

    #[error("unsupported method `{0}`")]
    UnsupportedMethod(String),

    #[error("invalid config: {0}")]
    Config(String),

    #[error("invalid config file: {0}")]
    ConfigFile(#[from] toml::de::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("template not found: {0}")]
    TemplateNotFound(String),

    /// A failure raised by application code.
    #[error("{0}")]
    Handler(String),
}

impl Error {
    /// Builds a handler failure carrying `message`.
    ///
    /// ```rust
    /// use larvatus::{Error, Outcome, Request, Response};
    ///
    /// fn load(_req: &mut Request, _res: &mut Response) -> Outcome {
    ///     Err(Error::handler("database unavailable"))
    /// }
    /// ```
    pub fn handler(message: impl Into<String>) -> Self {
        Self::Handler(message.into())
    }

    pub(crate) fn invalid_route(template: &str, reason: impl Into<String>) -> Self {
        Self::InvalidRoute { template: template.to_owned(), reason: reason.into() }
    }
}
