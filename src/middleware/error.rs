//! The outermost link: turns failures into `500` responses.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use serde_json::json;
use tracing::error;

use crate::config::Environment;
use crate::handler::Outcome;
use crate::middleware::{Middleware, Next};
use crate::request::Request;
use crate::response::Response;
use crate::status::Status;

const GENERIC_MESSAGE: &str = "Internal Server Error";

/// Catches every failure raised downstream, whether returned as `Err` or
/// thrown as a panic, and answers `500` with `{"error": <message>}`.
///
/// The [`App`](crate::App) wraps it around the whole chain, so it is the only
/// place failures are caught. Returned errors always expose their message;
/// panic payloads are exposed only in [`Environment::Development`].
///
/// Whatever the failing handler already wrote to the response stays there,
/// except that the JSON error body replaces the body. If the handler had
/// already sent the response, that response stands.
#[derive(Clone, Copy, Debug)]
pub struct ErrorHandler {
    environment: Environment,
}

impl ErrorHandler {
    pub fn new(environment: Environment) -> Self {
        Self { environment }
    }
}

impl Middleware for ErrorHandler {
    fn handle(&self, req: &mut Request, res: &mut Response, next: Next<'_>) -> Outcome {
        let method = req.method().to_owned();
        let path = req.path().to_owned();

        let message = match panic::catch_unwind(AssertUnwindSafe(|| next.run(req, res))) {
            Ok(Ok(())) => return Ok(()),
            Ok(Err(err)) => {
                error!(%method, %path, error = %err, "request failed");
                err.to_string()
            }
            Err(payload) => {
                let detail = panic_message(payload.as_ref());
                error!(%method, %path, panic = %detail, "handler panicked");
                if self.environment.is_development() {
                    detail
                } else {
                    GENERIC_MESSAGE.to_owned()
                }
            }
        };

        res.set_status(Status::InternalServerError);
        res.json(&json!({ "error": message }))?;
        res.send();
        Ok(())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        GENERIC_MESSAGE.to_owned()
    }
}
