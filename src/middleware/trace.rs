//! Per-request tracing.

use std::time::Instant;

use tracing::{info, info_span, warn};

use crate::handler::Outcome;
use crate::middleware::{Middleware, Next};
use crate::request::Request;
use crate::response::Response;

/// Opens a `request` span carrying the method and path, and logs the final
/// status and latency once everything downstream has returned.
///
/// Register it first so its span covers every other link:
///
/// ```rust
/// use larvatus::{App, Environment, middleware::Trace};
///
/// let app = App::new(Environment::Production).layer(Trace);
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct Trace;

impl Middleware for Trace {
    fn handle(&self, req: &mut Request, res: &mut Response, next: Next<'_>) -> Outcome {
        let span = info_span!("request", method = %req.method(), path = %req.path());
        let _entered = span.enter();
        let started = Instant::now();

        let outcome = next.run(req, res);

        let latency_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        if outcome.is_ok() {
            info!(status = res.status(), sent = res.is_sent(), latency_us, "request completed");
        } else {
            warn!(latency_us, "request failed downstream");
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::transport::RawRequest;

    #[test]
    fn is_transparent() {
        let mut req = Request::from_raw(RawRequest::get("/traced"));
        let mut res = Response::new();
        let terminal = |req: &mut Request, res: &mut Response| -> Outcome {
            res.text(req.path().to_owned());
            res.send();
            Ok(())
        };
        Trace.handle(&mut req, &mut res, Next::new(&[], &terminal)).unwrap();
        assert_eq!(res.body(), b"/traced");
    }

    #[test]
    fn forwards_errors() {
        let mut req = Request::from_raw(RawRequest::get("/"));
        let mut res = Response::new();
        let terminal = |_: &mut Request, _: &mut Response| -> Outcome { Err(Error::handler("x")) };
        assert!(Trace.handle(&mut req, &mut res, Next::new(&[], &terminal)).is_err());
    }
}
