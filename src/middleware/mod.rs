//! Middleware layer.
//!
//! Middleware wraps the routed handler and is the right place for
//! cross-cutting concerns: structured tracing, request-id injection,
//! authentication-header inspection.
//!
//! A link receives the request, the response and a [`Next`] cursor. Calling
//! [`Next::run`] continues with the following link (or, after the last one,
//! with routing); not calling it short-circuits everything downstream. `Next`
//! is consumed by `run`, so a link continues the chain at most once.
//!
//! ```text
//! ErrorHandler ─▶ m1 ─▶ m2 ─▶ route + handler
//!      ◀───────── m1 ◀─ m2 ◀──────┘
//! ```
//!
//! The chain itself is an immutable slice walked by index, so one [`Chain`]
//! serves any number of requests, concurrently, without being rebuilt.
//!
//! Built-in links:
//! - [`ErrorHandler`]: the outermost boundary, always installed by the app
//! - [`Trace`]: per-request span with method, path, status, latency

mod error;
mod trace;

use std::sync::Arc;

use crate::handler::Outcome;
use crate::request::Request;
use crate::response::Response;

pub use error::ErrorHandler;
pub use trace::Trace;

/// The step after the last link: routing and the matched handler.
pub type Terminal<'a> = dyn Fn(&mut Request, &mut Response) -> Outcome + 'a;

/// A request-processing step wrapped around everything registered after it.
///
/// Implemented for every closure of the right shape:
///
/// ```rust
/// use larvatus::{App, Environment};
///
/// let app = App::new(Environment::Production).middleware(|req, res, next| {
///     if req.header("authorization").is_none() {
///         res.set_status(401);
///         res.json(&serde_json::json!({ "error": "Unauthorized" }))?;
///         res.send();
///         return Ok(());
///     }
///     next.run(req, res)
/// });
/// ```
pub trait Middleware: Send + Sync + 'static {
    fn handle(&self, req: &mut Request, res: &mut Response, next: Next<'_>) -> Outcome;
}

impl<F> Middleware for F
where
    F: Fn(&mut Request, &mut Response, Next<'_>) -> Outcome + Send + Sync + 'static,
{
    fn handle(&self, req: &mut Request, res: &mut Response, next: Next<'_>) -> Outcome {
        self(req, res, next)
    }
}

/// Cursor over the links still to run for the current request.
pub struct Next<'a> {
    links: &'a [Arc<dyn Middleware>],
    index: usize,
    terminal: &'a Terminal<'a>,
}

impl<'a> Next<'a> {
    pub(crate) fn new(links: &'a [Arc<dyn Middleware>], terminal: &'a Terminal<'a>) -> Self {
        Self { links, index: 0, terminal }
    }

    /// Runs the rest of the chain.
    pub fn run(self, req: &mut Request, res: &mut Response) -> Outcome {
        match self.links.get(self.index) {
            Some(link) => link.handle(req, res, Next { index: self.index + 1, ..self }),
            None => (self.terminal)(req, res),
        }
    }

    /// Number of links (not counting the terminal step) still ahead.
    pub fn remaining(&self) -> usize {
        self.links.len() - self.index
    }
}

/// Pins a closure to the middleware signature so its parameters need no
/// type annotations.
///
/// ```rust
/// use larvatus::middleware::{Chain, from_fn};
///
/// let mut chain = Chain::new();
/// chain.add(from_fn(|req, res, next| {
///     res.set_header("x-powered-by", "larvatus");
///     next.run(req, res)
/// }));
/// ```
pub fn from_fn<F>(f: F) -> F
where
    F: Fn(&mut Request, &mut Response, Next<'_>) -> Outcome + Send + Sync + 'static,
{
    f
}

/// Ordered middleware links. Links are appended, never removed.
#[derive(Clone, Default)]
pub struct Chain {
    links: Vec<Arc<dyn Middleware>>,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `middleware`; it runs after every link added before it.
    pub fn add(&mut self, middleware: impl Middleware) {
        self.links.push(Arc::new(middleware));
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Runs every link in registration order, then `terminal`.
    pub fn run(&self, req: &mut Request, res: &mut Response, terminal: &Terminal<'_>) -> Outcome {
        Next::new(&self.links, terminal).run(req, res)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::error::Error;
    use crate::transport::RawRequest;

    type Log = Arc<Mutex<Vec<&'static str>>>;

    fn request() -> Request {
        Request::from_raw(RawRequest::get("/"))
    }

    fn around(log: Log, before: &'static str, after: &'static str) -> impl Middleware {
        from_fn(move |req, res, next| {
            log.lock().unwrap().push(before);
            let outcome = next.run(req, res);
            log.lock().unwrap().push(after);
            outcome
        })
    }

    #[test]
    fn runs_links_onion_style() {
        let log = Log::default();
        let mut chain = Chain::new();
        chain.add(around(Arc::clone(&log), "m1-before", "m1-after"));
        chain.add(around(Arc::clone(&log), "m2-before", "m2-after"));

        let terminal_log = Arc::clone(&log);
        let terminal = move |_: &mut Request, _: &mut Response| -> Outcome {
            terminal_log.lock().unwrap().push("t");
            Ok(())
        };
        chain.run(&mut request(), &mut Response::new(), &terminal).unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            ["m1-before", "m2-before", "t", "m2-after", "m1-after"]
        );
    }

    #[test]
    fn skipping_next_short_circuits() {
        let log = Log::default();
        let mut chain = Chain::new();
        let stop_log = Arc::clone(&log);
        chain.add(from_fn(move |_req, res, _next| {
            stop_log.lock().unwrap().push("m1");
            res.set_status(403);
            res.send();
            Ok(())
        }));
        chain.add(around(Arc::clone(&log), "m2-before", "m2-after"));

        let terminal_log = Arc::clone(&log);
        let terminal = move |_: &mut Request, _: &mut Response| -> Outcome {
            terminal_log.lock().unwrap().push("t");
            Ok(())
        };
        let mut res = Response::new();
        chain.run(&mut request(), &mut res, &terminal).unwrap();

        assert_eq!(*log.lock().unwrap(), ["m1"]);
        assert_eq!(res.status(), 403);
    }

    #[test]
    fn chain_is_reusable_across_requests() {
        let log = Log::default();
        let mut chain = Chain::new();
        chain.add(around(Arc::clone(&log), "before", "after"));
        let terminal = |_: &mut Request, _: &mut Response| -> Outcome { Ok(()) };

        for _ in 0..3 {
            chain.run(&mut request(), &mut Response::new(), &terminal).unwrap();
        }
        assert_eq!(log.lock().unwrap().len(), 6);
        assert_eq!(chain.len(), 1);
        assert!(!chain.is_empty());
        assert!(Chain::new().is_empty());
    }

    #[test]
    fn errors_propagate_through_links() {
        let log = Log::default();
        let mut chain = Chain::new();
        chain.add(around(Arc::clone(&log), "before", "after"));
        let terminal =
            |_: &mut Request, _: &mut Response| -> Outcome { Err(Error::handler("boom")) };

        let err = chain.run(&mut request(), &mut Response::new(), &terminal).unwrap_err();
        assert_eq!(err.to_string(), "boom");
        assert_eq!(*log.lock().unwrap(), ["before", "after"]);
    }

    #[test]
    fn links_can_mutate_request_for_downstream() {
        let mut chain = Chain::new();
        chain.add(from_fn(|req, res, next| {
            req.params_mut().insert("user".to_owned(), "ada".to_owned());
            next.run(req, res)
        }));
        let terminal = |req: &mut Request, res: &mut Response| -> Outcome {
            res.text(req.param("user").unwrap_or_default().to_owned());
            Ok(())
        };
        let mut res = Response::new();
        chain.run(&mut request(), &mut res, &terminal).unwrap();
        assert_eq!(res.body(), b"ada");
    }

    #[test]
    fn remaining_counts_links_ahead() {
        let mut chain = Chain::new();
        chain.add(from_fn(|req, res, next| {
            assert_eq!(next.remaining(), 1);
            next.run(req, res)
        }));
        chain.add(from_fn(|req, res, next| {
            assert_eq!(next.remaining(), 0);
            next.run(req, res)
        }));
        let terminal = |_: &mut Request, _: &mut Response| -> Outcome { Ok(()) };
        chain.run(&mut request(), &mut Response::new(), &terminal).unwrap();
    }
}
