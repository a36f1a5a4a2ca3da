//! The dispatcher: one request in, one response out.
//!
//! Per request:
//!
//! ```text
//! RawRequest ─▶ Request + Response (200, empty)
//!            ─▶ ErrorHandler ─▶ middleware links ─▶ route
//!                                                    ├─ match    ─▶ params set, handler runs
//!                                                    └─ no match ─▶ 404 {"error":"Not Found"}
//!            ─▶ Outgoing (the sent response, or a bare 500 if nothing was sent)
//! ```

use serde_json::json;
use tracing::{debug, error, info, warn};

use crate::config::{Config, Environment};
use crate::handler::Outcome;
use crate::method::Method;
use crate::middleware::{Chain, ErrorHandler, Middleware, Next};
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;
use crate::status::Status;
use crate::transport::{Outgoing, RawRequest};

/// An application: a router, a middleware chain and the error boundary.
///
/// Register routes and middleware at startup, then serve. Registration takes
/// `self` by value, so an `App` that is already shared with the server can no
/// longer change.
///
/// ```rust
/// use larvatus::{App, Environment, RawRequest};
///
/// let app = App::new(Environment::Development)
///     .get("/users/:id", |req, res| {
///         let id = req.param("id").unwrap_or_default().to_owned();
///         res.json(&serde_json::json!({ "id": id }))?;
///         res.send();
///         Ok(())
///     });
///
/// let out = app.handle(RawRequest::get("/users/42"));
/// assert_eq!(out.status, 200);
/// assert_eq!(out.body, br#"{"id":"42"}"#);
///
/// assert_eq!(app.handle(RawRequest::get("/nope")).status, 404);
/// ```
pub struct App {
    environment: Environment,
    router: Router,
    chain: Chain,
    errors: ErrorHandler,
}

impl App {
    pub fn new(environment: Environment) -> Self {
        info!(environment = environment.as_str(), "app configured");
        Self {
            environment,
            router: Router::new(),
            chain: Chain::new(),
            errors: ErrorHandler::new(environment),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.environment)
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// Replaces the router with one built elsewhere.
    pub fn router(mut self, router: Router) -> Self {
        self.router = router;
        self
    }

    /// See [`Router::on`].
    pub fn on<F>(self, method: Method, template: &str, handler: F) -> Self
    where
        F: Fn(&mut Request, &mut Response) -> Outcome + Send + Sync + 'static,
    {
        self.map_router(|router| router.on(method, template, handler))
    }

    pub fn get<F>(self, template: &str, handler: F) -> Self
    where
        F: Fn(&mut Request, &mut Response) -> Outcome + Send + Sync + 'static,
    {
        self.on(Method::Get, template, handler)
    }

    pub fn post<F>(self, template: &str, handler: F) -> Self
    where
        F: Fn(&mut Request, &mut Response) -> Outcome + Send + Sync + 'static,
    {
        self.on(Method::Post, template, handler)
    }

    pub fn put<F>(self, template: &str, handler: F) -> Self
    where
        F: Fn(&mut Request, &mut Response) -> Outcome + Send + Sync + 'static,
    {
        self.on(Method::Put, template, handler)
    }

    pub fn delete<F>(self, template: &str, handler: F) -> Self
    where
        F: Fn(&mut Request, &mut Response) -> Outcome + Send + Sync + 'static,
    {
        self.on(Method::Delete, template, handler)
    }

    /// See [`Router::group`].
    pub fn group<F>(self, prefix: &str, body: F) -> Self
    where
        F: FnOnce(Router) -> Router,
    {
        self.map_router(|router| router.group(prefix, body))
    }

    /// Appends a closure to the middleware chain.
    pub fn middleware<F>(self, f: F) -> Self
    where
        F: Fn(&mut Request, &mut Response, Next<'_>) -> Outcome + Send + Sync + 'static,
    {
        self.layer(f)
    }

    /// Appends any [`Middleware`] to the chain.
    pub fn layer(mut self, middleware: impl Middleware) -> Self {
        self.chain.add(middleware);
        self
    }

    /// Runs one request through the error boundary, the middleware chain and
    /// the router.
    ///
    /// Handlers are expected to `send`. A request that finishes without any
    /// `send` yields [`Outgoing::unterminated`].
    pub fn handle(&self, raw: RawRequest) -> Outgoing {
        let mut req = Request::from_raw(raw);
        let mut res = Response::new();

        let route = |req: &mut Request, res: &mut Response| self.route(req, res);
        let chain = |req: &mut Request, res: &mut Response| self.chain.run(req, res, &route);

        if let Err(e) = self.errors.handle(&mut req, &mut res, Next::new(&[], &chain)) {
            error!(method = req.method(), path = req.path(), "error handler failed: {e}");
        }

        res.into_outgoing().unwrap_or_else(|| {
            warn!(method = req.method(), path = req.path(), "request finished without send");
            Outgoing::unterminated()
        })
    }

    fn route(&self, req: &mut Request, res: &mut Response) -> Outcome {
        let matched = req
            .method()
            .parse::<Method>()
            .ok()
            .and_then(|method| self.router.lookup(method, req.path()));

        match matched {
            Some((handler, params)) => {
                req.set_params(params);
                handler.call(req, res)
            }
            None => {
                debug!(method = req.method(), path = req.path(), "no route matched");
                not_found(res)
            }
        }
    }

    fn map_router(mut self, f: impl FnOnce(Router) -> Router) -> Self {
        self.router = f(std::mem::take(&mut self.router));
        self
    }
}

fn not_found(res: &mut Response) -> Outcome {
    res.set_status(Status::NotFound);
    res.json(&json!({ "error": "Not Found" }))?;
    res.send();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_method_falls_through_to_404() {
        let app = App::new(Environment::Production).get("/", |_, res| {
            res.send();
            Ok(())
        });
        assert_eq!(app.handle(RawRequest::new("PATCH", "/")).status, 404);
        assert_eq!(app.handle(RawRequest::new("get", "/")).status, 404);
        assert_eq!(app.handle(RawRequest::get("/")).status, 200);
    }

    #[test]
    fn handler_without_send_is_unterminated() {
        let app = App::new(Environment::Production).get("/quiet", |_, res| {
            res.write("never flushed");
            Ok(())
        });
        assert_eq!(app.handle(RawRequest::get("/quiet")), Outgoing::unterminated());
    }

    #[test]
    fn router_can_be_replaced() {
        let router = Router::new().get("/built", |_, res| {
            res.send();
            Ok(())
        });
        let app = App::new(Environment::Production).router(router);
        assert_eq!(app.handle(RawRequest::get("/built")).status, 200);
    }

    #[test]
    fn from_config_threads_environment() {
        let config = Config { environment: Environment::Development, ..Config::default() };
        assert!(App::from_config(&config).environment().is_development());
    }
}
