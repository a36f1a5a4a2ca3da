//! Route table and prefix groups.
//!
//! One ordered list of routes per HTTP method. Lookup walks that list in
//! registration order and the first structural match wins: there is no
//! longest-match or specificity ranking, so register specific routes before
//! general ones.

use std::collections::HashMap;

use tracing::debug;

use crate::error::Error;
use crate::handler::{Handler, Outcome};
use crate::method::Method;
use crate::pattern::PathPattern;
use crate::request::{Params, Request};
use crate::response::Response;

struct Route {
    pattern: PathPattern,
    handler: Handler,
}

/// The application router.
///
/// Build it once at startup and hand it to [`App::router`](crate::App::router),
/// or register through the matching [`App`](crate::App) methods. Each
/// registration returns `self` so calls chain naturally.
///
/// A router is read-only once requests are being served; it is shared across
/// worker threads without locking.
#[derive(Default)]
pub struct Router {
    routes: HashMap<Method, Vec<Route>>,
    prefixes: Vec<String>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for a method + template pair. Returns `self` for chaining.
    ///
    /// Templates use `:name` captures; `req.param("name")` retrieves them:
    ///
    /// ```rust
    /// # use larvatus::{Method, Outcome, Request, Response, Router};
    /// # fn get_user(_: &mut Request, _: &mut Response) -> Outcome { Ok(()) }
    /// # fn create_user(_: &mut Request, _: &mut Response) -> Outcome { Ok(()) }
    /// # fn delete_user(_: &mut Request, _: &mut Response) -> Outcome { Ok(()) }
    /// Router::new()
    ///     .on(Method::Delete, "/users/:id", delete_user)
    ///     .on(Method::Get,    "/users/:id", get_user)
    ///     .on(Method::Post,   "/users",     create_user);
    /// ```
    ///
    /// Registering the same method and template again replaces the handler
    /// but keeps the route's original position.
    ///
    /// # Panics
    ///
    /// Panics if the template (with any group prefix) is malformed. Use
    /// [`try_on`](Router::try_on) to handle that case yourself.
    pub fn on<F>(self, method: Method, template: &str, handler: F) -> Self
    where
        F: Fn(&mut Request, &mut Response) -> Outcome + Send + Sync + 'static,
    {
        self.try_on(method, template, handler)
            .unwrap_or_else(|e| panic!("{e}"))
    }

    /// Like [`on`](Router::on), but reports malformed templates as
    /// [`Error::InvalidRoute`].
    pub fn try_on<F>(mut self, method: Method, template: &str, handler: F) -> Result<Self, Error>
    where
        F: Fn(&mut Request, &mut Response) -> Outcome + Send + Sync + 'static,
    {
        self.insert(method, template, Handler::new(handler))?;
        Ok(self)
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

    /// Registers the routes added by `body` under `prefix`.
    ///
    /// Groups nest; prefixes concatenate outer to inner. The prefix applies
    /// only while `body` runs.
    ///
    /// ```rust
    /// # use larvatus::{Outcome, Request, Response, Router};
    /// # fn list(_: &mut Request, _: &mut Response) -> Outcome { Ok(()) }
    /// let router = Router::new().group("/api", |api| {
    ///     api.group("/v1", |v1| v1.get("/users", list))
    /// });
    /// assert!(router.lookup(larvatus::Method::Get, "/api/v1/users").is_some());
    /// ```
    pub fn group<F>(mut self, prefix: &str, body: F) -> Self
    where
        F: FnOnce(Self) -> Self,
    {
        self.prefixes.push(prefix.to_owned());
        let mut router = body(self);
        router.prefixes.pop();
        router
    }

    /// Finds the handler for `method` and `path`, along with the captured
    /// parameters. When a capture name repeats, the last value wins.
    pub fn lookup(&self, method: Method, path: &str) -> Option<(Handler, Params)> {
        self.routes
            .get(&method)?
            .iter()
            .find_map(|route| {
                let captured = route.pattern.match_path(path)?;
                Some((route.handler.clone(), captured.into_iter().collect()))
            })
    }

    /// Number of routes registered for `method`.
    pub fn route_count(&self, method: Method) -> usize {
        self.routes.get(&method).map_or(0, Vec::len)
    }

    fn insert(&mut self, method: Method, template: &str, handler: Handler) -> Result<(), Error> {
        let full = format!("{}{template}", self.prefixes.concat());
        let pattern = PathPattern::compile(&full)?;
        let routes = self.routes.entry(method).or_default();

        match routes.iter_mut().find(|route| route.pattern == pattern) {
            Some(existing) => {
                debug!(%method, template = %full, "route handler replaced");
                existing.handler = handler;
            }
            None => {
                debug!(%method, template = pattern.template(), "route registered");
                routes.push(Route { pattern, handler });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(body: &'static str) -> impl Fn(&mut Request, &mut Response) -> Outcome + Send + Sync + 'static {
        move |_req: &mut Request, res: &mut Response| -> Outcome {
            res.text(body);
            Ok(())
        }
    }

    /// Runs whatever `lookup` returns and reports the body it produced.
    fn served(router: &Router, method: Method, path: &str) -> Option<String> {
        let (handler, params) = router.lookup(method, path)?;
        let mut req = Request::from_raw(crate::transport::RawRequest::new(method.as_str(), path));
        req.set_params(params);
        let mut res = Response::new();
        handler.call(&mut req, &mut res).unwrap();
        Some(String::from_utf8(res.body().to_vec()).unwrap())
    }

    #[test]
    fn matches_and_extracts_params() {
        let router = Router::new().get("/users/:id", reply("user"));
        let (_, params) = router.lookup(Method::Get, "/users/42").unwrap();
        assert_eq!(params.get("id").map(String::as_str), Some("42"));
        assert!(router.lookup(Method::Get, "/users/42/edit").is_none());
        assert!(router.lookup(Method::Get, "/users").is_none());
    }

    #[test]
    fn methods_have_separate_tables() {
        let router = Router::new()
            .get("/users", reply("list"))
            .post("/users", reply("create"))
            .put("/users/:id", reply("update"))
            .delete("/users/:id", reply("remove"));

        assert_eq!(served(&router, Method::Get, "/users").as_deref(), Some("list"));
        assert_eq!(served(&router, Method::Post, "/users").as_deref(), Some("create"));
        assert_eq!(served(&router, Method::Put, "/users/1").as_deref(), Some("update"));
        assert_eq!(served(&router, Method::Delete, "/users/1").as_deref(), Some("remove"));
        assert!(router.lookup(Method::Put, "/users").is_none());
    }

    #[test]
    fn first_registered_match_wins() {
        let router = Router::new()
            .get("/users/:id", reply("param"))
            .get("/users/me", reply("literal"));
        assert_eq!(served(&router, Method::Get, "/users/me").as_deref(), Some("param"));
    }

    #[test]
    fn reregistration_overwrites_in_place() {
        let router = Router::new()
            .get("/a/:x", reply("first"))
            .get("/a/b", reply("literal"))
            .get("/a/:x", reply("second"));

        assert_eq!(router.route_count(Method::Get), 2);
        // Still ahead of `/a/b`, now with the newer handler.
        assert_eq!(served(&router, Method::Get, "/a/b").as_deref(), Some("second"));
    }

    #[test]
    fn group_is_equivalent_to_full_template() {
        let grouped = Router::new().group("/api", |g| g.get("/users", reply("users")));
        let flat = Router::new().get("/api/users", reply("users"));

        for path in ["/api/users", "/users", "/api/users/", "/api"] {
            assert_eq!(
                grouped.lookup(Method::Get, path).is_some(),
                flat.lookup(Method::Get, path).is_some(),
                "{path}"
            );
        }
        assert_eq!(served(&grouped, Method::Get, "/api/users").as_deref(), Some("users"));
    }

    #[test]
    fn nested_groups_concatenate_and_restore() {
        let router = Router::new()
            .group("/api", |api| {
                api.group("/v1", |v1| v1.get("/users/:id", reply("v1")))
                    .get("/status", reply("status"))
            })
            .get("/health", reply("health"));

        let (_, params) = router.lookup(Method::Get, "/api/v1/users/7").unwrap();
        assert_eq!(params["id"], "7");
        assert!(router.lookup(Method::Get, "/api/status").is_some());
        assert!(router.lookup(Method::Get, "/health").is_some());
        assert!(router.lookup(Method::Get, "/api/health").is_none());
        assert!(router.prefixes.is_empty());
    }

    #[test]
    fn duplicate_capture_names_keep_last_value() {
        let router = Router::new().get("/:id/:id", reply(""));
        let (_, params) = router.lookup(Method::Get, "/a/b").unwrap();
        assert_eq!(params["id"], "b");
    }

    #[test]
    fn lookup_clones_the_registered_handler() {
        let router = Router::new().get("/", reply("root"));
        let (a, _) = router.lookup(Method::Get, "/").unwrap();
        let (b, _) = router.lookup(Method::Get, "/").unwrap();
        assert!(Handler::ptr_eq(&a, &b));
    }

    #[test]
    fn unregistered_method_has_no_routes() {
        let router = Router::new().get("/", reply("root"));
        assert_eq!(router.route_count(Method::Post), 0);
        assert!(router.lookup(Method::Post, "/").is_none());
    }

    #[test]
    fn try_on_reports_malformed_templates() {
        let err = Router::new().try_on(Method::Get, "/users/:", reply("")).err().unwrap();
        assert!(matches!(err, Error::InvalidRoute { .. }));
    }

    #[test]
    #[should_panic(expected = "must start with `/`")]
    fn prefix_is_validated_with_template() {
        let _ = Router::new().group("api", |g| g.get("/x", reply("")));
    }

    #[test]
    #[should_panic(expected = "invalid route `/users/:`")]
    fn on_panics_on_malformed_template() {
        let _ = Router::new().get("/users/:", reply(""));
    }
}
