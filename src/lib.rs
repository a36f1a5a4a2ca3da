//! # larvatus
//!
//! A minimal HTTP request-dispatch layer. It maps a method and path to a
//! registered handler, extracts `:name` path parameters, and threads the
//! request through an ordered middleware chain before the handler runs.
//!
//! What it does:
//!
//! - Route tables per method, first registered match wins
//! - Prefix groups that nest
//! - Onion-style middleware with short-circuiting
//! - One error boundary: failures become `500 {"error": …}`, misses `404`
//! - A hyper/tokio host with graceful shutdown
//!
//! What it leaves to handlers: storage, templates, sessions. The [`store`] and
//! [`view`] modules offer small interfaces for the first two.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use larvatus::{App, Config, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), larvatus::Error> {
//!     let config = Config::from_env()?;
//!
//!     let app = App::from_config(&config)
//!         .group("/api", |api| {
//!             api.get("/users/:id", |req, res| {
//!                 let id = req.param("id").unwrap_or_default().to_owned();
//!                 res.json(&serde_json::json!({ "id": id }))?;
//!                 res.send();
//!                 Ok(())
//!             })
//!         });
//!
//!     Server::bind(config.addr).serve(app).await
//! }
//! ```
//!
//! ## Matching rules
//!
//! A template and a path match when they have the same number of
//! `/`-separated segments, every literal segment is byte-for-byte equal and
//! every `:name` segment is non-empty. Trailing slashes count: `/users/` is not
//! `/users`. Only `GET`, `POST`, `PUT` and `DELETE` are routable; anything else
//! gets `404`.

mod app;
mod error;
mod handler;
mod method;
mod pattern;
mod request;
mod response;
mod router;
mod server;
mod status;
mod transport;

pub mod config;
pub mod health;
pub mod middleware;
pub mod store;
pub mod view;

pub use app::App;
pub use config::{Config, Environment};
pub use error::Error;
pub use handler::{Handler, Outcome};
pub use method::Method;
pub use pattern::PathPattern;
pub use request::{Params, Request};
pub use response::Response;
pub use router::Router;
pub use server::Server;
pub use status::{IntoStatus, Status};
pub use transport::{Outgoing, RawRequest, UploadedFile};
