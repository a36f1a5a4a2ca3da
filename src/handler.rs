//! Route handlers and how they are stored.
//!
//! # How handlers are stored
//!
//! The route table holds handlers of *different* closure types in one
//! `Vec<Route>` per method. Each one is erased behind an
//! `Arc<dyn Fn(&mut Request, &mut Response) -> Outcome>`, wrapped in the
//! cloneable [`Handler`] newtype:
//!
//! ```text
//! fn show(req: &mut Request, res: &mut Response) -> Outcome { … }   ← user writes this
//!        ↓ router.get("/users/:id", show)
//! Handler::new(show)                                                ← Arc<dyn Fn>
//!        ↓ stored in the route table, cloned out by Router::lookup
//! handler.call(&mut req, &mut res)                                  ← one vtable dispatch
//! ```
//!
//! Handlers run synchronously. They mutate the [`Response`] and normally end
//! with [`Response::send`]; returning `Err` (or panicking) hands control to the
//! [`ErrorHandler`](crate::middleware::ErrorHandler), which answers `500`.

use std::fmt;
use std::sync::Arc;

use crate::error::Error;
use crate::request::Request;
use crate::response::Response;

/// What a handler or middleware link returns.
pub type Outcome = Result<(), Error>;

type HandlerFn = dyn Fn(&mut Request, &mut Response) -> Outcome + Send + Sync + 'static;

/// A type-erased handler shared across concurrent requests.
///
/// Cloning is one atomic reference-count increment.
#[derive(Clone)]
pub struct Handler(Arc<HandlerFn>);

impl Handler {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut Request, &mut Response) -> Outcome + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn call(&self, req: &mut Request, res: &mut Response) -> Outcome {
        (self.0)(req, res)
    }

    /// Returns `true` if both values point at the same registered handler.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler").finish_non_exhaustive()
    }
}
