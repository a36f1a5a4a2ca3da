//! Built-in Kubernetes health-check handlers.
//!
//! | Probe | Path | Question |
//! |---|---|---|
//! | **Liveness** | `/healthz` | Is the process alive? Failure → restart. |
//! | **Readiness** | `/readyz` | Can the pod serve traffic? Failure → pulled from load-balancer. |
//!
//! ```rust
//! use larvatus::{App, Environment, health};
//!
//! let app = App::new(Environment::Production)
//!     .get("/healthz", health::liveness)
//!     .get("/readyz", health::readiness);
//! ```
//!
//! Replace `readiness` with your own handler if the application must verify
//! dependencies (database connections, downstream services) before taking
//! traffic.

use crate::handler::Outcome;
use crate::request::Request;
use crate::response::Response;

/// Kubernetes liveness probe handler. Always `200 OK` with body `"ok"`.
pub fn liveness(_req: &mut Request, res: &mut Response) -> Outcome {
    res.text("ok");
    res.send();
    Ok(())
}

/// Kubernetes readiness probe handler (default implementation).
/// Always `200 OK` with body `"ready"`.
pub fn readiness(_req: &mut Request, res: &mut Response) -> Outcome {
    res.text("ready");
    res.send();
    Ok(())
}
