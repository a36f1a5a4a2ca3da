//! HTTP status codes as a typed enum.
//!
//! [`Response::set_status`](crate::Response::set_status) accepts either a
//! [`Status`] or a bare `u16`:
//!
//! ```rust
//! use larvatus::{Response, Status};
//!
//! let mut res = Response::new();
//! res.set_status(Status::Created);
//! assert_eq!(res.status(), 201);
//!
//! res.set_status(418);
//! assert_eq!(res.status(), 418);
//! ```

/// The status codes handlers reach for most often.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Status {
    // ── 2xx Success ───────────────────────────────────────────────────────────
    Ok,                   // 200
    Created,              // 201
    Accepted,             // 202
    NoContent,            // 204

    // ── 3xx Redirection ───────────────────────────────────────────────────────
    MovedPermanently,     // 301
    Found,                // 302
    SeeOther,             // 303
    NotModified,          // 304
    TemporaryRedirect,    // 307
    PermanentRedirect,    // 308

    // ── 4xx Client errors ─────────────────────────────────────────────────────
    BadRequest,           // 400
    Unauthorized,         // 401
    Forbidden,            // 403
    NotFound,             // 404
    MethodNotAllowed,     // 405
    Conflict,             // 409
    UnprocessableContent, // 422
    TooManyRequests,      // 429

    // ── 5xx Server errors ─────────────────────────────────────────────────────
    InternalServerError,  // 500
    NotImplemented,       // 501
    ServiceUnavailable,   // 503
}

impl Status {
    pub fn as_u16(self) -> u16 {
        match self {
            Self::Ok                   => 200,
            Self::Created              => 201,
            Self::Accepted             => 202,
            Self::NoContent            => 204,
            Self::MovedPermanently     => 301,
            Self::Found                => 302,
            Self::SeeOther             => 303,
            Self::NotModified          => 304,
            Self::TemporaryRedirect    => 307,
            Self::PermanentRedirect    => 308,
            Self::BadRequest           => 400,
            Self::Unauthorized         => 401,
            Self::Forbidden            => 403,
            Self::NotFound             => 404,
            Self::MethodNotAllowed     => 405,
            Self::Conflict             => 409,
            Self::UnprocessableContent => 422,
            Self::TooManyRequests      => 429,
            Self::InternalServerError  => 500,
            Self::NotImplemented       => 501,
            Self::ServiceUnavailable   => 503,
        }
    }
}

impl From<Status> for u16 {
    fn from(s: Status) -> u16 {
        s.as_u16()
    }
}

/// Anything [`Response::set_status`](crate::Response::set_status) accepts.
///
/// Only `u16` is implemented among the integers, so a bare literal such as
/// `404` infers as `u16`.
pub trait IntoStatus {
    fn into_status(self) -> u16;
}

impl IntoStatus for u16 {
    fn into_status(self) -> u16 {
        self
    }
}

impl IntoStatus for Status {
    fn into_status(self) -> u16 {
        self.as_u16()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literals_and_variants_convert() {
        assert_eq!(IntoStatus::into_status(418), 418);
        assert_eq!(Status::NotFound.into_status(), 404);
        assert_eq!(u16::from(Status::UnprocessableContent), 422);
    }
}
