//! Pluggable request handlers.
//!
//! A capsule produces the response for one path. Capsules are registered
//! under a path prefix in a [`RegistryBuilder`] before the server starts;
//! the resulting [`Registry`] is immutable and shared by every connection.
//!
//! Lookup is an exact match on the request path with one trailing slash
//! removed, so a capsule at `/app` answers `/app` and `/app/` but not
//! `/app2` or `/app/x`.

pub mod builtin;
pub mod registry;

pub use registry::{Registry, RegistryBuilder, RegistryError};

use crate::gemini::request::Request;
use crate::gemini::response::Response;

/// A handler for requests under a registered path.
///
/// Handlers run on the blocking thread pool, so they may do synchronous I/O.
/// Returning an error (or panicking) makes the server answer `40` and log
/// the error; nothing about it reaches the client.
pub trait Capsule: Send + Sync + 'static {
    fn handle(&self, request: &Request) -> anyhow::Result<Response>;
}

impl<F> Capsule for F
where
    F: Fn(&Request) -> anyhow::Result<Response> + Send + Sync + 'static,
{
    fn handle(&self, request: &Request) -> anyhow::Result<Response> {
        self(request)
    }
}
