//! Request validation and routing.
//!
//! A validated request goes to the capsule registered for its path, or to
//! the static file resolver when no capsule matches.

use std::fmt;
use std::sync::Arc;

use crate::capsule::Registry;
use crate::files::StaticFiles;
use crate::gemini::request::Request;
use crate::gemini::response::Response;

/// Why a request was refused with `59`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The line did not parse into a resource identifier
    Unparseable,
    /// The path contains `..`
    PathTraversal,
    /// The host does not match the configured virtual host
    HostMismatch,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Rejection::Unparseable => "unparseable request",
            Rejection::PathTraversal => "path traversal",
            Rejection::HostMismatch => "invalid host",
        };
        f.write_str(reason)
    }
}

/// Shared, read-only routing state for all connections.
#[derive(Clone)]
pub struct Dispatcher {
    hostname: Option<String>,
    registry: Arc<Registry>,
    files: Option<StaticFiles>,
}

impl Dispatcher {
    /// Creates a dispatcher.
    ///
    /// An empty `hostname` is the same as none: the host is not checked.
    pub fn new(hostname: Option<String>, registry: Registry, files: Option<StaticFiles>) -> Self {
        Self {
            hostname: hostname.filter(|h| !h.is_empty()),
            registry: Arc::new(registry),
            files,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn hostname(&self) -> Option<&str> {
        self.hostname.as_deref()
    }

    /// Checks a parsed request before dispatch.
    pub fn validate(&self, request: &Request) -> Result<(), Rejection> {
        if request.is_empty() {
            return Err(Rejection::Unparseable);
        }
        if request.path.contains("..") {
            return Err(Rejection::PathTraversal);
        }
        if let Some(hostname) = &self.hostname {
            if request.host != *hostname {
                return Err(Rejection::HostMismatch);
            }
        }
        Ok(())
    }

    /// Produces the response for a validated request.
    pub async fn dispatch(&self, request: Request) -> Response {
        if let Some(capsule) = self.registry.lookup(&request.path) {
            let capsule = Arc::clone(capsule);
            let path = request.path.clone();

            return match tokio::task::spawn_blocking(move || capsule.handle(&request)).await {
                Ok(Ok(response)) => response,
                Ok(Err(e)) => {
                    tracing::error!(path = %path, error = %e, "Capsule failed");
                    Response::temporary_failure()
                }
                Err(e) => {
                    tracing::error!(path = %path, error = %e, "Capsule panicked");
                    Response::temporary_failure()
                }
            };
        }

        let content = match &self.files {
            Some(files) => files.resolve(&request).await,
            None => None,
        };

        match content {
            Some(body) => Response::success(body),
            None => Response::not_found(),
        }
    }
}
