//! Capsules shipped with the server, enabled from the `capsules:` list of
//! the configuration.

use std::sync::Arc;

use crate::capsule::{Capsule, Registry, RegistryBuilder};
use crate::config::CapsuleConfig;
use crate::gemini::request::Request;
use crate::gemini::response::Response;

/// Asks for input, then echoes it back.
pub struct Echo;

impl Capsule for Echo {
    fn handle(&self, request: &Request) -> anyhow::Result<Response> {
        if request.query.is_empty() {
            return Ok(Response::input("Say something"));
        }

        let text = request.decoded_query();
        Ok(Response::success(format!("# Echo\n\n> {text}\n")))
    }
}

/// Static page describing the server.
pub struct About {
    page: String,
}

impl About {
    pub fn new() -> Self {
        let page = format!(
            "# {} {}\n\nA small Gemini server.\n\n=> / Home\n",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION"),
        );
        Self { page }
    }
}

impl Default for About {
    fn default() -> Self {
        Self::new()
    }
}

impl Capsule for About {
    fn handle(&self, _request: &Request) -> anyhow::Result<Response> {
        Ok(Response::success(self.page.clone()))
    }
}

/// Names accepted by [`by_name`].
pub const NAMES: [&str; 2] = ["about", "echo"];

/// Looks up a built-in capsule by its configuration name.
pub fn by_name(name: &str) -> Option<Arc<dyn Capsule>> {
    match name {
        "about" => Some(Arc::new(About::new())),
        "echo" => Some(Arc::new(Echo)),
        _ => None,
    }
}

/// Builds the registry for the configured capsules.
///
/// Fails on an unknown capsule name or a path registered twice.
pub fn registry(capsules: &[CapsuleConfig]) -> anyhow::Result<Registry> {
    let mut builder = RegistryBuilder::new();
    for entry in capsules {
        let capsule = by_name(&entry.capsule)
            .ok_or_else(|| anyhow::anyhow!("unknown capsule '{}'", entry.capsule))?;
        builder.register_arc(&entry.path, capsule)?;
    }
    Ok(builder.build())
}
