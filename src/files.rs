//! Static document serving from a document root.
//!
//! Paths are not checked for traversal here. Requests whose path contains
//! `..` are rejected before they reach the resolver.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::gemini::request::Request;

/// Extensions tried, in order, for every request.
pub const EXTENSIONS: [&str; 3] = ["gmi", "gmni", "gemini"];

/// Document served for the root path.
const INDEX: &str = "index";

/// Resolves requests to Gemini documents under a root directory.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: PathBuf,
}

impl StaticFiles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Creates a resolver if `root` is set and non-empty.
    pub fn from_root(root: Option<&Path>) -> Option<Self> {
        root.filter(|root| !root.as_os_str().is_empty()).map(Self::new)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the document for `path`, without an extension.
    ///
    /// `/` and the empty path map to `<root>/index`. Otherwise all trailing
    /// slashes are stripped, so `/docs//` maps to `<root>/docs`.
    ///
    /// A path made only of slashes, such as `//`, also maps to `index`.
    /// Stripping it down to nothing would otherwise name `<root>.gmi`, a file
    /// beside the document root rather than inside it.
    pub fn base_path(&self, path: &str) -> PathBuf {
        let relative = path.trim_end_matches('/').trim_start_matches('/');
        if relative.is_empty() {
            self.root.join(INDEX)
        } else {
            self.root.join(relative)
        }
    }

    /// Candidate files for `path`, in lookup order.
    pub fn candidates(&self, path: &str) -> Vec<PathBuf> {
        let base = self.base_path(path);
        EXTENSIONS
            .iter()
            .map(|ext| {
                let mut file = OsString::from(base.as_os_str());
                file.push(".");
                file.push(ext);
                PathBuf::from(file)
            })
            .collect()
    }

    /// Reads the first existing candidate for the request.
    ///
    /// Returns `None` when no candidate exists or the file cannot be read.
    /// Every call reads from disk; nothing is cached.
    pub async fn resolve(&self, request: &Request) -> Option<Vec<u8>> {
        for candidate in self.candidates(&request.path) {
            let is_file = tokio::fs::metadata(&candidate)
                .await
                .map(|meta| meta.is_file())
                .unwrap_or(false);
            if !is_file {
                continue;
            }

            return match tokio::fs::read(&candidate).await {
                Ok(content) => Some(content),
                Err(e) => {
                    tracing::error!(
                        file = %candidate.display(),
                        error = %e,
                        "Failed to read document"
                    );
                    None
                }
            };
        }

        None
    }
}

/// Resolves a request against an optional document root.
pub async fn resolve(request: &Request, document_root: Option<&Path>) -> Option<Vec<u8>> {
    StaticFiles::from_root(document_root)?.resolve(request).await
}
