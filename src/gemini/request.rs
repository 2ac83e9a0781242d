use std::borrow::Cow;
use std::fmt;

use percent_encoding::percent_decode_str;

use crate::gemini::parser::parse_request_line;

/// A parsed Gemini request line.
///
/// Every field defaults to the empty string when the corresponding part is
/// absent. A line that does not look like `scheme://host[:port][/path][?query]`
/// at all produces a request where every parsed field is empty; use
/// [`Request::is_empty`] to tell that case apart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    /// The raw line as received, without the line terminator
    pub raw: String,
    /// URL scheme, normally `gemini`
    pub scheme: String,
    /// Host name, lowercase letters, digits, `-` and `.`
    pub host: String,
    /// Port digits without the leading colon
    pub port: String,
    /// Path starting with `/`, or empty
    pub path: String,
    /// Query without the leading `?`, not percent-decoded
    pub query: String,
}

/// Builder for constructing Request objects.
#[derive(Debug, Default)]
pub struct RequestBuilder {
    scheme: Option<String>,
    host: Option<String>,
    port: Option<String>,
    path: Option<String>,
    query: Option<String>,
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = Some(scheme.into());
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn port(mut self, port: impl Into<String>) -> Self {
        self.port = Some(port.into());
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Builds the request, rendering `raw` from the parts that were set.
    pub fn build(self) -> Request {
        let mut request = Request {
            raw: String::new(),
            scheme: self.scheme.unwrap_or_else(|| "gemini".to_string()),
            host: self.host.unwrap_or_default(),
            port: self.port.unwrap_or_default(),
            path: self.path.unwrap_or_default(),
            query: self.query.unwrap_or_default(),
        };
        request.raw = request.to_string();
        request
    }
}

impl Request {
    /// Parses a raw request line. Never fails; see [`Request::is_empty`].
    pub fn parse(line: &str) -> Self {
        parse_request_line(line)
    }

    /// Returns `true` when the line did not match the request shape.
    ///
    /// A matching line always has a non-empty scheme and host, so an empty
    /// host is enough to recognize the "no match" record.
    pub fn is_empty(&self) -> bool {
        self.scheme.is_empty() && self.host.is_empty()
    }

    /// Returns the port as a number, if one was given.
    pub fn port_number(&self) -> Option<u16> {
        self.port.parse().ok()
    }

    /// Returns the query with percent-escapes decoded.
    ///
    /// Invalid UTF-8 sequences are replaced rather than rejected.
    pub fn decoded_query(&self) -> Cow<'_, str> {
        percent_decode_str(&self.query).decode_utf8_lossy()
    }

    /// Returns the path used for handler lookup: one trailing slash removed
    /// unless the path is exactly `/`, and the empty path mapped to `/`.
    pub fn normalized_path(&self) -> &str {
        normalize_path(&self.path)
    }
}

/// Strips a single trailing slash from `path`, keeping `/` as-is.
///
/// The empty path, as in `gemini://host`, is looked up as `/` so a capsule
/// registered at the root also answers a bare host. Without this the empty
/// key could never match, because registered prefixes are never empty.
pub fn normalize_path(path: &str) -> &str {
    match path {
        "" => "/",
        "/" => path,
        _ => path.strip_suffix('/').unwrap_or(path),
    }
}

impl fmt::Display for Request {
    /// Renders the request back into URL form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return Ok(());
        }
        write!(f, "{}://{}", self.scheme, self.host)?;
        if !self.port.is_empty() {
            write!(f, ":{}", self.port)?;
        }
        f.write_str(&self.path)?;
        if !self.query.is_empty() {
            write!(f, "?{}", self.query)?;
        }
        Ok(())
    }
}
