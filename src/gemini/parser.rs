use crate::gemini::request::Request;

/// Maximum length of a request URL in bytes, excluding the line terminator.
pub const MAX_REQUEST_LINE: usize = 1024;

/// Parses one request line of the shape `scheme://host[:port][/path][?query]`.
///
/// Lines that do not match produce a [`Request`] whose parsed fields are all
/// empty. There is no error channel; callers judge validity themselves.
pub fn parse_request_line(line: &str) -> Request {
    let raw = line.trim();
    let mut request = match_parts(raw).unwrap_or_default();
    request.raw = raw.to_string();
    request
}

fn match_parts(line: &str) -> Option<Request> {
    let (scheme, rest) = line.split_once("://")?;
    if scheme.is_empty() || !scheme.chars().all(is_scheme_char) {
        return None;
    }

    let host_end = rest.find(|c: char| !is_host_char(c)).unwrap_or(rest.len());
    let (host, mut rest) = rest.split_at(host_end);
    if host.is_empty() {
        return None;
    }

    let mut port = "";
    if let Some(after_colon) = rest.strip_prefix(':') {
        let digits = after_colon
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(after_colon.len());
        if digits == 0 {
            return None;
        }
        port = &after_colon[..digits];
        rest = &after_colon[digits..];
    }

    let (path, query) = match rest.chars().next() {
        None => ("", ""),
        Some('/') | Some('?') => rest.split_once('?').unwrap_or((rest, "")),
        Some(_) => return None,
    };

    Some(Request {
        raw: String::new(),
        scheme: scheme.to_string(),
        host: host.to_string(),
        port: port.to_string(),
        path: path.trim().to_string(),
        query: query.trim().to_string(),
    })
}

fn is_scheme_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')
}

fn is_host_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '.')
}

/// Returns the index of the first `\n` in `buf`, if a full line has arrived.
pub fn find_line_end(buf: &[u8]) -> Option<usize> {
    buf.iter().position(|&b| b == b'\n')
}
