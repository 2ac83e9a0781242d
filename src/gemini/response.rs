use std::fmt;

/// Default media type of a successful response.
pub const DEFAULT_MEDIA_TYPE: &str = "text/gemini";
/// Default language of a successful response.
pub const DEFAULT_LANGUAGE: &str = "en";
/// Default charset of a successful response.
pub const DEFAULT_CHARSET: &str = "utf-8";

/// The class of a status code, given by its first digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// 1x
    Input,
    /// 2x
    Success,
    /// 3x
    Redirect,
    /// 4x
    TemporaryFailure,
    /// 5x
    PermanentFailure,
    /// 6x
    ClientCertificate,
}

/// Gemini status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 10 INPUT
    Input,
    /// 11 SENSITIVE_INPUT
    SensitiveInput,
    /// 20 SUCCESS
    Success,
    /// 30 REDIRECT_TEMPORARY
    RedirectTemporary,
    /// 31 REDIRECT_PERMANENT
    RedirectPermanent,
    /// 40 TEMPORARY_FAILURE
    TemporaryFailure,
    /// 41 SERVER_UNAVAILABLE
    ServerUnavailable,
    /// 42 CGI_ERROR
    CgiError,
    /// 43 PROXY_ERROR
    ProxyError,
    /// 44 SLOW_DOWN
    SlowDown,
    /// 50 PERMANENT_FAILURE
    PermanentFailure,
    /// 51 NOT_FOUND
    NotFound,
    /// 52 GONE
    Gone,
    /// 53 PROXY_REQUEST_REFUSED
    ProxyRequestRefused,
    /// 59 BAD_REQUEST
    BadRequest,
    /// 60 CLIENT_CERTIFICATE_REQUIRED
    ClientCertificateRequired,
    /// 61 CERTIFICATE_NOT_AUTHORISED
    CertificateNotAuthorised,
    /// 62 CERTIFICATE_NOT_VALID
    CertificateNotValid,
}

impl StatusCode {
    /// Every status, in wire-code order.
    pub const ALL: [StatusCode; 18] = [
        StatusCode::Input,
        StatusCode::SensitiveInput,
        StatusCode::Success,
        StatusCode::RedirectTemporary,
        StatusCode::RedirectPermanent,
        StatusCode::TemporaryFailure,
        StatusCode::ServerUnavailable,
        StatusCode::CgiError,
        StatusCode::ProxyError,
        StatusCode::SlowDown,
        StatusCode::PermanentFailure,
        StatusCode::NotFound,
        StatusCode::Gone,
        StatusCode::ProxyRequestRefused,
        StatusCode::BadRequest,
        StatusCode::ClientCertificateRequired,
        StatusCode::CertificateNotAuthorised,
        StatusCode::CertificateNotValid,
    ];

    /// Returns the two-digit wire code.
    ///
    /// # Example
    ///
    /// ```
    /// # use gemlet::gemini::response::StatusCode;
    /// assert_eq!(StatusCode::Success.code(), 20);
    /// assert_eq!(StatusCode::NotFound.code(), 51);
    /// ```
    pub fn code(&self) -> u8 {
        match self {
            StatusCode::Input => 10,
            StatusCode::SensitiveInput => 11,
            StatusCode::Success => 20,
            StatusCode::RedirectTemporary => 30,
            StatusCode::RedirectPermanent => 31,
            StatusCode::TemporaryFailure => 40,
            StatusCode::ServerUnavailable => 41,
            StatusCode::CgiError => 42,
            StatusCode::ProxyError => 43,
            StatusCode::SlowDown => 44,
            StatusCode::PermanentFailure => 50,
            StatusCode::NotFound => 51,
            StatusCode::Gone => 52,
            StatusCode::ProxyRequestRefused => 53,
            StatusCode::BadRequest => 59,
            StatusCode::ClientCertificateRequired => 60,
            StatusCode::CertificateNotAuthorised => 61,
            StatusCode::CertificateNotValid => 62,
        }
    }

    /// Looks up a status by its wire code.
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.code() == code)
    }

    pub fn category(&self) -> Category {
        match self.code() / 10 {
            1 => Category::Input,
            2 => Category::Success,
            3 => Category::Redirect,
            4 => Category::TemporaryFailure,
            5 => Category::PermanentFailure,
            _ => Category::ClientCertificate,
        }
    }

    /// Returns the protocol name of the status, e.g. `NOT_FOUND`.
    pub fn name(&self) -> &'static str {
        match self {
            StatusCode::Input => "INPUT",
            StatusCode::SensitiveInput => "SENSITIVE_INPUT",
            StatusCode::Success => "SUCCESS",
            StatusCode::RedirectTemporary => "REDIRECT_TEMPORARY",
            StatusCode::RedirectPermanent => "REDIRECT_PERMANENT",
            StatusCode::TemporaryFailure => "TEMPORARY_FAILURE",
            StatusCode::ServerUnavailable => "SERVER_UNAVAILABLE",
            StatusCode::CgiError => "CGI_ERROR",
            StatusCode::ProxyError => "PROXY_ERROR",
            StatusCode::SlowDown => "SLOW_DOWN",
            StatusCode::PermanentFailure => "PERMANENT_FAILURE",
            StatusCode::NotFound => "NOT_FOUND",
            StatusCode::Gone => "GONE",
            StatusCode::ProxyRequestRefused => "PROXY_REQUEST_REFUSED",
            StatusCode::BadRequest => "BAD_REQUEST",
            StatusCode::ClientCertificateRequired => "CLIENT_CERTIFICATE_REQUIRED",
            StatusCode::CertificateNotAuthorised => "CERTIFICATE_NOT_AUTHORISED",
            StatusCode::CertificateNotValid => "CERTIFICATE_NOT_VALID",
        }
    }

    pub fn is_success(&self) -> bool {
        *self == StatusCode::Success
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A Gemini response ready to be sent to a client.
///
/// `media_type`, `language` and `charset` only matter for [`StatusCode::Success`];
/// every other status sends `meta` as free text on the status line instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: StatusCode,
    pub media_type: String,
    pub language: String,
    pub charset: String,
    /// Status line text for non-success responses (prompt, redirect target, ...)
    pub meta: String,
    pub body: Vec<u8>,
}

impl Default for Response {
    fn default() -> Self {
        Self {
            status: StatusCode::Success,
            media_type: DEFAULT_MEDIA_TYPE.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            charset: DEFAULT_CHARSET.to_string(),
            meta: String::new(),
            body: Vec::new(),
        }
    }
}

/// Builder for constructing Gemini responses in a fluent style.
///
/// # Example
///
/// ```
/// # use gemlet::gemini::response::{ResponseBuilder, StatusCode};
/// let response = ResponseBuilder::new(StatusCode::Success)
///     .media_type("text/plain")
///     .body("hello")
///     .build();
/// assert_eq!(response.media_type, "text/plain");
/// ```
pub struct ResponseBuilder {
    response: Response,
}

impl ResponseBuilder {
    /// Creates a new response builder with the specified status and the
    /// default `text/gemini; lang=en; charset=utf-8` metadata.
    pub fn new(status: StatusCode) -> Self {
        Self {
            response: Response {
                status,
                ..Response::default()
            },
        }
    }

    pub fn media_type(mut self, media_type: impl Into<String>) -> Self {
        self.response.media_type = media_type.into();
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.response.language = language.into();
        self
    }

    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.response.charset = charset.into();
        self
    }

    /// Sets the free-text meta. CR and LF are removed so the status line
    /// stays a single line.
    pub fn meta(mut self, meta: impl Into<String>) -> Self {
        let mut meta = meta.into();
        meta.retain(|c| c != '\r' && c != '\n');
        self.response.meta = meta;
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.response.body = body.into();
        self
    }

    pub fn build(self) -> Response {
        self.response
    }
}

impl Response {
    /// Creates a `20` response with the default metadata.
    pub fn success(body: impl Into<Vec<u8>>) -> Self {
        ResponseBuilder::new(StatusCode::Success).body(body).build()
    }

    /// Creates a `10` response asking the client for input.
    pub fn input(prompt: impl Into<String>) -> Self {
        Self::with_meta(StatusCode::Input, prompt)
    }

    /// Creates an `11` response asking for input that should not be echoed.
    pub fn sensitive_input(prompt: impl Into<String>) -> Self {
        Self::with_meta(StatusCode::SensitiveInput, prompt)
    }

    /// Creates a `30` redirect to `target`.
    pub fn redirect(target: impl Into<String>) -> Self {
        Self::with_meta(StatusCode::RedirectTemporary, target)
    }

    /// Creates a `31` redirect to `target`.
    pub fn redirect_permanent(target: impl Into<String>) -> Self {
        Self::with_meta(StatusCode::RedirectPermanent, target)
    }

    /// Creates a `51` response with empty meta.
    pub fn not_found() -> Self {
        Self::with_meta(StatusCode::NotFound, "")
    }

    /// Creates a `59` response with empty meta.
    pub fn bad_request() -> Self {
        Self::with_meta(StatusCode::BadRequest, "")
    }

    /// Creates a `40` response with empty meta.
    pub fn temporary_failure() -> Self {
        Self::with_meta(StatusCode::TemporaryFailure, "")
    }

    /// Creates a bodyless response with the given status and meta text.
    pub fn with_meta(status: StatusCode, meta: impl Into<String>) -> Self {
        ResponseBuilder::new(status).meta(meta).build()
    }
}
