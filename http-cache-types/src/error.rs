use miette::Diagnostic;
use thiserror::Error;

/// A `Result` typedef to use with the [`CacheError`] type.
pub type Result<T> = std::result::Result<T, CacheError>;

/// A generic error for the HTTP cache decorator.
///
/// Per the recovery philosophy of this crate, backend faults and malformed
/// cache entries are never surfaced as a [`CacheError`] to a caller of
/// [`crate::CacheBackend::get`]/[`crate::CacheBackend::put`] — they are folded
/// into "miss" / "non-admission" at the call site. This type exists for
/// genuine construction-time and transport-time failures.
#[derive(Error, Diagnostic, Debug)]
pub enum CacheError {
    /// There was an error parsing the HTTP status code.
    #[error(transparent)]
    #[diagnostic(code(http_cache::invalid_status_code))]
    InvalidStatusCode(#[from] http::status::InvalidStatusCode),
    /// There was an error converting a header value to a string.
    #[error(transparent)]
    #[diagnostic(code(http_cache::header_to_str))]
    HeaderToStr(#[from] http::header::ToStrError),
    /// There was an error parsing the URL.
    #[error(transparent)]
    #[diagnostic(code(http_cache::invalid_url))]
    InvalidUrl(#[from] url::ParseError),
    /// There was an error parsing an HTTP header value.
    #[error(transparent)]
    #[diagnostic(code(http_cache::invalid_header_value))]
    InvalidHeaderValue(#[from] http::header::InvalidHeaderValue),
    /// There was an error parsing an HTTP header name.
    #[error(transparent)]
    #[diagnostic(code(http_cache::invalid_header_name))]
    InvalidHeaderName(#[from] http::header::InvalidHeaderName),
    /// There was an error building an `http::Response`/`http::Request`.
    #[error(transparent)]
    #[diagnostic(code(http_cache::http))]
    Http(#[from] http::Error),
    /// There was an error (de)serializing a settings blob as JSON.
    #[error(transparent)]
    #[diagnostic(code(http_cache::json))]
    Json(#[from] serde_json::Error),
    /// Error from the `reqwest` transport, surfaced unchanged to the caller.
    #[cfg(feature = "client-reqwest")]
    #[error(transparent)]
    #[diagnostic(code(http_cache::reqwest))]
    Reqwest(#[from] reqwest::Error),
    /// Error from the `reqwest-middleware` transport chain.
    #[cfg(feature = "client-reqwest")]
    #[error(transparent)]
    #[diagnostic(code(http_cache::reqwest_middleware))]
    ReqwestMiddleware(#[from] reqwest_middleware::Error),
    /// Error from the `cacache` disk-backed manager.
    #[cfg(feature = "manager-cacache")]
    #[error(transparent)]
    #[diagnostic(code(http_cache::cacache))]
    CaCache(#[from] cacache::Error),
    /// There was an error parsing the HTTP request version.
    #[error("unknown HTTP version")]
    #[diagnostic(code(http_cache::bad_version))]
    BadVersion,
    /// There was an error parsing a header value.
    #[error("error parsing header value")]
    #[diagnostic(code(http_cache::bad_header))]
    BadHeader,
    /// The request object could not be cloned (e.g. a streaming body).
    #[error(
        "request object is not cloneable, are you passing a streaming body?"
    )]
    #[diagnostic(code(http_cache::bad_request))]
    BadRequest,
}
