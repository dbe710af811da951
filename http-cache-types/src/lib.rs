//! Shared types consumed by `http-cache-core`: the [`HttpResponse`] value type,
//! the [`CacheBackend`] blob-store trait, and the [`Middleware`] HTTP-transport
//! abstraction. None of these types know anything about RFC 7234 — that logic
//! lives entirely in `http-cache-core`.

mod error;

use std::{collections::HashMap, convert::TryFrom, str::FromStr};

use http::{request, response};
use url::Url;

pub use error::{CacheError, Result};

#[cfg(feature = "manager-cacache")]
pub mod cacache_manager;
#[cfg(feature = "manager-moka")]
pub mod moka_manager;

#[cfg(feature = "manager-cacache")]
pub use cacache_manager::CACacheManager;
#[cfg(feature = "manager-moka")]
pub use moka_manager::MokaManager;

/// The protocol version of a request or response.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[non_exhaustive]
pub enum HttpVersion {
    /// HTTP/0.9
    #[serde(rename = "HTTP/0.9")]
    Http09,
    /// HTTP/1.0
    #[serde(rename = "HTTP/1.0")]
    Http10,
    /// HTTP/1.1
    #[serde(rename = "HTTP/1.1")]
    Http11,
    /// HTTP/2.0
    #[serde(rename = "HTTP/2.0")]
    H2,
    /// HTTP/3.0
    #[serde(rename = "HTTP/3.0")]
    H3,
}

use serde::{Deserialize, Serialize};

impl std::fmt::Display for HttpVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpVersion::Http09 => write!(f, "HTTP/0.9"),
            HttpVersion::Http10 => write!(f, "HTTP/1.0"),
            HttpVersion::Http11 => write!(f, "HTTP/1.1"),
            HttpVersion::H2 => write!(f, "HTTP/2.0"),
            HttpVersion::H3 => write!(f, "HTTP/3.0"),
        }
    }
}

impl TryFrom<http::Version> for HttpVersion {
    type Error = CacheError;

    fn try_from(value: http::Version) -> Result<Self> {
        Ok(match value {
            http::Version::HTTP_09 => HttpVersion::Http09,
            http::Version::HTTP_10 => HttpVersion::Http10,
            http::Version::HTTP_11 => HttpVersion::Http11,
            http::Version::HTTP_2 => HttpVersion::H2,
            http::Version::HTTP_3 => HttpVersion::H3,
            _ => return Err(CacheError::BadVersion),
        })
    }
}

impl From<HttpVersion> for http::Version {
    fn from(value: HttpVersion) -> Self {
        match value {
            HttpVersion::Http09 => http::Version::HTTP_09,
            HttpVersion::Http10 => http::Version::HTTP_10,
            HttpVersion::Http11 => http::Version::HTTP_11,
            HttpVersion::H2 => http::Version::HTTP_2,
            HttpVersion::H3 => http::Version::HTTP_3,
        }
    }
}

/// A basic generic type representing an HTTP response, with multi-valued,
/// case-insensitive, order-preserving headers.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpResponse {
    /// HTTP response body.
    pub body: Vec<u8>,
    /// HTTP response headers, keyed by lowercased header name.
    pub headers: HashMap<String, Vec<String>>,
    /// HTTP response status code.
    pub status: u16,
    /// The URL the response was fetched from.
    pub url: Url,
    /// HTTP response version.
    pub version: HttpVersion,
}

impl HttpResponse {
    /// Returns the first value of a header, case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .and_then(|v| v.first())
            .map(String::as_str)
    }

    /// Returns every value of a header, in insertion order.
    #[must_use]
    pub fn header_values(&self, name: &str) -> Vec<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(|v| v.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Inserts a header value, replacing any existing values.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.insert(name.to_ascii_lowercase(), vec![value.into()]);
    }

    /// Appends a header value, preserving existing values for the same name.
    pub fn append_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers
            .entry(name.to_ascii_lowercase())
            .or_default()
            .push(value.into());
    }

    /// Removes every value of a header.
    pub fn remove_header(&mut self, name: &str) {
        self.headers.remove(&name.to_ascii_lowercase());
    }

    /// Returns `http::response::Parts` built from this response's status and
    /// headers, for callers that need to interoperate with `http`-based code.
    pub fn parts(&self) -> Result<response::Parts> {
        let mut builder = response::Builder::new().status(self.status);
        if let Some(headers) = builder.headers_mut() {
            for (name, values) in &self.headers {
                let header_name = http::header::HeaderName::from_str(name)?;
                for value in values {
                    headers.append(
                        header_name.clone(),
                        http::HeaderValue::from_str(value)?,
                    );
                }
            }
        }
        Ok(builder.body(())?.into_parts().0)
    }
}

/// A blob store with TTL expiry: `get(key) -> string | null`,
/// `set(key, value, ttlSeconds)`, `clear()`. The backend owns eviction;
/// `http-cache-core` never deletes an entry on its own and never fails a
/// caller-visible request because of a backend fault.
#[async_trait::async_trait]
pub trait CacheBackend: Send + Sync + 'static {
    /// Looks up a previously stored blob. `Ok(None)` means "no such key or it
    /// expired"; an `Err` should be treated as a miss by the caller.
    async fn get(&self, key: &str) -> Result<Option<String>>;
    /// Stores a blob under `key` with an advisory TTL in seconds.
    async fn set(&self, key: &str, value: String, ttl_seconds: u64)
        -> Result<()>;
    /// Drops every entry in the backend.
    async fn clear(&self) -> Result<()>;
}

/// Describes the functionality required for interfacing with HTTP client
/// transports. Modeled as a function-shaped dependency rather than
/// subclassing, so any client (reqwest, surf, a hand-rolled test double) can
/// implement it.
#[async_trait::async_trait]
pub trait Middleware: Send {
    /// The request method, e.g. `"GET"`.
    fn method(&self) -> Result<String>;
    /// The request's protocol version string, e.g. `"1.1"` or `"2"`.
    fn http_version(&self) -> Result<String>;
    /// The absolute request URI.
    fn url(&self) -> Result<Url>;
    /// Every value of a request header, in the order they were set.
    fn header_values(&self, name: &str) -> Vec<String>;
    /// `http::request::Parts` for the current request, used to build a
    /// `Vary` projection and for hashing.
    fn parts(&self) -> Result<request::Parts>;
    /// Sets a request header, replacing any existing values.
    fn set_header(&mut self, name: &str, value: &str) -> Result<()>;
    /// Removes every value of a request header.
    fn remove_header(&mut self, name: &str);
    /// Sends the request to the origin and returns the response.
    async fn remote_fetch(&mut self) -> Result<HttpResponse>;
}
