//! HTTP client bindings, gated behind `client-reqwest`.

#[cfg(feature = "client-reqwest")]
pub mod reqwest;

#[cfg(feature = "client-reqwest")]
pub use self::reqwest::ReqwestMiddleware;
