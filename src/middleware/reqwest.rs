//! The `reqwest`/`reqwest-middleware` transport binding, behind the
//! `client-reqwest` feature.
//!
//! ```no_run
//! use reqwest::Client;
//! use reqwest_middleware::ClientBuilder;
//! use http_cache_core::{Cache, MokaManager};
//!
//! # #[tokio::main]
//! # async fn main() -> reqwest_middleware::Result<()> {
//! let client = ClientBuilder::new(Client::new())
//!     .with(Cache::new(MokaManager::default()))
//!     .build();
//! client.get("https://example.com").send().await?;
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::convert::TryInto;
use std::str::FromStr;

use http::{request, HeaderName, HeaderValue};
use url::Url;

use crate::{Cache, CacheError, HttpResponse, HttpVersion, Middleware, Result};
use http_cache_types::CacheBackend;
use crate::CacheKeyHasher;

fn version_to_wire_string(version: http::Version) -> &'static str {
    match version {
        http::Version::HTTP_09 => "0.9",
        http::Version::HTTP_10 => "1.0",
        http::Version::HTTP_11 => "1.1",
        http::Version::HTTP_2 => "2",
        http::Version::HTTP_3 => "3",
        _ => "1.1",
    }
}

/// Adapts a `reqwest::Request` plus the remaining middleware chain to this
/// crate's [`Middleware`] trait.
pub struct ReqwestMiddleware<'a> {
    pub(crate) req: reqwest::Request,
    pub(crate) next: reqwest_middleware::Next<'a>,
}

#[async_trait::async_trait]
impl Middleware for ReqwestMiddleware<'_> {
    fn method(&self) -> Result<String> {
        Ok(self.req.method().as_str().to_string())
    }

    fn http_version(&self) -> Result<String> {
        Ok(version_to_wire_string(self.req.version()).to_string())
    }

    fn url(&self) -> Result<Url> {
        Ok(self.req.url().clone())
    }

    fn header_values(&self, name: &str) -> Vec<String> {
        self.req
            .headers()
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok().map(str::to_string))
            .collect()
    }

    fn parts(&self) -> Result<request::Parts> {
        let mut builder = http::Request::builder()
            .method(self.req.method().clone())
            .uri(self.req.url().as_str())
            .version(self.req.version());
        if let Some(headers) = builder.headers_mut() {
            for (name, value) in self.req.headers() {
                headers.append(name.clone(), value.clone());
            }
        }
        Ok(builder.body(())?.into_parts().0)
    }

    fn set_header(&mut self, name: &str, value: &str) -> Result<()> {
        let header_name = HeaderName::from_str(name)?;
        let header_value = HeaderValue::from_str(value)?;
        self.req.headers_mut().insert(header_name, header_value);
        Ok(())
    }

    fn remove_header(&mut self, name: &str) {
        if let Ok(header_name) = HeaderName::from_str(name) {
            self.req.headers_mut().remove(header_name);
        }
    }

    async fn remote_fetch(&mut self) -> Result<HttpResponse> {
        let copied_req = self.req.try_clone().ok_or(CacheError::BadRequest)?;
        let mut extensions = http::Extensions::new();
        let res = self
            .next
            .clone()
            .run(copied_req, &mut extensions)
            .await
            .map_err(CacheError::from)?;

        let mut headers: HashMap<String, Vec<String>> = HashMap::new();
        for (name, value) in res.headers() {
            headers
                .entry(name.as_str().to_ascii_lowercase())
                .or_default()
                .push(value.to_str()?.to_string());
        }
        let url = res.url().clone();
        let status = res.status().as_u16();
        let version: HttpVersion = res.version().try_into()?;
        let body = res.bytes().await.map_err(CacheError::from)?.to_vec();

        Ok(HttpResponse { body, headers, status, url, version })
    }
}

#[async_trait::async_trait]
impl<B, H> reqwest_middleware::Middleware for Cache<B, H>
where
    B: CacheBackend + 'static,
    H: CacheKeyHasher + 'static,
{
    async fn handle(
        &self,
        req: reqwest::Request,
        _extensions: &mut http::Extensions,
        next: reqwest_middleware::Next<'_>,
    ) -> std::result::Result<reqwest::Response, reqwest_middleware::Error> {
        let middleware = ReqwestMiddleware { req, next };
        let response = self
            .send(middleware)
            .await
            .map_err(reqwest_middleware::Error::middleware)?;

        let mut builder =
            http::Response::builder().status(response.status).version(response.version.into());
        if let Some(headers) = builder.headers_mut() {
            for (name, values) in &response.headers {
                let header_name = HeaderName::from_str(name)
                    .map_err(|e| reqwest_middleware::Error::middleware(CacheError::from(e)))?;
                for value in values {
                    let header_value = HeaderValue::from_str(value).map_err(|e| {
                        reqwest_middleware::Error::middleware(CacheError::from(e))
                    })?;
                    headers.append(header_name.clone(), header_value);
                }
            }
        }
        let http_response = builder
            .body(reqwest::Body::from(response.body))
            .map_err(|e| reqwest_middleware::Error::middleware(CacheError::from(e)))?;
        Ok(reqwest::Response::from(http_response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MokaManager;
    use reqwest::Client;
    use reqwest_middleware::ClientBuilder;

    #[tokio::test]
    async fn caches_a_public_response() -> anyhow::Result<()> {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/")
            .with_status(200)
            .with_header("cache-control", "max-age=86400, public")
            .with_body("hit me once")
            .expect(1)
            .create_async()
            .await;

        let client = ClientBuilder::new(Client::new())
            .with(Cache::new(MokaManager::default()))
            .build();

        let url = format!("{}/", server.url());
        let first = client.get(&url).send().await?;
        assert_eq!(first.status(), 200);
        let second = client.get(&url).send().await?;
        assert_eq!(second.status(), 200);

        mock.assert_async().await;
        Ok(())
    }
}
