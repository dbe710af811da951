//! An RFC 7234-conformant HTTP caching decorator wrapping an arbitrary HTTP
//! client, backed by a pluggable string-keyed blob store.
//!
//! The public surface is a single [`Cache::send`] call: hand it something
//! that implements [`Middleware`], get back an [`HttpResponse`], and the
//! cache transparently decides whether to serve a stored copy, revalidate
//! it, or forward to the origin and (maybe) store the result.

pub mod config;
pub mod directives;
pub mod gatekeeper;
pub mod keys;
pub mod serializer;
pub mod settings;
pub mod storability;

#[cfg(feature = "client-reqwest")]
pub mod middleware;

pub use config::CacheConfig;
pub use gatekeeper::GateDecision;
pub use keys::{Blake3Hasher, CacheKeyHasher};
pub use settings::{CacheControlFlags, CacheSettings};

pub use http_cache_types::{CacheBackend, CacheError, HttpResponse, HttpVersion, Middleware, Result};
#[cfg(feature = "manager-cacache")]
pub use http_cache_types::CACacheManager;
#[cfg(feature = "manager-moka")]
pub use http_cache_types::MokaManager;

/// Everything this engine needs to know about the request in flight, pinned
/// once at the top of [`Cache::send`] so later steps don't have to reread
/// headers whose meaning could drift if the request were mutated first
/// (the revalidation step adds conditional headers before the fallback
/// forward, for instance).
struct RequestContext {
    no_store: bool,
    has_authorization: bool,
    private_token: Option<String>,
}

impl RequestContext {
    fn capture<M: Middleware>(middleware: &M, private_header: &str) -> Self {
        let cc = directives::parse_cache_control_tokens(
            &middleware.header_values("cache-control"),
        );
        Self {
            no_store: cc.contains_key("no-store"),
            has_authorization: !middleware.header_values("authorization").is_empty(),
            private_token: middleware
                .header_values(private_header)
                .into_iter()
                .next(),
        }
    }
}

/// The caching decorator. Wraps a [`CacheBackend`] blob store and a
/// [`CacheKeyHasher`], plus tunable [`CacheConfig`].
pub struct Cache<B: CacheBackend, H: CacheKeyHasher = Blake3Hasher> {
    backend: B,
    hasher: H,
    config: CacheConfig,
}

impl<B: CacheBackend> Cache<B, Blake3Hasher> {
    /// Creates a cache with the default hasher and default configuration.
    pub fn new(backend: B) -> Self {
        Self { backend, hasher: Blake3Hasher, config: CacheConfig::default() }
    }
}

impl<B: CacheBackend, H: CacheKeyHasher> Cache<B, H> {
    /// Creates a cache with an explicit hasher.
    pub fn with_hasher(backend: B, hasher: H) -> Self {
        Self { backend, hasher, config: CacheConfig::default() }
    }

    /// Returns this cache with `config` applied instead of the default.
    #[must_use]
    pub fn with_config(mut self, config: CacheConfig) -> Self {
        self.config = config;
        self
    }

    /// The current configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// The backend this cache stores blobs in.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Forwards the request to the origin, first stripping the private-scope
    /// header so it's never visible downstream, and returns the response
    /// verbatim without touching the cache.
    async fn forward_only<M: Middleware>(
        &self,
        middleware: &mut M,
    ) -> Result<HttpResponse> {
        middleware.remove_header(&self.config.private_cache_key_header);
        middleware.remote_fetch().await
    }

    /// Forwards, then attempts to admit the response to the cache.
    async fn forward_and_maybe_store<M: Middleware>(
        &self,
        middleware: &mut M,
        ctx: &RequestContext,
    ) -> Result<HttpResponse> {
        let response = self.forward_only(middleware).await?;
        self.store_if_eligible(middleware, &response, ctx).await;
        Ok(response)
    }

    /// Derives settings from `response`, runs the storability filter, and
    /// writes the settings+response blobs (with identical TTL) if eligible.
    /// Never fails the caller-visible request — admission faults only log.
    async fn store_if_eligible<M: Middleware>(
        &self,
        middleware: &mut M,
        response: &HttpResponse,
        ctx: &RequestContext,
    ) {
        let new_settings = settings::CacheSettings::from_response(response);
        let is_private_scoped =
            new_settings.cache_control.private || ctx.has_authorization;
        let now = (self.config.now)();

        let Some(serialized) = serializer::serialize_response(response) else {
            log::debug!(
                "response body for {} is not valid UTF-8, skipping admission",
                response.url
            );
            return;
        };
        let size = serialized.len();

        let storable = storability::is_storable(
            response,
            &new_settings,
            ctx.no_store,
            is_private_scoped,
            ctx.private_token.is_some(),
            now,
            self.config.max_ttl,
            Some(size),
            self.config.max_cache_item_size,
        );
        if !storable {
            log::trace!("response for {} is not storable", response.url);
            return;
        }

        let ttl = storability::ttl_for(&new_settings, now, self.config.max_ttl);
        let vary_projection = keys::vary_projection(&new_settings.vary, |name| {
            middleware.header_values(name)
        });
        let scope_token =
            if is_private_scoped { ctx.private_token.as_deref() } else { None };
        let settings_key = keys::settings_key(&self.hasher, &response.url);
        let response_key = keys::response_key(
            &self.hasher,
            &response.url,
            &vary_projection,
            scope_token,
        );

        match new_settings.to_json() {
            Ok(json) => {
                if let Err(err) = self.backend.set(&settings_key, json, ttl).await {
                    log::debug!("failed writing settings blob: {err}");
                }
            }
            Err(err) => log::debug!("failed encoding settings blob: {err}"),
        }
        if let Err(err) = self.backend.set(&response_key, serialized, ttl).await {
            log::debug!("failed writing response blob: {err}");
        }
        log::debug!("admitted {} with ttl={}s", response.url, ttl);
    }

    /// Runs a request through the caching decision engine and returns the
    /// response the caller should see.
    pub async fn send<M: Middleware>(&self, mut middleware: M) -> Result<HttpResponse> {
        let method = middleware.method()?;
        let http_version = middleware.http_version()?;
        let url = middleware.url()?;

        if gatekeeper::classify(&method, &http_version, |name| {
            middleware.header_values(name)
        }) == GateDecision::Bypass
        {
            log::debug!("bypassing cache for {method} {url}");
            return self.forward_only(&mut middleware).await;
        }

        let ctx =
            RequestContext::capture(&middleware, &self.config.private_cache_key_header);

        let settings_key = keys::settings_key(&self.hasher, &url);
        let stored_settings = match self.backend.get(&settings_key).await {
            Ok(Some(blob)) => settings::CacheSettings::from_json(&blob),
            Ok(None) => None,
            Err(err) => {
                log::debug!("settings lookup failed, treating as miss: {err}");
                None
            }
        };

        let Some(settings) = stored_settings else {
            log::debug!("no stored settings for {url}, forwarding");
            return self.forward_and_maybe_store(&mut middleware, &ctx).await;
        };

        if settings.cache_control.no_store {
            log::debug!("stored settings carry no-store for {url}, forwarding");
            return self.forward_and_maybe_store(&mut middleware, &ctx).await;
        }

        if settings.vary_is_wildcard() {
            log::debug!("stored Vary: * for {url}, forwarding without storing");
            return self.forward_only(&mut middleware).await;
        }

        let now = (self.config.now)();

        if let Some(expires) = settings.expires {
            if expires < now {
                log::debug!("stored entry for {url} absolutely expired, forwarding");
                return self.forward_and_maybe_store(&mut middleware, &ctx).await;
            }
        }

        if let Some(date) = settings.date {
            let request_cc = directives::parse_cache_control_tokens(
                &middleware.header_values("cache-control"),
            );
            if let Some(req_max_age) = request_cc.get("max-age") {
                let req_max_age = directives::coerce_int(Some(req_max_age));
                if (now - date) > req_max_age {
                    log::debug!(
                        "request max-age constraint violated for {url}, forwarding"
                    );
                    return self.forward_and_maybe_store(&mut middleware, &ctx).await;
                }
            }
            if let Some(min_fresh) = request_cc.get("min-fresh") {
                let min_fresh = directives::coerce_int(Some(min_fresh));
                if let Some(stored_max_age) = settings.cache_control.max_age {
                    if stored_max_age < (now - date) + min_fresh {
                        log::debug!(
                            "request min-fresh constraint violated for {url}, forwarding"
                        );
                        return self
                            .forward_and_maybe_store(&mut middleware, &ctx)
                            .await;
                    }
                }
            }
        }

        let is_private_scoped =
            settings.cache_control.private || ctx.has_authorization;
        if is_private_scoped && ctx.private_token.is_none() {
            log::debug!(
                "private-scoped entry for {url} with no caller token, forwarding without storing"
            );
            return self.forward_only(&mut middleware).await;
        }

        let vary_projection =
            keys::vary_projection(&settings.vary, |name| middleware.header_values(name));

        if settings.cache_control.must_revalidate {
            if let Some(etag) = &settings.etag {
                middleware.set_header("if-none-match", etag)?;
            }
            if let Some(last_modified) = settings.last_modified {
                middleware.set_header(
                    "if-modified-since",
                    &directives::format_http_date(last_modified),
                )?;
            }
            let response = self.forward_only(&mut middleware).await?;
            if response.status != 304 {
                log::debug!("revalidation for {url} returned a fresh response");
                self.store_if_eligible(&mut middleware, &response, &ctx).await;
                return Ok(response);
            }
            log::debug!("revalidation for {url} confirmed 304, serving cached body");
        }

        // Conditional headers set above must not leak into a fallback forward
        // below (the evicted-cache-entry case re-fetches unconditionally).
        middleware.remove_header("if-none-match");
        middleware.remove_header("if-modified-since");

        let scope_token =
            if is_private_scoped { ctx.private_token.as_deref() } else { None };
        let response_key = keys::response_key(
            &self.hasher,
            &url,
            &vary_projection,
            scope_token,
        );

        let blob = match self.backend.get(&response_key).await {
            Ok(Some(blob)) => blob,
            Ok(None) => {
                log::debug!("response blob missing for {url}, forwarding");
                return self.forward_and_maybe_store(&mut middleware, &ctx).await;
            }
            Err(err) => {
                log::debug!("response blob lookup failed for {url}: {err}");
                return self.forward_and_maybe_store(&mut middleware, &ctx).await;
            }
        };

        let Some(mut response) = serializer::deserialize_response(&blob, url.clone())
        else {
            log::debug!("response blob for {url} is malformed, forwarding");
            return self.forward_and_maybe_store(&mut middleware, &ctx).await;
        };

        if let Some(date) = settings.date {
            let age = now - date;
            if age > 0 {
                response.set_header("age", age.to_string());
            }
        }
        log::debug!("serving {url} from cache");
        Ok(response)
    }
}

impl<B: CacheBackend + std::fmt::Debug, H: CacheKeyHasher> std::fmt::Debug for Cache<B, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache")
            .field("backend", &self.backend)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
