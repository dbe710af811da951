//! TTL derivation and the storability admission check: whether an origin
//! response is allowed into the cache at all, and for how long.

use crate::settings::CacheSettings;
use http_cache_types::HttpResponse;

/// Status codes this cache is willing to store. Anything else is a miss
/// by construction, regardless of headers.
const STORABLE_STATUSES: [u16; 2] = [200, 301];

/// Derives the number of seconds a response should live in the cache.
///
/// `maxAge` defaults to the configured `max_ttl` ceiling when the response
/// carries no `max-age` directive; `headerExpires` defaults to
/// `now + maxAge` when `Expires` is absent or unparseable; `date` defaults
/// to `now`. The TTL is `min(date + maxAge, headerExpires) - now`, clamped
/// to `[0, max_ttl]`. `s-maxage` is parsed and preserved on the settings
/// record but never consulted here.
#[must_use]
pub fn ttl_for(settings: &CacheSettings, now: i64, max_ttl: u64) -> u64 {
    let max_ttl_i64 = i64::try_from(max_ttl).unwrap_or(i64::MAX);
    let max_age = settings.cache_control.max_age.unwrap_or(max_ttl_i64);
    let date = settings.date.unwrap_or(now);
    let header_expires = settings.expires.unwrap_or(now + max_age);
    let calculated_expires = date + max_age;
    let effective_expires = calculated_expires.min(header_expires);
    let ttl = effective_expires - now;
    ttl.clamp(0, max_ttl_i64) as u64
}

/// Whether `settings`/`response` may be admitted to the cache, given the
/// request-side `no-store` flag, private-scope consistency, and the
/// response's serialized size.
///
/// Conditions, all of which must hold:
/// 1. `response.status` is in [`STORABLE_STATUSES`].
/// 2. Neither the request nor the response carries `Cache-Control: no-store`.
/// 3. The response's `Vary` header doesn't contain `*`.
/// 4. [`ttl_for`] yields a positive TTL.
/// 5. If the response is private-scoped, the request supplied a private
///    token.
/// 6. The serialized response size doesn't exceed `max_cache_item_size`,
///    when configured.
#[allow(clippy::too_many_arguments)]
#[must_use]
pub fn is_storable(
    response: &HttpResponse,
    settings: &CacheSettings,
    request_no_store: bool,
    is_private_scoped: bool,
    private_token_present: bool,
    now: i64,
    max_ttl: u64,
    serialized_size: Option<usize>,
    max_cache_item_size: Option<usize>,
) -> bool {
    if !STORABLE_STATUSES.contains(&response.status) {
        return false;
    }
    if request_no_store || settings.cache_control.no_store {
        return false;
    }
    if settings.vary_is_wildcard() {
        return false;
    }
    if ttl_for(settings, now, max_ttl) == 0 {
        return false;
    }
    if is_private_scoped && !private_token_present {
        return false;
    }
    if let (Some(size), Some(limit)) = (serialized_size, max_cache_item_size) {
        if size > limit {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::CacheControlFlags;

    const DEFAULT_MAX_TTL: u64 = 1 << 31;

    fn base_settings() -> CacheSettings {
        CacheSettings {
            cache_control: CacheControlFlags::default(),
            ..Default::default()
        }
    }

    fn storable_response() -> HttpResponse {
        HttpResponse {
            body: b"ok".to_vec(),
            headers: Default::default(),
            status: 200,
            url: url::Url::parse("http://example.test/").unwrap(),
            version: http_cache_types::HttpVersion::Http11,
        }
    }

    #[test]
    fn ttl_uses_max_age_over_date() {
        let mut settings = base_settings();
        settings.date = Some(1000);
        settings.cache_control.max_age = Some(60);
        assert_eq!(ttl_for(&settings, 1000, DEFAULT_MAX_TTL), 60);
    }

    #[test]
    fn ttl_falls_back_to_expires_header_when_no_max_age() {
        let mut settings = base_settings();
        settings.date = Some(1000);
        settings.expires = Some(1100);
        // maxAge defaults to max_ttl, so calculatedExpires is huge;
        // headerExpires (1100) wins via the min().
        assert_eq!(ttl_for(&settings, 1000, DEFAULT_MAX_TTL), 100);
    }

    #[test]
    fn ttl_zero_when_already_expired() {
        let mut settings = base_settings();
        settings.date = Some(1000);
        settings.expires = Some(900);
        assert_eq!(ttl_for(&settings, 1000, DEFAULT_MAX_TTL), 0);
    }

    #[test]
    fn ttl_clamped_to_max_ttl() {
        let mut settings = base_settings();
        settings.cache_control.max_age = Some(10_000);
        settings.date = Some(0);
        assert_eq!(ttl_for(&settings, 0, 100), 100);
    }

    #[test]
    fn ttl_zero_max_age_yields_zero_ttl() {
        let mut settings = base_settings();
        settings.cache_control.max_age = Some(0);
        settings.date = Some(0);
        assert_eq!(ttl_for(&settings, 0, DEFAULT_MAX_TTL), 0);
    }

    #[test]
    fn not_storable_with_non_cacheable_status() {
        let mut response = storable_response();
        response.status = 404;
        let mut settings = base_settings();
        settings.cache_control.max_age = Some(60);
        settings.date = Some(0);
        assert!(!is_storable(
            &response, &settings, false, false, false, 0, DEFAULT_MAX_TTL, None, None
        ));
    }

    #[test]
    fn not_storable_with_no_store() {
        let response = storable_response();
        let mut settings = base_settings();
        settings.cache_control.no_store = true;
        settings.cache_control.max_age = Some(60);
        settings.date = Some(0);
        assert!(!is_storable(
            &response, &settings, false, false, false, 0, DEFAULT_MAX_TTL, None, None
        ));
    }

    #[test]
    fn not_storable_with_wildcard_vary() {
        let response = storable_response();
        let mut settings = base_settings();
        settings.cache_control.max_age = Some(60);
        settings.date = Some(0);
        settings.vary = vec!["*".to_string()];
        assert!(!is_storable(
            &response, &settings, false, false, false, 0, DEFAULT_MAX_TTL, None, None
        ));
    }

    #[test]
    fn not_storable_when_private_without_token() {
        let response = storable_response();
        let mut settings = base_settings();
        settings.cache_control.max_age = Some(60);
        settings.date = Some(0);
        assert!(!is_storable(
            &response, &settings, false, true, false, 0, DEFAULT_MAX_TTL, None, None
        ));
    }

    #[test]
    fn storable_when_private_with_token() {
        let response = storable_response();
        let mut settings = base_settings();
        settings.cache_control.max_age = Some(60);
        settings.date = Some(0);
        assert!(is_storable(
            &response, &settings, false, true, true, 0, DEFAULT_MAX_TTL, None, None
        ));
    }

    #[test]
    fn not_storable_when_oversize() {
        let response = storable_response();
        let mut settings = base_settings();
        settings.cache_control.max_age = Some(60);
        settings.date = Some(0);
        assert!(!is_storable(
            &response, &settings, false, false, false, 0, DEFAULT_MAX_TTL,
            Some(300), Some(260)
        ));
    }

    #[test]
    fn storable_when_under_size_ceiling() {
        let response = storable_response();
        let mut settings = base_settings();
        settings.cache_control.max_age = Some(60);
        settings.date = Some(0);
        assert!(is_storable(
            &response, &settings, false, false, false, 0, DEFAULT_MAX_TTL,
            Some(251), Some(260)
        ));
    }

    #[test]
    fn boundary_size_exactly_at_ceiling_is_storable() {
        let response = storable_response();
        let mut settings = base_settings();
        settings.cache_control.max_age = Some(60);
        settings.date = Some(0);
        assert!(is_storable(
            &response, &settings, false, false, false, 0, DEFAULT_MAX_TTL,
            Some(260), Some(260)
        ));
    }
}
