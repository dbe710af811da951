//! The cache settings record: per-URI metadata derived from the last cached
//! response, JSON-encoded in the settings blob.

use std::collections::HashMap;

use http_cache_types::HttpResponse;
use serde::{Deserialize, Serialize};

use crate::directives::{
    clamp_directive, coerce_int, parse_cache_control_tokens, parse_http_date,
    parse_vary, DirectiveValue,
};

/// The `Cache-Control` booleans and integers a cache settings record tracks.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheControlFlags {
    #[serde(default)]
    pub no_store: bool,
    #[serde(default)]
    pub must_revalidate: bool,
    #[serde(default)]
    pub no_cache: bool,
    #[serde(default)]
    pub public: bool,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub max_age: Option<i64>,
    #[serde(default)]
    pub s_maxage: Option<i64>,
}

/// Per-URI cache settings, derived from the last admitted response.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheSettings {
    pub cache_control: CacheControlFlags,
    #[serde(default)]
    pub date: Option<i64>,
    #[serde(default)]
    pub expires: Option<i64>,
    #[serde(default)]
    pub last_modified: Option<i64>,
    #[serde(default)]
    pub etag: Option<String>,
    #[serde(default)]
    pub vary: Vec<String>,
    /// Directive names this crate doesn't interpret, preserved verbatim so a
    /// write/read round trip doesn't lose them. Unrecognized directives are
    /// kept but never influence the decision engine.
    #[serde(default)]
    pub unknown_directives: HashMap<String, Option<String>>,
}

impl CacheSettings {
    /// Derives a settings record from an origin response's headers.
    #[must_use]
    pub fn from_response(response: &HttpResponse) -> Self {
        let cc_values: Vec<String> = response
            .header_values("cache-control")
            .into_iter()
            .map(str::to_string)
            .collect();
        let tokens = parse_cache_control_tokens(&cc_values);

        let mut unknown_directives = HashMap::new();
        const KNOWN: &[&str] = &[
            "no-store",
            "must-revalidate",
            "no-cache",
            "public",
            "private",
            "max-age",
            "s-maxage",
        ];
        for (name, value) in &tokens {
            if !KNOWN.contains(&name.as_str()) {
                let stored = match value {
                    DirectiveValue::Flag => None,
                    DirectiveValue::Value(v) => Some(v.clone()),
                };
                unknown_directives.insert(name.clone(), stored);
            }
        }

        let cache_control = CacheControlFlags {
            no_store: tokens.contains_key("no-store"),
            must_revalidate: tokens.contains_key("must-revalidate"),
            no_cache: tokens.contains_key("no-cache"),
            public: tokens.contains_key("public"),
            private: tokens.contains_key("private"),
            max_age: tokens
                .get("max-age")
                .map(|v| clamp_directive(coerce_int(Some(v)))),
            s_maxage: tokens
                .get("s-maxage")
                .map(|v| clamp_directive(coerce_int(Some(v)))),
        };

        let date = response.header("date").and_then(parse_http_date);
        let expires = response.header("expires").and_then(parse_http_date);
        let last_modified =
            response.header("last-modified").and_then(parse_http_date);
        let etag = response.header("etag").map(str::to_string);
        let vary_values: Vec<String> = response
            .header_values("vary")
            .into_iter()
            .map(str::to_string)
            .collect();
        let vary = parse_vary(&vary_values);

        Self {
            cache_control,
            date,
            expires,
            last_modified,
            etag,
            vary,
            unknown_directives,
        }
    }

    /// Whether the stored `Vary` list is exactly `*`, which forbids both
    /// serving and storing further responses for this URI.
    #[must_use]
    pub fn vary_is_wildcard(&self) -> bool {
        self.vary.iter().any(|v| v == "*")
    }

    /// Serializes to the JSON form persisted as the settings blob.
    ///
    /// # Errors
    /// Returns an error if `serde_json` fails to serialize the record (it
    /// shouldn't, barring a custom `unknown_directives` value that isn't
    /// valid UTF-8 — not reachable through this crate's own parsing).
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Parses a settings blob. Malformed JSON is treated as absent (`None`),
    /// not an error.
    #[must_use]
    pub fn from_json(blob: &str) -> Option<Self> {
        serde_json::from_str(blob).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap as Map;
    use url::Url;

    fn response_with(headers: &[(&str, &str)]) -> HttpResponse {
        let mut map: Map<String, Vec<String>> = Map::new();
        for (name, value) in headers {
            map.entry(name.to_ascii_lowercase())
                .or_default()
                .push((*value).to_string());
        }
        HttpResponse {
            body: b"hi".to_vec(),
            headers: map,
            status: 200,
            url: Url::parse("http://example.test/").unwrap(),
            version: http_cache_types::HttpVersion::Http11,
        }
    }

    #[test]
    fn derives_flags_and_integers() {
        let response = response_with(&[
            ("cache-control", "public, max-age=300, must-revalidate"),
            ("etag", "\"abc\""),
        ]);
        let settings = CacheSettings::from_response(&response);
        assert!(settings.cache_control.public);
        assert!(settings.cache_control.must_revalidate);
        assert_eq!(settings.cache_control.max_age, Some(300));
        assert_eq!(settings.etag.as_deref(), Some("\"abc\""));
    }

    #[test]
    fn malformed_json_is_treated_as_absent() {
        assert!(CacheSettings::from_json("{not json").is_none());
    }

    #[test]
    fn missing_fields_default() {
        let settings = CacheSettings::from_json("{}").unwrap();
        assert!(!settings.cache_control.no_store);
        assert_eq!(settings.cache_control.max_age, None);
        assert!(settings.vary.is_empty());
    }

    #[test]
    fn round_trips_through_json() {
        let response = response_with(&[
            ("cache-control", "private, s-maxage=10"),
            ("vary", "Accept, Accept-Language"),
        ]);
        let settings = CacheSettings::from_response(&response);
        let json = settings.to_json().unwrap();
        let back = CacheSettings::from_json(&json).unwrap();
        assert_eq!(settings, back);
    }
}
