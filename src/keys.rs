//! The Key Factory: derives cache keys for settings and response blobs from
//! a pluggable, collision-resistant hash.

use std::collections::BTreeMap;

use url::Url;

/// A pluggable hash used to derive cache keys from URIs and vary projections.
/// Implementations must produce a hex-safe string at least 160 bits wide.
pub trait CacheKeyHasher: Send + Sync {
    /// Hashes `input`, returning a lowercase hex digest.
    fn hash(&self, input: &str) -> String;
}

/// The default hasher: BLAKE3, hex-encoded.
#[derive(Debug, Clone, Copy, Default)]
pub struct Blake3Hasher;

impl CacheKeyHasher for Blake3Hasher {
    fn hash(&self, input: &str) -> String {
        hex::encode(blake3::hash(input.as_bytes()).as_bytes())
    }
}

/// Builds the key under which a URI's settings blob is stored:
/// `"http.settings." + H(uri)`.
#[must_use]
pub fn settings_key(hasher: &dyn CacheKeyHasher, uri: &Url) -> String {
    format!("http.settings.{}", hasher.hash(uri.as_str()))
}

/// Builds the key under which a cached response is stored. Public responses
/// share one key per URI; private responses are additionally scoped by the
/// hashed caller-supplied token, and any `Vary`-selected request headers are
/// folded in as a suffix so distinct representations don't collide.
#[must_use]
pub fn response_key(
    hasher: &dyn CacheKeyHasher,
    uri: &Url,
    vary_projection: &BTreeMap<String, String>,
    private_token: Option<&str>,
) -> String {
    let scope = match private_token {
        Some(token) => format!("private_{}", hasher.hash(token)),
        None => "public".to_string(),
    };
    let uri_hash = hasher.hash(uri.as_str());
    let vary_suffix = if vary_projection.is_empty() {
        String::new()
    } else {
        let joined = vary_projection
            .iter()
            .map(|(name, value)| format!("{name}:{value}"))
            .collect::<Vec<_>>()
            .join("\u{1}");
        format!("_{}", hasher.hash(&joined))
    };
    format!("http.response.{scope}_{uri_hash}{vary_suffix}")
}

/// Projects the request-side header values named by `vary_names` into a
/// sorted map, so the projection's serialized form is independent of the
/// order the names appeared in the `Vary` header.
pub fn vary_projection<F>(
    vary_names: &[String],
    mut header_lookup: F,
) -> BTreeMap<String, String>
where
    F: FnMut(&str) -> Vec<String>,
{
    let mut projection = BTreeMap::new();
    for name in vary_names {
        let values = header_lookup(name);
        projection.insert(name.clone(), values.join(", "));
    }
    projection
}
