//! The Gatekeeper: decides, before any cache lookup, whether a request must
//! bypass the cache outright.

/// The gatekeeper's verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Forward straight to the origin; never touch the cache.
    Bypass,
    /// Continue through the decision engine.
    Proceed,
}

const PRECONDITION_HEADERS: [&str; 5] = [
    "if-match",
    "if-none-match",
    "if-modified-since",
    "if-unmodified-since",
    "if-range",
];

/// Classifies a request. Bypasses, checked in order:
/// 1. The protocol version string is exactly `"1.0"` or `"1"`.
/// 2. The method isn't `GET`.
/// 3. A `Range` or `Content-Range` header is present.
/// 4. Any conditional-request precondition header is present.
pub fn classify<F>(
    method: &str,
    http_version: &str,
    mut header_values: F,
) -> GateDecision
where
    F: FnMut(&str) -> Vec<String>,
{
    if http_version == "1.0" || http_version == "1" {
        return GateDecision::Bypass;
    }
    if !method.eq_ignore_ascii_case("GET") {
        return GateDecision::Bypass;
    }
    if !header_values("range").is_empty() || !header_values("content-range").is_empty() {
        return GateDecision::Bypass;
    }
    for name in PRECONDITION_HEADERS {
        if !header_values(name).is_empty() {
            return GateDecision::Bypass;
        }
    }
    GateDecision::Proceed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_headers(_name: &str) -> Vec<String> {
        vec![]
    }

    #[test]
    fn proceeds_on_plain_get() {
        assert_eq!(classify("GET", "1.1", no_headers), GateDecision::Proceed);
    }

    #[test]
    fn bypasses_http_1_0() {
        assert_eq!(classify("GET", "1.0", no_headers), GateDecision::Bypass);
    }

    #[test]
    fn bypasses_bare_1() {
        assert_eq!(classify("GET", "1", no_headers), GateDecision::Bypass);
    }

    #[test]
    fn proceeds_on_http_0_9() {
        // Only "1.0"/"1" bypass per this step; this crate's own wire format
        // never actually produces "0.9" for an outgoing request, so this
        // case is unreachable in practice but still follows the literal rule.
        assert_eq!(classify("GET", "0.9", no_headers), GateDecision::Proceed);
    }

    #[test]
    fn bypasses_non_get() {
        assert_eq!(classify("POST", "1.1", no_headers), GateDecision::Bypass);
    }

    #[test]
    fn bypasses_range_requests() {
        let lookup = |name: &str| -> Vec<String> {
            if name == "range" { vec!["bytes=0-10".to_string()] } else { vec![] }
        };
        assert_eq!(classify("GET", "1.1", lookup), GateDecision::Bypass);
    }

    #[test]
    fn bypasses_conditional_requests() {
        let lookup = |name: &str| -> Vec<String> {
            if name == "if-none-match" { vec!["\"etag\"".to_string()] } else { vec![] }
        };
        assert_eq!(classify("GET", "1.1", lookup), GateDecision::Bypass);
    }

    #[test]
    fn proceeds_on_http_2() {
        assert_eq!(classify("GET", "2", no_headers), GateDecision::Proceed);
    }
}
