//! Flattens an [`HttpResponse`] to a single string for storage in a
//! string-typed [`CacheBackend`], and parses it back.

use http::StatusCode;
use http_cache_types::{HttpResponse, HttpVersion};
use url::Url;

fn parse_http_version(value: &str) -> Option<HttpVersion> {
    match value {
        "HTTP/0.9" => Some(HttpVersion::Http09),
        "HTTP/1.0" => Some(HttpVersion::Http10),
        "HTTP/1.1" => Some(HttpVersion::Http11),
        "HTTP/2.0" => Some(HttpVersion::H2),
        "HTTP/3.0" => Some(HttpVersion::H3),
        _ => None,
    }
}

/// Serializes a response to the flat wire-like form this crate stores:
/// a status line, sorted headers, a blank line, then the body.
///
/// The body must be valid UTF-8 — a [`CacheBackend`](http_cache_types::CacheBackend)
/// is a string store, so a response with a binary body simply can't be
/// admitted; callers treat `None` the same as any other non-storable
/// response.
#[must_use]
pub fn serialize_response(response: &HttpResponse) -> Option<String> {
    let body = std::str::from_utf8(&response.body).ok()?;
    let reason = StatusCode::from_u16(response.status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .unwrap_or("");

    let mut out = format!(
        "{} {} {}\r\n",
        response.version, response.status, reason
    );

    let mut entries: Vec<(&String, &Vec<String>)> = response.headers.iter().collect();
    entries.sort_by(|(a, _), (b, _)| a.cmp(b));
    for (name, values) in entries {
        for value in values {
            out.push_str(&format!("{name}: {value}"));
            out.push_str("\r\n");
        }
    }
    out.push_str("\r\n");
    out.push_str(body);
    Some(out)
}

/// Parses a blob produced by [`serialize_response`] back into an
/// [`HttpResponse`] attributed to `url`. Returns `None` on any structural
/// malformation rather than an error — a corrupted entry is just a miss.
#[must_use]
pub fn deserialize_response(blob: &str, url: Url) -> Option<HttpResponse> {
    let (head, body) = blob.split_once("\r\n\r\n")?;
    let mut lines = head.split("\r\n");
    let status_line = lines.next()?;

    let mut parts = status_line.splitn(3, ' ');
    let version_str = parts.next()?;
    let status_str = parts.next()?;
    let version = parse_http_version(version_str)?;
    let status: u16 = status_str.parse().ok()?;

    let mut headers = std::collections::HashMap::new();
    for line in lines {
        if line.is_empty() {
            continue;
        }
        let (name, value) = line.split_once(':')?;
        let name = name.trim();
        let value = value.trim();
        if name.is_empty() {
            continue;
        }
        headers
            .entry(name.to_ascii_lowercase())
            .or_insert_with(Vec::new)
            .push(value.to_string());
    }

    Some(HttpResponse {
        body: body.as_bytes().to_vec(),
        headers,
        status,
        url,
        version,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn sample_response() -> HttpResponse {
        let mut headers = HashMap::new();
        headers
            .insert("content-type".to_string(), vec!["text/plain".to_string()]);
        headers.insert("etag".to_string(), vec!["\"abc\"".to_string()]);
        HttpResponse {
            body: b"hello world".to_vec(),
            headers,
            status: 200,
            url: Url::parse("http://example.test/").unwrap(),
            version: HttpVersion::Http11,
        }
    }

    #[test]
    fn round_trips_a_response() {
        let response = sample_response();
        let blob = serialize_response(&response).unwrap();
        let back =
            deserialize_response(&blob, response.url.clone()).unwrap();
        assert_eq!(back.status, 200);
        assert_eq!(back.body, b"hello world");
        assert_eq!(back.header("etag"), Some("\"abc\""));
        assert_eq!(back.header("content-type"), Some("text/plain"));
    }

    #[test]
    fn non_utf8_body_fails_serialization() {
        let mut response = sample_response();
        response.body = vec![0xff, 0xfe, 0xfd];
        assert!(serialize_response(&response).is_none());
    }

    #[test]
    fn malformed_blob_fails_to_deserialize() {
        let url = Url::parse("http://example.test/").unwrap();
        assert!(deserialize_response("not a valid blob", url).is_none());
    }

    #[test]
    fn preserves_order_within_a_repeated_header_name() {
        let mut response = sample_response();
        response.headers.insert(
            "vary".to_string(),
            vec!["Accept-Language".to_string(), "Accept".to_string()],
        );
        let blob = serialize_response(&response).unwrap();
        let back = deserialize_response(&blob, response.url.clone()).unwrap();
        assert_eq!(
            back.header_values("vary"),
            vec!["Accept-Language", "Accept"]
        );
    }
}
