//! A quote-aware `Cache-Control` tokenizer, a strict RFC 7231 IMF-fixdate
//! parser, and the `Vary` list normalizer.

use std::collections::{HashMap, HashSet};

/// Splits `input` on `,` except inside a double-quoted region, trimming each
/// token. Implemented as a two-state machine (in-quotes / not-in-quotes),
/// not a regex — this is what lets
/// `Cache-Control: private="X-Secret, Y"` keep its embedded comma.
pub fn split_quote_aware(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    for c in input.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            ',' if !in_quotes => {
                tokens.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    tokens.push(current.trim().to_string());
    tokens.into_iter().filter(|t| !t.is_empty()).collect()
}

/// The value side of a parsed `Cache-Control` token: either a bare flag
/// (`no-cache`) or a `name=value` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectiveValue {
    /// A directive with no `=value` suffix, e.g. `no-cache`.
    Flag,
    /// A directive with a value, quotes stripped, e.g. `max-age=300`.
    Value(String),
}

/// Tokenizes one or more raw `Cache-Control` header values into a directive
/// map. Later occurrences of the same directive name overwrite earlier ones;
/// last-wins matches how the rest of this crate reads a single merged header
/// value.
pub fn parse_cache_control_tokens(
    raw_values: &[String],
) -> HashMap<String, DirectiveValue> {
    let joined = raw_values.join(",");
    let mut map = HashMap::new();
    for token in split_quote_aware(&joined) {
        match token.find('=') {
            Some(eq) => {
                let name = token[..eq].trim().to_ascii_lowercase();
                if name.is_empty() {
                    continue;
                }
                let value = token[eq + 1..].trim();
                let value = value
                    .strip_prefix('"')
                    .and_then(|v| v.strip_suffix('"'))
                    .unwrap_or(value);
                map.insert(name, DirectiveValue::Value(value.to_string()));
            }
            None => {
                let name = token.trim().to_ascii_lowercase();
                if name.is_empty() {
                    continue;
                }
                map.insert(name, DirectiveValue::Flag);
            }
        }
    }
    map
}

/// Coerces a directive value to an integer: base-10 parse, non-numeric
/// (including a bare flag) becomes `0`.
pub fn coerce_int(value: Option<&DirectiveValue>) -> i64 {
    match value {
        Some(DirectiveValue::Value(v)) => v.trim().parse().unwrap_or(0),
        Some(DirectiveValue::Flag) | None => 0,
    }
}

/// Clamps an integer directive value to `[0, 2^31]`, the invariant every
/// stored cache setting upholds.
pub fn clamp_directive(value: i64) -> i64 {
    value.clamp(0, 1 << 31)
}

const WEEKDAYS: [&str; 7] =
    ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct",
    "Nov", "Dec",
];

/// Parses an HTTP-date header value, accepting only the RFC 7231
/// IMF-fixdate form (`Sun, 06 Nov 1994 08:49:37 GMT`).
/// Returns epoch seconds, or `None` if the value isn't exactly that form.
#[must_use]
pub fn parse_http_date(value: &str) -> Option<i64> {
    let fields: Vec<&str> = value.split(' ').collect();
    let [weekday, day, month, year, time, gmt] = fields.as_slice() else {
        return None;
    };
    if gmt != &"GMT" {
        return None;
    }
    if weekday.len() != 4 || !weekday.ends_with(',') {
        return None;
    }
    if !WEEKDAYS.contains(&&weekday[..3]) {
        return None;
    }
    if day.len() != 2 {
        return None;
    }
    let day: u8 = day.parse().ok()?;
    let month_index = MONTHS.iter().position(|m| m == month)?;
    let month = time::Month::try_from((month_index + 1) as u8).ok()?;
    if year.len() != 4 {
        return None;
    }
    let year: i32 = year.parse().ok()?;
    let time_fields: Vec<&str> = time.split(':').collect();
    let [hour, minute, second] = time_fields.as_slice() else {
        return None;
    };
    if hour.len() != 2 || minute.len() != 2 || second.len() != 2 {
        return None;
    }
    let hour: u8 = hour.parse().ok()?;
    let minute: u8 = minute.parse().ok()?;
    let second: u8 = second.parse().ok()?;
    let date = time::Date::from_calendar_date(year, month, day).ok()?;
    let clock = time::Time::from_hms(hour, minute, second).ok()?;
    Some(time::PrimitiveDateTime::new(date, clock).assume_utc().unix_timestamp())
}

/// Formats epoch seconds as an RFC 7231 IMF-fixdate string, for headers this
/// crate writes itself (`Age` uses a bare integer, but `Warning` needs a
/// quoted HTTP-date — see `engine::revalidation_request`).
#[must_use]
pub fn format_http_date(epoch_seconds: i64) -> String {
    let when = std::time::UNIX_EPOCH
        + std::time::Duration::from_secs(epoch_seconds.max(0) as u64);
    httpdate::fmt_http_date(when)
}

/// Concatenates multi-valued `Vary` header values with `,`, tokenizes with
/// the quote-aware splitter, lowercases and trims each, and deduplicates
/// while preserving first occurrence.
#[must_use]
pub fn parse_vary(raw_values: &[String]) -> Vec<String> {
    let joined = raw_values.join(",");
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for token in split_quote_aware(&joined) {
        let name = token.to_ascii_lowercase();
        if name.is_empty() {
            continue;
        }
        if seen.insert(name.clone()) {
            out.push(name);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_aware_split_keeps_embedded_comma() {
        let tokens =
            split_quote_aware(r#"private="X-Secret, Y", max-age=300"#);
        assert_eq!(
            tokens,
            vec![r#"private="X-Secret, Y""#.to_string(), "max-age=300".to_string()]
        );
    }

    #[test]
    fn cache_control_flags_and_values() {
        let tokens = parse_cache_control_tokens(&[
            "public, max-age=300, must-revalidate".to_string(),
        ]);
        assert_eq!(tokens.get("public"), Some(&DirectiveValue::Flag));
        assert_eq!(
            tokens.get("max-age"),
            Some(&DirectiveValue::Value("300".to_string()))
        );
        assert_eq!(tokens.get("must-revalidate"), Some(&DirectiveValue::Flag));
    }

    #[test]
    fn non_numeric_max_age_coerces_to_zero() {
        let tokens =
            parse_cache_control_tokens(&["max-age=banana".to_string()]);
        assert_eq!(coerce_int(tokens.get("max-age")), 0);
    }

    #[test]
    fn http_date_round_trips() {
        let epoch = parse_http_date("Sun, 06 Nov 1994 08:49:37 GMT").unwrap();
        assert_eq!(format_http_date(epoch), "Sun, 06 Nov 1994 08:49:37 GMT");
    }

    #[test]
    fn http_date_rejects_other_rfc7231_forms() {
        // RFC 850 form
        assert!(parse_http_date("Sunday, 06-Nov-94 08:49:37 GMT").is_none());
        // asctime form
        assert!(parse_http_date("Sun Nov  6 08:49:37 1994").is_none());
    }

    #[test]
    fn vary_dedupes_and_lowercases() {
        let vary = parse_vary(&[
            "Accept-Language, Accept".to_string(),
            "accept".to_string(),
        ]);
        assert_eq!(vary, vec!["accept-language", "accept"]);
    }
}
