//! HTTP error classification utilities

use crate::protocol::LlmProvider;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::time::Duration;

/// Pulls a message out of one known error envelope shape
type MessageExtractor = fn(&Value) -> Option<&str>;

/// Tried in order; the first non-empty message wins.
const MESSAGE_EXTRACTORS: [MessageExtractor; 3] =
    [nested_error_message, top_level_message, top_level_error];

/// OpenAI, Anthropic and Gemini: `{ "error": { "message": "..." } }`
fn nested_error_message(json: &Value) -> Option<&str> {
    json.get("error")?.get("message")?.as_str()
}

/// Generic: `{ "message": "..." }`
fn top_level_message(json: &Value) -> Option<&str> {
    json.get("message")?.as_str()
}

/// Generic: `{ "error": "..." }`
fn top_level_error(json: &Value) -> Option<&str> {
    json.get("error")?.as_str()
}

/// Turn an error response body into a human-readable message.
///
/// Never fails and never returns an empty string: when the body has no
/// recognizable message the raw body is used, and when the body is empty a
/// message is synthesized from the provider and status.
pub fn classify_error(raw_body: &str, status: u16, provider: LlmProvider) -> String {
    let extracted = serde_json::from_str::<Value>(raw_body).ok().and_then(|json| {
        MESSAGE_EXTRACTORS
            .iter()
            .filter_map(|extract| extract(&json))
            .find(|message| !message.is_empty())
            .map(str::to_string)
    });

    if let Some(message) = extracted {
        return message;
    }

    if !raw_body.is_empty() {
        return raw_body.to_string();
    }

    if status == 0 {
        format!("{} API Error", provider)
    } else {
        format!("{} API Error {}", provider, status)
    }
}

/// Parse a Retry-After header value
pub fn parse_retry_after(header_value: &str) -> Option<Duration> {
    parse_retry_after_at(header_value, Utc::now())
}

/// Parse a Retry-After header value relative to `now`.
///
/// Accepts delta-seconds (fractional values allowed) or an HTTP-date. Delays
/// in the past clamp to zero.
pub fn parse_retry_after_at(header_value: &str, now: DateTime<Utc>) -> Option<Duration> {
    let value = header_value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(seconds) = value.parse::<f64>() {
        if seconds.is_nan() {
            return None;
        }
        return Duration::try_from_secs_f64(seconds.max(0.0)).ok();
    }

    let date = DateTime::parse_from_rfc2822(value).ok()?;
    let millis = (date.with_timezone(&Utc) - now).num_milliseconds().max(0);
    Some(Duration::from_millis(millis as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_nested_error_message_wins() {
        let body = r#"{"error": {"message": "Quota exceeded", "code": 429}, "message": "outer"}"#;
        assert_eq!(classify_error(body, 429, LlmProvider::Gemini), "Quota exceeded");
    }

    #[test]
    fn test_top_level_message_then_error() {
        assert_eq!(
            classify_error(r#"{"message": "bad key"}"#, 401, LlmProvider::OpenAI),
            "bad key"
        );
        assert_eq!(
            classify_error(r#"{"error": "overloaded"}"#, 503, LlmProvider::Claude),
            "overloaded"
        );
    }

    #[test]
    fn test_object_error_without_message_falls_back_to_body() {
        let body = r#"{"error": {"type": "invalid_request_error"}}"#;
        assert_eq!(classify_error(body, 400, LlmProvider::Claude), body);
    }

    #[test]
    fn test_non_json_and_empty_bodies() {
        assert_eq!(
            classify_error("<html>Bad Gateway</html>", 502, LlmProvider::OpenAI),
            "<html>Bad Gateway</html>"
        );
        assert_eq!(classify_error("", 503, LlmProvider::Gemini), "gemini API Error 503");
        assert_eq!(classify_error("", 0, LlmProvider::Claude), "claude API Error");
    }

    #[test]
    fn test_retry_after_seconds() {
        assert_eq!(parse_retry_after("2"), Some(Duration::from_secs(2)));
        assert_eq!(parse_retry_after(" 1.5 "), Some(Duration::from_millis(1500)));
        assert_eq!(parse_retry_after("-3"), Some(Duration::ZERO));
        assert_eq!(parse_retry_after(""), None);
        assert_eq!(parse_retry_after("soon"), None);
    }

    #[test]
    fn test_retry_after_http_date() {
        let now = Utc.with_ymd_and_hms(2015, 10, 21, 7, 27, 57).unwrap();
        assert_eq!(
            parse_retry_after_at("Wed, 21 Oct 2015 07:28:00 GMT", now),
            Some(Duration::from_secs(3))
        );

        let later = Utc.with_ymd_and_hms(2015, 10, 21, 8, 0, 0).unwrap();
        assert_eq!(
            parse_retry_after_at("Wed, 21 Oct 2015 07:28:00 GMT", later),
            Some(Duration::ZERO)
        );
    }
}
