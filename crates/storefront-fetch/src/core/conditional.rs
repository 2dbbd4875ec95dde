//! Conditional request headers and HTTP dates.

use std::time::SystemTime;

use chrono::{DateTime, Utc};
use storefront_fs::Validators;

pub const IF_NONE_MATCH: &str = "If-None-Match";
pub const IF_MODIFIED_SINCE: &str = "If-Modified-Since";

/// Headers asking the server to answer 304 if the held copy is current.
///
/// An ETag is the stronger validator, so when one is known the date is not
/// sent at all.
pub fn conditional_headers(validators: &Validators) -> Vec<(String, String)> {
    if let Some(etag) = validators.etag.as_deref().filter(|etag| !etag.is_empty()) {
        return vec![(IF_NONE_MATCH.to_string(), etag.to_string())];
    }

    validators
        .last_modified
        .map(|date| vec![(IF_MODIFIED_SINCE.to_string(), format_http_date(date))])
        .unwrap_or_default()
}

/// Format a time as an RFC 7231 IMF-fixdate, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`.
pub fn format_http_date(time: SystemTime) -> String {
    DateTime::<Utc>::from(time)
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

pub fn parse_http_date(value: &str) -> Option<SystemTime> {
    DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(SystemTime::from)
}
