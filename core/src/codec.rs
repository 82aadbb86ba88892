//! Primitive codecs: body, path, query string and timestamp parsing.
//!
//! All functions here are pure. Only `path_from_url` and `parse_timestamp`
//! can fail; `parse_body` degrades to the `""` sentinel instead.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use indexmap::map::Entry;
use serde_json::Value;
use tracing::trace;
use url::form_urlencoded;

use crate::error::{Error, Result};
use crate::types::{FieldValue, Query, Timestamp};

const OFFSET_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M%:z",
];

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse `body` as JSON, returning `""` when it is not valid JSON.
///
/// The empty string is a sentinel for "not JSON"; it is indistinguishable from
/// a body that literally is the JSON string `""`.
pub fn parse_body(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or_else(|err| {
        trace!(error = %err, len = body.len(), "body is not JSON");
        Value::String(String::new())
    })
}

/// Path component of a path or URL, without query string or fragment.
///
/// `/v1/repos?id=1` and `https://api.github.com/v1/repos?id=1` both give
/// `/v1/repos`.
pub fn parse_pathname(path: &str) -> String {
    let rest = strip_authority(path);
    let end = rest.find(['?', '#']).unwrap_or(rest.len());
    rest[..end].to_string()
}

/// Path and query string of an absolute `http(s)` URL; `/` when the URL has no
/// path. Any fragment is dropped.
pub fn path_from_url(url: &str) -> Result<String> {
    let (_, tail) = split_http_url(url)?;
    let tail = &tail[..tail.find('#').unwrap_or(tail.len())];
    if tail.starts_with('/') {
        Ok(tail.to_string())
    } else {
        Ok(format!("/{tail}"))
    }
}

/// Authority of an absolute `http(s)` URL exactly as written, e.g.
/// `user:pw@API.example.com:443`. Case, user info and port are kept.
pub fn authority_from_url(url: &str) -> Result<&str> {
    split_http_url(url).map(|(authority, _)| authority)
}

/// Query string portion of a path or URL (between `?` and any `#`).
pub fn query_string(path: &str) -> &str {
    let Some(start) = path.find('?') else {
        return "";
    };
    let query = &path[start + 1..];
    &query[..query.find('#').unwrap_or(query.len())]
}

/// Parse a form-urlencoded query string. A parameter seen once maps to a
/// scalar, one seen several times to the list of its values in order.
/// Parameters with blank values are dropped.
pub fn flatten_query(query_string: &str) -> Query {
    let mut query = Query::new();
    for (key, value) in form_urlencoded::parse(query_string.as_bytes()) {
        if value.is_empty() {
            continue;
        }
        append_field(&mut query, key.into_owned(), value.into_owned());
    }
    query
}

/// Encode `query` as a form-urlencoded string, one pair per value.
pub fn url_encode_query(query: &Query) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in query {
        for item in value.iter() {
            serializer.append_pair(key, item);
        }
    }
    serializer.finish()
}

/// Parse an ISO-8601 date-time, with or without UTC offset.
pub fn parse_timestamp(s: &str) -> Result<Timestamp> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(Timestamp::Offset(dt));
    }
    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, format) {
            return Ok(Timestamp::Offset(dt));
        }
    }
    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(Timestamp::Naive(dt));
        }
    }
    if let Some(dt) = parse_hour_only(s) {
        return Ok(Timestamp::Naive(dt));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(Timestamp::Naive)
        .ok_or_else(|| Error::InvalidTimestamp(s.to_string()))
}

/// `YYYY-MM-DDTHH` or `YYYY-MM-DD HH`. chrono always wants a minute, so one
/// is supplied.
fn parse_hour_only(s: &str) -> Option<NaiveDateTime> {
    let bytes = s.as_bytes();
    if bytes.len() != 13 || !matches!(bytes[10], b'T' | b' ') {
        return None;
    }
    NaiveDateTime::parse_from_str(&format!("{}T{}:00", &s[..10], &s[11..]), "%Y-%m-%dT%H:%M").ok()
}

/// Insert `value` under `key`, turning repeated keys into lists.
pub(crate) fn append_field(map: &mut Query, key: String, value: String) {
    match map.entry(key) {
        Entry::Occupied(mut entry) => entry.get_mut().push(value),
        Entry::Vacant(entry) => {
            entry.insert(FieldValue::Single(value));
        }
    }
}

/// Split an absolute `http(s)` URL into its non-empty authority and the rest.
fn split_http_url(url: &str) -> Result<(&str, &str)> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .ok_or_else(|| Error::InvalidUrl(url.to_string()))?;

    let authority_end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    if authority_end == 0 {
        return Err(Error::InvalidUrl(url.to_string()));
    }
    Ok(rest.split_at(authority_end))
}

/// Skip `scheme://authority` (or a bare `//authority`) if present.
fn strip_authority(path: &str) -> &str {
    let after_scheme = match path.find("://") {
        Some(idx) if is_scheme(&path[..idx]) => &path[idx + 3..],
        _ => match path.strip_prefix("//") {
            Some(rest) => rest,
            None => return path,
        },
    };
    let end = after_scheme.find(['/', '?', '#']).unwrap_or(after_scheme.len());
    &after_scheme[end..]
}

fn is_scheme(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}
