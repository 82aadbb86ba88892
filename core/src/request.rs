//! Derives a fully-populated `Request` from partial input.
//!
//! # Design
//! `RequestParts` mirrors the wire object with every field optional. The
//! builder fills in what is missing in a fixed order:
//!
//! 1. `query` from the query string of `path`, when only `path` is known;
//! 2. `path` from `pathname` + encoded `query`, when `path` is absent;
//! 3. `pathname` from `path`, when `pathname` is absent;
//! 4. `body` / `headers` defaults, lower-cased header names;
//! 5. `bodyAsJson` from `body`;
//! 6. `timestamp` parsed from ISO-8601;
//! 7. closed-enum validation of `method` and `protocol`.
//!
//! URL and transport inputs are first reduced to a `RequestParts` and then go
//! through the same steps, so every `Request` is derived the same way.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::codec::{
    append_field, authority_from_url, flatten_query, parse_body, parse_pathname, parse_timestamp, path_from_url, query_string,
    url_encode_query,
};
use crate::error::{Error, Result};
use crate::transport::TransportRequest;
use crate::types::{Headers, HttpMethod, Protocol, Query, Request};

/// A request with every field optional, as found in a JSON object.
///
/// `method` and `protocol` stay strings here so that out-of-range values are
/// reported as `InvalidMethod` / `InvalidProtocol` by the builder rather than
/// as a generic shape error.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestParts {
    pub method: Option<String>,
    pub headers: Option<Headers>,
    pub query: Option<Query>,
    pub host: Option<String>,
    pub path: Option<String>,
    pub pathname: Option<String>,
    pub protocol: Option<String>,
    pub body: Option<String>,
    pub body_as_json: Option<Value>,
    pub timestamp: Option<String>,
}

/// Builds `Request` values. Not instantiable; all constructors are associated
/// functions.
pub enum RequestBuilder {}

impl RequestBuilder {
    /// Build from a JSON object with the wire field names.
    pub fn from_dict(fields: Value) -> Result<Request> {
        let parts: RequestParts =
            serde_json::from_value(fields).map_err(|e| Error::InvalidField(format!("request: {e}")))?;
        Self::from_parts(parts)
    }

    /// Build from a partial record, deriving every missing field.
    pub fn from_parts(parts: RequestParts) -> Result<Request> {
        let RequestParts {
            method,
            headers,
            query,
            host,
            path,
            pathname,
            protocol,
            body,
            body_as_json,
            timestamp,
        } = parts;

        let (path, pathname, query) = resolve_path(path, pathname, query)?;
        let body = body.unwrap_or_default();
        let headers = headers.map(normalize_headers).unwrap_or_default();
        let body_as_json = body_as_json.unwrap_or_else(|| parse_body(&body));
        let timestamp = timestamp.as_deref().map(parse_timestamp).transpose()?;

        let method: HttpMethod = method.ok_or(Error::MissingField("method"))?.parse()?;
        let protocol = Self::validate_protocol(&protocol.ok_or(Error::MissingField("protocol"))?)?;
        let host = host.filter(|host| !host.is_empty()).ok_or(Error::MissingField("host"))?;

        debug!(%method, %protocol, %host, %path, "built request");
        Ok(Request {
            method,
            headers,
            query,
            host,
            path,
            pathname,
            protocol,
            body,
            body_as_json,
            timestamp,
        })
    }

    /// Build a `GET` request with no headers from an absolute URL.
    pub fn from_url(url: &str) -> Result<Request> {
        Self::from_url_with(url, HttpMethod::Get, Headers::new())
    }

    /// Build a request with an empty body from an absolute URL.
    pub fn from_url_with(url: &str, method: HttpMethod, headers: Headers) -> Result<Request> {
        let (protocol, host, path) = split_url(url)?;
        Self::from_parts(RequestParts {
            method: Some(method.as_str().to_string()),
            headers: Some(headers),
            host: Some(host),
            path: Some(path),
            protocol: Some(protocol.as_str().to_string()),
            body: Some(String::new()),
            body_as_json: Some(Value::String(String::new())),
            ..RequestParts::default()
        })
    }

    /// Build from a request object of a transport library. The method is
    /// matched case-insensitively and the body must be UTF-8.
    pub fn from_transport_request<T: TransportRequest + ?Sized>(request: &T) -> Result<Request> {
        let (protocol, host, path) = split_url(&request.url())?;
        let body = std::str::from_utf8(request.body())?.to_string();

        let mut headers = Headers::new();
        for (name, value) in request.headers() {
            append_field(&mut headers, name.to_ascii_lowercase(), value);
        }

        Self::from_parts(RequestParts {
            method: Some(request.method().to_ascii_lowercase()),
            headers: Some(headers),
            host: Some(host),
            path: Some(path),
            protocol: Some(protocol.as_str().to_string()),
            body: Some(body),
            ..RequestParts::default()
        })
    }

    /// Accept only `http` and `https`.
    pub fn validate_protocol(protocol: &str) -> Result<Protocol> {
        protocol.parse()
    }
}

/// Derive whichever of `path`, `pathname` and `query` are missing. An empty
/// `path` or `pathname` counts as the root `/`.
fn resolve_path(
    path: Option<String>,
    pathname: Option<String>,
    query: Option<Query>,
) -> Result<(String, String, Query)> {
    let root_if_empty = |value: String| if value.is_empty() { "/".to_string() } else { value };
    let path = path.map(root_if_empty);
    let pathname = pathname.map(root_if_empty);

    let query = match (query, &path) {
        (Some(query), _) => query,
        (None, Some(path)) => flatten_query(query_string(path)),
        (None, None) => Query::new(),
    };

    let path = match path {
        Some(path) => path,
        None => {
            let pathname = pathname.as_deref().ok_or(Error::MissingField("path|pathname"))?;
            if query.is_empty() {
                pathname.to_string()
            } else {
                format!("{pathname}?{}", url_encode_query(&query))
            }
        }
    };

    let pathname = pathname.unwrap_or_else(|| parse_pathname(&path));
    Ok((path, pathname, query))
}

/// Lower-case header names; names that collide after lower-casing are merged
/// into one list in arrival order.
pub(crate) fn normalize_headers(headers: Headers) -> Headers {
    let mut normalized = Headers::with_capacity(headers.len());
    for (name, value) in headers {
        let name = name.to_ascii_lowercase();
        match normalized.get_mut(&name) {
            Some(existing) => {
                for item in value.iter() {
                    existing.push(item.to_string());
                }
            }
            None => {
                normalized.insert(name, value);
            }
        }
    }
    normalized
}

/// Split an absolute URL into protocol, host and path-with-query. The host
/// is the authority as written, port and user info included.
fn split_url(url: &str) -> Result<(Protocol, String, String)> {
    let parsed = Url::parse(url).map_err(|_| Error::InvalidUrl(url.to_string()))?;
    let protocol = RequestBuilder::validate_protocol(parsed.scheme())?;
    let host = authority_from_url(url)?.to_string();
    let path = path_from_url(url)?;
    Ok((protocol, host, path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FieldValue;
    use serde_json::json;

    #[test]
    fn from_dict_derives_path_from_pathname_and_query() {
        let req = RequestBuilder::from_dict(json!({
            "host": "api.github.com",
            "protocol": "https",
            "method": "get",
            "pathname": "/v1/users",
            "query": {"a": "b", "q": ["1", "2"]},
        }))
        .unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.host, "api.github.com");
        assert_eq!(req.protocol, Protocol::Https);
        assert_eq!(req.body, "");
        assert!(req.headers.is_empty());
        assert_eq!(req.pathname, "/v1/users");
        assert_eq!(req.path, "/v1/users?a=b&q=1&q=2");
        assert_eq!(req.body_as_json, json!(""));
        assert!(req.timestamp.is_none());
    }

    #[test]
    fn from_dict_derives_query_and_pathname_from_path() {
        let req = RequestBuilder::from_dict(json!({
            "host": "localhost",
            "protocol": "http",
            "method": "post",
            "path": "/user/repos?q=v&tag=a&tag=b",
            "body": "{\"name\": \"repo\"}",
        }))
        .unwrap();
        assert_eq!(req.pathname, "/user/repos");
        assert_eq!(req.query["q"], FieldValue::from("v"));
        assert_eq!(req.query["tag"], FieldValue::from(vec!["a", "b"]));
        assert_eq!(req.body_as_json, json!({"name": "repo"}));
    }

    #[test]
    fn from_dict_pathname_without_query_is_the_path() {
        let req = RequestBuilder::from_dict(json!({
            "host": "h", "protocol": "http", "method": "delete", "pathname": "/items/1",
        }))
        .unwrap();
        assert_eq!(req.path, "/items/1");
        assert!(req.query.is_empty());
    }

    #[test]
    fn from_dict_keeps_supplied_fields() {
        let req = RequestBuilder::from_dict(json!({
            "host": "h",
            "protocol": "http",
            "method": "get",
            "path": "/a?x=1",
            "pathname": "/a",
            "query": {"x": "1"},
            "bodyAsJson": {"cached": true},
        }))
        .unwrap();
        assert_eq!(req.path, "/a?x=1");
        assert_eq!(req.body_as_json, json!({"cached": true}));
    }

    #[test]
    fn from_dict_requires_path_or_pathname() {
        let err = RequestBuilder::from_dict(json!({"host": "h", "protocol": "http", "method": "get"})).unwrap_err();
        assert!(matches!(err, Error::MissingField("path|pathname")));
    }

    #[test]
    fn from_dict_treats_empty_path_as_root() {
        let req = RequestBuilder::from_dict(json!({
            "host": "h", "protocol": "http", "method": "get", "path": "",
        }))
        .unwrap();
        assert_eq!(req.path, "/");
        assert_eq!(req.pathname, "/");

        let req = RequestBuilder::from_dict(json!({
            "host": "h", "protocol": "http", "method": "get", "pathname": "", "query": {"q": "v"},
        }))
        .unwrap();
        assert_eq!(req.path, "/?q=v");
        assert_eq!(req.pathname, "/");
    }

    #[test]
    fn from_dict_rejects_empty_host() {
        let err = RequestBuilder::from_dict(json!({
            "host": "", "protocol": "http", "method": "get", "path": "/",
        }))
        .unwrap_err();
        assert!(matches!(err, Error::MissingField("host")));
    }

    #[test]
    fn from_dict_rejects_unknown_method_and_protocol() {
        let err = RequestBuilder::from_dict(json!({
            "host": "h", "protocol": "http", "method": "fetch", "path": "/",
        }))
        .unwrap_err();
        assert!(matches!(err, Error::InvalidMethod(m) if m == "fetch"));

        let err = RequestBuilder::from_dict(json!({
            "host": "h", "protocol": "gopher", "method": "get", "path": "/",
        }))
        .unwrap_err();
        assert!(matches!(err, Error::InvalidProtocol(p) if p == "gopher"));
    }

    #[test]
    fn from_dict_reports_missing_method() {
        let err = RequestBuilder::from_dict(json!({"host": "h", "protocol": "http", "path": "/"})).unwrap_err();
        assert!(matches!(err, Error::MissingField("method")));
    }

    #[test]
    fn from_dict_rejects_wrong_shape() {
        let err = RequestBuilder::from_dict(json!({
            "host": 42, "protocol": "http", "method": "get", "path": "/",
        }))
        .unwrap_err();
        assert!(matches!(err, Error::InvalidField(_)));
    }

    #[test]
    fn from_dict_lowercases_and_merges_header_names() {
        let req = RequestBuilder::from_dict(json!({
            "host": "h",
            "protocol": "http",
            "method": "get",
            "path": "/",
            "headers": {"Content-Type": "application/json", "X-Tag": "a", "x-tag": ["b", "c"]},
        }))
        .unwrap();
        assert_eq!(req.headers["content-type"], FieldValue::from("application/json"));
        assert_eq!(req.headers["x-tag"], FieldValue::from(vec!["a", "b", "c"]));
        assert_eq!(req.headers.len(), 2);
    }

    #[test]
    fn from_dict_parses_and_rejects_timestamps() {
        let req = RequestBuilder::from_dict(json!({
            "host": "h", "protocol": "http", "method": "get", "path": "/",
            "timestamp": "2018-11-13T20:20:39+02:00",
        }))
        .unwrap();
        assert_eq!(req.timestamp.unwrap().to_iso_string(), "2018-11-13T20:20:39+02:00");

        let err = RequestBuilder::from_dict(json!({
            "host": "h", "protocol": "http", "method": "get", "path": "/",
            "timestamp": "INVALID",
        }))
        .unwrap_err();
        assert!(matches!(err, Error::InvalidTimestamp(s) if s == "INVALID"));
    }

    #[test]
    fn from_url_parses_every_component() {
        let req = RequestBuilder::from_url("https://api.github.com/v1/repos?id=1&q=v1&q=v2").unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.host, "api.github.com");
        assert_eq!(req.protocol, Protocol::Https);
        assert_eq!(req.path, "/v1/repos?id=1&q=v1&q=v2");
        assert_eq!(req.pathname, "/v1/repos");
        assert_eq!(req.query["id"], FieldValue::from("1"));
        assert_eq!(req.query["q"], FieldValue::from(vec!["v1", "v2"]));
        assert_eq!(req.body, "");
        assert_eq!(req.body_as_json, json!(""));
    }

    #[test]
    fn from_url_without_path_is_root() {
        for url in ["https://api.github.com", "https://api.github.com/"] {
            let req = RequestBuilder::from_url(url).unwrap();
            assert_eq!(req.path, "/", "url: {url}");
            assert_eq!(req.pathname, "/", "url: {url}");
        }
    }

    #[test]
    fn from_url_keeps_explicit_port() {
        let req = RequestBuilder::from_url("http://localhost:3000/ip").unwrap();
        assert_eq!(req.host, "localhost:3000");
        assert_eq!(req.protocol, Protocol::Http);
    }

    #[test]
    fn from_url_keeps_authority_as_written() {
        let cases = [
            ("https://API.GitHub.com/x", "API.GitHub.com"),
            ("https://user:pw@h.com/x", "user:pw@h.com"),
            ("https://h.com:443/x", "h.com:443"),
            ("http://h.com:80", "h.com:80"),
        ];
        for (url, host) in cases {
            let req = RequestBuilder::from_url(url).unwrap();
            assert_eq!(req.host, host, "url: {url}");
        }
    }

    #[test]
    fn from_url_with_sets_method_and_headers() {
        let mut headers = Headers::new();
        headers.insert("Accept".to_string(), FieldValue::from("application/json"));
        let req = RequestBuilder::from_url_with("https://example.com/items", HttpMethod::Put, headers).unwrap();
        assert_eq!(req.method, HttpMethod::Put);
        assert_eq!(req.headers["accept"], FieldValue::from("application/json"));
    }

    #[test]
    fn from_url_rejects_other_schemes() {
        let err = RequestBuilder::from_url("ftp://example.com/file").unwrap_err();
        assert!(matches!(err, Error::InvalidProtocol(p) if p == "ftp"));
        let err = RequestBuilder::from_url("not a url").unwrap_err();
        assert!(matches!(err, Error::InvalidUrl(_)));
    }

    #[test]
    fn validate_protocol_accepts_http_and_https() {
        assert_eq!(RequestBuilder::validate_protocol("http").unwrap(), Protocol::Http);
        assert_eq!(RequestBuilder::validate_protocol("https").unwrap(), Protocol::Https);
        assert!(RequestBuilder::validate_protocol("HTTP").is_err());
    }
}
