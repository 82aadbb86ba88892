//! The canonical exchange model.
//!
//! # Design
//! These are the total, validated records produced by the builders in
//! `request`, `response` and `exchange`. Fields are public and owned so the
//! values can be inspected and compared freely, but the only supported way to
//! create a `Request` or `Response` is through its builder, which keeps
//! `path`, `pathname`, `query` and `bodyAsJson` consistent with each other.
//!
//! Serialization uses the wire names (`bodyAsJson`, `statusCode`); the writer
//! in `jsonl` decides which of those fields are persisted.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDateTime, SecondsFormat};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::error::Error;

/// Request protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Http,
    Https,
}

impl Protocol {
    pub fn as_str(self) -> &'static str {
        match self {
            Protocol::Http => "http",
            Protocol::Https => "https",
        }
    }
}

impl FromStr for Protocol {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "http" => Ok(Protocol::Http),
            "https" => Ok(Protocol::Https),
            other => Err(Error::InvalidProtocol(other.to_string())),
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HTTP method. The wire form is always lower case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Patch,
    Delete,
    Options,
    Trace,
    Head,
    Connect,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 9] = [
        HttpMethod::Get,
        HttpMethod::Put,
        HttpMethod::Post,
        HttpMethod::Patch,
        HttpMethod::Delete,
        HttpMethod::Options,
        HttpMethod::Trace,
        HttpMethod::Head,
        HttpMethod::Connect,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Put => "put",
            HttpMethod::Post => "post",
            HttpMethod::Patch => "patch",
            HttpMethod::Delete => "delete",
            HttpMethod::Options => "options",
            HttpMethod::Trace => "trace",
            HttpMethod::Head => "head",
            HttpMethod::Connect => "connect",
        }
    }
}

/// Accepts only the lower-case wire literal. Transport adapters lower-case
/// their method before parsing; dictionaries must already be canonical.
impl FromStr for HttpMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HttpMethod::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| Error::InvalidMethod(s.to_string()))
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A header or query parameter value: one occurrence is a scalar, more than
/// one is the ordered list of occurrences.
///
/// Values compare by their occurrences, so a one-element list equals the
/// scalar it flattens to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Single(String),
    Multiple(Vec<String>),
}

impl FieldValue {
    /// Append another occurrence, promoting a scalar to a list.
    pub fn push(&mut self, value: String) {
        match self {
            FieldValue::Single(first) => {
                let first = std::mem::take(first);
                *self = FieldValue::Multiple(vec![first, value]);
            }
            FieldValue::Multiple(values) => values.push(value),
        }
    }

    /// Iterate over every occurrence in order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.as_slice().iter().map(String::as_str)
    }

    fn as_slice(&self) -> &[String] {
        match self {
            FieldValue::Single(value) => std::slice::from_ref(value),
            FieldValue::Multiple(values) => values.as_slice(),
        }
    }

    /// The scalar value, if there was exactly one occurrence.
    pub fn as_single(&self) -> Option<&str> {
        match self {
            FieldValue::Single(value) => Some(value),
            FieldValue::Multiple(_) => None,
        }
    }
}

impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl Eq for FieldValue {}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Single(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Single(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(values: Vec<String>) -> Self {
        FieldValue::Multiple(values)
    }
}

impl From<Vec<&str>> for FieldValue {
    fn from(values: Vec<&str>) -> Self {
        FieldValue::Multiple(values.into_iter().map(str::to_string).collect())
    }
}

/// Request or response headers, keyed by lower-case name in arrival order.
pub type Headers = IndexMap<String, FieldValue>;

/// Query parameters in the order they appeared.
pub type Query = IndexMap<String, FieldValue>;

/// An ISO-8601 instant. Remembers whether the literal carried a UTC offset so
/// that it is written back the way it was read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamp {
    Offset(DateTime<FixedOffset>),
    Naive(NaiveDateTime),
}

impl Timestamp {
    pub fn parse(s: &str) -> crate::Result<Timestamp> {
        crate::codec::parse_timestamp(s)
    }

    /// Render as ISO-8601, e.g. `2018-11-13T20:20:39+02:00` or
    /// `2020-01-31T13:34:15`.
    pub fn to_iso_string(&self) -> String {
        match self {
            Timestamp::Offset(dt) => dt.to_rfc3339_opts(SecondsFormat::AutoSi, false),
            Timestamp::Naive(dt) => dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string(),
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_iso_string())
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_iso_string())
    }
}

/// HTTP request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Request {
    pub method: HttpMethod,
    pub headers: Headers,
    pub query: Query,
    /// Host, possibly including a port number.
    pub host: String,
    /// Full request path, e.g. `/v1/pets?id=234`.
    pub path: String,
    /// Path without query string, e.g. `/v1/pets`.
    pub pathname: String,
    pub protocol: Protocol,
    /// Raw body; empty when the request had none.
    pub body: String,
    /// `body` parsed as JSON, or `""` when the body is not JSON.
    #[serde(rename = "bodyAsJson")]
    pub body_as_json: Value,
    /// When the request was initiated.
    pub timestamp: Option<Timestamp>,
}

/// HTTP response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub body: String,
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub headers: Headers,
    /// When the response was sent.
    pub timestamp: Option<Timestamp>,
    #[serde(rename = "bodyAsJson")]
    pub body_as_json: Value,
}

/// A request/response pair with optional free-form metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HttpExchange {
    pub request: Request,
    pub response: Response,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

impl HttpExchange {
    pub fn new(request: Request, response: Response) -> Self {
        Self {
            request,
            response,
            meta: None,
        }
    }

    pub fn with_meta(self, meta: Value) -> Self {
        Self {
            meta: Some(meta),
            ..self
        }
    }
}
