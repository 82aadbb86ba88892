//! Derives a fully-populated `Response` from partial input.
//!
//! A response has no path/query relationship to maintain, so the builder
//! only fills defaults (`body`, `headers`), derives `bodyAsJson` and parses
//! `timestamp`.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::codec::{append_field, parse_body, parse_timestamp};
use crate::error::{Error, Result};
use crate::request::normalize_headers;
use crate::transport::TransportResponse;
use crate::types::{Headers, Response};

/// A response with every field optional, as found in a JSON object.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseParts {
    pub body: Option<String>,
    pub status_code: Option<u16>,
    pub headers: Option<Headers>,
    pub body_as_json: Option<Value>,
    pub timestamp: Option<String>,
}

/// Builds `Response` values.
pub enum ResponseBuilder {}

impl ResponseBuilder {
    /// Build from a JSON object with the wire field names.
    pub fn from_dict(fields: Value) -> Result<Response> {
        let parts: ResponseParts =
            serde_json::from_value(fields).map_err(|e| Error::InvalidField(format!("response: {e}")))?;
        Self::from_parts(parts)
    }

    pub fn from_parts(parts: ResponseParts) -> Result<Response> {
        let ResponseParts {
            body,
            status_code,
            headers,
            body_as_json,
            timestamp,
        } = parts;

        let status_code = status_code.ok_or(Error::MissingField("statusCode"))?;
        let body = body.unwrap_or_default();
        let headers = headers.map(normalize_headers).unwrap_or_default();
        let body_as_json = body_as_json.unwrap_or_else(|| parse_body(&body));
        let timestamp = timestamp.as_deref().map(parse_timestamp).transpose()?;

        debug!(status_code, body_len = body.len(), "built response");
        Ok(Response {
            body,
            status_code,
            headers,
            timestamp,
            body_as_json,
        })
    }

    /// Build from a response object of a transport library. The body must be
    /// UTF-8.
    pub fn from_transport_response<T: TransportResponse + ?Sized>(response: &T) -> Result<Response> {
        let body = std::str::from_utf8(response.body())?.to_string();

        let mut headers = Headers::new();
        for (name, value) in response.headers() {
            append_field(&mut headers, name.to_ascii_lowercase(), value);
        }

        Self::from_parts(ResponseParts {
            body: Some(body),
            status_code: Some(response.status_code()),
            headers: Some(headers),
            ..ResponseParts::default()
        })
    }
}
