//! Pairs a request and a response into an `HttpExchange`.

use serde_json::Value;

use crate::error::{Error, Result};
use crate::request::RequestBuilder;
use crate::response::ResponseBuilder;
use crate::types::HttpExchange;

/// Builds `HttpExchange` values.
pub enum HttpExchangeBuilder {}

impl HttpExchangeBuilder {
    /// Build from a JSON object holding `request`, `response` and optionally
    /// `meta`. Each side is built with its own builder; there is no
    /// cross-validation between them.
    pub fn from_dict(fields: Value) -> Result<HttpExchange> {
        let mut fields = match fields {
            Value::Object(map) => map,
            other => {
                return Err(Error::InvalidField(format!(
                    "exchange must be a JSON object, got {}",
                    json_kind(&other)
                )))
            }
        };

        let request = fields.remove("request").ok_or(Error::MissingField("request"))?;
        let response = fields.remove("response").ok_or(Error::MissingField("response"))?;

        let exchange = HttpExchange::new(
            RequestBuilder::from_dict(request)?,
            ResponseBuilder::from_dict(response)?,
        );
        Ok(match fields.remove("meta") {
            Some(Value::Null) | None => exchange,
            Some(meta) => exchange.with_meta(meta),
        })
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{HttpMethod, Protocol};
    use serde_json::json;

    fn request() -> Value {
        json!({"host": "api.github.com", "protocol": "https", "method": "get", "path": "/user/repos"})
    }

    #[test]
    fn from_dict_builds_both_sides() {
        let exchange = HttpExchangeBuilder::from_dict(json!({
            "request": request(),
            "response": {"statusCode": 200, "body": "[]"},
        }))
        .unwrap();
        assert_eq!(exchange.request.method, HttpMethod::Get);
        assert_eq!(exchange.request.protocol, Protocol::Https);
        assert_eq!(exchange.response.body_as_json, json!([]));
        assert!(exchange.meta.is_none());
    }

    #[test]
    fn from_dict_carries_meta() {
        let exchange = HttpExchangeBuilder::from_dict(json!({
            "request": request(),
            "response": {"statusCode": 200},
            "meta": {"source": "recorder", "tags": ["a"]},
        }))
        .unwrap();
        assert_eq!(exchange.meta, Some(json!({"source": "recorder", "tags": ["a"]})));
    }

    #[test]
    fn from_dict_requires_request_and_response() {
        let err = HttpExchangeBuilder::from_dict(json!({"response": {"statusCode": 200}})).unwrap_err();
        assert!(matches!(err, Error::MissingField("request")));

        let err = HttpExchangeBuilder::from_dict(json!({"request": request()})).unwrap_err();
        assert!(matches!(err, Error::MissingField("response")));
    }

    #[test]
    fn from_dict_rejects_non_objects() {
        let err = HttpExchangeBuilder::from_dict(json!([1, 2])).unwrap_err();
        assert!(matches!(err, Error::InvalidField(msg) if msg.contains("an array")));
    }

    #[test]
    fn from_dict_propagates_side_errors() {
        let err = HttpExchangeBuilder::from_dict(json!({
            "request": {"host": "h", "protocol": "http", "method": "GET", "path": "/"},
            "response": {"statusCode": 200},
        }))
        .unwrap_err();
        assert!(matches!(err, Error::InvalidMethod(m) if m == "GET"));
    }
}
