//! Canonical HTTP request/response/exchange types and their JSON Lines codec.
//!
//! # Overview
//! Builds fully-populated `Request`, `Response` and `HttpExchange` values from
//! partial input (a JSON object, a bare URL, or a transport-library message),
//! and reads/writes exchanges as newline-delimited JSON. Nothing here touches
//! the network: the caller owns the transport and hands over plain data.
//!
//! # Design
//! - Builders are pure functions from an all-optional `*Parts` record to the
//!   total, validated value. Every derived field (`path`, `pathname`, `query`,
//!   `bodyAsJson`) is computed in exactly one place.
//! - `Protocol` and `HttpMethod` are closed enums; free-form strings are
//!   rejected at build time, never stored.
//! - The writer normalizes through `serde_json::Value` so omission rules are a
//!   tree transform rather than per-field bookkeeping.
//!
//! ```
//! use http_types::{HttpMethod, RequestBuilder};
//!
//! let req = RequestBuilder::from_url("https://api.github.com/v1/repos?q=v1&q=v2").unwrap();
//! assert_eq!(req.method, HttpMethod::Get);
//! assert_eq!(req.pathname, "/v1/repos");
//! ```

pub mod codec;
pub mod error;
pub mod exchange;
pub mod jsonl;
pub mod request;
pub mod response;
pub mod transport;
pub mod types;

pub use error::{Error, Result};
pub use exchange::HttpExchangeBuilder;
pub use jsonl::{to_json, to_normalized_dict, HttpExchangeReader, HttpExchangeWriter, JsonLines};
pub use request::{RequestBuilder, RequestParts};
pub use response::{ResponseBuilder, ResponseParts};
pub use transport::{TransportRequest, TransportResponse};
pub use types::{
    FieldValue, Headers, HttpExchange, HttpMethod, Protocol, Query, Request, Response, Timestamp,
};
