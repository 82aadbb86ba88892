//! Error types for building, reading and writing HTTP exchanges.
//!
//! # Design
//! Every failure is local to one value or one line. Validation failures
//! (`MissingField`, `InvalidMethod`, ...) carry the offending input so the
//! caller can report it. The JSON Lines reader yields these unchanged and
//! exposes the position separately. A body that is not JSON is not an error.

use std::str::Utf8Error;

/// Errors returned by builders, codecs, and the JSON Lines reader/writer.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required key is absent. For requests missing both `path` and
    /// `pathname` the field is reported as `"path|pathname"`.
    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("invalid HTTP method: {0:?}")]
    InvalidMethod(String),

    #[error("invalid protocol: {0:?}")]
    InvalidProtocol(String),

    /// The message format is fixed; log consumers match on it.
    #[error("Invalid isoformat string: {0}")]
    InvalidTimestamp(String),

    #[error("malformed JSON: {0}")]
    MalformedJson(#[source] serde_json::Error),

    #[error("serialization failed: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Valid JSON whose shape does not fit the record (e.g. a numeric `host`).
    #[error("invalid field: {0}")]
    InvalidField(String),

    #[error("invalid URL: {0:?}")]
    InvalidUrl(String),

    #[error("body is not valid UTF-8: {0}")]
    InvalidBody(#[from] Utf8Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
