//! JSON Lines reader and writer for `HttpExchange` values.
//!
//! # Design
//! The reader is a pull-driven iterator: each `next()` reads exactly one line
//! from the underlying `BufRead`, so a malformed line fails at its own
//! position and everything after it is still unread. The iterator is finite
//! and cannot be rewound; pull it again after an error to continue with the
//! next line.
//!
//! The writer normalizes through `serde_json::Value`: the exchange is
//! serialized, then a pure recursive transform drops `null` and `""` values
//! and every `bodyAsJson` key. Enum fields serialize as their lower-case
//! literal and timestamps as ISO-8601 text.

use std::io::{BufRead, ErrorKind, Write};
use std::iter::FusedIterator;

use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::exchange::HttpExchangeBuilder;
use crate::types::HttpExchange;

/// Derived field that is never persisted.
const BODY_AS_JSON: &str = "bodyAsJson";

/// Reads exchanges from JSON text.
pub enum HttpExchangeReader {}

impl HttpExchangeReader {
    /// Read a single exchange from one JSON object.
    pub fn from_json(input: &str) -> Result<HttpExchange> {
        let value: Value = serde_json::from_str(input).map_err(Error::MalformedJson)?;
        HttpExchangeBuilder::from_dict(value)
    }

    /// Same as `from_json` for UTF-8 bytes.
    pub fn from_slice(input: &[u8]) -> Result<HttpExchange> {
        let value: Value = serde_json::from_slice(input).map_err(Error::MalformedJson)?;
        HttpExchangeBuilder::from_dict(value)
    }

    /// Lazily read one exchange per line.
    pub fn from_json_lines<R: BufRead>(reader: R) -> JsonLines<R> {
        JsonLines {
            reader,
            buf: String::new(),
            line: 0,
            done: false,
        }
    }
}

/// Iterator over the exchanges of a JSON Lines stream.
///
/// A failing line yields the builder or JSON error unchanged; its 1-based
/// position is `line_number()` right after the failure. Whitespace-only lines
/// are skipped.
#[derive(Debug)]
pub struct JsonLines<R> {
    reader: R,
    buf: String,
    line: usize,
    done: bool,
}

impl<R> JsonLines<R> {
    /// Number of lines consumed so far.
    pub fn line_number(&self) -> usize {
        self.line
    }

    /// Give back the underlying reader, positioned after the last line read.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: BufRead> Iterator for JsonLines<R> {
    type Item = Result<HttpExchange>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            self.buf.clear();
            let read = self.reader.read_line(&mut self.buf);
            let line = self.line + 1;
            match read {
                Ok(0) => self.done = true,
                Ok(_) => {
                    self.line = line;
                    let text = self.buf.trim();
                    if text.is_empty() {
                        trace!(line, "skipping blank line");
                        continue;
                    }
                    let result = HttpExchangeReader::from_json(text);
                    if let Err(err) = &result {
                        debug!(line, error = %err, "failed to read exchange");
                    }
                    return Some(result);
                }
                Err(err) => {
                    // Invalid UTF-8 consumes the offending line; anything else
                    // leaves the stream in an unknown state.
                    if err.kind() == ErrorKind::InvalidData {
                        self.line = line;
                    } else {
                        self.done = true;
                    }
                    debug!(line, error = %err, "failed to read line");
                    return Some(Err(Error::Io(err)));
                }
            }
        }
        None
    }
}

impl<R: BufRead> FusedIterator for JsonLines<R> {}

/// Writes exchanges as JSON Lines, one object per line.
#[derive(Debug)]
pub struct HttpExchangeWriter<W> {
    output: W,
    written: usize,
}

impl<W: Write> HttpExchangeWriter<W> {
    pub fn new(output: W) -> Self {
        Self { output, written: 0 }
    }

    /// Append one exchange followed by `\n`.
    pub fn write(&mut self, exchange: &HttpExchange) -> Result<()> {
        let mut line = to_json(exchange)?;
        line.push('\n');
        self.output.write_all(line.as_bytes())?;
        self.written += 1;
        debug!(count = self.written, bytes = line.len(), "wrote exchange");
        Ok(())
    }

    /// Number of exchanges written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn flush(&mut self) -> Result<()> {
        self.output.flush()?;
        Ok(())
    }

    /// Flush and return the underlying writer.
    pub fn into_inner(mut self) -> Result<W> {
        self.output.flush()?;
        Ok(self.output)
    }
}

/// The persisted form of an exchange as a JSON object. Key order is not part
/// of the format.
pub fn to_normalized_dict(exchange: &HttpExchange) -> Result<Map<String, Value>> {
    let value = serde_json::to_value(exchange).map_err(Error::Serialize)?;
    match strip_omitted(value) {
        Value::Object(map) => Ok(map),
        other => Err(Error::InvalidField(format!("exchange serialized to non-object: {other}"))),
    }
}

/// The persisted form of an exchange as a single line of JSON, without the
/// line terminator.
pub fn to_json(exchange: &HttpExchange) -> Result<String> {
    let dict = to_normalized_dict(exchange)?;
    serde_json::to_string(&dict).map_err(Error::Serialize)
}

/// Drop `null`, `""` and `bodyAsJson` entries from every object in the tree.
/// Arrays are kept as they are.
fn strip_omitted(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(key, value)| key != BODY_AS_JSON && !is_omitted(value))
                .map(|(key, value)| (key, strip_omitted(value)))
                .collect(),
        ),
        other => other,
    }
}

fn is_omitted(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}
