//! Adapters for request/response objects produced by a transport library.
//!
//! # Design
//! The builders only need four accessors from a transport message, so they
//! are expressed as traits rather than tied to one client. Implementations
//! are provided for the `http` crate's `Request<B>` and `Response<B>`, which
//! hyper, axum, reqwest and ureq all hand out; anything whose body is
//! `AsRef<[u8]>` (`String`, `Vec<u8>`, `Bytes`, ...) qualifies.
//!
//! Header values that are not valid UTF-8 are decoded lossily; bodies are
//! checked strictly by the builders.

use http::header::HOST;

/// What `RequestBuilder::from_transport_request` reads from a request.
pub trait TransportRequest {
    /// Method name in any case, e.g. `GET`.
    fn method(&self) -> String;

    /// Absolute URL, e.g. `https://httpbin.org/ip`.
    fn url(&self) -> String;

    /// Header pairs in arrival order; repeated names appear repeatedly.
    fn headers(&self) -> Vec<(String, String)>;

    fn body(&self) -> &[u8];
}

/// What `ResponseBuilder::from_transport_response` reads from a response.
pub trait TransportResponse {
    fn status_code(&self) -> u16;

    /// Header pairs in arrival order; repeated names appear repeatedly.
    fn headers(&self) -> Vec<(String, String)>;

    fn body(&self) -> &[u8];
}

fn header_pairs(headers: &http::HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect()
}

impl<B: AsRef<[u8]>> TransportRequest for http::Request<B> {
    fn method(&self) -> String {
        self.method().as_str().to_string()
    }

    /// Client-side requests carry an absolute URI. Server-side requests only
    /// carry the path, so the authority comes from the `Host` header and the
    /// scheme defaults to `http`.
    fn url(&self) -> String {
        let uri = self.uri();
        if uri.scheme().is_some() && uri.authority().is_some() {
            return uri.to_string();
        }
        let host = self
            .headers()
            .get(HOST)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        let path = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
        format!("http://{host}{path}")
    }

    fn headers(&self) -> Vec<(String, String)> {
        header_pairs(self.headers())
    }

    fn body(&self) -> &[u8] {
        self.body().as_ref()
    }
}

impl<B: AsRef<[u8]>> TransportResponse for http::Response<B> {
    fn status_code(&self) -> u16 {
        self.status().as_u16()
    }

    fn headers(&self) -> Vec<(String, String)> {
        header_pairs(self.headers())
    }

    fn body(&self) -> &[u8] {
        self.body().as_ref()
    }
}
