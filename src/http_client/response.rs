//! HTTP request and response values exchanged with a [`Transport`](super::Transport).

use std::borrow::Cow;
use std::str::Utf8Error;

use reqwest::{Method, StatusCode};
use serde_json::Value;

/// Outbound request, independent of the client that sends it.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
    /// HTTP basic credentials (user, password).
    pub basic_auth: Option<(String, String)>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
            basic_auth: None,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn headers(mut self, headers: impl IntoIterator<Item = (String, String)>) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Attach a JSON body.
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn basic_auth(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.basic_auth = Some((user.into(), password.into()));
        self
    }

    /// Look up a header value by case-insensitive name.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Fully read HTTP response.
///
/// The body is kept as raw bytes; callers choose strict or lossy decoding.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Check if the response is successful.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// The body as UTF-8, failing on any invalid sequence.
    pub fn text(&self) -> Result<&str, Utf8Error> {
        std::str::from_utf8(&self.body)
    }

    /// The body as UTF-8 with invalid sequences replaced.
    pub fn text_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let request = HttpRequest::post("https://example.com")
            .header("X-Centris-Uck", "token")
            .json(serde_json::json!({"startPosition": 0}));
        assert_eq!(request.header_value("x-centris-uck"), Some("token"));
        assert_eq!(request.header_value("missing"), None);
        assert_eq!(request.method, Method::POST);
    }

    #[test]
    fn test_strict_text_rejects_invalid_utf8() {
        let response = HttpResponse::new(StatusCode::OK, vec![0xff, 0xfe, b't', b'o', b'k']);
        assert!(response.text().is_err());
        assert_eq!(response.text_lossy(), "\u{fffd}\u{fffd}tok");
        assert!(response.is_success());

        let response = HttpResponse::new(StatusCode::OK, "tok");
        assert_eq!(response.text().unwrap(), "tok");
    }
}
