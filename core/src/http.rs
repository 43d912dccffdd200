//! HTTP requests and responses as plain data.
//!
//! # Design
//! The client builds `HttpRequest` values and interprets `HttpResponse`
//! values; a `Transport` (see `transport`) performs the round-trip in
//! between. Keeping both sides as owned data lets tests assert on exactly
//! what would go over the wire without a server.

use std::fmt;

use serde_json::Value;

use crate::error::ApiError;

/// HTTP method for a request. The API surface only needs these three.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An HTTP request described as plain data.
///
/// `url` is absolute and carries no query string; query parameters live in
/// `query` so transports can encode them their own way.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// First header value whose name matches `name`, ignoring ASCII case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    /// Any 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Status 400 and above.
    pub fn is_failure(&self) -> bool {
        self.status >= 400
    }
}

/// Flatten a JSON object into query pairs.
///
/// Nested objects and arrays use bracket notation (`filters[email]`,
/// `ids[0]`), `null` entries are dropped and booleans become `1`/`0`.
/// `null` or an empty object yields no pairs; any other top-level value is
/// rejected.
pub fn query_pairs(params: &Value) -> Result<Vec<(String, String)>, ApiError> {
    let mut pairs = Vec::new();
    match params {
        Value::Null => {}
        Value::Object(map) => {
            for (key, value) in map {
                flatten(key.clone(), value, &mut pairs);
            }
        }
        other => {
            return Err(ApiError::SerializationError(format!(
                "query parameters must be a JSON object, got {other}"
            )))
        }
    }
    Ok(pairs)
}

fn flatten(key: String, value: &Value, pairs: &mut Vec<(String, String)>) {
    match value {
        Value::Null => {}
        Value::Bool(b) => pairs.push((key, if *b { "1" } else { "0" }.to_string())),
        Value::Number(n) => pairs.push((key, n.to_string())),
        Value::String(s) => pairs.push((key, s.clone())),
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                flatten(format!("{key}[{i}]"), item, pairs);
            }
        }
        Value::Object(map) => {
            for (child, item) in map {
                flatten(format!("{key}[{child}]"), item, pairs);
            }
        }
    }
}
