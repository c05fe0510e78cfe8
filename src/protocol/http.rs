//! Requests and responses seen by the fetch handler

use serde::{Deserialize, Serialize};
use url::Url;

/// An outbound request from a foreground window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Upper-case HTTP method
    pub method: String,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Request {
    pub fn new(method: &str, url: Url) -> Self {
        Self {
            method: method.to_ascii_uppercase(),
            url,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn get(url: Url) -> Self {
        Self::new("GET", url)
    }

    pub fn is_get(&self) -> bool {
        self.method == "GET"
    }
}

/// A response, either from the network or from a cache bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: u16, status_text: &str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            status_text: status_text.to_string(),
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// 200 response with a content type
    pub fn ok(content_type: &str, body: impl Into<Vec<u8>>) -> Self {
        Self::new(200, "OK", body).with_header("content-type", content_type)
    }

    /// Synthetic answer when neither the network nor the cache can help
    pub fn offline() -> Self {
        Self::new(503, "Offline", "Offline").with_header("content-type", "text/plain; charset=utf-8")
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// True for 2xx statuses
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}
