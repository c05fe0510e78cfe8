//! Network access for the fetch handler and install step

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::HeaderName, header::HeaderValue, Client, Method};
use tracing::debug;

use crate::{
    error::{Result, WorkerError},
    protocol::{Request, Response},
};

/// Performs network requests.
///
/// Like the browser `fetch`, an HTTP error status is still a successful
/// fetch; only transport failures are errors.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<Response>;
}

/// Headers that describe a single hop and must not be forwarded
const HOP_BY_HOP: [&str; 6] = [
    "connection",
    "host",
    "keep-alive",
    "transfer-encoding",
    "upgrade",
    "content-length",
];

/// `reqwest`-backed fetcher used in production
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WorkerError::Network(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response> {
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|e| WorkerError::Network(format!("Invalid method {}: {}", request.method, e)))?;

        let mut builder = self.client.request(method, request.url.clone());
        for (name, value) in &request.headers {
            if HOP_BY_HOP.contains(&name.to_ascii_lowercase().as_str()) {
                continue;
            }
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                builder = builder.header(name, value);
            }
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| WorkerError::Network(format!("{} {}: {}", request.method, request.url, e)))?;

        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .filter(|(name, _)| !HOP_BY_HOP.contains(&name.as_str()))
            .filter_map(|(name, value)| {
                value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| WorkerError::Network(format!("Failed to read body of {}: {}", request.url, e)))?;

        debug!("{} {} -> {}", request.method, request.url, status.as_u16());

        Ok(Response {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body: body.to_vec(),
        })
    }
}
