//! Production [`HttpBackend`] over `reqwest`.
//!
//! The core's Transport Core decides what a status code means; this backend
//! only moves bytes and maps `reqwest` failures into [`TransportError`].

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use platform_provider_core::contract::{HttpBackend, HttpRequest, HttpResponse, StreamingResponse};
use platform_provider_core::error::TransportError;
use reqwest::{Client, RequestBuilder};
use tracing::{debug, error};

#[derive(Debug, Clone, Default)]
pub struct ReqwestBackend {
    client: Client,
}

impl ReqwestBackend {
    pub fn new() -> Result<Self, TransportError> {
        let client = Client::builder().build().map_err(|e| {
            error!(error = ?e, "Failed to build HTTP client");
            TransportError::InvalidRequest(format!("failed to build HTTP client: {e}"))
        })?;
        Ok(Self { client })
    }

    /// Wraps an existing client, e.g. one with custom TLS roots or a proxy.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    fn prepare(&self, request: HttpRequest) -> RequestBuilder {
        let mut builder = self
            .client
            .request(request.method, &request.url)
            .timeout(request.timeout);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        builder
    }
}

fn transport_error(url: &str, timeout: Duration, e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout {
            url: url.to_string(),
            timeout_ms: timeout.as_millis(),
        }
    } else if e.is_builder() {
        TransportError::InvalidRequest(e.to_string())
    } else {
        TransportError::Network {
            url: url.to_string(),
            source: Box::new(e),
        }
    }
}

#[async_trait]
impl HttpBackend for ReqwestBackend {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = request.url.clone();
        let timeout = request.timeout;
        let response = self
            .prepare(request)
            .send()
            .await
            .map_err(|e| transport_error(&url, timeout, e))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| transport_error(&url, timeout, e))?;
        debug!(url = %url, status, bytes = body.len(), "Response body read");
        Ok(HttpResponse::new(url, status, body.to_vec()))
    }

    async fn open(&self, request: HttpRequest) -> Result<StreamingResponse, TransportError> {
        let url = request.url.clone();
        let timeout = request.timeout;
        let response = self
            .prepare(request)
            .send()
            .await
            .map_err(|e| transport_error(&url, timeout, e))?;
        let status = response.status().as_u16();
        let chunk_url = url.clone();
        let body = response
            .bytes_stream()
            .map(move |chunk| {
                chunk
                    .map(|bytes| bytes.to_vec())
                    .map_err(|e| transport_error(&chunk_url, timeout, e))
            })
            .boxed();
        Ok(StreamingResponse { url, status, body })
    }
}
