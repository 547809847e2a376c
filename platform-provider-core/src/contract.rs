//! # contract: the I/O seam between the core and the network
//!
//! This module defines a single trait ([`HttpBackend`]) and the plain data
//! types that cross it. The core never opens sockets itself: the adapter crate
//! provides a `reqwest`-backed implementation, and tests substitute the
//! `mockall` generated [`MockHttpBackend`].
//!
//! ## Contract
//! - [`HttpBackend::send`] must drain and close the response body before it
//!   returns; the returned [`HttpResponse`] owns every byte.
//! - [`HttpBackend::open`] hands back a live body stream; whoever holds the
//!   [`StreamingResponse`] owns the connection until the stream is dropped.
//! - Neither method classifies status codes. That is the Transport Core's job
//!   (see [`crate::client`]), so every backend gets identical error semantics.
//!
//! ## Mocking & Testing
//! The trait is annotated for `mockall`; the mock is exported under the
//! default `test-export-mocks` feature so integration tests can reach it.

use std::time::Duration;

use async_trait::async_trait;
use futures::stream::BoxStream;
use reqwest::Method;

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::error::TransportError;

/// A fully built outbound request: URL resolved, headers injected.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    /// Absolute URL without the query string.
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
    pub timeout: Duration,
}

impl HttpRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Request body parsed as JSON, for assertions in tests and debug logging.
    pub fn json_body(&self) -> Option<serde_json::Value> {
        self.body
            .as_deref()
            .and_then(|b| serde_json::from_slice(b).ok())
    }
}

/// A response whose body has already been read to the end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub url: String,
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(url: impl Into<String>, status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            url: url.into(),
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status < 400
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Chunks of a response body as they arrive off the wire.
pub type BodyStream = BoxStream<'static, Result<Vec<u8>, TransportError>>;

/// A response whose body has not been read yet.
pub struct StreamingResponse {
    pub url: String,
    pub status: u16,
    pub body: BodyStream,
}

impl std::fmt::Debug for StreamingResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingResponse")
            .field("url", &self.url)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// Executes requests against the remote service.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait HttpBackend: Send + Sync {
    /// Execute the request and buffer the whole body.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;

    /// Execute the request and return the body as a live stream.
    async fn open(&self, request: HttpRequest) -> Result<StreamingResponse, TransportError>;
}
