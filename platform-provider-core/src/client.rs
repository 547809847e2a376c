//! Transport Core: the single choke point for every call to the remote service.
//!
//! [`ApiClient`] turns an [`ApiRequest`] (method, versioned path, optional
//! body) into a fully authenticated [`HttpRequest`], runs it through an
//! [`HttpBackend`] under a deadline, and classifies the outcome:
//!
//! - status `< 400` is success;
//! - status `>= 400` becomes [`TransportError::Status`] carrying the URL, the
//!   status code and the drained body text, so callers never re-read a stream;
//! - an empty body on an endpoint that promises one is [`TransportError::EmptyBody`].
//!
//! Four response shapes are offered: raw bytes ([`ApiClient::send_bytes`]), a
//! replayable reader ([`ApiClient::send_reader`]), a live streaming reader
//! ([`ApiClient::send_streaming`]) and the unclassified response for callers
//! that inspect status codes themselves ([`ApiClient::send_raw`]).
//!
//! Nothing is retried here.

use std::io::{self, Cursor};
use std::time::Duration;

use futures::io::AsyncRead;
use futures::{StreamExt, TryStreamExt};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error};

use crate::config::ProviderConfig;
use crate::contract::{BodyStream, HttpBackend, HttpRequest, HttpResponse};
use crate::error::{ProviderError, TransportError};

pub const OPERATION_HEADER: &str = "X-Provider-Operation";
const USER_AGENT: &str = concat!("platform-provider/", env!("CARGO_PKG_VERSION"));

/// Live response body handed out by [`ApiClient::send_streaming`].
pub type BodyReader = Box<dyn AsyncRead + Send + Unpin>;

/// Joins `collection` and one caller-supplied path segment, percent-encoding
/// the segment so `/`, `?` and `#` inside it cannot change the target.
pub fn item_path(collection: &str, segment: &str) -> Result<String, TransportError> {
    if matches!(segment, "" | "." | "..") {
        return Err(TransportError::InvalidRequest(format!(
            "{segment:?} is not a valid path segment"
        )));
    }
    Ok(format!(
        "{}/{}",
        collection.trim_end_matches('/'),
        urlencoding::encode(segment)
    ))
}

/// A request relative to the service base URL, before authentication.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    headers: Vec<(String, String)>,
    query: Vec<(String, String)>,
    body: Option<Vec<u8>>,
    timeout: Option<Duration>,
    operation: Option<String>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: Vec::new(),
            query: Vec::new(),
            body: None,
            timeout: None,
            operation: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Serializes `body` as the JSON request payload.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, TransportError> {
        let bytes = serde_json::to_vec(body)
            .map_err(|e| TransportError::InvalidRequest(format!("unserializable body: {e}")))?;
        self.body = Some(bytes);
        Ok(self)
    }

    pub fn body(mut self, bytes: Vec<u8>) -> Self {
        self.body = Some(bytes);
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Deadline for this call only; the client default applies otherwise.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Tag sent in the operation header, e.g. `knowledge.create`.
    pub fn operation(mut self, tag: impl Into<String>) -> Self {
        self.operation = Some(tag.into());
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Authenticated client over an [`HttpBackend`].
pub struct ApiClient<B> {
    backend: B,
    base_url: String,
    api_key: String,
    timeout: Duration,
    organization: Option<String>,
    user_email: Option<String>,
}

impl<B: HttpBackend> ApiClient<B> {
    pub fn new(backend: B, config: &ProviderConfig) -> Result<Self, ProviderError> {
        config.validate()?;
        Ok(Self {
            backend,
            base_url: config.resolved_base_url(),
            api_key: config.api_key.clone(),
            timeout: config.timeout(),
            organization: config.organization.clone(),
            user_email: config.user_email.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Adds the organization and requester scoping legacy endpoints expect.
    pub fn legacy_scope(&self, mut request: ApiRequest) -> ApiRequest {
        if let Some(org) = &self.organization {
            request = request.query("org", org.clone());
        }
        if let Some(email) = &self.user_email {
            request = request.query("email", email.clone());
        }
        request
    }

    fn build(&self, request: ApiRequest) -> HttpRequest {
        let operation = request
            .operation
            .unwrap_or_else(|| format!("{} {}", request.method, request.path));
        let mut headers = vec![
            ("Authorization".to_string(), format!("Bearer {}", self.api_key)),
            (OPERATION_HEADER.to_string(), operation),
            ("Accept".to_string(), "application/json".to_string()),
            ("User-Agent".to_string(), USER_AGENT.to_string()),
        ];
        if request.body.is_some() {
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
        }
        headers.extend(request.headers);

        let path = request.path.trim_start_matches('/');
        HttpRequest {
            method: request.method,
            url: format!("{}/{}", self.base_url, path),
            headers,
            query: request.query,
            body: request.body,
            timeout: request.timeout.unwrap_or(self.timeout),
        }
    }

    /// Executes the request under its deadline without looking at the status.
    ///
    /// Used by deletion paths that decide for themselves what a 404 means.
    pub async fn send_raw(&self, request: ApiRequest) -> Result<HttpResponse, TransportError> {
        let http = self.build(request);
        let url = http.url.clone();
        let deadline = http.timeout;
        debug!(method = %http.method, url = %url, "Sending request");

        match tokio::time::timeout(deadline, self.backend.send(http)).await {
            Ok(Ok(response)) => {
                debug!(
                    url = %url,
                    status = response.status,
                    bytes = response.body.len(),
                    "Received response"
                );
                Ok(response)
            }
            Ok(Err(e)) => {
                error!(url = %url, error = %e, "Request failed");
                Err(e)
            }
            Err(_) => {
                error!(url = %url, timeout_ms = deadline.as_millis(), "Request timed out");
                Err(TransportError::Timeout {
                    url,
                    timeout_ms: deadline.as_millis(),
                })
            }
        }
    }

    /// Executes the request and fails on any status >= 400. The body may be empty.
    pub async fn send_checked(&self, request: ApiRequest) -> Result<HttpResponse, TransportError> {
        let response = self.send_raw(request).await?;
        classify(response)
    }

    /// Raw bytes of a successful response that promises a body.
    pub async fn send_bytes(&self, request: ApiRequest) -> Result<Vec<u8>, TransportError> {
        let response = self.send_checked(request).await?;
        if response.body.iter().all(u8::is_ascii_whitespace) {
            error!(url = %response.url, "Success status with an empty body");
            return Err(TransportError::EmptyBody { url: response.url });
        }
        Ok(response.body)
    }

    /// Like [`send_bytes`](Self::send_bytes), wrapped in a reader that can be rewound.
    pub async fn send_reader(
        &self,
        request: ApiRequest,
    ) -> Result<Cursor<Vec<u8>>, TransportError> {
        self.send_bytes(request).await.map(Cursor::new)
    }

    /// Decodes a successful JSON response into `T`.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
        context: &str,
    ) -> Result<T, ProviderError> {
        let bytes = self.send_bytes(request).await?;
        serde_json::from_slice(&bytes).map_err(|e| ProviderError::decode(context, e))
    }

    /// Returns the body as a live reader. On failure the body is drained into
    /// the error and the stream is dropped before returning.
    pub async fn send_streaming(&self, request: ApiRequest) -> Result<BodyReader, TransportError> {
        let http = self.build(request);
        let url = http.url.clone();
        let deadline = http.timeout;
        let timeout = || TransportError::Timeout {
            url: url.clone(),
            timeout_ms: deadline.as_millis(),
        };
        debug!(method = %http.method, url = %url, "Opening streaming request");

        let response = tokio::time::timeout(deadline, self.backend.open(http))
            .await
            .map_err(|_| timeout())??;

        if response.status < 400 {
            let reader = response.body.map_err(into_io as fn(TransportError) -> io::Error);
            return Ok(Box::new(reader.into_async_read()));
        }

        let status = response.status;
        let body = tokio::time::timeout(deadline, drain(response.body))
            .await
            .map_err(|_| timeout())?;
        let body = String::from_utf8_lossy(&body).into_owned();
        error!(url = %url, status, body = %body, "Streaming request failed");
        Err(TransportError::Status { url, status, body })
    }
}

fn classify(response: HttpResponse) -> Result<HttpResponse, TransportError> {
    if response.is_success() {
        return Ok(response);
    }
    let body = response.text();
    error!(
        url = %response.url,
        status = response.status,
        body = %body,
        "Remote service returned an error"
    );
    Err(TransportError::Status {
        url: response.url,
        status: response.status,
        body,
    })
}

// Consumes the stream and drops it; a mid-body error keeps what was read.
async fn drain(mut stream: BodyStream) -> Vec<u8> {
    let mut body = Vec::new();
    while let Some(chunk) = stream.next().await {
        match chunk {
            Ok(bytes) => body.extend_from_slice(&bytes),
            Err(e) => {
                debug!(error = %e, "Body stream ended early while draining");
                break;
            }
        }
    }
    drop(stream);
    body
}

fn into_io(err: TransportError) -> io::Error {
    io::Error::new(io::ErrorKind::Other, err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::MockHttpBackend;

    fn client(backend: MockHttpBackend) -> ApiClient<MockHttpBackend> {
        let mut config = ProviderConfig::new("secret-key");
        config.base_url = Some("https://api.test/".into());
        config.organization = Some("acme".into());
        config.user_email = Some("ops@acme.io".into());
        ApiClient::new(backend, &config).unwrap()
    }

    #[tokio::test]
    async fn build_injects_auth_and_operation_headers() {
        let mut backend = MockHttpBackend::new();
        backend
            .expect_send()
            .withf(|req| {
                req.url == "https://api.test/api/v1/knowledge"
                    && req.header("authorization") == Some("Bearer secret-key")
                    && req.header(OPERATION_HEADER) == Some("knowledge.create")
                    && req.header("content-type") == Some("application/json")
                    && req.query_param("org") == Some("acme")
                    && req.query_param("email") == Some("ops@acme.io")
            })
            .times(1)
            .returning(|req| Ok(HttpResponse::new(req.url, 200, b"{}".to_vec())));

        let client = client(backend);
        let request = client.legacy_scope(
            ApiRequest::post("/api/v1/knowledge")
                .json(&serde_json::json!({"name": "x"}))
                .unwrap()
                .operation("knowledge.create"),
        );
        client.send_bytes(request).await.unwrap();
    }

    #[test]
    fn item_path_encodes_reserved_characters() {
        assert_eq!(item_path("/api/v3/runners", "edge").unwrap(), "/api/v3/runners/edge");
        assert_eq!(
            item_path("/api/v3/runners", "../../v1/agents/a-1").unwrap(),
            "/api/v3/runners/..%2F..%2Fv1%2Fagents%2Fa-1"
        );
        assert_eq!(
            item_path("/api/v1/agents/", "a?b#c d").unwrap(),
            "/api/v1/agents/a%3Fb%23c%20d"
        );
    }

    #[test]
    fn item_path_rejects_dot_segments() {
        for segment in ["", ".", ".."] {
            let err = item_path("/api/v3/runners", segment).unwrap_err();
            assert!(matches!(err, TransportError::InvalidRequest(_)), "got {err:?}");
        }
    }

    #[tokio::test]
    async fn send_raw_does_not_classify_status() {
        let mut backend = MockHttpBackend::new();
        backend
            .expect_send()
            .returning(|req| Ok(HttpResponse::new(req.url, 404, Vec::new())));

        let response = client(backend)
            .send_raw(ApiRequest::delete("/api/v1/knowledge/k1"))
            .await
            .unwrap();
        assert_eq!(response.status, 404);
    }

    #[tokio::test]
    async fn send_checked_accepts_empty_success_body() {
        let mut backend = MockHttpBackend::new();
        backend
            .expect_send()
            .returning(|req| Ok(HttpResponse::new(req.url, 204, Vec::new())));

        let response = client(backend)
            .send_checked(ApiRequest::delete("/api/v1/agents/a1"))
            .await
            .unwrap();
        assert_eq!(response.status, 204);
    }
}
