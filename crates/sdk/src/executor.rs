// Request Executor - one HTTP call per API method
//
// The endpoint (base URL, TLS flag, pooled client) sits behind a RwLock that
// is only held to copy or replace it. Requests run on a snapshot.

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::config::{ClientConfig, Timeouts};
use crate::error::{ApiError, Result};

/// Methods the APIs accept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    fn as_method(self) -> Method {
        match self {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_method().as_str())
    }
}

/// Request body
#[derive(Debug, Default)]
pub enum RequestBody {
    #[default]
    None,
    /// `application/x-www-form-urlencoded` fields (Data Manager)
    Form(Vec<(String, String)>),
    /// JSON document (Account Server)
    Json(serde_json::Value),
    /// `multipart/form-data` (file uploads)
    Multipart(reqwest::multipart::Form),
}

/// A single API request
///
/// # Example
/// ```text
/// ApiRequest::post("/project")
///     .label("Failed creating project")
///     .expecting(&[StatusCode::CREATED])
///     .form("name", "my-project")
/// ```
#[derive(Debug)]
pub struct ApiRequest {
    method: HttpMethod,
    endpoint: String,
    label: String,
    expected: Vec<StatusCode>,
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    body: RequestBody,
    timeout: Option<Duration>,
}

impl ApiRequest {
    pub fn new(method: HttpMethod, endpoint: impl Into<String>) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            label: "API request failed".to_string(),
            expected: vec![StatusCode::OK],
            query: Vec::new(),
            headers: Vec::new(),
            body: RequestBody::None,
            timeout: None,
        }
    }

    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, endpoint)
    }

    pub fn post(endpoint: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, endpoint)
    }

    pub fn put(endpoint: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, endpoint)
    }

    pub fn patch(endpoint: impl Into<String>) -> Self {
        Self::new(HttpMethod::Patch, endpoint)
    }

    pub fn delete(endpoint: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, endpoint)
    }

    /// Message used when the request fails
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Status codes treated as success (default 200)
    pub fn expecting(mut self, codes: &[StatusCode]) -> Self {
        self.expected = codes.to_vec();
        self
    }

    pub fn query(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((name.into(), value.to_string()));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Add a form field, switching the body to a form if it isn't one
    pub fn form(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        let field = (name.into(), value.to_string());
        match &mut self.body {
            RequestBody::Form(fields) => fields.push(field),
            body => *body = RequestBody::Form(vec![field]),
        }
        self
    }

    pub fn json(mut self, value: serde_json::Value) -> Self {
        self.body = RequestBody::Json(value);
        self
    }

    pub fn multipart(mut self, form: reqwest::multipart::Form) -> Self {
        self.body = RequestBody::Multipart(form);
        self
    }

    /// Override the executor's default request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// A successful response
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: StatusCode,
    /// Decoded JSON body, or an empty object if the body is not JSON
    pub payload: serde_json::Value,
}

impl ApiResponse {
    /// Decode the payload into a typed response
    pub fn into_typed<T: DeserializeOwned>(self) -> Result<T> {
        Ok(serde_json::from_value(self.payload)?)
    }
}

#[derive(Debug, Clone)]
struct Endpoint {
    base_url: Option<String>,
    verify_tls: bool,
    http: reqwest::Client,
}

/// Issues API requests against a configurable base URL
#[derive(Debug)]
pub struct RequestExecutor {
    endpoint: RwLock<Endpoint>,
    timeouts: Timeouts,
}

impl RequestExecutor {
    /// Create an executor from a client configuration
    ///
    /// # Errors
    /// `InvalidArgument` if the configured URL is not a valid URL,
    /// `Transport` if the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let base_url = config.base_url.as_deref().map(normalise_url).transpose()?;

        Ok(Self {
            endpoint: RwLock::new(Endpoint {
                base_url,
                verify_tls: config.verify_tls,
                http: build_http_client(config.verify_tls)?,
            }),
            timeouts: config.timeouts,
        })
    }

    /// Replace the API URL and the TLS verification flag.
    ///
    /// Requests already in flight keep the endpoint they started with.
    pub fn set_api_url(&self, url: &str, verify_tls: bool) -> Result<()> {
        let base_url = normalise_url(url)?;
        let http = build_http_client(verify_tls)?;

        let mut endpoint = self.endpoint.write().unwrap_or_else(PoisonError::into_inner);
        *endpoint = Endpoint {
            base_url: Some(base_url),
            verify_tls,
            http,
        };
        Ok(())
    }

    /// The current API URL (if set) and TLS verification flag
    pub fn api_url(&self) -> (Option<String>, bool) {
        let endpoint = self.endpoint.read().unwrap_or_else(PoisonError::into_inner);
        (endpoint.base_url.clone(), endpoint.verify_tls)
    }

    pub fn timeouts(&self) -> Timeouts {
        self.timeouts
    }

    /// Issue the request and decode the response body.
    ///
    /// # Arguments
    /// * `token` - Bearer token, omitted for unauthenticated endpoints
    /// * `request` - The request to send
    pub async fn execute(&self, token: Option<&str>, request: ApiRequest) -> Result<ApiResponse> {
        let label = request.label.clone();
        let response = self.send(token, request).await?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|source| ApiError::Transport { label, source })?;

        let payload = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| serde_json::Value::Object(serde_json::Map::new()));

        Ok(ApiResponse { status, payload })
    }

    /// Issue the request and return the status-checked raw response
    /// (used to stream downloads).
    pub async fn send(
        &self,
        token: Option<&str>,
        request: ApiRequest,
    ) -> Result<reqwest::Response> {
        let ApiRequest {
            method,
            endpoint,
            label,
            expected,
            query,
            headers,
            body,
            timeout,
        } = request;

        if endpoint.trim().is_empty() {
            return Err(ApiError::invalid("endpoint cannot be empty"));
        }
        if matches!(token, Some(t) if t.trim().is_empty()) {
            return Err(ApiError::invalid("access token cannot be empty"));
        }

        let (base_url, http) = self.snapshot()?;
        let url = format!("{}{}", base_url, endpoint);

        let mut builder = http
            .request(method.as_method(), &url)
            .timeout(timeout.unwrap_or(self.timeouts.request));
        if !query.is_empty() {
            builder = builder.query(&query);
        }
        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        builder = match body {
            RequestBody::None => builder,
            RequestBody::Form(fields) => builder.form(&fields),
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart(form) => builder.multipart(form),
        };

        let started = Instant::now();
        let result = builder.send().await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let response = match result {
            Ok(response) => response,
            Err(source) => {
                warn!(method = %method, url = %url, elapsed_ms, error = %source, "{}", label);
                return Err(ApiError::Transport { label, source });
            }
        };

        let status = response.status();
        debug!(
            method = %method,
            url = %url,
            query = ?query,
            expected = ?expected,
            status = status.as_u16(),
            elapsed_ms,
            "API request"
        );

        if !expected.contains(&status) {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::UnexpectedStatus {
                label,
                status,
                body,
            });
        }

        Ok(response)
    }

    fn snapshot(&self) -> Result<(String, reqwest::Client)> {
        let endpoint = self.endpoint.read().unwrap_or_else(PoisonError::into_inner);
        let base_url = endpoint.base_url.clone().ok_or(ApiError::NoApiUrl)?;
        Ok((base_url, endpoint.http.clone()))
    }
}

fn normalise_url(url: &str) -> Result<String> {
    let url = url.trim().trim_end_matches('/');
    if url.is_empty() {
        return Err(ApiError::invalid("API URL cannot be empty"));
    }
    reqwest::Url::parse(url)
        .map_err(|e| ApiError::invalid(format!("invalid API URL '{}': {}", url, e)))?;
    Ok(url.to_string())
}

fn build_http_client(verify_tls: bool) -> Result<reqwest::Client> {
    if !verify_tls {
        warn!("TLS certificate verification is disabled");
    }
    reqwest::Client::builder()
        .danger_accept_invalid_certs(!verify_tls)
        .build()
        .map_err(|source| ApiError::Transport {
            label: "Failed to build HTTP client".to_string(),
            source,
        })
}
