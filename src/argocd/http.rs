//! reqwest adapter for [`ArgocdApi`]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::retry::{RetryConfig, is_retryable_error, with_retry_if};
use crate::config::ArgocdInstance;
use crate::error::{Result, ServerError};
use crate::ports::{ApiRequest, ArgocdApi, HttpMethod};
use crate::security::Sanitizer;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Bytes of an error body kept when it is not JSON
const ERROR_BODY_LIMIT: usize = 200;

/// HTTP transport to one ArgoCD instance
///
/// Requests go to `{url}/api/v1` with the instance's bearer token. Timeouts
/// are retried; every response is passed through the sanitizer.
pub struct ArgocdHttp {
    name: String,
    base_url: String,
    http: reqwest::Client,
    sanitizer: Arc<Sanitizer>,
    retry: RetryConfig,
}

impl ArgocdHttp {
    /// # Errors
    ///
    /// Returns an error if the token is not a valid header value or the
    /// HTTP client cannot be built.
    pub fn new(instance: &ArgocdInstance, sanitizer: Arc<Sanitizer>) -> Result<Self> {
        Self::with_options(instance, sanitizer, DEFAULT_TIMEOUT, RetryConfig::default())
    }

    /// # Errors
    ///
    /// See [`new`](Self::new).
    pub fn with_options(
        instance: &ArgocdInstance,
        sanitizer: Arc<Sanitizer>,
        timeout: Duration,
        retry: RetryConfig,
    ) -> Result<Self> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", instance.token.as_str()))
            .map_err(|e| ServerError::ConfigInvalid {
                field: format!("instances.{}.token", instance.name),
                reason: e.to_string(),
            })?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .danger_accept_invalid_certs(instance.insecure)
            .timeout(timeout)
            .build()
            .map_err(|e| ServerError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            name: instance.name.clone(),
            base_url: format!("{}/api/v1", instance.url),
            http,
            sanitizer,
            retry,
        })
    }

    async fn send_once(&self, request: &ApiRequest) -> Result<Value> {
        let url = format!("{}{}", self.base_url, request.path);
        debug!(
            method = %request.method,
            path = %request.path,
            instance = %self.name,
            "Making ArgoCD API request"
        );

        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.http.request(method, &url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| transport_error(&e, request))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| transport_error(&e, request))?;

        if status >= 400 {
            warn!(
                method = %request.method,
                path = %request.path,
                instance = %self.name,
                status = status,
                body = %truncate(&body, ERROR_BODY_LIMIT),
                "ArgoCD API error"
            );
            return Err(api_error(status, &body));
        }

        if body.trim().is_empty() {
            return Ok(Value::Object(Map::new()));
        }

        let value: Value = serde_json::from_str(&body)?;
        match self.sanitizer.mask_value(value) {
            masked @ Value::Object(_) => Ok(masked),
            _ => Ok(Value::Object(Map::new())),
        }
    }
}

#[async_trait]
impl ArgocdApi for ArgocdHttp {
    fn instance_name(&self) -> &str {
        &self.name
    }

    async fn request(&self, request: ApiRequest) -> Result<Value> {
        let operation = format!("{} {}", request.method, request.path);
        with_retry_if(
            &self.retry,
            &operation,
            || self.send_once(&request),
            is_retryable_error,
        )
        .await
    }
}

fn transport_error(error: &reqwest::Error, request: &ApiRequest) -> ServerError {
    if error.is_timeout() {
        ServerError::Timeout(format!("{} {}", request.method, request.path))
    } else {
        ServerError::Http(error.to_string())
    }
}

/// Build an API error from the `message` / `error` fields of a JSON body
fn api_error(code: u16, body: &str) -> ServerError {
    let fallback = format!("HTTP {code}");
    match serde_json::from_str::<Value>(body) {
        Ok(json) => ServerError::Api {
            code,
            message: json
                .get("message")
                .and_then(Value::as_str)
                .map_or(fallback, str::to_string),
            details: json.get("error").and_then(Value::as_str).map(str::to_string),
        },
        Err(_) => ServerError::Api {
            code,
            message: fallback,
            details: (!body.is_empty()).then(|| truncate(body, ERROR_BODY_LIMIT)),
        },
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
