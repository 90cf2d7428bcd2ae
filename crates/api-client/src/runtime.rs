//! Authenticated request/response cycle against the Kinsta REST API.
//!
//! Expected failures (error statuses, transport failures, timeouts) never surface as `Err` of a
//! Rust error type: they resolve to an [`ApiResult`] carrying a [`ClassifiedError`].

use crate::classify::{ClassifiedError, classify};
use crate::config::{ConfigError, Configuration};
use reqwest::header::ACCEPT;
use reqwest::{Client, Method};
use serde_json::Value;
use std::error::Error as _;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

/// Outcome of a single API call.
pub type ApiResult<T = Value> = std::result::Result<T, ClassifiedError>;

/// Reasons a [`KinstaClient`] cannot be constructed.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Invalid Kinsta API base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("Failed to build HTTP client: {0}")]
    Http(String),
}

/// A single call: method, path relative to the base URL, query pairs, optional JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<Value>,
}

impl ApiRequest {
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append a query pair. Values are sent as given; callers stringify non-string values.
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    #[must_use]
    pub fn json_body(&self) -> Option<&Value> {
        self.body.as_ref()
    }
}

/// HTTP client bound to one [`Configuration`].
#[derive(Debug)]
pub struct KinstaClient {
    config: Configuration,
    http: Client,
    timeout: Duration,
}

impl KinstaClient {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// # Errors
    ///
    /// Returns an error if the base URL does not parse or the HTTP client cannot be built.
    pub fn new(config: Configuration) -> Result<Self, ClientError> {
        Self::with_timeout(config, Self::DEFAULT_TIMEOUT)
    }

    /// # Errors
    ///
    /// Same as [`KinstaClient::new`].
    pub fn with_timeout(config: Configuration, timeout: Duration) -> Result<Self, ClientError> {
        Url::parse(config.base_url()).map_err(|e| ClientError::InvalidBaseUrl {
            url: config.base_url().to_string(),
            reason: e.to_string(),
        })?;

        let http = Client::builder()
            .build()
            .map_err(|e| ClientError::Http(sanitize_reqwest_error(&e)))?;

        Ok(Self {
            config,
            http,
            timeout,
        })
    }

    #[must_use]
    pub fn config(&self) -> &Configuration {
        &self.config
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Perform `req` and parse the JSON response.
    pub async fn request(&self, req: &ApiRequest) -> ApiResult {
        let url = match build_url(self.config.base_url(), req.path(), req.query_pairs()) {
            Ok(url) => url,
            Err(e) => return Err(ClassifiedError::unknown(format!("Invalid request URL: {e}"))),
        };

        debug!(method = %req.method(), url = %redact_url(&url), "kinsta api request");
        let result = self.execute(req, url).await;
        if let Err(e) = &result {
            warn!(
                method = %req.method(),
                path = %req.path(),
                kind = %e.kind(),
                status = ?e.status(),
                retryable = e.is_retryable(),
                "kinsta api request failed"
            );
        }
        result
    }

    /// Like [`KinstaClient::request`], but also gives up when `cancel` fires.
    ///
    /// Cancellation resolves to a retryable `TIMEOUT`; the default timeout still applies.
    pub async fn request_with_cancel(
        &self,
        req: &ApiRequest,
        cancel: &CancellationToken,
    ) -> ApiResult {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                warn!(method = %req.method(), path = %req.path(), "kinsta api request cancelled");
                Err(ClassifiedError::timeout(
                    "Request was cancelled before the Kinsta API responded",
                ))
            }
            result = self.request(req) => result,
        }
    }

    async fn execute(&self, req: &ApiRequest, url: Url) -> ApiResult {
        let mut request = self
            .http
            .request(req.method().clone(), url)
            .bearer_auth(self.config.api_key())
            .header(ACCEPT, "application/json")
            .timeout(self.timeout);
        if let Some(body) = req.json_body() {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(&e))?;

        if status.is_success() {
            parse_success_body(status.as_u16(), &bytes)
        } else {
            let api_message = extract_api_message(&bytes);
            Err(classify(status.as_u16(), api_message.as_deref()))
        }
    }

    fn transport_error(&self, e: &reqwest::Error) -> ClassifiedError {
        if e.is_timeout() {
            ClassifiedError::timeout(format!(
                "Request timed out after {} seconds",
                self.timeout.as_secs_f64()
            ))
        } else if e.is_builder() {
            ClassifiedError::unknown("An unknown error occurred while preparing the request")
        } else {
            ClassifiedError::network(format!("Network error: {}", sanitize_reqwest_error(e)))
        }
    }
}

fn build_url(
    base_url: &str,
    path: &str,
    query: &[(String, String)],
) -> Result<Url, url::ParseError> {
    let url = if path.is_empty() || path.starts_with('/') {
        format!("{base_url}{path}")
    } else {
        format!("{base_url}/{path}")
    };
    let mut url = Url::parse(&url)?;
    if !query.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in query {
            pairs.append_pair(key, value);
        }
    }
    Ok(url)
}

fn parse_success_body(status: u16, bytes: &[u8]) -> ApiResult {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(bytes).map_err(|_| {
        ClassifiedError::unknown("Received a non-JSON response from the Kinsta API")
            .with_status(status)
    })
}

/// Pull a human-readable message out of an error body (`message`, then `error`).
fn extract_api_message(bytes: &[u8]) -> Option<String> {
    let body: Value = serde_json::from_slice(bytes).ok()?;
    ["message", "error"]
        .iter()
        .find_map(|field| body.get(field).and_then(Value::as_str))
        .map(str::to_string)
}

fn redact_url(url: &Url) -> String {
    let mut u = url.clone();
    let _ = u.set_username("");
    let _ = u.set_password(None);
    u.set_query(None);
    u.set_fragment(None);
    u.to_string()
}

/// Error text with any URL reduced to its redacted form and the root cause appended.
fn sanitize_reqwest_error(e: &reqwest::Error) -> String {
    let mut msg = e.to_string();
    if let Some(u) = e.url() {
        msg = msg.replace(u.as_str(), &redact_url(u));
    }
    let mut source = e.source();
    while let Some(cause) = source {
        if cause.source().is_none() {
            msg = format!("{msg}: {cause}");
        }
        source = cause.source();
    }
    msg
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn build_url_joins_without_double_separator() {
        let url = build_url("https://api.example.test/v2", "/sites", &[]).expect("url");
        assert_eq!(url.as_str(), "https://api.example.test/v2/sites");

        let url = build_url("https://api.example.test/v2", "sites", &[]).expect("url");
        assert_eq!(url.as_str(), "https://api.example.test/v2/sites");
    }

    #[test]
    fn build_url_appends_query_pairs_in_order() {
        let query = vec![
            ("company".to_string(), "c 1".to_string()),
            ("limit".to_string(), "10".to_string()),
        ];
        let url = build_url("https://api.example.test/v2", "/sites", &query).expect("url");
        assert_eq!(url.query(), Some("company=c+1&limit=10"));
    }

    #[test]
    fn extract_api_message_prefers_message_over_error() {
        let body = json!({"error": "second", "message": "first"}).to_string();
        assert_eq!(extract_api_message(body.as_bytes()).as_deref(), Some("first"));

        let body = json!({"error": "only error"}).to_string();
        assert_eq!(
            extract_api_message(body.as_bytes()).as_deref(),
            Some("only error")
        );
    }

    #[test]
    fn extract_api_message_tolerates_non_json() {
        assert_eq!(extract_api_message(b"<html>bad gateway</html>"), None);
        assert_eq!(extract_api_message(br#"{"message": 42}"#), None);
    }

    #[test]
    fn empty_success_body_is_null_payload() {
        assert_eq!(parse_success_body(204, b""), Ok(Value::Null));
    }

    #[test]
    fn non_json_success_body_is_unknown() {
        let err = parse_success_body(200, b"OK").unwrap_err();
        assert_eq!(err.kind(), crate::classify::ErrorKind::Unknown);
        assert!(!err.is_retryable());
        assert!(err.message().contains("non-JSON"));
    }

    #[test]
    fn redact_url_drops_query_and_credentials() {
        let url = Url::parse("https://user:pw@api.example.test/v2/sites?company=abc").expect("url");
        assert_eq!(redact_url(&url), "https://api.example.test/v2/sites");
    }

    #[test]
    fn client_rejects_unparsable_base_url() {
        let cfg = Configuration::new("key", "company", "not a url");
        let err = KinstaClient::new(cfg).unwrap_err();
        assert!(matches!(err, ClientError::InvalidBaseUrl { .. }));
    }
}
