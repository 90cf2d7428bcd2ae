//! Classification of failed Kinsta API calls.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    Unauthorized,
    Forbidden,
    NotFound,
    RateLimited,
    ValidationError,
    ServerError,
    NetworkError,
    Timeout,
    Unknown,
}

impl ErrorKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::NotFound => "NOT_FOUND",
            Self::RateLimited => "RATE_LIMITED",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::ServerError => "SERVER_ERROR",
            Self::NetworkError => "NETWORK_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Whether a caller may reasonably retry a request that failed with this kind.
    #[must_use]
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::RateLimited | Self::ServerError | Self::Timeout)
    }

    /// Fixed user-facing text that replaces the classified message when rendering.
    #[must_use]
    pub fn friendly_message(self) -> Option<&'static str> {
        match self {
            Self::Unauthorized => Some(UNAUTHORIZED_MESSAGE),
            Self::Forbidden => Some(FORBIDDEN_MESSAGE),
            Self::RateLimited => Some(RATE_LIMITED_MESSAGE),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const UNAUTHORIZED_MESSAGE: &str =
    "Invalid or expired API key. Check the KINSTA_API_KEY environment variable.";
const FORBIDDEN_MESSAGE: &str =
    "Insufficient permissions. The API key does not have access to this resource.";
const RATE_LIMITED_MESSAGE: &str =
    "Rate limit exceeded. Wait before making more requests to the Kinsta API.";

/// A failed API call, tagged with a stable kind.
///
/// Values are only built by the constructors in this module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(rename_all = "camelCase")]
#[error("{message}")]
pub struct ClassifiedError {
    kind: ErrorKind,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_message: Option<String>,
    retryable: bool,
}

impl ClassifiedError {
    fn new(kind: ErrorKind, message: String) -> Self {
        Self {
            kind,
            message,
            status: None,
            api_message: None,
            retryable: kind.is_retryable(),
        }
    }

    pub(crate) fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message.into())
    }

    pub(crate) fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NetworkError, message.into())
    }

    pub(crate) fn unknown(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unknown, message.into())
    }

    pub(crate) fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// Message extracted from the response body, if any.
    #[must_use]
    pub fn api_message(&self) -> Option<&str> {
        self.api_message.as_deref()
    }

    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.retryable
    }
}

/// Map an HTTP status (plus an optional message taken from the response body) to an error.
#[must_use]
pub fn classify(status: u16, api_message: Option<&str>) -> ClassifiedError {
    classify_resource(status, api_message, None)
}

/// Like [`classify`], with a resource noun used to specialise the `NOT_FOUND` message.
#[must_use]
pub fn classify_resource(
    status: u16,
    api_message: Option<&str>,
    resource: Option<&str>,
) -> ClassifiedError {
    let (kind, base) = match status {
        401 => (ErrorKind::Unauthorized, UNAUTHORIZED_MESSAGE.to_string()),
        403 => (ErrorKind::Forbidden, FORBIDDEN_MESSAGE.to_string()),
        404 => (
            ErrorKind::NotFound,
            match resource {
                Some(noun) => format!("{} not found", capitalize(noun)),
                None => "Resource not found".to_string(),
            },
        ),
        429 => (ErrorKind::RateLimited, RATE_LIMITED_MESSAGE.to_string()),
        400..=499 => (
            ErrorKind::ValidationError,
            format!("Request rejected by the Kinsta API (HTTP {status})"),
        ),
        500..=599 => (
            ErrorKind::ServerError,
            format!("Kinsta API server error (HTTP {status}). Try again later"),
        ),
        _ => (
            ErrorKind::Unknown,
            format!("Unexpected HTTP status {status} from the Kinsta API"),
        ),
    };

    let api_message = api_message
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string);
    let message = match &api_message {
        Some(m) => format!("{base}: {m}"),
        None => base,
    };

    ClassifiedError {
        api_message,
        ..ClassifiedError::new(kind, message).with_status(status)
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
