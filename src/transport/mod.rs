//! Transport boundary.
//!
//! The consolidation engine never talks to the network itself; it hands a
//! destination, an (empty) query stub, an optional body and a
//! [`TransportConfig`] to a [`Transport`] and gets back either a
//! [`RawResponse`] or a [`TransportError`]. Retry and timeout policy belong to
//! the transport; the engine only tells it whether a call is safe to retry.

#[cfg(feature = "http")]
mod http;

#[cfg(feature = "http")]
pub use http::HttpTransport;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

/// Extra query parameters for a call. The engine encodes everything it needs
/// into the destination, so it always passes an empty stub.
pub type Query = BTreeMap<String, String>;

/// Per-call transport settings derived from the merged request configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    pub timeout: Duration,
    /// Every request carried by this call is idempotent.
    pub unsafe_allow_retry: bool,
    pub max_retries: u32,
    /// Initial backoff; doubled on each further attempt.
    pub retry_delay: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(crate::config::DEFAULT_TIMEOUT_MS),
            unsafe_allow_retry: false,
            max_retries: 0,
            retry_delay: Duration::from_millis(100),
        }
    }
}

impl TransportConfig {
    pub fn with_retry_safe(mut self, safe: bool) -> Self {
        self.unsafe_allow_retry = safe;
        self
    }

    /// Number of attempts the transport may make for this call.
    pub fn max_attempts(&self) -> u32 {
        if self.unsafe_allow_retry {
            self.max_retries.saturating_add(1)
        } else {
            1
        }
    }
}

/// Raw payload returned by a successful call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Bytes,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// 200 response carrying a JSON value.
    pub fn json_ok(value: &Value) -> Self {
        Self::new(200, value.to_string())
    }

    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Parse the payload as JSON. Malformed or empty payloads become `Value::Null`.
    pub fn json(&self) -> Value {
        if self.body.is_empty() {
            return Value::Null;
        }
        match serde_json::from_slice(&self.body) {
            Ok(v) => v,
            Err(e) => {
                debug!(error = %e, len = self.body.len(), "malformed response payload treated as empty");
                Value::Null
            }
        }
    }
}

/// Error surfaced by a transport. Shared verbatim by every request that rode
/// on the failed call, hence `Clone`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP {status_code} {status_text}")]
    Status {
        status_code: u16,
        status_text: String,
        body: String,
    },

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Transport error: {0}")]
    Other(String),
}

impl TransportError {
    pub fn status(status_code: u16, status_text: impl Into<String>) -> Self {
        TransportError::Status {
            status_code,
            status_text: status_text.into(),
            body: String::new(),
        }
    }

    /// HTTP status of the failure; 408 for timeouts and 0 when the call never
    /// produced a status.
    pub fn status_code(&self) -> u16 {
        match self {
            TransportError::Status { status_code, .. } => *status_code,
            TransportError::Timeout(_) => 408,
            TransportError::Other(_) => 0,
        }
    }

    pub fn status_text(&self) -> &str {
        match self {
            TransportError::Status { status_text, .. } => status_text,
            TransportError::Timeout(_) => "Request Timeout",
            TransportError::Other(msg) => msg,
        }
    }

    /// Whether a retry-safe call may be attempted again after this failure.
    pub fn is_transient(&self) -> bool {
        match self {
            TransportError::Status { status_code, .. } => *status_code >= 500,
            TransportError::Timeout(_) | TransportError::Other(_) => true,
        }
    }
}

/// The network collaborator. Implementations must be cheap to share across
/// concurrently in-flight calls.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(
        &self,
        uri: &str,
        query: &Query,
        config: &TransportConfig,
    ) -> Result<RawResponse, TransportError>;

    async fn post(
        &self,
        uri: &str,
        query: &Query,
        body: &Value,
        config: &TransportConfig,
    ) -> Result<RawResponse, TransportError>;
}
