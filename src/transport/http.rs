use super::{Query, RawResponse, Transport, TransportConfig, TransportError};
use async_trait::async_trait;
use serde_json::Value;
use std::env;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// reqwest-backed [`Transport`].
///
/// Destinations produced by the engine are usually relative (`/api/...`);
/// they are joined onto `origin` when one is configured.
pub struct HttpTransport {
    client: reqwest::Client,
    origin: Option<String>,
}

impl HttpTransport {
    pub fn new(origin: Option<&str>) -> crate::Result<Self> {
        // Minimal production-friendly defaults (env-overridable).
        let builder = reqwest::Client::builder()
            .pool_max_idle_per_host(
                env::var("FETCHR_HTTP_POOL_MAX_IDLE_PER_HOST")
                    .ok()
                    .and_then(|s| s.parse::<usize>().ok())
                    .unwrap_or(32),
            )
            .pool_idle_timeout(Some(Duration::from_secs(
                env::var("FETCHR_HTTP_POOL_IDLE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(90),
            )));

        let client = builder
            .build()
            .map_err(|e| crate::Error::Transport(TransportError::Other(e.to_string())))?;

        Ok(Self {
            client,
            origin: origin.map(|o| o.trim_end_matches('/').to_string()),
        })
    }

    fn absolute(&self, uri: &str) -> String {
        match &self.origin {
            Some(origin) if !uri.starts_with("http://") && !uri.starts_with("https://") => {
                format!("{}{}", origin, uri)
            }
            _ => uri.to_string(),
        }
    }

    async fn send_once(
        &self,
        url: &str,
        query: &Query,
        body: Option<&Value>,
        config: &TransportConfig,
    ) -> Result<RawResponse, TransportError> {
        let mut req = match body {
            Some(b) => self.client.post(url).json(b),
            None => self.client.get(url),
        };
        if !query.is_empty() {
            req = req.query(query);
        }
        req = req.timeout(config.timeout);

        let response = req.send().await.map_err(|e| map_reqwest(e, config))?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| map_reqwest(e, config))?;
        trace!(status = status.as_u16(), body = %String::from_utf8_lossy(&bytes), "http response");

        if !status.is_success() {
            return Err(TransportError::Status {
                status_code: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or("").to_string(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }
        Ok(RawResponse::new(status.as_u16(), bytes))
    }

    async fn send(
        &self,
        uri: &str,
        query: &Query,
        body: Option<&Value>,
        config: &TransportConfig,
    ) -> Result<RawResponse, TransportError> {
        let url = self.absolute(uri);
        let attempts = config.max_attempts();
        let mut attempt = 0;
        loop {
            attempt += 1;
            debug!(method = if body.is_some() { "POST" } else { "GET" }, url = %url, attempt, "sending");
            match self.send_once(&url, query, body, config).await {
                Ok(resp) => return Ok(resp),
                Err(e) if attempt < attempts && e.is_transient() => {
                    let delay = backoff(config.retry_delay, attempt - 1);
                    warn!(error = %e, attempt, delay_ms = delay.as_millis() as u64, "retrying retry-safe call");
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn backoff(base: Duration, retry: u32) -> Duration {
    // Exponential backoff: base * 2^retry, capped to avoid overflow.
    base.saturating_mul(1u32 << retry.min(16))
}

fn map_reqwest(e: reqwest::Error, config: &TransportConfig) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout(config.timeout)
    } else if let Some(status) = e.status() {
        TransportError::status(status.as_u16(), status.canonical_reason().unwrap_or(""))
    } else {
        TransportError::Other(e.to_string())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(
        &self,
        uri: &str,
        query: &Query,
        config: &TransportConfig,
    ) -> Result<RawResponse, TransportError> {
        self.send(uri, query, None, config).await
    }

    async fn post(
        &self,
        uri: &str,
        query: &Query,
        body: &Value,
        config: &TransportConfig,
    ) -> Result<RawResponse, TransportError> {
        self.send(uri, query, Some(body), config).await
    }
}
