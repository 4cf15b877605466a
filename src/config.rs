//! Client-wide defaults, per-call overrides and the merge between them.

use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_XHR_PATH: &str = "/api";
pub const DEFAULT_TIMEOUT_MS: u64 = 3000;
pub const DEFAULT_BATCH_WAIT_MS: u64 = 15;
pub const DEFAULT_CRUMB_KEY: &str = "_csrf";
/// GET destinations longer than this are sent as POST instead.
pub const MAX_URI_LEN: usize = 2048;

/// Options shared by every call a client makes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base destination; also the default grouping destination.
    pub xhr_path: String,
    /// Scheme and host prepended to relative destinations by the HTTP transport.
    pub origin: Option<String>,
    pub timeout_ms: u64,
    /// Batch window length. Zero disables accumulation.
    pub batch_wait_ms: u64,
    pub consolidate: bool,
    pub batch_tag: Option<String>,
    pub force_post_for_read: bool,
    pub require_crumb_for_read: bool,
    pub id_param: Option<String>,
    /// Context key holding the crumb.
    pub crumb_key: String,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            xhr_path: DEFAULT_XHR_PATH.to_string(),
            origin: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            batch_wait_ms: DEFAULT_BATCH_WAIT_MS,
            consolidate: false,
            batch_tag: None,
            force_post_for_read: false,
            require_crumb_for_read: false,
            id_param: None,
            crumb_key: DEFAULT_CRUMB_KEY.to_string(),
            max_retries: 2,
            retry_delay_ms: 100,
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_yaml_str(s: &str) -> Result<Self> {
        serde_yaml::from_str(s).map_err(|e| {
            Error::configuration_with_context(
                "invalid client configuration",
                ErrorContext::new()
                    .with_details(e.to_string())
                    .with_source("config_loader"),
            )
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::configuration_with_context(
                "unable to read configuration file",
                ErrorContext::new()
                    .with_field_path(path.display().to_string())
                    .with_details(e.to_string())
                    .with_source("config_loader"),
            )
        })?;
        Self::from_yaml_str(&raw)
    }

    /// Apply `FETCHR_*` environment overrides. Unparseable values are ignored.
    pub fn apply_env(mut self) -> Self {
        if let Ok(p) = std::env::var("FETCHR_XHR_PATH") {
            if !p.trim().is_empty() {
                self.xhr_path = p;
            }
        }
        if let Ok(o) = std::env::var("FETCHR_ORIGIN") {
            if !o.trim().is_empty() {
                self.origin = Some(o);
            }
        }
        if let Some(ms) = env_u64("FETCHR_TIMEOUT_MS") {
            self.timeout_ms = ms;
        }
        if let Some(ms) = env_u64("FETCHR_BATCH_WAIT_MS") {
            self.batch_wait_ms = ms;
        }
        if let Some(n) = env_u64("FETCHR_MAX_RETRIES").and_then(|n| u32::try_from(n).ok()) {
            self.max_retries = n;
        }
        self
    }

    pub fn batch_wait(&self) -> Duration {
        Duration::from_millis(self.batch_wait_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Merge per-call overrides over these defaults.
    pub fn resolve(&self, overrides: &RequestConfig) -> ResolvedConfig {
        ResolvedConfig {
            uri: overrides
                .uri
                .clone()
                .unwrap_or_else(|| self.xhr_path.clone()),
            consolidate: overrides.consolidate.unwrap_or(self.consolidate),
            batch_tag: overrides.batch_tag.clone().or_else(|| self.batch_tag.clone()),
            force_post_for_read: overrides
                .force_post_for_read
                .unwrap_or(self.force_post_for_read),
            require_crumb_for_read: overrides
                .require_crumb_for_read
                .unwrap_or(self.require_crumb_for_read),
            id_param: overrides.id_param.clone().or_else(|| self.id_param.clone()),
            timeout: Duration::from_millis(overrides.timeout_ms.unwrap_or(self.timeout_ms)),
        }
    }
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|s| s.trim().parse::<u64>().ok())
}

/// Per-call overrides. Unset fields fall back to the client's [`ClientConfig`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestConfig {
    pub uri: Option<String>,
    pub consolidate: Option<bool>,
    pub batch_tag: Option<String>,
    pub force_post_for_read: Option<bool>,
    pub require_crumb_for_read: Option<bool>,
    pub id_param: Option<String>,
    pub timeout_ms: Option<u64>,
}

impl RequestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    pub fn consolidate(mut self, enable: bool) -> Self {
        self.consolidate = Some(enable);
        self
    }

    pub fn batch_tag(mut self, tag: impl Into<String>) -> Self {
        self.batch_tag = Some(tag.into());
        self
    }

    pub fn force_post_for_read(mut self, enable: bool) -> Self {
        self.force_post_for_read = Some(enable);
        self
    }

    pub fn require_crumb_for_read(mut self, enable: bool) -> Self {
        self.require_crumb_for_read = Some(enable);
        self
    }

    pub fn id_param(mut self, name: impl Into<String>) -> Self {
        self.id_param = Some(name.into());
        self
    }

    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.timeout_ms = Some(ms);
        self
    }
}

/// Fully merged configuration carried by each request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub uri: String,
    pub consolidate: bool,
    pub batch_tag: Option<String>,
    pub force_post_for_read: bool,
    pub require_crumb_for_read: bool,
    pub id_param: Option<String>,
    pub timeout: Duration,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        ClientConfig::default().resolve(&RequestConfig::default())
    }
}
