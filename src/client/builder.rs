use crate::client::core::Fetcher;
use crate::client::dispatch::Dispatcher;
use crate::config::ClientConfig;
use crate::context::Context;
use crate::transport::Transport;
use crate::{Error, ErrorContext, Result};
use once_cell::sync::OnceCell;
use std::sync::Arc;
use uuid::Uuid;

/// Builder for creating clients with custom configuration.
///
/// Defaults come from [`ClientConfig::default`] with `FETCHR_*` environment
/// overrides applied; explicit builder calls win over both.
pub struct FetcherBuilder {
    name: Option<String>,
    config: ClientConfig,
    context: Context,
    crumb: Option<String>,
    transport: Option<Arc<dyn Transport>>,
}

impl FetcherBuilder {
    pub fn new() -> Self {
        Self {
            name: None,
            config: ClientConfig::default().apply_env(),
            context: Context::new(),
            crumb: None,
            transport: None,
        }
    }

    /// Client name. Defaults to `fetcher-<uuid>`.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Replace the whole client configuration (environment overrides are not re-applied).
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn xhr_path(mut self, path: impl Into<String>) -> Self {
        self.config.xhr_path = path.into();
        self
    }

    /// Scheme and host used by the default HTTP transport.
    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.config.origin = Some(origin.into());
        self
    }

    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.config.timeout_ms = ms;
        self
    }

    /// Batch window length in milliseconds; 0 dispatches consolidated requests immediately.
    pub fn batch_wait_ms(mut self, ms: u64) -> Self {
        self.config.batch_wait_ms = ms;
        self
    }

    /// Consolidate every request unless a call opts out.
    pub fn consolidate(mut self, enable: bool) -> Self {
        self.config.consolidate = enable;
        self
    }

    pub fn force_post_for_read(mut self, enable: bool) -> Self {
        self.config.force_post_for_read = enable;
        self
    }

    pub fn require_crumb_for_read(mut self, enable: bool) -> Self {
        self.config.require_crumb_for_read = enable;
        self
    }

    pub fn id_param(mut self, name: impl Into<String>) -> Self {
        self.config.id_param = Some(name.into());
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    pub fn context_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context = self.context.with(key, value);
        self
    }

    pub fn crumb(mut self, crumb: impl Into<String>) -> Self {
        self.crumb = Some(crumb.into());
        self
    }

    /// Inject a transport. Without one, an HTTP transport is built (feature `http`).
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<Fetcher> {
        let config = self.config;

        if config.xhr_path.trim().is_empty() {
            return Err(Error::configuration_with_context(
                "xhr_path must not be empty",
                ErrorContext::new()
                    .with_field_path("config.xhr_path")
                    .with_source("fetcher_builder"),
            ));
        }
        if let Some(origin) = &config.origin {
            url::Url::parse(origin).map_err(|e| {
                Error::configuration_with_context(
                    "invalid origin",
                    ErrorContext::new()
                        .with_field_path("config.origin")
                        .with_details(e.to_string())
                        .with_source("fetcher_builder"),
                )
            })?;
        }

        let mut context = self.context.with_crumb_key(config.crumb_key.clone());
        if let Some(crumb) = self.crumb {
            context = context.with_crumb(crumb);
        }

        let transport = match self.transport {
            Some(t) => t,
            None => default_transport(&config)?,
        };

        let context = Arc::new(context);
        let dispatcher = Arc::new(Dispatcher::new(transport, Arc::clone(&context), &config));

        Ok(Fetcher {
            name: self
                .name
                .unwrap_or_else(|| format!("fetcher-{}", Uuid::new_v4())),
            config: Arc::new(config),
            context,
            dispatcher,
            window: OnceCell::new(),
        })
    }
}

#[cfg(feature = "http")]
fn default_transport(config: &ClientConfig) -> Result<Arc<dyn Transport>> {
    Ok(Arc::new(crate::transport::HttpTransport::new(
        config.origin.as_deref(),
    )?))
}

#[cfg(not(feature = "http"))]
fn default_transport(_config: &ClientConfig) -> Result<Arc<dyn Transport>> {
    Err(Error::configuration_with_context(
        "no transport configured",
        ErrorContext::new()
            .with_details("enable the `http` feature or call FetcherBuilder::transport")
            .with_source("fetcher_builder"),
    ))
}

impl Default for FetcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_origin_rejected() {
        let err = FetcherBuilder::new()
            .config(ClientConfig::default())
            .origin("not a url")
            .build()
            .unwrap_err();
        assert_eq!(err.context().and_then(|c| c.field_path.as_deref()), Some("config.origin"));
    }

    #[test]
    fn test_empty_xhr_path_rejected() {
        let err = FetcherBuilder::new().xhr_path("  ").build().unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_build_defaults() {
        let client = FetcherBuilder::new()
            .config(ClientConfig::default())
            .origin("http://localhost:3000")
            .context_value("lang", "en")
            .crumb("abc")
            .build()
            .unwrap();
        assert!(client.name().starts_with("fetcher-"));
        assert_eq!(client.context().crumb(), Some("abc"));
        assert_eq!(client.context().get("lang"), Some("en"));
        assert_eq!(client.pending(), 0);
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_context_crumb_rekeyed_to_configured_key() {
        let config = ClientConfig {
            crumb_key: "crumb".into(),
            ..Default::default()
        };
        let client = FetcherBuilder::new()
            .config(config)
            .context(Context::new().with("lang", "en").with_crumb("early"))
            .build()
            .unwrap();
        assert_eq!(client.context().crumb(), Some("early"));
        assert_eq!(client.context().get("crumb"), Some("early"));
        assert_eq!(client.context().get("_csrf"), None);
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_crumb_follows_configured_key() {
        let config = ClientConfig {
            crumb_key: "crumb".into(),
            ..Default::default()
        };
        let client = FetcherBuilder::new()
            .config(config)
            .crumb("xyz")
            .name("svc")
            .build()
            .unwrap();
        assert_eq!(client.name(), "svc");
        assert_eq!(client.context().get("crumb"), Some("xyz"));
        assert_eq!(client.context().get("_csrf"), None);
    }
}
