use crate::config::RequestConfig;
use crate::request::{Operation, Params};
use crate::Result;
use serde_json::Value;

use super::core::Fetcher;

/// Builder for one call against a resource.
pub struct ResourceRequestBuilder<'a> {
    pub(crate) client: &'a Fetcher,
    pub(crate) resource: String,
    pub(crate) params: Params,
    pub(crate) body: Option<Value>,
    pub(crate) config: RequestConfig,
}

impl<'a> ResourceRequestBuilder<'a> {
    pub(crate) fn new(client: &'a Fetcher, resource: String) -> Self {
        Self {
            client,
            resource,
            params: Params::new(),
            body: None,
            config: RequestConfig::default(),
        }
    }

    /// Set one parameter.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Replace all parameters.
    pub fn params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    /// Body for create/update. Ignored by read and delete.
    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Replace the per-call overrides.
    pub fn config(mut self, config: RequestConfig) -> Self {
        self.config = config;
        self
    }

    /// Opt this call into the batch window.
    pub fn consolidate(mut self) -> Self {
        self.config.consolidate = Some(true);
        self
    }

    pub fn batch_tag(mut self, tag: impl Into<String>) -> Self {
        self.config.batch_tag = Some(tag.into());
        self
    }

    /// Send a read as POST even when it would fit in a GET.
    pub fn force_post(mut self) -> Self {
        self.config.force_post_for_read = Some(true);
        self
    }

    pub fn id_param(mut self, name: impl Into<String>) -> Self {
        self.config.id_param = Some(name.into());
        self
    }

    /// Destination override for this call.
    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.config.uri = Some(uri.into());
        self
    }

    pub async fn create(self) -> Result<Value> {
        self.execute(Operation::Create).await
    }

    pub async fn read(self) -> Result<Value> {
        self.execute(Operation::Read).await
    }

    pub async fn update(self) -> Result<Value> {
        self.execute(Operation::Update).await
    }

    pub async fn delete(self) -> Result<Value> {
        self.execute(Operation::Delete).await
    }

    async fn execute(self, operation: Operation) -> Result<Value> {
        self.client
            .execute(&self.resource, operation, self.params, self.body, self.config)
            .await
    }
}
