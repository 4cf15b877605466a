use crate::batch::{self, Batch, BatchWindow};
use crate::client::dispatch::Dispatcher;
use crate::config::{ClientConfig, RequestConfig};
use crate::context::Context;
use crate::request::{Operation, Params, Request};
use crate::Result;
use once_cell::sync::OnceCell;
use serde_json::Value;
use std::sync::Arc;
use tracing::trace;

/// CRUD client over a remote resource API.
///
/// Requests opted into consolidation share this client's batch window, which
/// is created on the first consolidated call and lives as long as the client.
pub struct Fetcher {
    pub(crate) name: String,
    pub(crate) config: Arc<ClientConfig>,
    pub(crate) context: Arc<Context>,
    pub(crate) dispatcher: Arc<Dispatcher>,
    pub(crate) window: OnceCell<BatchWindow<Request, Batch>>,
}

impl Fetcher {
    pub fn builder() -> crate::client::builder::FetcherBuilder {
        crate::client::builder::FetcherBuilder::new()
    }

    /// Client name; also identifies its batch window in logs.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Requests currently waiting in the batch window.
    pub fn pending(&self) -> usize {
        self.window.get().map_or(0, BatchWindow::pending_len)
    }

    /// Start a fluent request against `resource`.
    pub fn resource(&self, resource: impl Into<String>) -> crate::client::resource::ResourceRequestBuilder<'_> {
        crate::client::resource::ResourceRequestBuilder::new(self, resource.into())
    }

    pub async fn create(
        &self,
        resource: &str,
        params: Params,
        body: Option<Value>,
        config: Option<RequestConfig>,
    ) -> Result<Value> {
        self.execute(resource, Operation::Create, params, body, config.unwrap_or_default())
            .await
    }

    pub async fn read(
        &self,
        resource: &str,
        params: Params,
        config: Option<RequestConfig>,
    ) -> Result<Value> {
        self.execute(resource, Operation::Read, params, None, config.unwrap_or_default())
            .await
    }

    pub async fn update(
        &self,
        resource: &str,
        params: Params,
        body: Option<Value>,
        config: Option<RequestConfig>,
    ) -> Result<Value> {
        self.execute(resource, Operation::Update, params, body, config.unwrap_or_default())
            .await
    }

    pub async fn delete(
        &self,
        resource: &str,
        params: Params,
        config: Option<RequestConfig>,
    ) -> Result<Value> {
        self.execute(resource, Operation::Delete, params, None, config.unwrap_or_default())
            .await
    }

    /// Unified entry point behind every CRUD method. Read and delete never
    /// carry a body; one passed for them is dropped.
    ///
    /// A consolidated request is completed by the window's flush task, so it
    /// still reaches the server if the returned future is dropped early.
    pub async fn execute(
        &self,
        resource: &str,
        operation: Operation,
        params: Params,
        body: Option<Value>,
        overrides: RequestConfig,
    ) -> Result<Value> {
        let body = match operation {
            Operation::Create | Operation::Update => body,
            Operation::Read | Operation::Delete => None,
        };
        let config = self.config.resolve(&overrides);
        let consolidate = config.consolidate;
        let (request, pending) = Request::new(resource, operation, params, body, config);
        trace!(client = %self.name, resource, %operation, consolidate, "request");

        if consolidate {
            self.window().push(request);
        } else {
            self.dispatcher.dispatch(Batch::Single(request)).await;
        }
        pending.await
    }

    fn window(&self) -> &BatchWindow<Request, Batch> {
        self.window.get_or_init(|| {
            let dispatcher = Arc::clone(&self.dispatcher);
            BatchWindow::new(
                self.name.clone(),
                self.config.batch_wait(),
                batch::group,
                move |unit: Batch| {
                    let dispatcher = Arc::clone(&dispatcher);
                    tokio::spawn(async move { dispatcher.dispatch(unit).await });
                },
            )
        })
    }
}

impl std::fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fetcher")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("context", &self.context)
            .field("pending", &self.pending())
            .finish()
    }
}
