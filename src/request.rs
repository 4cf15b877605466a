//! Logical CRUD requests and their single-fire completion channel.

use crate::config::ResolvedConfig;
use crate::{Error, Result};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;
use tracing::trace;

/// Request parameters. Values may be scalars or structured JSON.
pub type Params = serde_json::Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Read => "read",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }

    /// Reads are the only idempotent operation.
    pub fn is_read(&self) -> bool {
        matches!(self, Operation::Read)
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sending half of a request's result channel. Consumed on use, so a request
/// can be completed at most once; dropping it unfired surfaces as an error on
/// the caller side instead of a hang.
#[derive(Debug)]
struct Completion {
    tx: oneshot::Sender<Result<Value>>,
}

impl Completion {
    fn fire(self, result: Result<Value>) {
        if self.tx.send(result).is_err() {
            trace!("caller stopped listening before completion");
        }
    }
}

/// Caller-side future resolving to the request's own result.
#[derive(Debug)]
pub struct PendingResponse {
    rx: oneshot::Receiver<Result<Value>>,
}

impl Future for PendingResponse {
    type Output = Result<Value>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.rx.poll_unpin(cx).map(|received| {
            received.unwrap_or_else(|_| Err(Error::runtime("request dropped before completion")))
        })
    }
}

/// One logical CRUD call. Immutable once built; owned by whichever stage
/// currently holds it (queue, group, dispatcher) until it is completed.
#[derive(Debug)]
pub struct Request {
    resource: String,
    operation: Operation,
    params: Params,
    body: Option<Value>,
    config: ResolvedConfig,
    completion: Completion,
}

impl Request {
    pub fn new(
        resource: impl Into<String>,
        operation: Operation,
        params: Params,
        body: Option<Value>,
        config: ResolvedConfig,
    ) -> (Self, PendingResponse) {
        let (tx, rx) = oneshot::channel();
        let request = Self {
            resource: resource.into(),
            operation,
            params,
            body,
            config,
            completion: Completion { tx },
        };
        (request, PendingResponse { rx })
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    /// Deliver this request's result to its caller.
    pub fn complete(self, result: Result<Value>) {
        self.completion.fire(result);
    }
}
