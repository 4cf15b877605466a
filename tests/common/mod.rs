//! Shared fixtures for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use fetchr_rs::transport::{Query, RawResponse, Transport, TransportConfig, TransportError};
use fetchr_rs::{Fetcher, FetcherBuilder};
use serde_json::{json, Map, Value};
use std::sync::{Arc, Mutex};
use tokio::time::Instant;

/// One call seen by [`RecordingTransport`].
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: &'static str,
    pub uri: String,
    pub body: Option<Value>,
    pub config: TransportConfig,
    pub at: Instant,
}

type Responder = dyn Fn(&RecordedCall) -> Result<RawResponse, TransportError> + Send + Sync;

/// Transport that records every call and answers through a responder.
///
/// The default responder echoes what it can read back from the call:
/// a GET answers `{"resource", "param_count"}` parsed from the destination,
/// a POST answers one `data` slot per envelope entry.
pub struct RecordingTransport {
    calls: Mutex<Vec<RecordedCall>>,
    responder: Box<Responder>,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Self::with_responder(echo)
    }

    pub fn with_responder<F>(responder: F) -> Arc<Self>
    where
        F: Fn(&RecordedCall) -> Result<RawResponse, TransportError> + Send + Sync + 'static,
    {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            responder: Box::new(responder),
        })
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn record(
        &self,
        method: &'static str,
        uri: &str,
        body: Option<&Value>,
        config: &TransportConfig,
    ) -> Result<RawResponse, TransportError> {
        let call = RecordedCall {
            method,
            uri: uri.to_string(),
            body: body.cloned(),
            config: config.clone(),
            at: Instant::now(),
        };
        let out = (self.responder)(&call);
        self.calls.lock().unwrap().push(call);
        out
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn get(
        &self,
        uri: &str,
        _query: &Query,
        config: &TransportConfig,
    ) -> Result<RawResponse, TransportError> {
        self.record("GET", uri, None, config)
    }

    async fn post(
        &self,
        uri: &str,
        _query: &Query,
        body: &Value,
        config: &TransportConfig,
    ) -> Result<RawResponse, TransportError> {
        self.record("POST", uri, Some(body), config)
    }
}

/// Resource name and matrix parameter count of a GET destination.
pub fn parse_get(uri: &str) -> (String, usize) {
    let path = uri.split('?').next().unwrap_or_default();
    let mut segments = path.split(';');
    let head = segments.next().unwrap_or_default();
    let resource = head
        .split("/resource/")
        .nth(1)
        .and_then(|rest| rest.split('/').next())
        .unwrap_or_default()
        .to_string();
    (resource, segments.count())
}

pub fn echo(call: &RecordedCall) -> Result<RawResponse, TransportError> {
    match &call.body {
        None => {
            let (resource, param_count) = parse_get(&call.uri);
            Ok(RawResponse::json_ok(
                &json!({"resource": resource, "param_count": param_count}),
            ))
        }
        Some(body) => {
            let mut out = Map::new();
            if let Some(requests) = body["requests"].as_object() {
                for (id, req) in requests {
                    let param_count = req["params"].as_object().map_or(0, Map::len);
                    out.insert(
                        id.clone(),
                        json!({"data": {"resource": req["resource"], "param_count": param_count}}),
                    );
                }
            }
            Ok(RawResponse::json_ok(&Value::Object(out)))
        }
    }
}

/// Builder wired to `transport` with environment overrides ignored.
pub fn builder(transport: Arc<RecordingTransport>) -> FetcherBuilder {
    Fetcher::builder()
        .config(Default::default())
        .name("test")
        .transport(transport)
}

pub fn params(value: Value) -> fetchr_rs::Params {
    match value {
        Value::Object(map) => map,
        _ => fetchr_rs::Params::new(),
    }
}
