//! Multiplexed wire envelope and its response.
//!
//! Request body: `{"requests": {"g0": {...}, "g1": {...}}, "context": {...}}`.
//! Response body: `{"g0": {"data": ...}, "g1": {"err": ...}}`.

use crate::context::Context;
use crate::request::{Operation, Params, Request};
use crate::transport::RawResponse;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Correlation id binding a request inside an envelope to its sub-result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Fixed id used by single-request POSTs.
    pub fn single() -> Self {
        Self::nth(0)
    }

    pub fn nth(index: usize) -> Self {
        CorrelationId(format!("g{}", index))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The fields of a request that travel on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireRequest {
    pub resource: String,
    pub operation: Operation,
    pub params: Params,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl From<&Request> for WireRequest {
    fn from(r: &Request) -> Self {
        Self {
            resource: r.resource().to_string(),
            operation: r.operation(),
            params: r.params().clone(),
            body: r.body().cloned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub requests: BTreeMap<CorrelationId, WireRequest>,
    pub context: BTreeMap<String, String>,
}

impl Envelope {
    pub fn single(request: &Request, context: &Context) -> Self {
        let mut requests = BTreeMap::new();
        requests.insert(CorrelationId::single(), WireRequest::from(request));
        Self {
            requests,
            context: context.values().clone(),
        }
    }

    /// Envelope for a group. Ids are assigned sequentially in group order and
    /// returned in that same order.
    pub fn grouped(requests: &[Request], context: &Context) -> (Self, Vec<CorrelationId>) {
        let ids: Vec<CorrelationId> = (0..requests.len()).map(CorrelationId::nth).collect();
        let requests = ids
            .iter()
            .cloned()
            .zip(requests.iter().map(WireRequest::from))
            .collect();
        (
            Self {
                requests,
                context: context.values().clone(),
            },
            ids,
        )
    }

    /// Only calls made entirely of reads may be retried by the transport.
    pub fn is_retry_safe(&self) -> bool {
        self.requests.values().all(|r| r.operation.is_read())
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn to_value(&self) -> crate::Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// One request's slot in a multiplexed response.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SubResult {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub err: Option<Value>,
}

impl SubResult {
    /// `err` wins over `data`; an absent slot is an empty result.
    pub fn into_result(self) -> crate::Result<Value> {
        match self.err {
            Some(err) if !err.is_null() => Err(crate::Error::remote(err)),
            _ => Ok(self.data.unwrap_or(Value::Null)),
        }
    }
}

/// Parsed multiplexed response. Malformed payloads parse to an empty response.
#[derive(Debug, Default)]
pub struct MultiplexedResponse {
    slots: serde_json::Map<String, Value>,
}

impl MultiplexedResponse {
    pub fn parse(raw: &RawResponse) -> Self {
        Self::from_value(raw.json())
    }

    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(slots) => Self { slots },
            _ => Self::default(),
        }
    }

    /// Remove and return the sub-result for `id`. Missing or non-object slots
    /// yield an empty result.
    pub fn take(&mut self, id: &CorrelationId) -> SubResult {
        self.slots
            .remove(id.as_str())
            .and_then(|slot| serde_json::from_value(slot).ok())
            .unwrap_or_default()
    }
}
