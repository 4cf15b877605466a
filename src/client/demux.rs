//! Maps raw responses back onto the requests that produced them.
//!
//! Every function here consumes the requests it is given and completes each
//! one exactly once.

use crate::protocol::{CorrelationId, MultiplexedResponse};
use crate::request::Request;
use crate::transport::{RawResponse, TransportError};
use crate::Error;
use serde_json::Value;
use tracing::trace;

pub(crate) type Outcome = std::result::Result<RawResponse, TransportError>;

/// A GET answers with the bare data.
pub(crate) fn deliver_get(request: Request, outcome: Outcome) {
    match outcome {
        Ok(raw) => {
            trace!(resource = request.resource(), body = %raw.text(), "get response");
            request.complete(Ok(raw.json()))
        }
        Err(e) => request.complete(Err(e.into())),
    }
}

/// A single-request POST answers with a one-slot multiplexed response; only
/// that slot's `data` reaches the caller.
pub(crate) fn deliver_single(request: Request, outcome: Outcome) {
    match outcome {
        Ok(raw) => {
            let mut response = MultiplexedResponse::parse(&raw);
            let data = response.take(&CorrelationId::single()).data;
            request.complete(Ok(data.unwrap_or(Value::Null)))
        }
        Err(e) => request.complete(Err(e.into())),
    }
}

/// A grouped POST: a transport failure is shared by every member, otherwise
/// each member gets its own slot by correlation id.
pub(crate) fn deliver_grouped(members: Vec<(CorrelationId, Request)>, outcome: Outcome) {
    match outcome {
        Ok(raw) => {
            let mut response = MultiplexedResponse::parse(&raw);
            for (id, request) in members {
                let result = response.take(&id).into_result();
                request.complete(result);
            }
        }
        Err(e) => reject_all(members.into_iter().map(|(_, r)| r), e.into()),
    }
}

pub(crate) fn reject_all(requests: impl IntoIterator<Item = Request>, err: Error) {
    for request in requests {
        request.complete(Err(err.clone()));
    }
}
