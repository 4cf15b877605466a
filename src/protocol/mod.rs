//! Wire protocol: GET destinations and multiplexed POST envelopes.

pub mod envelope;
pub mod uri;

pub use envelope::{CorrelationId, Envelope, MultiplexedResponse, SubResult, WireRequest};
pub use uri::{context_query, encode_component, get_uri, param_string, post_uri};
