//! Turns dispatch units into wire calls.

use super::demux;
use crate::batch::Batch;
use crate::config::{ClientConfig, MAX_URI_LEN};
use crate::context::Context;
use crate::protocol::{get_uri, post_uri, Envelope};
use crate::request::Request;
use crate::transport::{Query, Transport, TransportConfig};
use crate::{Error, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub(crate) struct Dispatcher {
    transport: Arc<dyn Transport>,
    context: Arc<Context>,
    max_retries: u32,
    retry_delay: Duration,
}

impl Dispatcher {
    pub(crate) fn new(
        transport: Arc<dyn Transport>,
        context: Arc<Context>,
        config: &ClientConfig,
    ) -> Self {
        Self {
            transport,
            context,
            max_retries: config.max_retries,
            retry_delay: config.retry_delay(),
        }
    }

    pub(crate) async fn dispatch(&self, batch: Batch) {
        match batch {
            Batch::Single(request) => self.send_single(request).await,
            Batch::Grouped(requests) => self.send_grouped(requests).await,
        }
    }

    fn transport_config(&self, timeout: Duration, retry_safe: bool) -> TransportConfig {
        TransportConfig {
            timeout,
            unsafe_allow_retry: retry_safe,
            max_retries: self.max_retries,
            retry_delay: self.retry_delay,
        }
    }

    /// Mutations always need the crumb; reads only when configured to.
    fn crumb_gate<'a>(&self, requests: impl IntoIterator<Item = &'a Request>) -> Result<()> {
        let needed = requests
            .into_iter()
            .any(|r| !r.operation().is_read() || r.config().require_crumb_for_read);
        if needed && self.context.crumb().is_none() {
            return Err(Error::missing_crumb());
        }
        Ok(())
    }

    async fn send_single(&self, request: Request) {
        if let Err(e) = self.crumb_gate([&request]) {
            debug!(resource = request.resource(), operation = %request.operation(), "crumb missing, skipping dispatch");
            request.complete(Err(e));
            return;
        }

        let config = request.config();
        let timeout = config.timeout;
        let query = Query::new();

        if request.operation().is_read() && !config.force_post_for_read {
            let uri = get_uri(
                &config.uri,
                request.resource(),
                request.params(),
                config.id_param.as_deref(),
                &self.context,
                config.require_crumb_for_read,
            );
            if uri.len() <= MAX_URI_LEN {
                debug!(method = "GET", uri = %uri, "dispatching single request");
                let outcome = self
                    .transport
                    .get(&uri, &query, &self.transport_config(timeout, true))
                    .await;
                demux::deliver_get(request, outcome);
                return;
            }
            debug!(resource = request.resource(), uri_len = uri.len(), "GET destination too long, falling back to POST");
        }

        let envelope = Envelope::single(&request, &self.context);
        let body = match envelope.to_value() {
            Ok(body) => body,
            Err(e) => return request.complete(Err(e)),
        };
        let uri = post_uri(&request.config().uri, &self.context);
        let retry_safe = envelope.is_retry_safe();
        debug!(method = "POST", uri = %uri, retry_safe, "dispatching single request");
        let outcome = self
            .transport
            .post(&uri, &query, &body, &self.transport_config(timeout, retry_safe))
            .await;
        demux::deliver_single(request, outcome);
    }

    async fn send_grouped(&self, requests: Vec<Request>) {
        if let Err(e) = self.crumb_gate(&requests) {
            debug!(members = requests.len(), "crumb missing, rejecting whole group");
            demux::reject_all(requests, e);
            return;
        }
        let Some(first) = requests.first() else {
            return;
        };

        let uri = post_uri(&first.config().uri, &self.context);
        let timeout = requests
            .iter()
            .map(|r| r.config().timeout)
            .max()
            .unwrap_or(first.config().timeout);

        let (envelope, ids) = Envelope::grouped(&requests, &self.context);
        let body = match envelope.to_value() {
            Ok(body) => body,
            Err(e) => return demux::reject_all(requests, e),
        };
        let retry_safe = envelope.is_retry_safe();
        debug!(method = "POST", uri = %uri, members = ids.len(), retry_safe, "dispatching multiplexed request");

        let outcome = self
            .transport
            .post(&uri, &Query::new(), &body, &self.transport_config(timeout, retry_safe))
            .await;
        demux::deliver_grouped(ids.into_iter().zip(requests).collect(), outcome);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RequestConfig;
    use crate::request::{Operation, Params, PendingResponse};
    use crate::transport::{RawResponse, TransportError};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Calls {
        gets: Vec<String>,
        posts: Vec<(String, Value, TransportConfig)>,
    }

    #[derive(Default)]
    struct FakeTransport {
        calls: Mutex<Calls>,
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn get(
            &self,
            uri: &str,
            _query: &Query,
            _config: &TransportConfig,
        ) -> std::result::Result<RawResponse, TransportError> {
            self.calls.lock().unwrap().gets.push(uri.to_string());
            Ok(RawResponse::json_ok(&json!({"via": "get"})))
        }

        async fn post(
            &self,
            uri: &str,
            _query: &Query,
            body: &Value,
            config: &TransportConfig,
        ) -> std::result::Result<RawResponse, TransportError> {
            self.calls
                .lock()
                .unwrap()
                .posts
                .push((uri.to_string(), body.clone(), config.clone()));
            let mut out = serde_json::Map::new();
            if let Some(reqs) = body["requests"].as_object() {
                for id in reqs.keys() {
                    out.insert(id.clone(), json!({"data": {"via": "post", "id": id}}));
                }
            }
            Ok(RawResponse::json_ok(&Value::Object(out)))
        }
    }

    fn dispatcher(context: Context) -> (Dispatcher, Arc<FakeTransport>) {
        let transport = Arc::new(FakeTransport::default());
        let d = Dispatcher::new(transport.clone(), Arc::new(context), &ClientConfig::default());
        (d, transport)
    }

    fn req(op: Operation, overrides: RequestConfig) -> (Request, PendingResponse) {
        let config = ClientConfig::default().resolve(&overrides);
        Request::new("user", op, Params::new(), None, config)
    }

    #[tokio::test]
    async fn test_read_goes_over_get() {
        let (d, t) = dispatcher(Context::new());
        let (r, p) = req(Operation::Read, RequestConfig::new());
        d.dispatch(Batch::Single(r)).await;
        assert_eq!(p.await.unwrap(), json!({"via": "get"}));
        assert_eq!(t.calls.lock().unwrap().gets, vec!["/api/resource/user".to_string()]);
    }

    #[tokio::test]
    async fn test_forced_post_read_is_retry_safe() {
        let (d, t) = dispatcher(Context::new());
        let (r, p) = req(Operation::Read, RequestConfig::new().force_post_for_read(true));
        d.dispatch(Batch::Single(r)).await;
        assert_eq!(p.await.unwrap(), json!({"via": "post", "id": "g0"}));
        let calls = t.calls.lock().unwrap();
        assert!(calls.gets.is_empty());
        assert!(calls.posts[0].2.unsafe_allow_retry);
    }

    #[tokio::test]
    async fn test_mutation_without_crumb_never_reaches_transport() {
        let (d, t) = dispatcher(Context::new());
        let (r, p) = req(Operation::Delete, RequestConfig::new());
        d.dispatch(Batch::Single(r)).await;
        assert_eq!(p.await.unwrap_err().status_code(), Some(400));
        let calls = t.calls.lock().unwrap();
        assert!(calls.gets.is_empty() && calls.posts.is_empty());
    }

    #[tokio::test]
    async fn test_mutation_with_crumb_posts_not_retry_safe() {
        let (d, t) = dispatcher(Context::new().with_crumb("c"));
        let (r, p) = req(Operation::Create, RequestConfig::new());
        d.dispatch(Batch::Single(r)).await;
        assert!(p.await.is_ok());
        let calls = t.calls.lock().unwrap();
        assert_eq!(calls.posts[0].0, "/api?_csrf=c");
        assert!(!calls.posts[0].2.unsafe_allow_retry);
    }

    #[tokio::test]
    async fn test_read_requiring_crumb_is_gated() {
        let (d, _t) = dispatcher(Context::new());
        let (r, p) = req(Operation::Read, RequestConfig::new().require_crumb_for_read(true));
        d.dispatch(Batch::Single(r)).await;
        assert!(matches!(p.await.unwrap_err(), Error::Precondition { .. }));
    }

    #[tokio::test]
    async fn test_group_uses_longest_timeout() {
        let (d, t) = dispatcher(Context::new());
        let (a, pa) = req(Operation::Read, RequestConfig::new().timeout_ms(10));
        let (b, pb) = req(Operation::Read, RequestConfig::new().timeout_ms(500));
        d.dispatch(Batch::Grouped(vec![a, b])).await;
        assert_eq!(pa.await.unwrap()["id"], "g0");
        assert_eq!(pb.await.unwrap()["id"], "g1");
        assert_eq!(
            t.calls.lock().unwrap().posts[0].2.timeout,
            Duration::from_millis(500)
        );
    }
}
