//! Grouping policy applied when a batch window flushes.

use crate::request::Request;
use indexmap::IndexMap;
use std::hash::Hash;
use tracing::debug;

/// Unit of dispatch produced by a flush.
#[derive(Debug)]
pub enum Batch {
    /// Sent as an ordinary single request.
    Single(Request),
    /// Two or more requests merged into one multiplexed call, in arrival order.
    Grouped(Vec<Request>),
}

impl Batch {
    pub fn len(&self) -> usize {
        match self {
            Batch::Single(_) => 1,
            Batch::Grouped(requests) => requests.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Request> for Batch {
    fn from(request: Request) -> Self {
        Batch::Single(request)
    }
}

impl From<Vec<Request>> for Batch {
    fn from(mut requests: Vec<Request>) -> Self {
        if requests.len() == 1 {
            if let Some(only) = requests.pop() {
                return Batch::Single(only);
            }
        }
        Batch::Grouped(requests)
    }
}

/// Requests may share a wire call iff their keys are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey {
    pub destination: String,
    pub batch_tag: Option<String>,
}

impl GroupKey {
    pub fn of(request: &Request) -> Self {
        let config = request.config();
        Self {
            destination: config.uri.clone(),
            batch_tag: config.batch_tag.clone(),
        }
    }
}

/// Stable partition: groups appear in first-seen key order, members keep
/// their arrival order.
pub fn partition_by<T, K, F>(items: Vec<T>, key: F) -> Vec<Vec<T>>
where
    K: Hash + Eq,
    F: Fn(&T) -> K,
{
    let mut groups: IndexMap<K, Vec<T>> = IndexMap::new();
    for item in items {
        groups.entry(key(&item)).or_default().push(item);
    }
    groups.into_values().collect()
}

/// Split a flushed window into dispatch units.
pub fn group(requests: Vec<Request>) -> Vec<Batch> {
    if requests.len() <= 1 {
        return requests.into_iter().map(Batch::Single).collect();
    }
    let total = requests.len();
    let batches: Vec<Batch> = partition_by(requests, GroupKey::of)
        .into_iter()
        .map(Batch::from)
        .collect();
    debug!(requests = total, groups = batches.len(), "grouped flushed window");
    batches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ClientConfig, RequestConfig};
    use crate::request::{Operation, Params};

    fn req(resource: &str, overrides: RequestConfig) -> Request {
        let config = ClientConfig::default().resolve(&overrides);
        Request::new(resource, Operation::Read, Params::new(), None, config).0
    }

    fn resources(batch: &Batch) -> Vec<String> {
        match batch {
            Batch::Single(r) => vec![r.resource().to_string()],
            Batch::Grouped(rs) => rs.iter().map(|r| r.resource().to_string()).collect(),
        }
    }

    #[test]
    fn test_empty_and_single_pass_through() {
        assert!(group(Vec::new()).is_empty());
        let out = group(vec![req("a", RequestConfig::new())]);
        assert_eq!(out.len(), 1);
        assert!(matches!(out[0], Batch::Single(_)));
    }

    #[test]
    fn test_same_destination_grouped_in_order() {
        let out = group(vec![
            req("a", RequestConfig::new()),
            req("b", RequestConfig::new()),
            req("c", RequestConfig::new()),
        ]);
        assert_eq!(out.len(), 1);
        assert_eq!(resources(&out[0]), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_destination_and_tag_partition() {
        let out = group(vec![
            req("a", RequestConfig::new()),
            req("b", RequestConfig::new().uri("/other")),
            req("c", RequestConfig::new().batch_tag("slow")),
            req("d", RequestConfig::new()),
            req("e", RequestConfig::new().batch_tag("slow")),
        ]);
        assert_eq!(out.len(), 3);
        assert_eq!(resources(&out[0]), vec!["a", "d"]);
        assert!(matches!(out[1], Batch::Single(_)));
        assert_eq!(resources(&out[1]), vec!["b"]);
        assert_eq!(resources(&out[2]), vec!["c", "e"]);
    }

    #[test]
    fn test_key_does_not_concatenate_ambiguously() {
        let out = group(vec![
            req("a", RequestConfig::new().uri("/ap").batch_tag("i")),
            req("b", RequestConfig::new().uri("/api")),
        ]);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_partition_by_is_stable() {
        let groups = partition_by(vec![3, 1, 4, 1, 5, 9, 2, 6], |n| n % 2);
        assert_eq!(groups, vec![vec![3, 1, 1, 5, 9], vec![4, 2, 6]]);
    }

    #[test]
    fn test_batch_len() {
        let out = group(vec![req("a", RequestConfig::new()), req("b", RequestConfig::new())]);
        assert_eq!(out[0].len(), 2);
        assert!(!out[0].is_empty());
    }
}
