//! Ambient key/value pairs attached to every outgoing call.

use crate::config::DEFAULT_CRUMB_KEY;
use std::collections::BTreeMap;

/// Client-scoped context (session, locale, site identifiers and the optional
/// crumb). Built once with the client and shared read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    values: BTreeMap<String, String>,
    crumb_key: String,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    pub fn new() -> Self {
        Self {
            values: BTreeMap::new(),
            crumb_key: DEFAULT_CRUMB_KEY.to_string(),
        }
    }

    /// Use a different key for the crumb entry. A crumb already stored under
    /// the previous key moves with it.
    pub fn with_crumb_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        if key != self.crumb_key {
            if let Some(crumb) = self.values.remove(&self.crumb_key) {
                self.values.insert(key.clone(), crumb);
            }
            self.crumb_key = key;
        }
        self
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn with_crumb(mut self, crumb: impl Into<String>) -> Self {
        let key = self.crumb_key.clone();
        self.values.insert(key, crumb.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn crumb_key(&self) -> &str {
        &self.crumb_key
    }

    /// The crumb, if present and non-empty.
    pub fn crumb(&self) -> Option<&str> {
        self.get(&self.crumb_key).filter(|c| !c.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// All pairs, crumb included, as carried in a wire envelope.
    pub fn values(&self) -> &BTreeMap<String, String> {
        &self.values
    }

    /// Pairs to expose in a destination query string.
    pub fn query_pairs(&self, include_crumb: bool) -> impl Iterator<Item = (&str, &str)> {
        self.values
            .iter()
            .filter(move |(k, _)| include_crumb || **k != self.crumb_key)
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for Context
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Context::new(), |ctx, (k, v)| ctx.with(k, v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crumb_lookup() {
        let ctx = Context::new().with("lang", "en-US");
        assert_eq!(ctx.crumb(), None);

        let ctx = ctx.with_crumb("abc");
        assert_eq!(ctx.crumb(), Some("abc"));
        assert_eq!(ctx.get("_csrf"), Some("abc"));
    }

    #[test]
    fn test_empty_crumb_counts_as_missing() {
        let ctx = Context::new().with_crumb("");
        assert_eq!(ctx.crumb(), None);
    }

    #[test]
    fn test_custom_crumb_key() {
        let ctx = Context::new().with_crumb_key("crumb").with_crumb("xyz");
        assert_eq!(ctx.get("crumb"), Some("xyz"));
        assert_eq!(ctx.crumb(), Some("xyz"));
    }

    #[test]
    fn test_rekey_moves_existing_crumb() {
        let ctx = Context::new()
            .with("site", "us")
            .with_crumb("abc")
            .with_crumb_key("crumb");
        assert_eq!(ctx.crumb(), Some("abc"));
        assert_eq!(ctx.get("_csrf"), None);
        assert_eq!(ctx.query_pairs(false).collect::<Vec<_>>(), vec![("site", "us")]);

        let same = Context::new().with_crumb("abc").with_crumb_key("_csrf");
        assert_eq!(same.crumb(), Some("abc"));
    }

    #[test]
    fn test_query_pairs_can_hide_crumb() {
        let ctx = Context::new().with("site", "us").with_crumb("abc");
        let hidden: Vec<_> = ctx.query_pairs(false).collect();
        assert_eq!(hidden, vec![("site", "us")]);
        assert_eq!(ctx.query_pairs(true).count(), 2);
        assert_eq!(ctx.values().len(), 2);
    }

    #[test]
    fn test_from_iter() {
        let ctx: Context = vec![("a", "1"), ("b", "2")].into_iter().collect();
        assert_eq!(ctx.get("b"), Some("2"));
    }
}
