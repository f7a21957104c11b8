//! Rich data store
//!
//! Attributes can only hold strings, so rich-data values stay in memory and
//! the attribute carries a `$id<n>$` token pointing at them. Tokens come from
//! a monotonic counter and are never handed out twice. A token minted for an
//! element attribute belongs to that (element, attribute) pair: only the
//! owner rewrites or releases it, so copied or hand-written tokens never
//! alias another element's entry.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use htna_dom::NodeId;

use crate::AttributeValue;

#[derive(Debug)]
struct Entry {
    value: AttributeValue,
    owner: Option<(NodeId, String)>,
}

#[derive(Debug)]
struct RichDataInner {
    prefix: String,
    counter: u64,
    entries: HashMap<String, Entry>,
}

impl RichDataInner {
    fn owned_by(&self, token: &str, node: NodeId, attribute: &str) -> bool {
        self.entries
            .get(token)
            .and_then(|entry| entry.owner.as_ref())
            .is_some_and(|(owner, name)| *owner == node && name == attribute)
    }

    /// Next unused token, skipping any `in_use` reports as already present
    fn mint(&mut self, in_use: impl Fn(&str) -> bool) -> String {
        loop {
            self.counter += 1;
            let token = format!("{}{}$", self.prefix, self.counter);
            if !self.entries.contains_key(&token) && !in_use(&token) {
                return token;
            }
            tracing::trace!("Skipping rich data token {} already in use", token);
        }
    }
}

/// Token → value storage shared by every accessor of one `Htna` context
#[derive(Debug, Clone)]
pub struct RichDataStore {
    inner: Rc<RefCell<RichDataInner>>,
}

impl RichDataStore {
    pub fn new() -> Self {
        Self::with_prefix("$id")
    }

    /// Store whose tokens look like `{prefix}<n>$`
    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            inner: Rc::new(RefCell::new(RichDataInner {
                prefix: prefix.to_string(),
                counter: 0,
                entries: HashMap::new(),
            })),
        }
    }

    /// Whether `raw` has the shape of a token of this store
    pub fn is_token(&self, raw: &str) -> bool {
        let inner = self.inner.borrow();
        raw.strip_prefix(inner.prefix.as_str())
            .and_then(|rest| rest.strip_suffix('$'))
            .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
    }

    /// Store `value` under a fresh token with no owner
    pub fn store(&self, value: AttributeValue) -> String {
        let mut inner = self.inner.borrow_mut();
        let token = inner.mint(|_| false);
        inner.entries.insert(token.clone(), Entry { value, owner: None });
        tracing::trace!("Stored rich data under {}", token);
        token
    }

    /// Store `value` for `attribute` of `node`
    ///
    /// `previous` is reused only when this store issued it to the same
    /// element attribute. Otherwise a fresh token is minted, skipping any
    /// token `in_use` reports as already written somewhere.
    pub fn store_for(
        &self,
        node: NodeId,
        attribute: &str,
        value: AttributeValue,
        previous: Option<&str>,
        in_use: impl Fn(&str) -> bool,
    ) -> String {
        let mut inner = self.inner.borrow_mut();
        let token = match previous.filter(|p| inner.owned_by(p, node, attribute)) {
            Some(token) => token.to_string(),
            None => inner.mint(in_use),
        };
        let owner = Some((node, attribute.to_string()));
        inner.entries.insert(token.clone(), Entry { value, owner });
        tracing::trace!("Stored rich data for {:?}.{} under {}", node, attribute, token);
        token
    }

    pub fn get(&self, token: &str) -> Option<AttributeValue> {
        self.inner.borrow().entries.get(token).map(|entry| entry.value.clone())
    }

    /// Drop the value behind `token`
    pub fn release(&self, token: &str) -> bool {
        let removed = self.inner.borrow_mut().entries.remove(token).is_some();
        if removed {
            tracing::trace!("Released rich data {}", token);
        }
        removed
    }

    /// Drop the value behind `token` if it belongs to `attribute` of `node`
    pub fn release_for(&self, node: NodeId, attribute: &str, token: &str) -> bool {
        let owned = self.inner.borrow().owned_by(token, node, attribute);
        owned && self.release(token)
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for RichDataStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RichValue;
    use htna_dom::Dom;

    fn elements(count: usize) -> Vec<NodeId> {
        let dom = Dom::new();
        (0..count).map(|_| dom.create_element("div").unwrap()).collect()
    }

    #[test]
    fn test_tokens_are_monotonic_and_owned() {
        let store = RichDataStore::new();
        let node = elements(1)[0];
        let first = store.store_for(node, "model", AttributeValue::from(1), None, |_| false);
        let second = store.store_for(node, "other", AttributeValue::from(2), Some("plain"), |_| false);
        assert_eq!(first, "$id1$");
        assert_eq!(second, "$id2$");

        let again = store.store_for(node, "model", AttributeValue::from(3), Some(&first), |_| false);
        assert_eq!(again, first);
        assert_eq!(store.get(&first), Some(AttributeValue::from(3)));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_foreign_token_is_not_rewritten() {
        let store = RichDataStore::new();
        let nodes = elements(2);
        let (a, b) = (nodes[0], nodes[1]);
        let token = store.store_for(a, "model", AttributeValue::from(1), None, |_| false);

        let copy = store.store_for(b, "model", AttributeValue::from(2), Some(&token), |_| false);
        assert_ne!(copy, token);
        assert_eq!(store.get(&token), Some(AttributeValue::from(1)));

        assert!(!store.release_for(b, "model", &token));
        assert!(store.release_for(b, "model", &copy));
        assert_eq!(store.get(&token), Some(AttributeValue::from(1)));
    }

    #[test]
    fn test_mint_skips_tokens_in_use() {
        let store = RichDataStore::new();
        let token = store.store_for(elements(1)[0], "model", AttributeValue::Null, Some("$id1$"), |t| t == "$id1$");
        assert_eq!(token, "$id2$");
        assert_eq!(store.store(AttributeValue::Null), "$id3$");
    }

    #[test]
    fn test_release_never_recycles_tokens() {
        let store = RichDataStore::new();
        let token = store.store(AttributeValue::Rich(RichValue::new("payload")));
        assert!(store.release(&token));
        assert!(!store.release(&token));
        assert_eq!(store.get(&token), None);

        assert_eq!(store.store(AttributeValue::Null), "$id2$");
    }

    #[test]
    fn test_token_shape() {
        let store = RichDataStore::with_prefix("$htna");
        assert!(store.is_token("$htna12$"));
        assert!(!store.is_token("$htna$"));
        assert!(!store.is_token("$htna1"));
        assert!(!store.is_token("$id1$"));
    }
}
