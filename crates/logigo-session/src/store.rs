//! The tab-scoped key-value store that holds the session.
//!
//! The store is shared: request-authorization code reads the token from
//! it, the auth client writes the first token/expiry pair at login, and
//! the lifecycle manager rewrites them on renewal and clears everything
//! at expiry. All writes of the pair go through
//! [`SessionStore::write_session`] so the two keys never disagree on
//! naming.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use logigo_protocol::{ACCESS_TOKEN_KEY, EXPIRES_AT_KEY};

/// A string key-value store scoped to one client session (one tab).
///
/// Methods take `&self`: implementations use interior mutability so one
/// store can be handed to several owners.
pub trait SessionStore: Send + Sync + 'static {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String);
    fn remove(&self, key: &str);

    /// Removes every key, session or not.
    fn clear(&self);

    /// The bearer token, if present and non-empty.
    fn access_token(&self) -> Option<String> {
        self.get(ACCESS_TOKEN_KEY).filter(|t| !t.is_empty())
    }

    /// The absolute expiry in epoch milliseconds, if present and numeric.
    fn expires_at(&self) -> Option<i64> {
        self.get(EXPIRES_AT_KEY)?.trim().parse().ok()
    }

    /// Writes the token and its absolute expiry together.
    fn write_session(&self, access_token: &str, expires_at_epoch_ms: i64) {
        self.set(ACCESS_TOKEN_KEY, access_token.to_string());
        self.set(EXPIRES_AT_KEY, expires_at_epoch_ms.to_string());
    }
}

/// In-memory [`SessionStore`]. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// A poisoned lock only means another thread panicked mid-write of a
// single `String`; the map itself is still consistent, so keep using it.
impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: String) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value);
    }

    fn remove(&self, key: &str) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }

    fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl<S: SessionStore> SessionStore for Arc<S> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: String) {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) {
        (**self).remove(key)
    }

    fn clear(&self) {
        (**self).clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_session_sets_both_canonical_keys() {
        let store = MemoryStore::new();

        store.write_session("tok", 1_700_000_000_000);

        assert_eq!(store.get(ACCESS_TOKEN_KEY).as_deref(), Some("tok"));
        assert_eq!(
            store.get(EXPIRES_AT_KEY).as_deref(),
            Some("1700000000000")
        );
        assert_eq!(store.access_token().as_deref(), Some("tok"));
        assert_eq!(store.expires_at(), Some(1_700_000_000_000));
    }

    #[test]
    fn test_legacy_expiry_keys_are_not_read() {
        let store = MemoryStore::new();
        store.set("expires_in", "1700000000000".into());
        store.set("tokenExpirationTime", "1700000000000".into());

        assert_eq!(store.expires_at(), None);
    }

    #[test]
    fn test_empty_token_reads_as_absent() {
        let store = MemoryStore::new();
        store.set(ACCESS_TOKEN_KEY, String::new());

        assert_eq!(store.access_token(), None);
    }

    #[test]
    fn test_non_numeric_expiry_reads_as_absent() {
        let store = MemoryStore::new();
        store.set(EXPIRES_AT_KEY, "soon".into());

        assert_eq!(store.expires_at(), None);
    }

    #[test]
    fn test_clear_removes_every_key() {
        let store = MemoryStore::new();
        store.write_session("tok", 1);
        store.set("theme", "dark".into());

        store.clear();

        assert!(store.is_empty());
    }

    #[test]
    fn test_clones_share_entries() {
        let a = MemoryStore::new();
        let b = a.clone();

        a.write_session("tok", 42);
        assert_eq!(b.access_token().as_deref(), Some("tok"));

        b.remove(ACCESS_TOKEN_KEY);
        assert_eq!(a.access_token(), None);
        assert_eq!(a.len(), 1);
    }
}
