//! Named, ordered trees of authenticators.
//!
//! A [`Chain`] maps string keys to entries, where an [`Entry`] is either a
//! leaf authenticator or a nested sub-chain. Insertion order is preserved
//! for iteration (it makes enumeration deterministic, nothing more), keys
//! are unique per level, and nesting depth is unbounded.
//!
//! Sub-chains are owned values, so a chain can never be inserted into
//! itself: the tree stays a tree by construction. Leaf authenticators are
//! shared handles ([`AuthenticatorRef`]) because the same live node may
//! also be a stack's current node.
//!
//! Chains are built fluently:
//!
//! ```ignore
//! let mut chain = Chain::new();
//! chain
//!     .add("basic", basic_auth)
//!     .add("ldap", ldap_auth)
//!     .create("fallback")
//!     .add("form", form_auth);
//! ```

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use indexmap::map::Entry as MapEntry;

use crate::authenticator::{Authenticator, AuthenticatorRef, share};
use crate::error::{AuthError, AuthResult};

/// One slot of a chain: a leaf authenticator or a nested sub-chain.
#[derive(Clone)]
pub enum Entry {
    /// Shared handle to a live authenticator
    Authenticator(AuthenticatorRef),
    /// Owned sub-chain
    Chain(Chain),
}

impl Entry {
    /// Whether this entry is a leaf authenticator.
    pub fn is_authenticator(&self) -> bool {
        matches!(self, Entry::Authenticator(_))
    }

    /// Whether this entry is a sub-chain.
    pub fn is_chain(&self) -> bool {
        matches!(self, Entry::Chain(_))
    }

    /// The authenticator handle, if this entry is a leaf.
    pub fn as_authenticator(&self) -> Option<&AuthenticatorRef> {
        match self {
            Entry::Authenticator(a) => Some(a),
            Entry::Chain(_) => None,
        }
    }

    /// The sub-chain, if this entry is one.
    pub fn as_chain(&self) -> Option<&Chain> {
        match self {
            Entry::Authenticator(_) => None,
            Entry::Chain(c) => Some(c),
        }
    }

    /// The sub-chain, mutable, if this entry is one.
    pub fn as_chain_mut(&mut self) -> Option<&mut Chain> {
        match self {
            Entry::Authenticator(_) => None,
            Entry::Chain(c) => Some(c),
        }
    }
}

impl<A: Authenticator + 'static> From<A> for Entry {
    fn from(authenticator: A) -> Self {
        Entry::Authenticator(share(authenticator))
    }
}

impl From<AuthenticatorRef> for Entry {
    fn from(authenticator: AuthenticatorRef) -> Self {
        Entry::Authenticator(authenticator)
    }
}

impl From<Chain> for Entry {
    fn from(chain: Chain) -> Self {
        Entry::Chain(chain)
    }
}

impl PartialEq for Entry {
    /// Authenticator entries compare by handle identity (two handles to
    /// the same live node are equal); sub-chains compare structurally.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Entry::Authenticator(a), Entry::Authenticator(b)) => Rc::ptr_eq(a, b),
            (Entry::Chain(a), Entry::Chain(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entry::Authenticator(a) => match a.try_borrow() {
                Ok(a) => f
                    .debug_struct("Authenticator")
                    .field("name", &a.name())
                    .field("kind", &a.kind())
                    .field("control", &a.control())
                    .finish(),
                Err(_) => f.write_str("Authenticator(<borrowed>)"),
            },
            Entry::Chain(c) => c.fmt(f),
        }
    }
}

/// A named, ordered mapping of keys to authenticators and sub-chains.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Chain {
    entries: IndexMap<String, Entry>,
}

impl Chain {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry under `key`, silently replacing any existing entry.
    ///
    /// Returns the stored entry so the caller can keep building into a
    /// freshly inserted sub-chain.
    pub fn insert(&mut self, key: impl Into<String>, entry: impl Into<Entry>) -> &mut Entry {
        match self.entries.entry(key.into()) {
            MapEntry::Occupied(mut occupied) => {
                occupied.insert(entry.into());
                occupied.into_mut()
            }
            MapEntry::Vacant(vacant) => vacant.insert(entry.into()),
        }
    }

    /// Insert every pair of `entries`, in order. Returns `self` for
    /// chaining.
    pub fn append<K, V, I>(&mut self, entries: I) -> &mut Self
    where
        K: Into<String>,
        V: Into<Entry>,
        I: IntoIterator<Item = (K, V)>,
    {
        for (key, entry) in entries {
            self.insert(key, entry);
        }
        self
    }

    /// Insert an entry and return `self` instead of the entry, for fluent
    /// `.add(..).add(..)` building.
    pub fn add(&mut self, key: impl Into<String>, entry: impl Into<Entry>) -> &mut Self {
        self.insert(key, entry);
        self
    }

    /// Insert a new empty sub-chain under `key` and return it, so the
    /// caller can continue building into the sub-chain directly.
    pub fn create(&mut self, key: impl Into<String>) -> &mut Chain {
        match self.insert(key, Chain::new()) {
            Entry::Chain(chain) => chain,
            Entry::Authenticator(_) => unreachable!("just inserted a chain"),
        }
    }

    /// Clear the chain and fill it with `entries`.
    pub fn replace<K, V, I>(&mut self, entries: I) -> &mut Self
    where
        K: Into<String>,
        V: Into<Entry>,
        I: IntoIterator<Item = (K, V)>,
    {
        self.entries.clear();
        self.append(entries)
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Remove the entry under `key`, if any. Absent keys are not an error.
    pub fn remove(&mut self, key: &str) -> Option<Entry> {
        self.entries.shift_remove(key)
    }

    /// Whether an entry exists under `key` at this level.
    pub fn exists(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Direct lookup. Fails with [`AuthError::NotFound`] when the key is
    /// absent; use [`Chain::want`] for get-or-create behavior.
    pub fn get(&self, key: &str) -> AuthResult<&Entry> {
        self.entries.get(key).ok_or_else(|| AuthError::NotFound {
            key: key.to_string(),
        })
    }

    /// Direct mutable lookup; same contract as [`Chain::get`].
    pub fn get_mut(&mut self, key: &str) -> AuthResult<&mut Entry> {
        self.entries
            .get_mut(key)
            .ok_or_else(|| AuthError::NotFound {
                key: key.to_string(),
            })
    }

    /// Get-or-create: returns the existing entry unchanged, or inserts an
    /// empty sub-chain under `key` and returns that.
    pub fn want(&mut self, key: impl Into<String>) -> &mut Entry {
        self.entries
            .entry(key.into())
            .or_insert_with(|| Entry::Chain(Chain::new()))
    }

    /// Iterate entries in insertion order. Each call starts a fresh
    /// iterator.
    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Entry> {
        self.entries.iter()
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of entries at this level (sub-chains count as one).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether this level holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Shallow export of the mapping, with sub-chain values left as
    /// chains. [`Search`](crate::Search) performs the recursive expansion
    /// separately.
    pub fn snapshot(&self) -> IndexMap<String, Entry> {
        self.entries.clone()
    }
}

impl<'a> IntoIterator for &'a Chain {
    type Item = (&'a String, &'a Entry);
    type IntoIter = indexmap::map::Iter<'a, String, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl<K: Into<String>, V: Into<Entry>> FromIterator<(K, V)> for Chain {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut chain = Chain::new();
        chain.append(iter);
        chain
    }
}

impl<K: Into<String>, V: Into<Entry>> Extend<(K, V)> for Chain {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.append(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authenticator::CallbackAuthenticator;

    fn auth(subject: &str) -> CallbackAuthenticator {
        CallbackAuthenticator::fixed(subject, true)
    }

    #[test]
    fn test_insert_and_exists() {
        let mut chain = Chain::new();
        assert!(!chain.exists("auth1"));

        chain.insert("auth1", auth("alice"));
        assert!(chain.exists("auth1"));
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn test_insert_replaces_existing_key() {
        let mut chain = Chain::new();
        let first = share(auth("alice"));
        let second = share(auth("bob"));

        chain.insert("auth1", first.clone());
        chain.insert("auth1", second.clone());

        assert_eq!(chain.len(), 1);
        let stored = chain.get("auth1").unwrap().as_authenticator().unwrap();
        assert!(Rc::ptr_eq(stored, &second));
        assert!(!Rc::ptr_eq(stored, &first));
    }

    #[test]
    fn test_get_missing_key_is_not_found() {
        let chain = Chain::new();
        let err = chain.get("nope").unwrap_err();
        assert!(matches!(err, AuthError::NotFound { key } if key == "nope"));
    }

    #[test]
    fn test_remove_is_silent_on_absent_key() {
        let mut chain = Chain::new();
        chain.insert("auth1", auth("alice"));

        assert!(chain.remove("auth1").is_some());
        assert!(chain.remove("auth1").is_none());
        assert!(!chain.exists("auth1"));
    }

    #[test]
    fn test_want_creates_then_returns_same_entry() {
        let mut chain = Chain::new();

        // First call creates an empty sub-chain.
        let created = chain.want("sub");
        assert!(created.is_chain());
        created
            .as_chain_mut()
            .unwrap()
            .insert("inner", auth("alice"));

        // Second call returns the same entry, mutation included.
        let again = chain.want("sub");
        assert!(again.as_chain().unwrap().exists("inner"));
    }

    #[test]
    fn test_want_leaves_existing_authenticator_unchanged() {
        let mut chain = Chain::new();
        let node = share(auth("alice"));
        chain.insert("auth1", node.clone());

        let entry = chain.want("auth1");
        assert!(entry.is_authenticator());
        assert!(Rc::ptr_eq(entry.as_authenticator().unwrap(), &node));
    }

    #[test]
    fn test_fluent_add_and_create() {
        let mut chain = Chain::new();
        chain
            .add("auth1", auth("a1"))
            .add("auth2", auth("a2"))
            .create("chain1")
            .add("auth3", auth("a3"));

        assert_eq!(chain.len(), 3);
        let sub = chain.get("chain1").unwrap().as_chain().unwrap();
        assert!(sub.exists("auth3"));
    }

    #[test]
    fn test_iteration_preserves_insertion_order() {
        let mut chain = Chain::new();
        chain
            .add("c", auth("1"))
            .add("a", auth("2"))
            .add("b", auth("3"));

        let keys: Vec<_> = chain.keys().collect();
        assert_eq!(keys, vec!["c", "a", "b"]);

        // Replacing a key keeps its position.
        chain.insert("a", auth("4"));
        let keys: Vec<_> = chain.keys().collect();
        assert_eq!(keys, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_replace_then_snapshot_round_trips() {
        let a = share(auth("alice"));
        let b = share(auth("bob"));

        let mut chain = Chain::new();
        chain.add("stale", auth("old"));
        chain.replace([("auth1", a.clone()), ("auth2", b.clone())]);

        let copy = chain.snapshot();
        assert_eq!(copy.len(), 2);
        assert!(Rc::ptr_eq(copy["auth1"].as_authenticator().unwrap(), &a));
        assert!(Rc::ptr_eq(copy["auth2"].as_authenticator().unwrap(), &b));
        assert_eq!(
            copy.keys().collect::<Vec<_>>(),
            vec!["auth1", "auth2"],
            "snapshot preserves insertion order"
        );
    }

    #[test]
    fn test_clear_empties_the_chain() {
        let mut chain = Chain::new();
        chain.add("auth1", auth("alice")).create("sub");
        chain.clear();
        assert!(chain.is_empty());
    }

    #[test]
    fn test_from_iterator_builds_nested_literal() {
        let sub: Chain = [("inner", auth("bob"))].into_iter().collect();
        let chain: Chain = vec![
            ("auth1", Entry::from(auth("alice"))),
            ("chain1", Entry::from(sub)),
        ]
        .into_iter()
        .collect();

        assert!(chain.get("auth1").unwrap().is_authenticator());
        assert!(
            chain
                .get("chain1")
                .unwrap()
                .as_chain()
                .unwrap()
                .exists("inner")
        );
    }
}
