//! Recursive queries over flattened chain snapshots.
//!
//! [`Filter`] knows nothing about live [`Chain`](crate::Chain) values: it
//! operates on a [`Snapshot`], a plain nested mapping where every value is
//! either a leaf authenticator handle or another nested mapping. The walk
//! is a pre-order traversal (parents before children, insertion order
//! within a level) with two independent predicates composed per query:
//! "does the key match" and "is the value a chain or a node".
//!
//! Every query returns a fresh lazy iterator; calling the same query twice
//! yields two independent traversals over the same snapshot.
//!
//! [`Search`](crate::Search) is the chain-aware front-end that produces
//! the snapshot in the first place.

use std::fmt;

use indexmap::IndexMap;

use crate::authenticator::{Authenticator, AuthenticatorRef};

/// A flattened chain tree: every sub-chain expanded to a plain mapping.
pub type Snapshot = IndexMap<String, SnapshotEntry>;

/// One value of a [`Snapshot`].
#[derive(Clone)]
pub enum SnapshotEntry {
    /// Shared handle to a live authenticator (leaf)
    Authenticator(AuthenticatorRef),
    /// Expanded sub-chain
    Chain(Snapshot),
}

impl SnapshotEntry {
    /// The authenticator handle, if this entry is a leaf.
    pub fn as_authenticator(&self) -> Option<&AuthenticatorRef> {
        match self {
            SnapshotEntry::Authenticator(a) => Some(a),
            SnapshotEntry::Chain(_) => None,
        }
    }

    /// The expanded sub-chain, if this entry is one.
    pub fn as_chain(&self) -> Option<&Snapshot> {
        match self {
            SnapshotEntry::Authenticator(_) => None,
            SnapshotEntry::Chain(c) => Some(c),
        }
    }
}

impl fmt::Debug for SnapshotEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotEntry::Authenticator(a) => match a.try_borrow() {
                Ok(a) => f
                    .debug_struct("Authenticator")
                    .field("name", &a.name())
                    .field("kind", &a.kind())
                    .finish(),
                Err(_) => f.write_str("Authenticator(<borrowed>)"),
            },
            SnapshotEntry::Chain(c) => c.fmt(f),
        }
    }
}

/// Pre-order walk over a snapshot tree.
///
/// Nodes are leaves by contract: the walk yields them but never descends
/// into them. Chain entries are yielded before their children.
struct Walk<'a> {
    stack: Vec<indexmap::map::Iter<'a, String, SnapshotEntry>>,
    recursive: bool,
}

impl<'a> Walk<'a> {
    fn new(snapshot: &'a Snapshot, recursive: bool) -> Self {
        Self {
            stack: vec![snapshot.iter()],
            recursive,
        }
    }
}

impl<'a> Iterator for Walk<'a> {
    type Item = (&'a str, &'a SnapshotEntry);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let next = self.stack.last_mut()?.next();
            match next {
                Some((key, entry)) => {
                    if self.recursive {
                        if let SnapshotEntry::Chain(sub) = entry {
                            self.stack.push(sub.iter());
                        }
                    }
                    return Some((key.as_str(), entry));
                }
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

/// Query engine over one [`Snapshot`].
#[derive(Debug, Clone)]
pub struct Filter {
    snapshot: Snapshot,
}

impl Filter {
    /// Build a filter over an already-flattened snapshot.
    pub fn new(snapshot: Snapshot) -> Self {
        Self { snapshot }
    }

    /// The underlying snapshot.
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Every sub-chain in the tree: the whole subtree when `recursive`,
    /// the top level only otherwise.
    pub fn chains(&self, recursive: bool) -> impl Iterator<Item = (&str, &Snapshot)> {
        Walk::new(&self.snapshot, recursive)
            .filter_map(|(key, entry)| entry.as_chain().map(|chain| (key, chain)))
    }

    /// Every authenticator in the tree, same recursion rule.
    pub fn authenticators(&self, recursive: bool) -> impl Iterator<Item = (&str, &AuthenticatorRef)> {
        Walk::new(&self.snapshot, recursive)
            .filter_map(|(key, entry)| entry.as_authenticator().map(|auth| (key, auth)))
    }

    /// Sub-chains stored under `key`, anywhere in the tree when
    /// `recursive`. A key can recur at several nesting levels, so this
    /// yields zero or more matches.
    pub fn chain<'a>(
        &'a self,
        key: &'a str,
        recursive: bool,
    ) -> impl Iterator<Item = (&'a str, &'a Snapshot)> {
        self.chains(recursive).filter(move |(k, _)| *k == key)
    }

    /// Authenticators stored under `key`, same matching rule as
    /// [`Filter::chain`].
    pub fn authenticator<'a>(
        &'a self,
        key: &'a str,
        recursive: bool,
    ) -> impl Iterator<Item = (&'a str, &'a AuthenticatorRef)> {
        self.authenticators(recursive)
            .filter(move |(k, _)| *k == key)
    }
}
