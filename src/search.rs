//! Chain-aware search over live authenticator trees.
//!
//! [`Search`] bridges the mutable world of [`Chain`] and the read-only
//! world of [`Filter`]: at construction it recursively converts a live
//! chain (and every live sub-chain reachable from it) into a plain
//! [`Snapshot`], then delegates all queries to a filter over that
//! snapshot. The conversion decouples traversal from the mutable tree —
//! mutating the chain after a search was built does not disturb queries
//! in flight, and is not reflected in them either.

use crate::authenticator::AuthenticatorRef;
use crate::chain::{Chain, Entry};
use crate::filter::{Filter, Snapshot, SnapshotEntry};

/// Recursive queries over a snapshot of a live [`Chain`].
#[derive(Debug, Clone)]
pub struct Search {
    filter: Filter,
}

impl Search {
    /// Snapshot `chain` and build a search over it.
    pub fn new(chain: &Chain) -> Self {
        Self {
            filter: Filter::new(flatten(chain)),
        }
    }

    /// The snapshot taken at construction time.
    pub fn snapshot(&self) -> &Snapshot {
        self.filter.snapshot()
    }

    /// See [`Filter::chains`].
    pub fn chains(&self, recursive: bool) -> impl Iterator<Item = (&str, &Snapshot)> {
        self.filter.chains(recursive)
    }

    /// See [`Filter::authenticators`].
    pub fn authenticators(&self, recursive: bool) -> impl Iterator<Item = (&str, &AuthenticatorRef)> {
        self.filter.authenticators(recursive)
    }

    /// See [`Filter::chain`].
    pub fn chain<'a>(
        &'a self,
        key: &'a str,
        recursive: bool,
    ) -> impl Iterator<Item = (&'a str, &'a Snapshot)> {
        self.filter.chain(key, recursive)
    }

    /// See [`Filter::authenticator`].
    pub fn authenticator<'a>(
        &'a self,
        key: &'a str,
        recursive: bool,
    ) -> impl Iterator<Item = (&'a str, &'a AuthenticatorRef)> {
        self.filter.authenticator(key, recursive)
    }
}

impl From<&Chain> for Search {
    fn from(chain: &Chain) -> Self {
        Search::new(chain)
    }
}

/// Recursively convert a live chain into a plain nested mapping.
///
/// Authenticators are cloned as shared handles (queries hand out the live
/// nodes); sub-chains are expanded depth-first. Sub-chains are owned
/// values, so the input is a strict tree and the recursion terminates.
fn flatten(chain: &Chain) -> Snapshot {
    chain
        .iter()
        .map(|(key, entry)| {
            let value = match entry {
                Entry::Authenticator(auth) => SnapshotEntry::Authenticator(auth.clone()),
                Entry::Chain(sub) => SnapshotEntry::Chain(flatten(sub)),
            };
            (key.clone(), value)
        })
        .collect()
}
