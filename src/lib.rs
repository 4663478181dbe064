//! # authstack — composable authenticator chains and stacks
//!
//! authstack unifies interchangeable authentication strategies behind one
//! contract and composes them into ordered trees with access-control
//! semantics. Concrete mechanisms (HTTP Basic, LDAP, address matching,
//! form sessions, ...) live outside this crate and plug in through the
//! [`Authenticator`] trait; authstack supplies the composition:
//!
//! - **[`Chain`]** — a named, insertion-ordered tree of authenticators
//!   and nested sub-chains, built fluently.
//! - **[`Stack`]** — a chain plus current-node selection and the
//!   evaluation algorithm: every REQUIRED node must accept before any
//!   SUFFICIENT node is tried, the first accepting SUFFICIENT node is
//!   promoted to current, and a rejecting REQUIRED node fails the call
//!   with an error naming the offender.
//! - **[`Filter`] / [`Search`]** — lazy, restartable recursive queries
//!   (all chains, all authenticators, by key) over an immutable snapshot
//!   of the tree.
//!
//! ## Quick start
//!
//! ```ignore
//! use authstack::prelude::*;
//!
//! let mut stack = Stack::new().with_normalizer(str::to_lowercase);
//! stack.add(
//!     "intranet",
//!     CallbackAuthenticator::new("", check_intranet_addr).with_control(Control::Required),
//! );
//! stack
//!     .create("logins")
//!     .add("basic", basic_auth)
//!     .add("form", form_auth);
//!
//! match stack.accepted() {
//!     Ok(true) => println!("welcome, {}", stack.subject()),
//!     Ok(false) => println!("please log in"),
//!     Err(err) => println!("access denied: {err}"),
//! }
//! ```
//!
//! ## Evaluation contract
//!
//! `Stack::accepted` re-evaluates on every call (no memoization), walks
//! the tree depth-first in insertion order, and treats OPTIONAL nodes as
//! inert — they are reserved for manual consultation. Promotion of a
//! sufficient node is a side-effecting read: a successful `accepted()`
//! can retarget later `subject`/`login`/`logout` calls.
//!
//! ## Threading
//!
//! The crate is single-threaded by design. Evaluation is synchronous and
//! performs no I/O of its own; anything slow or fallible lives inside
//! collaborator authenticators. Build one stack per request, or serialize
//! access externally. Searches snapshot the tree at construction, so a
//! traversal never observes later mutation.

mod authenticator;
mod chain;
mod error;
mod filter;
mod search;
mod stack;

// Public API exports
pub use authenticator::{
    Authenticator, AuthenticatorRef, CallbackAuthenticator, Control, Meta, NullAuthenticator,
    share,
};
pub use chain::{Chain, Entry};
pub use error::{AuthError, AuthResult};
pub use filter::{Filter, Snapshot, SnapshotEntry};
pub use search::Search;
pub use stack::Stack;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use authstack::prelude::*;
/// ```
pub mod prelude {
    pub use crate::authenticator::{
        Authenticator, AuthenticatorRef, CallbackAuthenticator, Control, Meta,
        NullAuthenticator, share,
    };
    pub use crate::chain::{Chain, Entry};
    pub use crate::error::{AuthError, AuthResult};
    pub use crate::search::Search;
    pub use crate::stack::Stack;
}
