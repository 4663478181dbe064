//! Authenticator stacks: a chain plus the evaluation algorithm.
//!
//! A [`Stack`] is a [`Chain`] (it derefs to one, so the whole chain API is
//! available) that additionally tracks a *current* authenticator and can
//! answer the one question callers actually have: is the caller accepted?
//!
//! Evaluation walks the whole tree via [`Search`] and follows strict
//! ordering: every REQUIRED authenticator, at any depth, must accept
//! before a single SUFFICIENT one is tried. The first rejecting REQUIRED
//! node aborts the call with [`AuthError::Required`]. If the current
//! authenticator already accepts, evaluation short-circuits; otherwise the
//! first accepting SUFFICIENT node becomes the new current node — calling
//! [`Stack::accepted`] is a side-effecting read that can retarget
//! subsequent `subject`/`login`/`logout` calls. OPTIONAL nodes are never
//! consulted; they exist for manual consultation by the caller.
//!
//! Nothing is memoized: every call re-evaluates the required gates, so a
//! collaborator that stops accepting (an expired session, say) is caught
//! on the next call.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::rc::Rc;

use tracing::{debug, trace};

use crate::authenticator::{
    Authenticator, AuthenticatorRef, Control, NullAuthenticator, share,
};
use crate::chain::Chain;
use crate::error::{AuthError, AuthResult};
use crate::search::Search;

/// A chain with current-node selection and access evaluation.
pub struct Stack {
    chain: Chain,
    current: AuthenticatorRef,
    normalizer: Box<dyn Fn(&str) -> String>,
}

impl Stack {
    /// Create an empty stack. The current node starts as a
    /// [`NullAuthenticator`], which never accepts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style subject normalizer assignment.
    ///
    /// The normalizer is applied to whatever the current authenticator
    /// reports as subject — typically used to lowercase usernames or
    /// strip a domain suffix. Defaults to identity.
    pub fn with_normalizer(mut self, normalizer: impl Fn(&str) -> String + 'static) -> Self {
        self.normalizer = Box::new(normalizer);
        self
    }

    /// Replace the subject normalizer.
    pub fn set_normalizer(&mut self, normalizer: impl Fn(&str) -> String + 'static) {
        self.normalizer = Box::new(normalizer);
    }

    /// The current authenticator.
    pub fn current(&self) -> &AuthenticatorRef {
        &self.current
    }

    /// Make `node` the current authenticator. The node does not have to
    /// live inside the chain.
    pub fn set_authenticator(&mut self, node: AuthenticatorRef) {
        self.current = node;
    }

    /// Make the first authenticator stored under `key` (recursive search,
    /// traversal order) the current one.
    ///
    /// Returns `false` and leaves the current node unchanged when no
    /// authenticator matches.
    pub fn activate(&mut self, key: &str) -> bool {
        let search = Search::new(&self.chain);
        let found = search
            .authenticator(key, true)
            .next()
            .map(|(_, node)| Rc::clone(node));

        match found {
            Some(node) => {
                debug!(key, "activated authenticator");
                self.current = node;
                true
            }
            None => {
                trace!(key, "no authenticator under key, current unchanged");
                false
            }
        }
    }

    /// Evaluate the stack.
    ///
    /// Required gates first (any depth, traversal order; first rejection
    /// is fatal for the call and leaves the current node untouched), then
    /// the current-node short-circuit, then sufficient promotion.
    pub fn accepted(&mut self) -> AuthResult<bool> {
        let search = Search::new(&self.chain);

        for (key, node) in search.authenticators(true) {
            if node.borrow().control() != Control::Required {
                continue;
            }
            if !node.borrow_mut().accepted()? {
                let node = node.borrow();
                debug!(
                    key,
                    name = node.name(),
                    kind = node.kind(),
                    "required authenticator rejected"
                );
                return Err(AuthError::Required {
                    key: key.to_string(),
                    name: node.name().to_string(),
                    kind: node.kind(),
                });
            }
        }

        if self.current.borrow_mut().accepted()? {
            trace!("current authenticator accepted");
            return Ok(true);
        }

        for (key, node) in search.authenticators(true) {
            if node.borrow().control() != Control::Sufficient {
                continue;
            }
            if node.borrow_mut().accepted()? {
                debug!(key, "sufficient authenticator accepted, now current");
                self.current = Rc::clone(node);
                return Ok(true);
            }
        }

        Ok(false)
    }

    /// Normalized subject of the current authenticator.
    pub fn subject(&self) -> String {
        let subject = self.current.borrow().subject();
        (self.normalizer)(&subject)
    }

    /// Delegate login to the current authenticator. No gate check is
    /// performed here; that is [`Stack::accepted`]'s job.
    pub fn login(&mut self) -> AuthResult<()> {
        self.current.borrow_mut().login()
    }

    /// Delegate logout to the current authenticator, but only while the
    /// stack still evaluates to accepted (required gates re-run as part of
    /// the check).
    pub fn logout(&mut self) -> AuthResult<()> {
        if self.accepted()? {
            self.current.borrow_mut().logout()?;
        }
        Ok(())
    }

    /// Every authenticator in the tree, in traversal order, optionally
    /// restricted to visible ones.
    pub fn authenticators(&self, visible_only: bool) -> Vec<(String, AuthenticatorRef)> {
        let search = Search::new(&self.chain);
        search
            .authenticators(true)
            .filter(|(_, node)| !visible_only || node.borrow().visible())
            .map(|(key, node)| (key.to_string(), Rc::clone(node)))
            .collect()
    }
}

impl Default for Stack {
    fn default() -> Self {
        Self {
            chain: Chain::new(),
            current: share(NullAuthenticator::new()),
            normalizer: Box::new(str::to_string),
        }
    }
}

impl Deref for Stack {
    type Target = Chain;

    fn deref(&self) -> &Chain {
        &self.chain
    }
}

impl DerefMut for Stack {
    fn deref_mut(&mut self) -> &mut Chain {
        &mut self.chain
    }
}

impl fmt::Debug for Stack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let current = match self.current.try_borrow() {
            Ok(node) => format!("{} ({})", node.name(), node.kind()),
            Err(_) => "<borrowed>".to_string(),
        };
        f.debug_struct("Stack")
            .field("chain", &self.chain)
            .field("current", &current)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authenticator::CallbackAuthenticator;

    fn auth(subject: &str, verdict: bool) -> CallbackAuthenticator {
        CallbackAuthenticator::fixed(subject, verdict)
    }

    #[test]
    fn test_fresh_stack_rejects() {
        let mut stack = Stack::new();
        assert!(!stack.accepted().unwrap());
        assert_eq!(stack.subject(), "");
    }

    #[test]
    fn test_stack_derefs_to_chain() {
        let mut stack = Stack::new();
        stack.add("auth1", auth("alice", true));
        assert!(stack.exists("auth1"));
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn test_set_authenticator_changes_current() {
        let mut stack = Stack::new();
        let node = share(auth("alice", true));
        stack.set_authenticator(node.clone());

        assert!(Rc::ptr_eq(stack.current(), &node));
        assert!(stack.accepted().unwrap());
        assert_eq!(stack.subject(), "alice");
    }

    #[test]
    fn test_subject_normalization() {
        let mut stack = Stack::new().with_normalizer(str::to_lowercase);
        stack.set_authenticator(share(auth("ALICE", true)));
        assert_eq!(stack.subject(), "alice");
    }

    #[test]
    fn test_activate_missing_key_is_a_signalled_noop() {
        let mut stack = Stack::new();
        let node = share(auth("alice", true));
        stack.set_authenticator(node.clone());

        assert!(!stack.activate("nope"));
        assert!(Rc::ptr_eq(stack.current(), &node));
    }

    #[test]
    fn test_activate_finds_nested_authenticator() {
        let mut stack = Stack::new();
        stack.create("sub").add("deep", auth("bob", true));

        assert!(stack.activate("deep"));
        assert_eq!(stack.subject(), "bob");
    }

    #[test]
    fn test_login_delegates_without_gate_check() {
        use crate::Meta;
        use std::cell::Cell;

        struct LoginSpy {
            meta: Meta,
            logins: Rc<Cell<u32>>,
        }
        impl Authenticator for LoginSpy {
            fn accepted(&mut self) -> AuthResult<bool> {
                Ok(false)
            }
            fn subject(&self) -> String {
                String::new()
            }
            fn login(&mut self) -> AuthResult<()> {
                self.logins.set(self.logins.get() + 1);
                Ok(())
            }
            fn meta(&self) -> &Meta {
                &self.meta
            }
            fn meta_mut(&mut self) -> &mut Meta {
                &mut self.meta
            }
        }

        let logins = Rc::new(Cell::new(0));
        let mut stack = Stack::new();
        stack.set_authenticator(share(LoginSpy {
            meta: Meta::default(),
            logins: logins.clone(),
        }));

        // login goes straight through even though accepted() is false
        stack.login().unwrap();
        assert_eq!(logins.get(), 1);
    }
}
