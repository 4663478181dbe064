//! The authenticator contract.
//!
//! An authenticator is any strategy that can answer "is the caller
//! accepted?" and identify who the caller is. Concrete mechanisms
//! (HTTP Basic, LDAP, address matching, ...) live outside this crate;
//! here only the capability contract and its policy metadata are defined.
//!
//! Every authenticator carries [`Meta`]: a [`Control`] policy tier, a
//! visibility flag and display name/description. The metadata drives the
//! evaluation algorithm in [`Stack::accepted`](crate::Stack::accepted) and
//! is set fluently:
//!
//! ```ignore
//! let gate = CallbackAuthenticator::new("admin", || Ok(true))
//!     .with_control(Control::Required)
//!     .with_name("intranet gate");
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::AuthResult;

/// Access-control policy tier of an authenticator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Control {
    /// Never consulted by stack evaluation; reserved for manual
    /// consultation by the caller.
    Optional,
    /// Acceptance by any one sufficient authenticator grants access.
    #[default]
    Sufficient,
    /// Must accept before any sufficient authenticator is even tried.
    Required,
}

impl Control {
    /// String representation for logging and audit trails.
    pub fn as_str(&self) -> &'static str {
        match self {
            Control::Optional => "optional",
            Control::Sufficient => "sufficient",
            Control::Required => "required",
        }
    }
}

impl fmt::Display for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn default_visible() -> bool {
    true
}

/// Mutable metadata carried by every authenticator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    /// Policy tier consulted by stack evaluation
    #[serde(default)]
    pub control: Control,

    /// Whether the authenticator should be offered to users (e.g. in a
    /// login form); invisible authenticators still participate in
    /// evaluation
    #[serde(default = "default_visible")]
    pub visible: bool,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,
}

impl Default for Meta {
    fn default() -> Self {
        Self {
            control: Control::default(),
            visible: true,
            name: String::new(),
            description: String::new(),
        }
    }
}

/// The capability contract every authentication strategy satisfies.
///
/// `login`/`logout` default to no-ops: strategies where the concept does
/// not apply (address matching, for instance) simply leave them alone.
/// `accepted` takes `&mut self` because real strategies touch sessions,
/// counters or sockets when answering.
pub trait Authenticator {
    /// Whether the caller passes this authenticator.
    fn accepted(&mut self) -> AuthResult<bool>;

    /// Identifier of the accepted caller (e.g. a username).
    fn subject(&self) -> String;

    /// Establish whatever state the strategy associates with a login.
    fn login(&mut self) -> AuthResult<()> {
        Ok(())
    }

    /// Tear down whatever state the strategy associates with a login.
    fn logout(&mut self) -> AuthResult<()> {
        Ok(())
    }

    /// Shared metadata.
    fn meta(&self) -> &Meta;

    /// Shared metadata, mutable.
    fn meta_mut(&mut self) -> &mut Meta;

    /// Short kind string identifying the strategy, used in error and log
    /// output.
    fn kind(&self) -> &'static str {
        "authenticator"
    }

    /// Policy tier.
    fn control(&self) -> Control {
        self.meta().control
    }

    /// Set the policy tier.
    fn set_control(&mut self, control: Control) {
        self.meta_mut().control = control;
    }

    /// Visibility flag.
    fn visible(&self) -> bool {
        self.meta().visible
    }

    /// Set the visibility flag.
    fn set_visible(&mut self, visible: bool) {
        self.meta_mut().visible = visible;
    }

    /// Display name.
    fn name(&self) -> &str {
        &self.meta().name
    }

    /// Set the display name.
    fn set_name(&mut self, name: &str) {
        self.meta_mut().name = name.to_string();
    }

    /// Description.
    fn description(&self) -> &str {
        &self.meta().description
    }

    /// Set the description.
    fn set_description(&mut self, description: &str) {
        self.meta_mut().description = description.to_string();
    }

    /// Builder-style [`Control`] assignment.
    fn with_control(mut self, control: Control) -> Self
    where
        Self: Sized,
    {
        self.meta_mut().control = control;
        self
    }

    /// Builder-style visibility assignment.
    fn with_visible(mut self, visible: bool) -> Self
    where
        Self: Sized,
    {
        self.meta_mut().visible = visible;
        self
    }

    /// Builder-style name assignment.
    fn with_name(mut self, name: impl Into<String>) -> Self
    where
        Self: Sized,
    {
        self.meta_mut().name = name.into();
        self
    }

    /// Builder-style description assignment.
    fn with_description(mut self, description: impl Into<String>) -> Self
    where
        Self: Sized,
    {
        self.meta_mut().description = description.into();
        self
    }
}

/// Shared single-threaded handle to a live authenticator.
///
/// The same node can sit inside a chain and simultaneously be a stack's
/// current node, so nodes are reference-counted. The whole crate is
/// single-threaded by design (callers serialize mutation), which makes
/// `Rc<RefCell<_>>` the honest choice over a lock.
pub type AuthenticatorRef = Rc<RefCell<dyn Authenticator>>;

/// Wrap an authenticator into a shared handle.
pub fn share<A: Authenticator + 'static>(authenticator: A) -> AuthenticatorRef {
    Rc::new(RefCell::new(authenticator))
}

/// Always-rejecting placeholder.
///
/// A freshly created [`Stack`](crate::Stack) points at one of these until
/// an authenticator is activated or promoted, so "no current node" never
/// needs a special case.
#[derive(Debug, Default)]
pub struct NullAuthenticator {
    meta: Meta,
}

impl NullAuthenticator {
    /// Create a null authenticator.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Authenticator for NullAuthenticator {
    fn accepted(&mut self) -> AuthResult<bool> {
        Ok(false)
    }

    fn subject(&self) -> String {
        String::new()
    }

    fn meta(&self) -> &Meta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut Meta {
        &mut self.meta
    }

    fn kind(&self) -> &'static str {
        "null"
    }
}

/// Closure-backed authenticator.
///
/// Adapts a plain closure to the [`Authenticator`] contract for callers
/// (and tests) that don't want a named type for a one-off check. The
/// subject is fixed at construction time.
pub struct CallbackAuthenticator {
    meta: Meta,
    subject: String,
    accept: Box<dyn FnMut() -> AuthResult<bool>>,
}

impl CallbackAuthenticator {
    /// Create a callback authenticator with the given subject and
    /// acceptance check.
    pub fn new(
        subject: impl Into<String>,
        accept: impl FnMut() -> AuthResult<bool> + 'static,
    ) -> Self {
        Self {
            meta: Meta::default(),
            subject: subject.into(),
            accept: Box::new(accept),
        }
    }

    /// Create a callback authenticator with a fixed verdict.
    pub fn fixed(subject: impl Into<String>, verdict: bool) -> Self {
        Self::new(subject, move || Ok(verdict))
    }
}

impl Authenticator for CallbackAuthenticator {
    fn accepted(&mut self) -> AuthResult<bool> {
        (self.accept)()
    }

    fn subject(&self) -> String {
        self.subject.clone()
    }

    fn meta(&self) -> &Meta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut Meta {
        &mut self.meta
    }

    fn kind(&self) -> &'static str {
        "callback"
    }
}

impl fmt::Debug for CallbackAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackAuthenticator")
            .field("meta", &self.meta)
            .field("subject", &self.subject)
            .finish_non_exhaustive()
    }
}
