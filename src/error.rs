/// Error types for authstack operations.
///
/// The crate's error surface is deliberately small: a lookup error for
/// direct chain indexing, a policy failure for rejected mandatory
/// authenticators, and a transparent wrapper for whatever a collaborator
/// authenticator reports. The core performs no retries and no suppression;
/// every error propagates unchanged to the caller.
use thiserror::Error;

/// The error type for authstack operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Direct lookup (`Chain::get`) addressed a key that does not exist.
    ///
    /// Always caller-recoverable: the caller chose the wrong key. Never
    /// raised by `Chain::want`, which creates the entry instead.
    #[error("no entry '{key}' in chain")]
    NotFound {
        /// The key that was looked up
        key: String,
    },

    /// A REQUIRED authenticator rejected the request during stack
    /// evaluation.
    ///
    /// Raised only by `Stack::accepted`. A mandatory gate failed; callers
    /// are expected to deny access, not retry.
    #[error("required authenticator '{name}' ({kind}) at '{key}' rejected the request")]
    Required {
        /// Chain key under which the failing authenticator was found
        key: String,
        /// Display name of the failing authenticator
        name: String,
        /// Kind string of the failing authenticator
        kind: &'static str,
    },

    /// A collaborator authenticator failed on its own terms.
    ///
    /// The core never constructs this variant; concrete authenticators use
    /// it to surface backend failures (credential store down, network
    /// error, ...) and the core propagates it untouched.
    #[error(transparent)]
    Backend(Box<dyn std::error::Error + Send + Sync>),
}

impl AuthError {
    /// Wrap a collaborator error.
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        AuthError::Backend(Box::new(err))
    }
}

/// Result type alias for authstack operations.
pub type AuthResult<T> = Result<T, AuthError>;
