use std::fmt;

/// Credentials handed out by the identity provider.
#[derive(Clone, PartialEq, Eq)]
pub struct Identity {
    pub principal: String,
    pub token: String,
}

impl Identity {
    pub fn new(principal: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            principal: principal.into(),
            token: token.into(),
        }
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("principal", &self.principal)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Source of the caller's identity, if any.
pub trait IdentityProvider: Send + Sync {
    fn identity(&self) -> Option<Identity>;
}

/// Provider that never authenticates.
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

impl IdentityProvider for Anonymous {
    fn identity(&self) -> Option<Identity> {
        None
    }
}

/// Provider backed by a fixed identity (e.g. read from configuration).
#[derive(Debug, Clone)]
pub struct StaticIdentity(pub Identity);

impl IdentityProvider for StaticIdentity {
    fn identity(&self) -> Option<Identity> {
        Some(self.0.clone())
    }
}

impl<T: IdentityProvider + ?Sized> IdentityProvider for std::sync::Arc<T> {
    fn identity(&self) -> Option<Identity> {
        (**self).identity()
    }
}

/// Immutable per-call context. Every backend operation receives one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Session {
    identity: Option<Identity>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self { identity: None }
    }

    pub fn authenticated(identity: Identity) -> Self {
        Self {
            identity: Some(identity),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    pub fn principal(&self) -> Option<&str> {
        self.identity.as_ref().map(|i| i.principal.as_str())
    }

    pub fn bearer_token(&self) -> Option<&str> {
        self.identity.as_ref().map(|i| i.token.as_str())
    }
}

/// Resolve the session to use for subsequent calls.
///
/// An identity with a blank token is treated as anonymous.
pub fn ensure_session(provider: &dyn IdentityProvider) -> Session {
    match provider.identity() {
        Some(identity) if !identity.token.trim().is_empty() => {
            tracing::debug!(principal = %identity.principal, "using authenticated session");
            Session::authenticated(identity)
        }
        _ => {
            tracing::debug!("using anonymous session");
            Session::anonymous()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_provider_yields_anonymous_session() {
        let session = ensure_session(&Anonymous);
        assert!(!session.is_authenticated());
        assert_eq!(session.principal(), None);
        assert_eq!(session.bearer_token(), None);
    }

    #[test]
    fn static_identity_yields_authenticated_session() {
        let provider = StaticIdentity(Identity::new("2vxsx-fae", "secret"));
        let session = ensure_session(&provider);

        assert!(session.is_authenticated());
        assert_eq!(session.principal(), Some("2vxsx-fae"));
        assert_eq!(session.bearer_token(), Some("secret"));
    }

    #[test]
    fn blank_token_is_anonymous() {
        let provider = StaticIdentity(Identity::new("2vxsx-fae", "  "));
        assert!(!ensure_session(&provider).is_authenticated());
    }

    #[test]
    fn debug_output_hides_token() {
        let rendered = format!("{:?}", Identity::new("p", "hunter2"));
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }
}
