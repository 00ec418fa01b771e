use std::fmt;

use crate::api::RequestFailure;
use crate::config::AuthConfig;

/// Sign-in state handed over by the identity provider. Credentials are never
/// issued or checked here; the client only refuses to talk to the backend
/// while signed out.
#[derive(Clone, PartialEq, Eq)]
pub enum Identity {
    SignedOut,
    SignedIn { token: Option<String> },
}

impl Identity {
    pub fn from_config(auth: &AuthConfig) -> Self {
        let env_token = std::env::var(&auth.token_env).ok();
        Self::resolve(auth, env_token)
    }

    fn resolve(auth: &AuthConfig, env_token: Option<String>) -> Self {
        let token = auth
            .token
            .clone()
            .or(env_token)
            .filter(|token| !token.trim().is_empty());

        match token {
            Some(token) => Identity::SignedIn { token: Some(token) },
            None if auth.required => Identity::SignedOut,
            None => Identity::SignedIn { token: None },
        }
    }

    pub fn is_signed_in(&self) -> bool {
        matches!(self, Identity::SignedIn { .. })
    }

    pub fn bearer_token(&self) -> Option<&str> {
        match self {
            Identity::SignedIn { token } => token.as_deref(),
            Identity::SignedOut => None,
        }
    }

    pub fn ensure_signed_in(&self) -> Result<(), RequestFailure> {
        if self.is_signed_in() {
            Ok(())
        } else {
            Err(RequestFailure::NotSignedIn)
        }
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::SignedOut => write!(f, "SignedOut"),
            Identity::SignedIn { token } => f
                .debug_struct("SignedIn")
                .field("token", &token.as_ref().map(|_| "<redacted>"))
                .finish(),
        }
    }
}
