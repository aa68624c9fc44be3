//! Request authorization.
//!
//! Deliberately thin: a token-to-actor registry used for audit attribution.
//! With no tokens configured, every request maps to the anonymous actor.

use crate::error::{PinError, Result};
use serde::Serialize;
use std::collections::HashMap;

/// The identity a request acts as; recorded in the audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActorIdentity {
    pub name: String,
}

impl ActorIdentity {
    /// The identity used when the registry is open.
    pub fn anonymous() -> Self {
        Self {
            name: "anonymous".to_string(),
        }
    }
}

/// Maps bearer tokens to actor identities.
#[derive(Debug, Clone, Default)]
pub struct AccessRegistry {
    tokens: HashMap<String, String>,
}

impl AccessRegistry {
    /// A registry with no tokens: every request is anonymous.
    pub fn open() -> Self {
        Self::default()
    }

    /// A registry requiring one of the given `(actor, token)` pairs.
    pub fn with_tokens(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        let tokens = pairs
            .into_iter()
            .map(|(actor, token)| (token, actor))
            .collect();
        Self { tokens }
    }

    /// Whether any token is required at all.
    pub fn is_open(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Resolve the request's bearer token to an actor.
    ///
    /// `bearer` is the token from the `Authorization: Bearer` header, if
    /// the request carried one.
    pub fn authorize(&self, bearer: Option<&str>) -> Result<ActorIdentity> {
        if self.is_open() {
            return Ok(ActorIdentity::anonymous());
        }
        let token = bearer.ok_or_else(|| PinError::unauthorized("missing bearer token"))?;
        self.tokens
            .get(token)
            .map(|actor| ActorIdentity { name: actor.clone() })
            .ok_or_else(|| PinError::unauthorized("unknown token"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_registry_is_anonymous() {
        let registry = AccessRegistry::open();
        let actor = registry.authorize(None).unwrap();
        assert_eq!(actor, ActorIdentity::anonymous());
    }

    #[test]
    fn test_token_resolves_actor() {
        let registry =
            AccessRegistry::with_tokens([("alice".to_string(), "s3cret".to_string())]);
        let actor = registry.authorize(Some("s3cret")).unwrap();
        assert_eq!(actor.name, "alice");
    }

    #[test]
    fn test_missing_or_unknown_token_rejected() {
        let registry =
            AccessRegistry::with_tokens([("alice".to_string(), "s3cret".to_string())]);
        assert!(matches!(
            registry.authorize(None),
            Err(PinError::Unauthorized(_))
        ));
        assert!(matches!(
            registry.authorize(Some("wrong")),
            Err(PinError::Unauthorized(_))
        ));
    }
}
