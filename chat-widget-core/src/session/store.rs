//! Session token type and store trait

use serde::Serialize;
use std::fmt;

/// Opaque continuity token issued by the answering service.
///
/// Never empty: [`SessionToken::new`] rejects empty and whitespace-only input,
/// so "no token" is always expressed as `Option::None`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            None
        } else {
            Some(Self(raw))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Persists one session token.
///
/// Implementations never fail: when the storage medium is unavailable they
/// keep the token in memory for the rest of the run.
pub trait SessionStore: Send {
    /// The current token, if one was ever set or persisted
    fn get(&self) -> Option<SessionToken>;

    /// Replace the current token
    fn set(&mut self, token: SessionToken);
}

/// Store that lives only as long as the process
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    token: Option<SessionToken>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an existing token
    pub fn with_token(token: SessionToken) -> Self {
        Self { token: Some(token) }
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self) -> Option<SessionToken> {
        self.token.clone()
    }

    fn set(&mut self, token: SessionToken) {
        self.token = Some(token);
    }
}
