//! Identifiers shared by every layer: players, sessions, match instances.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::domain::{DomainError, ValidationKind};

/// Opaque account identifier supplied by the authentication collaborator.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(uid: impl Into<String>) -> Self {
        Self(uid.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Key shared by both participants of a pairing.
///
/// Derived from the unordered pair of uids, so `SessionId::for_pair(a, b)`
/// and `SessionId::for_pair(b, a)` agree. The lower uid is length-prefixed
/// (`{len}:{lo}_{hi}`) so distinct pairs never share a key. Uids are store
/// path segments and may not contain `/`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn for_pair(a: &PlayerId, b: &PlayerId) -> Result<Self, DomainError> {
        if a == b {
            return Err(DomainError::validation(
                ValidationKind::InvalidParticipants,
                format!("a session needs two distinct players, got {a} twice"),
            ));
        }
        for uid in [a, b] {
            if uid.as_str().is_empty() || uid.as_str().contains('/') {
                return Err(DomainError::validation(
                    ValidationKind::InvalidParticipants,
                    format!("uid '{uid}' is not a valid path segment"),
                ));
            }
        }
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        Ok(Self(format!("{}:{lo}_{hi}", lo.as_str().len())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique per match instance; a pair can play many matches under one session id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchId(Uuid);

impl MatchId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
