//! Shared-store seam.
//!
//! Both clients of a match talk only to the store: they read the freshest
//! record, write with compare-and-set against the version they read, and react
//! to pushed snapshots. `MemoryStore` is the in-process implementation used by
//! tests and the simulator.

pub mod memory;
pub mod typed;

use std::collections::BTreeMap;
use std::fmt;
use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::ids::{MatchId, PlayerId, SessionId};
use crate::errors::domain::DomainError;

pub use memory::MemoryStore;
pub use typed::{cas_typed, create_if_absent, read_typed, Created, Stored};

/// Slash-separated key of one record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StorePath(String);

impl StorePath {
    pub fn betting(session_id: &SessionId) -> Self {
        Self(format!("betting/{session_id}"))
    }

    pub fn match_record(session_id: &SessionId) -> Self {
        Self(format!("matches/{session_id}"))
    }

    pub fn presence(session_id: &SessionId, uid: &PlayerId) -> Self {
        Self(format!("presence/{session_id}/{uid}"))
    }

    pub fn settlement(match_id: &MatchId) -> Self {
        Self(format!("settlements/{match_id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StorePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A stored value with its store-wide version. Versions only ever grow, so a
/// record that is deleted and recreated never reuses an old version.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned {
    pub version: u64,
    pub value: Value,
}

/// Presence or absence of a record at one instant.
pub type Snapshot = Option<Versioned>;

/// Latest-value stream: a slow consumer skips intermediate snapshots.
pub type SnapshotStream = Pin<Box<dyn Stream<Item = Snapshot> + Send>>;

/// One client's link to the store. Disconnect fallbacks hang off it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[async_trait]
pub trait SharedStore: Send + Sync {
    async fn read(&self, path: &StorePath) -> Result<Snapshot, DomainError>;

    /// Unconditional write. Returns the new version.
    async fn write(&self, path: &StorePath, value: Value) -> Result<u64, DomainError>;

    /// Write only if the current version equals `expected` (`None`: only if
    /// absent). A mismatch is an optimistic-lock conflict.
    async fn compare_and_set(
        &self,
        path: &StorePath,
        expected: Option<u64>,
        value: Value,
    ) -> Result<u64, DomainError>;

    async fn delete(&self, path: &StorePath) -> Result<(), DomainError>;

    /// Apply every entry or none; `None` deletes the path.
    async fn atomic_multi_write(
        &self,
        writes: BTreeMap<StorePath, Option<Value>>,
    ) -> Result<(), DomainError>;

    /// Current snapshot first, then every later change (latest value wins).
    async fn subscribe(&self, path: &StorePath) -> Result<SnapshotStream, DomainError>;

    async fn connect(&self) -> Result<ConnectionId, DomainError>;

    /// Arrange for `value` to be written at `path` when `conn` drops.
    async fn register_disconnect_fallback(
        &self,
        conn: ConnectionId,
        path: &StorePath,
        value: Value,
    ) -> Result<(), DomainError>;

    async fn cancel_disconnect_fallback(
        &self,
        conn: ConnectionId,
        path: &StorePath,
    ) -> Result<(), DomainError>;

    /// Close the connection, committing its pending fallbacks.
    async fn drop_connection(&self, conn: ConnectionId) -> Result<(), DomainError>;
}
