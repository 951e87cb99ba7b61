use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, info};

use super::{ConnectionId, SharedStore, Snapshot, SnapshotStream, StorePath, Versioned};
use crate::errors::domain::{ConflictKind, DomainError, InfraErrorKind};

#[derive(Default)]
struct Inner {
    entries: HashMap<StorePath, Versioned>,
    last_version: u64,
    /// Open connections and the fallback writes each one has armed.
    connections: HashMap<ConnectionId, BTreeMap<StorePath, Value>>,
    watchers: HashMap<StorePath, watch::Sender<Snapshot>>,
}

impl Inner {
    fn put(&mut self, path: &StorePath, value: Value) -> u64 {
        self.last_version += 1;
        let version = self.last_version;
        self.entries
            .insert(path.clone(), Versioned { version, value });
        self.notify(path);
        version
    }

    fn remove(&mut self, path: &StorePath) {
        if self.entries.remove(path).is_some() {
            self.notify(path);
        }
        if self
            .watchers
            .get(path)
            .is_some_and(|tx| tx.receiver_count() == 0)
        {
            self.watchers.remove(path);
        }
    }

    fn notify(&self, path: &StorePath) {
        if let Some(tx) = self.watchers.get(path) {
            tx.send_replace(self.entries.get(path).cloned());
        }
    }

    fn connection_mut(
        &mut self,
        conn: ConnectionId,
    ) -> Result<&mut BTreeMap<StorePath, Value>, DomainError> {
        self.connections.get_mut(&conn).ok_or_else(|| {
            DomainError::infra(
                InfraErrorKind::Other("connection".to_string()),
                format!("connection {conn} is closed"),
            )
        })
    }
}

/// In-process store with per-path watch channels.
///
/// Versions are store-wide and strictly increasing. `set_available(false)`
/// makes every call fail with `StoreUnavailable`, which is how tests exercise
/// transient connectivity loss.
pub struct MemoryStore {
    inner: Mutex<Inner>,
    available: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            available: AtomicBool::new(true),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), DomainError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(DomainError::infra(
                InfraErrorKind::StoreUnavailable,
                "shared store is unreachable",
            ))
        }
    }

    /// Number of records currently stored.
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Paths under a prefix, sorted.
    pub fn paths_with_prefix(&self, prefix: &str) -> Vec<StorePath> {
        let inner = self.inner.lock();
        let mut paths: Vec<StorePath> = inner
            .entries
            .keys()
            .filter(|p| p.as_str().starts_with(prefix))
            .cloned()
            .collect();
        paths.sort();
        paths
    }
}

#[async_trait]
impl SharedStore for MemoryStore {
    async fn read(&self, path: &StorePath) -> Result<Snapshot, DomainError> {
        self.check_available()?;
        Ok(self.inner.lock().entries.get(path).cloned())
    }

    async fn write(&self, path: &StorePath, value: Value) -> Result<u64, DomainError> {
        self.check_available()?;
        Ok(self.inner.lock().put(path, value))
    }

    async fn compare_and_set(
        &self,
        path: &StorePath,
        expected: Option<u64>,
        value: Value,
    ) -> Result<u64, DomainError> {
        self.check_available()?;
        let mut inner = self.inner.lock();
        let current = inner.entries.get(path).map(|v| v.version);
        if current != expected {
            debug!(path = %path, ?expected, ?current, "compare-and-set rejected");
            return Err(DomainError::conflict(
                ConflictKind::OptimisticLock,
                format!("{path}: expected version {expected:?}, found {current:?}"),
            ));
        }
        Ok(inner.put(path, value))
    }

    async fn delete(&self, path: &StorePath) -> Result<(), DomainError> {
        self.check_available()?;
        self.inner.lock().remove(path);
        Ok(())
    }

    async fn atomic_multi_write(
        &self,
        writes: BTreeMap<StorePath, Option<Value>>,
    ) -> Result<(), DomainError> {
        self.check_available()?;
        let mut inner = self.inner.lock();
        for (path, value) in writes {
            match value {
                Some(value) => {
                    inner.put(&path, value);
                }
                None => inner.remove(&path),
            }
        }
        Ok(())
    }

    async fn subscribe(&self, path: &StorePath) -> Result<SnapshotStream, DomainError> {
        self.check_available()?;
        let mut inner = self.inner.lock();
        let current = inner.entries.get(path).cloned();
        let rx = match inner.watchers.get(path) {
            Some(tx) => tx.subscribe(),
            None => {
                let (tx, rx) = watch::channel(current);
                inner.watchers.insert(path.clone(), tx);
                rx
            }
        };
        Ok(Box::pin(WatchStream::new(rx)))
    }

    async fn connect(&self) -> Result<ConnectionId, DomainError> {
        self.check_available()?;
        let conn = ConnectionId::new();
        self.inner.lock().connections.insert(conn, BTreeMap::new());
        debug!(%conn, "store connection opened");
        Ok(conn)
    }

    async fn register_disconnect_fallback(
        &self,
        conn: ConnectionId,
        path: &StorePath,
        value: Value,
    ) -> Result<(), DomainError> {
        self.check_available()?;
        let mut inner = self.inner.lock();
        inner.connection_mut(conn)?.insert(path.clone(), value);
        Ok(())
    }

    async fn cancel_disconnect_fallback(
        &self,
        conn: ConnectionId,
        path: &StorePath,
    ) -> Result<(), DomainError> {
        self.check_available()?;
        let mut inner = self.inner.lock();
        inner.connection_mut(conn)?.remove(path);
        Ok(())
    }

    /// Runs even while the store is marked unavailable: the server side of a
    /// dropped link still commits fallbacks.
    async fn drop_connection(&self, conn: ConnectionId) -> Result<(), DomainError> {
        let mut inner = self.inner.lock();
        let Some(fallbacks) = inner.connections.remove(&conn) else {
            return Ok(());
        };
        info!(%conn, fallbacks = fallbacks.len(), "store connection dropped");
        for (path, value) in fallbacks {
            inner.put(&path, value);
        }
        Ok(())
    }
}
