//! Presence records under `presence/{session_id}/{uid}`.

use serde::{Deserialize, Serialize};

use crate::domain::ids::{PlayerId, SessionId};
use crate::errors::domain::DomainError;
use crate::store::{self, typed, ConnectionId, SharedStore, StorePath, Stored};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceRecord {
    pub connected: bool,
    pub last_seen: i64,
}

pub async fn find<S: SharedStore + ?Sized>(
    store: &S,
    session_id: &SessionId,
    uid: &PlayerId,
) -> Result<Option<Stored<PresenceRecord>>, DomainError> {
    store::read_typed(store, &StorePath::presence(session_id, uid)).await
}

/// Mark `uid` online and arm the offline fallback on `conn`.
pub async fn announce<S: SharedStore + ?Sized>(
    store: &S,
    conn: ConnectionId,
    session_id: &SessionId,
    uid: &PlayerId,
    now_ms: i64,
) -> Result<(), DomainError> {
    let path = StorePath::presence(session_id, uid);
    let online = PresenceRecord {
        connected: true,
        last_seen: now_ms,
    };
    let offline = PresenceRecord {
        connected: false,
        last_seen: now_ms,
    };
    store
        .register_disconnect_fallback(conn, &path, typed::encode(&path, &offline)?)
        .await?;
    store.write(&path, typed::encode(&path, &online)?).await?;
    Ok(())
}

/// Disarm the fallback so a later disconnect does not recreate a cleaned-up
/// record.
pub async fn withdraw<S: SharedStore + ?Sized>(
    store: &S,
    conn: ConnectionId,
    session_id: &SessionId,
    uid: &PlayerId,
) -> Result<(), DomainError> {
    store
        .cancel_disconnect_fallback(conn, &StorePath::presence(session_id, uid))
        .await
}
