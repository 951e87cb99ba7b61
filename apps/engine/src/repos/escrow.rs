//! Escrow records under `betting/{session_id}`.

use crate::domain::betting::EscrowRecord;
use crate::domain::ids::SessionId;
use crate::errors::domain::DomainError;
use crate::store::{self, Created, SharedStore, StorePath, Stored};

pub async fn find<S: SharedStore + ?Sized>(
    store: &S,
    session_id: &SessionId,
) -> Result<Option<Stored<EscrowRecord>>, DomainError> {
    store::read_typed(store, &StorePath::betting(session_id)).await
}

pub async fn create<S: SharedStore + ?Sized>(
    store: &S,
    record: EscrowRecord,
) -> Result<Created<EscrowRecord>, DomainError> {
    let path = StorePath::betting(&record.session_id);
    store::create_if_absent(store, &path, record).await
}

/// Compare-and-set against `expected`; returns the new version.
pub async fn update<S: SharedStore + ?Sized>(
    store: &S,
    record: &EscrowRecord,
    expected: u64,
) -> Result<u64, DomainError> {
    let path = StorePath::betting(&record.session_id);
    store::cas_typed(store, &path, Some(expected), record).await
}
