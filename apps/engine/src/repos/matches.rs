//! Match records under `matches/{session_id}`.

use crate::domain::ids::SessionId;
use crate::domain::session::MatchSession;
use crate::errors::domain::{DomainError, NotFoundKind};
use crate::store::{self, Created, SharedStore, StorePath, Stored};

pub async fn find<S: SharedStore + ?Sized>(
    store: &S,
    session_id: &SessionId,
) -> Result<Option<Stored<MatchSession>>, DomainError> {
    store::read_typed(store, &StorePath::match_record(session_id)).await
}

pub async fn require<S: SharedStore + ?Sized>(
    store: &S,
    session_id: &SessionId,
) -> Result<Stored<MatchSession>, DomainError> {
    find(store, session_id).await?.ok_or_else(|| {
        DomainError::not_found(NotFoundKind::Match, format!("no match for {session_id}"))
    })
}

/// First-write-wins match initialization.
pub async fn create<S: SharedStore + ?Sized>(
    store: &S,
    session: MatchSession,
) -> Result<Created<MatchSession>, DomainError> {
    let path = StorePath::match_record(&session.session_id);
    store::create_if_absent(store, &path, session).await
}

pub async fn update<S: SharedStore + ?Sized>(
    store: &S,
    session: &MatchSession,
    expected: u64,
) -> Result<u64, DomainError> {
    let path = StorePath::match_record(&session.session_id);
    store::cas_typed(store, &path, Some(expected), session).await
}
