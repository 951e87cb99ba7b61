//! Settlement receipts under `settlements/{match_id}`. Never deleted.

use serde::{Deserialize, Serialize};

use crate::domain::ids::{MatchId, PlayerId, SessionId};
use crate::domain::state::Outcome;
use crate::errors::domain::DomainError;
use crate::store::{self, Created, SharedStore, StorePath, Stored};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceiptStatus {
    Claimed,
    Applied,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceChange {
    pub uid: PlayerId,
    pub before: u64,
    pub after: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementReceipt {
    pub match_id: MatchId,
    pub session_id: SessionId,
    /// Uid of the peer that claimed the settlement.
    pub claimed_by: PlayerId,
    pub outcome: Outcome,
    pub bet: u64,
    pub status: ReceiptStatus,
    /// Filled in once balances are written, seat order.
    pub changes: Vec<BalanceChange>,
    pub claimed_at: i64,
    pub applied_at: Option<i64>,
}

pub async fn find<S: SharedStore + ?Sized>(
    store: &S,
    match_id: &MatchId,
) -> Result<Option<Stored<SettlementReceipt>>, DomainError> {
    store::read_typed(store, &StorePath::settlement(match_id)).await
}

/// One-shot claim: only the first caller gets `Created`.
pub async fn claim<S: SharedStore + ?Sized>(
    store: &S,
    receipt: SettlementReceipt,
) -> Result<Created<SettlementReceipt>, DomainError> {
    let path = StorePath::settlement(&receipt.match_id);
    store::create_if_absent(store, &path, receipt).await
}

pub async fn update<S: SharedStore + ?Sized>(
    store: &S,
    receipt: &SettlementReceipt,
    expected: u64,
) -> Result<u64, DomainError> {
    let path = StorePath::settlement(&receipt.match_id);
    store::cas_typed(store, &path, Some(expected), receipt).await
}
