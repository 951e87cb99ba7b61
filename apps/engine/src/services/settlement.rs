//! Exactly-once settlement of finished matches, and record cleanup.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::ids::{MatchId, PlayerId};
use crate::domain::session::MatchSession;
use crate::domain::settlement::{apply_delta, balance_deltas};
use crate::domain::state::Seat;
use crate::error::AppError;
use crate::errors::domain::{DomainError, ValidationKind};
use crate::ledger::BalanceLedger;
use crate::repos::matches;
use crate::repos::settlements::{self, BalanceChange, ReceiptStatus, SettlementReceipt};
use crate::store::{Created, SharedStore, StorePath};
use crate::utils::clock::now_ms;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettlementResult {
    /// This caller claimed the match and moved the balances.
    Settled(SettlementReceipt),
    /// Someone already claimed it; nothing was applied.
    AlreadySettled(SettlementReceipt),
}

impl SettlementResult {
    pub fn receipt(&self) -> &SettlementReceipt {
        match self {
            SettlementResult::Settled(r) | SettlementResult::AlreadySettled(r) => r,
        }
    }
}

pub struct SettlementEngine {
    store: Arc<dyn SharedStore>,
    ledger: Arc<dyn BalanceLedger>,
}

impl SettlementEngine {
    pub fn new(store: Arc<dyn SharedStore>, ledger: Arc<dyn BalanceLedger>) -> Self {
        Self { store, ledger }
    }

    /// Apply the balance deltas of a finished match once.
    ///
    /// Both peers may call this concurrently; the create-if-absent claim on
    /// `settlements/{match_id}` picks exactly one of them.
    pub async fn settle(
        &self,
        session: &MatchSession,
        claimer: &PlayerId,
    ) -> Result<SettlementResult, AppError> {
        let outcome = session.state.outcome().ok_or_else(|| {
            DomainError::validation(
                ValidationKind::PhaseMismatch,
                format!("match {} is not finished", session.match_id),
            )
        })?;

        let claim = SettlementReceipt {
            match_id: session.match_id,
            session_id: session.session_id.clone(),
            claimed_by: claimer.clone(),
            outcome,
            bet: session.bet,
            status: ReceiptStatus::Claimed,
            changes: Vec::new(),
            claimed_at: now_ms(),
            applied_at: None,
        };

        let stored = match settlements::claim(self.store.as_ref(), claim).await? {
            Created::Existing(existing) => {
                debug!(
                    match_id = %session.match_id,
                    claimed_by = %existing.value.claimed_by,
                    "settlement already claimed"
                );
                return Ok(SettlementResult::AlreadySettled(existing.value));
            }
            Created::Created(stored) => stored,
        };

        let deltas = balance_deltas(&outcome, session.bet);
        let mut changes = Vec::with_capacity(2);
        for seat in [Seat::First, Seat::Second] {
            let uid = session.player(seat);
            let before = self.ledger.read_balance(uid).await?;
            let (after, clamped) = apply_delta(before, deltas[seat.index()]);
            if clamped {
                warn!(
                    match_id = %session.match_id,
                    uid = %uid,
                    before,
                    bet = session.bet,
                    "loser balance clamped at zero"
                );
            }
            if after != before {
                self.ledger.write_balance(uid, after).await?;
            }
            changes.push(BalanceChange {
                uid: uid.clone(),
                before,
                after,
            });
        }

        let mut receipt = stored.value;
        receipt.status = ReceiptStatus::Applied;
        receipt.changes = changes;
        receipt.applied_at = Some(now_ms());
        settlements::update(self.store.as_ref(), &receipt, stored.version).await?;

        info!(
            match_id = %session.match_id,
            session_id = %session.session_id,
            winner = ?outcome.winner,
            win_type = ?outcome.win_type,
            bet = session.bet,
            "match settled"
        );
        Ok(SettlementResult::Settled(receipt))
    }

    /// Delete the escrow, match and presence records of a settled match in
    /// one atomic write. The receipt is kept.
    ///
    /// A match record that belongs to a newer match is left alone.
    pub async fn cleanup(&self, session: &MatchSession) -> Result<(), AppError> {
        if let Some(current) = matches::find(self.store.as_ref(), &session.session_id).await? {
            if current.value.match_id != session.match_id {
                debug!(
                    session_id = %session.session_id,
                    "newer match present; skipping cleanup"
                );
                return Ok(());
            }
        }

        let sid = &session.session_id;
        let writes = BTreeMap::from([
            (StorePath::betting(sid), None),
            (StorePath::match_record(sid), None),
            (StorePath::presence(sid, session.player(Seat::First)), None),
            (StorePath::presence(sid, session.player(Seat::Second)), None),
        ]);
        self.store.atomic_multi_write(writes).await?;
        info!(session_id = %sid, match_id = %session.match_id, "session records removed");
        Ok(())
    }

    pub async fn receipt(
        &self,
        match_id: &MatchId,
    ) -> Result<Option<SettlementReceipt>, AppError> {
        Ok(settlements::find(self.store.as_ref(), match_id)
            .await?
            .map(|s| s.value))
    }
}
