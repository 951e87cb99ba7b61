//! Wager negotiation: the escrow record and its pure transitions.
//!
//! `Negotiating -> Matched -> Started`, or `Cancelled` from any open state.
//! Each player only ever writes their own proposal slot; equal proposals are
//! the sole acceptance criterion.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::ids::{MatchId, PlayerId, SessionId};
use crate::errors::domain::{ConflictKind, DomainError, ValidationKind};

/// Default denominations, smallest first.
pub const DEFAULT_BET_MENU: [u64; 7] = [50, 100, 150, 200, 250, 500, 1000];

/// Allowed wager amounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BetMenu(Vec<u64>);

impl BetMenu {
    pub fn new(mut amounts: Vec<u64>) -> Result<Self, DomainError> {
        amounts.sort_unstable();
        amounts.dedup();
        if amounts.is_empty() || amounts[0] == 0 {
            return Err(DomainError::validation(
                ValidationKind::InvalidBet,
                "bet menu needs at least one positive amount",
            ));
        }
        Ok(Self(amounts))
    }

    pub fn amounts(&self) -> &[u64] {
        &self.0
    }

    pub fn minimum(&self) -> u64 {
        self.0.first().copied().unwrap_or_default()
    }

    pub fn contains(&self, amount: u64) -> bool {
        self.0.binary_search(&amount).is_ok()
    }
}

impl Default for BetMenu {
    fn default() -> Self {
        Self(DEFAULT_BET_MENU.to_vec())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub amount: u64,
    pub proposed_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum CancelReason {
    Withdrawn { by: PlayerId },
    InsufficientFunds { uid: PlayerId },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EscrowStatus {
    Negotiating,
    Matched { amount: u64 },
    Started { amount: u64, match_id: MatchId },
    Cancelled(CancelReason),
}

impl EscrowStatus {
    pub fn is_open(&self) -> bool {
        matches!(self, EscrowStatus::Negotiating | EscrowStatus::Matched { .. })
    }
}

/// Result of a proposal as seen by the proposer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProposeOutcome {
    /// The peer has not proposed yet.
    Waiting,
    Mismatch { mine: u64, theirs: u64 },
    Matched { amount: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowRecord {
    pub session_id: SessionId,
    pub inviter: PlayerId,
    pub invitee: PlayerId,
    pub status: EscrowStatus,
    pub proposals: BTreeMap<PlayerId, Proposal>,
    pub created_at: i64,
}

fn closed(status: &EscrowStatus) -> DomainError {
    DomainError::validation(
        ValidationKind::EscrowClosed,
        format!("negotiation is closed ({status:?})"),
    )
}

impl EscrowRecord {
    pub fn open(inviter: PlayerId, invitee: PlayerId, now_ms: i64) -> Result<Self, DomainError> {
        let session_id = SessionId::for_pair(&inviter, &invitee)?;
        Ok(Self {
            session_id,
            inviter,
            invitee,
            status: EscrowStatus::Negotiating,
            proposals: BTreeMap::new(),
            created_at: now_ms,
        })
    }

    /// Decide what an `open` over an existing record means.
    ///
    /// Same pairing still open: `Ok(None)` (nothing to write). Cancelled:
    /// a fresh record replaces it. Started: a match is live or unsettled.
    pub fn reopen(
        &self,
        inviter: &PlayerId,
        invitee: &PlayerId,
        now_ms: i64,
    ) -> Result<Option<Self>, DomainError> {
        match &self.status {
            EscrowStatus::Cancelled(_) => {
                Ok(Some(Self::open(inviter.clone(), invitee.clone(), now_ms)?))
            }
            EscrowStatus::Started { match_id, .. } => Err(DomainError::conflict(
                ConflictKind::SessionConflict,
                format!("match {match_id} for {} is not settled", self.session_id),
            )),
            _ if &self.inviter == inviter && &self.invitee == invitee => Ok(None),
            _ => Err(DomainError::conflict(
                ConflictKind::SessionConflict,
                format!("{} already invited {}", self.inviter, self.invitee),
            )),
        }
    }

    pub fn is_participant(&self, uid: &PlayerId) -> bool {
        &self.inviter == uid || &self.invitee == uid
    }

    pub fn peer_of(&self, uid: &PlayerId) -> Result<&PlayerId, DomainError> {
        if &self.inviter == uid {
            Ok(&self.invitee)
        } else if &self.invitee == uid {
            Ok(&self.inviter)
        } else {
            Err(DomainError::validation(
                ValidationKind::NotAParticipant,
                format!("{uid} is not part of {}", self.session_id),
            ))
        }
    }

    pub fn proposal_of(&self, uid: &PlayerId) -> Option<u64> {
        self.proposals.get(uid).map(|p| p.amount)
    }

    /// Record `uid`'s proposal, overwriting any earlier one.
    ///
    /// `balance` is the proposer's current balance; a proposal above it is
    /// refused without touching the record.
    pub fn propose(
        mut self,
        uid: &PlayerId,
        amount: u64,
        balance: u64,
        menu: &BetMenu,
        now_ms: i64,
    ) -> Result<(Self, ProposeOutcome), DomainError> {
        if !self.status.is_open() {
            return Err(closed(&self.status));
        }
        let peer = self.peer_of(uid)?.clone();
        if !menu.contains(amount) {
            return Err(DomainError::validation(
                ValidationKind::InvalidBet,
                format!("{amount} is not one of {:?}", menu.amounts()),
            ));
        }
        if amount > balance {
            return Err(DomainError::validation(
                ValidationKind::InsufficientFunds,
                format!("balance {balance} does not cover {amount}"),
            ));
        }
        if uid == &self.invitee && !self.proposals.contains_key(&self.inviter) {
            return Err(DomainError::validation(
                ValidationKind::AwaitingInviter,
                format!("waiting for {} to propose first", self.inviter),
            ));
        }

        self.proposals.insert(
            uid.clone(),
            Proposal {
                amount,
                proposed_at: now_ms,
            },
        );

        let outcome = match self.proposal_of(&peer) {
            None => ProposeOutcome::Waiting,
            Some(theirs) if theirs == amount => ProposeOutcome::Matched { amount },
            Some(theirs) => ProposeOutcome::Mismatch {
                mine: amount,
                theirs,
            },
        };
        self.status = match outcome {
            ProposeOutcome::Matched { amount } => EscrowStatus::Matched { amount },
            _ => EscrowStatus::Negotiating,
        };
        Ok((self, outcome))
    }

    /// Close the negotiation and withdraw every proposal.
    pub fn cancel(mut self, reason: CancelReason) -> Result<Self, DomainError> {
        match self.status {
            EscrowStatus::Started { .. } => Err(closed(&self.status)),
            EscrowStatus::Cancelled(_) => Ok(self),
            _ => {
                self.proposals.clear();
                self.status = EscrowStatus::Cancelled(reason);
                Ok(self)
            }
        }
    }

    /// `Matched -> Started`.
    pub fn start(mut self, match_id: MatchId) -> Result<Self, DomainError> {
        match self.status {
            EscrowStatus::Matched { amount } => {
                self.status = EscrowStatus::Started { amount, match_id };
                Ok(self)
            }
            EscrowStatus::Negotiating => Err(DomainError::validation(
                ValidationKind::InvalidBet,
                "proposals do not match yet",
            )),
            _ => Err(closed(&self.status)),
        }
    }
}
