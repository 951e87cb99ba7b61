//! Wager negotiation over `betting/{session_id}`.
//!
//! Every mutation is a compare-and-set against the version just read. Escrow
//! writes only touch the caller's own proposal slot, so a lost race is safe to
//! re-read and re-apply.

use std::sync::Arc;

use futures::stream::{BoxStream, StreamExt};
use tracing::{debug, info, warn};

use crate::domain::betting::{BetMenu, CancelReason, EscrowRecord, EscrowStatus, ProposeOutcome};
use crate::domain::dealing::Dealer;
use crate::domain::ids::{MatchId, PlayerId, SessionId};
use crate::domain::session::MatchSession;
use crate::error::AppError;
use crate::errors::domain::{ConflictKind, DomainError, NotFoundKind, ValidationKind};
use crate::ledger::BalanceLedger;
use crate::repos::{escrow, matches};
use crate::store::{typed, Created, SharedStore, StorePath, Stored};
use crate::utils::clock::now_ms;

/// Escrow writes retry this many times on version conflicts.
const ESCROW_CAS_ATTEMPTS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartResult {
    /// This caller moved the escrow to `started` and created the match.
    Started(MatchSession),
    /// The peer got there first; this is the live match.
    Joined(MatchSession),
}

impl StartResult {
    pub fn session(&self) -> &MatchSession {
        match self {
            StartResult::Started(s) | StartResult::Joined(s) => s,
        }
    }
}

pub struct EscrowService {
    store: Arc<dyn SharedStore>,
    ledger: Arc<dyn BalanceLedger>,
    menu: BetMenu,
    dealer: Arc<dyn Dealer>,
}

impl EscrowService {
    pub fn new(
        store: Arc<dyn SharedStore>,
        ledger: Arc<dyn BalanceLedger>,
        menu: BetMenu,
        dealer: Arc<dyn Dealer>,
    ) -> Self {
        Self {
            store,
            ledger,
            menu,
            dealer,
        }
    }

    pub fn menu(&self) -> &BetMenu {
        &self.menu
    }

    pub async fn find(&self, session_id: &SessionId) -> Result<Option<EscrowRecord>, AppError> {
        Ok(escrow::find(self.store.as_ref(), session_id)
            .await?
            .map(|s| s.value))
    }

    async fn require(&self, session_id: &SessionId) -> Result<Stored<EscrowRecord>, AppError> {
        escrow::find(self.store.as_ref(), session_id)
            .await?
            .ok_or_else(|| {
                DomainError::not_found(NotFoundKind::Escrow, format!("no escrow for {session_id}"))
                    .into()
            })
    }

    /// Start (or rejoin) a negotiation between `inviter` and `invitee`.
    pub async fn open(
        &self,
        inviter: &PlayerId,
        invitee: &PlayerId,
    ) -> Result<EscrowRecord, AppError> {
        let session_id = SessionId::for_pair(inviter, invitee)?;

        for attempt in 1..=ESCROW_CAS_ATTEMPTS {
            let fresh = EscrowRecord::open(inviter.clone(), invitee.clone(), now_ms())?;
            let current = match escrow::create(self.store.as_ref(), fresh).await? {
                Created::Created(stored) => {
                    info!(session_id = %session_id, inviter = %inviter, invitee = %invitee, "escrow opened");
                    return Ok(stored.value);
                }
                Created::Existing(stored) => stored,
            };

            let Some(replacement) = current.value.reopen(inviter, invitee, now_ms())? else {
                debug!(session_id = %session_id, "escrow already open");
                return Ok(current.value);
            };
            match escrow::update(self.store.as_ref(), &replacement, current.version).await {
                Ok(_) => {
                    info!(session_id = %session_id, inviter = %inviter, invitee = %invitee, "escrow reopened");
                    return Ok(replacement);
                }
                Err(e) if e.is_optimistic_lock() => {
                    warn!(session_id = %session_id, attempt, "escrow reopen lost a write race");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(lock_exhausted(&session_id))
    }

    /// Write `uid`'s proposal. The balance check happens before any write.
    pub async fn propose(
        &self,
        session_id: &SessionId,
        uid: &PlayerId,
        amount: u64,
    ) -> Result<ProposeOutcome, AppError> {
        let balance = self.ledger.read_balance(uid).await?;

        for attempt in 1..=ESCROW_CAS_ATTEMPTS {
            let stored = self.require(session_id).await?;
            let (record, outcome) =
                match stored
                    .value
                    .propose(uid, amount, balance, &self.menu, now_ms())
                {
                    Ok(next) => next,
                    Err(e) => {
                        debug!(session_id = %session_id, uid = %uid, amount, error = %e, "proposal rejected");
                        return Err(e.into());
                    }
                };

            match escrow::update(self.store.as_ref(), &record, stored.version).await {
                Ok(version) => {
                    info!(
                        session_id = %session_id,
                        uid = %uid,
                        amount,
                        ?outcome,
                        version,
                        "bet proposed"
                    );
                    return Ok(outcome);
                }
                Err(e) if e.is_optimistic_lock() => {
                    warn!(session_id = %session_id, uid = %uid, attempt, "proposal lost a write race");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(lock_exhausted(session_id))
    }

    /// Move a matched escrow to `started` and initialize the match.
    ///
    /// Both peers may call this; one wins the escrow write and both end up
    /// with the same match. Balances are re-checked first and a shortfall
    /// cancels the negotiation.
    pub async fn start(
        &self,
        session_id: &SessionId,
        uid: &PlayerId,
    ) -> Result<StartResult, AppError> {
        for attempt in 1..=ESCROW_CAS_ATTEMPTS {
            let stored = self.require(session_id).await?;
            let record = stored.value.clone();
            record.peer_of(uid)?;

            match record.status.clone() {
                EscrowStatus::Negotiating => {
                    return Err(DomainError::validation(
                        ValidationKind::InvalidBet,
                        "proposals do not match yet",
                    )
                    .into())
                }
                EscrowStatus::Cancelled(reason) => {
                    return Err(DomainError::validation(
                        ValidationKind::EscrowClosed,
                        format!("negotiation was cancelled: {reason:?}"),
                    )
                    .into())
                }
                EscrowStatus::Started { amount, match_id } => {
                    let session = self.ensure_match(&record, amount, match_id).await?;
                    return Ok(StartResult::Joined(session));
                }
                EscrowStatus::Matched { amount } => {
                    if let Some(short) = self.first_short(&record, amount).await? {
                        return Err(self.cancel_for_funds(stored, short, amount).await);
                    }

                    let match_id = MatchId::new();
                    let started = record.clone().start(match_id)?;
                    match escrow::update(self.store.as_ref(), &started, stored.version).await {
                        Ok(version) => {
                            info!(session_id = %session_id, %match_id, amount, version, "escrow started");
                            let session = self.ensure_match(&record, amount, match_id).await?;
                            return Ok(StartResult::Started(session));
                        }
                        Err(e) if e.is_optimistic_lock() => {
                            warn!(session_id = %session_id, attempt, "escrow start lost a write race");
                        }
                        Err(e) => return Err(e.into()),
                    }
                }
            }
        }
        Err(lock_exhausted(session_id))
    }

    async fn first_short(
        &self,
        record: &EscrowRecord,
        amount: u64,
    ) -> Result<Option<PlayerId>, AppError> {
        for uid in [&record.inviter, &record.invitee] {
            if self.ledger.read_balance(uid).await? < amount {
                return Ok(Some(uid.clone()));
            }
        }
        Ok(None)
    }

    /// Cancel with `InsufficientFunds` and hand back the error to report.
    async fn cancel_for_funds(
        &self,
        stored: Stored<EscrowRecord>,
        short: PlayerId,
        amount: u64,
    ) -> AppError {
        let session_id = stored.value.session_id.clone();
        let reason = CancelReason::InsufficientFunds { uid: short.clone() };
        let cancelled = stored.value.cancel(reason);
        let written = match cancelled {
            Ok(record) => escrow::update(self.store.as_ref(), &record, stored.version)
                .await
                .map(|_| ()),
            Err(e) => Err(e),
        };
        match written {
            Ok(()) => info!(session_id = %session_id, uid = %short, amount, "escrow cancelled for insufficient funds"),
            Err(e) => warn!(session_id = %session_id, error = %e, "insufficient-funds cancel not written"),
        }
        DomainError::validation(
            ValidationKind::InsufficientFunds,
            format!("{short} cannot cover a bet of {amount}"),
        )
        .into()
    }

    /// First-write-wins match creation for a started escrow.
    async fn ensure_match(
        &self,
        record: &EscrowRecord,
        amount: u64,
        match_id: MatchId,
    ) -> Result<MatchSession, AppError> {
        let session = MatchSession::start(
            match_id,
            record.inviter.clone(),
            record.invitee.clone(),
            amount,
            self.dealer.deal(),
            now_ms(),
        )?;
        match matches::create(self.store.as_ref(), session).await? {
            Created::Created(stored) => {
                info!(
                    session_id = %record.session_id,
                    %match_id,
                    bet = amount,
                    version = stored.version,
                    "match created"
                );
                Ok(stored.value)
            }
            Created::Existing(stored) if stored.value.match_id == match_id => {
                debug!(session_id = %record.session_id, %match_id, "match already initialized");
                Ok(stored.value)
            }
            Created::Existing(stored) => Err(DomainError::conflict(
                ConflictKind::SessionConflict,
                format!(
                    "{} holds match {}, expected {match_id}",
                    record.session_id, stored.value.match_id
                ),
            )
            .into()),
        }
    }

    /// Withdraw from the negotiation. Cancelling twice is harmless.
    pub async fn cancel(
        &self,
        session_id: &SessionId,
        uid: &PlayerId,
    ) -> Result<EscrowRecord, AppError> {
        for attempt in 1..=ESCROW_CAS_ATTEMPTS {
            let stored = self.require(session_id).await?;
            stored.value.peer_of(uid)?;
            if matches!(stored.value.status, EscrowStatus::Cancelled(_)) {
                return Ok(stored.value);
            }
            let record = stored
                .value
                .cancel(CancelReason::Withdrawn { by: uid.clone() })?;
            match escrow::update(self.store.as_ref(), &record, stored.version).await {
                Ok(_) => {
                    info!(session_id = %session_id, uid = %uid, "escrow cancelled");
                    return Ok(record);
                }
                Err(e) if e.is_optimistic_lock() => {
                    warn!(session_id = %session_id, attempt, "escrow cancel lost a write race");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(lock_exhausted(session_id))
    }

    /// Escrow snapshots as they change; `None` once the record is removed.
    pub async fn watch(
        &self,
        session_id: &SessionId,
    ) -> Result<BoxStream<'static, Option<EscrowRecord>>, AppError> {
        let path = StorePath::betting(session_id);
        let stream = self.store.subscribe(&path).await?;
        Ok(stream
            .filter_map(move |snap| {
                let record = match snap {
                    None => Some(None),
                    Some(snap) => typed::decode::<EscrowRecord>(&path, snap)
                        .map(|s| Some(s.value))
                        .map_err(|e| warn!(error = %e, "dropping unreadable escrow snapshot"))
                        .ok(),
                };
                futures::future::ready(record)
            })
            .boxed())
    }
}

fn lock_exhausted(session_id: &SessionId) -> AppError {
    DomainError::conflict(
        ConflictKind::OptimisticLock,
        format!("escrow for {session_id} kept changing under us"),
    )
    .into()
}
