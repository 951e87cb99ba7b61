//! One participant's handle on a live match.
//!
//! Every action reads the freshest record, applies the pure transition and
//! writes back with compare-and-set against the version it read. A lost race
//! surfaces as `OPTIMISTIC_LOCK` and is never retried for gameplay; the
//! caller re-reads and decides again. Forfeits are the exception: they retry
//! until the match is finished by someone.

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::domain::board::Side;
use crate::domain::ids::{MatchId, PlayerId, SessionId};
use crate::domain::match_transition::{
    derive_match_transitions, MatchLifecycleView, MatchTransition,
};
use crate::domain::session::MatchSession;
use crate::domain::state::{ForfeitReason, MatchAction, Outcome, StepEvent};
use crate::domain::tiles::Tile;
use crate::error::AppError;
use crate::errors::domain::{DomainError, NotFoundKind, ValidationKind};
use crate::errors::ErrorCode;
use crate::protocol::match_view::MatchSessionView;
use crate::repos::matches;
use crate::services::settlement::{SettlementEngine, SettlementResult};
use crate::store::{typed, SharedStore, StorePath, Stored};
use crate::utils::clock::now_ms;

/// Forfeit writes retry at most this many times on version conflicts.
const FORFEIT_ATTEMPTS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForfeitResult {
    /// This call wrote the terminal state.
    Applied(Outcome),
    /// The match had already finished; its outcome is unchanged.
    AlreadyFinished(Outcome),
    /// No match record: it was settled and cleaned up.
    Gone,
}

/// Ends a match from outside the turn order.
#[async_trait]
pub trait Forfeiter: Send + Sync {
    async fn forfeit(
        &self,
        loser: &PlayerId,
        reason: ForfeitReason,
    ) -> Result<ForfeitResult, AppError>;
}

/// Idempotent forfeits against `matches/{session_id}`.
pub struct MatchForfeiter {
    store: Arc<dyn SharedStore>,
    session_id: SessionId,
}

impl MatchForfeiter {
    pub fn new(store: Arc<dyn SharedStore>, session_id: SessionId) -> Self {
        Self { store, session_id }
    }
}

#[async_trait]
impl Forfeiter for MatchForfeiter {
    async fn forfeit(
        &self,
        loser: &PlayerId,
        reason: ForfeitReason,
    ) -> Result<ForfeitResult, AppError> {
        let mut last_err = None;
        for attempt in 1..=FORFEIT_ATTEMPTS {
            let Some(stored) = matches::find(self.store.as_ref(), &self.session_id).await? else {
                return Ok(ForfeitResult::Gone);
            };
            if let Some(outcome) = stored.value.state.outcome() {
                return Ok(ForfeitResult::AlreadyFinished(outcome));
            }

            let session = stored.value;
            let seat = session.seat_of(loser)?;
            let next = session.state.clone().forfeit(seat, reason)?;
            let session = session.with_state(next, now_ms());

            match matches::update(self.store.as_ref(), &session, stored.version).await {
                Ok(version) => {
                    let outcome = session.state.outcome().ok_or_else(|| {
                        AppError::internal("forfeit produced an unfinished state")
                    })?;
                    info!(
                        session_id = %self.session_id,
                        match_id = %session.match_id,
                        loser = %loser,
                        ?reason,
                        version,
                        "match forfeited"
                    );
                    return Ok(ForfeitResult::Applied(outcome));
                }
                Err(e) if e.is_optimistic_lock() => {
                    warn!(
                        session_id = %self.session_id,
                        attempt,
                        "forfeit lost a write race; retrying"
                    );
                    last_err = Some(e);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(last_err
            .map(AppError::from)
            .unwrap_or_else(|| AppError::internal("forfeit did not settle")))
    }
}

#[derive(Debug)]
pub struct MatchMutationResult {
    pub session: MatchSession,
    pub old_version: u64,
    pub new_version: u64,
    pub event: StepEvent,
    pub transitions: Vec<MatchTransition>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayResult {
    Applied(MatchSessionView),
    /// The tile fits both ends; call [`MatchClient::choose_side`].
    SideChoiceRequired { tile: Tile },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitResult {
    Settled(SettlementResult),
    /// The peer already settled and removed the records.
    AlreadyClosed(Option<SettlementResult>),
}

pub struct MatchClient {
    uid: PlayerId,
    session_id: SessionId,
    store: Arc<dyn SharedStore>,
    settlement: Arc<SettlementEngine>,
    forfeiter: MatchForfeiter,
    /// Hand index of a play awaiting a side choice.
    pending_side: Mutex<Option<usize>>,
    last_match: Mutex<Option<MatchId>>,
}

impl MatchClient {
    pub fn new(
        uid: PlayerId,
        session_id: SessionId,
        store: Arc<dyn SharedStore>,
        settlement: Arc<SettlementEngine>,
    ) -> Self {
        let forfeiter = MatchForfeiter::new(store.clone(), session_id.clone());
        Self {
            uid,
            session_id,
            store,
            settlement,
            forfeiter,
            pending_side: Mutex::new(None),
            last_match: Mutex::new(None),
        }
    }

    pub fn uid(&self) -> &PlayerId {
        &self.uid
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    async fn load(&self) -> Result<Stored<MatchSession>, AppError> {
        let stored = matches::require(self.store.as_ref(), &self.session_id).await?;
        *self.last_match.lock() = Some(stored.value.match_id);
        Ok(stored)
    }

    pub async fn view(&self) -> Result<MatchSessionView, AppError> {
        let stored = self.load().await?;
        Ok(MatchSessionView::for_player(
            &stored.value,
            &self.uid,
            stored.version,
        )?)
    }

    /// Read, transition, compare-and-set. Rejections never reach the store.
    pub async fn run_action(&self, action: MatchAction) -> Result<MatchMutationResult, AppError> {
        let stored = self.load().await?;
        let old_version = stored.version;
        let before = MatchLifecycleView::of(&stored.value.state, old_version);

        let seat = stored.value.seat_of(&self.uid)?;
        let step = match stored.value.state.clone().apply(seat, action) {
            Ok(step) => step,
            Err(e) => {
                debug!(
                    session_id = %self.session_id,
                    uid = %self.uid,
                    ?action,
                    error = %e,
                    "action rejected"
                );
                return Err(e.into());
            }
        };

        let session = stored.value.with_state(step.state, now_ms());
        let new_version = matches::update(self.store.as_ref(), &session, old_version).await?;
        let after = MatchLifecycleView::of(&session.state, new_version);
        let transitions = derive_match_transitions(Some(&before), Some(&after));

        info!(
            session_id = %self.session_id,
            match_id = %session.match_id,
            uid = %self.uid,
            event = ?step.event,
            version = new_version,
            "turn played"
        );
        for transition in &transitions {
            match transition {
                MatchTransition::TurnBecame { seat } => debug!(
                    session_id = %self.session_id,
                    turn = %session.player(*seat),
                    "turn handed over"
                ),
                MatchTransition::MatchEnded { outcome } => info!(
                    session_id = %self.session_id,
                    match_id = %session.match_id,
                    winner = ?outcome.winner.map(|w| session.player(w)),
                    win_type = ?outcome.win_type,
                    "match finished"
                ),
                MatchTransition::MatchStarted | MatchTransition::MatchRemoved => {}
            }
        }

        Ok(MatchMutationResult {
            session,
            old_version,
            new_version,
            event: step.event,
            transitions,
        })
    }

    fn view_of(&self, result: &MatchMutationResult) -> Result<MatchSessionView, AppError> {
        Ok(MatchSessionView::for_player(
            &result.session,
            &self.uid,
            result.new_version,
        )?)
    }

    /// Play the tile at `index`. A tile fitting both ends is parked until
    /// [`choose_side`](Self::choose_side).
    pub async fn play(&self, index: usize) -> Result<PlayResult, AppError> {
        match self.run_action(MatchAction::Play { index, side: None }).await {
            Ok(result) => {
                *self.pending_side.lock() = None;
                Ok(PlayResult::Applied(self.view_of(&result)?))
            }
            Err(e) if e.code() == ErrorCode::SideRequired => {
                let view = self.view().await?;
                let tile = view.hand.get(index).copied().ok_or_else(|| {
                    DomainError::validation(
                        ValidationKind::TileNotInHand,
                        format!("no tile at index {index}"),
                    )
                })?;
                *self.pending_side.lock() = Some(index);
                Ok(PlayResult::SideChoiceRequired { tile })
            }
            Err(e) => Err(e),
        }
    }

    /// Complete a parked play on `side`.
    pub async fn choose_side(&self, side: Side) -> Result<MatchSessionView, AppError> {
        let index = self.pending_side.lock().take().ok_or_else(|| {
            DomainError::validation_other("no play is waiting for a side")
        })?;
        let result = self
            .run_action(MatchAction::Play {
                index,
                side: Some(side),
            })
            .await?;
        self.view_of(&result)
    }

    pub async fn draw(&self) -> Result<MatchSessionView, AppError> {
        let result = self.run_action(MatchAction::Draw).await?;
        self.view_of(&result)
    }

    pub async fn pass(&self) -> Result<MatchSessionView, AppError> {
        let result = self.run_action(MatchAction::Pass).await?;
        self.view_of(&result)
    }

    /// Concede. Allowed at any time, on or off turn.
    pub async fn abandon(&self) -> Result<ForfeitResult, AppError> {
        let result = self
            .forfeiter
            .forfeit(&self.uid, ForfeitReason::Abandon)
            .await?;
        match result {
            ForfeitResult::Applied(_) => Ok(result),
            ForfeitResult::AlreadyFinished(_) => Err(DomainError::validation(
                ValidationKind::PhaseMismatch,
                "match is already finished",
            )
            .into()),
            ForfeitResult::Gone => Err(DomainError::not_found(
                NotFoundKind::Match,
                format!("no match for {}", self.session_id),
            )
            .into()),
        }
    }

    /// Leave a finished match: settle (once across both peers) and remove the
    /// session records.
    pub async fn exit(&self) -> Result<ExitResult, AppError> {
        let Some(stored) = matches::find(self.store.as_ref(), &self.session_id).await? else {
            let last = *self.last_match.lock();
            let receipt = match last {
                Some(match_id) => self.settlement.receipt(&match_id).await?,
                None => None,
            };
            return Ok(ExitResult::AlreadyClosed(
                receipt.map(SettlementResult::AlreadySettled),
            ));
        };
        let session = stored.value;
        session.seat_of(&self.uid)?;
        if !session.state.is_finished() {
            return Err(DomainError::validation(
                ValidationKind::PhaseMismatch,
                "match is still in progress",
            )
            .into());
        }

        let settled = self.settlement.settle(&session, &self.uid).await?;
        self.settlement.cleanup(&session).await?;
        *self.pending_side.lock() = None;
        Ok(ExitResult::Settled(settled))
    }

    /// Viewer-relative snapshots; `None` once the record is removed.
    pub async fn watch(&self) -> Result<BoxStream<'static, Option<MatchSessionView>>, AppError> {
        let path = StorePath::match_record(&self.session_id);
        let stream = self.store.subscribe(&path).await?;
        let uid = self.uid.clone();
        Ok(stream
            .filter_map(move |snap| {
                let view = match snap {
                    None => Some(None),
                    Some(snap) => typed::decode::<MatchSession>(&path, snap)
                        .and_then(|s| MatchSessionView::for_player(&s.value, &uid, s.version))
                        .map(Some)
                        .map_err(|e| warn!(error = %e, "dropping unreadable match snapshot"))
                        .ok(),
                };
                futures::future::ready(view)
            })
            .boxed())
    }

    /// Lifecycle transitions between consecutive snapshots of the match
    /// record. The first snapshot seen counts as the match starting; deletion
    /// by cleanup yields `MatchRemoved`.
    pub async fn transitions(&self) -> Result<BoxStream<'static, MatchTransition>, AppError> {
        let path = StorePath::match_record(&self.session_id);
        let stream = self.store.subscribe(&path).await?;
        Ok(stream
            .scan(None::<MatchLifecycleView>, move |last, snap| {
                let current = match snap {
                    None => None,
                    Some(snap) => match typed::decode::<MatchSession>(&path, snap) {
                        Ok(s) => Some(MatchLifecycleView::of(&s.value.state, s.version)),
                        Err(e) => {
                            warn!(error = %e, "skipping unreadable match snapshot");
                            return futures::future::ready(Some(Vec::new()));
                        }
                    },
                };
                let transitions = derive_match_transitions(last.as_ref(), current.as_ref());
                *last = current;
                futures::future::ready(Some(transitions))
            })
            .flat_map(futures::stream::iter)
            .boxed())
    }
}

#[async_trait]
impl Forfeiter for MatchClient {
    async fn forfeit(
        &self,
        loser: &PlayerId,
        reason: ForfeitReason,
    ) -> Result<ForfeitResult, AppError> {
        self.forfeiter.forfeit(loser, reason).await
    }
}
