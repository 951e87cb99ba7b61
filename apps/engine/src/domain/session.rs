//! The match aggregate as stored under `matches/{session_id}`.

use serde::{Deserialize, Serialize};

use crate::domain::dealing::Deal;
use crate::domain::ids::{MatchId, PlayerId, SessionId};
use crate::domain::state::{MatchState, Seat};
use crate::errors::domain::{DomainError, ValidationKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSession {
    pub match_id: MatchId,
    pub session_id: SessionId,
    /// `[inviter, invitee]`, indexed by [`Seat::index`].
    pub players: [PlayerId; 2],
    pub bet: u64,
    pub created_at: i64,
    pub updated_at: i64,
    pub state: MatchState,
}

impl MatchSession {
    /// Deal, hand the opening turn to the inviter and start play.
    pub fn start(
        match_id: MatchId,
        inviter: PlayerId,
        invitee: PlayerId,
        bet: u64,
        deal: Deal,
        now_ms: i64,
    ) -> Result<Self, DomainError> {
        let session_id = SessionId::for_pair(&inviter, &invitee)?;
        let state = MatchState::dealt(deal).begin(Seat::First)?;
        Ok(Self {
            match_id,
            session_id,
            players: [inviter, invitee],
            bet,
            created_at: now_ms,
            updated_at: now_ms,
            state,
        })
    }

    pub fn seat_of(&self, uid: &PlayerId) -> Result<Seat, DomainError> {
        if &self.players[0] == uid {
            Ok(Seat::First)
        } else if &self.players[1] == uid {
            Ok(Seat::Second)
        } else {
            Err(DomainError::validation(
                ValidationKind::NotAParticipant,
                format!("{uid} is not part of session {}", self.session_id),
            ))
        }
    }

    pub fn player(&self, seat: Seat) -> &PlayerId {
        &self.players[seat.index()]
    }

    /// Replace the state, stamping the write time.
    pub fn with_state(mut self, state: MatchState, now_ms: i64) -> Self {
        self.state = state;
        self.updated_at = now_ms;
        self
    }
}
