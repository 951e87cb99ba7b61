//! What one participant may see of a match.
//!
//! The viewer's own hand is visible; the opponent's is reduced to a count
//! until the match is finished.

use serde::{Deserialize, Serialize};

use crate::domain::ids::{MatchId, PlayerId, SessionId};
use crate::domain::placement::playable_indices;
use crate::domain::session::MatchSession;
use crate::domain::state::{MatchState, Seat, WinType};
use crate::domain::tiles::{OrientedTile, Tile};
use crate::errors::domain::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResultView {
    /// `None` for a drawn (blocked, equal pips) match.
    pub winner: Option<PlayerId>,
    pub win_type: WinType,
    /// `None` on a draw.
    pub you_won: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSessionView {
    pub session_id: SessionId,
    pub match_id: MatchId,
    pub status: String,
    pub bet: u64,
    pub seat: Seat,
    pub opponent: PlayerId,
    pub turn: Option<PlayerId>,
    pub your_turn: bool,
    pub board: Vec<OrientedTile>,
    pub ends: Option<(u8, u8)>,
    pub hand: Vec<Tile>,
    /// Indices into `hand` that fit the board right now (empty off-turn).
    pub playable: Vec<usize>,
    pub opponent_tile_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opponent_hand: Option<Vec<Tile>>,
    pub pile_count: usize,
    pub consecutive_passes: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<MatchResultView>,
    pub version: u64,
}

impl MatchSessionView {
    pub fn for_player(
        session: &MatchSession,
        viewer: &PlayerId,
        version: u64,
    ) -> Result<Self, DomainError> {
        let seat = session.seat_of(viewer)?;
        let opp = seat.opponent();
        let state = &session.state;

        let turn = state.turn();
        let your_turn = turn == Some(seat);
        let hand = state.hand(seat).to_vec();
        let board = state.board().map(|b| b.tiles().to_vec()).unwrap_or_default();
        let ends = state.board().and_then(|b| b.ends());
        let playable = match (your_turn, state) {
            (true, MatchState::Playing(p)) => playable_indices(&p.board, &hand),
            _ => Vec::new(),
        };

        let result = state.outcome().map(|o| MatchResultView {
            winner: o.winner.map(|w| session.player(w).clone()),
            win_type: o.win_type,
            you_won: o.winner.map(|w| w == seat),
        });
        let opponent_hand = state
            .is_finished()
            .then(|| state.hand(opp).to_vec());

        Ok(Self {
            session_id: session.session_id.clone(),
            match_id: session.match_id,
            status: state.status().to_string(),
            bet: session.bet,
            seat,
            opponent: session.player(opp).clone(),
            turn: turn.map(|s| session.player(s).clone()),
            your_turn,
            board,
            ends,
            hand,
            playable,
            opponent_tile_count: state.hand(opp).len(),
            opponent_hand,
            pile_count: state.pile_len(),
            consecutive_passes: state.consecutive_passes(),
            result,
            version,
        })
    }
}
