//! Match state machine: `Dealing -> Playing -> Finished`.
//!
//! Every transition consumes the state it starts from and validates the
//! action before mutating anything, so a rejected action leaves the caller's
//! copy of shared state untouched (the caller simply re-reads).

use serde::{Deserialize, Serialize};

use crate::domain::board::{Board, Side};
use crate::domain::dealing::Deal;
use crate::domain::placement::{hand_has_playable, is_playable, validate, Placement};
use crate::domain::tiles::{hand_pip_sum, OrientedTile, Tile};
use crate::errors::domain::{DomainError, ValidationKind};

/// Consecutive passes that block the game.
pub const BLOCKING_PASSES: u8 = 2;

/// Position at the table. The inviter is always `First` and opens.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Seat {
    First,
    Second,
}

impl Seat {
    #[inline]
    pub fn opponent(self) -> Seat {
        match self {
            Seat::First => Seat::Second,
            Seat::Second => Seat::First,
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        match self {
            Seat::First => 0,
            Seat::Second => 1,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WinType {
    EmptiedHand,
    Blocked,
    DisconnectTimeout,
    Abandon,
}

/// Reasons a match can be ended from outside the turn order.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ForfeitReason {
    DisconnectTimeout,
    Abandon,
}

impl From<ForfeitReason> for WinType {
    fn from(r: ForfeitReason) -> Self {
        match r {
            ForfeitReason::DisconnectTimeout => WinType::DisconnectTimeout,
            ForfeitReason::Abandon => WinType::Abandon,
        }
    }
}

/// Terminal result. `winner` is `None` only for a blocked game with equal
/// pip sums.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub winner: Option<Seat>,
    pub win_type: WinType,
}

impl Outcome {
    pub fn is_draw(&self) -> bool {
        self.winner.is_none()
    }
}

/// Tiles dealt, nobody has the turn yet.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct DealingState {
    pub deal: Deal,
}

impl DealingState {
    pub fn new(deal: Deal) -> Self {
        Self { deal }
    }

    /// Hand the opening turn to `first` and start play.
    pub fn begin(self, first: Seat) -> PlayingState {
        let Deal { hands, pile } = self.deal;
        PlayingState {
            hands,
            board: Board::new(),
            pile,
            turn: first,
            consecutive_passes: 0,
            moves: 0,
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct PlayingState {
    pub hands: [Vec<Tile>; 2],
    pub board: Board,
    pub pile: Vec<Tile>,
    pub turn: Seat,
    pub consecutive_passes: u8,
    /// Plays, draws and passes applied so far.
    pub moves: u32,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct FinishedState {
    pub hands: [Vec<Tile>; 2],
    pub board: Board,
    pub pile: Vec<Tile>,
    pub outcome: Outcome,
    pub moves: u32,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MatchState {
    Dealing(DealingState),
    Playing(PlayingState),
    Finished(FinishedState),
}

/// A turn-holder action.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum MatchAction {
    Play { index: usize, side: Option<Side> },
    Draw,
    Pass,
}

/// What an applied action did, for logging and notifications.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum StepEvent {
    Placed { side: Side, tile: OrientedTile },
    Drew { tile: Tile, keeps_turn: bool },
    Passed { consecutive: u8 },
}

#[derive(Debug, Clone)]
pub struct Step {
    pub state: MatchState,
    pub event: StepEvent,
}

impl PlayingState {
    fn hand(&self, seat: Seat) -> &Vec<Tile> {
        &self.hands[seat.index()]
    }

    fn finish(self, outcome: Outcome) -> FinishedState {
        FinishedState {
            hands: self.hands,
            board: self.board,
            pile: self.pile,
            outcome,
            moves: self.moves,
        }
    }

    fn blocked_outcome(&self) -> Outcome {
        let first = hand_pip_sum(self.hand(Seat::First));
        let second = hand_pip_sum(self.hand(Seat::Second));
        let winner = match first.cmp(&second) {
            std::cmp::Ordering::Less => Some(Seat::First),
            std::cmp::Ordering::Greater => Some(Seat::Second),
            std::cmp::Ordering::Equal => None,
        };
        Outcome {
            winner,
            win_type: WinType::Blocked,
        }
    }

    fn play(mut self, seat: Seat, index: usize, side: Option<Side>) -> Result<Step, DomainError> {
        let tile = *self.hand(seat).get(index).ok_or_else(|| {
            DomainError::validation(
                ValidationKind::TileNotInHand,
                format!("no tile at index {index}"),
            )
        })?;

        let (side, oriented) = match validate(&self.board, tile, side) {
            Placement::Legal { side, oriented } => (side, oriented),
            Placement::Ambiguous => {
                return Err(DomainError::validation(
                    ValidationKind::SideRequired,
                    format!("{tile} fits both ends; choose a side"),
                ))
            }
            Placement::Illegal => {
                return Err(DomainError::validation(
                    ValidationKind::IllegalMove,
                    format!("{tile} does not fit the open ends"),
                ))
            }
        };

        self.hands[seat.index()].remove(index);
        self.board.attach(side, oriented);
        self.consecutive_passes = 0;
        self.moves += 1;

        let event = StepEvent::Placed {
            side,
            tile: oriented,
        };
        let state = if self.hand(seat).is_empty() {
            MatchState::Finished(self.finish(Outcome {
                winner: Some(seat),
                win_type: WinType::EmptiedHand,
            }))
        } else {
            self.turn = seat.opponent();
            MatchState::Playing(self)
        };
        Ok(Step { state, event })
    }

    fn draw(mut self, seat: Seat) -> Result<Step, DomainError> {
        if hand_has_playable(&self.board, self.hand(seat)) {
            return Err(DomainError::validation(
                ValidationKind::MustPlay,
                "a tile in hand can be played",
            ));
        }
        let tile = self.pile.pop().ok_or_else(|| {
            DomainError::validation(ValidationKind::DrawPileEmpty, "the draw pile is empty")
        })?;

        self.hands[seat.index()].push(tile);
        self.moves += 1;
        let keeps_turn = is_playable(&self.board, tile);
        if !keeps_turn {
            self.turn = seat.opponent();
            self.consecutive_passes = 0;
        }
        Ok(Step {
            state: MatchState::Playing(self),
            event: StepEvent::Drew { tile, keeps_turn },
        })
    }

    fn pass(mut self, seat: Seat) -> Result<Step, DomainError> {
        if !self.pile.is_empty() {
            return Err(DomainError::validation(
                ValidationKind::MustDraw,
                format!("{} tiles left to draw", self.pile.len()),
            ));
        }
        if hand_has_playable(&self.board, self.hand(seat)) {
            return Err(DomainError::validation(
                ValidationKind::MustPlay,
                "a tile in hand can be played",
            ));
        }

        self.consecutive_passes += 1;
        self.moves += 1;
        let consecutive = self.consecutive_passes;
        let state = if consecutive >= BLOCKING_PASSES {
            let outcome = self.blocked_outcome();
            MatchState::Finished(self.finish(outcome))
        } else {
            self.turn = seat.opponent();
            MatchState::Playing(self)
        };
        Ok(Step {
            state,
            event: StepEvent::Passed { consecutive },
        })
    }
}

fn phase_mismatch(detail: &str) -> DomainError {
    DomainError::validation(ValidationKind::PhaseMismatch, detail.to_string())
}

impl MatchState {
    pub fn dealt(deal: Deal) -> Self {
        MatchState::Dealing(DealingState::new(deal))
    }

    /// `Dealing -> Playing` with `first` holding the opening turn.
    pub fn begin(self, first: Seat) -> Result<MatchState, DomainError> {
        match self {
            MatchState::Dealing(d) => Ok(MatchState::Playing(d.begin(first))),
            _ => Err(phase_mismatch("match already started")),
        }
    }

    /// Apply a turn-holder action.
    pub fn apply(self, seat: Seat, action: MatchAction) -> Result<Step, DomainError> {
        let playing = match self {
            MatchState::Playing(p) => p,
            MatchState::Dealing(_) => return Err(phase_mismatch("match has not started")),
            MatchState::Finished(_) => return Err(phase_mismatch("match is finished")),
        };
        if playing.turn != seat {
            return Err(DomainError::validation(
                ValidationKind::OutOfTurn,
                format!("{:?} holds the turn", playing.turn),
            ));
        }
        match action {
            MatchAction::Play { index, side } => playing.play(seat, index, side),
            MatchAction::Draw => playing.draw(seat),
            MatchAction::Pass => playing.pass(seat),
        }
    }

    /// End the match against `loser` regardless of whose turn it is.
    pub fn forfeit(self, loser: Seat, reason: ForfeitReason) -> Result<MatchState, DomainError> {
        let outcome = Outcome {
            winner: Some(loser.opponent()),
            win_type: reason.into(),
        };
        match self {
            MatchState::Playing(p) => Ok(MatchState::Finished(p.finish(outcome))),
            MatchState::Dealing(d) => {
                let Deal { hands, pile } = d.deal;
                Ok(MatchState::Finished(FinishedState {
                    hands,
                    board: Board::new(),
                    pile,
                    outcome,
                    moves: 0,
                }))
            }
            MatchState::Finished(_) => Err(phase_mismatch("match is finished")),
        }
    }

    pub fn status(&self) -> &'static str {
        match self {
            MatchState::Dealing(_) => "dealing",
            MatchState::Playing(_) => "playing",
            MatchState::Finished(_) => "finished",
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, MatchState::Finished(_))
    }

    pub fn turn(&self) -> Option<Seat> {
        match self {
            MatchState::Playing(p) => Some(p.turn),
            _ => None,
        }
    }

    pub fn outcome(&self) -> Option<Outcome> {
        match self {
            MatchState::Finished(f) => Some(f.outcome),
            _ => None,
        }
    }

    pub fn hand(&self, seat: Seat) -> &[Tile] {
        match self {
            MatchState::Dealing(d) => &d.deal.hands[seat.index()],
            MatchState::Playing(p) => &p.hands[seat.index()],
            MatchState::Finished(f) => &f.hands[seat.index()],
        }
    }

    pub fn board(&self) -> Option<&Board> {
        match self {
            MatchState::Dealing(_) => None,
            MatchState::Playing(p) => Some(&p.board),
            MatchState::Finished(f) => Some(&f.board),
        }
    }

    pub fn pile_len(&self) -> usize {
        match self {
            MatchState::Dealing(d) => d.deal.pile.len(),
            MatchState::Playing(p) => p.pile.len(),
            MatchState::Finished(f) => f.pile.len(),
        }
    }

    pub fn consecutive_passes(&self) -> u8 {
        match self {
            MatchState::Playing(p) => p.consecutive_passes,
            _ => 0,
        }
    }

    pub fn moves(&self) -> u32 {
        match self {
            MatchState::Dealing(_) => 0,
            MatchState::Playing(p) => p.moves,
            MatchState::Finished(f) => f.moves,
        }
    }
}
