//! Domain layer: pure match logic types and helpers.

pub mod betting;
pub mod board;
pub mod dealing;
pub mod ids;
pub mod match_transition;
pub mod placement;
pub mod session;
pub mod settlement;
pub mod state;
pub mod tiles;

#[cfg(test)]
mod test_prelude;
#[cfg(test)]
mod tests_match_state;
#[cfg(test)]
mod tests_props_placement;
#[cfg(test)]
mod tests_props_state;

// Re-exports for ergonomics
pub use betting::{BetMenu, CancelReason, EscrowRecord, EscrowStatus, ProposeOutcome};
pub use board::{Board, Side};
pub use dealing::{deal_with_seed, Deal, Dealer, RandomDealer, SeededDealer};
pub use ids::{MatchId, PlayerId, SessionId};
pub use placement::{validate, Placement};
pub use session::MatchSession;
pub use state::{ForfeitReason, MatchAction, MatchState, Outcome, Seat, WinType};
pub use tiles::{OrientedTile, Tile};
