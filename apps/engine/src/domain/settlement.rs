//! Balance movement for a finished match.

use crate::domain::state::{Outcome, Seat};

/// Signed balance change per seat: winner `+bet`, loser `-bet`, a draw moves
/// nothing.
pub fn balance_deltas(outcome: &Outcome, bet: u64) -> [i64; 2] {
    let bet = i64::try_from(bet).unwrap_or(i64::MAX);
    match outcome.winner {
        Some(Seat::First) => [bet, -bet],
        Some(Seat::Second) => [-bet, bet],
        None => [0, 0],
    }
}

/// Apply a delta, clamping at zero. Returns the new balance and whether the
/// clamp kicked in.
pub fn apply_delta(balance: u64, delta: i64) -> (u64, bool) {
    if delta >= 0 {
        (balance.saturating_add(delta.unsigned_abs()), false)
    } else {
        let debit = delta.unsigned_abs();
        (balance.saturating_sub(debit), debit > balance)
    }
}
