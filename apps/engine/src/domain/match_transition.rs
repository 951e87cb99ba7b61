use crate::domain::state::{MatchState, Outcome, Seat};

/// Lifecycle facts observed between two snapshots of a match record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchLifecycleView {
    pub version: u64,
    pub turn: Option<Seat>,
    pub outcome: Option<Outcome>,
}

impl MatchLifecycleView {
    pub fn of(state: &MatchState, version: u64) -> Self {
        Self {
            version,
            turn: state.turn(),
            outcome: state.outcome(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTransition {
    /// Edge-triggered: the record appeared.
    MatchStarted,

    /// Edge-triggered: the turn became a specific seat.
    TurnBecame { seat: Seat },

    /// Edge-triggered: Playing -> Finished.
    MatchEnded { outcome: Outcome },

    /// Edge-triggered: the record was deleted by cleanup.
    MatchRemoved,
}

/// Derive transitions from before/after lifecycle state. `None` means the
/// record was absent.
pub fn derive_match_transitions(
    before: Option<&MatchLifecycleView>,
    after: Option<&MatchLifecycleView>,
) -> Vec<MatchTransition> {
    let mut transitions = Vec::new();

    match (before, after) {
        (None, None) => {}
        (Some(_), None) => transitions.push(MatchTransition::MatchRemoved),
        (before, Some(after)) => {
            if before.is_none() {
                transitions.push(MatchTransition::MatchStarted);
            }
            if let Some(seat) = after.turn {
                if before.and_then(|b| b.turn) != Some(seat) {
                    transitions.push(MatchTransition::TurnBecame { seat });
                }
            }
            if let Some(outcome) = after.outcome {
                if before.and_then(|b| b.outcome).is_none() {
                    transitions.push(MatchTransition::MatchEnded { outcome });
                }
            }
        }
    }

    transitions
}
