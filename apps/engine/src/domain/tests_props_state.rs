/// Property-based tests for whole-match progression
use proptest::prelude::*;

use crate::domain::dealing::deal_with_seed;
use crate::domain::placement::hand_has_playable;
use crate::domain::state::{MatchAction, MatchState, Seat, WinType};
use crate::domain::test_state_helpers::first_legal;
use crate::domain::tiles::TILE_COUNT;
use crate::domain::{test_gens, test_prelude};

fn tile_count(state: &MatchState) -> usize {
    let board = state.board().map_or(0, |b| b.len());
    state.hand(Seat::First).len() + state.hand(Seat::Second).len() + board + state.pile_len()
}

/// Greedy policy: play the first legal tile, else draw, else pass.
fn greedy(state: &MatchState) -> Option<(Seat, MatchAction)> {
    let MatchState::Playing(p) = state else {
        return None;
    };
    let hand = &p.hands[p.turn.index()];
    let action = match first_legal(&p.board, hand) {
        Some((index, side)) => MatchAction::Play { index, side },
        None if !p.pile.is_empty() => MatchAction::Draw,
        None => MatchAction::Pass,
    };
    Some((p.turn, action))
}

proptest! {
    #![proptest_config(test_prelude::proptest_config())]

    /// Property: greedy play always terminates, conserves tiles and ends in
    /// a consistent outcome.
    #[test]
    fn prop_greedy_match_terminates(seed in test_gens::seed()) {
        let mut state = MatchState::dealt(deal_with_seed(seed)).begin(Seat::First).unwrap();
        let mut steps = 0;
        while let Some((seat, action)) = greedy(&state) {
            state = state.apply(seat, action).unwrap().state;
            prop_assert_eq!(tile_count(&state), TILE_COUNT);
            if let Some(board) = state.board() {
                prop_assert!(board.is_consistent());
            }
            steps += 1;
            prop_assert!(steps < 200, "match did not terminate");
        }

        let outcome = state.outcome().unwrap();
        match outcome.win_type {
            WinType::EmptiedHand => {
                let winner = outcome.winner.unwrap();
                prop_assert!(state.hand(winner).is_empty());
            }
            WinType::Blocked => {
                prop_assert_eq!(state.pile_len(), 0);
                let board = state.board().unwrap();
                prop_assert!(!hand_has_playable(board, state.hand(Seat::First)));
                prop_assert!(!hand_has_playable(board, state.hand(Seat::Second)));
            }
            other => prop_assert!(false, "unexpected win type {:?}", other),
        }
    }

    /// Property: nothing is accepted once the match is finished.
    #[test]
    fn prop_finished_rejects_everything(seed in test_gens::seed()) {
        let state = MatchState::dealt(deal_with_seed(seed))
            .begin(Seat::First)
            .unwrap()
            .forfeit(Seat::Second, crate::domain::ForfeitReason::Abandon)
            .unwrap();
        for seat in [Seat::First, Seat::Second] {
            for action in [MatchAction::Draw, MatchAction::Pass, MatchAction::Play { index: 0, side: None }] {
                prop_assert!(state.clone().apply(seat, action).is_err());
            }
        }
    }
}
