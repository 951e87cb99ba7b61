use crate::domain::board::{Board, Side};
use crate::domain::state::{
    ForfeitReason, MatchAction, MatchState, Outcome, Seat, StepEvent, WinType,
};
use crate::domain::test_state_helpers::{board_of, playing, t, tiles};
use crate::domain::tiles::OrientedTile;
use crate::errors::domain::{DomainError, ValidationKind};

fn kind(err: DomainError) -> ValidationKind {
    match err {
        DomainError::Validation(k, _) => k,
        other => panic!("expected validation error, got {other:?}"),
    }
}

fn play(index: usize) -> MatchAction {
    MatchAction::Play { index, side: None }
}

#[test]
fn play_flips_turn_and_resets_passes() {
    let mut p = playing(
        tiles(&[(2, 5), (0, 0)]),
        tiles(&[(6, 6)]),
        board_of(&[(1, 2)]),
        vec![],
        Seat::First,
    );
    p.consecutive_passes = 1;
    let step = MatchState::Playing(p).apply(Seat::First, play(0)).unwrap();
    assert_eq!(
        step.event,
        StepEvent::Placed {
            side: Side::Right,
            tile: OrientedTile { entry: 2, exit: 5 }
        }
    );
    assert_eq!(step.state.turn(), Some(Seat::Second));
    assert_eq!(step.state.consecutive_passes(), 0);
    assert_eq!(step.state.board().unwrap().ends(), Some((1, 5)));
}

#[test]
fn out_of_turn_is_rejected() {
    let p = playing(
        tiles(&[(2, 5)]),
        tiles(&[(1, 6)]),
        board_of(&[(1, 2)]),
        vec![],
        Seat::First,
    );
    let err = MatchState::Playing(p).apply(Seat::Second, play(0)).unwrap_err();
    assert_eq!(kind(err), ValidationKind::OutOfTurn);
}

#[test]
fn bad_index_and_illegal_tile() {
    let p = playing(
        tiles(&[(3, 4)]),
        tiles(&[(6, 6)]),
        board_of(&[(1, 2)]),
        tiles(&[(0, 0)]),
        Seat::First,
    );
    let state = MatchState::Playing(p);
    assert_eq!(
        kind(state.clone().apply(Seat::First, play(5)).unwrap_err()),
        ValidationKind::TileNotInHand
    );
    assert_eq!(
        kind(state.apply(Seat::First, play(0)).unwrap_err()),
        ValidationKind::IllegalMove
    );
}

#[test]
fn ambiguous_play_needs_a_side() {
    let p = playing(
        tiles(&[(1, 2), (0, 0)]),
        tiles(&[(6, 6)]),
        board_of(&[(1, 2)]),
        vec![],
        Seat::First,
    );
    let state = MatchState::Playing(p);
    assert_eq!(
        kind(state.clone().apply(Seat::First, play(0)).unwrap_err()),
        ValidationKind::SideRequired
    );
    let step = state
        .apply(
            Seat::First,
            MatchAction::Play {
                index: 0,
                side: Some(Side::Left),
            },
        )
        .unwrap();
    assert_eq!(step.state.board().unwrap().ends(), Some((2, 2)));
}

#[test]
fn emptying_the_hand_wins() {
    let p = playing(
        tiles(&[(2, 5)]),
        tiles(&[(6, 6)]),
        board_of(&[(1, 2)]),
        tiles(&[(0, 0)]),
        Seat::First,
    );
    let step = MatchState::Playing(p).apply(Seat::First, play(0)).unwrap();
    assert_eq!(
        step.state.outcome(),
        Some(Outcome {
            winner: Some(Seat::First),
            win_type: WinType::EmptiedHand
        })
    );
    assert_eq!(
        kind(step.state.apply(Seat::Second, play(0)).unwrap_err()),
        ValidationKind::PhaseMismatch
    );
}

#[test]
fn draw_refused_while_holding_a_playable_tile() {
    let p = playing(
        tiles(&[(2, 5)]),
        tiles(&[(6, 6)]),
        board_of(&[(1, 2)]),
        tiles(&[(0, 0)]),
        Seat::First,
    );
    let err = MatchState::Playing(p)
        .apply(Seat::First, MatchAction::Draw)
        .unwrap_err();
    assert_eq!(kind(err), ValidationKind::MustPlay);
}

#[test]
fn playable_draw_keeps_the_turn() {
    let p = playing(
        tiles(&[(4, 4)]),
        tiles(&[(6, 6)]),
        board_of(&[(1, 2)]),
        tiles(&[(0, 3), (2, 3)]),
        Seat::First,
    );
    let step = MatchState::Playing(p)
        .apply(Seat::First, MatchAction::Draw)
        .unwrap();
    assert_eq!(
        step.event,
        StepEvent::Drew {
            tile: t(2, 3),
            keeps_turn: true
        }
    );
    assert_eq!(step.state.turn(), Some(Seat::First));
    assert_eq!(step.state.pile_len(), 1);
}

#[test]
fn dead_draw_passes_the_turn_and_resets_passes() {
    let mut p = playing(
        tiles(&[(4, 4)]),
        tiles(&[(6, 6)]),
        board_of(&[(1, 2)]),
        tiles(&[(0, 3), (5, 5)]),
        Seat::First,
    );
    p.consecutive_passes = 1;
    let step = MatchState::Playing(p)
        .apply(Seat::First, MatchAction::Draw)
        .unwrap();
    assert_eq!(step.state.turn(), Some(Seat::Second));
    assert_eq!(step.state.consecutive_passes(), 0);
    assert_eq!(step.state.hand(Seat::First).len(), 2);
}

#[test]
fn draw_from_empty_pile_is_rejected() {
    let p = playing(
        tiles(&[(4, 4)]),
        tiles(&[(6, 6)]),
        board_of(&[(1, 2)]),
        vec![],
        Seat::First,
    );
    let err = MatchState::Playing(p)
        .apply(Seat::First, MatchAction::Draw)
        .unwrap_err();
    assert_eq!(kind(err), ValidationKind::DrawPileEmpty);
}

#[test]
fn pass_requires_an_empty_pile() {
    let p = playing(
        tiles(&[(4, 4)]),
        tiles(&[(6, 6)]),
        board_of(&[(1, 2)]),
        tiles(&[(0, 3)]),
        Seat::First,
    );
    let err = MatchState::Playing(p)
        .apply(Seat::First, MatchAction::Pass)
        .unwrap_err();
    assert_eq!(kind(err), ValidationKind::MustDraw);
}

#[test]
fn two_passes_block_and_lower_pips_win() {
    let p = playing(
        tiles(&[(4, 4)]),
        tiles(&[(6, 6), (5, 5)]),
        board_of(&[(1, 2)]),
        vec![],
        Seat::First,
    );
    let step = MatchState::Playing(p)
        .apply(Seat::First, MatchAction::Pass)
        .unwrap();
    assert_eq!(step.event, StepEvent::Passed { consecutive: 1 });
    assert_eq!(step.state.turn(), Some(Seat::Second));
    let step = step.state.apply(Seat::Second, MatchAction::Pass).unwrap();
    assert_eq!(
        step.state.outcome(),
        Some(Outcome {
            winner: Some(Seat::First),
            win_type: WinType::Blocked
        })
    );
}

#[test]
fn blocked_tie_is_a_draw() {
    let p = playing(
        tiles(&[(4, 4)]),
        tiles(&[(3, 5)]),
        board_of(&[(1, 2)]),
        vec![],
        Seat::First,
    );
    let state = MatchState::Playing(p)
        .apply(Seat::First, MatchAction::Pass)
        .unwrap()
        .state
        .apply(Seat::Second, MatchAction::Pass)
        .unwrap()
        .state;
    let outcome = state.outcome().unwrap();
    assert!(outcome.is_draw());
    assert_eq!(outcome.win_type, WinType::Blocked);
}

#[test]
fn forfeit_ignores_turn_and_is_single_shot() {
    let p = playing(
        tiles(&[(4, 4)]),
        tiles(&[(3, 5)]),
        Board::new(),
        vec![],
        Seat::First,
    );
    let state = MatchState::Playing(p)
        .forfeit(Seat::Second, ForfeitReason::DisconnectTimeout)
        .unwrap();
    assert_eq!(
        state.outcome(),
        Some(Outcome {
            winner: Some(Seat::First),
            win_type: WinType::DisconnectTimeout
        })
    );
    let err = state
        .forfeit(Seat::First, ForfeitReason::Abandon)
        .unwrap_err();
    assert_eq!(kind(err), ValidationKind::PhaseMismatch);
}

#[test]
fn finished_state_serializes_with_kebab_win_type() {
    let p = playing(tiles(&[(4, 4)]), tiles(&[(3, 5)]), Board::new(), vec![], Seat::First);
    let state = MatchState::Playing(p)
        .forfeit(Seat::First, ForfeitReason::Abandon)
        .unwrap();
    let json = serde_json::to_value(&state).unwrap();
    assert_eq!(json["status"], "finished");
    assert_eq!(json["outcome"]["win_type"], "abandon");
    assert_eq!(json["outcome"]["winner"], "second");
}
