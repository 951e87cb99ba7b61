//! Turn-gated play against the shared match record.

use domino_engine::domain::match_transition::MatchTransition;
use domino_engine::domain::{ForfeitReason, MatchAction, Seat, Side, WinType};
use domino_engine::error::AppError;
use domino_engine::errors::ErrorCode;
use domino_engine::repos::matches;
use domino_engine::services::{ExitResult, ForfeitResult, Forfeiter, PlayResult};
use futures::StreamExt;

use crate::support::table::{deal_of, index_of, staircase_deal, tile, Table};

/// Inviter opens with 1|1 so any tile with a 1 fits both ends.
fn double_opening() -> Table {
    Table::with_deal(
        [500, 500],
        deal_of(
            &[(1, 1), (0, 0), (0, 2), (0, 3), (0, 4), (0, 5), (0, 6)],
            &[(1, 4), (2, 2), (2, 3), (2, 4), (2, 5), (2, 6), (3, 3)],
        ),
    )
}

/// Inviter opens with 0|0; the invitee holds no zero.
fn blank_opening() -> Table {
    Table::with_deal(
        [500, 500],
        deal_of(
            &[(0, 0), (0, 1), (0, 2), (0, 3), (0, 4), (0, 5), (0, 6)],
            &[(1, 1), (1, 2), (1, 3), (1, 4), (1, 5), (1, 6), (2, 2)],
        ),
    )
}

#[tokio::test]
async fn test_only_the_turn_holder_may_act() -> Result<(), AppError> {
    let t = Table::with_deal([500, 500], staircase_deal());
    t.start_match(100).await?;

    let before = t.b.client.view().await?;
    assert!(!before.your_turn);
    assert!(before.playable.is_empty());

    let err = t.b.client.play(0).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::OutOfTurn);
    let err = t.b.client.draw().await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::OutOfTurn);

    // Rejections never reach the store.
    assert_eq!(t.b.client.view().await?.version, before.version);
    Ok(())
}

#[tokio::test]
async fn test_illegal_tile_is_rejected() -> Result<(), AppError> {
    let t = Table::with_deal([500, 500], staircase_deal());
    t.start_match(100).await?;
    t.a.client.play(index_of(&t.a, tile(0, 1)).await).await?;

    let err = t.b.client.play(index_of(&t.b, tile(5, 5)).await).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::IllegalMove);

    let err = t.b.client.play(42).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::TileNotInHand);
    Ok(())
}

#[tokio::test]
async fn test_stale_write_surfaces_as_optimistic_lock() -> Result<(), AppError> {
    let t = Table::with_deal([500, 500], staircase_deal());
    t.start_match(100).await?;

    let stale = matches::require(t.store.as_ref(), &t.session_id).await?;
    t.a.client.play(index_of(&t.a, tile(0, 1)).await).await?;

    let err = matches::update(t.store.as_ref(), &stale.value, stale.version)
        .await
        .unwrap_err();
    assert!(err.is_optimistic_lock());

    let current = matches::require(t.store.as_ref(), &t.session_id).await?;
    assert_eq!(current.value.state.moves(), 1);
    Ok(())
}

#[tokio::test]
async fn test_tile_fitting_both_ends_waits_for_a_side() -> Result<(), AppError> {
    let t = double_opening();
    t.start_match(100).await?;
    t.a.client.play(index_of(&t.a, tile(1, 1)).await).await?;

    let err = t.b.client.choose_side(Side::Left).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::ValidationError);

    let result = t.b.client.play(index_of(&t.b, tile(1, 4)).await).await?;
    assert_eq!(result, PlayResult::SideChoiceRequired { tile: tile(1, 4) });

    let view = t.b.client.choose_side(Side::Left).await?;
    assert_eq!(view.ends, Some((4, 1)));
    assert_eq!(view.board.len(), 2);
    assert!(!view.your_turn);
    Ok(())
}

#[tokio::test]
async fn test_must_play_before_drawing_or_passing() -> Result<(), AppError> {
    let t = double_opening();
    t.start_match(100).await?;
    t.a.client.play(index_of(&t.a, tile(1, 1)).await).await?;

    let err = t.b.client.draw().await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::MustPlay);
    let err = t.b.client.pass().await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::MustDraw);
    Ok(())
}

#[tokio::test]
async fn test_unplayable_draw_hands_over_the_turn() -> Result<(), AppError> {
    let t = blank_opening();
    t.start_match(100).await?;
    t.a.client.play(index_of(&t.a, tile(0, 0)).await).await?;

    let view = t.b.client.draw().await?;
    assert_eq!(view.hand.len(), 8);
    assert_eq!(view.pile_count, 13);
    assert!(view.hand.contains(&tile(6, 6)));
    assert!(!view.your_turn);
    assert_eq!(view.consecutive_passes, 0);

    assert!(t.a.client.view().await?.your_turn);
    Ok(())
}

#[tokio::test]
async fn test_watchers_see_each_write() -> Result<(), AppError> {
    let t = Table::with_deal([500, 500], staircase_deal());
    t.start_match(100).await?;

    let mut watch = t.b.client.watch().await?;
    let first = watch.next().await.flatten().expect("match visible");
    assert!(!first.your_turn);

    t.a.client.play(index_of(&t.a, tile(0, 1)).await).await?;
    let next = watch.next().await.flatten().expect("match visible");
    assert!(next.version > first.version);
    assert!(next.your_turn);
    assert_eq!(next.opponent_tile_count, 6);
    // 1|1 on the right, 0|3 on the left.
    assert_eq!(next.playable.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_emptied_hand_finishes_and_freezes_the_match() -> Result<(), AppError> {
    let t = Table::with_deal([500, 500], staircase_deal());
    t.start_match(100).await?;

    let a_run = [(0, 1), (1, 2), (2, 3), (3, 4), (4, 5), (5, 6)];
    let b_run = [(1, 1), (2, 2), (3, 3), (4, 4), (5, 5), (6, 6)];
    for (a, b) in a_run.into_iter().zip(b_run) {
        t.a.client.play(index_of(&t.a, tile(a.0, a.1)).await).await?;
        t.b.client.play(index_of(&t.b, tile(b.0, b.1)).await).await?;
    }
    let view = match t.a.client.play(index_of(&t.a, tile(4, 6)).await).await? {
        PlayResult::Applied(view) => view,
        other => panic!("unexpected {other:?}"),
    };

    let result = view.result.expect("finished");
    assert_eq!(result.winner.as_ref(), Some(&t.a.uid));
    assert_eq!(result.win_type, WinType::EmptiedHand);
    assert_eq!(result.you_won, Some(true));
    assert_eq!(view.opponent_hand, Some(vec![tile(0, 3)]));

    let err = t.b.client.play(0).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::PhaseMismatch);
    let err = t.b.client.abandon().await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::PhaseMismatch);
    Ok(())
}

#[tokio::test]
async fn test_abandon_works_off_turn_and_forfeits_are_idempotent() -> Result<(), AppError> {
    let t = Table::with_deal([500, 500], staircase_deal());
    t.start_match(100).await?;

    let err = t.b.client.exit().await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::PhaseMismatch);

    let abandoned = t.b.client.abandon().await?;
    let ForfeitResult::Applied(outcome) = abandoned else {
        panic!("expected the abandon to apply, got {abandoned:?}");
    };
    assert_eq!(outcome.win_type, WinType::Abandon);

    // A racing disconnect forfeit after the fact changes nothing.
    let again = t
        .a
        .client
        .forfeit(&t.a.uid, ForfeitReason::DisconnectTimeout)
        .await?;
    assert_eq!(again, ForfeitResult::AlreadyFinished(outcome));

    let view = t.a.client.view().await?;
    let result = view.result.expect("finished");
    assert_eq!(result.winner.as_ref(), Some(&t.a.uid));
    assert_eq!(result.win_type, WinType::Abandon);

    match t.a.client.exit().await? {
        ExitResult::Settled(settled) => {
            assert_eq!(settled.receipt().bet, 100);
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(t.balances().await, [600, 400]);
    Ok(())
}

#[tokio::test]
async fn test_transitions_follow_the_record_from_start_to_removal() -> Result<(), AppError> {
    let t = Table::with_deal([500, 500], staircase_deal());
    t.start_match(100).await?;

    let mut seen = t.b.client.transitions().await?;
    assert_eq!(seen.next().await, Some(MatchTransition::MatchStarted));
    assert_eq!(
        seen.next().await,
        Some(MatchTransition::TurnBecame { seat: Seat::First })
    );

    let index = index_of(&t.a, tile(0, 1)).await;
    let played = t
        .a
        .client
        .run_action(MatchAction::Play { index, side: None })
        .await?;
    assert_eq!(
        played.transitions,
        vec![MatchTransition::TurnBecame { seat: Seat::Second }]
    );
    assert_eq!(
        seen.next().await,
        Some(MatchTransition::TurnBecame { seat: Seat::Second })
    );

    let ForfeitResult::Applied(outcome) = t.a.client.abandon().await? else {
        panic!("abandon should apply");
    };
    assert_eq!(seen.next().await, Some(MatchTransition::MatchEnded { outcome }));

    t.b.client.exit().await?;
    assert_eq!(seen.next().await, Some(MatchTransition::MatchRemoved));
    Ok(())
}
