//! Property tests: seeded matches played greedily through both clients.

use std::sync::Arc;

use domino_engine::domain::{SeededDealer, Side, WinType};
use domino_engine::error::AppError;
use domino_engine::services::{ExitResult, PlayResult};
use proptest::prelude::*;

use crate::common::proptest_prelude::proptest_prelude_config;
use crate::support::table::{Peer, Table};

/// One greedy turn for whoever holds it. Returns false once the match is over.
async fn step(t: &Table) -> Result<bool, AppError> {
    let view = t.a.client.view().await?;
    if view.result.is_some() {
        return Ok(false);
    }
    let peer: &Peer = if view.your_turn { &t.a } else { &t.b };
    let view = peer.client.view().await?;
    match view.playable.first() {
        Some(&index) => {
            if let PlayResult::SideChoiceRequired { .. } = peer.client.play(index).await? {
                peer.client.choose_side(Side::Right).await?;
            }
        }
        None if view.pile_count > 0 => {
            peer.client.draw().await?;
        }
        None => {
            peer.client.pass().await?;
        }
    }
    Ok(true)
}

async fn play_out(seed: u64, bet: u64) -> Result<(Table, WinType, Option<bool>), AppError> {
    let t = Table::new([500, 500], Arc::new(SeededDealer { seed }));
    t.start_match(bet).await?;

    let mut turns = 0;
    while step(&t).await? {
        turns += 1;
        assert!(turns < 200, "seed {seed} did not terminate");
    }
    let result = t.a.client.view().await?.result.expect("finished");
    let exit = t.a.client.exit().await?;
    assert!(matches!(exit, ExitResult::Settled(_)));
    Ok((t, result.win_type, result.you_won))
}

proptest! {
    #![proptest_config(proptest_prelude_config())]

    /// Property: settlement moves exactly the bet from loser to winner and
    /// leaves the token total untouched.
    #[test]
    fn prop_greedy_matches_settle_the_bet(seed in any::<u64>(), bet in prop_oneof![Just(50u64), Just(100), Just(200)]) {
        let rt = tokio::runtime::Runtime::new().expect("runtime");
        let (t, win_type, a_won) = rt.block_on(play_out(seed, bet)).expect("match plays out");
        let balances = rt.block_on(t.balances());

        prop_assert_eq!(balances[0] + balances[1], 1000);
        prop_assert!(matches!(win_type, WinType::EmptiedHand | WinType::Blocked));
        match a_won {
            Some(true) => prop_assert_eq!(balances, [500 + bet, 500 - bet]),
            Some(false) => prop_assert_eq!(balances, [500 - bet, 500 + bet]),
            None => prop_assert_eq!(balances, [500, 500]),
        }
    }
}
