/// Property-based tests for move legality and orientation
use proptest::prelude::*;

use crate::domain::board::Side;
use crate::domain::placement::{validate, Placement};
use crate::domain::{test_gens, test_prelude};

proptest! {
    #![proptest_config(test_prelude::proptest_config())]

    /// Property: a tile sharing no pip with either end is never legal.
    #[test]
    fn prop_unmatched_tile_never_legal(board in test_gens::board(), tile in test_gens::tile()) {
        let (left, right) = board.ends().unwrap();
        let p = validate(&board, tile, None);
        if !tile.has_pip(left) && !tile.has_pip(right) {
            prop_assert_eq!(p, Placement::Illegal);
            prop_assert_eq!(validate(&board, tile, Some(Side::Left)), Placement::Illegal);
            prop_assert_eq!(validate(&board, tile, Some(Side::Right)), Placement::Illegal);
        }
    }

    /// Property: placed tiles always keep the board chained.
    #[test]
    fn prop_legal_placement_keeps_chain(board in test_gens::board(), tile in test_gens::tile()) {
        for side in [Side::Left, Side::Right] {
            if let Placement::Legal { side, oriented } = validate(&board, tile, Some(side)) {
                let mut next = board.clone();
                next.attach(side, oriented);
                prop_assert!(next.is_consistent());
                prop_assert_eq!(oriented.tile(), tile);
            }
        }
    }

    /// Property: v1 touching the right end is never flipped; only v2 touching
    /// it always is.
    #[test]
    fn prop_right_orientation(board in test_gens::board(), tile in test_gens::tile()) {
        let (_, right) = board.ends().unwrap();
        if let Placement::Legal { oriented, .. } = validate(&board, tile, Some(Side::Right)) {
            if tile.v1() == right {
                prop_assert_eq!(oriented, tile.as_placed());
            } else {
                prop_assert_eq!(tile.v2(), right);
                prop_assert_eq!(oriented, tile.flipped());
            }
        }
    }

    /// Property: ambiguity is reported exactly when both ends accept the tile.
    #[test]
    fn prop_ambiguous_iff_both_ends(board in test_gens::board(), tile in test_gens::tile()) {
        let left_ok = validate(&board, tile, Some(Side::Left)).is_legal();
        let right_ok = validate(&board, tile, Some(Side::Right)).is_legal();
        let p = validate(&board, tile, None);
        prop_assert_eq!(p == Placement::Ambiguous, left_ok && right_ok);
        prop_assert_eq!(p == Placement::Illegal, !left_ok && !right_ok);
    }
}
