//! Move legality and orientation.
//!
//! Pure: nothing here touches shared state. The match state machine calls
//! [`validate`] before it mutates anything, so an illegal move never reaches
//! the store.

use crate::domain::board::{Board, Side};
use crate::domain::tiles::{OrientedTile, Tile};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Placement {
    Legal { side: Side, oriented: OrientedTile },
    /// Fits both ends and no side was requested.
    Ambiguous,
    Illegal,
}

impl Placement {
    pub fn is_legal(&self) -> bool {
        matches!(self, Placement::Legal { .. })
    }
}

/// Orient `tile` for attachment on `side` of a board with the given end pip.
///
/// Right: entry pip must equal the right end. Left: exit pip must equal the
/// left end. `v1` is preferred so a tile whose `v1` already matches is never
/// flipped.
fn orient_for(tile: Tile, side: Side, end: u8) -> Option<OrientedTile> {
    let (plain, flipped) = (tile.as_placed(), tile.flipped());
    let touches = |o: OrientedTile| match side {
        Side::Right => o.entry == end,
        Side::Left => o.exit == end,
    };
    if touches(plain) {
        Some(plain)
    } else if touches(flipped) {
        Some(flipped)
    } else {
        None
    }
}

/// Decide whether `tile` can be placed and how.
///
/// A requested side is honored when the tile fits there and rejected when it
/// does not. On an empty board the request is ignored.
pub fn validate(board: &Board, tile: Tile, requested: Option<Side>) -> Placement {
    let Some((left, right)) = board.ends() else {
        return Placement::Legal {
            side: Side::Right,
            oriented: tile.as_placed(),
        };
    };

    let on_left = orient_for(tile, Side::Left, left);
    let on_right = orient_for(tile, Side::Right, right);

    match requested {
        Some(Side::Left) => on_left.map_or(Placement::Illegal, |oriented| Placement::Legal {
            side: Side::Left,
            oriented,
        }),
        Some(Side::Right) => on_right.map_or(Placement::Illegal, |oriented| Placement::Legal {
            side: Side::Right,
            oriented,
        }),
        None => match (on_left, on_right) {
            (Some(_), Some(_)) => Placement::Ambiguous,
            (Some(oriented), None) => Placement::Legal {
                side: Side::Left,
                oriented,
            },
            (None, Some(oriented)) => Placement::Legal {
                side: Side::Right,
                oriented,
            },
            (None, None) => Placement::Illegal,
        },
    }
}

/// True when the tile attaches to at least one end.
pub fn is_playable(board: &Board, tile: Tile) -> bool {
    !matches!(validate(board, tile, None), Placement::Illegal)
}

pub fn hand_has_playable(board: &Board, hand: &[Tile]) -> bool {
    hand.iter().any(|t| is_playable(board, *t))
}

/// Indices of hand tiles that can be placed right now.
pub fn playable_indices(board: &Board, hand: &[Tile]) -> Vec<usize> {
    hand.iter()
        .enumerate()
        .filter(|(_, t)| is_playable(board, **t))
        .map(|(i, _)| i)
        .collect()
}
