//! Core tile types: Tile, OrientedTile and the canonical double-six set.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::domain::{DomainError, ValidationKind};

/// Highest pip value in a double-six set.
pub const MAX_PIP: u8 = 6;
/// Size of the canonical set: every pair (i, j) with i <= j <= 6.
pub const TILE_COUNT: usize = 28;

/// Unordered pair of pip values as held in a hand or the draw pile.
///
/// Pips are stored low-first so two tiles with the same values compare equal
/// regardless of how they were written.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(try_from = "[u8; 2]", into = "[u8; 2]")]
pub struct Tile {
    v1: u8,
    v2: u8,
}

impl Tile {
    pub fn new(a: u8, b: u8) -> Result<Self, DomainError> {
        if a > MAX_PIP || b > MAX_PIP {
            return Err(DomainError::validation(
                ValidationKind::InvalidDeal,
                format!("pip values must be 0..={MAX_PIP}, got {a}|{b}"),
            ));
        }
        Ok(Self {
            v1: a.min(b),
            v2: a.max(b),
        })
    }

    pub fn v1(self) -> u8 {
        self.v1
    }

    pub fn v2(self) -> u8 {
        self.v2
    }

    pub fn is_double(self) -> bool {
        self.v1 == self.v2
    }

    pub fn pip_sum(self) -> u32 {
        u32::from(self.v1) + u32::from(self.v2)
    }

    pub fn has_pip(self, pip: u8) -> bool {
        self.v1 == pip || self.v2 == pip
    }

    /// Orientation with `v1` as entry pip.
    pub fn as_placed(self) -> OrientedTile {
        OrientedTile {
            entry: self.v1,
            exit: self.v2,
        }
    }

    /// Orientation with `v2` as entry pip.
    pub fn flipped(self) -> OrientedTile {
        OrientedTile {
            entry: self.v2,
            exit: self.v1,
        }
    }
}

impl TryFrom<[u8; 2]> for Tile {
    type Error = DomainError;

    fn try_from(pips: [u8; 2]) -> Result<Self, Self::Error> {
        Tile::new(pips[0], pips[1])
    }
}

impl From<Tile> for [u8; 2] {
    fn from(t: Tile) -> Self {
        [t.v1, t.v2]
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.v1, self.v2)
    }
}

/// A tile as laid on the board, read left to right.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct OrientedTile {
    pub entry: u8,
    pub exit: u8,
}

impl OrientedTile {
    pub fn tile(self) -> Tile {
        Tile {
            v1: self.entry.min(self.exit),
            v2: self.entry.max(self.exit),
        }
    }
}

impl fmt::Display for OrientedTile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.entry, self.exit)
    }
}

/// Generate the full 28-tile set in canonical order (0|0, 0|1, ... 6|6).
pub fn canonical_set() -> Vec<Tile> {
    let mut set = Vec::with_capacity(TILE_COUNT);
    for a in 0..=MAX_PIP {
        for b in a..=MAX_PIP {
            set.push(Tile { v1: a, v2: b });
        }
    }
    set
}

/// Sum of pips across a hand; lower wins a blocked game.
pub fn hand_pip_sum(hand: &[Tile]) -> u32 {
    hand.iter().map(|t| t.pip_sum()).sum()
}
