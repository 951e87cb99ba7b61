use serde::{Deserialize, Serialize};

use crate::domain::tiles::OrientedTile;

/// Which open end of the line a tile attaches to.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

/// Ordered line of placed tiles.
///
/// Adjacent tiles always agree: `line[i].exit == line[i + 1].entry`.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board {
    line: Vec<OrientedTile>,
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.line.is_empty()
    }

    pub fn len(&self) -> usize {
        self.line.len()
    }

    pub fn tiles(&self) -> &[OrientedTile] {
        &self.line
    }

    /// `(left, right)` open ends; `None` while the board is empty.
    pub fn ends(&self) -> Option<(u8, u8)> {
        let first = self.line.first()?;
        let last = self.line.last()?;
        Some((first.entry, last.exit))
    }

    /// Attach an already-oriented tile. Callers go through
    /// [`crate::domain::placement::validate`] first.
    pub(crate) fn attach(&mut self, side: Side, tile: OrientedTile) {
        match side {
            Side::Left => self.line.insert(0, tile),
            Side::Right => self.line.push(tile),
        }
    }

    /// True when every adjacent pair shares its touching pip.
    pub fn is_consistent(&self) -> bool {
        self.line.windows(2).all(|w| w[0].exit == w[1].entry)
    }
}
