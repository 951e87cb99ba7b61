//! Shuffling and dealing the tile set.

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::domain::tiles::{canonical_set, Tile, TILE_COUNT};
use crate::errors::domain::{DomainError, ValidationKind};

pub const HAND_SIZE: usize = 7;
pub const PILE_SIZE: usize = TILE_COUNT - 2 * HAND_SIZE;

/// A partition of the canonical set into two hands and a draw pile.
///
/// `hands[0]` belongs to the first seat (the inviter). The pile is drawn from
/// the back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deal {
    pub hands: [Vec<Tile>; 2],
    pub pile: Vec<Tile>,
}

impl Deal {
    /// Build a deal from externally chosen parts, checking it partitions the
    /// canonical set exactly.
    pub fn from_parts(
        first: Vec<Tile>,
        second: Vec<Tile>,
        pile: Vec<Tile>,
    ) -> Result<Self, DomainError> {
        if first.len() != HAND_SIZE || second.len() != HAND_SIZE || pile.len() != PILE_SIZE {
            return Err(DomainError::validation(
                ValidationKind::InvalidDeal,
                format!(
                    "expected {HAND_SIZE}/{HAND_SIZE}/{PILE_SIZE} tiles, got {}/{}/{}",
                    first.len(),
                    second.len(),
                    pile.len()
                ),
            ));
        }
        let deal = Self {
            hands: [first, second],
            pile,
        };
        if !deal.is_partition() {
            return Err(DomainError::validation(
                ValidationKind::InvalidDeal,
                "hands and pile must cover the tile set without repeats",
            ));
        }
        Ok(deal)
    }

    fn all_tiles(&self) -> impl Iterator<Item = &Tile> {
        self.hands[0]
            .iter()
            .chain(self.hands[1].iter())
            .chain(self.pile.iter())
    }

    /// Pairwise disjoint and the union equals the canonical set.
    pub fn is_partition(&self) -> bool {
        let seen: HashSet<&Tile> = self.all_tiles().collect();
        let canonical = canonical_set();
        self.all_tiles().count() == TILE_COUNT
            && seen.len() == TILE_COUNT
            && canonical.iter().all(|t| seen.contains(t))
    }
}

/// Seam used by match initialization to obtain a deal.
pub trait Dealer: Send + Sync {
    fn deal(&self) -> Deal;
}

/// Shuffle the canonical set with a seeded ChaCha stream and split it.
pub fn deal_with_seed(seed: u64) -> Deal {
    let mut tiles = canonical_set();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    tiles.shuffle(&mut rng);

    let pile = tiles.split_off(2 * HAND_SIZE);
    let second = tiles.split_off(HAND_SIZE);
    Deal {
        hands: [tiles, second],
        pile,
    }
}

/// Fresh entropy for every match.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomDealer;

impl Dealer for RandomDealer {
    fn deal(&self) -> Deal {
        deal_with_seed(rand::random())
    }
}

/// Reproducible deals: every call yields the same partition.
#[derive(Debug, Clone, Copy)]
pub struct SeededDealer {
    pub seed: u64,
}

impl Dealer for SeededDealer {
    fn deal(&self) -> Deal {
        deal_with_seed(self.seed)
    }
}
