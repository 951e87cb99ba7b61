//! Typed, path-keyed record access over the shared store.

pub mod escrow;
pub mod matches;
pub mod presence;
pub mod settlements;
