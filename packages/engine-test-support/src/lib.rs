//! Shared helpers for the engine's integration tests: one-time logging setup
//! and collision-free player ids.

pub mod logging;
pub mod unique_helpers;

pub use unique_helpers::{unique_pair, unique_uid};
