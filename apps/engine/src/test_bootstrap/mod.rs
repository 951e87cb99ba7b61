//! Unit-test setup shared by every `#[cfg(test)]` module in the crate.

pub mod logging;
