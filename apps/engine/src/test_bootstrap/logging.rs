#![cfg(test)]

//! One-time tracing setup for unit tests.
//!
//! The level comes from `TEST_LOG`, then `RUST_LOG`, then `warn`, so a plain
//! `cargo test` stays quiet and `TEST_LOG=debug` shows rejected moves and lost
//! write races.

use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

static INITIALIZED: OnceCell<()> = OnceCell::new();

/// Idempotent; safe to call from any test.
pub fn init() {
    INITIALIZED.get_or_init(|| {
        let filter = std::env::var("TEST_LOG")
            .or_else(|_| std::env::var("RUST_LOG"))
            .map(EnvFilter::new)
            .unwrap_or_else(|_| EnvFilter::new("warn"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .without_time()
            .try_init()
            .ok();
    });
}
