//! Adapters for external dependencies.

pub mod wallets_sea;
