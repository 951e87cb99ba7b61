#![deny(clippy::wildcard_imports)]
#![cfg_attr(test, allow(clippy::wildcard_imports))]

//! Two-player wagered dominoes over a shared versioned store.
//!
//! Both participants run the same engine. They coordinate only through
//! compare-and-set writes and pushed snapshots of the records under
//! `betting/`, `matches/`, `presence/` and `settlements/`.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod entities;
pub mod error;
pub mod errors;
pub mod ledger;
pub mod protocol;
pub mod repos;
pub mod services;
pub mod store;
pub mod telemetry;
pub mod utils;

#[cfg(test)]
pub mod test_bootstrap;

// Re-exports for public API
pub use config::engine::EngineConfig;
pub use error::AppError;
pub use errors::{DomainError, ErrorCode};
pub use ledger::{BalanceLedger, MemoryLedger, SeaLedger};
pub use protocol::{MatchSessionView, PresenceEvent};
pub use services::{
    EscrowService, MatchClient, MatchForfeiter, PresenceMonitor, SettlementEngine,
};
pub use store::{MemoryStore, SharedStore, StorePath};

// Prelude for test convenience
pub mod prelude {
    pub use super::domain::{
        BetMenu, Board, Deal, Dealer, EscrowRecord, EscrowStatus, ForfeitReason, MatchAction,
        MatchId, MatchSession, MatchState, Outcome, PlayerId, ProposeOutcome, Seat, SeededDealer,
        SessionId, Side, Tile, WinType,
    };
    pub use super::error::AppError;
    pub use super::errors::{DomainError, ErrorCode};
    pub use super::ledger::{BalanceLedger, MemoryLedger};
    pub use super::protocol::{MatchSessionView, PresenceEvent};
    pub use super::services::{
        EscrowService, ExitResult, ForfeitResult, Forfeiter, MatchClient, PlayResult,
        PresenceMonitor, PresenceTarget, SettlementEngine, SettlementResult, StartResult,
    };
    pub use super::store::{MemoryStore, SharedStore, StorePath};
}

// Auto-initialize logging for unit tests
#[cfg(test)]
#[ctor::ctor]
fn init_test_logging() {
    test_bootstrap::logging::init();
}
