//! Peer-side services. Each participant runs its own instances against the
//! shared store; no component arbitrates between them.

pub mod escrow;
pub mod match_flow;
pub mod presence;
pub mod settlement;

pub use escrow::{EscrowService, StartResult};
pub use match_flow::{
    ExitResult, ForfeitResult, Forfeiter, MatchClient, MatchForfeiter, MatchMutationResult,
    PlayResult,
};
pub use presence::{PresenceHandle, PresenceMonitor, PresenceTarget};
pub use settlement::{SettlementEngine, SettlementResult};
