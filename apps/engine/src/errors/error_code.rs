//! Error codes for the domino match engine.
//!
//! This module defines all error codes used throughout the engine.
//! Add new codes here; never pass ad-hoc strings as error codes.
//!
//! All error codes are SCREAMING_SNAKE_CASE and map 1:1 to the strings
//! surfaced to the presentation layer.

use core::fmt;

/// Centralized error codes for the match engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Move validation
    /// Tile cannot attach to either open end
    IllegalMove,
    /// Tile fits both ends; the caller must choose a side
    SideRequired,
    /// Tile index does not exist in the mover's hand
    TileNotInHand,
    /// A playable tile is in hand, so drawing or passing is refused
    MustPlay,
    /// Draw pile is empty
    DrawPileEmpty,
    /// Passing while tiles remain in the draw pile
    MustDraw,
    /// Acting while the opponent holds the turn
    OutOfTurn,
    /// Action does not apply in the current phase
    PhaseMismatch,
    /// Caller is not a participant of the session
    NotAParticipant,
    /// Deal does not partition the canonical tile set
    InvalidDeal,

    // Escrow
    /// Bet is not on the denomination menu
    InvalidBet,
    /// Balance does not cover the bet
    InsufficientFunds,
    /// Invited player proposed before the inviter
    AwaitingInviter,
    /// Negotiation is closed (started or cancelled)
    EscrowClosed,
    /// Both participants are the same player
    InvalidParticipants,
    /// General validation error
    ValidationError,

    // Resource Not Found
    /// No match stored for the session
    MatchNotFound,
    /// No escrow record stored for the session
    EscrowNotFound,
    /// General not found error
    NotFound,

    // Concurrency
    /// Compare-and-set rejected a stale write
    OptimisticLock,
    /// A live match already occupies the session
    SessionConflict,
    /// Generic conflict (fallback for unmatched conflicts)
    Conflict,

    // System Errors
    /// Shared store unreachable or failing
    StoreUnavailable,
    /// Stored record could not be decoded
    DataCorruption,
    /// Database error
    DbError,
    /// Internal error
    Internal,
    /// Configuration error
    ConfigError,
}

impl ErrorCode {
    /// Returns the canonical SCREAMING_SNAKE_CASE string for this error code.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::IllegalMove => "ILLEGAL_MOVE",
            Self::SideRequired => "SIDE_REQUIRED",
            Self::TileNotInHand => "TILE_NOT_IN_HAND",
            Self::MustPlay => "MUST_PLAY",
            Self::DrawPileEmpty => "DRAW_PILE_EMPTY",
            Self::MustDraw => "MUST_DRAW",
            Self::OutOfTurn => "OUT_OF_TURN",
            Self::PhaseMismatch => "PHASE_MISMATCH",
            Self::NotAParticipant => "NOT_A_PARTICIPANT",
            Self::InvalidDeal => "INVALID_DEAL",

            Self::InvalidBet => "INVALID_BET",
            Self::InsufficientFunds => "INSUFFICIENT_FUNDS",
            Self::AwaitingInviter => "AWAITING_INVITER",
            Self::EscrowClosed => "ESCROW_CLOSED",
            Self::InvalidParticipants => "INVALID_PARTICIPANTS",
            Self::ValidationError => "VALIDATION_ERROR",

            Self::MatchNotFound => "MATCH_NOT_FOUND",
            Self::EscrowNotFound => "ESCROW_NOT_FOUND",
            Self::NotFound => "NOT_FOUND",

            Self::OptimisticLock => "OPTIMISTIC_LOCK",
            Self::SessionConflict => "SESSION_CONFLICT",
            Self::Conflict => "CONFLICT",

            Self::StoreUnavailable => "STORE_UNAVAILABLE",
            Self::DataCorruption => "DATA_CORRUPTION",
            Self::DbError => "DB_ERROR",
            Self::Internal => "INTERNAL",
            Self::ConfigError => "CONFIG_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
