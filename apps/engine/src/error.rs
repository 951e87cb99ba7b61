use thiserror::Error;

use crate::errors::domain::{
    ConflictKind, DomainError, InfraErrorKind, NotFoundKind, ValidationKind,
};
use crate::errors::ErrorCode;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {detail}")]
    Validation { code: ErrorCode, detail: String },
    #[error("Conflict: {detail}")]
    Conflict { code: ErrorCode, detail: String },
    #[error("Not found: {detail}")]
    NotFound { code: ErrorCode, detail: String },
    #[error("Store error: {detail}")]
    Storage { code: ErrorCode, detail: String },
    #[error("Database error: {detail}")]
    Db {
        detail: String,
        #[source]
        source: sea_orm::DbErr,
    },
    #[error("Configuration error: {detail}")]
    Config { detail: String },
    #[error("Internal error: {detail}")]
    Internal { code: ErrorCode, detail: String },
}

impl AppError {
    /// Helper method to extract error code from any error variant
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation { code, .. } => *code,
            AppError::Conflict { code, .. } => *code,
            AppError::NotFound { code, .. } => *code,
            AppError::Storage { code, .. } => *code,
            AppError::Db { .. } => ErrorCode::DbError,
            AppError::Config { .. } => ErrorCode::ConfigError,
            AppError::Internal { code, .. } => *code,
        }
    }

    /// Helper method to extract error detail from any error variant
    pub fn detail(&self) -> &str {
        match self {
            AppError::Validation { detail, .. }
            | AppError::Conflict { detail, .. }
            | AppError::NotFound { detail, .. }
            | AppError::Storage { detail, .. }
            | AppError::Db { detail, .. }
            | AppError::Config { detail }
            | AppError::Internal { detail, .. } => detail,
        }
    }

    /// Transient connectivity failures are surfaced as a banner, never as a
    /// terminal outcome.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AppError::Storage {
                code: ErrorCode::StoreUnavailable,
                ..
            }
        )
    }

    pub fn is_optimistic_lock(&self) -> bool {
        matches!(
            self,
            AppError::Conflict {
                code: ErrorCode::OptimisticLock,
                ..
            }
        )
    }

    pub fn invalid(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self::Validation {
            code,
            detail: detail.into(),
        }
    }

    pub fn conflict(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self::Conflict {
            code,
            detail: detail.into(),
        }
    }

    pub fn not_found(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self::NotFound {
            code,
            detail: detail.into(),
        }
    }

    pub fn store_unavailable(detail: impl Into<String>) -> Self {
        Self::Storage {
            code: ErrorCode::StoreUnavailable,
            detail: detail.into(),
        }
    }

    pub fn config(detail: impl Into<String>) -> Self {
        Self::Config {
            detail: detail.into(),
        }
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::Internal {
            code: ErrorCode::Internal,
            detail: detail.into(),
        }
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(kind, detail) => {
                let code = match kind {
                    ValidationKind::IllegalMove => ErrorCode::IllegalMove,
                    ValidationKind::SideRequired => ErrorCode::SideRequired,
                    ValidationKind::TileNotInHand => ErrorCode::TileNotInHand,
                    ValidationKind::MustPlay => ErrorCode::MustPlay,
                    ValidationKind::DrawPileEmpty => ErrorCode::DrawPileEmpty,
                    ValidationKind::MustDraw => ErrorCode::MustDraw,
                    ValidationKind::OutOfTurn => ErrorCode::OutOfTurn,
                    ValidationKind::PhaseMismatch => ErrorCode::PhaseMismatch,
                    ValidationKind::NotAParticipant => ErrorCode::NotAParticipant,
                    ValidationKind::InvalidDeal => ErrorCode::InvalidDeal,
                    ValidationKind::InvalidBet => ErrorCode::InvalidBet,
                    ValidationKind::InsufficientFunds => ErrorCode::InsufficientFunds,
                    ValidationKind::AwaitingInviter => ErrorCode::AwaitingInviter,
                    ValidationKind::EscrowClosed => ErrorCode::EscrowClosed,
                    ValidationKind::InvalidParticipants => ErrorCode::InvalidParticipants,
                    ValidationKind::Other(_) => ErrorCode::ValidationError,
                };
                AppError::Validation { code, detail }
            }
            DomainError::Conflict(kind, detail) => {
                let code = match kind {
                    ConflictKind::OptimisticLock => ErrorCode::OptimisticLock,
                    ConflictKind::SessionConflict => ErrorCode::SessionConflict,
                    ConflictKind::Other(_) => ErrorCode::Conflict,
                };
                AppError::Conflict { code, detail }
            }
            DomainError::NotFound(kind, detail) => {
                let code = match kind {
                    NotFoundKind::Match => ErrorCode::MatchNotFound,
                    NotFoundKind::Escrow => ErrorCode::EscrowNotFound,
                    NotFoundKind::Other(_) => ErrorCode::NotFound,
                };
                AppError::NotFound { code, detail }
            }
            DomainError::Infra(kind, detail) => match kind {
                InfraErrorKind::StoreUnavailable => AppError::Storage {
                    code: ErrorCode::StoreUnavailable,
                    detail,
                },
                InfraErrorKind::DataCorruption => AppError::Storage {
                    code: ErrorCode::DataCorruption,
                    detail,
                },
                InfraErrorKind::Other(_) => AppError::Internal {
                    code: ErrorCode::Internal,
                    detail,
                },
            },
        }
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(e: sea_orm::DbErr) -> Self {
        AppError::Db {
            detail: format!("db error: {e}"),
            source: e,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Storage {
            code: ErrorCode::DataCorruption,
            detail: format!("record could not be decoded: {e}"),
        }
    }
}
