use thiserror::Error;

use crate::errors::domain::{DomainError, ValidationKind};
use crate::errors::ErrorCode;

/// Service-level error returned by every engine operation.
#[derive(Error, Debug, Clone)]
pub enum AppError {
    #[error("Validation error: {detail}")]
    Validation {
        code: ErrorCode,
        kind: ValidationKind,
        detail: String,
    },
    #[error("Invalid state: {detail}")]
    InvalidState { code: ErrorCode, detail: String },
    #[error("Not found: {detail}")]
    NotFound { code: ErrorCode, detail: String },
    #[error("Generation failure: {detail}")]
    GenerationFailure { detail: String },
    #[error("Persistence error: {detail}")]
    Persistence { code: ErrorCode, detail: String },
    #[error("Configuration error: {detail}")]
    Config { detail: String },
    #[error("Internal error: {detail}")]
    Internal { detail: String },
    #[error("Room {room_id} is closed")]
    RoomClosed { room_id: i64 },
}

impl AppError {
    /// Stable error code for this variant.
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation { code, .. } => *code,
            AppError::InvalidState { code, .. } => *code,
            AppError::NotFound { code, .. } => *code,
            AppError::GenerationFailure { .. } => ErrorCode::GenerationFailure,
            AppError::Persistence { code, .. } => *code,
            AppError::Config { .. } => ErrorCode::ConfigError,
            AppError::Internal { .. } => ErrorCode::InternalError,
            AppError::RoomClosed { .. } => ErrorCode::RoomClosed,
        }
    }

    /// Validation kind, when the error was a rejected action.
    pub fn validation_kind(&self) -> Option<&ValidationKind> {
        match self {
            AppError::Validation { kind, .. } => Some(kind),
            _ => None,
        }
    }

    /// True for errors the game survives without caller intervention.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::Validation { .. }
                | AppError::InvalidState { .. }
                | AppError::NotFound { .. }
                | AppError::GenerationFailure { .. }
        )
    }

    pub fn invalid(kind: ValidationKind, detail: impl Into<String>) -> Self {
        Self::Validation {
            code: ErrorCode::from(&kind),
            kind,
            detail: detail.into(),
        }
    }

    pub fn invalid_state(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self::InvalidState {
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

    pub fn generation(detail: impl Into<String>) -> Self {
        Self::GenerationFailure {
            detail: detail.into(),
        }
    }

    pub fn persistence(detail: impl Into<String>) -> Self {
        Self::Persistence {
            code: ErrorCode::PersistenceFailure,
            detail: detail.into(),
        }
    }

    pub fn optimistic_lock(detail: impl Into<String>) -> Self {
        Self::Persistence {
            code: ErrorCode::OptimisticLock,
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
            detail: detail.into(),
        }
    }

    pub fn room_closed(room_id: i64) -> Self {
        Self::RoomClosed { room_id }
    }
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::Validation(kind, detail) => AppError::Validation {
                code: ErrorCode::from(&kind),
                kind,
                detail,
            },
            DomainError::InvalidState(detail) => AppError::InvalidState {
                code: ErrorCode::InvalidState,
                detail,
            },
            DomainError::NotFound(kind, detail) => AppError::NotFound {
                code: ErrorCode::from(&kind),
                detail,
            },
        }
    }
}

impl From<std::env::VarError> for AppError {
    fn from(e: std::env::VarError) -> Self {
        AppError::config(e.to_string())
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(e: sea_orm::DbErr) -> Self {
        AppError::persistence(e.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::persistence(format!("game state (de)serialization failed: {e}"))
    }
}

impl From<crate::ai::AiError> for AppError {
    fn from(e: crate::ai::AiError) -> Self {
        AppError::generation(e.to_string())
    }
}
