//! Domain-level error type used across the resolver, state helpers and services.
//!
//! This error type is transport- and storage-agnostic. Services return
//! `Result<T, crate::error::AppError>` and convert from `DomainError`
//! using the provided `From<DomainError> for AppError` implementation.

use std::error::Error;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Why an action was rejected. Recovered locally: the offending caller gets the
/// error, the game continues.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationKind {
    /// Action submitted outside the phase/sub-phase that accepts it
    PhaseMismatch,
    /// Right phase, wrong seat
    OutOfTurn,
    /// Seat's role cannot perform this action
    NotYourRole,
    ActorDead,
    TargetDead,
    /// Target is not a legal choice (self, unknown, teammate where forbidden)
    InvalidTarget,
    AlreadyActed,
    /// Once-per-game ability already spent
    SkillUsed,
    SaveAndPoisonSameSeat,
    /// Antidote used on a seat that is not tonight's victim
    SaveNotOnVictim,
    EmptySpeech,
    UnknownSeat,
    Other(String),
}

/// Domain-level not found entities
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum NotFoundKind {
    Room,
    Seat,
    SavedGame,
    Other(String),
}

/// Central domain error type
#[derive(Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Rule violation by the acting seat
    Validation(ValidationKind, String),
    /// Operation not valid for the game's lifecycle state (start twice, pause a finished game)
    InvalidState(String),
    /// Missing resource in domain terms
    NotFound(NotFoundKind, String),
}

impl Display for DomainError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            DomainError::Validation(kind, d) => write!(f, "validation error {kind:?}: {d}"),
            DomainError::InvalidState(d) => write!(f, "invalid state: {d}"),
            DomainError::NotFound(kind, d) => write!(f, "not found {kind:?}: {d}"),
        }
    }
}

impl Error for DomainError {}

impl DomainError {
    pub fn validation(kind: ValidationKind, detail: impl Into<String>) -> Self {
        Self::Validation(kind, detail.into())
    }

    pub fn validation_other(detail: impl Into<String>) -> Self {
        let detail = detail.into();
        Self::Validation(ValidationKind::Other(detail.clone()), detail)
    }

    pub fn invalid_state(detail: impl Into<String>) -> Self {
        Self::InvalidState(detail.into())
    }

    pub fn not_found(kind: NotFoundKind, detail: impl Into<String>) -> Self {
        Self::NotFound(kind, detail.into())
    }

    /// The validation kind, if this is a validation error.
    pub fn validation_kind(&self) -> Option<&ValidationKind> {
        match self {
            DomainError::Validation(kind, _) => Some(kind),
            _ => None,
        }
    }
}
