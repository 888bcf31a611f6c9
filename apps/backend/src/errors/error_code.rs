//! Error codes surfaced to callers of the engine.
//!
//! Add new codes here; never pass ad-hoc strings as error codes.
//! All codes are SCREAMING_SNAKE_CASE and map 1:1 to the strings the
//! (excluded) API layer sends to clients.

use core::fmt;

use super::domain::{NotFoundKind, ValidationKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Action validation
    /// Action sent outside its phase
    PhaseMismatch,
    /// Not this seat's turn
    OutOfTurn,
    /// Seat's role cannot do this
    NotYourRole,
    /// Acting seat is dead
    ActorDead,
    /// Target seat is dead
    TargetDead,
    /// Target not allowed
    InvalidTarget,
    /// Seat already acted this round
    AlreadyActed,
    /// Once-per-game skill already used
    SkillUsed,
    /// Witch tried to save and poison the same seat
    SaveAndPoisonSameSeat,
    /// Antidote aimed at someone other than tonight's victim
    SaveNotOnVictim,
    /// Speech content empty
    EmptySpeech,
    /// Seat number not in this game
    InvalidSeat,
    /// General validation error
    ValidationError,

    // Lifecycle
    /// Game already started
    GameAlreadyStarted,
    /// Game not running
    GameNotRunning,
    /// Pause/resume toggled into the state it is already in
    PauseStateUnchanged,
    /// Generic invalid state
    InvalidState,

    // Resource Not Found
    RoomNotFound,
    SeatNotFound,
    SavedGameNotFound,
    NotFound,

    // System Errors
    /// Generation backend failed or timed out
    GenerationFailure,
    /// Persistence collaborator failed
    PersistenceFailure,
    /// Saved state was written by someone else in between
    OptimisticLock,
    ConfigError,
    RoomClosed,
    InternalError,
}

impl ErrorCode {
    /// Returns the canonical SCREAMING_SNAKE_CASE string for this error code.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PhaseMismatch => "PHASE_MISMATCH",
            Self::OutOfTurn => "OUT_OF_TURN",
            Self::NotYourRole => "NOT_YOUR_ROLE",
            Self::ActorDead => "ACTOR_DEAD",
            Self::TargetDead => "TARGET_DEAD",
            Self::InvalidTarget => "INVALID_TARGET",
            Self::AlreadyActed => "ALREADY_ACTED",
            Self::SkillUsed => "SKILL_USED",
            Self::SaveAndPoisonSameSeat => "SAVE_AND_POISON_SAME_SEAT",
            Self::SaveNotOnVictim => "SAVE_NOT_ON_VICTIM",
            Self::EmptySpeech => "EMPTY_SPEECH",
            Self::InvalidSeat => "INVALID_SEAT",
            Self::ValidationError => "VALIDATION_ERROR",

            Self::GameAlreadyStarted => "GAME_ALREADY_STARTED",
            Self::GameNotRunning => "GAME_NOT_RUNNING",
            Self::PauseStateUnchanged => "PAUSE_STATE_UNCHANGED",
            Self::InvalidState => "INVALID_STATE",

            Self::RoomNotFound => "ROOM_NOT_FOUND",
            Self::SeatNotFound => "SEAT_NOT_FOUND",
            Self::SavedGameNotFound => "SAVED_GAME_NOT_FOUND",
            Self::NotFound => "NOT_FOUND",

            Self::GenerationFailure => "GENERATION_FAILURE",
            Self::PersistenceFailure => "PERSISTENCE_FAILURE",
            Self::OptimisticLock => "OPTIMISTIC_LOCK",
            Self::ConfigError => "CONFIG_ERROR",
            Self::RoomClosed => "ROOM_CLOSED",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<&ValidationKind> for ErrorCode {
    fn from(kind: &ValidationKind) -> Self {
        match kind {
            ValidationKind::PhaseMismatch => Self::PhaseMismatch,
            ValidationKind::OutOfTurn => Self::OutOfTurn,
            ValidationKind::NotYourRole => Self::NotYourRole,
            ValidationKind::ActorDead => Self::ActorDead,
            ValidationKind::TargetDead => Self::TargetDead,
            ValidationKind::InvalidTarget => Self::InvalidTarget,
            ValidationKind::AlreadyActed => Self::AlreadyActed,
            ValidationKind::SkillUsed => Self::SkillUsed,
            ValidationKind::SaveAndPoisonSameSeat => Self::SaveAndPoisonSameSeat,
            ValidationKind::SaveNotOnVictim => Self::SaveNotOnVictim,
            ValidationKind::EmptySpeech => Self::EmptySpeech,
            ValidationKind::UnknownSeat => Self::InvalidSeat,
            ValidationKind::Other(_) => Self::ValidationError,
        }
    }
}

impl From<&NotFoundKind> for ErrorCode {
    fn from(kind: &NotFoundKind) -> Self {
        match kind {
            NotFoundKind::Room => Self::RoomNotFound,
            NotFoundKind::Seat => Self::SeatNotFound,
            NotFoundKind::SavedGame => Self::SavedGameNotFound,
            NotFoundKind::Other(_) => Self::NotFound,
        }
    }
}
