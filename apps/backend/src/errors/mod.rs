//! Error handling for the werewolf engine.

pub mod domain;
pub mod error_code;

pub use domain::{DomainError, NotFoundKind, ValidationKind};
pub use error_code::ErrorCode;
