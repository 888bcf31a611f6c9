//! Decision gateway trait definition.

use std::fmt;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::ai::context::AiContext;
use crate::domain::{Action, Role};

/// Errors that can occur during AI decision-making.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AiError {
    /// Backend did not answer within the soft timeout
    Timeout,
    /// Backend unreachable or returned a non-success status
    Transport(String),
    /// Backend answered with something that could not be parsed
    Malformed(String),
    /// Backend produced an action the rules reject
    InvalidMove(String),
    /// Gateway-side failure
    Internal(String),
}

impl fmt::Display for AiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AiError::Timeout => write!(f, "AI decision timeout"),
            AiError::Transport(msg) => write!(f, "AI transport error: {msg}"),
            AiError::Malformed(msg) => write!(f, "AI malformed reply: {msg}"),
            AiError::InvalidMove(msg) => write!(f, "AI invalid move: {msg}"),
            AiError::Internal(msg) => write!(f, "AI internal error: {msg}"),
        }
    }
}

impl std::error::Error for AiError {}

impl AiError {
    /// Short machine-readable reason used in fallback markers.
    pub const fn reason(&self) -> &'static str {
        match self {
            AiError::Timeout => "timeout",
            AiError::Transport(_) => "transport",
            AiError::Malformed(_) => "malformed",
            AiError::InvalidMove(_) => "invalid_move",
            AiError::Internal(_) => "internal",
        }
    }
}

/// Lazy, finite, non-restartable sequence of narration chunks.
pub type TextStream = BoxStream<'static, Result<String, AiError>>;

/// Boundary to the text generation backend.
///
/// Implementations must be callable concurrently from many rooms and must
/// surface every failure as an `AiError`.
#[async_trait]
pub trait DecisionGateway: Send + Sync {
    /// Stable gateway name for logs.
    fn name(&self) -> &'static str;

    /// Pick a structured action for `role` given `ctx.task`.
    async fn decide(&self, role: Role, ctx: &AiContext) -> Result<Action, AiError>;

    /// Produce free text (speech, last words, night chat) as a chunk stream.
    async fn narrate(&self, role: Role, ctx: &AiContext) -> Result<TextStream, AiError>;
}
