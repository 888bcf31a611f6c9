//! AI seats: context building, decision gateways and fallbacks.
//!
//! This module provides:
//! - `DecisionGateway`, the boundary to a text generation backend
//! - `AiContext`, the per-call role-scoped view of a game
//! - `HeuristicGateway`: deterministic local play (seedable for tests)
//! - `ChatCompletionsGateway`: OpenAI-compatible HTTP backend
//! - role-default fallbacks for failed calls

pub mod chat_completions;
pub mod config;
pub mod context;
pub mod fallback;
pub mod heuristic;
pub mod registry;
mod trait_def;

pub use chat_completions::ChatCompletionsGateway;
pub use config::AiConfig;
pub use context::{build_context, AiContext, DecisionTask};
pub use fallback::{default_action, fallback_speech};
pub use heuristic::HeuristicGateway;
pub use registry::{build_gateway, by_name, registered_gateways};
pub use trait_def::{AiError, DecisionGateway, TextStream};
