#![deny(clippy::wildcard_imports)]
#![cfg_attr(test, allow(clippy::wildcard_imports))]

pub mod adapters;
pub mod ai;
pub mod config;
pub mod domain;
pub mod entities;
pub mod error;
pub mod errors;
pub mod events;
pub mod repos;
pub mod services;
pub mod state;

// Re-exports for public API
pub use ai::{AiConfig, DecisionGateway, HeuristicGateway};
pub use config::GameConfig;
pub use error::AppError;
pub use events::{EventEnvelope, EventHub, GameEvent, Visibility};
pub use repos::{GameStateRepo, InMemoryGameStates, SeaGameStates};
pub use services::{RoomRegistry, Subscription};
pub use state::{build_state, AppState, StateBuilder};

// Auto-initialize logging for unit tests
#[cfg(test)]
#[ctor::ctor]
fn init_test_logging() {
    backend_test_support::logging::init();
}
