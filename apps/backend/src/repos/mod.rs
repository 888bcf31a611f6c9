//! Repository layer: persistence collaborators used by the engine.

pub mod game_states;

pub use game_states::{GameStateRepo, InMemoryGameStates, SeaGameStates, StoredGameState};
