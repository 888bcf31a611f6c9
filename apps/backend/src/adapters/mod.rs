//! Adapters for external dependencies.

pub mod game_states_sea;
