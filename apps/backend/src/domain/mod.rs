//! Domain layer: pure game logic types and helpers.

pub mod actions;
pub mod log;
pub mod resolver;
pub mod roles;
pub mod rules;
pub mod seed_derivation;
pub mod state;
pub mod transitions;
pub mod victory;
pub mod view;

#[cfg(test)]
mod test_prelude;
#[cfg(test)]
pub(crate) mod test_state_helpers;
#[cfg(test)]
mod tests_resolver;

// Re-exports for ergonomics
pub use actions::{Action, DeathCause, DeathSet, NightActionRecord, VoteChoice, VoteOutcome};
pub use log::{Channel, LogEntry, LogKind, NewLogEntry};
pub use roles::{Role, RoleDistribution, Team};
pub use rules::RuleToggles;
pub use state::{GameState, Phase, Seat, SeatNo, SeatSpec, SubPhase};
pub use view::{Audience, GameView, LogView};
