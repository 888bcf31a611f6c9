//! Win conditions.

use crate::domain::roles::{Role, Team};
use crate::domain::state::GameState;

/// Villagers win when every werewolf is dead; werewolves win once they
/// match or outnumber everyone else alive.
pub fn check_winner(state: &GameState) -> Option<Team> {
    let wolves = state.alive_with_role(Role::Werewolf).count();
    let others = state.alive_seats().count() - wolves;
    if wolves == 0 {
        Some(Team::Villagers)
    } else if wolves >= others {
        Some(Team::Werewolves)
    } else {
        None
    }
}
