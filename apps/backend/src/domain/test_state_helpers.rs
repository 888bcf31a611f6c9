//! Test-only game state helpers for domain unit tests.

use crate::domain::actions::{DeathCause, DeathSet};
use crate::domain::roles::Role;
use crate::domain::state::{setup_seats, GameState, Phase, SeatNo, SeatSpec, SubPhase};

/// Fixed table layout: werewolves first, then seer, hunter, witch, villagers.
///
/// 10 seats → wolves 1-3, seer 4, hunter 5, witch 6, villagers 7-10.
/// 6 seats → wolves 1-2, seer 3, witch 4, villagers 5-6.
pub fn standard_roles(n: usize) -> Vec<Role> {
    let wolves = (n / 3).max(1);
    let mut roles = vec![Role::Werewolf; wolves];
    roles.push(Role::Seer);
    if n >= 8 {
        roles.push(Role::Hunter);
    }
    if n >= 6 {
        roles.push(Role::Witch);
    }
    roles.resize(n, Role::Villager);
    roles
}

/// All-AI started game with the given roles in seat order.
pub fn table_with(roles: &[Role]) -> GameState {
    let specs: Vec<SeatSpec> = roles
        .iter()
        .enumerate()
        .map(|(i, &role)| SeatSpec::ai(i as SeatNo + 1).with_role(role))
        .collect();
    let mut state = GameState::new(1, 7);
    state.seats = setup_seats(&specs, None, 7).expect("valid test table");
    state.is_started = true;
    state
}

pub fn standard_table(n: usize) -> GameState {
    table_with(&standard_roles(n))
}

pub fn kill(state: &mut GameState, seat: SeatNo) {
    state.apply_deaths(&DeathSet::from([(seat, DeathCause::Werewolf)]));
}

pub fn at(state: &mut GameState, phase: Phase, sub_phase: Option<SubPhase>) {
    state.phase = phase;
    state.sub_phase = sub_phase;
}
