//! Phase step table.
//!
//! `next_step` is evaluated after the orchestrator has resolved whatever the
//! leaving step decided (deaths, vote, shot) and stored `winner`,
//! `pending_hunter` and `eliminated_today` on the state.

use crate::domain::roles::Role;
use crate::domain::rules::RuleToggles;
use crate::domain::state::{GameState, Phase, SubPhase};

/// Where the machine goes next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub phase: Phase,
    pub sub_phase: Option<SubPhase>,
}

impl Step {
    pub const fn new(phase: Phase, sub_phase: Option<SubPhase>) -> Self {
        Self { phase, sub_phase }
    }

    pub const fn game_over() -> Self {
        Self::new(Phase::Result, Some(SubPhase::GameOver))
    }
}

const NIGHT_ORDER: [SubPhase; 3] = [SubPhase::Werewolf, SubPhase::Seer, SubPhase::Witch];

/// Whether a night sub-phase has anybody to act.
pub fn night_sub_phase_runnable(state: &GameState, sub: SubPhase) -> bool {
    match sub {
        SubPhase::Werewolf => state.alive_with_role(Role::Werewolf).next().is_some(),
        SubPhase::Seer => state.alive_with_role(Role::Seer).next().is_some(),
        SubPhase::Witch => state.alive_with_role(Role::Witch).any(|s| s.has_potion()),
        _ => false,
    }
}

/// First runnable night sub-phase after `after` (or from the start).
pub fn next_night_sub_phase(state: &GameState, after: Option<SubPhase>) -> Option<SubPhase> {
    let start = match after {
        Some(sub) => NIGHT_ORDER.iter().position(|s| *s == sub).map_or(NIGHT_ORDER.len(), |i| i + 1),
        None => 0,
    };
    NIGHT_ORDER[start..]
        .iter()
        .copied()
        .find(|&sub| night_sub_phase_runnable(state, sub))
}

fn night_or_dawn(state: &GameState, after: Option<SubPhase>) -> Step {
    match next_night_sub_phase(state, after) {
        Some(sub) => Step::new(Phase::Night, Some(sub)),
        None => Step::new(Phase::Dawn, None),
    }
}

fn after_deaths(state: &GameState, otherwise: Step) -> Step {
    if state.winner.is_some() {
        Step::game_over()
    } else if state.pending_hunter.is_some() {
        Step::new(state.phase, Some(SubPhase::Hunter))
    } else {
        otherwise
    }
}

/// Next step from the current one.
pub fn next_step(state: &GameState, rules: &RuleToggles) -> Step {
    let announcement = Step::new(Phase::Day, Some(SubPhase::Announcement));
    let continue_ = Step::new(Phase::Result, Some(SubPhase::Continue));
    match (state.phase, state.sub_phase) {
        (Phase::Waiting, _) => night_or_dawn(state, None),
        (Phase::Night, sub) => night_or_dawn(state, sub),
        (Phase::Dawn, None) => after_deaths(state, announcement),
        (Phase::Dawn, Some(_)) => {
            if state.winner.is_some() {
                Step::game_over()
            } else {
                announcement
            }
        }
        (Phase::Day, Some(SubPhase::Announcement)) => {
            Step::new(Phase::Day, Some(SubPhase::Discussion))
        }
        (Phase::Day, Some(SubPhase::Discussion)) => Step::new(Phase::Day, Some(SubPhase::Vote)),
        (Phase::Day, Some(SubPhase::Vote)) => {
            if state.winner.is_some() {
                Step::game_over()
            } else if rules.last_words && state.eliminated_today.is_some() {
                Step::new(Phase::Day, Some(SubPhase::LastWords))
            } else {
                after_deaths(state, continue_)
            }
        }
        (Phase::Day, Some(SubPhase::LastWords)) => after_deaths(state, continue_),
        (Phase::Day, _) => {
            if state.winner.is_some() {
                Step::game_over()
            } else {
                continue_
            }
        }
        (Phase::Result, Some(SubPhase::GameOver)) => Step::game_over(),
        (Phase::Result, _) => night_or_dawn(state, None),
    }
}
