//! Role action validation and resolution.
//!
//! Everything here is pure: functions read a `GameState` snapshot and return
//! records, death sets or typed validation errors. Applying the results is the
//! orchestrator's job.

use std::collections::{BTreeMap, BTreeSet};

use crate::domain::actions::{
    Action, DeathCause, DeathSet, NightActionRecord, VoteChoice, VoteOutcome, WitchPotion,
};
use crate::domain::roles::Role;
use crate::domain::rules::RuleToggles;
use crate::domain::state::{GameState, Phase, Seat, SeatNo, SubPhase};
use crate::errors::domain::{DomainError, ValidationKind};

fn err(kind: ValidationKind, detail: impl Into<String>) -> DomainError {
    DomainError::validation(kind, detail)
}

fn require_alive_actor(state: &GameState, seat: SeatNo) -> Result<&Seat, DomainError> {
    let actor = state.require_seat(seat)?;
    if !actor.is_alive {
        return Err(err(ValidationKind::ActorDead, format!("seat {seat} is dead")));
    }
    Ok(actor)
}

fn require_alive_target(state: &GameState, target: SeatNo) -> Result<&Seat, DomainError> {
    let seat = state.require_seat(target)?;
    if !seat.is_alive {
        return Err(err(
            ValidationKind::TargetDead,
            format!("target seat {target} is dead"),
        ));
    }
    Ok(seat)
}

/// Role an action belongs to at night.
fn night_role_for(action: &Action, actor: &Seat) -> Result<Role, DomainError> {
    match action {
        Action::Kill { .. } => Ok(Role::Werewolf),
        Action::Check { .. } => Ok(Role::Seer),
        Action::Save { .. } | Action::Poison { .. } => Ok(Role::Witch),
        Action::Skip if actor.role.has_night_action() => Ok(actor.role),
        Action::Skip => Err(err(
            ValidationKind::NotYourRole,
            format!("{} has no night action", actor.role),
        )),
        Action::Shoot { .. } | Action::Vote { .. } | Action::Abstain => Err(err(
            ValidationKind::PhaseMismatch,
            format!("'{}' is not a night action", action.name()),
        )),
    }
}

/// Validate a night action by `seat` and turn it into a record.
pub fn validate_night_action(
    state: &GameState,
    seat: SeatNo,
    action: Action,
    rules: &RuleToggles,
) -> Result<NightActionRecord, DomainError> {
    if state.phase != Phase::Night {
        return Err(err(
            ValidationKind::PhaseMismatch,
            format!("night actions are not accepted during {}", state.phase),
        ));
    }
    let actor = require_alive_actor(state, seat)?;
    let role = night_role_for(&action, actor)?;
    if actor.role != role {
        return Err(err(
            ValidationKind::NotYourRole,
            format!("seat {seat} is not a {role}"),
        ));
    }
    if state.sub_phase != SubPhase::for_night_role(role) {
        return Err(err(
            ValidationKind::PhaseMismatch,
            format!("the {role} does not act now"),
        ));
    }
    if state.night_actions.contains_key(&role) {
        return Err(err(
            ValidationKind::AlreadyActed,
            format!("the {role} already acted tonight"),
        ));
    }
    if role == Role::Werewolf && state.pack_leader() != Some(seat) {
        return Err(err(
            ValidationKind::OutOfTurn,
            format!("seat {seat} does not lead the pack tonight"),
        ));
    }

    let mut record = NightActionRecord::skipped(role, seat);
    match action {
        Action::Skip => {}
        Action::Kill { target } => {
            let victim = require_alive_target(state, target)?;
            if victim.is_werewolf() {
                return Err(err(
                    ValidationKind::InvalidTarget,
                    "werewolves cannot kill a packmate",
                ));
            }
            record.target_seat = Some(target);
        }
        Action::Check { target } => {
            require_alive_target(state, target)?;
            if target == seat {
                return Err(err(ValidationKind::InvalidTarget, "the seer cannot check their own seat"));
            }
            if state.seer_checks.iter().any(|c| c.seer == seat && c.target == target) {
                return Err(err(
                    ValidationKind::InvalidTarget,
                    format!("seat {target} was already checked"),
                ));
            }
            record.target_seat = Some(target);
        }
        Action::Save { target } => {
            if actor.skills.antidote_used {
                return Err(err(ValidationKind::SkillUsed, "the antidote is spent"));
            }
            if state.tonight_victim() != Some(target) {
                return Err(err(
                    ValidationKind::SaveNotOnVictim,
                    format!("seat {target} is not tonight's victim"),
                ));
            }
            if target == seat && !rules.witch_self_save {
                return Err(err(ValidationKind::InvalidTarget, "the witch cannot save their own seat"));
            }
            record.target_seat = Some(target);
            record.sub_action = Some(WitchPotion::Save);
        }
        Action::Poison { target } => {
            if actor.skills.poison_used {
                return Err(err(ValidationKind::SkillUsed, "the poison is spent"));
            }
            require_alive_target(state, target)?;
            if target == seat {
                return Err(err(ValidationKind::InvalidTarget, "the witch cannot poison their own seat"));
            }
            record.target_seat = Some(target);
            record.sub_action = Some(WitchPotion::Poison);
        }
        Action::Shoot { .. } | Action::Vote { .. } | Action::Abstain => {
            return Err(err(
                ValidationKind::PhaseMismatch,
                format!("'{}' is not a night action", action.name()),
            ))
        }
    }
    Ok(record)
}

/// Resolve a night's records into deaths.
///
/// The werewolf target is provisional; a witch save on exactly that seat
/// cancels it. A poison is an independent death.
pub fn apply_night_actions(
    state: &GameState,
    records: &[NightActionRecord],
) -> Result<DeathSet, DomainError> {
    let mut seen: BTreeSet<(Role, Option<WitchPotion>)> = BTreeSet::new();
    let mut kill = None;
    let mut save = None;
    let mut poison = None;

    for record in records {
        if !seen.insert((record.role, record.sub_action)) {
            return Err(err(
                ValidationKind::AlreadyActed,
                format!("duplicate {} record for the night", record.role),
            ));
        }
        match (record.role, record.sub_action) {
            (Role::Werewolf, _) => kill = record.target_seat,
            (Role::Witch, Some(WitchPotion::Save)) => save = record.target_seat,
            (Role::Witch, Some(WitchPotion::Poison)) => poison = record.target_seat,
            _ => {}
        }
    }

    if let (Some(s), Some(p)) = (save, poison) {
        if s == p {
            return Err(err(
                ValidationKind::SaveAndPoisonSameSeat,
                format!("seat {s} cannot be saved and poisoned in one night"),
            ));
        }
    }

    let alive = |seat: SeatNo| state.seat(seat).is_some_and(|s| s.is_alive);
    let mut deaths = DeathSet::new();
    if let Some(victim) = kill.filter(|&v| alive(v) && save != Some(v)) {
        deaths.insert(victim, DeathCause::Werewolf);
    }
    if let Some(victim) = poison.filter(|&v| alive(v)) {
        deaths.insert(victim, DeathCause::Poison);
    }
    Ok(deaths)
}

/// Validate a vote. Re-voting is allowed and overwrites the earlier vote.
pub fn validate_vote(state: &GameState, voter: SeatNo, choice: VoteChoice) -> Result<(), DomainError> {
    if state.step() != (Phase::Day, Some(SubPhase::Vote)) {
        return Err(err(ValidationKind::PhaseMismatch, "voting is closed"));
    }
    require_alive_actor(state, voter)?;
    if let VoteChoice::Target(target) = choice {
        require_alive_target(state, target)?;
    }
    Ok(())
}

/// Plurality vote over alive voters. A tie or an all-abstain vote eliminates nobody.
pub fn apply_vote(state: &GameState, votes: &BTreeMap<SeatNo, VoteChoice>) -> VoteOutcome {
    let alive = |seat: SeatNo| state.seat(seat).is_some_and(|s| s.is_alive);
    let mut tally: BTreeMap<SeatNo, u32> = BTreeMap::new();
    let mut abstentions = 0;
    for choice in votes.iter().filter(|(&v, _)| alive(v)).map(|(_, c)| *c) {
        match choice {
            VoteChoice::Target(target) if alive(target) => *tally.entry(target).or_insert(0) += 1,
            _ => abstentions += 1,
        }
    }

    let top = tally.values().copied().max().unwrap_or(0);
    let leaders: Vec<SeatNo> = tally
        .iter()
        .filter(|(_, &n)| n == top && top > 0)
        .map(|(&seat, _)| seat)
        .collect();

    let (eliminated, is_tie) = match leaders.as_slice() {
        [] => (None, false),
        [one] => (Some(*one), false),
        _ => (None, true),
    };
    VoteOutcome {
        tally,
        abstentions,
        eliminated,
        is_tie,
    }
}

/// Validate a speech from `seat` in the current speaking slot.
pub fn validate_speech(state: &GameState, seat: SeatNo, content: &str) -> Result<(), DomainError> {
    match state.step() {
        (Phase::Day, Some(SubPhase::Discussion)) | (Phase::Day, Some(SubPhase::LastWords)) => {}
        _ => return Err(err(ValidationKind::PhaseMismatch, "nobody is speaking now")),
    }
    state.require_seat(seat)?;
    if state.current_speaker_seat != Some(seat) {
        return Err(err(
            ValidationKind::OutOfTurn,
            format!("seat {seat} does not hold the floor"),
        ));
    }
    if content.trim().is_empty() {
        return Err(err(ValidationKind::EmptySpeech, "speech is empty"));
    }
    Ok(())
}

/// Validate night chat from a werewolf during the werewolf sub-phase.
pub fn validate_night_chat(state: &GameState, seat: SeatNo, content: &str) -> Result<(), DomainError> {
    if state.step() != (Phase::Night, Some(SubPhase::Werewolf)) {
        return Err(err(ValidationKind::PhaseMismatch, "the pack is not awake"));
    }
    let actor = require_alive_actor(state, seat)?;
    if !actor.is_werewolf() {
        return Err(err(ValidationKind::NotYourRole, format!("seat {seat} is not a werewolf")));
    }
    if content.trim().is_empty() {
        return Err(err(ValidationKind::EmptySpeech, "message is empty"));
    }
    Ok(())
}

/// True when `target` is a werewolf.
pub fn seer_check(state: &GameState, target: SeatNo) -> Result<bool, DomainError> {
    Ok(state.require_seat(target)?.is_werewolf())
}

/// Whether a dead seat is owed a revenge shot.
pub fn can_hunter_shoot(seat: &Seat, rules: &RuleToggles) -> bool {
    let poisoned = seat.death.is_some_and(|d| d.cause == DeathCause::Poison);
    seat.role == Role::Hunter
        && !seat.is_alive
        && !seat.skills.shot_used
        && (!poisoned || rules.hunter_shoots_when_poisoned)
}

/// First seat in `deaths` that may fire a revenge shot.
pub fn hunter_owed_shot(state: &GameState, deaths: &DeathSet, rules: &RuleToggles) -> Option<SeatNo> {
    deaths
        .keys()
        .filter_map(|&n| state.seat(n))
        .find(|s| can_hunter_shoot(s, rules))
        .map(|s| s.seat_number)
}

/// Validate the pending hunter's shot (or decline).
pub fn validate_hunter_shot(
    state: &GameState,
    seat: SeatNo,
    action: Action,
) -> Result<NightActionRecord, DomainError> {
    if state.sub_phase != Some(SubPhase::Hunter) {
        return Err(err(ValidationKind::PhaseMismatch, "no revenge shot is pending"));
    }
    let actor = state.require_seat(seat)?;
    if actor.role != Role::Hunter {
        return Err(err(ValidationKind::NotYourRole, format!("seat {seat} is not the hunter")));
    }
    if state.pending_hunter != Some(seat) {
        return Err(err(ValidationKind::OutOfTurn, format!("seat {seat} may not shoot now")));
    }
    if actor.skills.shot_used || state.night_actions.contains_key(&Role::Hunter) {
        return Err(err(ValidationKind::SkillUsed, "the hunter already fired"));
    }

    let mut record = NightActionRecord::skipped(Role::Hunter, seat);
    match action {
        Action::Skip => {}
        Action::Shoot { target } => {
            if target == seat {
                return Err(err(ValidationKind::InvalidTarget, "the hunter cannot shoot their own seat"));
            }
            require_alive_target(state, target)?;
            record.target_seat = Some(target);
        }
        other => {
            return Err(err(
                ValidationKind::PhaseMismatch,
                format!("'{}' is not allowed during the hunter's turn", other.name()),
            ))
        }
    }
    Ok(record)
}

/// Deaths from a hunter record.
pub fn apply_hunter_shot(state: &GameState, record: &NightActionRecord) -> DeathSet {
    record
        .target_seat
        .filter(|&t| state.seat(t).is_some_and(|s| s.is_alive))
        .map(|t| DeathSet::from([(t, DeathCause::HunterShot)]))
        .unwrap_or_default()
}
