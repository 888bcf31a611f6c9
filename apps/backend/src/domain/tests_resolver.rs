//! Unit tests for night action, vote and hunter resolution.

use std::collections::BTreeMap;

use crate::domain::actions::{
    Action, DeathCause, NightActionRecord, VoteChoice, WitchPotion,
};
use crate::domain::resolver::{
    apply_hunter_shot, apply_night_actions, apply_vote, can_hunter_shoot, hunter_owed_shot,
    validate_hunter_shot, validate_night_action, validate_speech, validate_vote,
};
use crate::domain::roles::Role;
use crate::domain::rules::RuleToggles;
use crate::domain::state::{Phase, SeatNo, SubPhase};
use crate::domain::test_state_helpers::{at, kill, standard_table};
use crate::errors::domain::ValidationKind;

fn kind_of<T: std::fmt::Debug>(r: Result<T, crate::errors::domain::DomainError>) -> ValidationKind {
    r.expect_err("expected a validation error")
        .validation_kind()
        .cloned()
        .expect("validation kind")
}

fn kill_record(target: SeatNo) -> NightActionRecord {
    NightActionRecord {
        role: Role::Werewolf,
        actor_seat: 1,
        target_seat: Some(target),
        sub_action: None,
    }
}

fn witch_record(potion: WitchPotion, target: SeatNo) -> NightActionRecord {
    NightActionRecord {
        role: Role::Witch,
        actor_seat: 6,
        target_seat: Some(target),
        sub_action: Some(potion),
    }
}

fn votes(pairs: &[(SeatNo, VoteChoice)]) -> BTreeMap<SeatNo, VoteChoice> {
    pairs.iter().copied().collect()
}

#[test]
fn saved_victim_survives() {
    let state = standard_table(10);
    let deaths = apply_night_actions(
        &state,
        &[kill_record(7), witch_record(WitchPotion::Save, 7)],
    )
    .unwrap();
    assert!(deaths.is_empty());
}

#[test]
fn poison_is_independent_of_kill() {
    let state = standard_table(10);
    let deaths = apply_night_actions(
        &state,
        &[kill_record(7), witch_record(WitchPotion::Poison, 8)],
    )
    .unwrap();
    assert_eq!(deaths.get(&7), Some(&DeathCause::Werewolf));
    assert_eq!(deaths.get(&8), Some(&DeathCause::Poison));
}

#[test]
fn save_and_poison_same_seat_rejected() {
    let state = standard_table(10);
    let result = apply_night_actions(
        &state,
        &[
            kill_record(7),
            witch_record(WitchPotion::Save, 7),
            witch_record(WitchPotion::Poison, 7),
        ],
    );
    assert_eq!(kind_of(result), ValidationKind::SaveAndPoisonSameSeat);
}

#[test]
fn duplicate_kill_records_rejected() {
    let state = standard_table(10);
    let result = apply_night_actions(&state, &[kill_record(7), kill_record(8)]);
    assert_eq!(kind_of(result), ValidationKind::AlreadyActed);
}

#[test]
fn skipped_kill_means_no_deaths() {
    let state = standard_table(10);
    let deaths =
        apply_night_actions(&state, &[NightActionRecord::skipped(Role::Werewolf, 1)]).unwrap();
    assert!(deaths.is_empty());
}

#[test]
fn night_action_outside_sub_phase_is_phase_mismatch() {
    let rules = RuleToggles::default();
    let mut state = standard_table(10);
    at(&mut state, Phase::Night, Some(SubPhase::Werewolf));
    let result = validate_night_action(&state, 4, Action::Check { target: 1 }, &rules);
    assert_eq!(kind_of(result), ValidationKind::PhaseMismatch);

    at(&mut state, Phase::Day, Some(SubPhase::Vote));
    let result = validate_night_action(&state, 1, Action::Kill { target: 7 }, &rules);
    assert_eq!(kind_of(result), ValidationKind::PhaseMismatch);
}

#[test]
fn wrong_role_is_rejected() {
    let rules = RuleToggles::default();
    let mut state = standard_table(10);
    at(&mut state, Phase::Night, Some(SubPhase::Werewolf));
    let result = validate_night_action(&state, 7, Action::Kill { target: 8 }, &rules);
    assert_eq!(kind_of(result), ValidationKind::NotYourRole);
    let result = validate_night_action(&state, 7, Action::Skip, &rules);
    assert_eq!(kind_of(result), ValidationKind::NotYourRole);
}

#[test]
fn only_pack_leader_kills() {
    let rules = RuleToggles::default();
    let mut state = standard_table(10);
    at(&mut state, Phase::Night, Some(SubPhase::Werewolf));
    let result = validate_night_action(&state, 2, Action::Kill { target: 8 }, &rules);
    assert_eq!(kind_of(result), ValidationKind::OutOfTurn);
    let record = validate_night_action(&state, 1, Action::Kill { target: 8 }, &rules).unwrap();
    assert_eq!(record.target_seat, Some(8));
}

#[test]
fn dead_actor_and_dead_target_are_rejected() {
    let rules = RuleToggles::default();
    let mut state = standard_table(10);
    at(&mut state, Phase::Night, Some(SubPhase::Werewolf));
    kill(&mut state, 8);
    let result = validate_night_action(&state, 1, Action::Kill { target: 8 }, &rules);
    assert_eq!(kind_of(result), ValidationKind::TargetDead);

    at(&mut state, Phase::Night, Some(SubPhase::Seer));
    kill(&mut state, 4);
    let result = validate_night_action(&state, 4, Action::Check { target: 1 }, &rules);
    assert_eq!(kind_of(result), ValidationKind::ActorDead);
}

#[test]
fn acting_twice_is_rejected() {
    let rules = RuleToggles::default();
    let mut state = standard_table(10);
    at(&mut state, Phase::Night, Some(SubPhase::Seer));
    let record = validate_night_action(&state, 4, Action::Check { target: 1 }, &rules).unwrap();
    state.night_actions.insert(Role::Seer, record);
    let result = validate_night_action(&state, 4, Action::Check { target: 2 }, &rules);
    assert_eq!(kind_of(result), ValidationKind::AlreadyActed);
}

#[test]
fn witch_save_rules() {
    let rules = RuleToggles::default();
    let mut state = standard_table(10);
    state.night_actions.insert(Role::Werewolf, kill_record(7));
    at(&mut state, Phase::Night, Some(SubPhase::Witch));

    let result = validate_night_action(&state, 6, Action::Save { target: 8 }, &rules);
    assert_eq!(kind_of(result), ValidationKind::SaveNotOnVictim);

    let record = validate_night_action(&state, 6, Action::Save { target: 7 }, &rules).unwrap();
    assert_eq!(record.sub_action, Some(WitchPotion::Save));

    state.seats[5].skills.antidote_used = true;
    let result = validate_night_action(&state, 6, Action::Save { target: 7 }, &rules);
    assert_eq!(kind_of(result), ValidationKind::SkillUsed);
}

#[test]
fn witch_self_save_needs_toggle() {
    let mut state = standard_table(10);
    state.night_actions.insert(Role::Werewolf, kill_record(6));
    at(&mut state, Phase::Night, Some(SubPhase::Witch));

    let strict = RuleToggles::default();
    let result = validate_night_action(&state, 6, Action::Save { target: 6 }, &strict);
    assert_eq!(kind_of(result), ValidationKind::InvalidTarget);

    let lenient = RuleToggles {
        witch_self_save: true,
        ..RuleToggles::default()
    };
    assert!(validate_night_action(&state, 6, Action::Save { target: 6 }, &lenient).is_ok());
}

#[test]
fn plurality_vote_eliminates() {
    let mut state = standard_table(4);
    at(&mut state, Phase::Day, Some(SubPhase::Vote));
    let outcome = apply_vote(
        &state,
        &votes(&[
            (1, VoteChoice::Target(2)),
            (2, VoteChoice::Target(3)),
            (3, VoteChoice::Target(2)),
            (4, VoteChoice::Abstain),
        ]),
    );
    assert_eq!(outcome.eliminated, Some(2));
    assert!(!outcome.is_tie);
    assert_eq!(outcome.tally.get(&2), Some(&2));
    assert_eq!(outcome.abstentions, 1);
}

#[test]
fn tied_vote_eliminates_nobody() {
    let state = standard_table(4);
    let outcome = apply_vote(
        &state,
        &votes(&[
            (1, VoteChoice::Target(2)),
            (2, VoteChoice::Target(3)),
            (3, VoteChoice::Target(2)),
            (4, VoteChoice::Target(3)),
        ]),
    );
    assert_eq!(outcome.eliminated, None);
    assert!(outcome.is_tie);
}

#[test]
fn all_abstain_is_no_elimination_without_tie() {
    let state = standard_table(4);
    let outcome = apply_vote(
        &state,
        &votes(&[(1, VoteChoice::Abstain), (2, VoteChoice::Abstain)]),
    );
    assert_eq!(outcome.eliminated, None);
    assert!(!outcome.is_tie);
}

#[test]
fn vote_validation() {
    let mut state = standard_table(4);
    assert_eq!(
        kind_of(validate_vote(&state, 1, VoteChoice::Target(2))),
        ValidationKind::PhaseMismatch
    );
    at(&mut state, Phase::Day, Some(SubPhase::Vote));
    kill(&mut state, 3);
    assert_eq!(
        kind_of(validate_vote(&state, 1, VoteChoice::Target(3))),
        ValidationKind::TargetDead
    );
    assert_eq!(
        kind_of(validate_vote(&state, 3, VoteChoice::Abstain)),
        ValidationKind::ActorDead
    );
    assert_eq!(
        kind_of(validate_vote(&state, 9, VoteChoice::Abstain)),
        ValidationKind::UnknownSeat
    );
    assert!(validate_vote(&state, 1, VoteChoice::Target(1)).is_ok());
}

#[test]
fn speech_validation() {
    let mut state = standard_table(4);
    at(&mut state, Phase::Day, Some(SubPhase::Discussion));
    state.current_speaker_seat = Some(2);
    assert_eq!(
        kind_of(validate_speech(&state, 1, "hi")),
        ValidationKind::OutOfTurn
    );
    assert_eq!(
        kind_of(validate_speech(&state, 2, "   ")),
        ValidationKind::EmptySpeech
    );
    assert!(validate_speech(&state, 2, "I am a villager").is_ok());
}

#[test]
fn hunter_shot_rules() {
    let rules = RuleToggles::default();
    let mut state = standard_table(10);
    kill(&mut state, 5);
    let hunter = state.seat(5).unwrap().clone();
    assert!(can_hunter_shoot(&hunter, &rules));

    at(&mut state, Phase::Dawn, Some(SubPhase::Hunter));
    state.pending_hunter = Some(5);
    assert_eq!(
        kind_of(validate_hunter_shot(&state, 5, Action::Shoot { target: 5 })),
        ValidationKind::InvalidTarget
    );
    assert_eq!(
        kind_of(validate_hunter_shot(&state, 4, Action::Shoot { target: 1 })),
        ValidationKind::NotYourRole
    );
    let record = validate_hunter_shot(&state, 5, Action::Shoot { target: 1 }).unwrap();
    let deaths = apply_hunter_shot(&state, &record);
    assert_eq!(deaths.get(&1), Some(&DeathCause::HunterShot));
}

#[test]
fn poisoned_hunter_cannot_shoot_by_default() {
    let mut state = standard_table(10);
    let deaths = apply_night_actions(&state, &[witch_record(WitchPotion::Poison, 5)]).unwrap();
    state.apply_deaths(&deaths);
    assert_eq!(hunter_owed_shot(&state, &deaths, &RuleToggles::default()), None);
    let lenient = RuleToggles {
        hunter_shoots_when_poisoned: true,
        ..RuleToggles::default()
    };
    assert_eq!(hunter_owed_shot(&state, &deaths, &lenient), Some(5));
}
