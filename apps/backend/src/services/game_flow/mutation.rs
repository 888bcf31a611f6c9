//! State mutations shared by the driver and the human submission paths.
//! Everything here runs under the turn lock.

use serde_json::json;
use tracing::{debug, info};

use super::GameFlowService;
use crate::domain::actions::{DeathCause, DeathSet, NightActionRecord, VoteChoice, WitchPotion};
use crate::domain::log::{Channel, LogKind, NewLogEntry};
use crate::domain::resolver::{apply_hunter_shot, apply_vote, hunter_owed_shot, seer_check, validate_vote};
use crate::domain::roles::Role;
use crate::domain::state::{GameState, SeatNo, SeerCheck};
use crate::domain::victory::check_winner;
use crate::error::AppError;
use crate::errors::domain::ValidationKind;
use crate::events::{GameEvent, NightResult, Visibility};

fn death_line(seat: SeatNo, cause: DeathCause) -> String {
    match cause {
        DeathCause::Werewolf | DeathCause::Poison => format!("Seat {seat} died during the night."),
        DeathCause::Vote => format!("Seat {seat} was voted out."),
        DeathCause::HunterShot => format!("Seat {seat} was shot by the hunter."),
    }
}

impl GameFlowService {
    /// Seats controlled by the engine cannot be driven from outside.
    pub(super) fn require_human(&self, state: &GameState, seat: SeatNo) -> Result<(), AppError> {
        let actor = state.require_seat(seat)?;
        if actor.is_human {
            Ok(())
        } else {
            Err(AppError::invalid(
                ValidationKind::Other("AI_CONTROLLED_SEAT".into()),
                format!("seat {seat} is played by the AI"),
            ))
        }
    }

    /// Log and broadcast deaths that were just applied.
    pub(super) fn reveal_deaths(&self, state: &mut GameState, applied: &DeathSet) {
        for (&seat, &cause) in applied {
            state.append_log(
                NewLogEntry::public(LogKind::Death, Some(seat), death_line(seat, cause)),
            );
            info!(room_id = self.room_id, seat, day = state.day_number, "seat died");
            self.emit_public(GameEvent::Death {
                seat,
                day: state.day_number,
            });
        }
    }

    /// Store a validated night (or hunter) record and tell the actor what happened.
    pub(super) fn apply_night_record(
        &self,
        state: &mut GameState,
        record: NightActionRecord,
    ) -> Result<(), AppError> {
        let seat = record.actor_seat;
        let mut result = NightResult::ActionAccepted {
            action: record.action(),
        };

        match (record.role, record.target_seat) {
            (Role::Werewolf, target) => {
                let line = match target {
                    Some(t) => format!("The pack chose seat {t}."),
                    None => "The pack chose nobody tonight.".to_string(),
                };
                state.append_log(NewLogEntry::private(
                    LogKind::Skill,
                    Channel::Werewolf,
                    Some(seat),
                    line,
                ));
            }
            (Role::Seer, Some(target)) => {
                let is_werewolf = seer_check(state, target)?;
                state.seer_checks.push(SeerCheck {
                    day: state.day_number,
                    seer: seat,
                    target,
                    is_werewolf,
                });
                let verdict = if is_werewolf { "a werewolf" } else { "not a werewolf" };
                state.append_log(
                    NewLogEntry::private(
                        LogKind::Skill,
                        Channel::Seat(seat),
                        Some(seat),
                        format!("Seat {target} is {verdict}."),
                    )
                    .with_metadata(json!({ "target": target, "is_werewolf": is_werewolf })),
                );
                result = NightResult::SeerResult {
                    target,
                    is_werewolf,
                };
            }
            (Role::Witch, Some(target)) => {
                let line = match record.sub_action {
                    Some(WitchPotion::Save) => format!("You used the antidote on seat {target}."),
                    Some(WitchPotion::Poison) => format!("You poisoned seat {target}."),
                    None => String::new(),
                };
                if let Some(witch) = state.seat_mut(seat) {
                    match record.sub_action {
                        Some(WitchPotion::Save) => witch.skills.antidote_used = true,
                        Some(WitchPotion::Poison) => witch.skills.poison_used = true,
                        None => {}
                    }
                }
                if !line.is_empty() {
                    state.append_log(NewLogEntry::private(
                        LogKind::Skill,
                        Channel::Seat(seat),
                        Some(seat),
                        line,
                    ));
                }
            }
            (Role::Hunter, target) => {
                if let Some(hunter) = state.seat_mut(seat) {
                    hunter.skills.shot_used = true;
                }
                let line = match target {
                    Some(t) => format!("The hunter in seat {seat} fires at seat {t}."),
                    None => format!("The hunter in seat {seat} holds fire."),
                };
                state.append_log(NewLogEntry::public(LogKind::Skill, Some(seat), line));
            }
            // seer or witch chose to do nothing
            _ => {}
        }

        debug!(
            room_id = self.room_id,
            seat,
            role = %record.role,
            target = record.target_seat,
            "night action recorded"
        );
        state.night_actions.insert(record.role, record);
        state.waiting_for_human_input = false;
        self.emit(
            Visibility::seat(seat),
            GameEvent::NightActionResult { seat, result },
        );
        Ok(())
    }

    /// Record a vote, overwriting an earlier one by the same seat.
    pub(super) fn record_vote(
        &self,
        state: &mut GameState,
        voter: SeatNo,
        choice: VoteChoice,
    ) -> Result<(), AppError> {
        validate_vote(state, voter, choice)?;
        let replaced = state.votes.insert(voter, choice).is_some();
        let votes_needed = state.alive_seats().count();
        let votes_cast = votes_needed - state.outstanding_voters().len();
        debug!(room_id = self.room_id, voter, ?choice, replaced, votes_cast, "vote recorded");
        self.emit_public(GameEvent::VoteUpdate {
            voter,
            choice,
            votes_cast,
            votes_needed,
        });
        Ok(())
    }

    /// Close the vote: tally, eliminate, check for a hunter and a winner.
    pub(super) fn resolve_vote(&self, state: &mut GameState) -> Result<(), AppError> {
        let votes = state.votes.clone();
        let outcome = apply_vote(state, &votes);

        let summary = match (outcome.eliminated, outcome.is_tie) {
            (Some(seat), _) => format!("The village voted out seat {seat}."),
            (None, true) => "The vote is tied. Nobody is eliminated.".to_string(),
            (None, false) => "Everyone abstained. Nobody is eliminated.".to_string(),
        };
        state.append_log(
            NewLogEntry::public(LogKind::Vote, None, summary).with_metadata(json!({
                "votes": votes,
                "tally": outcome.tally,
                "abstentions": outcome.abstentions,
                "eliminated": outcome.eliminated,
                "is_tie": outcome.is_tie,
            })),
        );
        info!(
            room_id = self.room_id,
            day = state.day_number,
            eliminated = outcome.eliminated,
            is_tie = outcome.is_tie,
            "vote closed"
        );
        self.emit_public(GameEvent::VoteResult {
            tally: outcome.tally.clone(),
            abstentions: outcome.abstentions,
            eliminated: outcome.eliminated,
            is_tie: outcome.is_tie,
        });

        state.eliminated_today = outcome.eliminated;
        if let Some(seat) = outcome.eliminated {
            let applied = state.apply_deaths(&DeathSet::from([(seat, DeathCause::Vote)]));
            self.reveal_deaths(state, &applied);
            state.pending_hunter = hunter_owed_shot(state, &applied, &self.config.rules);
        }
        state.last_vote = Some(outcome);
        state.winner = check_winner(state);
        Ok(())
    }

    /// Apply the hunter's shot (if any) and clear the pending hunter.
    pub(super) fn resolve_hunter_shot(&self, state: &mut GameState) {
        let shooter = state.pending_hunter.take();
        let record = state
            .night_actions
            .get(&Role::Hunter)
            .copied()
            .filter(|r| Some(r.actor_seat) == shooter);
        if let Some(record) = record {
            let deaths = apply_hunter_shot(state, &record);
            let applied = state.apply_deaths(&deaths);
            self.reveal_deaths(state, &applied);
        }
        state.winner = check_winner(state);
    }
}
