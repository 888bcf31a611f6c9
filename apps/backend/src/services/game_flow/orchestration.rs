use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{error, info};

use super::GameFlowService;
use crate::domain::actions::NightActionRecord;
use crate::domain::log::{LogKind, NewLogEntry};
use crate::domain::resolver::{apply_night_actions, hunter_owed_shot};
use crate::domain::roles::{Role, Team};
use crate::domain::state::{GameState, Phase, SubPhase};
use crate::domain::transitions::{next_step, Step};
use crate::domain::victory::check_winner;
use crate::error::AppError;
use crate::errors::ErrorCode;
use crate::events::GameEvent;

impl GameFlowService {
    /// Drive the room until the game is over; returns the winning team.
    ///
    /// Each iteration: pause gate, run the current step, pause gate, advance,
    /// checkpoint. A `max_days` guard turns a runaway game into an internal
    /// error instead of an endless loop.
    pub async fn run(self: Arc<Self>) -> Result<Team, AppError> {
        info!(room_id = self.room_id, "room driver started");
        loop {
            self.ctl.pause_gate().await?;
            {
                let state = self.ctl.lock().await;
                if state.is_over() {
                    let winner = state
                        .winner
                        .ok_or_else(|| AppError::internal("game ended without a winner"))?;
                    info!(room_id = self.room_id, %winner, day = state.day_number, "room driver finished");
                    return Ok(winner);
                }
                if state.day_number > self.config.max_days {
                    error!(room_id = self.room_id, day = state.day_number, "day limit exceeded");
                    return Err(AppError::internal(format!(
                        "room {} exceeded {} days",
                        self.room_id, self.config.max_days
                    )));
                }
            }

            self.run_step().await?;
            self.ctl.pause_gate().await?;
            self.advance_phase().await?;
            self.checkpoint().await?;
        }
    }

    async fn run_step(&self) -> Result<(), AppError> {
        let step = self.ctl.lock().await.step();
        match step {
            (Phase::Night, Some(SubPhase::Werewolf)) => self.run_werewolf_turn().await,
            (Phase::Night, Some(SubPhase::Seer)) => self.run_seer_turn().await,
            (Phase::Night, Some(SubPhase::Witch)) => self.run_witch_turn().await,
            (_, Some(SubPhase::Hunter)) => self.run_hunter_turn().await,
            (Phase::Day, Some(SubPhase::Announcement)) => self.run_announcement().await,
            (Phase::Day, Some(SubPhase::Discussion)) => self.run_discussion().await,
            (Phase::Day, Some(SubPhase::Vote)) => self.run_vote().await,
            (Phase::Day, Some(SubPhase::LastWords)) => self.run_last_words().await,
            // waiting room, dawn reveal and the continue marker have nothing to collect
            _ => Ok(()),
        }
    }

    pub(super) async fn advance_phase(&self) -> Result<Step, AppError> {
        let mut state = self.ctl.lock().await;
        self.advance_locked(&mut state)
    }

    /// Resolve the step being left, pick the next one and enter it.
    pub(super) fn advance_locked(&self, state: &mut GameState) -> Result<Step, AppError> {
        match state.step() {
            (Phase::Day, Some(SubPhase::Vote)) => self.resolve_vote(state)?,
            (_, Some(SubPhase::Hunter)) => self.resolve_hunter_shot(state),
            _ => {}
        }
        let next = next_step(state, &self.config.rules);
        self.enter_step(state, next)?;
        Ok(next)
    }

    fn enter_step(&self, state: &mut GameState, step: Step) -> Result<(), AppError> {
        let entering_night = step.phase == Phase::Night && state.phase != Phase::Night;
        let entering_dawn = step.phase == Phase::Dawn && step.sub_phase.is_none();

        state.phase = step.phase;
        state.sub_phase = step.sub_phase;
        state.current_speaker_seat = None;
        state.waiting_for_human_input = false;
        state.reminder_count = 0;
        if entering_night {
            state.clear_night();
        }
        if entering_dawn {
            state.nights_resolved += 1;
            state.day_number = state.nights_resolved;
        }

        info!(
            room_id = self.room_id,
            day = state.day_number,
            phase = %step.phase,
            sub_phase = step.sub_phase.map(SubPhase::as_str),
            "phase change"
        );
        self.emit_public(GameEvent::PhaseChange {
            phase: step.phase,
            sub_phase: step.sub_phase,
            day: state.day_number,
        });

        match (step.phase, step.sub_phase) {
            (Phase::Dawn, None) => self.resolve_night(state)?,
            (Phase::Day, Some(SubPhase::Announcement)) => state.clear_day(),
            (Phase::Day, Some(SubPhase::Vote)) => state.votes.clear(),
            (Phase::Result, Some(SubPhase::GameOver)) => self.finish_game(state)?,
            _ => {}
        }
        Ok(())
    }

    /// Werewolf kill, then the witch's save and poison, then deaths.
    fn resolve_night(&self, state: &mut GameState) -> Result<(), AppError> {
        let records: Vec<NightActionRecord> = state
            .night_actions
            .values()
            .filter(|r| r.role != Role::Hunter)
            .copied()
            .collect();
        let deaths = apply_night_actions(state, &records)?;
        let applied = state.apply_deaths(&deaths);
        self.reveal_deaths(state, &applied);

        state.pending_hunter = hunter_owed_shot(state, &applied, &self.config.rules);
        state.last_night_deaths = applied;
        state.winner = check_winner(state);
        info!(
            room_id = self.room_id,
            day = state.day_number,
            deaths = state.last_night_deaths.len(),
            hunter_pending = state.pending_hunter.is_some(),
            "night resolved"
        );
        Ok(())
    }

    fn finish_game(&self, state: &mut GameState) -> Result<(), AppError> {
        let winner = state
            .winner
            .or_else(|| check_winner(state))
            .ok_or_else(|| AppError::invalid_state(ErrorCode::InvalidState, "no team has won yet"))?;
        state.winner = Some(winner);
        state.waiting_for_human_input = false;

        let roles: BTreeMap<_, _> = state
            .seats
            .iter()
            .map(|s| (s.seat_number, s.role))
            .collect();
        state.append_log(NewLogEntry::public(
            LogKind::HostAnnouncement,
            None,
            format!("The game is over. The {winner} win."),
        ));
        info!(room_id = self.room_id, %winner, day = state.day_number, "game over");
        self.emit_public(GameEvent::GameOver { winner, roles });
        Ok(())
    }

    /// Persist the state at a phase boundary.
    ///
    /// On failure the room stalls: the driver waits until `retry_checkpoint`
    /// succeeds (or the room closes) and never retries on its own.
    pub(super) async fn checkpoint(&self) -> Result<(), AppError> {
        let detail = {
            let state = self.ctl.lock().await;
            match self.store.save_game_state(self.room_id, &state).await {
                Ok(()) => return Ok(()),
                Err(err) => {
                    error!(
                        room_id = self.room_id,
                        day = state.day_number,
                        phase = %state.phase,
                        error = %err,
                        "checkpoint failed; room stalled"
                    );
                    let detail = err.to_string();
                    *self.stall.lock() = Some(detail.clone());
                    self.emit_public(GameEvent::RoomStalled {
                        detail: detail.clone(),
                    });
                    detail
                }
            }
        };

        tokio::select! {
            _ = self.ctl.closed() => Err(AppError::room_closed(self.room_id)),
            _ = self.recovered.notified() => {
                info!(room_id = self.room_id, %detail, "room recovered from failed checkpoint");
                Ok(())
            }
        }
    }

    /// Save the stalled checkpoint on the caller's behalf and release the driver.
    pub async fn retry_checkpoint(&self) -> Result<(), AppError> {
        let state = self.ctl.lock().await;
        if self.stall.lock().is_none() {
            return Err(AppError::invalid_state(
                ErrorCode::InvalidState,
                format!("room {} has no failed checkpoint", self.room_id),
            ));
        }
        self.store.save_game_state(self.room_id, &state).await?;
        *self.stall.lock() = None;
        self.emit_public(GameEvent::RoomRecovered);
        self.recovered.notify_one();
        Ok(())
    }
}
