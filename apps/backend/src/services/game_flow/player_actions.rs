//! Entry points for humans and operators.
//!
//! Each submission validates against the current state under the turn lock,
//! applies itself, and only then releases the driver waiting on it. A
//! rejected submission leaves the wait in place.

use tracing::info;

use super::GameFlowService;
use crate::domain::actions::{Action, VoteChoice};
use crate::domain::log::{Channel, LogEntry, LogKind, NewLogEntry};
use crate::domain::resolver::{
    validate_hunter_shot, validate_night_action, validate_night_chat, validate_speech,
    validate_vote,
};
use crate::domain::seed_derivation::derive_dealing_seed;
use crate::domain::state::{setup_seats, SeatNo, SeatSpec, SubPhase};
use crate::error::AppError;
use crate::errors::domain::ValidationKind;
use crate::errors::ErrorCode;
use crate::events::{GameEvent, Visibility};
use crate::services::concurrency::{HumanInput, WaitKey};

impl GameFlowService {
    /// Deal roles onto the seats, checkpoint, and enter the first night.
    ///
    /// The driver is spawned by the caller once this returns.
    pub async fn start_game(&self, specs: &[SeatSpec]) -> Result<(), AppError> {
        let mut state = self.ctl.lock().await;
        if state.is_started {
            return Err(AppError::invalid_state(
                ErrorCode::GameAlreadyStarted,
                format!("room {} already started its game", self.room_id),
            ));
        }

        let before = state.clone();
        state.seats = setup_seats(
            specs,
            self.config.roles.as_ref(),
            derive_dealing_seed(state.seed),
        )?;
        state.is_started = true;
        if let Err(err) = self.store.save_game_state(self.room_id, &state).await {
            *state = before;
            return Err(err);
        }

        let seats = state.seats.len();
        state.append_log(NewLogEntry::public(
            LogKind::HostAnnouncement,
            None,
            format!("The game begins with {seats} players. Night falls."),
        ));
        info!(room_id = self.room_id, seats, humans = specs.iter().filter(|s| s.is_human).count(), "game started");
        self.advance_locked(&mut state)?;
        Ok(())
    }

    /// Block the next phase transition or AI call. An in-flight human wait continues.
    pub async fn pause_game(&self) -> Result<(), AppError> {
        let mut state = self.ctl.lock().await;
        if !state.is_started || state.is_over() {
            return Err(AppError::invalid_state(
                ErrorCode::GameNotRunning,
                format!("room {} has no running game", self.room_id),
            ));
        }
        if state.is_paused {
            return Err(AppError::invalid_state(
                ErrorCode::PauseStateUnchanged,
                "game is already paused",
            ));
        }
        state.is_paused = true;
        self.ctl.set_paused(true);
        info!(room_id = self.room_id, phase = %state.phase, "game paused");
        self.emit_public(GameEvent::GamePaused);
        Ok(())
    }

    pub async fn resume_game(&self) -> Result<(), AppError> {
        let mut state = self.ctl.lock().await;
        if !state.is_started || state.is_over() {
            return Err(AppError::invalid_state(
                ErrorCode::GameNotRunning,
                format!("room {} has no running game", self.room_id),
            ));
        }
        if !state.is_paused {
            return Err(AppError::invalid_state(
                ErrorCode::PauseStateUnchanged,
                "game is not paused",
            ));
        }
        state.is_paused = false;
        self.ctl.set_paused(false);
        info!(room_id = self.room_id, phase = %state.phase, "game resumed");
        self.emit_public(GameEvent::GameResumed);
        Ok(())
    }

    /// Speech from the human holding the floor.
    pub async fn submit_human_speech(&self, seat: SeatNo, content: &str) -> Result<LogEntry, AppError> {
        let mut state = self.ctl.lock().await;
        validate_speech(&state, seat, content)?;
        self.require_human(&state, seat)?;
        let key = WaitKey::Speech(seat);
        if !self.ctl.has_waiter(key) {
            return Err(AppError::invalid(
                ValidationKind::OutOfTurn,
                format!("seat {seat} was not asked to speak"),
            ));
        }

        let entry = state
            .append_log(NewLogEntry::public(LogKind::Speech, Some(seat), content.trim()))
            .clone();
        self.emit_public(GameEvent::Speech {
            seat,
            content: entry.content.clone(),
            log_id: entry.id,
            channel: None,
        });
        self.finish_speech(&mut state, seat);
        self.ctl.deliver(key, HumanInput::Speech(entry.content.clone()))?;
        Ok(entry)
    }

    /// Vote from a human seat. A second vote replaces the first.
    pub async fn submit_human_vote(&self, seat: SeatNo, choice: VoteChoice) -> Result<(), AppError> {
        let mut state = self.ctl.lock().await;
        validate_vote(&state, seat, choice)?;
        self.require_human(&state, seat)?;
        self.record_vote(&mut state, seat, choice)?;
        self.ctl.notify_vote();
        Ok(())
    }

    /// Night action, or the hunter's shot, from a human seat.
    pub async fn submit_human_night_action(&self, seat: SeatNo, action: Action) -> Result<(), AppError> {
        let mut state = self.ctl.lock().await;
        let record = if state.sub_phase == Some(SubPhase::Hunter) {
            validate_hunter_shot(&state, seat, action)?
        } else {
            validate_night_action(&state, seat, action, &self.config.rules)?
        };
        self.require_human(&state, seat)?;
        let key = WaitKey::NightAction(seat);
        if !self.ctl.has_waiter(key) {
            return Err(AppError::invalid(
                ValidationKind::OutOfTurn,
                format!("seat {seat} was not asked to act"),
            ));
        }
        self.apply_night_record(&mut state, record)?;
        self.ctl.deliver(key, HumanInput::Action(action))
    }

    /// Werewolf whisper from a human during the werewolf sub-phase.
    pub async fn submit_night_chat(&self, seat: SeatNo, content: &str) -> Result<LogEntry, AppError> {
        let mut state = self.ctl.lock().await;
        validate_night_chat(&state, seat, content)?;
        self.require_human(&state, seat)?;
        let entry = state
            .append_log(NewLogEntry::private(
                LogKind::Speech,
                Channel::Werewolf,
                Some(seat),
                content.trim(),
            ))
            .clone();
        let pack = state.werewolf_seats();
        self.emit(
            Visibility::Seats(pack),
            GameEvent::Speech {
                seat,
                content: entry.content.clone(),
                log_id: entry.id,
                channel: Some(Channel::Werewolf),
            },
        );
        Ok(entry)
    }
}
