//! Speaking turns: discussion, last words, werewolf whispers.

use tracing::info;

use super::GameFlowService;
use crate::ai::DecisionTask;
use crate::domain::roles::Role;
use crate::domain::state::{GameState, SeatNo, SubPhase};
use crate::error::AppError;
use crate::events::GameEvent;
use crate::services::concurrency::WaitKey;

impl GameFlowService {
    /// Give `seat` the floor and wait until their speech is in.
    ///
    /// AI seats speak immediately; a human seat is waited on with no timeout,
    /// with reminders, until `submit_human_speech` releases it.
    pub(super) async fn request_speech(&self, seat: SeatNo, task: DecisionTask) -> Result<(), AppError> {
        self.ctl.pause_gate().await?;
        let wait = {
            let mut state = self.ctl.lock().await;
            let is_human = state.require_seat(seat)?.is_human;
            state.current_speaker_seat = Some(seat);
            info!(
                room_id = self.room_id,
                seat,
                day = state.day_number,
                task = task.as_str(),
                is_human,
                "speech requested"
            );
            self.emit_public(GameEvent::RequestSpeech {
                seat,
                is_human,
                task,
            });
            if is_human {
                state.waiting_for_human_input = true;
                state.reminder_count = 0;
                Some(self.ctl.begin_wait(WaitKey::Speech(seat)))
            } else {
                None
            }
        };

        match wait {
            Some(rx) => {
                self.ctl.wait_for_human(WaitKey::Speech(seat), rx).await?;
            }
            None => {
                self.ai_narrate(seat, task).await?;
                let mut state = self.ctl.lock().await;
                self.finish_speech(&mut state, seat);
            }
        }
        Ok(())
    }

    /// Release the floor after `seat` spoke.
    pub(super) fn finish_speech(&self, state: &mut GameState, seat: SeatNo) {
        if state.sub_phase == Some(SubPhase::Discussion) {
            state.spoken_today.insert(seat);
        }
        state.current_speaker_seat = None;
        state.waiting_for_human_input = false;
    }

    /// One whisper per alive AI werewolf, when the pack has more than one member.
    pub(super) async fn run_night_chat(&self) -> Result<(), AppError> {
        let whisperers: Vec<SeatNo> = {
            let state = self.ctl.lock().await;
            let pack: Vec<_> = state.alive_with_role(Role::Werewolf).collect();
            if pack.len() < 2 {
                return Ok(());
            }
            pack.into_iter()
                .filter(|s| !s.is_human)
                .map(|s| s.seat_number)
                .collect()
        };
        for seat in whisperers {
            self.ai_narrate(seat, DecisionTask::NightChat).await?;
        }
        Ok(())
    }
}
