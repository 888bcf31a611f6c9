//! Night sub-phases and the hunter's revenge shot.

use tracing::debug;

use super::GameFlowService;
use crate::ai::DecisionTask;
use crate::domain::log::{Channel, LogKind, NewLogEntry};
use crate::domain::roles::Role;
use crate::domain::state::SeatNo;
use crate::error::AppError;
use crate::events::{GameEvent, NightResult, Visibility};
use crate::services::concurrency::WaitKey;

impl GameFlowService {
    pub(super) async fn run_werewolf_turn(&self) -> Result<(), AppError> {
        if self.config.night_chat {
            self.run_night_chat().await?;
        }
        let leader = self.ctl.lock().await.pack_leader();
        match leader {
            Some(seat) => self.night_decision(seat, DecisionTask::WerewolfKill).await,
            None => Ok(()),
        }
    }

    pub(super) async fn run_seer_turn(&self) -> Result<(), AppError> {
        let seer = {
            let state = self.ctl.lock().await;
            let seer = state.alive_with_role(Role::Seer).next().map(|s| s.seat_number);
            seer
        };
        match seer {
            Some(seat) => self.night_decision(seat, DecisionTask::SeerCheck).await,
            None => Ok(()),
        }
    }

    /// The witch first learns tonight's victim, then decides.
    pub(super) async fn run_witch_turn(&self) -> Result<(), AppError> {
        let witch = {
            let mut state = self.ctl.lock().await;
            let Some(witch) = state
                .alive_with_role(Role::Witch)
                .find(|s| s.has_potion())
                .cloned()
            else {
                return Ok(());
            };
            let seat = witch.seat_number;
            let victim = state.tonight_victim();
            let line = match victim {
                Some(v) => format!("The werewolves attacked seat {v} tonight."),
                None => "Nobody was attacked tonight.".to_string(),
            };
            state.append_log(NewLogEntry::private(
                LogKind::Skill,
                Channel::Seat(seat),
                None,
                line,
            ));
            self.emit(
                Visibility::seat(seat),
                GameEvent::NightActionResult {
                    seat,
                    result: NightResult::WitchInfo {
                        victim,
                        antidote_available: !witch.skills.antidote_used,
                        poison_available: !witch.skills.poison_used,
                    },
                },
            );
            seat
        };
        self.night_decision(witch, DecisionTask::WitchPotion).await
    }

    pub(super) async fn run_hunter_turn(&self) -> Result<(), AppError> {
        let hunter = self.ctl.lock().await.pending_hunter;
        match hunter {
            Some(seat) => self.night_decision(seat, DecisionTask::HunterShot).await,
            None => Ok(()),
        }
    }

    /// Collect one night decision from `seat`: wait for a human, ask the gateway otherwise.
    async fn night_decision(&self, seat: SeatNo, task: DecisionTask) -> Result<(), AppError> {
        self.ctl.pause_gate().await?;
        let key = WaitKey::NightAction(seat);
        let wait = {
            let mut state = self.ctl.lock().await;
            let is_human = state.require_seat(seat)?.is_human;
            let visibility = match task {
                DecisionTask::WerewolfKill => Visibility::Seats(state.werewolf_seats()),
                DecisionTask::HunterShot => Visibility::Public,
                _ => Visibility::seat(seat),
            };
            debug!(
                room_id = self.room_id,
                seat,
                task = task.as_str(),
                is_human,
                "night decision requested"
            );
            self.emit(visibility, GameEvent::RequestAction { seat, task });
            if is_human {
                state.waiting_for_human_input = true;
                state.reminder_count = 0;
                Some(self.ctl.begin_wait(key))
            } else {
                None
            }
        };

        match wait {
            Some(rx) => self.ctl.wait_for_human(key, rx).await.map(|_| ()),
            None => self.ai_night_action(seat, task).await,
        }
    }
}
