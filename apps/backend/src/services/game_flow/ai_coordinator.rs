//! AI turns: gateway calls outside the lock, application under it, and the
//! role-default fallback when the gateway fails or proposes an illegal move.

use futures::StreamExt;
use serde_json::json;
use tokio::time::{timeout, timeout_at, Instant};
use tracing::{debug, warn};

use super::GameFlowService;
use crate::ai::context::narration_channel;
use crate::ai::{build_context, default_action, fallback_speech, AiContext, AiError, DecisionTask};
use crate::domain::actions::{Action, NightActionRecord, VoteChoice};
use crate::domain::log::{LogKind, NewLogEntry};
use crate::domain::resolver::{validate_hunter_shot, validate_night_action, validate_vote};
use crate::domain::roles::Role;
use crate::domain::state::{GameState, SeatNo};
use crate::domain::view::channel_members;
use crate::error::AppError;
use crate::errors::domain::DomainError;
use crate::events::{GameEvent, Visibility};

impl GameFlowService {
    fn context_for(
        &self,
        state: &GameState,
        seat: SeatNo,
        task: DecisionTask,
    ) -> Result<(Role, AiContext), AppError> {
        let role = state.require_seat(seat)?.role;
        let ctx = build_context(
            state,
            seat,
            task,
            &self.config.rules,
            self.config.context_max_entries,
        )?;
        Ok((role, ctx))
    }

    /// One `decide` call, bounded by the soft timeout. The lock is not held.
    async fn ask_gateway(
        &self,
        seat: SeatNo,
        task: DecisionTask,
    ) -> Result<(Role, Result<Action, AiError>), AppError> {
        self.ctl.pause_gate().await?;
        let (role, ctx) = {
            let state = self.ctl.lock().await;
            self.context_for(&state, seat, task)?
        };
        debug!(
            room_id = self.room_id,
            seat,
            task = task.as_str(),
            gateway = self.gateway.name(),
            "asking gateway"
        );
        let reply = match timeout(self.config.ai_timeout(), self.gateway.decide(role, &ctx)).await {
            Ok(reply) => reply,
            Err(_) => Err(AiError::Timeout),
        };
        Ok((role, reply))
    }

    /// Leave one operator-only fallback marker in the log and the event stream.
    pub(super) fn record_fallback(
        &self,
        state: &mut GameState,
        seat: SeatNo,
        task: DecisionTask,
        err: &AiError,
    ) {
        warn!(
            room_id = self.room_id,
            seat,
            day = state.day_number,
            task = task.as_str(),
            reason = err.reason(),
            gateway = self.gateway.name(),
            error = %err,
            "AI generation failed; using role default"
        );
        state.append_log(
            NewLogEntry::hidden(
                LogKind::Skill,
                Some(seat),
                format!("Generation failed for {}: {err}", task.as_str()),
            )
            .with_metadata(json!({
                "fallback": true,
                "reason": err.reason(),
                "task": task.as_str(),
                "seat": seat,
            })),
        );
        self.emit(
            Visibility::Operator,
            GameEvent::AiFallback {
                seat,
                task,
                reason: err.reason().to_string(),
            },
        );
    }

    fn validate_for_task(
        &self,
        state: &GameState,
        seat: SeatNo,
        task: DecisionTask,
        action: Action,
    ) -> Result<NightActionRecord, DomainError> {
        match task {
            DecisionTask::HunterShot => validate_hunter_shot(state, seat, action),
            _ => validate_night_action(state, seat, action, &self.config.rules),
        }
    }

    /// Night action (or hunter shot) for an AI seat.
    pub(super) async fn ai_night_action(&self, seat: SeatNo, task: DecisionTask) -> Result<(), AppError> {
        let (role, reply) = self.ask_gateway(seat, task).await?;

        let mut state = self.ctl.lock().await;
        let validated = reply.and_then(|action| {
            self.validate_for_task(&state, seat, task, action)
                .map_err(|e| AiError::InvalidMove(e.to_string()))
        });
        let record = match validated {
            Ok(record) => record,
            Err(err) => {
                self.record_fallback(&mut state, seat, task, &err);
                self.validate_for_task(&state, seat, task, default_action(role, task))
                    .unwrap_or_else(|_| NightActionRecord::skipped(role, seat))
            }
        };
        self.apply_night_record(&mut state, record)
    }

    /// Vote for an AI seat; an unusable reply becomes an abstention.
    pub(super) async fn ai_vote(&self, seat: SeatNo) -> Result<(), AppError> {
        let task = DecisionTask::Vote;
        let (role, reply) = self.ask_gateway(seat, task).await?;

        let mut state = self.ctl.lock().await;
        let choice = reply
            .and_then(|action| match action {
                Action::Vote { target } => Ok(VoteChoice::Target(target)),
                Action::Abstain => Ok(VoteChoice::Abstain),
                other => Err(AiError::InvalidMove(format!("'{}' is not a vote", other.name()))),
            })
            .and_then(|choice| {
                validate_vote(&state, seat, choice)
                    .map(|_| choice)
                    .map_err(|e| AiError::InvalidMove(e.to_string()))
            });
        let choice = match choice {
            Ok(choice) => choice,
            Err(err) => {
                self.record_fallback(&mut state, seat, task, &err);
                VoteChoice::from(default_action(role, task).target())
            }
        };
        self.record_vote(&mut state, seat, choice)
    }

    /// Stream an AI narration as `speech_start`, chunks, `speech_end`.
    ///
    /// The stream is opened outside the lock and drained under it, so two
    /// speakers never interleave. A failed or silent stream is finished with
    /// the canned fallback line and a fallback marker.
    pub(super) async fn ai_narrate(&self, seat: SeatNo, task: DecisionTask) -> Result<(), AppError> {
        self.ctl.pause_gate().await?;
        let (role, ctx) = {
            let state = self.ctl.lock().await;
            self.context_for(&state, seat, task)?
        };
        let opened = match timeout(self.config.ai_timeout(), self.gateway.narrate(role, &ctx)).await {
            Ok(opened) => opened,
            Err(_) => Err(AiError::Timeout),
        };

        let mut state = self.ctl.lock().await;
        let channel = narration_channel(task);
        let visibility = match channel {
            Some(c) => Visibility::Seats(channel_members(&state, c)),
            None => Visibility::Public,
        };
        // the finished speech gets the next log id; nothing else logs meanwhile
        let stream_id = state.next_log_id;
        self.emit(
            visibility.clone(),
            GameEvent::SpeechStart {
                stream_id,
                seat,
                channel,
            },
        );

        let mut text = String::new();
        let mut failure = None;
        let stream_deadline = Instant::now() + self.config.stream_total_timeout();
        match opened {
            Ok(mut stream) => loop {
                let chunk_deadline =
                    (Instant::now() + self.config.stream_chunk_timeout()).min(stream_deadline);
                match timeout_at(chunk_deadline, stream.next()).await {
                    Ok(Some(Ok(chunk))) => {
                        if chunk.is_empty() {
                            continue;
                        }
                        text.push_str(&chunk);
                        self.emit(
                            visibility.clone(),
                            GameEvent::SpeechChunk {
                                stream_id,
                                seat,
                                text: chunk,
                            },
                        );
                    }
                    Ok(Some(Err(err))) => {
                        failure = Some(err);
                        break;
                    }
                    Ok(None) => break,
                    Err(_) => {
                        failure = Some(AiError::Timeout);
                        break;
                    }
                }
            },
            Err(err) => failure = Some(err),
        }

        if text.trim().is_empty() {
            text = fallback_speech(task).to_string();
            self.emit(
                visibility.clone(),
                GameEvent::SpeechChunk {
                    stream_id,
                    seat,
                    text: text.clone(),
                },
            );
            failure.get_or_insert_with(|| AiError::Malformed("empty narration".into()));
        }

        let entry = match channel {
            Some(c) => NewLogEntry::private(LogKind::Speech, c, Some(seat), text.trim()),
            None => NewLogEntry::public(LogKind::Speech, Some(seat), text.trim()),
        };
        let log_id = state.append_log(entry).id;
        self.emit(
            visibility,
            GameEvent::SpeechEnd {
                stream_id,
                seat,
                log_id,
            },
        );
        if let Some(err) = failure {
            self.record_fallback(&mut state, seat, task, &err);
        }
        Ok(())
    }
}
