//! Day sub-phases: announcement, discussion, vote, last words.

use tracing::info;

use super::GameFlowService;
use crate::ai::heuristic::chunk_text;
use crate::ai::DecisionTask;
use crate::domain::log::{LogKind, NewLogEntry};
use crate::domain::state::{GameState, SeatNo};
use crate::error::AppError;
use crate::events::GameEvent;

const HOST_WORDS_PER_CHUNK: usize = 6;

fn announcement_text(state: &GameState) -> String {
    let mut text = format!("Day {} begins.", state.day_number);
    if state.last_night_deaths.is_empty() {
        text.push_str(" The night was peaceful. Nobody died.");
    } else {
        let seats: Vec<String> = state
            .last_night_deaths
            .keys()
            .map(|s| format!("seat {s}"))
            .collect();
        text.push_str(&format!(" Last night we lost {}.", seats.join(" and ")));
    }
    let alive = state.alive_seats().count();
    text.push_str(&format!(" {alive} players remain. Discussion opens in seat order."));
    text
}

impl GameFlowService {
    /// Host narration of the night's outcome, streamed as one triple.
    pub(super) async fn run_announcement(&self) -> Result<(), AppError> {
        let mut state = self.ctl.lock().await;
        let text = announcement_text(&state);
        let stream_id = state.next_log_id;
        self.emit_public(GameEvent::HostAnnouncementStart { stream_id });
        for chunk in chunk_text(&text, HOST_WORDS_PER_CHUNK) {
            self.emit_public(GameEvent::HostAnnouncementChunk {
                stream_id,
                text: chunk,
            });
        }
        state.append_log(NewLogEntry::public(LogKind::HostAnnouncement, None, text.clone()));
        self.emit_public(GameEvent::HostAnnouncementEnd {
            stream_id,
            content: text,
        });
        Ok(())
    }

    /// Every alive seat speaks once, in seat order. Seats that die meanwhile are skipped.
    pub(super) async fn run_discussion(&self) -> Result<(), AppError> {
        loop {
            let next = self.ctl.lock().await.remaining_speakers().first().copied();
            let Some(seat) = next else {
                return Ok(());
            };
            self.request_speech(seat, DecisionTask::Speech).await?;
        }
    }

    /// AI seats vote first; then the phase stays open until every human voted.
    pub(super) async fn run_vote(&self) -> Result<(), AppError> {
        let ai_voters: Vec<SeatNo> = {
            let state = self.ctl.lock().await;
            state
                .alive_seats()
                .filter(|s| !s.is_human)
                .map(|s| s.seat_number)
                .collect()
        };
        for seat in ai_voters {
            self.ai_vote(seat).await?;
        }
        self.ctl.wait_for_votes().await?;
        let state = self.ctl.lock().await;
        info!(
            room_id = self.room_id,
            day = state.day_number,
            votes = state.votes.len(),
            "all votes in"
        );
        Ok(())
    }

    pub(super) async fn run_last_words(&self) -> Result<(), AppError> {
        let seat = self.ctl.lock().await.eliminated_today;
        match seat {
            Some(seat) => self.request_speech(seat, DecisionTask::LastWords).await,
            None => Ok(()),
        }
    }
}
