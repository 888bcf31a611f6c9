use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::ai::DecisionTask;
use crate::domain::actions::{Action, VoteChoice};
use crate::domain::log::Channel;
use crate::domain::roles::{Role, Team};
use crate::domain::state::{Phase, SeatNo, SubPhase};
use crate::domain::view::Audience;

pub const PROTOCOL_VERSION: i32 = 1;

/// Who receives an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "seats", rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Seats(BTreeSet<SeatNo>),
    Operator,
}

impl Visibility {
    pub fn seat(seat: SeatNo) -> Self {
        Visibility::Seats(BTreeSet::from([seat]))
    }

    pub fn allows(&self, audience: Audience) -> bool {
        match (self, audience) {
            (_, Audience::Operator) => true,
            (Visibility::Public, _) => true,
            (Visibility::Seats(seats), Audience::Seat(n)) => seats.contains(&n),
            _ => false,
        }
    }
}

/// Private outcome of a night action, sent to the acting seat only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum NightResult {
    SeerResult {
        target: SeatNo,
        is_werewolf: bool,
    },
    WitchInfo {
        victim: Option<SeatNo>,
        antidote_available: bool,
        poison_available: bool,
    },
    ActionAccepted {
        action: Action,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    PhaseChange {
        phase: Phase,
        sub_phase: Option<SubPhase>,
        day: u32,
    },

    HostAnnouncementStart {
        stream_id: u64,
    },
    HostAnnouncementChunk {
        stream_id: u64,
        text: String,
    },
    HostAnnouncementEnd {
        stream_id: u64,
        content: String,
    },

    RequestSpeech {
        seat: SeatNo,
        is_human: bool,
        task: DecisionTask,
    },
    RequestAction {
        seat: SeatNo,
        task: DecisionTask,
    },

    /// A complete speech submitted by a human.
    Speech {
        seat: SeatNo,
        content: String,
        log_id: u64,
        channel: Option<Channel>,
    },
    SpeechStart {
        stream_id: u64,
        seat: SeatNo,
        channel: Option<Channel>,
    },
    SpeechChunk {
        stream_id: u64,
        seat: SeatNo,
        text: String,
    },
    SpeechEnd {
        stream_id: u64,
        seat: SeatNo,
        log_id: u64,
    },

    SpeechReminder {
        seat: SeatNo,
        reminder_count: u32,
    },
    ActionReminder {
        seats: Vec<SeatNo>,
        reminder_count: u32,
    },

    VoteUpdate {
        voter: SeatNo,
        choice: VoteChoice,
        votes_cast: usize,
        votes_needed: usize,
    },
    VoteResult {
        tally: BTreeMap<SeatNo, u32>,
        abstentions: u32,
        eliminated: Option<SeatNo>,
        is_tie: bool,
    },

    NightActionResult {
        seat: SeatNo,
        result: NightResult,
    },

    Death {
        seat: SeatNo,
        day: u32,
    },

    GamePaused,
    GameResumed,

    AiFallback {
        seat: SeatNo,
        task: DecisionTask,
        reason: String,
    },

    RoomStalled {
        detail: String,
    },
    RoomRecovered,

    GameOver {
        winner: Team,
        roles: BTreeMap<SeatNo, Role>,
    },
}

impl GameEvent {
    /// Wire name of the event, as serialized in the `type` tag.
    pub fn name(&self) -> &'static str {
        match self {
            GameEvent::PhaseChange { .. } => "phase_change",
            GameEvent::HostAnnouncementStart { .. } => "host_announcement_start",
            GameEvent::HostAnnouncementChunk { .. } => "host_announcement_chunk",
            GameEvent::HostAnnouncementEnd { .. } => "host_announcement_end",
            GameEvent::RequestSpeech { .. } => "request_speech",
            GameEvent::RequestAction { .. } => "request_action",
            GameEvent::Speech { .. } => "speech",
            GameEvent::SpeechStart { .. } => "speech_start",
            GameEvent::SpeechChunk { .. } => "speech_chunk",
            GameEvent::SpeechEnd { .. } => "speech_end",
            GameEvent::SpeechReminder { .. } => "speech_reminder",
            GameEvent::ActionReminder { .. } => "action_reminder",
            GameEvent::VoteUpdate { .. } => "vote_update",
            GameEvent::VoteResult { .. } => "vote_result",
            GameEvent::NightActionResult { .. } => "night_action_result",
            GameEvent::Death { .. } => "death",
            GameEvent::GamePaused => "game_paused",
            GameEvent::GameResumed => "game_resumed",
            GameEvent::AiFallback { .. } => "ai_fallback",
            GameEvent::RoomStalled { .. } => "room_stalled",
            GameEvent::RoomRecovered => "room_recovered",
            GameEvent::GameOver { .. } => "game_over",
        }
    }
}

/// One emitted event. `seq` is strictly increasing per room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub room_id: i64,
    pub seq: u64,
    pub visibility: Visibility,
    pub event: GameEvent,
}
