//! Append-only game log.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::domain::state::{Phase, SeatNo, SubPhase};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogKind {
    Speech,
    HostAnnouncement,
    Death,
    Vote,
    Skill,
}

/// Private channel a non-public entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "channel", content = "seat", rename_all = "snake_case")]
pub enum Channel {
    /// Shared by all werewolves (night chat, kill decision).
    Werewolf,
    /// Only the given seat (seer results, witch knowledge).
    Seat(SeatNo),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: LogKind,
    pub day: u32,
    pub phase: Phase,
    pub sub_phase: Option<SubPhase>,
    #[serde(with = "time::serde::rfc3339")]
    pub time: OffsetDateTime,
    pub seat_number: Option<SeatNo>,
    pub content: String,
    pub is_public: bool,
    pub channel: Option<Channel>,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// Builder input for a new entry; id, day, phase and time are filled in by
/// [`crate::domain::state::GameState::append_log`].
#[derive(Debug, Clone)]
pub struct NewLogEntry {
    pub kind: LogKind,
    pub seat_number: Option<SeatNo>,
    pub content: String,
    pub is_public: bool,
    pub channel: Option<Channel>,
    pub metadata: serde_json::Value,
}

impl NewLogEntry {
    pub fn public(kind: LogKind, seat_number: Option<SeatNo>, content: impl Into<String>) -> Self {
        Self {
            kind,
            seat_number,
            content: content.into(),
            is_public: true,
            channel: None,
            metadata: serde_json::Value::Null,
        }
    }

    pub fn private(
        kind: LogKind,
        channel: Channel,
        seat_number: Option<SeatNo>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            seat_number,
            content: content.into(),
            is_public: false,
            channel: Some(channel),
            metadata: serde_json::Value::Null,
        }
    }

    /// Operator-only entry: not public and on no player channel.
    pub fn hidden(kind: LogKind, seat_number: Option<SeatNo>, content: impl Into<String>) -> Self {
        Self {
            kind,
            seat_number,
            content: content.into(),
            is_public: false,
            channel: None,
            metadata: serde_json::Value::Null,
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}
