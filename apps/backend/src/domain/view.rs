//! What a viewer may see of a game: filtered log views and state snapshots.
//!
//! Three audiences exist. The public audience (spectators, the "basic" log)
//! sees only public entries. A seat additionally sees its own private channel
//! and, for werewolves, the werewolf channel. The operator sees everything,
//! which is also what the "detailed" post-game log shows.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::domain::actions::{DeathCause, VoteChoice};
use crate::domain::log::{Channel, LogEntry};
use crate::domain::roles::{Role, Team};
use crate::domain::state::{GameState, Phase, SeatNo, SubPhase};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "audience", content = "seat", rename_all = "snake_case")]
pub enum Audience {
    Public,
    Seat(SeatNo),
    Operator,
}

/// Log view requested by a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "view", content = "seat", rename_all = "snake_case")]
pub enum LogView {
    /// Public entries only.
    Basic,
    /// Every entry.
    Detailed,
    /// Public entries plus what one seat may see.
    Seat(SeatNo),
}

impl From<LogView> for Audience {
    fn from(view: LogView) -> Self {
        match view {
            LogView::Basic => Audience::Public,
            LogView::Detailed => Audience::Operator,
            LogView::Seat(n) => Audience::Seat(n),
        }
    }
}

impl From<Audience> for LogView {
    fn from(audience: Audience) -> Self {
        match audience {
            Audience::Public => LogView::Basic,
            Audience::Operator => LogView::Detailed,
            Audience::Seat(n) => LogView::Seat(n),
        }
    }
}

/// Seats that can read a private channel.
pub fn channel_members(state: &GameState, channel: Channel) -> BTreeSet<SeatNo> {
    match channel {
        Channel::Werewolf => state.werewolf_seats(),
        Channel::Seat(n) => BTreeSet::from([n]),
    }
}

pub fn entry_visible_to(state: &GameState, entry: &LogEntry, audience: Audience) -> bool {
    if entry.is_public {
        return true;
    }
    match audience {
        Audience::Operator => true,
        Audience::Public => false,
        Audience::Seat(n) => entry
            .channel
            .is_some_and(|c| channel_members(state, c).contains(&n)),
    }
}

pub fn filter_log(state: &GameState, view: LogView) -> Vec<LogEntry> {
    let audience = Audience::from(view);
    state
        .log
        .iter()
        .filter(|e| entry_visible_to(state, e, audience))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeatView {
    pub seat_number: SeatNo,
    pub participant_id: String,
    pub is_human: bool,
    pub is_alive: bool,
    /// Hidden unless the viewer is allowed to know it.
    pub role: Option<Role>,
    pub death_cause: Option<DeathCause>,
}

/// Snapshot of a game as one audience sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameView {
    pub room_id: i64,
    pub audience: Audience,
    pub phase: Phase,
    pub sub_phase: Option<SubPhase>,
    pub day_number: u32,
    pub is_paused: bool,
    pub is_started: bool,
    pub current_speaker_seat: Option<SeatNo>,
    pub waiting_for_human_input: bool,
    pub reminder_count: u32,
    pub seats: Vec<SeatView>,
    pub votes: BTreeMap<SeatNo, VoteChoice>,
    pub winner: Option<Team>,
}

fn role_visible(state: &GameState, audience: Audience, seat: SeatNo) -> bool {
    if state.winner.is_some() {
        return true;
    }
    match audience {
        Audience::Operator => true,
        Audience::Public => false,
        Audience::Seat(viewer) if viewer == seat => true,
        Audience::Seat(viewer) => {
            let wolves = state.werewolf_seats();
            wolves.contains(&viewer) && wolves.contains(&seat)
        }
    }
}

pub fn game_view(state: &GameState, audience: Audience) -> GameView {
    GameView {
        room_id: state.room_id,
        audience,
        phase: state.phase,
        sub_phase: state.sub_phase,
        day_number: state.day_number,
        is_paused: state.is_paused,
        is_started: state.is_started,
        current_speaker_seat: state.current_speaker_seat,
        waiting_for_human_input: state.waiting_for_human_input,
        reminder_count: state.reminder_count,
        seats: state
            .seats
            .iter()
            .map(|s| SeatView {
                seat_number: s.seat_number,
                participant_id: s.participant_id.clone(),
                is_human: s.is_human,
                is_alive: s.is_alive,
                role: role_visible(state, audience, s.seat_number).then_some(s.role),
                death_cause: s.death.map(|d| d.cause),
            })
            .collect(),
        votes: state.votes.clone(),
        winner: state.winner,
    }
}
