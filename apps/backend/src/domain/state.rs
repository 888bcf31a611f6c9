use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::domain::actions::{DeathCause, DeathSet, NightActionRecord, VoteChoice, VoteOutcome};
use crate::domain::log::{LogEntry, NewLogEntry};
use crate::domain::roles::{assign_roles, check_seat_count, Role, RoleDistribution, Team};
use crate::errors::domain::{DomainError, ValidationKind};

/// Seat number, 1-based and stable for the game's lifetime.
pub type SeatNo = u8;

/// Top-level game progression.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Seats taken, game not started.
    Waiting,
    /// Role sub-phases run in order: werewolf, seer, witch.
    Night,
    /// Night deaths revealed; a dead hunter may shoot.
    Dawn,
    /// Announcement, discussion, vote, last words, hunter.
    Day,
    /// Either `Continue` to the next night or `GameOver`.
    Result,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubPhase {
    Werewolf,
    Seer,
    Witch,
    Hunter,
    Announcement,
    Discussion,
    Vote,
    LastWords,
    Continue,
    GameOver,
}

impl Phase {
    pub const fn as_str(self) -> &'static str {
        match self {
            Phase::Waiting => "waiting",
            Phase::Night => "night",
            Phase::Dawn => "dawn",
            Phase::Day => "day",
            Phase::Result => "result",
        }
    }
}

impl SubPhase {
    pub const fn as_str(self) -> &'static str {
        match self {
            SubPhase::Werewolf => "werewolf",
            SubPhase::Seer => "seer",
            SubPhase::Witch => "witch",
            SubPhase::Hunter => "hunter",
            SubPhase::Announcement => "announcement",
            SubPhase::Discussion => "discussion",
            SubPhase::Vote => "vote",
            SubPhase::LastWords => "last_words",
            SubPhase::Continue => "continue",
            SubPhase::GameOver => "game_over",
        }
    }

    /// Night sub-phase in which `role` acts.
    pub fn for_night_role(role: Role) -> Option<SubPhase> {
        match role {
            Role::Werewolf => Some(SubPhase::Werewolf),
            Role::Seer => Some(SubPhase::Seer),
            Role::Witch => Some(SubPhase::Witch),
            Role::Hunter | Role::Villager => None,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for SubPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Once-per-game abilities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillFlags {
    pub antidote_used: bool,
    pub poison_used: bool,
    pub shot_used: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Death {
    pub cause: DeathCause,
    pub day: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Seat {
    pub seat_number: SeatNo,
    pub participant_id: String,
    pub is_human: bool,
    pub role: Role,
    pub is_alive: bool,
    pub skills: SkillFlags,
    pub death: Option<Death>,
}

impl Seat {
    pub fn is_werewolf(&self) -> bool {
        self.role == Role::Werewolf
    }

    pub fn has_potion(&self) -> bool {
        !self.skills.antidote_used || !self.skills.poison_used
    }
}

/// Who sits where, supplied when the room opens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatSpec {
    pub seat_number: SeatNo,
    pub participant_id: String,
    pub is_human: bool,
    /// Pin a role to this seat instead of dealing one.
    #[serde(default)]
    pub role: Option<Role>,
}

impl SeatSpec {
    pub fn ai(seat_number: SeatNo) -> Self {
        Self {
            seat_number,
            participant_id: format!("ai-{seat_number}"),
            is_human: false,
            role: None,
        }
    }

    pub fn human(seat_number: SeatNo, participant_id: impl Into<String>) -> Self {
        Self {
            seat_number,
            participant_id: participant_id.into(),
            is_human: true,
            role: None,
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeerCheck {
    pub day: u32,
    pub seer: SeatNo,
    pub target: SeatNo,
    pub is_werewolf: bool,
}

/// Authoritative state of one room's game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub room_id: i64,
    pub phase: Phase,
    pub sub_phase: Option<SubPhase>,
    /// 1-based; the first dawn opens day 1.
    pub day_number: u32,
    pub nights_resolved: u32,
    pub is_paused: bool,
    pub is_started: bool,
    pub seats: Vec<Seat>,
    pub votes: BTreeMap<SeatNo, VoteChoice>,
    pub night_actions: BTreeMap<Role, NightActionRecord>,
    pub current_speaker_seat: Option<SeatNo>,
    pub waiting_for_human_input: bool,
    pub reminder_count: u32,
    pub log: Vec<LogEntry>,
    pub next_log_id: u64,
    /// Seats that finished their discussion turn today.
    pub spoken_today: BTreeSet<SeatNo>,
    pub seer_checks: Vec<SeerCheck>,
    pub last_night_deaths: DeathSet,
    /// Dead hunter owed a revenge shot.
    pub pending_hunter: Option<SeatNo>,
    pub eliminated_today: Option<SeatNo>,
    pub last_vote: Option<VoteOutcome>,
    pub winner: Option<Team>,
    pub seed: u64,
}

impl GameState {
    pub fn new(room_id: i64, seed: u64) -> Self {
        Self {
            room_id,
            phase: Phase::Waiting,
            sub_phase: None,
            day_number: 1,
            nights_resolved: 0,
            is_paused: false,
            is_started: false,
            seats: Vec::new(),
            votes: BTreeMap::new(),
            night_actions: BTreeMap::new(),
            current_speaker_seat: None,
            waiting_for_human_input: false,
            reminder_count: 0,
            log: Vec::new(),
            next_log_id: 1,
            spoken_today: BTreeSet::new(),
            seer_checks: Vec::new(),
            last_night_deaths: DeathSet::new(),
            pending_hunter: None,
            eliminated_today: None,
            last_vote: None,
            winner: None,
            seed,
        }
    }

    pub fn step(&self) -> (Phase, Option<SubPhase>) {
        (self.phase, self.sub_phase)
    }

    pub fn is_over(&self) -> bool {
        self.phase == Phase::Result && self.sub_phase == Some(SubPhase::GameOver)
    }

    pub fn seat(&self, seat: SeatNo) -> Option<&Seat> {
        self.seats.iter().find(|s| s.seat_number == seat)
    }

    pub fn seat_mut(&mut self, seat: SeatNo) -> Option<&mut Seat> {
        self.seats.iter_mut().find(|s| s.seat_number == seat)
    }

    pub fn require_seat(&self, seat: SeatNo) -> Result<&Seat, DomainError> {
        self.seat(seat).ok_or_else(|| {
            DomainError::validation(
                ValidationKind::UnknownSeat,
                format!("seat {seat} is not part of this game"),
            )
        })
    }

    pub fn alive_seats(&self) -> impl Iterator<Item = &Seat> {
        self.seats.iter().filter(|s| s.is_alive)
    }

    pub fn alive_with_role(&self, role: Role) -> impl Iterator<Item = &Seat> {
        self.alive_seats().filter(move |s| s.role == role)
    }

    /// Every werewolf seat, dead or alive; they all share the werewolf channel.
    pub fn werewolf_seats(&self) -> BTreeSet<SeatNo> {
        self.seats
            .iter()
            .filter(|s| s.is_werewolf())
            .map(|s| s.seat_number)
            .collect()
    }

    /// Seat that decides the night kill: lowest alive human werewolf, else lowest alive werewolf.
    pub fn pack_leader(&self) -> Option<SeatNo> {
        self.alive_with_role(Role::Werewolf)
            .find(|s| s.is_human)
            .or_else(|| self.alive_with_role(Role::Werewolf).next())
            .map(|s| s.seat_number)
    }

    /// Alive seats that have not spoken today, in seat order.
    pub fn remaining_speakers(&self) -> Vec<SeatNo> {
        self.alive_seats()
            .map(|s| s.seat_number)
            .filter(|n| !self.spoken_today.contains(n))
            .collect()
    }

    /// Provisional werewolf target for the current night.
    pub fn tonight_victim(&self) -> Option<SeatNo> {
        self.night_actions
            .get(&Role::Werewolf)
            .and_then(|r| r.target_seat)
    }

    /// Alive seats that have not voted yet.
    pub fn outstanding_voters(&self) -> Vec<SeatNo> {
        self.alive_seats()
            .map(|s| s.seat_number)
            .filter(|n| !self.votes.contains_key(n))
            .collect()
    }

    pub fn append_log(&mut self, entry: NewLogEntry) -> &LogEntry {
        let id = self.next_log_id;
        self.next_log_id += 1;
        self.log.push(LogEntry {
            id,
            kind: entry.kind,
            day: self.day_number,
            phase: self.phase,
            sub_phase: self.sub_phase,
            time: OffsetDateTime::now_utc(),
            seat_number: entry.seat_number,
            content: entry.content,
            is_public: entry.is_public,
            channel: entry.channel,
            metadata: entry.metadata,
        });
        &self.log[self.log.len() - 1]
    }

    /// Mark seats dead. Seats already dead are ignored; returns the seats that died now.
    pub fn apply_deaths(&mut self, deaths: &DeathSet) -> DeathSet {
        let day = self.day_number;
        let mut applied = DeathSet::new();
        for (&seat_no, &cause) in deaths {
            if let Some(seat) = self.seat_mut(seat_no) {
                if seat.is_alive {
                    seat.is_alive = false;
                    seat.death = Some(Death { cause, day });
                    applied.insert(seat_no, cause);
                }
            }
        }
        applied
    }

    /// Reset per-night records before a new night.
    pub fn clear_night(&mut self) {
        self.night_actions.clear();
        self.last_night_deaths.clear();
    }

    /// Reset per-day records before a new day.
    pub fn clear_day(&mut self) {
        self.votes.clear();
        self.spoken_today.clear();
        self.eliminated_today = None;
        self.last_vote = None;
        self.current_speaker_seat = None;
    }
}

/// Build the seat table for a new game: validate seat numbering and deal roles.
pub fn setup_seats(
    specs: &[SeatSpec],
    distribution: Option<&RoleDistribution>,
    seed: u64,
) -> Result<Vec<Seat>, DomainError> {
    check_seat_count(specs.len())?;

    let mut numbers: Vec<SeatNo> = specs.iter().map(|s| s.seat_number).collect();
    numbers.sort_unstable();
    let expected: Vec<SeatNo> = (1..=specs.len() as SeatNo).collect();
    if numbers != expected {
        return Err(DomainError::validation(
            ValidationKind::UnknownSeat,
            format!("seat numbers must be 1..={} without gaps", specs.len()),
        ));
    }

    let mut ordered: Vec<&SeatSpec> = specs.iter().collect();
    ordered.sort_by_key(|s| s.seat_number);
    let preset: Vec<Option<Role>> = ordered.iter().map(|s| s.role).collect();

    let distribution = match distribution {
        Some(d) => d.clone(),
        None if preset.iter().all(Option::is_some) => {
            RoleDistribution::new(preset.iter().flatten().map(|&r| (r, 1)))
        }
        None => RoleDistribution::default_for(specs.len())?,
    };
    let roles = assign_roles(&distribution, &preset, seed)?;

    Ok(ordered
        .into_iter()
        .zip(roles)
        .map(|(spec, role)| Seat {
            seat_number: spec.seat_number,
            participant_id: spec.participant_id.clone(),
            is_human: spec.is_human,
            role,
            is_alive: true,
            skills: SkillFlags::default(),
            death: None,
        })
        .collect())
}
