//! Bounded, role-scoped view of a game assembled before each AI call.
//!
//! A context is rebuilt for every decision or narration and never stored.
//! It contains the public log since the game started, what the acting seat
//! privately knows (own role, teammates, seer results, potions, tonight's
//! victim) and today's speeches so far. Each log list keeps only its most
//! recent entries.
//! Entries on a private channel are included only when the acting seat may
//! read that channel; operator-only entries never are.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::domain::log::{Channel, LogEntry, LogKind};
use crate::domain::roles::Role;
use crate::domain::rules::RuleToggles;
use crate::domain::state::{GameState, Phase, SeatNo, SubPhase};
use crate::domain::view::{entry_visible_to, Audience};
use crate::errors::domain::DomainError;

/// What the gateway is being asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionTask {
    WerewolfKill,
    SeerCheck,
    WitchPotion,
    HunterShot,
    Vote,
    Speech,
    LastWords,
    NightChat,
}

impl DecisionTask {
    pub const fn as_str(self) -> &'static str {
        match self {
            DecisionTask::WerewolfKill => "werewolf_kill",
            DecisionTask::SeerCheck => "seer_check",
            DecisionTask::WitchPotion => "witch_potion",
            DecisionTask::HunterShot => "hunter_shot",
            DecisionTask::Vote => "vote",
            DecisionTask::Speech => "speech",
            DecisionTask::LastWords => "last_words",
            DecisionTask::NightChat => "night_chat",
        }
    }

    /// Tasks answered with free text rather than an action.
    pub fn is_narration(self) -> bool {
        matches!(
            self,
            DecisionTask::Speech | DecisionTask::LastWords | DecisionTask::NightChat
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatSummary {
    pub seat_number: SeatNo,
    pub is_alive: bool,
    pub is_self: bool,
    /// Role as far as the acting seat knows it.
    pub known_role: Option<Role>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextLine {
    pub id: u64,
    pub day: u32,
    pub kind: LogKind,
    pub seat_number: Option<SeatNo>,
    pub content: String,
}

impl From<&LogEntry> for ContextLine {
    fn from(e: &LogEntry) -> Self {
        Self {
            id: e.id,
            day: e.day,
            kind: e.kind,
            seat_number: e.seat_number,
            content: e.content.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateKnowledge {
    /// (target, is_werewolf) for every check this seer made.
    pub seer_results: Vec<(SeatNo, bool)>,
    pub antidote_available: bool,
    pub poison_available: bool,
    /// Only filled in for the witch during her sub-phase.
    pub tonight_victim: Option<SeatNo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiContext {
    pub room_id: i64,
    pub day: u32,
    pub phase: Phase,
    pub sub_phase: Option<SubPhase>,
    pub task: DecisionTask,
    pub seat: SeatNo,
    pub role: Role,
    pub seats: Vec<SeatSummary>,
    pub teammates: Vec<SeatNo>,
    pub public_log: Vec<ContextLine>,
    pub private_log: Vec<ContextLine>,
    pub round_speeches: Vec<ContextLine>,
    pub knowledge: PrivateKnowledge,
    pub legal_targets: Vec<SeatNo>,
}

/// Seats the acting seat may target for `task`.
pub fn legal_targets(
    state: &GameState,
    seat: SeatNo,
    task: DecisionTask,
    rules: &RuleToggles,
) -> Vec<SeatNo> {
    let alive = state.alive_seats();
    match task {
        DecisionTask::WerewolfKill => alive
            .filter(|s| !s.is_werewolf())
            .map(|s| s.seat_number)
            .collect(),
        DecisionTask::SeerCheck => alive
            .filter(|s| s.seat_number != seat)
            .filter(|s| {
                !state
                    .seer_checks
                    .iter()
                    .any(|c| c.seer == seat && c.target == s.seat_number)
            })
            .map(|s| s.seat_number)
            .collect(),
        DecisionTask::WitchPotion => {
            let mut targets: Vec<SeatNo> = alive
                .filter(|s| s.seat_number != seat)
                .map(|s| s.seat_number)
                .collect();
            if rules.witch_self_save && state.tonight_victim() == Some(seat) {
                targets.push(seat);
                targets.sort_unstable();
            }
            targets
        }
        DecisionTask::HunterShot => alive
            .filter(|s| s.seat_number != seat)
            .map(|s| s.seat_number)
            .collect(),
        DecisionTask::Vote => alive.map(|s| s.seat_number).collect(),
        DecisionTask::Speech | DecisionTask::LastWords | DecisionTask::NightChat => Vec::new(),
    }
}

/// The last `max` entries, oldest first.
fn most_recent<'a>(entries: impl Iterator<Item = &'a LogEntry>, max: usize) -> Vec<ContextLine> {
    let entries: Vec<&LogEntry> = entries.collect();
    let skip = entries.len().saturating_sub(max);
    entries[skip..].iter().map(|e| ContextLine::from(*e)).collect()
}

/// Build the context for `seat` performing `task`.
pub fn build_context(
    state: &GameState,
    seat: SeatNo,
    task: DecisionTask,
    rules: &RuleToggles,
    max_entries: usize,
) -> Result<AiContext, DomainError> {
    let me = state.require_seat(seat)?;
    let audience = Audience::Seat(seat);
    let wolves = state.werewolf_seats();

    let teammates: Vec<SeatNo> = if me.is_werewolf() {
        wolves.iter().copied().filter(|&n| n != seat).collect()
    } else {
        Vec::new()
    };

    let seats = state
        .seats
        .iter()
        .map(|s| SeatSummary {
            seat_number: s.seat_number,
            is_alive: s.is_alive,
            is_self: s.seat_number == seat,
            known_role: (s.seat_number == seat || teammates.contains(&s.seat_number))
                .then_some(s.role),
        })
        .collect();

    let public_log = most_recent(state.log.iter().filter(|e| e.is_public), max_entries);

    let private_log = most_recent(
        state
            .log
            .iter()
            .filter(|e| !e.is_public && e.channel.is_some())
            .filter(|e| entry_visible_to(state, e, audience)),
        max_entries,
    );

    let round_speeches = most_recent(
        state.log.iter().filter(|e| {
            e.is_public
                && e.kind == LogKind::Speech
                && e.day == state.day_number
                && e.phase == Phase::Day
                && e.sub_phase == Some(SubPhase::Discussion)
        }),
        max_entries,
    );

    let knowledge = PrivateKnowledge {
        seer_results: state
            .seer_checks
            .iter()
            .filter(|c| c.seer == seat)
            .map(|c| (c.target, c.is_werewolf))
            .collect(),
        antidote_available: me.role == Role::Witch && !me.skills.antidote_used,
        poison_available: me.role == Role::Witch && !me.skills.poison_used,
        tonight_victim: (me.role == Role::Witch && task == DecisionTask::WitchPotion)
            .then(|| state.tonight_victim())
            .flatten(),
    };

    Ok(AiContext {
        room_id: state.room_id,
        day: state.day_number,
        phase: state.phase,
        sub_phase: state.sub_phase,
        task,
        seat,
        role: me.role,
        seats,
        teammates,
        public_log,
        private_log,
        round_speeches,
        knowledge,
        legal_targets: legal_targets(state, seat, task, rules),
    })
}

impl AiContext {
    pub fn alive_seats(&self) -> impl Iterator<Item = SeatNo> + '_ {
        self.seats.iter().filter(|s| s.is_alive).map(|s| s.seat_number)
    }

    /// Seats publicly accused of being a werewolf by a self-declared seer, newest first.
    pub fn public_accusations(&self) -> Vec<SeatNo> {
        let mut out = Vec::new();
        for line in self.public_log.iter().rev() {
            if line.kind != LogKind::Speech {
                continue;
            }
            if let Some(seat) = parse_accusation(&line.content) {
                if !out.contains(&seat) {
                    out.push(seat);
                }
            }
        }
        out
    }

    /// Prompt text for text-generation backends.
    pub fn render_prompt(&self) -> String {
        let mut p = String::new();
        let _ = writeln!(
            p,
            "You are seat {} playing a werewolf party game. Your role: {}.",
            self.seat, self.role
        );
        if !self.teammates.is_empty() {
            let mates: Vec<String> = self.teammates.iter().map(u8::to_string).collect();
            let _ = writeln!(p, "Your fellow werewolves: seats {}.", mates.join(", "));
        }
        let alive: Vec<String> = self.alive_seats().map(|n| n.to_string()).collect();
        let _ = writeln!(p, "Day {}. Alive seats: {}.", self.day, alive.join(", "));
        for (target, wolf) in &self.knowledge.seer_results {
            let verdict = if *wolf { "a werewolf" } else { "not a werewolf" };
            let _ = writeln!(p, "You checked seat {target}: {verdict}.");
        }
        if let Some(victim) = self.knowledge.tonight_victim {
            let _ = writeln!(p, "Tonight the werewolves attacked seat {victim}.");
        }
        if self.role == Role::Witch {
            let _ = writeln!(
                p,
                "Antidote available: {}. Poison available: {}.",
                self.knowledge.antidote_available, self.knowledge.poison_available
            );
        }
        if !self.public_log.is_empty() {
            let _ = writeln!(p, "\nPublic history:");
            for line in &self.public_log {
                write_line(&mut p, line);
            }
        }
        if !self.private_log.is_empty() {
            let _ = writeln!(p, "\nPrivate notes:");
            for line in &self.private_log {
                write_line(&mut p, line);
            }
        }
        let _ = writeln!(p, "\nTask: {}.", task_instruction(self.task));
        if !self.legal_targets.is_empty() {
            let targets: Vec<String> = self.legal_targets.iter().map(u8::to_string).collect();
            let _ = writeln!(p, "Allowed target seats: {}.", targets.join(", "));
        }
        p
    }
}

fn write_line(p: &mut String, line: &ContextLine) {
    match line.seat_number {
        Some(seat) => {
            let _ = writeln!(p, "[day {}] seat {}: {}", line.day, seat, line.content);
        }
        None => {
            let _ = writeln!(p, "[day {}] host: {}", line.day, line.content);
        }
    }
}

fn task_instruction(task: DecisionTask) -> &'static str {
    match task {
        DecisionTask::WerewolfKill => {
            r#"choose tonight's victim. Reply with JSON {"action":"kill","target":N} or {"action":"skip"}"#
        }
        DecisionTask::SeerCheck => {
            r#"choose a seat to inspect. Reply with JSON {"action":"check","target":N} or {"action":"skip"}"#
        }
        DecisionTask::WitchPotion => {
            r#"decide on your potions. Reply with JSON {"action":"save","target":N}, {"action":"poison","target":N} or {"action":"skip"}"#
        }
        DecisionTask::HunterShot => {
            r#"you died and may take one seat with you. Reply with JSON {"action":"shoot","target":N} or {"action":"skip"}"#
        }
        DecisionTask::Vote => {
            r#"vote to eliminate a seat. Reply with JSON {"action":"vote","target":N} or {"action":"abstain"}"#
        }
        DecisionTask::Speech => "give your discussion speech in two or three sentences",
        DecisionTask::LastWords => "you were voted out; give your last words in one or two sentences",
        DecisionTask::NightChat => "whisper one short line to your fellow werewolves",
    }
}

/// Recognize "seat N is a werewolf" in free text.
pub fn parse_accusation(text: &str) -> Option<SeatNo> {
    let lower = text.to_ascii_lowercase();
    let idx = lower.find(" is a werewolf")?;
    let head = &lower[..idx];
    let digits: String = head
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_digit())
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    if !head[..head.len() - digits.len()].ends_with("seat ") {
        return None;
    }
    digits.parse().ok()
}

/// Private channel a narration task writes to, if any.
pub fn narration_channel(task: DecisionTask) -> Option<Channel> {
    match task {
        DecisionTask::NightChat => Some(Channel::Werewolf),
        _ => None,
    }
}
