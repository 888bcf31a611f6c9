//! Per-room game settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::roles::RoleDistribution;
use crate::domain::rules::RuleToggles;
use crate::error::AppError;

/// Settings shared by every room a registry opens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Fixed role table; derived from the seat count when absent.
    pub roles: Option<RoleDistribution>,
    /// Interval between "still waiting" reminders for a human turn.
    pub reminder_ms: u64,
    /// Soft timeout of one AI decision.
    pub ai_timeout_ms: u64,
    /// Idle timeout between two narration chunks.
    pub stream_chunk_timeout_ms: u64,
    /// Deadline for a whole narration stream, however steadily it trickles.
    pub stream_total_timeout_ms: u64,
    /// Days after which the driver gives up with an internal error.
    pub max_days: u32,
    pub rules: RuleToggles,
    /// AI werewolves whisper on the pack channel before the kill.
    pub night_chat: bool,
    /// Public history entries kept in an AI context.
    pub context_max_entries: usize,
    /// Fixed base seed; rooms derive their own when absent.
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            roles: None,
            reminder_ms: 30_000,
            ai_timeout_ms: 20_000,
            stream_chunk_timeout_ms: 10_000,
            stream_total_timeout_ms: 60_000,
            max_days: 30,
            rules: RuleToggles::default(),
            night_chat: true,
            context_max_entries: 200,
            seed: None,
        }
    }
}

impl GameConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from a key lookup; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let roles = get("WEREWOLF_ROLES")
            .map(|v| RoleDistribution::parse(&v))
            .transpose()
            .map_err(|e| AppError::config(format!("WEREWOLF_ROLES: {e}")))?;

        Ok(Self {
            roles,
            reminder_ms: parse_or(&get, "WEREWOLF_REMINDER_SECS", defaults.reminder_ms / 1000)?
                * 1000,
            ai_timeout_ms: parse_or(&get, "WEREWOLF_AI_TIMEOUT_MS", defaults.ai_timeout_ms)?,
            stream_chunk_timeout_ms: parse_or(
                &get,
                "WEREWOLF_STREAM_CHUNK_TIMEOUT_MS",
                defaults.stream_chunk_timeout_ms,
            )?,
            stream_total_timeout_ms: parse_or(
                &get,
                "WEREWOLF_STREAM_TOTAL_TIMEOUT_MS",
                defaults.stream_total_timeout_ms,
            )?,
            max_days: parse_or(&get, "WEREWOLF_MAX_DAYS", defaults.max_days)?,
            rules: RuleToggles {
                last_words: parse_or(&get, "WEREWOLF_LAST_WORDS", defaults.rules.last_words)?,
                witch_self_save: parse_or(
                    &get,
                    "WEREWOLF_WITCH_SELF_SAVE",
                    defaults.rules.witch_self_save,
                )?,
                hunter_shoots_when_poisoned: parse_or(
                    &get,
                    "WEREWOLF_HUNTER_SHOOTS_WHEN_POISONED",
                    defaults.rules.hunter_shoots_when_poisoned,
                )?,
            },
            night_chat: parse_or(&get, "WEREWOLF_NIGHT_CHAT", defaults.night_chat)?,
            context_max_entries: parse_or(
                &get,
                "WEREWOLF_CONTEXT_MAX_ENTRIES",
                defaults.context_max_entries,
            )?,
            seed: get("WEREWOLF_SEED")
                .map(|v| {
                    v.parse::<u64>()
                        .map_err(|_| AppError::config(format!("WEREWOLF_SEED '{v}' is not a u64")))
                })
                .transpose()?,
        })
    }

    pub fn reminder_interval(&self) -> Duration {
        Duration::from_millis(self.reminder_ms.max(1))
    }

    pub fn ai_timeout(&self) -> Duration {
        Duration::from_millis(self.ai_timeout_ms)
    }

    pub fn stream_chunk_timeout(&self) -> Duration {
        Duration::from_millis(self.stream_chunk_timeout_ms)
    }

    pub fn stream_total_timeout(&self) -> Duration {
        Duration::from_millis(self.stream_total_timeout_ms)
    }
}

fn parse_or<T: std::str::FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, AppError> {
    match get(key) {
        None => Ok(default),
        Some(raw) => raw
            .parse::<T>()
            .map_err(|_| AppError::config(format!("{key} has invalid value '{raw}'"))),
    }
}
