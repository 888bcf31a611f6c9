//! Deterministic local gateway.
//!
//! Makes reasonable role play without any backend: werewolves never target
//! packmates, the seer never re-checks a seat, the witch saves on the first
//! night, and voters follow a public seer accusation when one exists.
//! Narration is canned text split into word chunks.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use parking_lot::Mutex;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use super::context::{AiContext, DecisionTask};
use super::trait_def::{AiError, DecisionGateway, TextStream};
use crate::domain::log::LogKind;
use crate::domain::{Action, Role, SeatNo};

const WORDS_PER_CHUNK: usize = 4;

pub struct HeuristicGateway {
    rng: Mutex<ChaCha8Rng>,
}

impl HeuristicGateway {
    pub const NAME: &'static str = "heuristic";
    pub const VERSION: &'static str = "1.0.0";

    /// `Some(seed)` gives reproducible games; `None` seeds from OS entropy.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_os_rng(),
        };
        Self {
            rng: Mutex::new(rng),
        }
    }

    fn pick(&self, options: &[SeatNo]) -> Option<SeatNo> {
        let mut rng = self.rng.lock();
        options.choose(&mut *rng).copied()
    }

    fn claimed_seers(ctx: &AiContext) -> Vec<SeatNo> {
        ctx.public_log
            .iter()
            .filter(|l| l.kind == LogKind::Speech)
            .filter(|l| l.content.to_ascii_lowercase().contains("i am the seer"))
            .filter_map(|l| l.seat_number)
            .collect()
    }

    fn first_accused(ctx: &AiContext) -> Option<SeatNo> {
        ctx.public_accusations()
            .into_iter()
            .find(|s| ctx.legal_targets.contains(s) && *s != ctx.seat && !ctx.teammates.contains(s))
    }

    fn choose_action(&self, ctx: &AiContext) -> Action {
        let targets = &ctx.legal_targets;
        match ctx.task {
            DecisionTask::WerewolfKill => {
                let seers: Vec<SeatNo> = Self::claimed_seers(ctx)
                    .into_iter()
                    .filter(|s| targets.contains(s))
                    .collect();
                let pool = if seers.is_empty() { targets.as_slice() } else { &seers };
                self.pick(pool)
                    .map_or(Action::Skip, |target| Action::Kill { target })
            }
            DecisionTask::SeerCheck => self
                .pick(targets)
                .map_or(Action::Skip, |target| Action::Check { target }),
            DecisionTask::WitchPotion => {
                let k = &ctx.knowledge;
                match k.tonight_victim {
                    Some(victim)
                        if k.antidote_available && ctx.day == 1 && targets.contains(&victim) =>
                    {
                        Action::Save { target: victim }
                    }
                    _ => match Self::first_accused(ctx).filter(|_| k.poison_available) {
                        Some(target) if Some(target) != k.tonight_victim => Action::Poison { target },
                        _ => Action::Skip,
                    },
                }
            }
            DecisionTask::HunterShot => Self::first_accused(ctx)
                .or_else(|| self.pick(targets))
                .map_or(Action::Skip, |target| Action::Shoot { target }),
            DecisionTask::Vote => {
                let others: Vec<SeatNo> = targets
                    .iter()
                    .copied()
                    .filter(|s| *s != ctx.seat && !ctx.teammates.contains(s))
                    .collect();
                let choice = if ctx.role == Role::Werewolf {
                    self.pick(&others)
                } else {
                    Self::first_accused(ctx).or_else(|| self.pick(&others))
                };
                choice.map_or(Action::Abstain, |target| Action::Vote { target })
            }
            DecisionTask::Speech | DecisionTask::LastWords | DecisionTask::NightChat => {
                Action::Skip
            }
        }
    }

    fn compose(&self, ctx: &AiContext) -> String {
        match ctx.task {
            DecisionTask::NightChat => {
                let prey: Vec<SeatNo> = ctx
                    .alive_seats()
                    .filter(|s| *s != ctx.seat && !ctx.teammates.contains(s))
                    .collect();
                match self.pick(&prey) {
                    Some(seat) => format!("Let's take seat {seat} tonight."),
                    None => "Nothing to add.".to_string(),
                }
            }
            DecisionTask::LastWords => match ctx.role {
                Role::Werewolf => "You got it wrong. Good luck, everyone.".to_string(),
                role => format!("I was the {role}. Find the werewolves without me."),
            },
            _ => self.discussion_speech(ctx),
        }
    }

    fn discussion_speech(&self, ctx: &AiContext) -> String {
        let alive: Vec<SeatNo> = ctx.alive_seats().collect();
        if ctx.role == Role::Seer {
            let found = ctx
                .knowledge
                .seer_results
                .iter()
                .find(|(seat, wolf)| *wolf && alive.contains(seat));
            if let Some((seat, _)) = found {
                return format!("I am the seer. Seat {seat} is a werewolf. Vote with me.");
            }
            if let Some((seat, _)) = ctx.knowledge.seer_results.last() {
                return format!("I am the seer. Seat {seat} is not a werewolf.");
            }
        }
        if ctx.role != Role::Werewolf {
            if let Some(seat) = Self::first_accused(ctx) {
                return format!("I trust the seer's claim about seat {seat}.");
            }
        }
        let suspects: Vec<SeatNo> = alive
            .into_iter()
            .filter(|s| *s != ctx.seat && !ctx.teammates.contains(s))
            .collect();
        match self.pick(&suspects) {
            Some(seat) => format!("I have no hard information yet. Seat {seat} seems quiet to me."),
            None => "I have no information yet. I will listen.".to_string(),
        }
    }
}

/// Split text into chunks of a few words; concatenating the chunks yields the text.
pub fn chunk_text(text: &str, words_per_chunk: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_inclusive(' ').collect();
    words
        .chunks(words_per_chunk.max(1))
        .map(|c| c.concat())
        .collect()
}

#[async_trait]
impl DecisionGateway for HeuristicGateway {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn decide(&self, _role: Role, ctx: &AiContext) -> Result<Action, AiError> {
        if ctx.task.is_narration() {
            return Err(AiError::Internal(format!(
                "{} is a narration task",
                ctx.task.as_str()
            )));
        }
        Ok(self.choose_action(ctx))
    }

    async fn narrate(&self, _role: Role, ctx: &AiContext) -> Result<TextStream, AiError> {
        let text = self.compose(ctx);
        let chunks = chunk_text(&text, WORDS_PER_CHUNK);
        Ok(stream::iter(chunks.into_iter().map(Ok)).boxed())
    }
}
