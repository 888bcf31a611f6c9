//! Actions a seat can take, and the records they leave behind.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::roles::Role;
use crate::domain::state::SeatNo;

/// A structured decision by a seat, human or AI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Kill { target: SeatNo },
    Check { target: SeatNo },
    Save { target: SeatNo },
    Poison { target: SeatNo },
    Shoot { target: SeatNo },
    Vote { target: SeatNo },
    Abstain,
    /// Decline the current ability (no kill, no check, no potion, no shot).
    Skip,
}

impl Action {
    pub fn target(&self) -> Option<SeatNo> {
        match *self {
            Action::Kill { target }
            | Action::Check { target }
            | Action::Save { target }
            | Action::Poison { target }
            | Action::Shoot { target }
            | Action::Vote { target } => Some(target),
            Action::Abstain | Action::Skip => None,
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Action::Kill { .. } => "kill",
            Action::Check { .. } => "check",
            Action::Save { .. } => "save",
            Action::Poison { .. } => "poison",
            Action::Shoot { .. } => "shoot",
            Action::Vote { .. } => "vote",
            Action::Abstain => "abstain",
            Action::Skip => "skip",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "choice", content = "target", rename_all = "snake_case")]
pub enum VoteChoice {
    Target(SeatNo),
    Abstain,
}

impl VoteChoice {
    pub fn target(self) -> Option<SeatNo> {
        match self {
            VoteChoice::Target(seat) => Some(seat),
            VoteChoice::Abstain => None,
        }
    }
}

impl From<Option<SeatNo>> for VoteChoice {
    fn from(target: Option<SeatNo>) -> Self {
        target.map_or(VoteChoice::Abstain, VoteChoice::Target)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WitchPotion {
    Save,
    Poison,
}

/// One role's decision for the current night, resolved at dawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NightActionRecord {
    pub role: Role,
    pub actor_seat: SeatNo,
    /// `None` when the role declined to act.
    pub target_seat: Option<SeatNo>,
    pub sub_action: Option<WitchPotion>,
}

impl NightActionRecord {
    pub fn skipped(role: Role, actor_seat: SeatNo) -> Self {
        Self {
            role,
            actor_seat,
            target_seat: None,
            sub_action: None,
        }
    }

    /// The action this record was built from.
    pub fn action(&self) -> Action {
        match (self.role, self.target_seat, self.sub_action) {
            (_, None, _) => Action::Skip,
            (Role::Werewolf, Some(target), _) => Action::Kill { target },
            (Role::Seer, Some(target), _) => Action::Check { target },
            (Role::Witch, Some(target), Some(WitchPotion::Save)) => Action::Save { target },
            (Role::Witch, Some(target), Some(WitchPotion::Poison)) => Action::Poison { target },
            (Role::Hunter, Some(target), _) => Action::Shoot { target },
            _ => Action::Skip,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathCause {
    Werewolf,
    Poison,
    Vote,
    HunterShot,
}

impl DeathCause {
    pub const fn as_str(self) -> &'static str {
        match self {
            DeathCause::Werewolf => "werewolf",
            DeathCause::Poison => "poison",
            DeathCause::Vote => "vote",
            DeathCause::HunterShot => "hunter_shot",
        }
    }
}

/// Seats that die from one resolution step.
pub type DeathSet = BTreeMap<SeatNo, DeathCause>;

/// Outcome of closing a vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteOutcome {
    pub tally: BTreeMap<SeatNo, u32>,
    pub abstentions: u32,
    pub eliminated: Option<SeatNo>,
    pub is_tie: bool,
}
