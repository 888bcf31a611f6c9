//! Table limits and rule toggles.

use serde::{Deserialize, Serialize};

pub const MIN_SEATS: usize = 4;
pub const MAX_SEATS: usize = 16;

/// Optional rules that vary between tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleToggles {
    /// A seat eliminated by vote gives a final speech.
    pub last_words: bool,
    /// The witch may use the antidote on herself.
    pub witch_self_save: bool,
    /// A poisoned hunter still gets the revenge shot.
    pub hunter_shoots_when_poisoned: bool,
}

impl Default for RuleToggles {
    fn default() -> Self {
        Self {
            last_words: true,
            witch_self_save: false,
            hunter_shoots_when_poisoned: false,
        }
    }
}
