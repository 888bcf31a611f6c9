//! Role-default actions used when a gateway fails, times out, or answers
//! with a move the rules reject.

use crate::ai::context::DecisionTask;
use crate::domain::{Action, Role};

/// Safe default for a decision task: nobody dies, nobody is accused.
pub fn default_action(role: Role, task: DecisionTask) -> Action {
    match (role, task) {
        (_, DecisionTask::Vote) => Action::Abstain,
        // werewolf skips kill, seer skips check, witch keeps potions, hunter holds fire
        _ => Action::Skip,
    }
}

/// Text used in place of a narration that failed before producing anything.
pub fn fallback_speech(task: DecisionTask) -> &'static str {
    match task {
        DecisionTask::LastWords => "I have nothing more to say. Good luck, everyone.",
        DecisionTask::NightChat => "I'll follow the pack.",
        _ => "I pass for now and will listen to the others.",
    }
}
