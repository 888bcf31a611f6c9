//! Shared test tooling for the werewolf engine workspace.

pub mod logging;
