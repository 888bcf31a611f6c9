//! RNG seed derivation utilities for deterministic game behavior.
//!
//! Derives unique-but-deterministic seeds for different contexts from a
//! room's base seed.

/// Base seed for a room when none is configured.
///
/// Mixes the room id with a caller-supplied entropy value so different
/// rooms opened in the same process never share a table.
pub fn derive_room_seed(room_id: i64, entropy: u64) -> u64 {
    (room_id as u64)
        .wrapping_mul(0x9E37_79B9_7F4A_7C15)
        .wrapping_add(entropy)
}

/// Seed for dealing roles at game start.
pub fn derive_dealing_seed(game_seed: u64) -> u64 {
    game_seed.wrapping_add(1)
}
