//! Role set, team membership, and role distribution for a table.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::domain::rules::{MAX_SEATS, MIN_SEATS};
use crate::errors::domain::{DomainError, ValidationKind};

/// The fixed role set. Every role-specific behavior dispatches on this tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Werewolf,
    Seer,
    Witch,
    Hunter,
    Villager,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    Werewolves,
    Villagers,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Werewolf,
        Role::Seer,
        Role::Witch,
        Role::Hunter,
        Role::Villager,
    ];

    pub fn team(self) -> Team {
        match self {
            Role::Werewolf => Team::Werewolves,
            _ => Team::Villagers,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Role::Werewolf => "werewolf",
            Role::Seer => "seer",
            Role::Witch => "witch",
            Role::Hunter => "hunter",
            Role::Villager => "villager",
        }
    }

    /// Roles that act during the night.
    pub fn has_night_action(self) -> bool {
        matches!(self, Role::Werewolf | Role::Seer | Role::Witch)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Team::Werewolves => f.write_str("werewolves"),
            Team::Villagers => f.write_str("villagers"),
        }
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "werewolf" | "wolf" => Ok(Role::Werewolf),
            "seer" => Ok(Role::Seer),
            "witch" => Ok(Role::Witch),
            "hunter" => Ok(Role::Hunter),
            "villager" => Ok(Role::Villager),
            other => Err(DomainError::validation_other(format!(
                "unknown role '{other}'"
            ))),
        }
    }
}

/// How many seats get each role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDistribution {
    counts: BTreeMap<Role, u8>,
}

impl RoleDistribution {
    pub fn new(counts: impl IntoIterator<Item = (Role, u8)>) -> Self {
        let mut map = BTreeMap::new();
        for (role, n) in counts {
            if n > 0 {
                *map.entry(role).or_insert(0) += n;
            }
        }
        Self { counts: map }
    }

    /// Standard table for `seats` players: a third werewolves (at least one),
    /// a seer, a witch from 6 seats, a hunter from 8 seats, villagers for the rest.
    pub fn default_for(seats: usize) -> Result<Self, DomainError> {
        check_seat_count(seats)?;
        let werewolves = (seats / 3).max(1);
        let witch = usize::from(seats >= 6);
        let hunter = usize::from(seats >= 8);
        let villagers = seats - werewolves - 1 - witch - hunter;
        Ok(Self::new([
            (Role::Werewolf, werewolves as u8),
            (Role::Seer, 1),
            (Role::Witch, witch as u8),
            (Role::Hunter, hunter as u8),
            (Role::Villager, villagers as u8),
        ]))
    }

    /// Parse `werewolf:3,seer:1,villager:4`.
    pub fn parse(spec: &str) -> Result<Self, DomainError> {
        let mut counts = Vec::new();
        for part in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (role, n) = part.split_once(':').ok_or_else(|| {
                DomainError::validation_other(format!("role entry '{part}' must be role:count"))
            })?;
            let role: Role = role.parse()?;
            let n: u8 = n.trim().parse().map_err(|_| {
                DomainError::validation_other(format!("role count '{n}' is not a number"))
            })?;
            counts.push((role, n));
        }
        if counts.is_empty() {
            return Err(DomainError::validation_other("role distribution is empty"));
        }
        Ok(Self::new(counts))
    }

    pub fn count(&self, role: Role) -> u8 {
        self.counts.get(&role).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().map(|&n| n as usize).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Role, u8)> + '_ {
        self.counts.iter().map(|(&r, &n)| (r, n))
    }

    /// Validate against a table of `seats` players.
    pub fn validate(&self, seats: usize) -> Result<(), DomainError> {
        check_seat_count(seats)?;
        if self.total() != seats {
            return Err(DomainError::validation_other(format!(
                "role distribution has {} roles for {seats} seats",
                self.total()
            )));
        }
        let wolves = self.count(Role::Werewolf) as usize;
        if wolves == 0 {
            return Err(DomainError::validation_other(
                "role distribution needs at least one werewolf",
            ));
        }
        if wolves >= seats - wolves {
            return Err(DomainError::validation_other(
                "werewolves must be fewer than the other roles",
            ));
        }
        Ok(())
    }

    /// Flat role list in role order.
    pub fn expand(&self) -> Vec<Role> {
        self.iter()
            .flat_map(|(role, n)| std::iter::repeat(role).take(n as usize))
            .collect()
    }
}

pub fn check_seat_count(seats: usize) -> Result<(), DomainError> {
    if !(MIN_SEATS..=MAX_SEATS).contains(&seats) {
        return Err(DomainError::validation(
            ValidationKind::UnknownSeat,
            format!("a game needs {MIN_SEATS}..={MAX_SEATS} seats, got {seats}"),
        ));
    }
    Ok(())
}

/// Deal roles onto seats.
///
/// `preset[i]` pins a role to seat index `i`; the remaining roles of the
/// distribution are shuffled onto the other seats with a seeded ChaCha RNG,
/// so the same seed always yields the same table.
pub fn assign_roles(
    distribution: &RoleDistribution,
    preset: &[Option<Role>],
    seed: u64,
) -> Result<Vec<Role>, DomainError> {
    distribution.validate(preset.len())?;

    let mut remaining = distribution.clone();
    for role in preset.iter().flatten() {
        let slot = remaining.counts.get_mut(role).filter(|n| **n > 0).ok_or_else(|| {
            DomainError::validation_other(format!(
                "preset role {role} exceeds the role distribution"
            ))
        })?;
        *slot -= 1;
    }

    let mut pool = remaining.expand();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    pool.shuffle(&mut rng);

    let mut pool = pool.into_iter();
    preset
        .iter()
        .map(|fixed| match fixed {
            Some(role) => Ok(*role),
            None => pool
                .next()
                .ok_or_else(|| DomainError::validation_other("ran out of roles while dealing")),
        })
        .collect()
}
