//! Team membership and hostility queries.
//!
//! Every player and unit carries a [`TeamState`]. The assigned team can be
//! changed at any time; the change is noticed once per tick by comparing the
//! assigned team against the last observed one, which fires a single
//! `TeamChanged` notification no matter how many times the value flipped.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::arena::Arena;
use crate::entity::EntityId;

/// Team affiliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Team {
    /// Human players
    #[default]
    Player,
    /// Hostile units
    Enemy,
    /// Never hostile to anything
    Neutral,
}

impl Team {
    /// Whether `self` and `other` are the same team.
    #[must_use]
    pub fn is_same_team(self, other: Self) -> bool {
        self == other
    }

    /// Whether `self` treats `other` as hostile.
    ///
    /// Neutral is never an enemy, and nothing is an enemy of Neutral.
    #[must_use]
    pub fn is_enemy_of(self, other: Self) -> bool {
        self != other && self != Self::Neutral && other != Self::Neutral
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Player => write!(f, "Player"),
            Self::Enemy => write!(f, "Enemy"),
            Self::Neutral => write!(f, "Neutral"),
        }
    }
}

/// Assigned team plus the last value observed by change detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamState {
    /// Current assignment
    pub team: Team,
    observed: Team,
}

impl TeamState {
    /// State with `team` assigned and already observed.
    #[must_use]
    pub const fn new(team: Team) -> Self {
        Self {
            team,
            observed: team,
        }
    }

    /// Team seen by the last change detection pass.
    #[must_use]
    pub const fn observed(&self) -> Team {
        self.observed
    }

    /// Records the current assignment, returning `(old, new)` if it differs
    /// from what was last observed.
    pub fn detect_change(&mut self) -> Option<(Team, Team)> {
        if self.team == self.observed {
            return None;
        }
        let old = self.observed;
        self.observed = self.team;
        Some((old, self.team))
    }
}

impl Default for TeamState {
    fn default() -> Self {
        Self::new(Team::default())
    }
}

/// Team of an entity, if it exists and has one.
#[must_use]
pub fn team_of(arena: &Arena, id: EntityId) -> Option<Team> {
    arena.get(id)?.inner().team().map(|state| state.team)
}

/// Whether two entities are on the same team. `false` if either has no team.
#[must_use]
pub fn is_same_team(arena: &Arena, a: EntityId, b: EntityId) -> bool {
    match (team_of(arena, a), team_of(arena, b)) {
        (Some(ta), Some(tb)) => ta.is_same_team(tb),
        _ => false,
    }
}

/// Whether `a` treats `b` as hostile. `false` if either has no team.
#[must_use]
pub fn is_enemy_of(arena: &Arena, a: EntityId, b: EntityId) -> bool {
    match (team_of(arena, a), team_of(arena, b)) {
        (Some(ta), Some(tb)) => ta.is_enemy_of(tb),
        _ => false,
    }
}

/// Every other entity on the same team as `id`, in id order.
#[must_use]
pub fn teammates(arena: &Arena, id: EntityId) -> Vec<EntityId> {
    let Some(own) = team_of(arena, id) else {
        return Vec::new();
    };
    arena
        .entities_sorted()
        .filter(|e| e.id() != id)
        .filter(|e| e.inner().team().is_some_and(|t| t.team.is_same_team(own)))
        .map(|e| e.id())
        .collect()
}

/// Every entity hostile to `id`, in id order.
#[must_use]
pub fn enemies(arena: &Arena, id: EntityId) -> Vec<EntityId> {
    let Some(own) = team_of(arena, id) else {
        return Vec::new();
    };
    arena
        .entities_sorted()
        .filter(|e| e.id() != id)
        .filter(|e| e.inner().team().is_some_and(|t| own.is_enemy_of(t.team)))
        .map(|e| e.id())
        .collect()
}
