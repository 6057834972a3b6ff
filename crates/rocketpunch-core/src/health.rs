//! Health state machine and its arena-level effects.
//!
//! [`HealthState`] is a pure state machine: every transition returns the list
//! of [`HealthTransition`]s it produced and touches nothing else. The free
//! functions at the bottom of the module ([`damage_entity`], [`kill_entity`],
//! ...) apply those transitions to an entity in an [`Arena`], translate them
//! into [`Notification`]s and perform the kind-specific death handling:
//!
//! - players schedule a respawn and switch to the ragdoll pose
//! - units are removed from the arena
//!
//! # Example
//!
//! ```
//! use rocketpunch_core::config::HealthConfig;
//! use rocketpunch_core::health::{HealthState, HealthTransition};
//!
//! let mut health = HealthState::from_config(&HealthConfig::default());
//! let changes = health.damage(150.0);
//!
//! assert_eq!(health.health(), 0.0);
//! assert!(!health.is_alive());
//! assert!(changes.contains(&HealthTransition::Died));
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::arena::Arena;
use crate::config::HealthConfig;
use crate::entity::{EntityId, EntityInner, EntityTag, PoseFlags};
use crate::notify::Notification;

/// One observable change produced by a health transition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum HealthTransition {
    /// The health value changed
    Changed {
        /// Value before the change
        old: f32,
        /// Value after the change
        new: f32,
    },
    /// The entity went from alive to dead
    Died,
    /// The entity went from dead to alive
    Revived,
}

/// Health, regeneration and liveness of a damageable entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthState {
    health: f32,
    max_health: f32,
    alive: bool,
    regeneration: f32,
    regen_cooldown: f32,
    regen_interval: f32,
    respawn_delay: f32,
    cooldown_remaining: f32,
    pulse_remaining: f32,
}

impl HealthState {
    /// Full-health state built from configuration.
    #[must_use]
    pub fn from_config(config: &HealthConfig) -> Self {
        Self {
            health: config.max_health,
            max_health: config.max_health,
            alive: true,
            regeneration: config.regeneration,
            regen_cooldown: config.regen_cooldown,
            regen_interval: config.regen_interval,
            respawn_delay: config.respawn_delay,
            cooldown_remaining: 0.0,
            pulse_remaining: config.regen_interval,
        }
    }

    /// Current health.
    #[must_use]
    pub const fn health(&self) -> f32 {
        self.health
    }

    /// Maximum health.
    #[must_use]
    pub const fn max_health(&self) -> f32 {
        self.max_health
    }

    /// Whether the entity is alive.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.alive
    }

    /// Health restored per regeneration pulse.
    #[must_use]
    pub const fn regeneration(&self) -> f32 {
        self.regeneration
    }

    /// Seconds a dead player waits before respawning.
    #[must_use]
    pub const fn respawn_delay(&self) -> f32 {
        self.respawn_delay
    }

    /// Sets the health restored per regeneration pulse.
    pub fn set_regeneration(&mut self, amount: f32) {
        self.regeneration = amount.max(0.0);
    }

    /// Subtracts `amount` from health, clamped to `[0, max]`.
    ///
    /// Dead entities ignore damage. Positive damage restarts the
    /// regeneration cooldown. Reaching zero kills the entity.
    pub fn damage(&mut self, amount: f32) -> Vec<HealthTransition> {
        let mut changes = Vec::new();
        if !self.alive {
            return changes;
        }

        let old = self.health;
        let new = (old - amount).clamp(0.0, self.max_health);
        if (new - old).abs() > f32::EPSILON {
            self.health = new;
            changes.push(HealthTransition::Changed { old, new });
        }
        if amount > 0.0 {
            self.cooldown_remaining = self.regen_cooldown;
        }
        if self.health <= 0.0 {
            changes.extend(self.kill());
        }
        changes
    }

    /// Adds `amount` to health, clamped to the maximum.
    ///
    /// Non-positive amounts and dead entities are ignored.
    pub fn heal(&mut self, amount: f32) -> Vec<HealthTransition> {
        if amount <= 0.0 || !self.alive {
            return Vec::new();
        }
        let old = self.health;
        let new = (old + amount).min(self.max_health);
        if (new - old).abs() > f32::EPSILON {
            self.health = new;
            vec![HealthTransition::Changed { old, new }]
        } else {
            Vec::new()
        }
    }

    /// Drops health to zero and marks the entity dead. Idempotent.
    pub fn kill(&mut self) -> Vec<HealthTransition> {
        let mut changes = Vec::new();
        if !self.alive {
            return changes;
        }
        if self.health > 0.0 {
            changes.push(HealthTransition::Changed {
                old: self.health,
                new: 0.0,
            });
        }
        self.health = 0.0;
        self.alive = false;
        changes.push(HealthTransition::Died);
        changes
    }

    /// Restores full health and marks the entity alive. Idempotent.
    pub fn revive(&mut self) -> Vec<HealthTransition> {
        let mut changes = Vec::new();
        if self.alive {
            return changes;
        }
        let old = self.health;
        self.health = self.max_health;
        self.alive = true;
        self.cooldown_remaining = 0.0;
        self.pulse_remaining = self.regen_interval;
        if (self.max_health - old).abs() > f32::EPSILON {
            changes.push(HealthTransition::Changed {
                old,
                new: self.max_health,
            });
        }
        changes.push(HealthTransition::Revived);
        changes
    }

    /// Advances the regeneration timers by `dt` seconds.
    ///
    /// Once the post-damage cooldown has elapsed, one pulse of
    /// `regeneration` is healed every `regen_interval` seconds.
    pub fn tick(&mut self, dt: f32) -> Vec<HealthTransition> {
        if !self.alive || self.regeneration <= 0.0 {
            return Vec::new();
        }
        if self.cooldown_remaining > 0.0 {
            self.cooldown_remaining = (self.cooldown_remaining - dt).max(0.0);
            return Vec::new();
        }
        self.pulse_remaining -= dt;
        if self.pulse_remaining > 0.0 {
            return Vec::new();
        }
        self.pulse_remaining += self.regen_interval;
        self.heal(self.regeneration)
    }
}

impl Default for HealthState {
    fn default() -> Self {
        Self::from_config(&HealthConfig::default())
    }
}

// =============================================================================
// Arena-level operations
// =============================================================================

/// Damages an entity and publishes the resulting notifications.
///
/// # Returns
///
/// `true` if this call took the entity from alive to dead. Missing entities
/// and entities without health are skipped with a diagnostic.
pub fn damage_entity(arena: &mut Arena, id: EntityId, amount: f32) -> bool {
    with_health(arena, id, "damage", |health| health.damage(amount))
}

/// Heals an entity and publishes the resulting notifications.
pub fn heal_entity(arena: &mut Arena, id: EntityId, amount: f32) {
    with_health(arena, id, "heal", |health| health.heal(amount));
}

/// Kills an entity outright. Returns `true` if it was alive.
pub fn kill_entity(arena: &mut Arena, id: EntityId) -> bool {
    with_health(arena, id, "kill", HealthState::kill)
}

/// Revives a dead entity at full health.
///
/// A pending player respawn is cancelled and the ragdoll pose cleared.
pub fn revive_entity(arena: &mut Arena, id: EntityId) {
    with_health(arena, id, "revive", HealthState::revive);
}

/// Advances regeneration for one entity.
pub fn tick_entity(arena: &mut Arena, id: EntityId, dt: f32) {
    with_health(arena, id, "regenerate", |health| health.tick(dt));
}

fn with_health<F>(arena: &mut Arena, id: EntityId, op: &'static str, f: F) -> bool
where
    F: FnOnce(&mut HealthState) -> Vec<HealthTransition>,
{
    let Some(entity) = arena.get_mut(id) else {
        warn!(entity = %id, op, "health operation on missing entity");
        return false;
    };
    let tag = entity.tag();
    let Some(health) = entity.inner_mut().health_mut() else {
        debug!(entity = %id, %tag, op, "entity has no health");
        return false;
    };
    let transitions = f(health);
    apply_transitions(arena, id, &transitions)
}

/// Publishes transitions and performs death and revive side effects.
///
/// Returns `true` if a death occurred.
fn apply_transitions(arena: &mut Arena, id: EntityId, transitions: &[HealthTransition]) -> bool {
    let mut died = false;
    for transition in transitions {
        match *transition {
            HealthTransition::Changed { old, new } => {
                arena.emit(Notification::HealthChanged {
                    entity: id,
                    old,
                    new,
                });
            }
            HealthTransition::Died => {
                died = true;
                info!(entity = %id, "entity died");
                arena.emit(Notification::Died { entity: id });
                on_death(arena, id);
            }
            HealthTransition::Revived => {
                info!(entity = %id, "entity revived");
                if let Some(player) = arena.get_mut(id).and_then(|e| e.as_player_mut()) {
                    player.control.respawn_in = None;
                    player.control.pose.remove(PoseFlags::RAGDOLL);
                }
                arena.emit(Notification::Revived { entity: id });
            }
        }
    }
    died
}

fn on_death(arena: &mut Arena, id: EntityId) {
    let Some(entity) = arena.get_mut(id) else {
        return;
    };
    if let EntityInner::Player(player) = entity.inner_mut() {
        player.control.respawn_in = Some(player.health.respawn_delay());
        player.control.pose.insert(PoseFlags::RAGDOLL);
        player.control.pose.remove(PoseFlags::PUNCHING);
    } else if entity.tag() == EntityTag::Unit {
        debug!(entity = %id, "despawning dead unit");
        arena.despawn(id);
    }
}
