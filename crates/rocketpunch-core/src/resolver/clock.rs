//! Clock resolver: advances every per-tick timer by one fixed timestep.
//!
//! The `ClockResolver` consumes no outputs. It runs last in the pipeline and
//! walks the arena in id order:
//!
//! - Players: punch cooldown, punching pose, input edge, scripted respawn
//! - Players and units: health regeneration, team change detection
//! - Rockets: lifetime countdown and stuck detection
//!
//! Respawns and regeneration change health, so they only run on an
//! authoritative arena. Everything else runs on every peer.

use tracing::{debug, info};

use crate::arena::Arena;
use crate::config::RocketConfig;
use crate::entity::{Entity, EntityId, EntityTag, PoseFlags};
use crate::health::{revive_entity, tick_entity};
use crate::notify::{ExpiryReason, Notification};
use crate::output::{OutputEnvelope, OutputKind};
use crate::simulation::{count_down, count_up};
use crate::team::TeamState;

use super::Resolver;

/// Resolver advancing timers by a fixed `dt`.
#[derive(Debug, Clone)]
pub struct ClockResolver {
    dt: f32,
    stuck_window: f32,
    stuck_min_travel: f32,
}

impl ClockResolver {
    /// Creates a clock stepping `dt` seconds per tick, with stuck detection
    /// tuned from `rocket`.
    #[must_use]
    pub fn new(dt: f32, rocket: &RocketConfig) -> Self {
        Self {
            dt,
            stuck_window: rocket.stuck_window,
            stuck_min_travel: rocket.stuck_min_travel,
        }
    }

    fn tick_player(&self, next: &mut Arena, id: EntityId) {
        let authoritative = next.is_authoritative();
        let Some(player) = next.get_mut(id).and_then(Entity::as_player_mut) else {
            return;
        };
        let control = &mut player.control;

        if control.punch_cooldown > 0.0 && count_down(&mut control.punch_cooldown, self.dt) {
            control.punch_cooldown = 0.0;
        }
        if control.pose_timer > 0.0 && count_down(&mut control.pose_timer, self.dt) {
            control.pose_timer = 0.0;
            control.pose.remove(PoseFlags::PUNCHING);
        }
        control.input.punch = false;

        let mut respawn = false;
        if authoritative {
            if let Some(remaining) = control.respawn_in.as_mut() {
                respawn = count_down(remaining, self.dt);
            }
        }
        if respawn {
            player.transform.position = player.control.spawn_point;
            info!(player = %id, "respawning at spawn point");
            revive_entity(next, id);
        }
    }

    fn tick_vitals(&self, next: &mut Arena, id: EntityId) {
        if next.is_authoritative() {
            tick_entity(next, id, self.dt);
        }
        let change = next
            .get_mut(id)
            .and_then(|e| e.inner_mut().team_mut())
            .and_then(TeamState::detect_change);
        if let Some((old, new)) = change {
            info!(entity = %id, %old, %new, "team changed");
            next.emit(Notification::TeamChanged { entity: id, old, new });
        }
    }

    fn tick_rocket(&self, next: &mut Arena, id: EntityId) {
        let Some(components) = next.get_mut(id).and_then(Entity::as_rocket_mut) else {
            return;
        };
        let position = components.transform.position;
        let state = &mut components.rocket;
        if state.exploded {
            return;
        }

        let reason = if count_down(&mut state.lifetime, self.dt) {
            Some(ExpiryReason::Lifetime)
        } else if count_up(&mut state.stuck_elapsed, self.stuck_window, self.dt) {
            let travelled = position.distance(state.stuck_sample);
            if travelled < self.stuck_min_travel {
                Some(ExpiryReason::Stuck)
            } else {
                state.stuck_elapsed = 0.0;
                state.stuck_sample = position;
                None
            }
        } else {
            None
        };

        if let Some(reason) = reason {
            next.despawn(id);
            info!(rocket = %id, %reason, "rocket expired");
            next.emit(Notification::RocketExpired { rocket: id, reason });
        }
    }
}

impl Resolver for ClockResolver {
    fn handles(&self) -> &[OutputKind] {
        &[]
    }

    fn resolve(&self, _outputs: &[&OutputEnvelope], _current: &Arena, next: &mut Arena) {
        let ids: Vec<(EntityId, EntityTag)> =
            next.entities_sorted().map(|e| (e.id(), e.tag())).collect();
        for (id, tag) in ids {
            match tag {
                EntityTag::Player => {
                    self.tick_player(next, id);
                    self.tick_vitals(next, id);
                }
                EntityTag::Unit => self.tick_vitals(next, id),
                EntityTag::Rocket => self.tick_rocket(next, id),
                EntityTag::Prop => {}
            }
        }
        debug!(tick = next.current_tick(), "clock advanced");
    }
}
