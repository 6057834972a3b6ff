//! Rocket resolver: target acquisition, redirects and explosions.
//!
//! The `RocketResolver` handles:
//! - `AcquireTarget`: replaces an invalid target with a living player
//! - `RedirectRocket`: a punch sends the rocket after another player
//! - `Explode`: one-shot detonation on the current target
//!
//! # Explosion Guard
//!
//! `exploded` is set before any effect is applied, and a rocket whose flag is
//! already set ignores every further command. Two `Explode` commands for the
//! same rocket in one tick therefore damage the target once.

use tracing::{debug, info, warn};

use crate::arena::Arena;
use crate::config::RocketConfig;
use crate::entity::{Entity, EntityId};
use crate::health::damage_entity;
use crate::notify::Notification;
use crate::output::{Command, OutputEnvelope, OutputKind};

use super::Resolver;

/// Resolver for rocket targeting and detonation.
#[derive(Debug, Clone)]
pub struct RocketResolver {
    redirect_speed_multiplier: f32,
}

impl RocketResolver {
    /// Creates a rocket resolver with the redirect tuning from `config`.
    #[must_use]
    pub fn new(config: &RocketConfig) -> Self {
        Self {
            redirect_speed_multiplier: config.redirect_speed_multiplier,
        }
    }

    fn acquire(next: &mut Arena, rocket: EntityId, target: Option<EntityId>) {
        if let Some(new) = target {
            if !next.is_living_player(new) {
                debug!(rocket = %rocket, target = %new, "acquired target no longer valid");
                return;
            }
        }
        let Some(components) = next.get_mut(rocket).and_then(Entity::as_rocket_mut) else {
            return;
        };
        let state = &mut components.rocket;
        if state.exploded || state.target == target {
            return;
        }
        let old = state.target;
        state.target = target;

        match target {
            Some(new) => {
                debug!(rocket = %rocket, target = %new, "rocket acquired target");
                next.emit(Notification::RocketTargetChanged { rocket, old, new });
            }
            None => warn!(rocket = %rocket, "no living player left to target; flying straight"),
        }
    }

    fn explode(next: &mut Arena, rocket: EntityId, target: EntityId) {
        let living_target = next.is_living_player(target);
        let Some(components) = next.get_mut(rocket).and_then(Entity::as_rocket_mut) else {
            return;
        };
        let state = &components.rocket;
        if state.exploded || state.target != Some(target) || !living_target {
            debug!(rocket = %rocket, target = %target, "stale explode command dropped");
            return;
        }
        components.rocket.exploded = true;
        let damage = components.rocket.damage;
        let position = components.transform.position;

        if next.is_authoritative() {
            damage_entity(next, target, damage);
        }
        next.despawn(rocket);
        info!(rocket = %rocket, target = %target, "rocket exploded");
        next.emit(Notification::RocketExploded {
            rocket,
            target,
            position,
        });
    }
}

impl Resolver for RocketResolver {
    fn handles(&self) -> &[OutputKind] {
        &[OutputKind::Command]
    }

    fn resolve(&self, outputs: &[&OutputEnvelope], _current: &Arena, next: &mut Arena) {
        for envelope in outputs {
            match envelope.output().as_command() {
                Some(Command::AcquireTarget { rocket, target }) => {
                    Self::acquire(next, *rocket, *target);
                }
                Some(Command::RedirectRocket { rocket, instigator }) => {
                    if next.is_authoritative() {
                        redirect_rocket(next, *rocket, *instigator, self.redirect_speed_multiplier);
                    } else {
                        debug!(rocket = %rocket, "redirect left to the host");
                    }
                }
                Some(Command::Explode { rocket, target }) => Self::explode(next, *rocket, *target),
                _ => {}
            }
        }
    }
}

/// Sends a rocket after the first living player (in id order) that is not
/// its current target.
///
/// The instigator is a valid choice. With no alternative the rocket is left
/// untouched.
///
/// # Returns
///
/// The new target, or `None` if nothing changed.
pub fn redirect_rocket(
    arena: &mut Arena,
    rocket: EntityId,
    instigator: EntityId,
    speed_multiplier: f32,
) -> Option<EntityId> {
    let current = arena.get(rocket).and_then(Entity::as_rocket)?;
    if current.rocket.exploded {
        return None;
    }
    let old = current.rocket.target;
    let Some(to) = arena.living_players().into_iter().find(|p| Some(*p) != old) else {
        debug!(rocket = %rocket, "no alternative target for redirect");
        return None;
    };
    retarget_rocket(arena, rocket, to, instigator, speed_multiplier).then_some(to)
}

/// Points a rocket at `to`, applies the redirect speed multiplier and
/// records the redirect.
///
/// Used by the authority after choosing a target and by clients replaying a
/// replicated redirect.
///
/// # Returns
///
/// `false` if the rocket is missing or has exploded.
pub fn retarget_rocket(
    arena: &mut Arena,
    rocket: EntityId,
    to: EntityId,
    instigator: EntityId,
    speed_multiplier: f32,
) -> bool {
    let Some(components) = arena.get_mut(rocket).and_then(Entity::as_rocket_mut) else {
        return false;
    };
    let state = &mut components.rocket;
    if state.exploded {
        return false;
    }
    let from = state.target;
    state.target = Some(to);
    state.speed *= speed_multiplier;
    state.redirects += 1;
    let (speed, redirects) = (state.speed, state.redirects);

    info!(
        rocket = %rocket,
        to = %to,
        instigator = %instigator,
        speed,
        redirects,
        "rocket redirected"
    );
    arena.emit(Notification::RocketRedirected {
        rocket,
        from,
        to,
        instigator,
    });
    true
}
