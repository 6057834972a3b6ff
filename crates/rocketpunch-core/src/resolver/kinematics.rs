//! Kinematics resolver: applies rocket guidance steps and punch starts.
//!
//! The `KinematicsResolver` handles:
//! - `Steer` commands: overwrite a rocket's position and orientation
//! - `ThrowPunch` commands: start the punch cooldown and the punching pose
//!
//! Both run on every peer; they only move bodies and animate.

use tracing::trace;

use crate::arena::Arena;
use crate::entity::{Entity, EntityId, PoseFlags};
use crate::output::{Command, OutputEnvelope, OutputKind};

use super::Resolver;

/// Resolver for motion and pose commands.
///
/// # Example
///
/// ```
/// use rocketpunch_core::resolver::{KinematicsResolver, Resolver};
/// use rocketpunch_core::output::OutputKind;
///
/// let resolver = KinematicsResolver::new();
/// assert_eq!(resolver.handles(), &[OutputKind::Command]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct KinematicsResolver;

impl KinematicsResolver {
    /// Creates a new kinematics resolver.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn steer(next: &mut Arena, rocket: EntityId, position: glam::Vec3, rotation: glam::Quat) {
        let Some(components) = next.get_mut(rocket).and_then(Entity::as_rocket_mut) else {
            trace!(rocket = %rocket, "steer for missing rocket");
            return;
        };
        if components.rocket.exploded {
            return;
        }
        components.transform.position = position;
        components.transform.rotation = rotation;
    }

    fn throw_punch(next: &mut Arena, source: EntityId, cooldown: f32, pose_duration: f32) {
        let Some(player) = next.get_mut(source).and_then(Entity::as_player_mut) else {
            return;
        };
        if !player.health.is_alive() {
            return;
        }
        player.control.punch_cooldown = cooldown;
        player.control.pose_timer = pose_duration;
        player.control.pose.insert(PoseFlags::PUNCHING);
    }
}

impl Resolver for KinematicsResolver {
    fn handles(&self) -> &[OutputKind] {
        &[OutputKind::Command]
    }

    fn resolve(&self, outputs: &[&OutputEnvelope], _current: &Arena, next: &mut Arena) {
        for envelope in outputs {
            match envelope.output().as_command() {
                Some(Command::Steer {
                    rocket,
                    position,
                    rotation,
                }) => Self::steer(next, *rocket, *position, *rotation),
                Some(Command::ThrowPunch {
                    source,
                    cooldown,
                    pose_duration,
                }) => Self::throw_punch(next, *source, *cooldown, *pose_duration),
                _ => {}
            }
        }
    }
}
