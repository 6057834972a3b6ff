//! Rocket plugin: target acquisition, pure-pursuit homing and impact detection.
//!
//! # Supported Entity Types
//!
//! - Rockets
//!
//! # Outputs
//!
//! - `Command::AcquireTarget`: the current target is gone or dead
//! - `Command::Explode`: the rocket reached its target
//! - `Command::Steer`: one guidance step otherwise
//!
//! # Guidance
//!
//! Each tick the rocket slerps its orientation toward the direction of the
//! target's aim point by `turn_speed * dt`, doubled in the terminal phase
//! (close range or large angular error), then advances along its forward
//! axis (+X) by `speed * dt`.

use glam::{Quat, Vec3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::config::RocketConfig;
use crate::entity::{CollisionPolicy, EntityTag, Transform};
use crate::output::{Command, Output, OutputKind, PluginId};
use crate::plugin::{ComponentKind, Plugin, PluginContext, PluginDeclaration};
use crate::world_view::WorldView;

/// Plugin driving every rocket.
///
/// # Example
///
/// ```
/// use rocketpunch_core::config::RocketConfig;
/// use rocketpunch_core::plugins::RocketPlugin;
/// use rocketpunch_core::plugin::Plugin;
///
/// let plugin = RocketPlugin::new(RocketConfig::default());
/// assert_eq!(plugin.declaration().id.as_str(), "rocket");
/// ```
pub struct RocketPlugin {
    declaration: PluginDeclaration,
    config: RocketConfig,
}

impl RocketPlugin {
    /// Creates a rocket plugin with the given tuning.
    #[must_use]
    pub fn new(config: RocketConfig) -> Self {
        Self {
            declaration: PluginDeclaration {
                id: PluginId::from_static("rocket"),
                required_tags: vec![EntityTag::Rocket],
                reads: vec![
                    ComponentKind::Transform,
                    ComponentKind::Collider,
                    ComponentKind::Rocket,
                ],
                emits: vec![OutputKind::Command],
            },
            config,
        }
    }
}

impl Default for RocketPlugin {
    fn default() -> Self {
        Self::new(RocketConfig::default())
    }
}

impl Plugin for RocketPlugin {
    fn declaration(&self) -> &PluginDeclaration {
        &self.declaration
    }

    fn run(&self, ctx: &PluginContext, view: &WorldView) -> Vec<Output> {
        let mut outputs = vec![];
        let rocket = ctx.entity_id;

        let Some(state) = view.get_rocket(rocket) else {
            return outputs;
        };
        if state.exploded {
            return outputs;
        }
        let Some(transform) = view.get_transform(rocket) else {
            return outputs;
        };
        let radius = view
            .get_collider(rocket)
            .map_or(self.config.fallback_radius, |c| {
                c.radius_or(self.config.fallback_radius)
            });

        let target = match state.target.filter(|t| view.is_living_player(*t)) {
            Some(target) => Some(target),
            None => {
                let candidates = view.living_players();
                if candidates.is_empty() {
                    debug!(rocket = %rocket, "no living players to target");
                    if state.target.is_some() {
                        outputs.push(Output::Command(Command::AcquireTarget {
                            rocket,
                            target: None,
                        }));
                    }
                    None
                } else {
                    let mut rng = ChaCha8Rng::seed_from_u64(ctx.trace_id.as_u64());
                    let pick = candidates[rng.gen_range(0..candidates.len())];
                    outputs.push(Output::Command(Command::AcquireTarget {
                        rocket,
                        target: Some(pick),
                    }));
                    Some(pick)
                }
            }
        };

        // Without a target the rocket keeps flying straight.
        let aim = target.and_then(|t| view.aim_point(t, self.config.fallback_radius));

        if let (Some(target), Some((point, target_radius))) = (target, aim) {
            let distance = transform.position.distance(point);
            let reached = match self.config.collision_policy {
                CollisionPolicy::Distance => distance <= radius,
                CollisionPolicy::Trigger => distance <= radius + target_radius,
            };
            if reached {
                outputs.push(Output::Command(Command::Explode { rocket, target }));
                return outputs;
            }
        }

        let (position, rotation) = steer_toward(
            transform,
            aim.map(|(point, _)| point),
            state.speed,
            state.turn_speed,
            ctx.dt,
            &self.config,
        );
        outputs.push(Output::Command(Command::Steer {
            rocket,
            position,
            rotation,
        }));
        outputs
    }
}

/// One pure-pursuit guidance step.
///
/// # Returns
///
/// The new position and orientation. With no aim point the orientation is
/// kept and the rocket moves straight ahead.
#[must_use]
pub fn steer_toward(
    transform: &Transform,
    aim: Option<Vec3>,
    speed: f32,
    turn_speed: f32,
    dt: f32,
    config: &RocketConfig,
) -> (Vec3, Quat) {
    let mut rotation = transform.rotation;

    if let Some(point) = aim {
        let to_target = point - transform.position;
        let direction = to_target.normalize_or_zero();
        if direction != Vec3::ZERO {
            let angle = transform.forward().angle_between(direction).to_degrees();
            let terminal =
                to_target.length() <= config.terminal_range || angle > config.terminal_angle_deg;
            let multiplier = if terminal {
                config.terminal_turn_multiplier
            } else {
                1.0
            };
            let desired = Quat::from_rotation_arc(Vec3::X, direction);
            let t = (turn_speed * multiplier * dt).clamp(0.0, 1.0);
            rotation = rotation.slerp(desired, t).normalize();
        }
    }

    let position = transform.position + (rotation * Vec3::X) * speed * dt;
    (position, rotation)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Arena;
    use crate::entity::{EntityId, EntityInner, PlayerComponents, RocketComponents};
    use crate::health::kill_entity;
    use crate::output::TraceId;

    const DT: f32 = 1.0 / 60.0;

    fn ctx(entity_id: EntityId, trace: u64) -> PluginContext {
        PluginContext {
            entity_id,
            tick: 0,
            trace_id: TraceId::new(trace),
            dt: DT,
        }
    }

    fn run(plugin: &RocketPlugin, arena: &Arena, rocket: EntityId) -> Vec<Output> {
        let view = WorldView::for_plugin(arena, plugin.declaration(), arena.current_tick());
        plugin.run(&ctx(rocket, 7), &view)
    }

    fn commands(outputs: &[Output]) -> Vec<&Command> {
        outputs.iter().filter_map(Output::as_command).collect()
    }

    #[test]
    fn declaration_reads_rocket_components() {
        let plugin = RocketPlugin::default();
        let decl = plugin.declaration();
        assert!(decl.supports_tag(EntityTag::Rocket));
        assert!(decl.reads_component(ComponentKind::Rocket));
        assert!(decl.reads_component(ComponentKind::Collider));
        assert!(!decl.reads_component(ComponentKind::Health));
    }

    #[test]
    fn steers_toward_valid_target() {
        let plugin = RocketPlugin::default();
        let mut arena = Arena::new();
        let player = arena.spawn(EntityInner::Player(PlayerComponents::at_position(Vec3::ZERO)));
        let rocket = arena.spawn(EntityInner::Rocket(
            RocketComponents::at_position(Vec3::new(1000.0, 0.0, 48.0)).with_target(player),
        ));

        let outputs = run(&plugin, &arena, rocket);
        let cmds = commands(&outputs);
        assert_eq!(cmds.len(), 1);
        let Command::Steer { position, .. } = cmds[0] else {
            panic!("expected steer, got {:?}", cmds[0]);
        };
        assert!(position.distance(Vec3::new(1000.0, 0.0, 48.0)) > 6.0);
    }

    #[test]
    fn acquires_target_when_missing() {
        let plugin = RocketPlugin::default();
        let mut arena = Arena::new();
        let player = arena.spawn(EntityInner::Player(PlayerComponents::at_position(Vec3::ZERO)));
        let rocket =
            arena.spawn(EntityInner::Rocket(RocketComponents::at_position(Vec3::Z * 500.0)));

        let outputs = run(&plugin, &arena, rocket);
        assert_eq!(
            commands(&outputs)[0],
            &Command::AcquireTarget {
                rocket,
                target: Some(player)
            }
        );
    }

    #[test]
    fn dead_target_is_replaced() {
        let plugin = RocketPlugin::default();
        let mut arena = Arena::new();
        let dead = arena.spawn(EntityInner::Player(PlayerComponents::at_position(Vec3::ZERO)));
        let alive =
            arena.spawn(EntityInner::Player(PlayerComponents::at_position(Vec3::X * 300.0)));
        let rocket = arena.spawn(EntityInner::Rocket(
            RocketComponents::at_position(Vec3::new(0.0, 0.0, 500.0)).with_target(dead),
        ));
        kill_entity(&mut arena, dead);

        let outputs = run(&plugin, &arena, rocket);
        assert_eq!(
            commands(&outputs)[0],
            &Command::AcquireTarget {
                rocket,
                target: Some(alive)
            }
        );
    }

    #[test]
    fn no_candidates_flies_straight() {
        let plugin = RocketPlugin::default();
        let mut arena = Arena::new();
        let rocket = arena.spawn(EntityInner::Rocket(RocketComponents::at_position(Vec3::ZERO)));

        let outputs = run(&plugin, &arena, rocket);
        let cmds = commands(&outputs);
        assert_eq!(cmds.len(), 1);
        let Command::Steer { position, rotation, .. } = cmds[0] else {
            panic!("expected steer");
        };
        assert_eq!(*rotation, Quat::IDENTITY);
        assert!((position.x - 400.0 * DT).abs() < 1e-4);
    }

    #[test]
    fn explodes_within_collision_radius() {
        let plugin = RocketPlugin::default();
        let mut arena = Arena::new();
        let player = arena.spawn(EntityInner::Player(PlayerComponents::at_position(Vec3::ZERO)));
        // Hit center sits at z = 48; rocket radius is 16
        let rocket = arena.spawn(EntityInner::Rocket(
            RocketComponents::at_position(Vec3::new(10.0, 0.0, 48.0)).with_target(player),
        ));

        let outputs = run(&plugin, &arena, rocket);
        assert_eq!(
            commands(&outputs),
            vec![&Command::Explode {
                rocket,
                target: player
            }]
        );
    }

    #[test]
    fn trigger_policy_adds_target_radius() {
        let config = RocketConfig {
            collision_policy: CollisionPolicy::Trigger,
            ..RocketConfig::default()
        };
        let plugin = RocketPlugin::new(config);
        let mut arena = Arena::new();
        let player = arena.spawn(EntityInner::Player(PlayerComponents::at_position(Vec3::ZERO)));
        // 25 units from the hit center: outside 16, inside 16 + 12
        let rocket = arena.spawn(EntityInner::Rocket(
            RocketComponents::at_position(Vec3::new(25.0, 0.0, 48.0)).with_target(player),
        ));

        let outputs = run(&plugin, &arena, rocket);
        assert!(matches!(commands(&outputs)[0], Command::Explode { .. }));
        let baseline = run(&RocketPlugin::default(), &arena, rocket);
        assert!(matches!(commands(&baseline)[0], Command::Steer { .. }));
    }

    #[test]
    fn exploded_rocket_is_inert() {
        let plugin = RocketPlugin::default();
        let mut arena = Arena::new();
        let player = arena.spawn(EntityInner::Player(PlayerComponents::at_position(Vec3::ZERO)));
        let mut components =
            RocketComponents::at_position(Vec3::new(0.0, 0.0, 48.0)).with_target(player);
        components.rocket.exploded = true;
        let rocket = arena.spawn(EntityInner::Rocket(components));

        assert!(run(&plugin, &arena, rocket).is_empty());
    }

    mod steering_tests {
        use super::*;

        #[test]
        fn turns_gradually_far_away() {
            let config = RocketConfig::default();
            let transform = Transform::at(Vec3::ZERO);
            // Target 90° to the left and far away: terminal boost because of the angle
            let aim = Some(Vec3::new(0.0, 5000.0, 0.0));
            let (_, rotation) = steer_toward(&transform, aim, 400.0, 2.0, DT, &config);
            let turned = (rotation * Vec3::X).angle_between(Vec3::X).to_degrees();
            // Slerp fraction 2 * 2 / 60 of 90°
            assert!((turned - 6.0).abs() < 0.1, "turned {turned}");
        }

        #[test]
        fn no_boost_for_small_error_far_away() {
            let config = RocketConfig::default();
            let transform = Transform::at(Vec3::ZERO);
            let target = Quat::from_rotation_z(30f32.to_radians()) * Vec3::X * 5000.0;
            let (_, rotation) = steer_toward(&transform, Some(target), 400.0, 2.0, DT, &config);
            let turned = (rotation * Vec3::X).angle_between(Vec3::X).to_degrees();
            assert!((turned - 1.0).abs() < 0.05, "turned {turned}");
        }

        #[test]
        fn advances_by_speed() {
            let config = RocketConfig::default();
            let transform = Transform::at(Vec3::ZERO);
            let (position, _) = steer_toward(&transform, None, 600.0, 2.0, 0.5, &config);
            assert!((position - Vec3::new(300.0, 0.0, 0.0)).length() < 1e-3);
        }

        #[test]
        fn large_step_snaps_to_target_direction() {
            let config = RocketConfig::default();
            let transform = Transform::at(Vec3::ZERO);
            let (_, rotation) =
                steer_toward(&transform, Some(Vec3::new(0.0, 0.0, 100.0)), 1.0, 10.0, 1.0, &config);
            assert!(((rotation * Vec3::X) - Vec3::Z).length() < 1e-4);
        }
    }
}
