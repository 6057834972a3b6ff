//! Punch plugin: melee attack that redirects rockets and damages enemies.
//!
//! # Supported Entity Types
//!
//! - Players
//!
//! # Outputs
//!
//! - `Command::ThrowPunch`: starts the cooldown and the punching pose
//! - `Command::RedirectRocket`: the punch connected with a rocket
//! - `Modifier::GrantExperience`: reward for a redirect or a landed hit
//! - `Modifier::ApplyDamage`: the punch connected with an enemy; the combat
//!   resolver announces it as `PunchLanded` once the damage is applied
//!
//! A punch is a swept sphere from the player's eye along the view
//! direction. Player body colliders are skipped, so other players are only
//! hit through their hit center.

use tracing::debug;

use crate::config::PunchConfig;
use crate::entity::{CollisionTags, EntityTag};
use crate::output::{Command, KillReward, Modifier, Output, OutputKind, PluginId};
use crate::plugin::{ComponentKind, Plugin, PluginContext, PluginDeclaration};
use crate::trace::TraceRequest;
use crate::world_view::WorldView;

/// Plugin handling player punches.
pub struct PunchPlugin {
    declaration: PluginDeclaration,
    config: PunchConfig,
}

impl PunchPlugin {
    /// Creates a punch plugin with the given tuning.
    #[must_use]
    pub fn new(config: PunchConfig) -> Self {
        Self {
            declaration: PluginDeclaration {
                id: PluginId::from_static("punch"),
                required_tags: vec![EntityTag::Player],
                reads: vec![
                    ComponentKind::Transform,
                    ComponentKind::Control,
                    ComponentKind::Health,
                    ComponentKind::Team,
                ],
                emits: vec![OutputKind::Command, OutputKind::Modifier],
            },
            config,
        }
    }
}

impl Default for PunchPlugin {
    fn default() -> Self {
        Self::new(PunchConfig::default())
    }
}

impl Plugin for PunchPlugin {
    fn declaration(&self) -> &PluginDeclaration {
        &self.declaration
    }

    fn run(&self, ctx: &PluginContext, view: &WorldView) -> Vec<Output> {
        let mut outputs = vec![];
        let source = ctx.entity_id;

        let Some(control) = view.get_control(source) else {
            return outputs;
        };
        if !control.wants_punch() {
            return outputs;
        }
        if !view.get_health(source).is_some_and(|h| h.is_alive()) {
            return outputs;
        }
        let Some(transform) = view.get_transform(source) else {
            return outputs;
        };

        outputs.push(Output::Command(Command::ThrowPunch {
            source,
            cooldown: self.config.cooldown,
            pose_duration: self.config.pose_duration,
        }));

        let request = TraceRequest {
            start: transform.position + control.eye_offset,
            direction: control.input.view_direction,
            range: self.config.range,
            radius: self.config.radius,
            ignore: Some(source),
            exclude_tags: CollisionTags::PLAYER,
        };
        let Some(hit) = view.trace(&request) else {
            return outputs;
        };

        if view.tag_of(hit.entity) == Some(EntityTag::Rocket) {
            debug!(player = %source, rocket = %hit.entity, "punch hit rocket");
            outputs.push(Output::Command(Command::RedirectRocket {
                rocket: hit.entity,
                instigator: source,
            }));
            outputs.push(Output::Modifier(Modifier::GrantExperience {
                target: source,
                amount: self.config.redirect_experience,
            }));
            return outputs;
        }

        let (Some(health), Some(team)) = (view.get_health(hit.entity), view.get_team(hit.entity))
        else {
            return outputs;
        };
        let own_team = view.get_team(source).map(|t| t.team).unwrap_or_default();
        if !health.is_alive() || own_team.is_same_team(team.team) {
            return outputs;
        }

        debug!(player = %source, target = %hit.entity, "punch landed");
        outputs.push(Output::Modifier(Modifier::ApplyDamage {
            target: hit.entity,
            amount: self.config.damage,
            source: Some(source),
            kill_reward: Some(KillReward {
                coins: self.config.kill_coins,
                experience: self.config.kill_experience,
            }),
        }));
        outputs.push(Output::Modifier(Modifier::GrantExperience {
            target: source,
            amount: self.config.hit_experience,
        }));
        outputs
    }
}

// =============================================================================
// Tests
// =============================================================================
