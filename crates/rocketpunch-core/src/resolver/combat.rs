//! Combat resolver for damage, healing and rewards.
//!
//! The `CombatResolver` handles:
//! - `ApplyDamage` modifiers: reduce health, pay the kill reward on a killing blow
//!   and announce attributed hits with `PunchLanded`
//! - `ApplyHealing` modifiers: restore health up to the maximum
//! - `GrantCoins` / `GrantExperience` modifiers: wallet rewards
//!
//! Modifiers are gameplay outcomes: on a non-authoritative arena they are
//! discarded and the host's replicated state wins.

use tracing::{debug, info};

use crate::arena::Arena;
use crate::config::CurrencyConfig;
use crate::currency::{grant_coins, grant_experience};
use crate::entity::{Entity, EntityId};
use crate::health::{damage_entity, heal_entity};
use crate::notify::Notification;
use crate::output::{KillReward, Modifier, OutputEnvelope, OutputKind};

use super::Resolver;

/// Resolver for combat-related modifiers.
///
/// Modifiers are applied in output order, so a reward granted in the same
/// tick as a level threshold is crossed produces its `LevelUp` immediately.
///
/// # Example
///
/// ```
/// use rocketpunch_core::config::CurrencyConfig;
/// use rocketpunch_core::resolver::{CombatResolver, Resolver};
/// use rocketpunch_core::output::OutputKind;
///
/// let resolver = CombatResolver::new(CurrencyConfig::default());
/// assert!(resolver.handles().contains(&OutputKind::Modifier));
/// ```
#[derive(Debug, Clone, Default)]
pub struct CombatResolver {
    currency: CurrencyConfig,
}

impl CombatResolver {
    /// Creates a combat resolver using `currency` for level thresholds.
    #[must_use]
    pub fn new(currency: CurrencyConfig) -> Self {
        Self { currency }
    }

    fn apply_damage(
        &self,
        next: &mut Arena,
        target: EntityId,
        amount: f32,
        source: Option<EntityId>,
        kill_reward: Option<KillReward>,
    ) {
        // Earlier hits this tick may already have killed or removed the target
        if !next.get(target).is_some_and(Entity::is_alive) {
            debug!(target = %target, "damage on dead or missing target dropped");
            return;
        }
        if let Some(source) = source {
            next.emit(Notification::PunchLanded {
                source,
                target,
                damage: amount,
            });
        }
        let killed = damage_entity(next, target, amount);
        if let (true, Some(source), Some(reward)) = (killed, source, kill_reward) {
            self.pay_kill_reward(next, source, reward);
        }
    }

    fn pay_kill_reward(&self, next: &mut Arena, source: EntityId, reward: KillReward) {
        info!(
            source = %source,
            coins = reward.coins,
            experience = reward.experience,
            "kill reward"
        );
        grant_coins(next, source, reward.coins);
        grant_experience(next, source, reward.experience, &self.currency);
    }
}

impl Resolver for CombatResolver {
    fn handles(&self) -> &[OutputKind] {
        &[OutputKind::Modifier]
    }

    fn resolve(&self, outputs: &[&OutputEnvelope], _current: &Arena, next: &mut Arena) {
        if !next.is_authoritative() {
            if !outputs.is_empty() {
                debug!(count = outputs.len(), "modifiers discarded without authority");
            }
            return;
        }

        for envelope in outputs {
            let Some(modifier) = envelope.output().as_modifier() else {
                continue;
            };
            match *modifier {
                Modifier::ApplyDamage {
                    target,
                    amount,
                    source,
                    kill_reward,
                } => self.apply_damage(next, target, amount, source, kill_reward),
                Modifier::ApplyHealing { target, amount } => heal_entity(next, target, amount),
                Modifier::GrantCoins { target, amount } => grant_coins(next, target, amount),
                Modifier::GrantExperience { target, amount } => {
                    grant_experience(next, target, amount, &self.currency);
                }
            }
        }
    }
}
