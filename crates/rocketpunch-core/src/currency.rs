//! Coins, experience and levels.
//!
//! Levels follow a geometric experience curve: reaching level 2 costs
//! `base` experience, and every further level costs `multiplier` times the
//! previous step (each step floored). With the defaults (100, 1.5) the
//! cumulative thresholds are 0, 100, 250, 475, 812, ...
//!
//! # Example
//!
//! ```
//! use rocketpunch_core::config::CurrencyConfig;
//! use rocketpunch_core::currency::{exp_for_level, Wallet};
//!
//! let config = CurrencyConfig::default();
//! assert_eq!(exp_for_level(3, &config), 250);
//!
//! let mut wallet = Wallet::default();
//! wallet.add_experience(300, &config);
//! assert_eq!(wallet.level(), 3);
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::arena::Arena;
use crate::config::CurrencyConfig;
use crate::entity::EntityId;
use crate::notify::Notification;

/// Highest reachable level; bounds the level scan for huge experience totals.
pub const MAX_LEVEL: u32 = 1000;

/// Cumulative experience required to reach `level`.
///
/// Zero for levels ≤ 1, saturating at `u64::MAX` for absurd levels.
#[must_use]
pub fn exp_for_level(level: u32, config: &CurrencyConfig) -> u64 {
    let mut total: u64 = 0;
    let mut step = config.base_experience_per_level;
    for _ in 2..=level {
        // `as` saturates for values beyond u64
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let floored = step.floor() as u64;
        total = total.saturating_add(floored);
        step *= config.experience_multiplier;
    }
    total
}

/// Level reached with `experience` accumulated, scanning upward from 1.
#[must_use]
pub fn level_for_experience(experience: u32, config: &CurrencyConfig) -> u32 {
    let experience = u64::from(experience);
    let mut level = 1;
    let mut threshold: u64 = 0;
    let mut step = config.base_experience_per_level;
    while level < MAX_LEVEL {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let floored = step.floor() as u64;
        threshold = threshold.saturating_add(floored);
        if threshold > experience {
            break;
        }
        level += 1;
        step *= config.experience_multiplier;
    }
    level
}

/// One observable change to a wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WalletChange {
    /// Coin balance changed
    Coins {
        /// Balance before
        old: u32,
        /// Balance after
        new: u32,
    },
    /// Experience total changed
    Experience {
        /// Total before
        old: u32,
        /// Total after
        new: u32,
    },
    /// A new level was reached
    LevelUp(u32),
}

/// Coins, experience and level of a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    coins: u32,
    experience: u32,
    level: u32,
}

impl Default for Wallet {
    fn default() -> Self {
        Self {
            coins: 0,
            experience: 0,
            level: 1,
        }
    }
}

impl Wallet {
    /// Current coin balance.
    #[must_use]
    pub const fn coins(&self) -> u32 {
        self.coins
    }

    /// Total accumulated experience.
    #[must_use]
    pub const fn experience(&self) -> u32 {
        self.experience
    }

    /// Current level, always ≥ 1.
    #[must_use]
    pub const fn level(&self) -> u32 {
        self.level
    }

    /// Adds experience, levelling up as many times as the total allows.
    pub fn add_experience(&mut self, amount: u32, config: &CurrencyConfig) -> Vec<WalletChange> {
        let mut changes = Vec::new();
        if amount == 0 {
            return changes;
        }
        let old = self.experience;
        self.experience = self.experience.saturating_add(amount);

        while self.level < MAX_LEVEL
            && exp_for_level(self.level + 1, config) <= u64::from(self.experience)
        {
            self.level += 1;
            changes.push(WalletChange::LevelUp(self.level));
        }
        if self.experience != old {
            changes.push(WalletChange::Experience {
                old,
                new: self.experience,
            });
        }
        changes
    }

    /// Replaces the experience total and recomputes the level from scratch.
    pub fn set_experience(
        &mut self,
        experience: u32,
        config: &CurrencyConfig,
    ) -> Vec<WalletChange> {
        let mut changes = Vec::new();
        let old = self.experience;
        let old_level = self.level;
        self.experience = experience;
        self.level = level_for_experience(experience, config);
        if self.level > old_level {
            changes.push(WalletChange::LevelUp(self.level));
        }
        if old != experience {
            changes.push(WalletChange::Experience {
                old,
                new: experience,
            });
        }
        changes
    }

    /// Adds coins, saturating at `u32::MAX`.
    pub fn add_coins(&mut self, amount: u32) -> Vec<WalletChange> {
        let old = self.coins;
        self.coins = self.coins.saturating_add(amount);
        if self.coins == old {
            Vec::new()
        } else {
            vec![WalletChange::Coins {
                old,
                new: self.coins,
            }]
        }
    }

    /// Spends coins if the balance covers `amount`.
    ///
    /// # Returns
    ///
    /// `false` and no change when `amount` exceeds the balance.
    pub fn spend_coins(&mut self, amount: u32) -> (bool, Vec<WalletChange>) {
        if amount > self.coins {
            return (false, Vec::new());
        }
        let old = self.coins;
        self.coins -= amount;
        let changes = if amount == 0 {
            Vec::new()
        } else {
            vec![WalletChange::Coins {
                old,
                new: self.coins,
            }]
        };
        (true, changes)
    }
}

// =============================================================================
// Arena-level operations
// =============================================================================

/// Grants coins to a player and publishes the change.
pub fn grant_coins(arena: &mut Arena, id: EntityId, amount: u32) {
    with_wallet(arena, id, "add_coins", |wallet| wallet.add_coins(amount));
}

/// Spends a player's coins. Returns `false` if the balance is short or the
/// entity has no wallet.
pub fn spend_coins(arena: &mut Arena, id: EntityId, amount: u32) -> bool {
    let mut spent = false;
    with_wallet(arena, id, "spend_coins", |wallet| {
        let (ok, changes) = wallet.spend_coins(amount);
        spent = ok;
        changes
    });
    spent
}

/// Grants experience to a player and publishes the changes.
pub fn grant_experience(arena: &mut Arena, id: EntityId, amount: u32, config: &CurrencyConfig) {
    with_wallet(arena, id, "add_experience", |wallet| {
        wallet.add_experience(amount, config)
    });
}

/// Overwrites a player's experience total and publishes the changes.
pub fn set_experience(arena: &mut Arena, id: EntityId, experience: u32, config: &CurrencyConfig) {
    with_wallet(arena, id, "set_experience", |wallet| {
        wallet.set_experience(experience, config)
    });
}

fn with_wallet<F>(arena: &mut Arena, id: EntityId, op: &'static str, f: F) -> bool
where
    F: FnOnce(&mut Wallet) -> Vec<WalletChange>,
{
    let Some(entity) = arena.get_mut(id) else {
        warn!(entity = %id, op, "wallet operation on missing entity");
        return false;
    };
    let tag = entity.tag();
    let Some(wallet) = entity.inner_mut().wallet_mut() else {
        debug!(entity = %id, %tag, op, "entity has no wallet");
        return false;
    };
    for change in f(wallet) {
        let notification = match change {
            WalletChange::Coins { old, new } => Notification::CoinsChanged {
                entity: id,
                old,
                new,
            },
            WalletChange::Experience { old, new } => Notification::ExperienceChanged {
                entity: id,
                old,
                new,
            },
            WalletChange::LevelUp(level) => {
                info!(entity = %id, level, "level up");
                Notification::LevelUp { entity: id, level }
            }
        };
        arena.emit(notification);
    }
    true
}
