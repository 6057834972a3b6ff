//! Gameplay notifications and the observer registry that delivers them.
//!
//! Everything observable that happens in a match is described by a
//! [`Notification`]. The simulation appends notifications to the arena
//! journal; the match drains the journal after every mutation and hands each
//! notification to a [`NotificationHub`], which calls every subscriber whose
//! [`NotificationFilter`] matches.
//!
//! # Example
//!
//! ```
//! use rocketpunch_core::entity::EntityId;
//! use rocketpunch_core::notify::{
//!     Notification, NotificationFilter, NotificationHub, NotificationKind,
//! };
//! use std::sync::{Arc, Mutex};
//!
//! let mut hub = NotificationHub::new();
//! let deaths = Arc::new(Mutex::new(Vec::new()));
//! let sink = Arc::clone(&deaths);
//!
//! hub.subscribe(NotificationFilter::kind(NotificationKind::Died), move |n| {
//!     sink.lock().unwrap().push(n.clone());
//! });
//!
//! hub.publish(&Notification::Died { entity: EntityId::new(3) });
//! hub.publish(&Notification::Revived { entity: EntityId::new(3) });
//!
//! assert_eq!(deaths.lock().unwrap().len(), 1);
//! ```

use std::collections::BTreeMap;
use std::fmt;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::entity::EntityId;
use crate::team::Team;

/// Why a rocket removed itself without exploding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpiryReason {
    /// The lifetime countdown elapsed
    Lifetime,
    /// The rocket barely moved over a full sampling window
    Stuck,
    /// The round ended while the rocket was in flight
    RoundEnded,
}

impl fmt::Display for ExpiryReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lifetime => write!(f, "lifetime"),
            Self::Stuck => write!(f, "stuck"),
            Self::RoundEnded => write!(f, "round ended"),
        }
    }
}

/// Something observable that happened in the match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Notification {
    /// Health value changed
    HealthChanged {
        /// Damaged or healed entity
        entity: EntityId,
        /// Health before
        old: f32,
        /// Health after
        new: f32,
    },
    /// Entity died
    Died {
        /// Entity that died
        entity: EntityId,
    },
    /// Entity came back to life
    Revived {
        /// Entity that was revived
        entity: EntityId,
    },
    /// Team assignment changed
    TeamChanged {
        /// Entity whose team changed
        entity: EntityId,
        /// Previous team
        old: Team,
        /// New team
        new: Team,
    },
    /// Coin balance changed
    CoinsChanged {
        /// Wallet owner
        entity: EntityId,
        /// Balance before
        old: u32,
        /// Balance after
        new: u32,
    },
    /// Experience total changed
    ExperienceChanged {
        /// Wallet owner
        entity: EntityId,
        /// Total before
        old: u32,
        /// Total after
        new: u32,
    },
    /// A new level was reached
    LevelUp {
        /// Wallet owner
        entity: EntityId,
        /// Level reached
        level: u32,
    },
    /// A rocket picked a new target
    RocketTargetChanged {
        /// The rocket
        rocket: EntityId,
        /// Previous target, if any
        old: Option<EntityId>,
        /// New target
        new: EntityId,
    },
    /// A punch sent a rocket after a different player
    RocketRedirected {
        /// The rocket
        rocket: EntityId,
        /// Target before the redirect
        from: Option<EntityId>,
        /// Target after the redirect
        to: EntityId,
        /// Player who punched the rocket
        instigator: EntityId,
    },
    /// A rocket reached its target
    RocketExploded {
        /// The rocket, already despawned
        rocket: EntityId,
        /// The player it hit
        target: EntityId,
        /// Where the explosion happened
        position: Vec3,
    },
    /// A rocket removed itself without exploding
    RocketExpired {
        /// The rocket, already despawned
        rocket: EntityId,
        /// Why it was removed
        reason: ExpiryReason,
    },
    /// A punch damaged an enemy
    PunchLanded {
        /// Puncher
        source: EntityId,
        /// Entity that was hit
        target: EntityId,
        /// Damage dealt
        damage: f32,
    },
    /// A round began
    RoundStarted {
        /// Round number, starting at 1
        round: u32,
        /// Rocket spawned for the round, if any
        rocket: Option<EntityId>,
    },
    /// A round finished
    RoundEnded {
        /// Round number that ended
        round: u32,
        /// Player whose death ended the round
        dead_player: Option<EntityId>,
    },
}

/// Fieldless discriminant of [`Notification`], used for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum NotificationKind {
    HealthChanged,
    Died,
    Revived,
    TeamChanged,
    CoinsChanged,
    ExperienceChanged,
    LevelUp,
    RocketTargetChanged,
    RocketRedirected,
    RocketExploded,
    RocketExpired,
    PunchLanded,
    RoundStarted,
    RoundEnded,
}

impl Notification {
    /// Returns the kind of this notification.
    #[must_use]
    pub const fn kind(&self) -> NotificationKind {
        match self {
            Self::HealthChanged { .. } => NotificationKind::HealthChanged,
            Self::Died { .. } => NotificationKind::Died,
            Self::Revived { .. } => NotificationKind::Revived,
            Self::TeamChanged { .. } => NotificationKind::TeamChanged,
            Self::CoinsChanged { .. } => NotificationKind::CoinsChanged,
            Self::ExperienceChanged { .. } => NotificationKind::ExperienceChanged,
            Self::LevelUp { .. } => NotificationKind::LevelUp,
            Self::RocketTargetChanged { .. } => NotificationKind::RocketTargetChanged,
            Self::RocketRedirected { .. } => NotificationKind::RocketRedirected,
            Self::RocketExploded { .. } => NotificationKind::RocketExploded,
            Self::RocketExpired { .. } => NotificationKind::RocketExpired,
            Self::PunchLanded { .. } => NotificationKind::PunchLanded,
            Self::RoundStarted { .. } => NotificationKind::RoundStarted,
            Self::RoundEnded { .. } => NotificationKind::RoundEnded,
        }
    }

    /// The entity this notification is about, if it concerns one.
    #[must_use]
    pub const fn subject(&self) -> Option<EntityId> {
        match self {
            Self::HealthChanged { entity, .. }
            | Self::Died { entity }
            | Self::Revived { entity }
            | Self::TeamChanged { entity, .. }
            | Self::CoinsChanged { entity, .. }
            | Self::ExperienceChanged { entity, .. }
            | Self::LevelUp { entity, .. } => Some(*entity),
            Self::RocketTargetChanged { rocket, .. }
            | Self::RocketRedirected { rocket, .. }
            | Self::RocketExploded { rocket, .. }
            | Self::RocketExpired { rocket, .. } => Some(*rocket),
            Self::PunchLanded { target, .. } => Some(*target),
            Self::RoundStarted { .. } | Self::RoundEnded { .. } => None,
        }
    }
}

// =============================================================================
// Hub
// =============================================================================

/// Selects which notifications a subscriber receives.
///
/// `None` fields match anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NotificationFilter {
    /// Only notifications of this kind
    pub kind: Option<NotificationKind>,
    /// Only notifications about this entity
    pub entity: Option<EntityId>,
}

impl NotificationFilter {
    /// Matches every notification.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            kind: None,
            entity: None,
        }
    }

    /// Matches every notification of one kind.
    #[must_use]
    pub const fn kind(kind: NotificationKind) -> Self {
        Self {
            kind: Some(kind),
            entity: None,
        }
    }

    /// Narrows the filter to one entity.
    #[must_use]
    pub const fn for_entity(mut self, entity: EntityId) -> Self {
        self.entity = Some(entity);
        self
    }

    /// Whether `notification` passes this filter.
    #[must_use]
    pub fn matches(&self, notification: &Notification) -> bool {
        self.kind.map_or(true, |k| k == notification.kind())
            && self
                .entity
                .map_or(true, |e| notification.subject() == Some(e))
    }
}

/// Handle returned by [`NotificationHub::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

type Callback = Box<dyn FnMut(&Notification) + Send>;

/// Explicit observer registry.
///
/// Subscribers are called in subscription order.
#[derive(Default)]
pub struct NotificationHub {
    next_id: u64,
    subscribers: BTreeMap<SubscriptionId, (NotificationFilter, Callback)>,
}

impl NotificationHub {
    /// Creates an empty hub.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `callback` for notifications matching `filter`.
    pub fn subscribe<F>(&mut self, filter: NotificationFilter, callback: F) -> SubscriptionId
    where
        F: FnMut(&Notification) + Send + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.insert(id, (filter, Box::new(callback)));
        id
    }

    /// Removes a subscription. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.remove(&id).is_some()
    }

    /// Delivers `notification` to every matching subscriber.
    pub fn publish(&mut self, notification: &Notification) {
        for (filter, callback) in self.subscribers.values_mut() {
            if filter.matches(notification) {
                callback(notification);
            }
        }
    }

    /// Number of active subscriptions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    /// Whether there are no subscriptions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}

impl fmt::Debug for NotificationHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationHub")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
