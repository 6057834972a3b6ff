//! Entity module: handles, kind tags and tagged component storage.
//!
//! This module provides the core entity types for the arena:
//! - [`EntityId`]: Handle for an entity stored in the [`Arena`](crate::arena::Arena)
//! - [`EntityTag`]: Closed classification of every kind of entity in a match
//! - [`EntityInner`]: Type-safe storage for kind-specific components
//! - [`Entity`]: The complete entity container
//!
//! # Handles are weak
//!
//! An `EntityId` never owns anything. Rockets hold the id of their target, the
//! round manager holds the id of the live rocket, but the referenced entity can
//! be despawned at any time. Every consumer looks the id up in the arena and
//! treats a missing entity as "reference no longer valid".
//!
//! # Capability queries
//!
//! Instead of probing an entity for optional behaviours at runtime, the
//! [`EntityInner`] enum answers capability queries (`health()`, `team()`,
//! `collider()`, ...) over the closed set of kinds.
//!
//! # Example
//!
//! ```
//! use rocketpunch_core::entity::{Entity, EntityId, EntityTag, EntityInner};
//! use rocketpunch_core::entity::components::PlayerComponents;
//! use glam::Vec3;
//!
//! let player = Entity::new(
//!     EntityId::new(42),
//!     EntityInner::Player(PlayerComponents::at_position(Vec3::ZERO)),
//! );
//!
//! assert_eq!(player.id().as_u64(), 42);
//! assert_eq!(player.tag(), EntityTag::Player);
//! assert!(player.inner().health().is_some());
//! ```

pub mod components;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::currency::Wallet;
use crate::health::HealthState;
use crate::team::TeamState;

pub use components::{
    Collider, ColliderShape, CollisionPolicy, CollisionTags, HitCenter, PlayerComponents,
    PlayerControl, PlayerInput, PoseFlags, PropComponents, RocketComponents, RocketState,
    Transform, UnitComponents,
};

/// Handle for an entity in the arena.
///
/// `EntityId` is a newtype wrapper around `u64`. Ids are handed out
/// monotonically and never reused, so a stale handle can never alias a
/// newer entity.
///
/// # Example
///
/// ```
/// use rocketpunch_core::entity::EntityId;
///
/// let id1 = EntityId::new(1);
/// let id2 = EntityId::new(2);
///
/// assert!(id1 < id2);
/// assert_eq!(id1.as_u64(), 1);
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Creates a new `EntityId` from a raw `u64` value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw `u64` value of this identifier.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

impl From<EntityId> for u64 {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

/// Entity kind tag for plugin bundle selection.
///
/// # Variants
///
/// - `Player`: A human-controlled fighter with health, team, wallet and input
/// - `Rocket`: A homing rocket chasing one player
/// - `Unit`: A non-player damageable body (training dummy, bot) with health and team
/// - `Prop`: Static world geometry that only blocks traces
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityTag {
    /// Player-controlled fighter
    Player,
    /// Homing rocket
    Rocket,
    /// Non-player damageable body
    Unit,
    /// Static world geometry
    Prop,
}

impl fmt::Display for EntityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Player => write!(f, "Player"),
            Self::Rocket => write!(f, "Rocket"),
            Self::Unit => write!(f, "Unit"),
            Self::Prop => write!(f, "Prop"),
        }
    }
}

/// Type-safe storage for kind-specific components.
///
/// The tag of an entity is always derived from its inner variant, so the two
/// can never disagree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntityInner {
    /// Player components (transform, body, hit center, health, team, wallet, control)
    Player(PlayerComponents),
    /// Rocket components (transform, body, guidance state)
    Rocket(RocketComponents),
    /// Unit components (transform, body, health, team)
    Unit(UnitComponents),
    /// Prop components (transform, body)
    Prop(PropComponents),
}

impl EntityInner {
    /// Returns the corresponding `EntityTag` for this inner storage.
    #[must_use]
    pub const fn tag(&self) -> EntityTag {
        match self {
            Self::Player(_) => EntityTag::Player,
            Self::Rocket(_) => EntityTag::Rocket,
            Self::Unit(_) => EntityTag::Unit,
            Self::Prop(_) => EntityTag::Prop,
        }
    }

    /// Returns the player components, if this is a player.
    #[must_use]
    pub const fn as_player(&self) -> Option<&PlayerComponents> {
        match self {
            Self::Player(components) => Some(components),
            _ => None,
        }
    }

    /// Returns mutable player components, if this is a player.
    #[must_use]
    pub fn as_player_mut(&mut self) -> Option<&mut PlayerComponents> {
        match self {
            Self::Player(components) => Some(components),
            _ => None,
        }
    }

    /// Returns the rocket components, if this is a rocket.
    #[must_use]
    pub const fn as_rocket(&self) -> Option<&RocketComponents> {
        match self {
            Self::Rocket(components) => Some(components),
            _ => None,
        }
    }

    /// Returns mutable rocket components, if this is a rocket.
    #[must_use]
    pub fn as_rocket_mut(&mut self) -> Option<&mut RocketComponents> {
        match self {
            Self::Rocket(components) => Some(components),
            _ => None,
        }
    }

    /// Returns the unit components, if this is a unit.
    #[must_use]
    pub const fn as_unit(&self) -> Option<&UnitComponents> {
        match self {
            Self::Unit(components) => Some(components),
            _ => None,
        }
    }

    /// Returns mutable unit components, if this is a unit.
    #[must_use]
    pub fn as_unit_mut(&mut self) -> Option<&mut UnitComponents> {
        match self {
            Self::Unit(components) => Some(components),
            _ => None,
        }
    }

    /// Every entity kind has a transform.
    #[must_use]
    pub const fn transform(&self) -> &Transform {
        match self {
            Self::Player(c) => &c.transform,
            Self::Rocket(c) => &c.transform,
            Self::Unit(c) => &c.transform,
            Self::Prop(c) => &c.transform,
        }
    }

    /// Mutable access to the transform.
    #[must_use]
    pub fn transform_mut(&mut self) -> &mut Transform {
        match self {
            Self::Player(c) => &mut c.transform,
            Self::Rocket(c) => &mut c.transform,
            Self::Unit(c) => &mut c.transform,
            Self::Prop(c) => &mut c.transform,
        }
    }

    /// Every entity kind has a body collider.
    #[must_use]
    pub const fn collider(&self) -> &Collider {
        match self {
            Self::Player(c) => &c.collider,
            Self::Rocket(c) => &c.collider,
            Self::Unit(c) => &c.collider,
            Self::Prop(c) => &c.collider,
        }
    }

    /// Health, for kinds that can be damaged.
    #[must_use]
    pub const fn health(&self) -> Option<&HealthState> {
        match self {
            Self::Player(c) => Some(&c.health),
            Self::Unit(c) => Some(&c.health),
            Self::Rocket(_) | Self::Prop(_) => None,
        }
    }

    /// Mutable health, for kinds that can be damaged.
    #[must_use]
    pub fn health_mut(&mut self) -> Option<&mut HealthState> {
        match self {
            Self::Player(c) => Some(&mut c.health),
            Self::Unit(c) => Some(&mut c.health),
            Self::Rocket(_) | Self::Prop(_) => None,
        }
    }

    /// Team assignment, for kinds that belong to a team.
    #[must_use]
    pub const fn team(&self) -> Option<&TeamState> {
        match self {
            Self::Player(c) => Some(&c.team),
            Self::Unit(c) => Some(&c.team),
            Self::Rocket(_) | Self::Prop(_) => None,
        }
    }

    /// Mutable team assignment.
    #[must_use]
    pub fn team_mut(&mut self) -> Option<&mut TeamState> {
        match self {
            Self::Player(c) => Some(&mut c.team),
            Self::Unit(c) => Some(&mut c.team),
            Self::Rocket(_) | Self::Prop(_) => None,
        }
    }

    /// Currency wallet; only players earn rewards.
    #[must_use]
    pub const fn wallet(&self) -> Option<&Wallet> {
        match self {
            Self::Player(c) => Some(&c.wallet),
            _ => None,
        }
    }

    /// Mutable currency wallet.
    #[must_use]
    pub fn wallet_mut(&mut self) -> Option<&mut Wallet> {
        match self {
            Self::Player(c) => Some(&mut c.wallet),
            _ => None,
        }
    }
}

/// A complete entity in the arena.
///
/// An `Entity` combines a unique [`EntityId`] with its [`EntityInner`]
/// component storage. The [`EntityTag`] is derived from the inner variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    id: EntityId,
    inner: EntityInner,
}

impl Entity {
    /// Creates a new entity with the given ID and inner storage.
    #[must_use]
    pub const fn new(id: EntityId, inner: EntityInner) -> Self {
        Self { id, inner }
    }

    /// Returns the entity's unique identifier.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Returns the entity's kind tag.
    #[must_use]
    pub const fn tag(&self) -> EntityTag {
        self.inner.tag()
    }

    /// Returns a reference to the entity's inner component storage.
    #[must_use]
    pub const fn inner(&self) -> &EntityInner {
        &self.inner
    }

    /// Returns a mutable reference to the entity's inner component storage.
    #[must_use]
    pub fn inner_mut(&mut self) -> &mut EntityInner {
        &mut self.inner
    }

    /// Returns `true` if this entity is a player.
    #[must_use]
    pub const fn is_player(&self) -> bool {
        matches!(self.inner, EntityInner::Player(_))
    }

    /// Returns `true` if this entity is a rocket.
    #[must_use]
    pub const fn is_rocket(&self) -> bool {
        matches!(self.inner, EntityInner::Rocket(_))
    }

    /// Returns `true` if the entity has health and is currently alive.
    ///
    /// Rockets and props are never "alive" in the gameplay sense.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.inner.health().is_some_and(HealthState::is_alive)
    }

    /// Returns the player components if this is a player.
    #[must_use]
    pub const fn as_player(&self) -> Option<&PlayerComponents> {
        self.inner.as_player()
    }

    /// Returns mutable player components if this is a player.
    #[must_use]
    pub fn as_player_mut(&mut self) -> Option<&mut PlayerComponents> {
        self.inner.as_player_mut()
    }

    /// Returns the rocket components if this is a rocket.
    #[must_use]
    pub const fn as_rocket(&self) -> Option<&RocketComponents> {
        self.inner.as_rocket()
    }

    /// Returns mutable rocket components if this is a rocket.
    #[must_use]
    pub fn as_rocket_mut(&mut self) -> Option<&mut RocketComponents> {
        self.inner.as_rocket_mut()
    }

    /// Returns the unit components if this is a unit.
    #[must_use]
    pub const fn as_unit(&self) -> Option<&UnitComponents> {
        self.inner.as_unit()
    }

    /// Returns the world position of this entity.
    #[must_use]
    pub const fn position(&self) -> glam::Vec3 {
        self.inner.transform().position
    }
}
