//! Arena module for the match simulation.
//!
//! The Arena is the container for all entities in a match. It provides:
//! - Entity storage with deterministic iteration order (`BTreeMap`)
//! - Entity lifecycle management (spawn/despawn) and validity checks
//! - Scene-wide queries such as [`Arena::living_players`]
//! - A journal of [`Notification`]s raised while mutating entities
//! - The authority flag of the local peer
//!
//! # Determinism
//!
//! Entity IDs are monotonically increasing and never reused, and the
//! `BTreeMap`'s natural ordering guarantees that iterating over entities
//! always produces the same sequence. A stale [`EntityId`] can therefore never
//! alias a newer entity; looking it up simply fails.
//!
//! # Example
//!
//! ```
//! use rocketpunch_core::arena::Arena;
//! use rocketpunch_core::entity::{EntityInner, PlayerComponents, RocketComponents};
//! use glam::Vec3;
//!
//! let mut arena = Arena::new();
//!
//! let player = arena.spawn(EntityInner::Player(PlayerComponents::at_position(Vec3::ZERO)));
//! let rocket = arena.spawn(EntityInner::Rocket(
//!     RocketComponents::at_position(Vec3::new(0.0, 0.0, 300.0)).with_target(player),
//! ));
//!
//! assert_eq!(arena.living_players(), vec![player]);
//! arena.despawn(rocket);
//! assert!(!arena.contains(rocket));
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entity::{Entity, EntityId, EntityInner, EntityTag};
use crate::notify::Notification;

/// Match arena containing all simulation entities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Arena {
    /// Monotonically increasing entity ID counter.
    next_id: u64,
    /// Entity storage with deterministic iteration order.
    entities: BTreeMap<EntityId, Entity>,
    /// Current simulation tick.
    tick: u64,
    /// Whether this peer owns gameplay outcomes (damage, rewards, rounds).
    authoritative: bool,
    /// Notifications raised since the last [`Arena::take_events`].
    events: Vec<Notification>,
}

impl Arena {
    /// Creates a new empty, authoritative arena at tick 0.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: 0,
            entities: BTreeMap::new(),
            tick: 0,
            authoritative: true,
            events: Vec::new(),
        }
    }

    /// Spawns a new entity in the arena.
    ///
    /// # Arguments
    ///
    /// * `inner` - The entity's component storage; the tag is derived from it
    ///
    /// # Returns
    ///
    /// The unique ID assigned to the new entity.
    pub fn spawn(&mut self, inner: EntityInner) -> EntityId {
        let id = EntityId::new(self.next_id);
        self.next_id += 1;
        self.entities.insert(id, Entity::new(id, inner));
        id
    }

    /// Despawns an entity from the arena.
    ///
    /// # Returns
    ///
    /// The removed entity, if it existed.
    pub fn despawn(&mut self, id: EntityId) -> Option<Entity> {
        self.entities.remove(&id)
    }

    /// Returns a reference to an entity by ID.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Returns a mutable reference to an entity by ID.
    #[must_use]
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Validity check for a weak handle.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Returns an iterator over entity IDs in deterministic (sorted) order.
    pub fn entity_ids_sorted(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.keys().copied()
    }

    /// Returns an iterator over entities in deterministic (sorted by ID) order.
    pub fn entities_sorted(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.entities.values()
    }

    /// Returns an iterator over mutable entities in deterministic order.
    pub fn entities_sorted_mut(&mut self) -> impl Iterator<Item = &mut Entity> + '_ {
        self.entities.values_mut()
    }

    /// IDs of every entity with the given tag, in id order.
    #[must_use]
    pub fn ids_with_tag(&self, tag: EntityTag) -> Vec<EntityId> {
        self.entities
            .values()
            .filter(|e| e.tag() == tag)
            .map(Entity::id)
            .collect()
    }

    /// IDs of every living player, in id order.
    #[must_use]
    pub fn living_players(&self) -> Vec<EntityId> {
        self.entities
            .values()
            .filter(|e| e.is_player() && e.is_alive())
            .map(Entity::id)
            .collect()
    }

    /// Whether `id` refers to a player that is currently alive.
    #[must_use]
    pub fn is_living_player(&self, id: EntityId) -> bool {
        self.get(id).is_some_and(|e| e.is_player() && e.is_alive())
    }

    /// Returns the number of entities in the arena.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Returns true if the arena has no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Returns the current simulation tick.
    #[must_use]
    pub const fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Advances the simulation tick counter.
    pub fn advance_tick(&mut self) {
        self.tick += 1;
    }

    /// Whether this peer applies gameplay outcomes.
    #[must_use]
    pub const fn is_authoritative(&self) -> bool {
        self.authoritative
    }

    /// Sets the authority of this peer.
    pub fn set_authoritative(&mut self, authoritative: bool) {
        self.authoritative = authoritative;
    }

    /// Appends a notification to the journal.
    pub fn emit(&mut self, notification: Notification) {
        self.events.push(notification);
    }

    /// Notifications raised since the last drain, oldest first.
    #[must_use]
    pub fn pending_events(&self) -> &[Notification] {
        &self.events
    }

    /// Drains the notification journal.
    pub fn take_events(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.events)
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
