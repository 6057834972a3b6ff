//! `WorldView` provides scoped, read-only access to arena state for plugins.
//!
//! Plugins must declare which components they read. The `WorldView` enforces
//! this at runtime:
//! - In debug builds, accessing an undeclared component panics
//! - In release builds, it returns `None`
//!
//! Scene queries that only return entity ids ([`WorldView::living_players`],
//! [`WorldView::query_by_tag`], [`WorldView::trace`]) are always allowed.
//!
//! # Example
//!
//! ```
//! use rocketpunch_core::arena::Arena;
//! use rocketpunch_core::entity::{EntityTag, EntityInner, PlayerComponents};
//! use rocketpunch_core::plugin::{PluginDeclaration, PluginId, ComponentKind};
//! use rocketpunch_core::output::OutputKind;
//! use rocketpunch_core::world_view::WorldView;
//! use glam::Vec3;
//!
//! let mut arena = Arena::new();
//! let position = Vec3::new(1.0, 2.0, 3.0);
//! let player = arena.spawn(EntityInner::Player(PlayerComponents::at_position(position)));
//!
//! let decl = PluginDeclaration {
//!     id: PluginId::new("test"),
//!     required_tags: vec![EntityTag::Player],
//!     reads: vec![ComponentKind::Transform],
//!     emits: vec![OutputKind::Command],
//! };
//!
//! let view = WorldView::for_plugin(&arena, &decl, arena.current_tick());
//! assert_eq!(view.get_transform(player).unwrap().position, Vec3::new(1.0, 2.0, 3.0));
//! assert_eq!(view.living_players(), vec![player]);
//! ```

use glam::Vec3;

use crate::arena::Arena;
use crate::currency::Wallet;
use crate::entity::{
    Collider, Entity, EntityId, EntityTag, HitCenter, PlayerControl, RocketState, Transform,
};
use crate::health::HealthState;
use crate::plugin::{ComponentKind, PluginDeclaration};
use crate::team::TeamState;
use crate::trace::{shape_trace, TraceHit, TraceRequest};

/// Scoped, read-only view of the arena for plugin access.
#[derive(Debug)]
pub struct WorldView<'a> {
    arena: &'a Arena,
    tick: u64,
    allowed_components: &'a [ComponentKind],
}

impl<'a> WorldView<'a> {
    /// Creates a `WorldView` scoped to a plugin's declared component access.
    #[must_use]
    pub fn for_plugin(arena: &'a Arena, decl: &'a PluginDeclaration, tick: u64) -> Self {
        Self {
            arena,
            tick,
            allowed_components: &decl.reads,
        }
    }

    /// Creates a `WorldView` with full access to all components.
    ///
    /// Intended for tests and system-level code.
    #[must_use]
    pub fn full_access(arena: &'a Arena, tick: u64) -> Self {
        static ALL_COMPONENTS: &[ComponentKind] = &[
            ComponentKind::Transform,
            ComponentKind::Collider,
            ComponentKind::Health,
            ComponentKind::Team,
            ComponentKind::Wallet,
            ComponentKind::Control,
            ComponentKind::Rocket,
        ];

        Self {
            arena,
            tick,
            allowed_components: ALL_COMPONENTS,
        }
    }

    /// Returns the current simulation tick.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Returns an entity by ID. Always allowed.
    #[must_use]
    pub fn get_entity(&self, id: EntityId) -> Option<&'a Entity> {
        self.arena.get(id)
    }

    /// Kind of an entity. Always allowed.
    #[must_use]
    pub fn tag_of(&self, id: EntityId) -> Option<EntityTag> {
        self.arena.get(id).map(Entity::tag)
    }

    /// Requires `ComponentKind::Transform`.
    #[must_use]
    pub fn get_transform(&self, id: EntityId) -> Option<&'a Transform> {
        self.check_access(ComponentKind::Transform)?;
        Some(self.arena.get(id)?.inner().transform())
    }

    /// Requires `ComponentKind::Collider`.
    #[must_use]
    pub fn get_collider(&self, id: EntityId) -> Option<&'a Collider> {
        self.check_access(ComponentKind::Collider)?;
        Some(self.arena.get(id)?.inner().collider())
    }

    /// Requires `ComponentKind::Collider`. `None` for entities without one.
    #[must_use]
    pub fn get_hit_center(&self, id: EntityId) -> Option<&'a HitCenter> {
        self.check_access(ComponentKind::Collider)?;
        self.arena.get(id)?.as_player()?.hit_center.as_ref()
    }

    /// Requires `ComponentKind::Health`.
    #[must_use]
    pub fn get_health(&self, id: EntityId) -> Option<&'a HealthState> {
        self.check_access(ComponentKind::Health)?;
        self.arena.get(id)?.inner().health()
    }

    /// Requires `ComponentKind::Team`.
    #[must_use]
    pub fn get_team(&self, id: EntityId) -> Option<&'a TeamState> {
        self.check_access(ComponentKind::Team)?;
        self.arena.get(id)?.inner().team()
    }

    /// Requires `ComponentKind::Wallet`.
    #[must_use]
    pub fn get_wallet(&self, id: EntityId) -> Option<&'a Wallet> {
        self.check_access(ComponentKind::Wallet)?;
        self.arena.get(id)?.inner().wallet()
    }

    /// Requires `ComponentKind::Control`.
    #[must_use]
    pub fn get_control(&self, id: EntityId) -> Option<&'a PlayerControl> {
        self.check_access(ComponentKind::Control)?;
        Some(&self.arena.get(id)?.as_player()?.control)
    }

    /// Requires `ComponentKind::Rocket`.
    #[must_use]
    pub fn get_rocket(&self, id: EntityId) -> Option<&'a RocketState> {
        self.check_access(ComponentKind::Rocket)?;
        Some(&self.arena.get(id)?.as_rocket()?.rocket)
    }

    /// Point a rocket aims at on `id` and the radius of the collider there.
    ///
    /// Requires `ComponentKind::Transform` and `ComponentKind::Collider`.
    #[must_use]
    pub fn aim_point(&self, id: EntityId, fallback_radius: f32) -> Option<(Vec3, f32)> {
        self.check_access(ComponentKind::Transform)?;
        self.check_access(ComponentKind::Collider)?;
        let entity = self.arena.get(id)?;
        match entity.as_player() {
            Some(player) => Some(player.aim_point(fallback_radius)),
            None => Some((
                entity.position(),
                entity.inner().collider().radius_or(fallback_radius),
            )),
        }
    }

    /// Living players in id order. Always allowed.
    #[must_use]
    pub fn living_players(&self) -> Vec<EntityId> {
        self.arena.living_players()
    }

    /// Whether `id` is a living player. Always allowed.
    #[must_use]
    pub fn is_living_player(&self, id: EntityId) -> bool {
        self.arena.is_living_player(id)
    }

    /// Entities with a specific tag, in id order. Always allowed.
    pub fn query_by_tag(&self, tag: EntityTag) -> impl Iterator<Item = EntityId> + 'a {
        self.arena
            .entities_sorted()
            .filter(move |e| e.tag() == tag)
            .map(Entity::id)
    }

    /// Swept-sphere trace through the snapshot. Always allowed.
    #[must_use]
    pub fn trace(&self, request: &TraceRequest) -> Option<TraceHit> {
        shape_trace(self.arena, request)
    }

    /// In debug builds, panics if access is denied.
    /// In release builds, returns `None` if access is denied.
    #[allow(clippy::unnecessary_wraps)]
    fn check_access(&self, kind: ComponentKind) -> Option<()> {
        if self.allowed_components.contains(&kind) {
            Some(())
        } else {
            #[cfg(debug_assertions)]
            panic!(
                "WorldView access denied: plugin tried to access {:?} but only declared: {:?}",
                kind, self.allowed_components
            );

            #[cfg(not(debug_assertions))]
            None
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{EntityInner, PlayerComponents, RocketComponents};
    use crate::output::{OutputKind, PluginId};

    fn decl(reads: Vec<ComponentKind>) -> PluginDeclaration {
        PluginDeclaration {
            id: PluginId::new("test"),
            required_tags: vec![EntityTag::Player],
            reads,
            emits: vec![OutputKind::Command],
        }
    }

    fn arena() -> (Arena, EntityId, EntityId) {
        let mut arena = Arena::new();
        let player = arena.spawn(EntityInner::Player(PlayerComponents::at_position(Vec3::ZERO)));
        let rocket = arena.spawn(EntityInner::Rocket(
            RocketComponents::at_position(Vec3::new(0.0, 0.0, 300.0)).with_target(player),
        ));
        (arena, player, rocket)
    }

    #[test]
    fn declared_components_are_readable() {
        let (arena, player, rocket) = arena();
        let d = decl(vec![ComponentKind::Health, ComponentKind::Rocket]);
        let view = WorldView::for_plugin(&arena, &d, 0);

        assert!(view.get_health(player).is_some());
        assert_eq!(view.get_rocket(rocket).unwrap().target, Some(player));
        assert!(view.get_rocket(player).is_none());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "WorldView access denied")]
    fn undeclared_access_panics_in_debug() {
        let (arena, player, _) = arena();
        let d = decl(vec![ComponentKind::Transform]);
        let view = WorldView::for_plugin(&arena, &d, 0);
        let _ = view.get_wallet(player);
    }

    #[test]
    fn aim_point_uses_hit_center() {
        let (arena, player, rocket) = arena();
        let view = WorldView::full_access(&arena, 0);
        assert_eq!(view.aim_point(player, 16.0), Some((Vec3::new(0.0, 0.0, 48.0), 12.0)));
        assert_eq!(view.aim_point(rocket, 1.0), Some((Vec3::new(0.0, 0.0, 300.0), 16.0)));
        assert_eq!(view.aim_point(EntityId::new(99), 1.0), None);
    }

    #[test]
    fn scene_queries_need_no_declaration() {
        let (arena, player, rocket) = arena();
        let d = decl(vec![]);
        let view = WorldView::for_plugin(&arena, &d, 5);
        assert_eq!(view.tick(), 5);
        assert_eq!(view.living_players(), vec![player]);
        assert_eq!(view.query_by_tag(EntityTag::Rocket).collect::<Vec<_>>(), vec![rocket]);
        assert_eq!(view.tag_of(rocket), Some(EntityTag::Rocket));
    }
}
