//! Swept-sphere shape traces against entity colliders.
//!
//! Every collider is approximated by a sphere: the body collider by its
//! [`ColliderShape::collision_radius`](crate::entity::ColliderShape::collision_radius)
//! around the entity origin, and a player's
//! [`HitCenter`](crate::entity::HitCenter) by its own sphere. A trace
//! sweeps a sphere of `radius` from `start` along `direction` for `range`
//! units and reports the nearest part it touches.
//!
//! # Example
//!
//! ```
//! use rocketpunch_core::arena::Arena;
//! use rocketpunch_core::entity::{CollisionTags, EntityInner, PropComponents};
//! use rocketpunch_core::trace::{shape_trace, TraceRequest};
//! use glam::Vec3;
//!
//! let mut arena = Arena::new();
//! let wall = arena.spawn(EntityInner::Prop(PropComponents::at_position(Vec3::X * 100.0)));
//!
//! let hit = shape_trace(&arena, &TraceRequest {
//!     start: Vec3::ZERO,
//!     direction: Vec3::X,
//!     range: 200.0,
//!     radius: 0.0,
//!     ignore: None,
//!     exclude_tags: CollisionTags::empty(),
//! });
//! assert_eq!(hit.map(|h| h.entity), Some(wall));
//! ```

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::arena::Arena;
use crate::entity::{CollisionTags, Entity, EntityId};

/// Parameters of a swept-sphere trace.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TraceRequest {
    /// Sweep origin
    pub start: Vec3,
    /// Sweep direction; normalized internally
    pub direction: Vec3,
    /// Sweep length
    pub range: f32,
    /// Radius of the swept sphere
    pub radius: f32,
    /// Entity whose colliders are never hit (the caster)
    pub ignore: Option<EntityId>,
    /// Colliders carrying any of these tags are skipped
    pub exclude_tags: CollisionTags,
}

/// Which collider of an entity a trace touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HitPart {
    /// The body collider
    Body,
    /// A player's hit center
    HitCenter,
}

/// Result of a trace.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TraceHit {
    /// Entity that was hit
    pub entity: EntityId,
    /// Collider that was hit
    pub part: HitPart,
    /// Distance travelled along the sweep at first contact
    pub distance: f32,
    /// Centre of the swept sphere at first contact
    pub point: Vec3,
}

/// Sweeps a sphere through the arena and returns the nearest hit.
///
/// Ties on distance are broken by the lower entity id.
#[must_use]
pub fn shape_trace(arena: &Arena, request: &TraceRequest) -> Option<TraceHit> {
    let direction = request.direction.normalize_or_zero();
    if direction == Vec3::ZERO || request.range < 0.0 {
        return None;
    }

    let mut best: Option<TraceHit> = None;
    for entity in arena.entities_sorted() {
        if Some(entity.id()) == request.ignore {
            continue;
        }
        for (part, center, radius, tags) in collision_spheres(entity) {
            if tags.intersects(request.exclude_tags) {
                continue;
            }
            let Some(distance) = sweep_sphere(
                request.start,
                direction,
                request.range,
                center,
                radius + request.radius,
            ) else {
                continue;
            };
            // Entities are visited in id order, so strict `<` keeps the lowest id on ties.
            if best.map_or(true, |b| distance < b.distance) {
                best = Some(TraceHit {
                    entity: entity.id(),
                    part,
                    distance,
                    point: request.start + direction * distance,
                });
            }
        }
    }
    best
}

/// Sphere approximations of every collider on an entity.
fn collision_spheres(entity: &Entity) -> Vec<(HitPart, Vec3, f32, CollisionTags)> {
    let inner = entity.inner();
    let position = inner.transform().position;
    let collider = inner.collider();

    let mut spheres = Vec::with_capacity(2);
    if let Some(radius) = collider.shape.collision_radius() {
        spheres.push((HitPart::Body, position, radius, collider.tags));
    }
    if let Some(center) = inner.as_player().and_then(|p| p.hit_center) {
        spheres.push((
            HitPart::HitCenter,
            position + center.offset,
            center.radius,
            CollisionTags::HITBOX,
        ));
    }
    spheres
}

/// Distance along a unit `direction` at which a point starting at `start`
/// first comes within `radius` of `center`, if within `range`.
///
/// A start point already inside the sphere hits at distance 0.
#[must_use]
pub fn sweep_sphere(
    start: Vec3,
    direction: Vec3,
    range: f32,
    center: Vec3,
    radius: f32,
) -> Option<f32> {
    let m = start - center;
    let b = m.dot(direction);
    let c = m.length_squared() - radius * radius;
    if c > 0.0 && b > 0.0 {
        return None;
    }
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }
    let t = (-b - discriminant.sqrt()).max(0.0);
    (t <= range).then_some(t)
}
