//! Component structs for each entity kind.
//!
//! Shared building blocks ([`Transform`], [`Collider`], [`HitCenter`]) are
//! composed into one struct per [`EntityTag`](super::EntityTag). Health, team
//! and wallet state live in their own modules because they carry behaviour.

use bitflags::bitflags;
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::config::{GameConfig, PlayerConfig, RocketConfig};
use crate::currency::Wallet;
use crate::entity::EntityId;
use crate::health::HealthState;
use crate::team::{Team, TeamState};

// =============================================================================
// Transform
// =============================================================================

/// World position and orientation.
///
/// The forward axis is +X, matching the rocket steering convention.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// World position
    pub position: Vec3,
    /// World orientation
    pub rotation: Quat,
}

impl Transform {
    /// Creates a transform at `position` with identity rotation.
    #[must_use]
    pub const fn at(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }

    /// Unit vector the entity is facing.
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::X
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::at(Vec3::ZERO)
    }
}

// =============================================================================
// Colliders
// =============================================================================

bitflags! {
    /// Tags carried by colliders, used to filter shape traces.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct CollisionTags: u32 {
        /// Player body geometry
        const PLAYER = 1 << 0;
        /// Rocket body
        const ROCKET = 1 << 1;
        /// Static world geometry
        const WORLD = 1 << 2;
        /// Precise hit center on a player
        const HITBOX = 1 << 3;
        /// Non-player damageable body
        const UNIT = 1 << 4;
    }
}

/// Collider geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ColliderShape {
    /// Sphere centred on the entity origin
    Sphere {
        /// Sphere radius
        radius: f32,
    },
    /// Axis-aligned box with the given full extents
    Box {
        /// Full size along each axis
        extents: Vec3,
    },
    /// Capsule with the given radius and total length
    Capsule {
        /// Capsule radius
        radius: f32,
        /// Capsule length
        length: f32,
    },
    /// No usable geometry
    None,
}

impl ColliderShape {
    /// Radius of the sphere that approximates this shape for collision.
    ///
    /// - sphere: its radius
    /// - box: half of the largest extent
    /// - capsule: the larger of radius and half the length
    /// - none: `None`, callers pick a fallback
    #[must_use]
    pub fn collision_radius(&self) -> Option<f32> {
        match *self {
            Self::Sphere { radius } => Some(radius),
            Self::Box { extents } => Some(extents.max_element() * 0.5),
            Self::Capsule { radius, length } => Some(radius.max(length * 0.5)),
            Self::None => None,
        }
    }
}

/// Body collider of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Collider {
    /// Geometry
    pub shape: ColliderShape,
    /// Filter tags
    pub tags: CollisionTags,
}

impl Collider {
    /// Creates a collider.
    #[must_use]
    pub const fn new(shape: ColliderShape, tags: CollisionTags) -> Self {
        Self { shape, tags }
    }

    /// Collision radius, or `fallback` when the shape has no geometry.
    #[must_use]
    pub fn radius_or(&self, fallback: f32) -> f32 {
        self.shape.collision_radius().unwrap_or(fallback)
    }
}

/// Named sub-point on a player used as the precise aim and hit location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitCenter {
    /// Offset from the entity origin, in world axes
    pub offset: Vec3,
    /// Radius of the hit center collider
    pub radius: f32,
}

impl HitCenter {
    /// World position of the hit center for an entity at `transform`.
    #[must_use]
    pub fn world_position(&self, transform: &Transform) -> Vec3 {
        transform.position + self.offset
    }
}

// =============================================================================
// Player
// =============================================================================

bitflags! {
    /// Animation pose flags. Purely cosmetic; tracked so a renderer can read them.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct PoseFlags: u8 {
        /// Punch animation playing
        const PUNCHING = 1 << 0;
        /// Dead, ragdoll active
        const RAGDOLL = 1 << 1;
    }
}

/// Input sampled by the host for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerInput {
    /// Punch button went down this frame
    pub punch: bool,
    /// Direction the player is looking
    pub view_direction: Vec3,
}

impl Default for PlayerInput {
    fn default() -> Self {
        Self {
            punch: false,
            view_direction: Vec3::X,
        }
    }
}

/// Per-player control state: input, cooldowns, pose and respawn schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerControl {
    /// Latest input; the punch edge is consumed at the end of each tick
    pub input: PlayerInput,
    /// Seconds until the next punch is allowed
    pub punch_cooldown: f32,
    /// Current pose
    pub pose: PoseFlags,
    /// Seconds until the punching pose is cleared
    pub pose_timer: f32,
    /// Seconds until the scripted respawn, while dead
    pub respawn_in: Option<f32>,
    /// Where the player reappears after dying
    pub spawn_point: Vec3,
    /// Eye position relative to the player origin
    pub eye_offset: Vec3,
}

impl PlayerControl {
    /// Control state for a player spawned at `spawn_point`.
    #[must_use]
    pub fn new(spawn_point: Vec3, eye_offset: Vec3) -> Self {
        Self {
            input: PlayerInput::default(),
            punch_cooldown: 0.0,
            pose: PoseFlags::empty(),
            pose_timer: 0.0,
            respawn_in: None,
            spawn_point,
            eye_offset,
        }
    }

    /// Whether a punch would fire this tick.
    #[must_use]
    pub fn wants_punch(&self) -> bool {
        self.input.punch && self.punch_cooldown <= 0.0
    }
}

/// Components for Player entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerComponents {
    /// Position and facing
    pub transform: Transform,
    /// Body collider, tagged `PLAYER`
    pub collider: Collider,
    /// Optional precise aim point
    pub hit_center: Option<HitCenter>,
    /// Health state machine
    pub health: HealthState,
    /// Team assignment
    pub team: TeamState,
    /// Coins, experience and level
    pub wallet: Wallet,
    /// Input, cooldowns, pose, respawn
    pub control: PlayerControl,
}

impl PlayerComponents {
    /// Creates a player at `position` with default tuning on the `Player` team.
    #[must_use]
    pub fn at_position(position: Vec3) -> Self {
        let config = GameConfig::default();
        Self::from_config(position, Team::Player, &config)
    }

    /// Creates a player from match configuration.
    #[must_use]
    pub fn from_config(position: Vec3, team: Team, config: &GameConfig) -> Self {
        let PlayerConfig {
            body,
            hit_center,
            eye_offset,
        } = config.player.clone();
        Self {
            transform: Transform::at(position),
            collider: Collider::new(body, CollisionTags::PLAYER),
            hit_center,
            health: HealthState::from_config(&config.health),
            team: TeamState::new(team),
            wallet: Wallet::default(),
            control: PlayerControl::new(position, eye_offset),
        }
    }

    /// World position of the eye.
    #[must_use]
    pub fn eye_position(&self) -> Vec3 {
        self.transform.position + self.control.eye_offset
    }

    /// Point a rocket should aim at, and the radius of the collider there.
    ///
    /// Uses the hit center when present, the root position otherwise.
    #[must_use]
    pub fn aim_point(&self, fallback_radius: f32) -> (Vec3, f32) {
        match &self.hit_center {
            Some(center) => (center.world_position(&self.transform), center.radius),
            None => (
                self.transform.position,
                self.collider.radius_or(fallback_radius),
            ),
        }
    }
}

// =============================================================================
// Rocket
// =============================================================================

/// How a rocket decides it has reached its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CollisionPolicy {
    /// Explode when the aim point is within the rocket's collision radius
    #[default]
    Distance,
    /// Explode when the rocket's collider overlaps the target's hit-center collider
    Trigger,
}

/// Guidance and lifecycle state of a rocket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RocketState {
    /// Player being chased; a weak handle that may dangle
    pub target: Option<EntityId>,
    /// Current forward speed
    pub speed: f32,
    /// Slerp rate per second
    pub turn_speed: f32,
    /// Damage dealt on impact
    pub damage: f32,
    /// One-shot guard; set before any explosion effect is applied
    pub exploded: bool,
    /// Seconds left before self-destruct
    pub lifetime: f32,
    /// Seconds elapsed in the current stuck-detection window
    pub stuck_elapsed: f32,
    /// Position at the start of the current stuck-detection window
    pub stuck_sample: Vec3,
    /// Number of times this rocket has been redirected
    pub redirects: u32,
}

impl RocketState {
    /// Fresh guidance state for a rocket spawned at `position`.
    #[must_use]
    pub fn from_config(position: Vec3, config: &RocketConfig) -> Self {
        Self {
            target: None,
            speed: config.speed,
            turn_speed: config.turn_speed,
            damage: config.damage,
            exploded: false,
            lifetime: config.lifetime,
            stuck_elapsed: 0.0,
            stuck_sample: position,
            redirects: 0,
        }
    }
}

/// Components for Rocket entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RocketComponents {
    /// Position and facing
    pub transform: Transform,
    /// Body collider, tagged `ROCKET`
    pub collider: Collider,
    /// Guidance state
    pub rocket: RocketState,
}

impl RocketComponents {
    /// Creates a rocket at `position` with default tuning and no target.
    #[must_use]
    pub fn at_position(position: Vec3) -> Self {
        Self::from_config(position, &RocketConfig::default())
    }

    /// Creates a rocket from configuration.
    #[must_use]
    pub fn from_config(position: Vec3, config: &RocketConfig) -> Self {
        Self {
            transform: Transform::at(position),
            collider: Collider::new(config.collider, CollisionTags::ROCKET),
            rocket: RocketState::from_config(position, config),
        }
    }

    /// Sets the initial target.
    #[must_use]
    pub fn with_target(mut self, target: EntityId) -> Self {
        self.rocket.target = Some(target);
        self
    }

    /// Faces the rocket toward `point`.
    #[must_use]
    pub fn facing(mut self, point: Vec3) -> Self {
        let dir = (point - self.transform.position).normalize_or_zero();
        if dir != Vec3::ZERO {
            self.transform.rotation = Quat::from_rotation_arc(Vec3::X, dir);
        }
        self
    }
}

// =============================================================================
// Unit & Prop
// =============================================================================

/// Components for Unit entities: damageable, team-aligned, not a player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitComponents {
    /// Position and facing
    pub transform: Transform,
    /// Body collider, tagged `UNIT`
    pub collider: Collider,
    /// Health state machine
    pub health: HealthState,
    /// Team assignment
    pub team: TeamState,
}

impl UnitComponents {
    /// Creates an `Enemy` unit at `position` with default health.
    #[must_use]
    pub fn at_position(position: Vec3) -> Self {
        Self::from_config(position, Team::Enemy, &GameConfig::default())
    }

    /// Creates a unit from configuration.
    #[must_use]
    pub fn from_config(position: Vec3, team: Team, config: &GameConfig) -> Self {
        Self {
            transform: Transform::at(position),
            collider: Collider::new(config.player.body, CollisionTags::UNIT),
            health: HealthState::from_config(&config.health),
            team: TeamState::new(team),
        }
    }
}

/// Components for Prop entities: static geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropComponents {
    /// Position and facing
    pub transform: Transform,
    /// Body collider, tagged `WORLD`
    pub collider: Collider,
}

impl PropComponents {
    /// Creates a 64-unit cube at `position`.
    #[must_use]
    pub fn at_position(position: Vec3) -> Self {
        Self::with_shape(position, ColliderShape::Box {
            extents: Vec3::splat(64.0),
        })
    }

    /// Creates a prop with the given shape.
    #[must_use]
    pub fn with_shape(position: Vec3, shape: ColliderShape) -> Self {
        Self {
            transform: Transform::at(position),
            collider: Collider::new(shape, CollisionTags::WORLD),
        }
    }
}
