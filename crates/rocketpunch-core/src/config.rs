//! Tuning and match configuration.
//!
//! Every gameplay constant lives in one of the sub-configs below. All structs
//! deserialize with `#[serde(default)]`, so a config file only needs to name
//! the values it overrides.
//!
//! # Example
//!
//! ```
//! use rocketpunch_core::config::GameConfig;
//!
//! let config = GameConfig::from_json(r#"{ "rocket": { "speed": 600.0 } }"#).unwrap();
//! assert_eq!(config.rocket.speed, 600.0);
//! assert_eq!(config.rocket.lifetime, 30.0);
//! ```

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::entity::{ColliderShape, CollisionPolicy, HitCenter};
use crate::error::{GameError, Result};

/// Health, regeneration and respawn tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Maximum (and spawn) health
    pub max_health: f32,
    /// Health restored per regeneration pulse (0 disables regeneration)
    pub regeneration: f32,
    /// Seconds after taking damage before regeneration resumes
    pub regen_cooldown: f32,
    /// Seconds between regeneration pulses
    pub regen_interval: f32,
    /// Seconds a dead player waits before being revived at its spawn point
    pub respawn_delay: f32,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            max_health: 100.0,
            regeneration: 0.0,
            regen_cooldown: 5.0,
            regen_interval: 1.0,
            respawn_delay: 3.0,
        }
    }
}

/// Experience curve parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrencyConfig {
    /// Experience needed to go from level 1 to level 2
    pub base_experience_per_level: f64,
    /// Growth factor applied to each subsequent level step
    pub experience_multiplier: f64,
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            base_experience_per_level: 100.0,
            experience_multiplier: 1.5,
        }
    }
}

/// Player body layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Body collider, tagged `PLAYER`
    pub body: ColliderShape,
    /// Optional precise aim point, tagged `HITBOX`
    pub hit_center: Option<HitCenter>,
    /// Eye position relative to the player origin
    pub eye_offset: Vec3,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            body: ColliderShape::Capsule {
                radius: 16.0,
                length: 72.0,
            },
            hit_center: Some(HitCenter {
                offset: Vec3::new(0.0, 0.0, 48.0),
                radius: 12.0,
            }),
            eye_offset: Vec3::new(0.0, 0.0, 64.0),
        }
    }
}

/// Rocket guidance, collision and termination tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RocketConfig {
    /// Forward speed in units per second
    pub speed: f32,
    /// Slerp rate toward the target direction, per second
    pub turn_speed: f32,
    /// Damage applied to the target on explosion
    pub damage: f32,
    /// Seconds before the rocket self-destructs
    pub lifetime: f32,
    /// Length of one stuck-detection sampling window in seconds
    pub stuck_window: f32,
    /// Minimum travel per window; less than this counts as stuck
    pub stuck_min_travel: f32,
    /// Permanent speed factor applied on every redirect
    pub redirect_speed_multiplier: f32,
    /// Distance under which the turn rate is boosted
    pub terminal_range: f32,
    /// Angular error (degrees) above which the turn rate is boosted
    pub terminal_angle_deg: f32,
    /// Factor applied to the turn rate while boosted
    pub terminal_turn_multiplier: f32,
    /// How impacts are detected
    pub collision_policy: CollisionPolicy,
    /// Rocket body collider; its geometry defines the collision radius
    pub collider: ColliderShape,
    /// Collision radius used when the collider has no usable geometry
    pub fallback_radius: f32,
}

impl Default for RocketConfig {
    fn default() -> Self {
        Self {
            speed: 400.0,
            turn_speed: 2.0,
            damage: 100.0,
            lifetime: 30.0,
            stuck_window: 1.0,
            stuck_min_travel: 1.0,
            redirect_speed_multiplier: 1.1,
            terminal_range: 150.0,
            terminal_angle_deg: 60.0,
            terminal_turn_multiplier: 2.0,
            collision_policy: CollisionPolicy::Distance,
            collider: ColliderShape::Sphere { radius: 16.0 },
            fallback_radius: 16.0,
        }
    }
}

/// Melee punch tuning and rewards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PunchConfig {
    /// Trace length from the eye
    pub range: f32,
    /// Trace thickness (capsule radius)
    pub radius: f32,
    /// Damage applied to a hit enemy
    pub damage: f32,
    /// Seconds between punches
    pub cooldown: f32,
    /// Seconds the punching pose is held
    pub pose_duration: f32,
    /// Experience for redirecting a rocket
    pub redirect_experience: u32,
    /// Experience for landing a hit
    pub hit_experience: u32,
    /// Coins for a killing blow
    pub kill_coins: u32,
    /// Bonus experience for a killing blow
    pub kill_experience: u32,
}

impl Default for PunchConfig {
    fn default() -> Self {
        Self {
            range: 96.0,
            radius: 8.0,
            damage: 25.0,
            cooldown: 0.5,
            pose_duration: 0.25,
            redirect_experience: 25,
            hit_experience: 5,
            kill_coins: 10,
            kill_experience: 50,
        }
    }
}

/// Round pacing and rocket spawn placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoundConfig {
    /// Seconds between the end of a round and the start of the next
    pub round_start_delay: f32,
    /// Seconds before a lost rocket is replaced during an active round
    pub rocket_respawn_delay: f32,
    /// Maximum horizontal spawn offset from the targeted player
    pub spawn_horizontal_offset: f32,
    /// Minimum spawn height above the targeted player
    pub spawn_height_min: f32,
    /// Maximum spawn height above the targeted player
    pub spawn_height_max: f32,
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            round_start_delay: 3.0,
            rocket_respawn_delay: 2.0,
            spawn_horizontal_offset: 128.0,
            spawn_height_min: 256.0,
            spawn_height_max: 384.0,
        }
    }
}

/// Complete match configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Master seed for every random choice in the match
    pub seed: u64,
    /// Fixed simulation rate in ticks per second
    pub tick_rate: f32,
    /// Health tuning
    pub health: HealthConfig,
    /// Experience curve
    pub currency: CurrencyConfig,
    /// Player body layout
    pub player: PlayerConfig,
    /// Rocket tuning
    pub rocket: RocketConfig,
    /// Punch tuning
    pub punch: PunchConfig,
    /// Round pacing
    pub round: RoundConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            tick_rate: 60.0,
            health: HealthConfig::default(),
            currency: CurrencyConfig::default(),
            player: PlayerConfig::default(),
            rocket: RocketConfig::default(),
            punch: PunchConfig::default(),
            round: RoundConfig::default(),
        }
    }
}

impl GameConfig {
    /// Parses a JSON document and validates it.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Codec`] for malformed JSON and
    /// [`GameError::InvalidConfig`] for out-of-range values.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Fixed timestep derived from the tick rate.
    #[must_use]
    pub fn dt(&self) -> f32 {
        1.0 / self.tick_rate
    }

    /// Checks every value that would make the simulation misbehave.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> Result<()> {
        fn positive(name: &str, value: f32) -> Result<()> {
            if value > 0.0 && value.is_finite() {
                Ok(())
            } else {
                Err(GameError::InvalidConfig(format!(
                    "{name} must be positive, got {value}"
                )))
            }
        }

        positive("tick_rate", self.tick_rate)?;
        positive("health.max_health", self.health.max_health)?;
        positive("health.regen_interval", self.health.regen_interval)?;
        positive("rocket.speed", self.rocket.speed)?;
        positive("rocket.turn_speed", self.rocket.turn_speed)?;
        positive("rocket.lifetime", self.rocket.lifetime)?;
        positive("rocket.stuck_window", self.rocket.stuck_window)?;
        positive("rocket.fallback_radius", self.rocket.fallback_radius)?;
        positive("punch.range", self.punch.range)?;

        if self.health.regeneration < 0.0 {
            return Err(GameError::InvalidConfig(
                "health.regeneration must not be negative".into(),
            ));
        }
        if self.currency.base_experience_per_level < 1.0 {
            return Err(GameError::InvalidConfig(
                "currency.base_experience_per_level must be at least 1".into(),
            ));
        }
        if self.currency.experience_multiplier < 1.0 {
            return Err(GameError::InvalidConfig(
                "currency.experience_multiplier must be at least 1".into(),
            ));
        }
        if self.round.spawn_height_min > self.round.spawn_height_max {
            return Err(GameError::InvalidConfig(
                "round.spawn_height_min exceeds round.spawn_height_max".into(),
            ));
        }
        Ok(())
    }
}
