//! Output system for the Entity-Plugin-Resolver architecture.
//!
//! Plugins never mutate the arena. They emit outputs that the resolution
//! phase validates against the next-state arena and applies in a fixed order.
//!
//! # Architecture
//!
//! The output system uses a nested enum hierarchy for categorical routing:
//! - [`Command`]: Direct state change requests (`Steer`, `Explode`, ...)
//! - [`Modifier`]: Value modifications (`ApplyDamage`, `GrantExperience`, ...)
//! - `Event`: A [`Notification`] the plugin observed, forwarded unchanged
//!
//! All outputs are wrapped in [`OutputEnvelope`] which records the emitting
//! plugin instance, a trace id and a per-instance sequence number so that the
//! merge order is deterministic.
//!
//! # Example
//!
//! ```
//! use rocketpunch_core::output::{
//!     Output, Command, OutputEnvelope, PluginInstanceId, PluginId, TraceId,
//! };
//! use rocketpunch_core::entity::EntityId;
//!
//! let command = Command::RedirectRocket {
//!     rocket: EntityId::new(5),
//!     instigator: EntityId::new(2),
//! };
//!
//! let envelope = OutputEnvelope::new(
//!     Output::Command(command),
//!     PluginInstanceId::new(EntityId::new(2), PluginId::new("punch")),
//!     TraceId::new(42),
//!     100, // tick
//!     0,   // sequence
//! );
//!
//! assert!(matches!(envelope.output(), Output::Command(_)));
//! ```

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

use crate::entity::EntityId;
use crate::notify::Notification;

// =============================================================================
// Plugin Identification Types
// =============================================================================

/// Unique identifier for a plugin type.
///
/// # Example
///
/// ```
/// use rocketpunch_core::output::PluginId;
///
/// const ROCKET: PluginId = PluginId::from_static("rocket");
/// assert_eq!(ROCKET.as_str(), "rocket");
/// assert_eq!(ROCKET, PluginId::new("rocket"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PluginId(Cow<'static, str>);

impl PluginId {
    /// Creates a new `PluginId` from a string.
    #[must_use]
    pub fn new(id: &str) -> Self {
        Self(Cow::Owned(id.to_string()))
    }

    /// Creates a `PluginId` from a static string without allocating.
    #[must_use]
    pub const fn from_static(id: &'static str) -> Self {
        Self(Cow::Borrowed(id))
    }

    /// Returns the plugin ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PluginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&'static str> for PluginId {
    fn from(s: &'static str) -> Self {
        Self::from_static(s)
    }
}

/// Identifies a specific plugin instance (entity + plugin type).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PluginInstanceId {
    entity_id: EntityId,
    plugin_id: PluginId,
}

impl PluginInstanceId {
    /// Creates a new plugin instance identifier.
    #[must_use]
    pub fn new(entity_id: EntityId, plugin_id: PluginId) -> Self {
        Self {
            entity_id,
            plugin_id,
        }
    }

    /// Returns the entity ID of this instance.
    #[must_use]
    pub const fn entity_id(&self) -> EntityId {
        self.entity_id
    }

    /// Returns the plugin ID of this instance.
    #[must_use]
    pub fn plugin_id(&self) -> &PluginId {
        &self.plugin_id
    }
}

impl fmt::Display for PluginInstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.plugin_id, self.entity_id)
    }
}

/// Identifier grouping the outputs of one plugin run.
///
/// Also seeds the plugin's random number generator, so equal trace ids mean
/// equal random choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TraceId(u64);

impl TraceId {
    /// Creates a new trace ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw value of this trace ID.
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "trace:{}", self.0)
    }
}

// =============================================================================
// Output Categories
// =============================================================================

/// Reward paid to the source of a killing blow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KillReward {
    /// Coins granted
    pub coins: u32,
    /// Bonus experience granted
    pub experience: u32,
}

/// Command outputs request direct state changes.
///
/// Resolvers re-validate every command against the next-state arena: a
/// command naming a despawned entity is dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Move and orient a rocket after one guidance step.
    Steer {
        /// Rocket to move
        rocket: EntityId,
        /// New position
        position: Vec3,
        /// New orientation
        rotation: Quat,
    },
    /// Start a punch: cooldown and pose.
    ThrowPunch {
        /// Player punching
        source: EntityId,
        /// Seconds until the next punch
        cooldown: f32,
        /// Seconds the punching pose is held
        pose_duration: f32,
    },
    /// Assign a rocket a new target after its previous one became invalid.
    AcquireTarget {
        /// Rocket retargeting
        rocket: EntityId,
        /// Living player chosen; `None` when no player is left to chase
        target: Option<EntityId>,
    },
    /// Send a rocket after a different player.
    RedirectRocket {
        /// Rocket that was punched
        rocket: EntityId,
        /// Player who punched it
        instigator: EntityId,
    },
    /// Detonate a rocket on its target.
    Explode {
        /// Rocket detonating
        rocket: EntityId,
        /// Target the rocket reached
        target: EntityId,
    },
}

impl Command {
    /// Returns the entity this command changes.
    #[must_use]
    pub const fn subject(&self) -> EntityId {
        match self {
            Self::Steer { rocket, .. }
            | Self::AcquireTarget { rocket, .. }
            | Self::RedirectRocket { rocket, .. }
            | Self::Explode { rocket, .. } => *rocket,
            Self::ThrowPunch { source, .. } => *source,
        }
    }
}

/// Modifier outputs request value changes to entity state.
///
/// Modifiers are gameplay outcomes and only take effect on the
/// authoritative peer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Modifier {
    /// Apply damage to an entity.
    ApplyDamage {
        /// Entity to damage
        target: EntityId,
        /// Damage amount
        amount: f32,
        /// Entity credited with the damage
        source: Option<EntityId>,
        /// Paid to `source` if this damage kills the target
        kill_reward: Option<KillReward>,
    },
    /// Apply healing to an entity.
    ApplyHealing {
        /// Entity to heal
        target: EntityId,
        /// Healing amount (positive value)
        amount: f32,
    },
    /// Add coins to a wallet.
    GrantCoins {
        /// Wallet owner
        target: EntityId,
        /// Coins to add
        amount: u32,
    },
    /// Add experience to a wallet.
    GrantExperience {
        /// Wallet owner
        target: EntityId,
        /// Experience to add
        amount: u32,
    },
}

impl Modifier {
    /// Returns the target entity for this modifier.
    #[must_use]
    pub const fn target(&self) -> EntityId {
        match self {
            Self::ApplyDamage { target, .. }
            | Self::ApplyHealing { target, .. }
            | Self::GrantCoins { target, .. }
            | Self::GrantExperience { target, .. } => *target,
        }
    }
}

// =============================================================================
// Top-Level Output Enum
// =============================================================================

/// Output kind for resolver routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputKind {
    /// Command outputs (state change requests)
    Command,
    /// Modifier outputs (value modifications)
    Modifier,
    /// Event outputs (notifications)
    Event,
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Command => write!(f, "Command"),
            Self::Modifier => write!(f, "Modifier"),
            Self::Event => write!(f, "Event"),
        }
    }
}

/// A plugin output - a proposal for state change or a notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Output {
    /// A command output (state change request)
    Command(Command),
    /// A modifier output (value modification)
    Modifier(Modifier),
    /// An event output (notification)
    Event(Notification),
}

impl Output {
    /// Returns the kind of this output for resolver routing.
    #[must_use]
    pub const fn kind(&self) -> OutputKind {
        match self {
            Self::Command(_) => OutputKind::Command,
            Self::Modifier(_) => OutputKind::Modifier,
            Self::Event(_) => OutputKind::Event,
        }
    }

    /// Returns the command if this is a command output.
    #[must_use]
    pub const fn as_command(&self) -> Option<&Command> {
        match self {
            Self::Command(cmd) => Some(cmd),
            _ => None,
        }
    }

    /// Returns the modifier if this is a modifier output.
    #[must_use]
    pub const fn as_modifier(&self) -> Option<&Modifier> {
        match self {
            Self::Modifier(m) => Some(m),
            _ => None,
        }
    }

    /// Returns the notification if this is an event output.
    #[must_use]
    pub const fn as_event(&self) -> Option<&Notification> {
        match self {
            Self::Event(e) => Some(e),
            _ => None,
        }
    }
}

impl From<Command> for Output {
    fn from(cmd: Command) -> Self {
        Self::Command(cmd)
    }
}

impl From<Modifier> for Output {
    fn from(m: Modifier) -> Self {
        Self::Modifier(m)
    }
}

impl From<Notification> for Output {
    fn from(e: Notification) -> Self {
        Self::Event(e)
    }
}

// =============================================================================
// Output Envelope
// =============================================================================

/// Wrapper for outputs with provenance metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputEnvelope {
    output: Output,
    source: PluginInstanceId,
    trace_id: TraceId,
    tick: u64,
    sequence: u32,
}

impl OutputEnvelope {
    /// Creates a new output envelope.
    ///
    /// # Arguments
    ///
    /// * `output` - The output to wrap
    /// * `source` - The plugin instance that emitted this output
    /// * `trace_id` - Trace ID of the plugin run
    /// * `tick` - Current simulation tick
    /// * `sequence` - Position of the output within the plugin run
    #[must_use]
    pub fn new(
        output: Output,
        source: PluginInstanceId,
        trace_id: TraceId,
        tick: u64,
        sequence: u32,
    ) -> Self {
        Self {
            output,
            source,
            trace_id,
            tick,
            sequence,
        }
    }

    /// Returns a reference to the wrapped output.
    #[must_use]
    pub fn output(&self) -> &Output {
        &self.output
    }

    /// Consumes the envelope and returns the wrapped output.
    #[must_use]
    pub fn into_output(self) -> Output {
        self.output
    }

    /// Returns the source plugin instance.
    #[must_use]
    pub fn source(&self) -> &PluginInstanceId {
        &self.source
    }

    /// Returns the trace ID.
    #[must_use]
    pub const fn trace_id(&self) -> TraceId {
        self.trace_id
    }

    /// Returns the tick when this output was emitted.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Returns the sequence number within the plugin run.
    #[must_use]
    pub const fn sequence(&self) -> u32 {
        self.sequence
    }

    /// Returns the kind of the wrapped output.
    #[must_use]
    pub const fn kind(&self) -> OutputKind {
        self.output.kind()
    }
}

// =============================================================================
// Tests
// =============================================================================
