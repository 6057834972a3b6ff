//! Plugin system for the Entity-Plugin-Resolver architecture.
//!
//! Plugins read from an immutable [`WorldView`] and emit [`Output`]s that are
//! collected and resolved by the resolution phase.
//!
//! # Architecture
//!
//! Plugins follow a strict read-only paradigm:
//! - Plugins receive a [`WorldView`] scoped to only the components they declared
//! - Plugins emit [`Output`]s as proposals for state changes
//! - Plugins cannot directly mutate state
//! - Plugins can run in parallel (since they only read)
//!
//! # Plugin Declaration
//!
//! Each plugin declares:
//! - Its unique identifier ([`PluginId`])
//! - Required entity tags (which entity types it operates on)
//! - Components it reads (for `WorldView` scoping)
//! - Output kinds it emits (for resolver routing)
//!
//! # Example
//!
//! ```
//! use rocketpunch_core::plugin::{
//!     Plugin, PluginContext, PluginDeclaration, PluginId, PluginRegistry,
//!     ComponentKind,
//! };
//! use rocketpunch_core::world_view::WorldView;
//! use rocketpunch_core::output::{Output, OutputKind};
//! use rocketpunch_core::entity::EntityTag;
//! use std::sync::Arc;
//!
//! struct IdlePlugin {
//!     declaration: PluginDeclaration,
//! }
//!
//! impl Plugin for IdlePlugin {
//!     fn declaration(&self) -> &PluginDeclaration {
//!         &self.declaration
//!     }
//!
//!     fn run(&self, _ctx: &PluginContext, _view: &WorldView) -> Vec<Output> {
//!         vec![]
//!     }
//! }
//!
//! let mut registry = PluginRegistry::new();
//! registry.register(EntityTag::Prop, Arc::new(IdlePlugin {
//!     declaration: PluginDeclaration {
//!         id: PluginId::new("idle"),
//!         required_tags: vec![EntityTag::Prop],
//!         reads: vec![ComponentKind::Transform],
//!         emits: vec![],
//!     },
//! }));
//!
//! assert_eq!(registry.plugins_for(EntityTag::Prop).len(), 1);
//! assert!(registry.plugins_for(EntityTag::Rocket).is_empty());
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::GameConfig;
use crate::entity::{EntityId, EntityTag};
use crate::output::{Output, OutputKind, TraceId};
use crate::world_view::WorldView;

pub use crate::output::PluginId;

// =============================================================================
// Component Kind
// =============================================================================

/// Component type identifiers for plugin declarations.
///
/// The [`WorldView`] only hands out components whose kind the plugin listed
/// in [`PluginDeclaration::reads`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentKind {
    /// Position and orientation
    Transform,
    /// Body collider and hit center
    Collider,
    /// Health state
    Health,
    /// Team assignment
    Team,
    /// Coins, experience, level
    Wallet,
    /// Player input, cooldowns and pose
    Control,
    /// Rocket guidance state
    Rocket,
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Transform => "Transform",
            Self::Collider => "Collider",
            Self::Health => "Health",
            Self::Team => "Team",
            Self::Wallet => "Wallet",
            Self::Control => "Control",
            Self::Rocket => "Rocket",
        };
        f.write_str(name)
    }
}

// =============================================================================
// Plugin Declaration
// =============================================================================

/// Declaration of a plugin's capabilities and requirements.
#[derive(Debug, Clone)]
pub struct PluginDeclaration {
    /// Unique identifier for this plugin.
    pub id: PluginId,
    /// Entity tags this plugin operates on.
    pub required_tags: Vec<EntityTag>,
    /// Component types this plugin reads.
    pub reads: Vec<ComponentKind>,
    /// Output kinds this plugin may emit.
    pub emits: Vec<OutputKind>,
}

impl PluginDeclaration {
    /// Checks if this plugin operates on the given entity tag.
    #[must_use]
    pub fn supports_tag(&self, tag: EntityTag) -> bool {
        self.required_tags.contains(&tag)
    }

    /// Checks if this plugin reads the given component kind.
    #[must_use]
    pub fn reads_component(&self, kind: ComponentKind) -> bool {
        self.reads.contains(&kind)
    }

    /// Checks if this plugin emits the given output kind.
    #[must_use]
    pub fn emits_output(&self, kind: OutputKind) -> bool {
        self.emits.contains(&kind)
    }
}

// =============================================================================
// Plugin Context
// =============================================================================

/// Contextual information passed to a plugin during execution.
///
/// # Example
///
/// ```
/// use rocketpunch_core::plugin::PluginContext;
/// use rocketpunch_core::entity::EntityId;
/// use rocketpunch_core::output::TraceId;
///
/// let ctx = PluginContext {
///     entity_id: EntityId::new(42),
///     tick: 100,
///     trace_id: TraceId::new(1),
///     dt: 1.0 / 60.0,
/// };
///
/// assert_eq!(ctx.tick, 100);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct PluginContext {
    /// The entity this plugin is operating on.
    pub entity_id: EntityId,
    /// The current simulation tick.
    pub tick: u64,
    /// Trace ID of this run; also seeds the plugin's RNG.
    pub trace_id: TraceId,
    /// Fixed timestep in seconds.
    pub dt: f32,
}

// =============================================================================
// Plugin Trait
// =============================================================================

/// A plugin that implements game logic for entities.
///
/// Plugins must be `Send + Sync`: the execution loop runs them concurrently
/// against one immutable snapshot. Given the same snapshot and context a
/// plugin must produce the same outputs; randomness comes only from an RNG
/// seeded with [`PluginContext::trace_id`].
pub trait Plugin: Send + Sync {
    /// Returns the plugin's declaration.
    fn declaration(&self) -> &PluginDeclaration;

    /// Executes the plugin logic.
    ///
    /// # Arguments
    ///
    /// * `ctx` - Context containing the entity ID, tick, trace ID and timestep
    /// * `view` - Immutable view of the world state, scoped to declared components
    ///
    /// # Returns
    ///
    /// A vector of outputs representing proposed state changes or events.
    fn run(&self, ctx: &PluginContext, view: &WorldView) -> Vec<Output>;
}

// =============================================================================
// Plugin Registry
// =============================================================================

/// Registry of plugins organized by entity tag.
#[derive(Default)]
pub struct PluginRegistry {
    bundles: HashMap<EntityTag, Vec<Arc<dyn Plugin>>>,
}

impl PluginRegistry {
    /// Creates a new empty plugin registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            bundles: HashMap::new(),
        }
    }

    /// Registers a plugin for the given entity tag.
    pub fn register(&mut self, tag: EntityTag, plugin: Arc<dyn Plugin>) {
        self.bundles.entry(tag).or_default().push(plugin);
    }

    /// Returns the plugins registered for the given entity tag, in
    /// registration order.
    #[must_use]
    pub fn plugins_for(&self, tag: EntityTag) -> &[Arc<dyn Plugin>] {
        self.bundles.get(&tag).map_or(&[], Vec::as_slice)
    }

    /// Returns the total number of plugin registrations.
    #[must_use]
    pub fn registration_count(&self) -> usize {
        self.bundles.values().map(Vec::len).sum()
    }

    /// Returns true if the registry has no plugins.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bundles.values().all(Vec::is_empty)
    }

    /// Gameplay plugins tuned from `config`:
    /// - Rockets: guidance, targeting and collision
    /// - Players: punching
    ///
    /// Units and props have no per-tick behaviour of their own.
    #[must_use]
    pub fn from_config(config: &GameConfig) -> Self {
        use crate::plugins::{PunchPlugin, RocketPlugin};

        let mut registry = Self::new();
        registry.register(
            EntityTag::Rocket,
            Arc::new(RocketPlugin::new(config.rocket.clone())),
        );
        registry.register(
            EntityTag::Player,
            Arc::new(PunchPlugin::new(config.punch.clone())),
        );
        registry
    }

    /// Gameplay plugins with default tuning.
    ///
    /// # Example
    ///
    /// ```
    /// use rocketpunch_core::plugin::PluginRegistry;
    /// use rocketpunch_core::entity::EntityTag;
    ///
    /// let registry = PluginRegistry::default_bundles();
    /// assert_eq!(registry.plugins_for(EntityTag::Rocket).len(), 1);
    /// assert_eq!(registry.plugins_for(EntityTag::Player).len(), 1);
    /// assert!(registry.plugins_for(EntityTag::Prop).is_empty());
    /// ```
    #[must_use]
    pub fn default_bundles() -> Self {
        Self::from_config(&GameConfig::default())
    }
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("bundle_count", &self.bundles.len())
            .field("registration_count", &self.registration_count())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
