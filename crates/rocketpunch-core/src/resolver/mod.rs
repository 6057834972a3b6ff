//! Resolver module for the Entity-Plugin-Resolver architecture.
//!
//! Resolvers process plugin outputs and mutate the next state. They are the final
//! phase of the execution loop where proposed changes become actual state mutations.
//!
//! # Architecture
//!
//! Each resolver declares which output kinds it handles via [`Resolver::handles()`].
//! During resolution:
//! 1. Outputs are collected from all plugins and sorted
//! 2. Outputs are routed to resolvers based on their kind
//! 3. Each resolver, in a fixed order, processes its outputs and mutates `next`
//!
//! # Invariants
//!
//! - Every output is re-validated against `next`: an earlier resolver (or an
//!   earlier output in the same resolver) may already have despawned the
//!   entity it names, or exploded the rocket it steers
//! - Resolvers MUST be deterministic given the same inputs and output order
//! - Gameplay outcomes (damage, rewards, redirects, respawns) only apply when
//!   `next` is authoritative
//!
//! # Available Resolvers
//!
//! - [`KinematicsResolver`]: Rocket motion and punch cooldown/pose
//! - [`RocketResolver`]: Targeting, redirects and explosions
//! - [`CombatResolver`]: Damage, healing and rewards
//! - [`EventResolver`]: Forwards plugin events to the arena journal
//! - [`ClockResolver`]: Per-tick timers (lifetimes, cooldowns, respawns, regeneration)

mod clock;
mod combat;
mod event;
mod kinematics;
mod rocket;

pub use clock::ClockResolver;
pub use combat::CombatResolver;
pub use event::EventResolver;
pub use kinematics::KinematicsResolver;
pub use rocket::{redirect_rocket, retarget_rocket, RocketResolver};

use crate::arena::Arena;
use crate::config::GameConfig;
use crate::output::{OutputEnvelope, OutputKind};

/// Resolver processes outputs and mutates `next`.
///
/// Resolvers are the write phase of the Entity-Plugin-Resolver architecture.
/// They receive collected outputs from plugins and apply the appropriate
/// state mutations to the next frame's state.
///
/// # Implementation Guidelines
///
/// 1. **Determinism**: Given the same inputs and output order, a resolver must
///    produce identical results. Iterate entities in id order.
///
/// 2. **Validate against next**: `current` is the snapshot plugins saw;
///    `next` is where mutations are written and holds the latest truth, so
///    existence and state checks read `next`.
///
/// 3. **Journal**: Everything observable is recorded with
///    [`Arena::emit`] on `next`.
///
/// # Example
///
/// ```
/// use rocketpunch_core::resolver::Resolver;
/// use rocketpunch_core::output::{OutputKind, OutputEnvelope};
/// use rocketpunch_core::arena::Arena;
///
/// struct MyResolver;
///
/// impl Resolver for MyResolver {
///     fn handles(&self) -> &[OutputKind] {
///         &[OutputKind::Command]
///     }
///
///     fn resolve(
///         &self,
///         outputs: &[&OutputEnvelope],
///         current: &Arena,
///         next: &mut Arena,
///     ) {
///         // Process outputs and mutate next
///     }
/// }
/// ```
pub trait Resolver: Send + Sync {
    /// Returns the output kinds this resolver handles.
    ///
    /// The execution loop uses this to route outputs to the appropriate resolver.
    /// A resolver with no kinds still runs once per tick with an empty slice.
    fn handles(&self) -> &[OutputKind];

    /// Resolves outputs into state mutations.
    ///
    /// # Arguments
    ///
    /// * `outputs` - The outputs routed to this resolver (filtered by `handles()`)
    /// * `current` - The snapshot the plugins read
    /// * `next` - The next frame's state (mutate this)
    fn resolve(&self, outputs: &[&OutputEnvelope], current: &Arena, next: &mut Arena);
}

/// The resolver pipeline in execution order.
#[must_use]
pub fn default_resolvers(config: &GameConfig) -> Vec<Box<dyn Resolver>> {
    vec![
        Box::new(KinematicsResolver::new()),
        Box::new(RocketResolver::new(&config.rocket)),
        Box::new(CombatResolver::new(config.currency.clone())),
        Box::new(EventResolver::new()),
        Box::new(ClockResolver::new(config.dt(), &config.rocket)),
    ]
}
