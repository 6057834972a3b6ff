//! Simulation module with the 4-phase execution loop.
//!
//! The `Simulation` struct orchestrates the Entity-Plugin-Resolver architecture
//! through a deterministic execution loop:
//!
//! 1. **SNAPSHOT**: Freeze current state (implicit - `current` is immutable during plugins)
//! 2. **PLUGIN**: Execute all plugins in parallel, collecting outputs
//! 3. **RESOLUTION**: Clone current to next, run resolvers with outputs
//! 4. **APPLY**: Swap buffers, advance tick
//!
//! # Determinism
//!
//! The simulation guarantees deterministic execution:
//! - Plugins are executed in parallel but their outputs are sorted deterministically
//! - Entities are iterated in ID order (via `BTreeMap`)
//! - Trace IDs, which seed every plugin RNG, are derived from the master seed
//!
//! # Example
//!
//! ```
//! use rocketpunch_core::config::GameConfig;
//! use rocketpunch_core::simulation::Simulation;
//! use rocketpunch_core::entity::{EntityInner, PlayerComponents, RocketComponents};
//! use glam::Vec3;
//!
//! let mut sim = Simulation::new(&GameConfig::default());
//!
//! let player = sim
//!     .arena_mut()
//!     .spawn(EntityInner::Player(PlayerComponents::at_position(Vec3::ZERO)));
//! let rocket = sim.arena_mut().spawn(EntityInner::Rocket(
//!     RocketComponents::at_position(Vec3::new(0.0, 0.0, 2000.0)).with_target(player),
//! ));
//!
//! for _ in 0..10 {
//!     sim.step();
//! }
//!
//! assert_eq!(sim.tick(), 10);
//! assert!(sim.arena().get(rocket).unwrap().position().z < 2000.0);
//! ```

use rayon::prelude::*;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use tracing::trace;

use crate::arena::Arena;
use crate::config::GameConfig;
use crate::output::{OutputEnvelope, PluginInstanceId, TraceId};
use crate::plugin::{PluginContext, PluginRegistry};
use crate::resolver::{default_resolvers, Resolver};
use crate::world_view::WorldView;

// =============================================================================
// Simulation
// =============================================================================

/// The main simulation orchestrator implementing the 4-phase execution loop.
///
/// `Simulation` manages:
/// - Current and next arena state (double-buffered)
/// - Plugin registry for entity-to-plugin mapping
/// - Resolvers for output processing
/// - Master seed for deterministic trace ID generation
///
/// # Double Buffering
///
/// The simulation uses two arenas:
/// - `current`: Read-only snapshot for plugin execution
/// - `next`: Mutable state that resolvers write to
///
/// After each tick, the buffers are swapped to avoid copying.
pub struct Simulation {
    /// Current arena state (read-only during plugin phase).
    current: Arena,
    /// Next arena state (written to by resolvers).
    next: Arena,
    /// Registry of plugins organized by entity tag.
    plugins: PluginRegistry,
    /// Resolvers that process plugin outputs, in execution order.
    resolvers: Vec<Box<dyn Resolver>>,
    /// Master seed for deterministic trace ID generation.
    master_seed: u64,
    /// Fixed timestep handed to plugins.
    dt: f32,
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("current", &self.current)
            .field("plugins", &self.plugins)
            .field("resolvers", &format!("[{} resolvers]", self.resolvers.len()))
            .field("master_seed", &self.master_seed)
            .field("dt", &self.dt)
            .finish_non_exhaustive()
    }
}

impl Simulation {
    /// Creates a simulation with the gameplay plugins and resolvers tuned
    /// from `config`.
    ///
    /// The simulation starts at tick 0 with an empty, authoritative arena.
    ///
    /// # Example
    ///
    /// ```
    /// use rocketpunch_core::config::GameConfig;
    /// use rocketpunch_core::simulation::Simulation;
    ///
    /// let config = GameConfig { seed: 12345, ..GameConfig::default() };
    /// let sim = Simulation::new(&config);
    /// assert_eq!(sim.tick(), 0);
    /// assert_eq!(sim.seed(), 12345);
    /// ```
    #[must_use]
    pub fn new(config: &GameConfig) -> Self {
        Self::with_parts(
            config.seed,
            config.dt(),
            PluginRegistry::from_config(config),
            default_resolvers(config),
        )
    }

    /// Creates a simulation from explicit parts.
    ///
    /// # Arguments
    ///
    /// * `seed` - Master seed for deterministic trace ID generation
    /// * `dt` - Fixed timestep in seconds
    /// * `plugins` - Plugin registry
    /// * `resolvers` - Resolvers in execution order
    #[must_use]
    pub fn with_parts(
        seed: u64,
        dt: f32,
        plugins: PluginRegistry,
        resolvers: Vec<Box<dyn Resolver>>,
    ) -> Self {
        Self {
            current: Arena::default(),
            next: Arena::default(),
            plugins,
            resolvers,
            master_seed: seed,
            dt,
        }
    }

    /// Executes one simulation tick using the 4-phase execution loop.
    ///
    /// # Execution Phases
    ///
    /// 1. **SNAPSHOT**: The current arena is treated as immutable during this tick.
    ///    Plugins read from a frozen snapshot of the world state.
    ///
    /// 2. **PLUGIN**: All plugins for all entities are executed in parallel.
    ///    Each plugin reads from a `WorldView` scoped to its declared components
    ///    and emits `Output`s wrapped in `OutputEnvelope`s.
    ///
    /// 3. **RESOLUTION**: The next arena is cloned from current. Each resolver
    ///    processes its relevant outputs and mutates the next arena.
    ///
    /// 4. **APPLY**: The current and next arenas are swapped, and the tick
    ///    counter is advanced.
    ///
    /// # Determinism
    ///
    /// Plugin outputs are sorted by (`entity_id`, `plugin_id`, sequence) before
    /// resolution to ensure deterministic processing regardless of parallel
    /// execution order.
    pub fn step(&mut self) {
        let tick = self.current.current_tick();

        // PHASE 2: PLUGIN - execute all plugins in parallel
        let outputs = self.execute_plugins_parallel(tick);
        trace!(tick, outputs = outputs.len(), "plugin phase complete");

        // PHASE 3: RESOLUTION - clone current to next, run resolvers
        self.next.clone_from(&self.current);
        for resolver in &self.resolvers {
            let relevant: Vec<_> = outputs
                .iter()
                .filter(|o| resolver.handles().contains(&o.output().kind()))
                .collect();
            resolver.resolve(&relevant, &self.current, &mut self.next);
        }

        // PHASE 4: APPLY - swap buffers, advance tick
        std::mem::swap(&mut self.current, &mut self.next);
        self.current.advance_tick();
    }

    /// Executes all plugins in parallel and collects their outputs.
    ///
    /// # Returns
    ///
    /// A vector of `OutputEnvelope`s sorted by (`entity_id`, `plugin_id`, sequence).
    fn execute_plugins_parallel(&self, tick: u64) -> Vec<OutputEnvelope> {
        let plugin_instances: Vec<_> = self
            .current
            .entities_sorted()
            .flat_map(|entity| {
                self.plugins
                    .plugins_for(entity.tag())
                    .iter()
                    .enumerate()
                    .map(move |(idx, plugin)| (entity.id(), idx, Arc::clone(plugin)))
            })
            .collect();

        let mut all_outputs: Vec<OutputEnvelope> = plugin_instances
            .par_iter()
            .flat_map(|(entity_id, plugin_idx, plugin)| {
                let decl = plugin.declaration();
                let view = WorldView::for_plugin(&self.current, decl, tick);
                let trace_id =
                    self.generate_trace_id(tick, entity_id.as_u64(), *plugin_idx as u64);

                let ctx = PluginContext {
                    entity_id: *entity_id,
                    tick,
                    trace_id,
                    dt: self.dt,
                };

                // Plugins emit a handful of outputs per run; u32 is plenty.
                #[allow(clippy::cast_possible_truncation)]
                plugin
                    .run(&ctx, &view)
                    .into_iter()
                    .enumerate()
                    .map(|(seq, output)| {
                        OutputEnvelope::new(
                            output,
                            PluginInstanceId::new(*entity_id, decl.id.clone()),
                            trace_id,
                            tick,
                            seq as u32,
                        )
                    })
                    .collect::<Vec<_>>()
            })
            .collect();

        all_outputs.sort_by(|a, b| {
            a.source()
                .entity_id()
                .cmp(&b.source().entity_id())
                .then_with(|| a.source().plugin_id().as_str().cmp(b.source().plugin_id().as_str()))
                .then_with(|| a.sequence().cmp(&b.sequence()))
        });

        all_outputs
    }

    /// Derives the trace ID of one plugin run from
    /// (master seed, tick, entity, plugin index).
    fn generate_trace_id(&self, tick: u64, entity: u64, plugin: u64) -> TraceId {
        let mut hasher = DefaultHasher::new();
        self.master_seed.hash(&mut hasher);
        tick.hash(&mut hasher);
        entity.hash(&mut hasher);
        plugin.hash(&mut hasher);
        TraceId::new(hasher.finish())
    }

    /// Returns a read-only reference to the current arena state.
    #[must_use]
    pub fn arena(&self) -> &Arena {
        &self.current
    }

    /// Returns a mutable reference to the current arena.
    ///
    /// Used for setup, host commands and replicated state between steps.
    #[must_use]
    pub fn arena_mut(&mut self) -> &mut Arena {
        &mut self.current
    }

    /// Returns the current simulation tick.
    #[must_use]
    pub fn tick(&self) -> u64 {
        self.current.current_tick()
    }

    /// Returns the fixed timestep in seconds.
    #[must_use]
    pub fn dt(&self) -> f32 {
        self.dt
    }

    /// Returns a mutable reference to the plugin registry.
    #[must_use]
    pub fn plugins_mut(&mut self) -> &mut PluginRegistry {
        &mut self.plugins
    }

    /// Returns the master seed used for deterministic trace ID generation.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.master_seed
    }

    /// Appends a resolver after the default pipeline.
    pub fn add_resolver(&mut self, resolver: Box<dyn Resolver>) {
        self.resolvers.push(resolver);
    }

    /// Returns the number of resolvers in the simulation.
    #[must_use]
    pub fn resolver_count(&self) -> usize {
        self.resolvers.len()
    }
}

// =============================================================================
// Fixed-step timers
// =============================================================================

/// Advances a countdown by one tick of `dt` seconds.
///
/// Less than half a tick left counts as run out, so a timer of `n * dt`
/// seconds fires on exactly the `n`th call despite `f32` rounding.
///
/// # Returns
///
/// `true` if the countdown ran out on this call or earlier.
pub fn count_down(remaining: &mut f32, dt: f32) -> bool {
    *remaining -= dt;
    *remaining < dt * 0.5
}

/// Advances a stopwatch by one tick of `dt` seconds.
///
/// # Returns
///
/// `true` once `elapsed` is within half a tick of `limit`.
pub fn count_up(elapsed: &mut f32, limit: f32, dt: f32) -> bool {
    *elapsed += dt;
    *elapsed > limit - dt * 0.5
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{EntityInner, EntityTag, PlayerComponents, RocketComponents};
    use crate::notify::Notification;
    use crate::output::{Output, OutputKind, PluginId};
    use crate::plugin::{ComponentKind, Plugin, PluginDeclaration};
    use glam::Vec3;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingPlugin {
        declaration: PluginDeclaration,
        counter: Arc<AtomicUsize>,
    }

    impl CountingPlugin {
        fn new(counter: Arc<AtomicUsize>) -> Self {
            Self {
                declaration: PluginDeclaration {
                    id: PluginId::new("counting"),
                    required_tags: vec![EntityTag::Player],
                    reads: vec![ComponentKind::Transform],
                    emits: vec![],
                },
                counter,
            }
        }
    }

    impl Plugin for CountingPlugin {
        fn declaration(&self) -> &PluginDeclaration {
            &self.declaration
        }

        fn run(&self, _ctx: &PluginContext, _view: &WorldView) -> Vec<Output> {
            self.counter.fetch_add(1, Ordering::SeqCst);
            vec![]
        }
    }

    fn sim() -> Simulation {
        Simulation::new(&GameConfig::default())
    }

    mod timer_tests {
        use super::*;

        #[test]
        fn thirty_seconds_is_exactly_1800_ticks() {
            let dt = 1.0 / 60.0;
            let mut remaining = 30.0;
            let fired = (1..=1900).find(|_| count_down(&mut remaining, dt));
            assert_eq!(fired, Some(1800));
        }

        #[test]
        fn stopwatch_reaches_limit_on_the_last_tick() {
            let dt = 1.0 / 60.0;
            let mut elapsed = 0.0;
            let fired = (1..=100).find(|_| count_up(&mut elapsed, 1.0, dt));
            assert_eq!(fired, Some(60));
        }

        #[test]
        fn partial_ticks_round_to_nearest() {
            // 1.2 ticks
            let mut remaining = 0.3;
            assert!(count_down(&mut remaining, 0.25));
            // 1.6 ticks
            let mut remaining = 0.4;
            assert!(!count_down(&mut remaining, 0.25));
            assert!(count_down(&mut remaining, 0.25));
        }
    }

    mod creation_tests {
        use super::*;

        #[test]
        fn new_creates_simulation() {
            let sim = sim();
            assert_eq!(sim.tick(), 0);
            assert_eq!(sim.seed(), 0);
            assert_eq!(sim.resolver_count(), 5);
            assert!(sim.arena().is_empty());
            assert!(sim.arena().is_authoritative());
        }

        #[test]
        fn different_seeds_produce_different_trace_ids() {
            let a = Simulation::with_parts(1, 0.1, PluginRegistry::new(), vec![]);
            let b = Simulation::with_parts(2, 0.1, PluginRegistry::new(), vec![]);
            assert_ne!(a.generate_trace_id(0, 0, 0), b.generate_trace_id(0, 0, 0));
        }
    }

    mod step_tests {
        use super::*;

        #[test]
        fn step_advances_tick() {
            let mut sim = sim();
            sim.step();
            sim.step();
            sim.step();
            assert_eq!(sim.tick(), 3);
        }

        #[test]
        fn plugins_run_only_for_matching_tags() {
            let counter = Arc::new(AtomicUsize::new(0));
            let mut sim = Simulation::with_parts(0, 0.1, PluginRegistry::new(), vec![]);
            sim.plugins_mut()
                .register(EntityTag::Player, Arc::new(CountingPlugin::new(Arc::clone(&counter))));
            for i in 0..3 {
                sim.arena_mut()
                    .spawn(EntityInner::Player(PlayerComponents::at_position(Vec3::X * i as f32)));
            }
            sim.arena_mut()
                .spawn(EntityInner::Rocket(RocketComponents::at_position(Vec3::ZERO)));

            sim.step();
            assert_eq!(counter.load(Ordering::SeqCst), 3);
        }

        #[test]
        fn rocket_homes_and_explodes() {
            let mut sim = sim();
            let player = sim
                .arena_mut()
                .spawn(EntityInner::Player(PlayerComponents::at_position(Vec3::ZERO)));
            let rocket = sim.arena_mut().spawn(EntityInner::Rocket(
                RocketComponents::at_position(Vec3::new(0.0, 0.0, 448.0))
                    .with_target(player)
                    .facing(Vec3::new(0.0, 0.0, 48.0)),
            ));

            // 400 units at 400 u/s
            for _ in 0..70 {
                sim.step();
            }

            assert!(!sim.arena().contains(rocket));
            assert!(!sim.arena().is_living_player(player));
            let events = sim.arena_mut().take_events();
            assert!(events.contains(&Notification::Died { entity: player }));
            assert!(events.iter().any(|n| matches!(
                n,
                Notification::RocketExploded { target, .. } if *target == player
            )));
        }
    }

    mod determinism_tests {
        use super::*;

        fn run(seed: u64) -> (Vec3, Option<crate::entity::EntityId>) {
            let config = GameConfig {
                seed,
                ..GameConfig::default()
            };
            let mut sim = Simulation::new(&config);
            for i in 0..4 {
                sim.arena_mut().spawn(EntityInner::Player(PlayerComponents::at_position(Vec3::new(
                    i as f32 * 700.0,
                    0.0,
                    0.0,
                ))));
            }
            let start = Vec3::new(1000.0, 1000.0, 600.0);
            let rocket = sim
                .arena_mut()
                .spawn(EntityInner::Rocket(RocketComponents::at_position(start)));
            for _ in 0..20 {
                sim.step();
            }
            let entity = sim.arena().get(rocket).unwrap();
            (entity.position(), entity.as_rocket().unwrap().rocket.target)
        }

        #[test]
        fn same_seed_same_results() {
            assert_eq!(run(42), run(42));
        }

        #[test]
        fn trace_ids_are_deterministic() {
            let sim = sim();
            assert_eq!(sim.generate_trace_id(10, 5, 2), sim.generate_trace_id(10, 5, 2));
            assert_ne!(sim.generate_trace_id(10, 5, 2), sim.generate_trace_id(10, 5, 3));
        }

        #[test]
        fn outputs_are_sorted_by_entity() {
            let mut sim = sim();
            for i in 0..5 {
                let position = Vec3::X * (i as f32 * 500.0);
                let id = sim
                    .arena_mut()
                    .spawn(EntityInner::Player(PlayerComponents::at_position(position)));
                let player = sim.arena_mut().get_mut(id).unwrap().as_player_mut().unwrap();
                player.control.input.punch = true;
            }
            let outputs = sim.execute_plugins_parallel(0);
            let sources: Vec<_> = outputs.iter().map(|o| o.source().entity_id()).collect();
            let mut sorted = sources.clone();
            sorted.sort();
            assert_eq!(sources.len(), 5);
            assert_eq!(sources, sorted);
            assert!(outputs.iter().all(|o| o.kind() == OutputKind::Command));
        }
    }
}
