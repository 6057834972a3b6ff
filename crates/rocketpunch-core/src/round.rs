//! Round flow: start countdown, one rocket per round, end on a player death.
//!
//! The [`RoundManager`] is advanced once per tick after the simulation step.
//! Only an authoritative arena advances rounds on its own; a client mirrors
//! the host through [`RoundManager::apply_start`] and
//! [`RoundManager::apply_end`].
//!
//! # Lifecycle
//!
//! ```text
//! Idle --(start timer elapses)--> Active --(monitored player dies)--> Idle
//!                                   |  ^
//!                   rocket lost     v  | respawn timer elapses
//!                              waiting for rocket
//! ```

use std::collections::BTreeSet;

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::arena::Arena;
use crate::config::{GameConfig, RocketConfig, RoundConfig};
use crate::entity::{Entity, EntityId, EntityInner, RocketComponents};
use crate::notify::{ExpiryReason, Notification};
use crate::simulation::count_down;

/// Whether a round is being played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundPhase {
    /// Waiting for the start timer
    Idle,
    /// A rocket is (or will shortly be) in flight
    Active,
}

/// Round bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundState {
    /// Round number, starting at 1
    pub current_round: u32,
    /// Whether the round is being played
    pub active: bool,
    /// Rocket of the current round; may dangle once it is gone
    pub current_rocket: Option<EntityId>,
    /// Seconds until the next round starts, while idle
    pub round_start_timer: f32,
    /// Seconds until a lost rocket is replaced
    pub rocket_respawn_timer: f32,
    /// Whether a replacement rocket is scheduled
    pub waiting_to_respawn_rocket: bool,
}

impl RoundState {
    fn new(config: &RoundConfig) -> Self {
        Self {
            current_round: 1,
            active: false,
            current_rocket: None,
            round_start_timer: config.round_start_delay,
            rocket_respawn_timer: 0.0,
            waiting_to_respawn_rocket: false,
        }
    }

    /// Phase derived from `active`.
    #[must_use]
    pub const fn phase(&self) -> RoundPhase {
        if self.active {
            RoundPhase::Active
        } else {
            RoundPhase::Idle
        }
    }
}

/// Drives rounds and the rocket that belongs to each.
///
/// # Example
///
/// ```
/// use rocketpunch_core::arena::Arena;
/// use rocketpunch_core::config::GameConfig;
/// use rocketpunch_core::entity::{EntityInner, EntityTag, PlayerComponents};
/// use rocketpunch_core::round::{RoundManager, RoundPhase};
/// use glam::Vec3;
///
/// let mut arena = Arena::new();
/// let player = arena.spawn(EntityInner::Player(PlayerComponents::at_position(Vec3::ZERO)));
/// let mut rounds = RoundManager::new(&GameConfig::default());
/// rounds.monitor(player);
///
/// // Default start delay is 3 s
/// for _ in 0..6 {
///     rounds.tick(&mut arena, 0.5);
/// }
/// assert_eq!(rounds.phase(), RoundPhase::Active);
/// assert_eq!(arena.ids_with_tag(EntityTag::Rocket).len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct RoundManager {
    state: RoundState,
    config: RoundConfig,
    rocket: RocketConfig,
    rng: ChaCha8Rng,
    monitored: BTreeSet<EntityId>,
}

impl RoundManager {
    /// Creates an idle manager at round 1 with the start timer armed.
    #[must_use]
    pub fn new(config: &GameConfig) -> Self {
        Self {
            state: RoundState::new(&config.round),
            config: config.round.clone(),
            rocket: config.rocket.clone(),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            monitored: BTreeSet::new(),
        }
    }

    /// Current bookkeeping.
    #[must_use]
    pub fn state(&self) -> &RoundState {
        &self.state
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> RoundPhase {
        self.state.phase()
    }

    /// Current round number.
    #[must_use]
    pub fn current_round(&self) -> u32 {
        self.state.current_round
    }

    /// Rocket of the current round, if one was spawned.
    #[must_use]
    pub fn current_rocket(&self) -> Option<EntityId> {
        self.state.current_rocket
    }

    /// Ends the round when `player` dies.
    pub fn monitor(&mut self, player: EntityId) {
        self.monitored.insert(player);
    }

    /// Stops watching `player`. Returns whether it was monitored.
    pub fn unmonitor(&mut self, player: EntityId) -> bool {
        self.monitored.remove(&player)
    }

    /// Whether deaths of `player` end the round.
    #[must_use]
    pub fn is_monitored(&self, player: EntityId) -> bool {
        self.monitored.contains(&player)
    }

    /// Advances the start countdown and the rocket respawn schedule.
    ///
    /// Does nothing on a non-authoritative arena.
    pub fn tick(&mut self, arena: &mut Arena, dt: f32) {
        if !arena.is_authoritative() {
            return;
        }

        if !self.state.active {
            if count_down(&mut self.state.round_start_timer, dt) {
                self.start_round(arena);
            }
            return;
        }

        if self.state.waiting_to_respawn_rocket {
            if count_down(&mut self.state.rocket_respawn_timer, dt) {
                self.state.waiting_to_respawn_rocket = false;
                self.state.current_rocket = self.spawn_rocket(arena);
                if self.state.current_rocket.is_none() {
                    warn!(
                        round = self.state.current_round,
                        "no living players for replacement rocket"
                    );
                    self.schedule_rocket_respawn();
                }
            }
            return;
        }

        let rocket_alive = self.state.current_rocket.is_some_and(|r| arena.contains(r));
        if !rocket_alive {
            debug!(round = self.state.current_round, "round rocket lost");
            self.state.current_rocket = None;
            self.schedule_rocket_respawn();
        }
    }

    /// Starts the current round.
    ///
    /// On an authoritative arena a rocket is spawned above a random living
    /// player; without players the round still starts and a rocket respawn
    /// is scheduled.
    ///
    /// # Returns
    ///
    /// `false` if a round was already active.
    pub fn start_round(&mut self, arena: &mut Arena) -> bool {
        if self.state.active {
            debug!(round = self.state.current_round, "round already active");
            return false;
        }
        self.state.active = true;
        self.state.waiting_to_respawn_rocket = false;
        self.state.current_rocket = None;

        if arena.is_authoritative() {
            self.state.current_rocket = self.spawn_rocket(arena);
            if self.state.current_rocket.is_none() {
                warn!(round = self.state.current_round, "round started without living players");
                self.schedule_rocket_respawn();
            }
        }

        info!(
            round = self.state.current_round,
            rocket = ?self.state.current_rocket,
            "round started"
        );
        arena.emit(Notification::RoundStarted {
            round: self.state.current_round,
            rocket: self.state.current_rocket,
        });
        true
    }

    /// Ends the current round and re-arms the start timer.
    ///
    /// On an authoritative arena the round's rocket is removed.
    ///
    /// # Returns
    ///
    /// `false` if no round was active.
    pub fn end_round(&mut self, arena: &mut Arena, dead_player: Option<EntityId>) -> bool {
        if !self.state.active {
            debug!(round = self.state.current_round, "no active round to end");
            return false;
        }
        self.state.active = false;
        self.state.waiting_to_respawn_rocket = false;

        if let Some(rocket) = self.state.current_rocket.take() {
            if arena.is_authoritative() && arena.despawn(rocket).is_some() {
                arena.emit(Notification::RocketExpired {
                    rocket,
                    reason: ExpiryReason::RoundEnded,
                });
            }
        }

        let ended = self.state.current_round;
        self.state.current_round += 1;
        self.state.round_start_timer = self.config.round_start_delay;

        info!(round = ended, dead_player = ?dead_player, "round ended");
        arena.emit(Notification::RoundEnded {
            round: ended,
            dead_player,
        });
        true
    }

    /// Reacts to a notification: the death of a monitored player ends the
    /// round on an authoritative arena.
    pub fn handle(&mut self, arena: &mut Arena, notification: &Notification) {
        if let Notification::Died { entity } = *notification {
            if self.is_monitored(entity) && arena.is_authoritative() {
                self.end_round(arena, Some(entity));
            }
        }
    }

    /// Mirrors a round start announced by the host.
    pub fn apply_start(&mut self, arena: &mut Arena, round: u32) {
        self.state.current_round = round;
        self.state.active = false;
        self.start_round(arena);
    }

    /// Mirrors a round end announced by the host.
    pub fn apply_end(&mut self, arena: &mut Arena, round: u32, dead_player: Option<EntityId>) {
        self.state.current_round = round;
        self.state.active = true;
        self.end_round(arena, dead_player);
    }

    fn schedule_rocket_respawn(&mut self) {
        self.state.waiting_to_respawn_rocket = true;
        self.state.rocket_respawn_timer = self.config.rocket_respawn_delay;
    }

    /// Spawns a rocket above a uniformly random living player, aimed at it.
    fn spawn_rocket(&mut self, arena: &mut Arena) -> Option<EntityId> {
        let players = arena.living_players();
        if players.is_empty() {
            return None;
        }
        let target = players[self.rng.gen_range(0..players.len())];
        let player = arena.get(target).and_then(Entity::as_player)?;
        let base = player.transform.position;
        let (aim, _) = player.aim_point(self.rocket.fallback_radius);

        let horizontal = self.config.spawn_horizontal_offset.abs();
        let offset = Vec3::new(
            self.rng.gen_range(-horizontal..=horizontal),
            self.rng.gen_range(-horizontal..=horizontal),
            self.rng
                .gen_range(self.config.spawn_height_min..=self.config.spawn_height_max),
        );

        let components = RocketComponents::from_config(base + offset, &self.rocket)
            .with_target(target)
            .facing(aim);
        let rocket = arena.spawn(EntityInner::Rocket(components));
        info!(rocket = %rocket, target = %target, "rocket spawned");
        Some(rocket)
    }
}
