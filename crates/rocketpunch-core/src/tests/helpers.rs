//! Test helper functions for setting up simulations and matches.
//!
//! This module provides factory functions and accessors that keep the
//! scenario tests short.

use glam::Vec3;

use crate::arena::Arena;
use crate::config::GameConfig;
use crate::entity::{EntityId, EntityInner, PlayerComponents, PlayerInput, RocketComponents};
use crate::game::Match;
use crate::net::NetMode;
use crate::simulation::Simulation;
use crate::team::Team;

/// Ticks per second of the default configuration.
pub const TICK_RATE: usize = 60;

/// Routes log output through the test harness. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::INFO)
        .try_init();
}

// =============================================================================
// Spawning
// =============================================================================

/// Spawns a player built from `config`.
///
/// # Arguments
///
/// * `sim` - The simulation to spawn into
/// * `config` - Tuning for health and body layout
/// * `position` - Feet position
///
/// # Returns
///
/// The new player's ID.
pub fn spawn_player(sim: &mut Simulation, config: &GameConfig, position: Vec3) -> EntityId {
    let components = PlayerComponents::from_config(position, Team::Player, config);
    sim.arena_mut().spawn(EntityInner::Player(components))
}

/// Spawns a rocket chasing `target`, facing its aim point.
///
/// # Arguments
///
/// * `sim` - The simulation to spawn into
/// * `config` - Rocket tuning
/// * `position` - Rocket position
/// * `target` - Player to chase
///
/// # Returns
///
/// The new rocket's ID.
pub fn spawn_rocket_at(
    sim: &mut Simulation,
    config: &GameConfig,
    position: Vec3,
    target: EntityId,
) -> EntityId {
    let aim = aim_point(sim.arena(), target);
    let components = RocketComponents::from_config(position, &config.rocket)
        .with_target(target)
        .facing(aim);
    sim.arena_mut().spawn(EntityInner::Rocket(components))
}

/// Creates an offline match with two players 600 units apart.
///
/// # Returns
///
/// The match and the two player IDs in spawn order.
pub fn offline_match_with_two_players(seed: u64) -> (Match, EntityId, EntityId) {
    let config = GameConfig {
        seed,
        ..GameConfig::default()
    };
    let mut game = Match::new(config, NetMode::Offline).unwrap();
    let a = game.spawn_player(Vec3::ZERO, Team::Player);
    let b = game.spawn_player(Vec3::new(600.0, 0.0, 0.0), Team::Player);
    (game, a, b)
}

// =============================================================================
// Stepping & input
// =============================================================================

/// Steps the simulation `ticks` times.
pub fn run_ticks(sim: &mut Simulation, ticks: usize) {
    for _ in 0..ticks {
        sim.step();
    }
}

/// Steps the match `ticks` times.
pub fn run_match(game: &mut Match, ticks: usize) {
    for _ in 0..ticks {
        game.step();
    }
}

/// Holds the punch button for one tick, looking along `view`.
pub fn press_punch(sim: &mut Simulation, player: EntityId, view: Vec3) {
    let control = &mut sim
        .arena_mut()
        .get_mut(player)
        .and_then(crate::entity::Entity::as_player_mut)
        .unwrap()
        .control;
    control.input = PlayerInput {
        punch: true,
        view_direction: view,
    };
}

// =============================================================================
// Accessors
// =============================================================================

/// Current health of an entity.
pub fn get_health(arena: &Arena, id: EntityId) -> f32 {
    arena.get(id).unwrap().inner().health().unwrap().health()
}

/// Current target of a rocket.
pub fn get_target(arena: &Arena, rocket: EntityId) -> Option<EntityId> {
    arena.get(rocket).unwrap().as_rocket().unwrap().rocket.target
}

/// Current speed of a rocket.
pub fn get_speed(arena: &Arena, rocket: EntityId) -> f32 {
    arena.get(rocket).unwrap().as_rocket().unwrap().rocket.speed
}

/// Coins and experience of a player.
pub fn get_wallet(arena: &Arena, player: EntityId) -> (u32, u32) {
    let wallet = arena.get(player).unwrap().inner().wallet().unwrap();
    (wallet.coins(), wallet.experience())
}

/// Where rockets aim at a player.
pub fn aim_point(arena: &Arena, player: EntityId) -> Vec3 {
    arena.get(player).unwrap().as_player().unwrap().aim_point(16.0).0
}
