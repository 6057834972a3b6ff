//! Integration tests for the full simulation pipeline and the match layer.
//!
//! These tests verify end-to-end behavior:
//! - Rocket lifecycle (homing, explosion, lifetime, stuck detection)
//! - Punch flow (redirects, damage, rewards)
//! - Rounds (start delay, death ends the round, rocket replacement)
//! - Authority and replication between host and client

use std::sync::{Arc, Mutex};

use glam::Vec3;

use crate::config::{GameConfig, HealthConfig, RocketConfig};
use crate::entity::{EntityId, EntityInner, EntityTag, PlayerInput, Transform, UnitComponents};
use crate::error::GameError;
use crate::game::Match;
use crate::health::kill_entity;
use crate::net::{NetMode, Rpc};
use crate::notify::{ExpiryReason, Notification, NotificationFilter, NotificationKind};
use crate::plugins::steer_toward;
use crate::round::RoundPhase;
use crate::simulation::Simulation;
use crate::team::Team;

use super::helpers::{
    aim_point, get_health, get_speed, get_target, get_wallet, init_tracing,
    offline_match_with_two_players, press_punch, run_match, run_ticks, spawn_player,
    spawn_rocket_at, TICK_RATE,
};

/// Ships the host's queued calls over a JSON round trip into the client.
fn deliver(host: &mut Match, client: &mut Match) -> Vec<Rpc> {
    let rpcs = host.drain_outbox();
    for rpc in &rpcs {
        let decoded = Rpc::decode(&rpc.encode().unwrap()).unwrap();
        client.apply_rpc(&decoded).unwrap();
    }
    rpcs
}

/// Collects every notification matching `filter`.
fn record(game: &mut Match, filter: NotificationFilter) -> Arc<Mutex<Vec<Notification>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    game.subscribe(filter, move |n| sink.lock().unwrap().push(n.clone()));
    seen
}

// =============================================================================
// Rocket Lifecycle
// =============================================================================

#[test]
fn rocket_expires_after_lifetime() {
    init_tracing();
    let config = GameConfig::default();
    let mut sim = Simulation::new(&config);
    // Far enough that 30 s of flight never reaches it
    let target = spawn_player(&mut sim, &config, Vec3::new(20_000.0, 0.0, 0.0));
    let rocket = spawn_rocket_at(&mut sim, &config, Vec3::ZERO, target);

    run_ticks(&mut sim, 30 * TICK_RATE - 1);
    assert!(sim.arena().contains(rocket), "rocket should still fly one tick before 30 s");

    sim.step();
    assert!(!sim.arena().contains(rocket), "rocket should be gone at exactly 30 s");
    assert!(sim.arena().pending_events().contains(&Notification::RocketExpired {
        rocket,
        reason: ExpiryReason::Lifetime
    }));
    assert!((get_health(sim.arena(), target) - 100.0).abs() < f32::EPSILON);
}

#[test]
fn stationary_rocket_is_destroyed_as_stuck() {
    let config = GameConfig::default();
    let mut sim = Simulation::new(&config);
    let target = spawn_player(&mut sim, &config, Vec3::new(5_000.0, 0.0, 0.0));
    let rocket = spawn_rocket_at(&mut sim, &config, Vec3::ZERO, target);
    sim.arena_mut().get_mut(rocket).unwrap().as_rocket_mut().unwrap().rocket.speed = 0.0;

    run_ticks(&mut sim, TICK_RATE - 1);
    assert!(sim.arena().contains(rocket));

    sim.step();
    assert!(!sim.arena().contains(rocket));
    assert!(sim.arena().pending_events().contains(&Notification::RocketExpired {
        rocket,
        reason: ExpiryReason::Stuck
    }));
}

#[test]
fn rocket_chases_moving_target() {
    let config = GameConfig::default();
    let dt = config.dt();
    let mut game = Match::new(config.clone(), NetMode::Offline).unwrap();
    let player = game.spawn_player(Vec3::ZERO, Team::Player);
    game.start_round().unwrap();
    let rocket = game.rounds().current_rocket().unwrap();

    // Target dashes away, then strafes along +Y at 300 units per second
    for tick in 1..=(2 * TICK_RATE) {
        let position = Vec3::new(1500.0, 5.0 * tick as f32, 0.0);
        game.set_transform(player, Transform::at(position)).unwrap();

        let before = *game.arena().get(rocket).unwrap().inner().transform();
        let state = game.arena().get(rocket).unwrap().as_rocket().unwrap().rocket.clone();
        let aim = aim_point(game.arena(), player);
        let (expected_position, expected_rotation) =
            steer_toward(&before, Some(aim), state.speed, state.turn_speed, dt, &config.rocket);

        game.step();

        // Guidance aims at where the target is now, never ahead of it
        let after = *game.arena().get(rocket).unwrap().inner().transform();
        assert!(after.position.abs_diff_eq(expected_position, 1e-3));
        assert!(after.rotation.abs_diff_eq(expected_rotation, 1e-5));
    }

    let transform = *game.arena().get(rocket).unwrap().inner().transform();
    let to_target = (aim_point(game.arena(), player) - transform.position).normalize();
    assert!(transform.forward().dot(to_target) > 0.9);
    assert_eq!(get_target(game.arena(), rocket), Some(player));
}

#[test]
fn exploded_rocket_damages_exactly_once() {
    let config = GameConfig {
        health: HealthConfig {
            max_health: 250.0,
            ..HealthConfig::default()
        },
        ..GameConfig::default()
    };
    let mut sim = Simulation::new(&config);
    let player = spawn_player(&mut sim, &config, Vec3::ZERO);
    // Hit center sits 48 above the feet; start inside the collision radius
    let rocket = spawn_rocket_at(&mut sim, &config, Vec3::new(10.0, 0.0, 48.0), player);

    sim.step();
    assert!(!sim.arena().contains(rocket));
    assert!((get_health(sim.arena(), player) - 150.0).abs() < 1e-3);

    run_ticks(&mut sim, 30);
    assert!((get_health(sim.arena(), player) - 150.0).abs() < 1e-3);
    let explosions = sim
        .arena()
        .pending_events()
        .iter()
        .filter(|n| matches!(n, Notification::RocketExploded { .. }))
        .count();
    assert_eq!(explosions, 1);
}

#[test]
fn rocket_switches_to_living_player_when_target_dies() {
    let config = GameConfig::default();
    let mut sim = Simulation::new(&config);
    let doomed = spawn_player(&mut sim, &config, Vec3::ZERO);
    let survivor = spawn_player(&mut sim, &config, Vec3::new(3_000.0, 0.0, 0.0));
    let rocket = spawn_rocket_at(&mut sim, &config, Vec3::new(0.0, 0.0, 1_000.0), doomed);

    kill_entity(sim.arena_mut(), doomed);
    sim.step();
    assert_eq!(get_target(sim.arena(), rocket), Some(survivor));
}

// =============================================================================
// Punching
// =============================================================================

/// Player 1 at the origin, player 2 at x = 500 looking back along -X, and a
/// rocket chasing player 1 just in front of player 2's fist.
fn punch_scenario(players: usize) -> (Simulation, Vec<EntityId>, EntityId) {
    let config = GameConfig::default();
    let mut sim = Simulation::new(&config);
    let mut ids = Vec::new();
    if players > 1 {
        ids.push(spawn_player(&mut sim, &config, Vec3::ZERO));
    }
    let puncher = spawn_player(&mut sim, &config, Vec3::new(500.0, 0.0, 0.0));
    ids.push(puncher);
    let rocket = spawn_rocket_at(&mut sim, &config, Vec3::new(450.0, 0.0, 64.0), ids[0]);
    press_punch(&mut sim, puncher, Vec3::NEG_X);
    (sim, ids, rocket)
}

#[test]
fn punch_redirects_rocket_to_other_player() {
    let (mut sim, ids, rocket) = punch_scenario(2);
    let (first, puncher) = (ids[0], ids[1]);
    assert_eq!(get_target(sim.arena(), rocket), Some(first));

    sim.step();

    assert_eq!(get_target(sim.arena(), rocket), Some(puncher));
    assert!((get_speed(sim.arena(), rocket) - 440.0).abs() < 1e-3);
    assert_eq!(sim.arena().get(rocket).unwrap().as_rocket().unwrap().rocket.redirects, 1);
    assert_eq!(get_wallet(sim.arena(), puncher), (0, 25));
    assert!(sim.arena().pending_events().contains(&Notification::RocketRedirected {
        rocket,
        from: Some(first),
        to: puncher,
        instigator: puncher
    }));
}

#[test]
fn lone_player_punch_keeps_target_but_earns_experience() {
    let (mut sim, ids, rocket) = punch_scenario(1);
    let puncher = ids[0];

    sim.step();

    assert_eq!(get_target(sim.arena(), rocket), Some(puncher));
    assert!((get_speed(sim.arena(), rocket) - 400.0).abs() < 1e-3);
    assert_eq!(get_wallet(sim.arena(), puncher), (0, 25));
}

#[test]
fn punches_kill_enemy_unit_and_pay_reward() {
    let config = GameConfig::default();
    let mut sim = Simulation::new(&config);
    let player = spawn_player(&mut sim, &config, Vec3::ZERO);
    let unit = sim
        .arena_mut()
        .spawn(EntityInner::Unit(UnitComponents::from_config(
            Vec3::new(80.0, 0.0, 64.0),
            Team::Enemy,
            &config,
        )));

    for _ in 0..(4 * TICK_RATE) {
        press_punch(&mut sim, player, Vec3::X);
        sim.step();
    }

    // Dead units are removed from the arena
    assert!(!sim.arena().contains(unit));
    // Four landed hits of 25, then the kill reward
    assert_eq!(get_wallet(sim.arena(), player), (10, 4 * 5 + 50));
    let landed = sim
        .arena()
        .pending_events()
        .iter()
        .filter(|n| matches!(n, Notification::PunchLanded { .. }))
        .count();
    assert_eq!(landed, 4);
}

#[test]
fn client_punch_lands_nothing() {
    let mut client = Match::new(GameConfig::default(), NetMode::Client).unwrap();
    let player = client.spawn_player(Vec3::ZERO, Team::Player);
    let unit = client.spawn_unit(Vec3::new(80.0, 0.0, 64.0), Team::Enemy);
    let landed = record(&mut client, NotificationFilter::kind(NotificationKind::PunchLanded));

    client
        .set_input(
            player,
            PlayerInput {
                punch: true,
                view_direction: Vec3::X,
            },
        )
        .unwrap();
    client.step();

    // The swing still animates locally
    let control = &client.arena().get(player).unwrap().as_player().unwrap().control;
    assert!(control.punch_cooldown > 0.0);
    assert!((get_health(client.arena(), unit) - 100.0).abs() < f32::EPSILON);
    assert!(landed.lock().unwrap().is_empty());
}

#[test]
fn teammate_unit_is_not_damaged() {
    let config = GameConfig::default();
    let mut sim = Simulation::new(&config);
    let player = spawn_player(&mut sim, &config, Vec3::ZERO);
    let unit = sim
        .arena_mut()
        .spawn(EntityInner::Unit(UnitComponents::from_config(
            Vec3::new(80.0, 0.0, 64.0),
            Team::Player,
            &config,
        )));

    press_punch(&mut sim, player, Vec3::X);
    sim.step();
    assert!((get_health(sim.arena(), unit) - 100.0).abs() < f32::EPSILON);
    assert_eq!(get_wallet(sim.arena(), player), (0, 0));
}

// =============================================================================
// Respawn
// =============================================================================

#[test]
fn dead_player_respawns_at_spawn_point() {
    let config = GameConfig::default();
    let mut sim = Simulation::new(&config);
    let spawn = Vec3::new(100.0, 200.0, 0.0);
    let player = spawn_player(&mut sim, &config, spawn);
    sim.arena_mut()
        .get_mut(player)
        .unwrap()
        .inner_mut()
        .transform_mut()
        .position = Vec3::new(-800.0, 0.0, 0.0);
    kill_entity(sim.arena_mut(), player);

    run_ticks(&mut sim, 3 * TICK_RATE - 10);
    assert!(!sim.arena().is_living_player(player));

    run_ticks(&mut sim, 20);
    assert!(sim.arena().is_living_player(player));
    assert_eq!(sim.arena().get(player).unwrap().position(), spawn);
    assert!((get_health(sim.arena(), player) - 100.0).abs() < f32::EPSILON);
}

// =============================================================================
// Rounds
// =============================================================================

#[test]
fn round_starts_after_delay_with_one_rocket() {
    let (mut game, a, b) = offline_match_with_two_players(7);

    run_match(&mut game, 3 * TICK_RATE - 10);
    assert_eq!(game.rounds().phase(), RoundPhase::Idle);
    assert!(game.arena().ids_with_tag(EntityTag::Rocket).is_empty());

    run_match(&mut game, 15);
    assert_eq!(game.rounds().phase(), RoundPhase::Active);
    let rockets = game.arena().ids_with_tag(EntityTag::Rocket);
    assert_eq!(rockets.len(), 1);
    assert_eq!(game.rounds().current_rocket(), Some(rockets[0]));

    let target = get_target(game.arena(), rockets[0]).unwrap();
    assert!(target == a || target == b);
    assert!(game.arena().is_living_player(target));
}

#[test]
fn round_ends_when_rocket_kills_its_target() {
    init_tracing();
    let (mut game, _, _) = offline_match_with_two_players(11);
    let ended = record(&mut game, NotificationFilter::kind(NotificationKind::RoundEnded));

    run_match(&mut game, 3 * TICK_RATE + 5);
    let rocket = game.rounds().current_rocket().unwrap();
    let target = get_target(game.arena(), rocket).unwrap();

    for _ in 0..(5 * TICK_RATE) {
        game.step();
        if !ended.lock().unwrap().is_empty() {
            break;
        }
    }

    assert_eq!(
        *ended.lock().unwrap(),
        vec![Notification::RoundEnded {
            round: 1,
            dead_player: Some(target)
        }]
    );
    assert_eq!(game.rounds().phase(), RoundPhase::Idle);
    assert_eq!(game.rounds().current_round(), 2);
    assert!(game.arena().ids_with_tag(EntityTag::Rocket).is_empty());
}

#[test]
fn lost_rocket_is_replaced() {
    init_tracing();
    let config = GameConfig {
        rocket: RocketConfig {
            speed: 50.0,
            lifetime: 1.0,
            ..RocketConfig::default()
        },
        ..GameConfig::default()
    };
    let mut game = Match::new(config, NetMode::Offline).unwrap();
    game.spawn_player(Vec3::ZERO, Team::Player);
    let expired = record(&mut game, NotificationFilter::kind(NotificationKind::RocketExpired));

    game.start_round().unwrap();
    let first = game.rounds().current_rocket().unwrap();

    run_match(&mut game, 70);
    assert!(!game.arena().contains(first));
    assert_eq!(
        *expired.lock().unwrap(),
        vec![Notification::RocketExpired {
            rocket: first,
            reason: ExpiryReason::Lifetime
        }]
    );
    assert!(game.rounds().state().waiting_to_respawn_rocket);

    // 2 s respawn delay
    run_match(&mut game, 130);
    let second = game.rounds().current_rocket().unwrap();
    assert_ne!(second, first);
    assert!(game.arena().contains(second));
    assert_eq!(game.rounds().current_round(), 1);
}

// =============================================================================
// Authority & Replication
// =============================================================================

#[test]
fn client_never_runs_gameplay() {
    let mut client = Match::new(GameConfig::default(), NetMode::Client).unwrap();
    let player = client.spawn_player(Vec3::ZERO, Team::Player);
    client.on_connection_established();

    run_match(&mut client, 6 * TICK_RATE);
    assert_eq!(client.rounds().phase(), RoundPhase::Idle);
    assert!(client.arena().ids_with_tag(EntityTag::Rocket).is_empty());
    assert!(matches!(client.kill(player), Err(GameError::NotAuthoritative)));
    assert!(client.drain_outbox().is_empty());
}

#[test]
fn host_waits_for_first_connection() {
    let mut host = Match::new(GameConfig::default(), NetMode::Host).unwrap();
    host.spawn_player(Vec3::ZERO, Team::Player);

    run_match(&mut host, 4 * TICK_RATE);
    assert_eq!(host.rounds().phase(), RoundPhase::Idle);

    host.on_connection_established();
    run_match(&mut host, 3 * TICK_RATE + 5);
    assert_eq!(host.rounds().phase(), RoundPhase::Active);
}

#[test]
fn host_rounds_replicate_to_client() {
    init_tracing();
    let mut host = Match::new(GameConfig::default(), NetMode::Host).unwrap();
    let mut client = Match::new(GameConfig::default(), NetMode::Client).unwrap();
    let a = host.spawn_player(Vec3::ZERO, Team::Player);
    host.spawn_player(Vec3::new(600.0, 0.0, 0.0), Team::Player);
    client.spawn_player(Vec3::ZERO, Team::Player);
    client.spawn_player(Vec3::new(600.0, 0.0, 0.0), Team::Player);
    host.on_connection_established();

    run_match(&mut host, 3 * TICK_RATE + 5);
    let sent = deliver(&mut host, &mut client);
    assert_eq!(sent, vec![Rpc::StartRound { round: 1 }]);
    assert_eq!(client.rounds().phase(), RoundPhase::Active);
    assert_eq!(client.rounds().current_round(), 1);

    assert!(host.kill(a).unwrap());
    let sent = deliver(&mut host, &mut client);
    assert_eq!(
        sent,
        vec![Rpc::EndRound {
            round: 1,
            dead_player: Some(a)
        }]
    );
    assert_eq!(client.rounds().phase(), RoundPhase::Idle);
    assert_eq!(client.rounds().current_round(), 2);
}

#[test]
fn host_replicates_redirects_and_team_changes() {
    let mut host = Match::new(GameConfig::default(), NetMode::Host).unwrap();
    host.on_connection_established();
    let a = host.spawn_player(Vec3::ZERO, Team::Player);
    let b = host.spawn_player(Vec3::new(600.0, 0.0, 0.0), Team::Player);
    host.start_round().unwrap();
    host.drain_outbox();

    let rocket = host.rounds().current_rocket().unwrap();
    let current = get_target(host.arena(), rocket).unwrap();
    let expected = if current == a { b } else { a };
    assert_eq!(host.redirect_rocket(rocket, current).unwrap(), Some(expected));

    host.change_team(b, Team::Enemy).unwrap();
    host.step();

    let sent = host.drain_outbox();
    assert_eq!(
        sent[0],
        Rpc::RedirectRocket {
            rocket,
            target: expected,
            instigator: current
        }
    );
    assert!(sent.contains(&Rpc::ChangeTeam {
        entity: b,
        team: Team::Enemy
    }));
}
