//! # Rocketpunch Core
//!
//! Deterministic round-based arena simulation for Rocketpunch.
//!
//! Each round a homing rocket is spawned above a random player. Players
//! punch it away to send it after someone else; the round ends when a
//! player dies to it.
//!
//! ## Architecture
//!
//! Entity-Plugin-Resolver:
//!
//! - **Entities**: players, rockets, units, props held in an [`arena::Arena`]
//! - **Plugins**: rocket guidance and punching read a [`world_view::WorldView`]
//!   snapshot and emit [`output::Output`]s
//! - **Resolvers**: kinematics, rocket events, combat, events and clocks apply
//!   the outputs to the next arena in a fixed order
//!
//! On top of the simulation, [`round::RoundManager`] runs rounds,
//! [`net::Session`] decides authority and [`game::Match`] ties it all
//! together for a host.
//!
//! ## Usage
//!
//! ```
//! use rocketpunch_core::config::GameConfig;
//! use rocketpunch_core::game::Match;
//! use rocketpunch_core::net::NetMode;
//! use rocketpunch_core::team::Team;
//! use glam::Vec3;
//!
//! let mut game = Match::new(GameConfig::default(), NetMode::Offline).unwrap();
//! let alice = game.spawn_player(Vec3::ZERO, Team::Player);
//! let bob = game.spawn_player(Vec3::new(600.0, 0.0, 0.0), Team::Player);
//!
//! for _ in 0..600 {
//!     game.step();
//! }
//! assert!(game.arena().contains(alice) && game.arena().contains(bob));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod arena;
pub mod config;
pub mod currency;
pub mod entity;
pub mod error;
pub mod game;
pub mod health;
pub mod net;
pub mod notify;
pub mod output;
pub mod plugin;
pub mod plugins;
pub mod resolver;
pub mod round;
pub mod simulation;
pub mod team;
pub mod trace;
pub mod world_view;

#[cfg(test)]
mod tests;
