//! Gameplay plugins for the Entity-Plugin-Resolver architecture.
//!
//! - [`RocketPlugin`]: target acquisition, homing and impact detection
//! - [`PunchPlugin`]: melee punches that damage enemies and redirect rockets
//!
//! Use [`PluginRegistry::from_config()`](crate::plugin::PluginRegistry::from_config)
//! to create a registry with both plugins registered for their entity kinds.

mod punch;
mod rocket;

pub use punch::PunchPlugin;
pub use rocket::{steer_toward, RocketPlugin};
