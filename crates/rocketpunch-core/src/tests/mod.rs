//! Test module for determinism and integration tests.
//!
//! These tests drive the whole Entity-Plugin-Resolver pipeline and the
//! match layer on top of it:
//! - **Determinism tests**: same seed and inputs give identical matches
//! - **Integration tests**: rockets, punches, rounds, respawns, replication
//! - **Helper functions**: utilities for test setup
//!
//! # Test Structure
//!
//! - `determinism.rs`: Tests that verify deterministic execution
//! - `integration.rs`: End-to-end tests of the simulation and match
//! - `helpers.rs`: Test setup utilities and factory functions

mod determinism;
mod helpers;
mod integration;

pub use helpers::*;
