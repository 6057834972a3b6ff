//! The match: simulation, rounds, networking role and observers in one place.
//!
//! [`Match`] is the host-facing entry point. Hosts spawn entities, feed
//! player input, call [`Match::step`] at the fixed tick rate and ship the
//! [`Rpc`]s from [`Match::drain_outbox`] to clients. Clients feed received
//! calls to [`Match::apply_rpc`].
//!
//! After every step and every host command the arena journal is drained in
//! order. Each notification is
//! 1. shown to the round manager (a monitored death ends the round),
//! 2. turned into an [`Rpc`] when this peer replicates,
//! 3. published to the [`NotificationHub`] subscribers.
//!
//! # Example
//!
//! ```
//! use rocketpunch_core::config::GameConfig;
//! use rocketpunch_core::game::Match;
//! use rocketpunch_core::net::NetMode;
//! use rocketpunch_core::round::RoundPhase;
//! use rocketpunch_core::team::Team;
//! use glam::Vec3;
//!
//! let mut game = Match::new(GameConfig::default(), NetMode::Offline).unwrap();
//! game.spawn_player(Vec3::ZERO, Team::Player);
//!
//! // 3 s start delay at 60 Hz
//! for _ in 0..185 {
//!     game.step();
//! }
//! assert_eq!(game.rounds().phase(), RoundPhase::Active);
//! ```

use glam::Vec3;
use tracing::{debug, info, warn};

use crate::arena::Arena;
use crate::config::GameConfig;
use crate::currency;
use crate::entity::{
    ColliderShape, Entity, EntityId, EntityInner, EntityTag, PlayerComponents, PlayerInput,
    PropComponents, Transform, UnitComponents,
};
use crate::error::{GameError, Result};
use crate::health;
use crate::net::{NetMode, Rpc, Session};
use crate::notify::{Notification, NotificationFilter, NotificationHub, SubscriptionId};
use crate::resolver::{redirect_rocket, retarget_rocket};
use crate::round::RoundManager;
use crate::simulation::Simulation;
use crate::team::Team;

/// One running match on one peer.
pub struct Match {
    config: GameConfig,
    sim: Simulation,
    rounds: RoundManager,
    session: Session,
    hub: NotificationHub,
    outbox: Vec<Rpc>,
}

impl std::fmt::Debug for Match {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Match")
            .field("tick", &self.sim.tick())
            .field("session", &self.session)
            .field("round", &self.rounds.state())
            .field("subscribers", &self.hub.len())
            .field("outbox", &self.outbox.len())
            .finish_non_exhaustive()
    }
}

impl Match {
    /// Creates a match after validating `config`.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidConfig`] if the configuration is out of range.
    pub fn new(config: GameConfig, mode: NetMode) -> Result<Self> {
        config.validate()?;
        let mut sim = Simulation::new(&config);
        let session = Session::new(mode);
        sim.arena_mut().set_authoritative(session.is_authoritative());
        info!(seed = config.seed, ?mode, "match created");
        Ok(Self {
            rounds: RoundManager::new(&config),
            sim,
            session,
            hub: NotificationHub::new(),
            outbox: Vec::new(),
            config,
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Current arena state.
    #[must_use]
    pub fn arena(&self) -> &Arena {
        self.sim.arena()
    }

    /// Round bookkeeping.
    #[must_use]
    pub fn rounds(&self) -> &RoundManager {
        &self.rounds
    }

    /// Networking role and authority.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Configuration the match was created with.
    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Current tick.
    #[must_use]
    pub fn tick(&self) -> u64 {
        self.sim.tick()
    }

    // =========================================================================
    // Loop
    // =========================================================================

    /// Advances the match by one fixed timestep.
    pub fn step(&mut self) {
        self.sim.step();
        self.flush();
        let dt = self.sim.dt();
        self.rounds.tick(self.sim.arena_mut(), dt);
        self.flush();
    }

    /// Records an incoming connection; a host becomes authoritative on the
    /// first one.
    pub fn on_connection_established(&mut self) {
        self.session.on_connection_established();
        self.sim
            .arena_mut()
            .set_authoritative(self.session.is_authoritative());
    }

    /// Registers an observer.
    pub fn subscribe<F>(&mut self, filter: NotificationFilter, callback: F) -> SubscriptionId
    where
        F: FnMut(&Notification) + Send + 'static,
    {
        self.hub.subscribe(filter, callback)
    }

    /// Removes an observer. Returns whether it was registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.hub.unsubscribe(id)
    }

    /// Takes every call queued for replication since the last drain.
    pub fn drain_outbox(&mut self) -> Vec<Rpc> {
        std::mem::take(&mut self.outbox)
    }

    // =========================================================================
    // Spawning & input
    // =========================================================================

    /// Spawns a player whose death ends the round.
    pub fn spawn_player(&mut self, position: Vec3, team: Team) -> EntityId {
        let components = PlayerComponents::from_config(position, team, &self.config);
        let id = self.sim.arena_mut().spawn(EntityInner::Player(components));
        self.rounds.monitor(id);
        info!(player = %id, %team, "player joined");
        id
    }

    /// Spawns a damageable non-player body.
    pub fn spawn_unit(&mut self, position: Vec3, team: Team) -> EntityId {
        let components = UnitComponents::from_config(position, team, &self.config);
        self.sim.arena_mut().spawn(EntityInner::Unit(components))
    }

    /// Spawns static geometry.
    pub fn spawn_prop(&mut self, position: Vec3, shape: ColliderShape) -> EntityId {
        self.sim
            .arena_mut()
            .spawn(EntityInner::Prop(PropComponents::with_shape(position, shape)))
    }

    /// Sets a player's input for the next step.
    ///
    /// # Errors
    ///
    /// [`GameError::UnknownEntity`] or [`GameError::WrongKind`] if `player`
    /// is not a live player.
    pub fn set_input(&mut self, player: EntityId, input: PlayerInput) -> Result<()> {
        self.expect_player(player)?;
        let found = self.sim.arena_mut().get_mut(player);
        if let Some(components) = found.and_then(Entity::as_player_mut) {
            components.control.input = input;
        }
        Ok(())
    }

    /// Moves a player or unit to where the host's movement put it.
    ///
    /// Bodies are driven by the host, so every peer accepts this. Rockets
    /// chase the new position from the next step on.
    ///
    /// # Errors
    ///
    /// [`GameError::UnknownEntity`] or [`GameError::WrongKind`] if `entity`
    /// is not a player or unit.
    pub fn set_transform(&mut self, entity: EntityId, transform: Transform) -> Result<()> {
        let actual = self.entity(entity)?.tag();
        if !matches!(actual, EntityTag::Player | EntityTag::Unit) {
            return Err(GameError::WrongKind {
                entity,
                actual,
                expected: "player or unit",
            });
        }
        if let Some(found) = self.sim.arena_mut().get_mut(entity) {
            *found.inner_mut().transform_mut() = transform;
        }
        Ok(())
    }

    // =========================================================================
    // Gameplay commands (authoritative peer only)
    // =========================================================================

    /// Assigns a team. The change is noticed, announced and replicated on
    /// the next step.
    ///
    /// # Errors
    ///
    /// [`GameError::NotAuthoritative`] on a client; entity errors if
    /// `entity` has no team.
    pub fn change_team(&mut self, entity: EntityId, team: Team) -> Result<()> {
        self.require_authority()?;
        self.assign_team(entity, team)
    }

    /// Grants coins to a player.
    ///
    /// # Errors
    ///
    /// [`GameError::NotAuthoritative`] on a client; entity errors if
    /// `player` is not a player.
    pub fn add_coins(&mut self, player: EntityId, amount: u32) -> Result<()> {
        self.require_authority()?;
        self.expect_player(player)?;
        currency::grant_coins(self.sim.arena_mut(), player, amount);
        self.flush();
        Ok(())
    }

    /// Spends a player's coins.
    ///
    /// # Returns
    ///
    /// `false`, with the balance untouched, if the player cannot afford it.
    ///
    /// # Errors
    ///
    /// [`GameError::NotAuthoritative`] on a client; entity errors if
    /// `player` is not a player.
    pub fn spend_coins(&mut self, player: EntityId, amount: u32) -> Result<bool> {
        self.require_authority()?;
        self.expect_player(player)?;
        let spent = currency::spend_coins(self.sim.arena_mut(), player, amount);
        self.flush();
        Ok(spent)
    }

    /// Grants experience to a player.
    ///
    /// # Errors
    ///
    /// [`GameError::NotAuthoritative`] on a client; entity errors if
    /// `player` is not a player.
    pub fn add_experience(&mut self, player: EntityId, amount: u32) -> Result<()> {
        self.require_authority()?;
        self.expect_player(player)?;
        currency::grant_experience(self.sim.arena_mut(), player, amount, &self.config.currency);
        self.flush();
        Ok(())
    }

    /// Damages an entity. Returns `true` if it died from this hit.
    ///
    /// # Errors
    ///
    /// [`GameError::NotAuthoritative`] on a client; entity errors if
    /// `entity` has no health.
    pub fn damage(&mut self, entity: EntityId, amount: f32) -> Result<bool> {
        self.require_authority()?;
        self.expect_health(entity)?;
        let died = health::damage_entity(self.sim.arena_mut(), entity, amount);
        self.flush();
        Ok(died)
    }

    /// Heals an entity.
    ///
    /// # Errors
    ///
    /// [`GameError::NotAuthoritative`] on a client; entity errors if
    /// `entity` has no health.
    pub fn heal(&mut self, entity: EntityId, amount: f32) -> Result<()> {
        self.require_authority()?;
        self.expect_health(entity)?;
        health::heal_entity(self.sim.arena_mut(), entity, amount);
        self.flush();
        Ok(())
    }

    /// Kills an entity. Returns `true` if it was alive.
    ///
    /// # Errors
    ///
    /// [`GameError::NotAuthoritative`] on a client; entity errors if
    /// `entity` has no health.
    pub fn kill(&mut self, entity: EntityId) -> Result<bool> {
        self.require_authority()?;
        self.expect_health(entity)?;
        let died = health::kill_entity(self.sim.arena_mut(), entity);
        self.flush();
        Ok(died)
    }

    /// Revives a dead entity at full health.
    ///
    /// # Errors
    ///
    /// [`GameError::NotAuthoritative`] on a client; entity errors if
    /// `entity` has no health.
    pub fn revive(&mut self, entity: EntityId) -> Result<()> {
        self.require_authority()?;
        self.expect_health(entity)?;
        health::revive_entity(self.sim.arena_mut(), entity);
        self.flush();
        Ok(())
    }

    /// Redirects a rocket as if `instigator` had punched it.
    ///
    /// # Returns
    ///
    /// The new target, or `None` when no other living player exists.
    ///
    /// # Errors
    ///
    /// [`GameError::NotAuthoritative`] on a client; entity errors if
    /// `rocket` is not a rocket.
    pub fn redirect_rocket(
        &mut self,
        rocket: EntityId,
        instigator: EntityId,
    ) -> Result<Option<EntityId>> {
        self.require_authority()?;
        self.expect_kind(rocket, EntityTag::Rocket, "rocket")?;
        let to = redirect_rocket(
            self.sim.arena_mut(),
            rocket,
            instigator,
            self.config.rocket.redirect_speed_multiplier,
        );
        self.flush();
        Ok(to)
    }

    /// Starts the current round immediately.
    ///
    /// # Returns
    ///
    /// `false` if a round was already active.
    ///
    /// # Errors
    ///
    /// [`GameError::NotAuthoritative`] on a client.
    pub fn start_round(&mut self) -> Result<bool> {
        self.require_authority()?;
        let started = self.rounds.start_round(self.sim.arena_mut());
        self.flush();
        Ok(started)
    }

    /// Ends the current round.
    ///
    /// # Returns
    ///
    /// `false` if no round was active.
    ///
    /// # Errors
    ///
    /// [`GameError::NotAuthoritative`] on a client.
    pub fn end_round(&mut self, dead_player: Option<EntityId>) -> Result<bool> {
        self.require_authority()?;
        let ended = self.rounds.end_round(self.sim.arena_mut(), dead_player);
        self.flush();
        Ok(ended)
    }

    // =========================================================================
    // Replication
    // =========================================================================

    /// Applies a call replicated by the authoritative peer.
    ///
    /// The authoritative peer ignores calls: it is their origin.
    ///
    /// # Errors
    ///
    /// Entity errors if the call names an entity this peer does not know
    /// in the expected form.
    pub fn apply_rpc(&mut self, rpc: &Rpc) -> Result<()> {
        if self.session.is_authoritative() {
            warn!(?rpc, "authoritative peer ignores replicated call");
            return Ok(());
        }
        debug!(?rpc, "applying replicated call");
        match *rpc {
            Rpc::StartRound { round } => self.rounds.apply_start(self.sim.arena_mut(), round),
            Rpc::EndRound { round, dead_player } => {
                self.rounds.apply_end(self.sim.arena_mut(), round, dead_player);
            }
            Rpc::ChangeTeam { entity, team } => self.assign_team(entity, team)?,
            Rpc::RedirectRocket {
                rocket,
                target,
                instigator,
            } => {
                self.expect_kind(rocket, EntityTag::Rocket, "rocket")?;
                retarget_rocket(
                    self.sim.arena_mut(),
                    rocket,
                    target,
                    instigator,
                    self.config.rocket.redirect_speed_multiplier,
                );
            }
        }
        self.flush();
        Ok(())
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Drains the arena journal until it stays empty.
    fn flush(&mut self) {
        loop {
            let events = self.sim.arena_mut().take_events();
            if events.is_empty() {
                break;
            }
            for notification in &events {
                self.rounds.handle(self.sim.arena_mut(), notification);
                if self.session.replicates() {
                    if let Some(rpc) = Rpc::from_notification(notification) {
                        self.outbox.push(rpc);
                    }
                }
                self.hub.publish(notification);
            }
        }
    }

    fn assign_team(&mut self, entity: EntityId, team: Team) -> Result<()> {
        let found = self.entity(entity)?;
        let tag = found.tag();
        let state = self
            .sim
            .arena_mut()
            .get_mut(entity)
            .and_then(|e| e.inner_mut().team_mut())
            .ok_or(GameError::WrongKind {
                entity,
                actual: tag,
                expected: "entity with a team",
            })?;
        state.team = team;
        Ok(())
    }

    fn require_authority(&self) -> Result<()> {
        if self.session.is_authoritative() {
            Ok(())
        } else {
            Err(GameError::NotAuthoritative)
        }
    }

    fn entity(&self, id: EntityId) -> Result<&Entity> {
        self.sim.arena().get(id).ok_or(GameError::UnknownEntity(id))
    }

    fn expect_kind(&self, id: EntityId, tag: EntityTag, expected: &'static str) -> Result<()> {
        let actual = self.entity(id)?.tag();
        if actual == tag {
            Ok(())
        } else {
            Err(GameError::WrongKind {
                entity: id,
                actual,
                expected,
            })
        }
    }

    fn expect_player(&self, id: EntityId) -> Result<()> {
        self.expect_kind(id, EntityTag::Player, "player")
    }

    fn expect_health(&self, id: EntityId) -> Result<()> {
        let entity = self.entity(id)?;
        if entity.inner().health().is_some() {
            Ok(())
        } else {
            Err(GameError::WrongKind {
                entity: id,
                actual: entity.tag(),
                expected: "entity with health",
            })
        }
    }
}
