//! Network roles and the replicated calls exchanged between peers.
//!
//! Transport is not part of this crate. A host drains the [`Rpc`]s queued
//! by its match, ships them with [`Rpc::encode`], and clients feed the
//! decoded calls back into their own match.
//!
//! # Authority
//!
//! | Mode      | Authoritative                          |
//! |-----------|----------------------------------------|
//! | `Offline` | always                                 |
//! | `Host`    | from its first incoming connection on  |
//! | `Client`  | never                                  |

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::entity::EntityId;
use crate::error::Result;
use crate::notify::Notification;
use crate::team::Team;

/// Networking role of the local peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NetMode {
    /// Single player; nothing is replicated
    #[default]
    Offline,
    /// Listen server
    Host,
    /// Connected to a host
    Client,
}

/// Connection bookkeeping and the authority derived from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    mode: NetMode,
    connections: u32,
    authoritative: bool,
}

impl Session {
    /// Creates a session. Offline sessions are authoritative immediately.
    #[must_use]
    pub fn new(mode: NetMode) -> Self {
        Self {
            mode,
            connections: 0,
            authoritative: mode == NetMode::Offline,
        }
    }

    /// Networking role.
    #[must_use]
    pub const fn mode(&self) -> NetMode {
        self.mode
    }

    /// Number of connections established so far.
    #[must_use]
    pub const fn connections(&self) -> u32 {
        self.connections
    }

    /// Whether this peer owns gameplay outcomes.
    #[must_use]
    pub const fn is_authoritative(&self) -> bool {
        self.authoritative
    }

    /// Whether outcomes must be sent to other peers.
    #[must_use]
    pub fn replicates(&self) -> bool {
        self.authoritative && self.mode != NetMode::Offline
    }

    /// Records an incoming connection. A host becomes authoritative on the
    /// first one.
    pub fn on_connection_established(&mut self) {
        self.connections += 1;
        if self.mode == NetMode::Host && !self.authoritative {
            info!(connections = self.connections, "host became authoritative");
            self.authoritative = true;
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(NetMode::Offline)
    }
}

/// Replicated call from the authoritative peer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rpc", rename_all = "snake_case")]
pub enum Rpc {
    /// A round began
    StartRound {
        /// Round number
        round: u32,
    },
    /// A round finished
    EndRound {
        /// Round number that ended
        round: u32,
        /// Player whose death ended it
        dead_player: Option<EntityId>,
    },
    /// An entity changed team
    ChangeTeam {
        /// Entity
        entity: EntityId,
        /// New team
        team: Team,
    },
    /// A rocket was punched toward a new target
    RedirectRocket {
        /// Rocket
        rocket: EntityId,
        /// New target
        target: EntityId,
        /// Player who punched it
        instigator: EntityId,
    },
}

impl Rpc {
    /// The call that replicates `notification`, if it needs replicating.
    ///
    /// # Example
    ///
    /// ```
    /// use rocketpunch_core::net::Rpc;
    /// use rocketpunch_core::notify::Notification;
    /// use rocketpunch_core::entity::EntityId;
    ///
    /// let n = Notification::RoundStarted { round: 2, rocket: Some(EntityId::new(9)) };
    /// assert_eq!(Rpc::from_notification(&n), Some(Rpc::StartRound { round: 2 }));
    /// assert_eq!(Rpc::from_notification(&Notification::Died { entity: EntityId::new(1) }), None);
    /// ```
    #[must_use]
    pub fn from_notification(notification: &Notification) -> Option<Self> {
        match *notification {
            Notification::RoundStarted { round, .. } => Some(Self::StartRound { round }),
            Notification::RoundEnded { round, dead_player } => {
                Some(Self::EndRound { round, dead_player })
            }
            Notification::TeamChanged { entity, new, .. } => {
                Some(Self::ChangeTeam { entity, team: new })
            }
            Notification::RocketRedirected {
                rocket,
                to,
                instigator,
                ..
            } => Some(Self::RedirectRocket {
                rocket,
                target: to,
                instigator,
            }),
            _ => None,
        }
    }

    /// Serializes the call to JSON.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Codec`](crate::error::GameError::Codec) if
    /// serialization fails.
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parses a call from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Codec`](crate::error::GameError::Codec) for
    /// malformed payloads.
    pub fn decode(payload: &str) -> Result<Self> {
        Ok(serde_json::from_str(payload)?)
    }
}
