//! Error types for host-facing operations.
//!
//! Gameplay logic inside the simulation never fails loudly: a dangling
//! handle or a missing component skips the operation and logs a diagnostic.
//! The [`GameError`] type is reserved for calls where the host names a
//! specific entity or hands over external data (configuration, RPC payloads)
//! and needs to learn that the request could not be honoured.

use thiserror::Error;

use crate::entity::{EntityId, EntityTag};

/// Errors returned by host-facing entry points.
#[derive(Debug, Error)]
pub enum GameError {
    /// The handle does not refer to a live entity.
    #[error("unknown entity {0}")]
    UnknownEntity(EntityId),

    /// The entity exists but lacks the component the operation needs.
    #[error("entity {entity} is a {actual}, expected {expected}")]
    WrongKind {
        /// Entity that was addressed
        entity: EntityId,
        /// What the entity actually is
        actual: EntityTag,
        /// Human readable description of what was required
        expected: &'static str,
    },

    /// The operation may only be performed by the authoritative peer.
    #[error("operation requires host authority")]
    NotAuthoritative,

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Encoding or decoding of JSON payloads failed.
    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GameError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_entity_message() {
        let err = GameError::UnknownEntity(EntityId::new(7));
        assert_eq!(err.to_string(), "unknown entity 7");
    }

    #[test]
    fn wrong_kind_message() {
        let err = GameError::WrongKind {
            entity: EntityId::new(3),
            actual: EntityTag::Prop,
            expected: "a wallet",
        };
        assert_eq!(err.to_string(), "entity 3 is a Prop, expected a wallet");
    }

    #[test]
    fn codec_error_converts() {
        let parse: std::result::Result<u32, _> = serde_json::from_str("not json");
        let err: GameError = parse.unwrap_err().into();
        assert!(matches!(err, GameError::Codec(_)));
    }
}
